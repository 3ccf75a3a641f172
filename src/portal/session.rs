//! Cookie round-tripping between the caller and the client's cookie jar.
//!
//! The gateway keeps nothing between requests. The mobile client stores the
//! portal cookies and hands them back on every call; they are loaded into a
//! fresh jar before the request and read back out afterwards.

use cookie::Cookie;
use indexmap::IndexMap;
use reqwest_cookie_store::CookieStoreMutex;
use serde::{Deserialize, Serialize};
use std::sync::PoisonError;
use tracing::{debug, trace};
use url::Url;

/// Portal cookies as carried by the caller (name -> value).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCookies(IndexMap<String, String>);

impl SessionCookies {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SessionCookies {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Add every caller cookie to the jar, scoped to the portal host with `Path=/`
/// so it reaches both the login and grades pages.
pub fn load_into(jar: &CookieStoreMutex, cookies: &SessionCookies, portal_url: &Url) {
    let mut store = jar.lock().unwrap_or_else(PoisonError::into_inner);
    for (name, value) in &cookies.0 {
        if name.is_empty() {
            continue;
        }
        let cookie = Cookie::build((name.as_str(), value.as_str()))
            .path("/")
            .build();
        if let Err(e) = store.parse(&cookie.to_string(), portal_url) {
            debug!(name = name.as_str(), error = %e, "Skipping unstorable caller cookie");
        }
    }
    trace!(count = cookies.len(), "Loaded caller cookies into jar");
}

/// Read back every unexpired cookie the jar would send to any of `urls`.
///
/// A name stored under several paths resolves to the longest path. Caller
/// cookies always sit at `/`, so a value the portal set on a narrower path
/// replaces them. Names come back sorted.
pub fn export_from(jar: &CookieStoreMutex, urls: &[&Url]) -> SessionCookies {
    let store = jar.lock().unwrap_or_else(PoisonError::into_inner);
    let mut best: IndexMap<&str, (&str, &str)> = IndexMap::new();

    for url in urls {
        for cookie in store.matches(url) {
            let path: &str = &cookie.path;
            let candidate = (path, cookie.value());
            best.entry(cookie.name())
                .and_modify(|current| {
                    if path_rank(candidate.0) > path_rank(current.0) {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }
    }

    best.sort_keys();
    SessionCookies(
        best.into_iter()
            .map(|(name, (_, value))| (name.to_string(), value.to_string()))
            .collect(),
    )
}

/// Longer paths are more specific; equal lengths fall back to the path text
/// so the choice never depends on jar iteration order.
fn path_rank(path: &str) -> (usize, &str) {
    (path.len(), path)
}
