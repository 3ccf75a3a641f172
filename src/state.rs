//! Application state shared with request handlers.

use std::sync::Arc;

use crate::config::PortalConfig;

/// Read-only configuration shared by every request. Portal sessions are
/// never stored here: each command builds its own client and cookie jar.
#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<PortalConfig>,
}

impl AppState {
    pub fn new(portal: PortalConfig) -> Self {
        Self {
            portal: Arc::new(portal),
        }
    }
}
