//! Per-request tracing spans keyed by an invocation ID.
//!
//! On the serverless edge the platform already assigns an ID (`X-Vercel-Id`);
//! reusing it lines gateway logs up with the platform's invocation logs.
//! Locally a ULID is generated instead. The resolved ID is echoed back in
//! `X-Request-Id`.

use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{Instrument, Level};

static EDGE_REQUEST_ID: &str = "x-vercel-id";
static REQUEST_ID: &str = "x-request-id";

#[derive(Clone)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

fn resolve_request_id(req: &Request) -> String {
    req.headers()
        .get(EDGE_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| ulid::Ulid::new().to_string())
}

/// 5xx at warn, 4xx at info, everything else at debug.
fn response_level(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::WARN
    } else if status.is_client_error() {
        Level::INFO
    } else {
        Level::DEBUG
    }
}

fn log_response(method: &str, path: &str, status: StatusCode, duration_ms: u64) {
    let code = status.as_u16();
    match response_level(status) {
        Level::WARN => tracing::warn!(method, path, status = code, duration_ms, "Response"),
        Level::INFO => tracing::info!(method, path, status = code, duration_ms, "Response"),
        _ => tracing::debug!(method, path, status = code, duration_ms, "Response"),
    }
}

impl<S, B> Service<Request> for RequestIdService<S>
where
    S: Service<Request, Response = Response<B>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Debug,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let req_id = resolve_request_id(&req);
        let header_value = HeaderValue::from_str(&req_id).ok();
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let span = tracing::info_span!("request", req_id = %req_id);
        let start = Instant::now();

        let future = self.inner.call(req);

        Box::pin(
            async move {
                let result = future.await;
                let duration_ms = start.elapsed().as_millis() as u64;

                match result {
                    Ok(mut response) => {
                        log_response(&method, &path, response.status(), duration_ms);
                        if let Some(value) = header_value {
                            response.headers_mut().insert(REQUEST_ID, value);
                        }
                        Ok(response)
                    }
                    Err(e) => {
                        tracing::error!(
                            method = %method,
                            path = %path,
                            error = ?e,
                            duration_ms,
                            "Request failed"
                        );
                        Err(e)
                    }
                }
            }
            .instrument(span),
        )
    }
}
