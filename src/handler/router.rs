//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: extracts the request context,
//! resolves the path under the configured root, stats it and dispatches.
//! All methods are served identically (GET semantics assumed).

use crate::config::AppState;
use crate::handler::{directory, file};
use crate::http::{self, Body};
use crate::logger;
use hyper::{Request, Response};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Per-request context, created at arrival and dropped with the response
#[derive(Debug)]
pub struct RequestContext {
    /// Path component as received, before decoding
    pub raw_path: String,
    /// Percent-decoded path (decoded exactly once)
    pub path: String,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub accept_encoding: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        // uri.path() already excludes the query string
        let raw_path = req.uri().path().to_string();
        let path = percent_decode_str(&raw_path)
            .decode_utf8_lossy()
            .into_owned();
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        Self {
            raw_path,
            path,
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
            accept_encoding: header("accept-encoding"),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Body>, Infallible> {
    let ctx = RequestContext::from_request(&req);
    if state.config.logging.access_log {
        logger::log_request(req.method(), &ctx.path);
    }
    Ok(route_request(&ctx, &state).await)
}

/// Resolve the request path, stat it and dispatch
pub async fn route_request(ctx: &RequestContext, state: &AppState) -> Response<Body> {
    let Some(fs_path) = resolve_path(&state.root, &ctx.path) else {
        logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
        return http::build_404_response();
    };

    match fs::metadata(&fs_path).await {
        // Not found or inaccessible: nothing further to do
        Err(_) => http::build_404_response(),
        Ok(meta) if meta.is_dir() => directory::serve_directory(ctx, &fs_path, state).await,
        Ok(meta) => file::serve_file(ctx, &fs_path, &meta, state).await,
    }
}

/// Join the decoded request path onto the root directory
///
/// `..` segments are rejected rather than joined, so a crafted path can
/// never resolve outside the root.
pub fn resolve_path(root: &Path, decoded: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            name => resolved.push(name),
        }
    }
    Some(resolved)
}
