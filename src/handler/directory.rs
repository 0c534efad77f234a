//! Directory listing module
//!
//! Enumerates a directory's immediate entries and renders them through the
//! template engine as an HTML page of links. Entries keep filesystem
//! enumeration order; no sorting is applied.

use crate::config::AppState;
use crate::http::{self, Body};
use crate::logger;
use crate::template;
use hyper::Response;
use serde_json::{json, Value};
use std::io;
use std::path::Path;
use tokio::fs;

/// Built-in listing template, loaded into `AppState` at construction
pub const LISTING_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Index of <%= path %></title>
</head>
<body>
  <h1>Index of <%= path %></h1>
  <ul>
<% for (const f of files) { %>    <li><a href="<%= f.url %>"><%= f.name %></a></li>
<% } %>  </ul>
</body>
</html>
"#;

/// Serve a directory listing
///
/// Enumeration or render failure is a request-scoped 500, never a partial
/// listing and never a crash.
pub async fn serve_directory(
    ctx: &crate::handler::router::RequestContext,
    dir: &Path,
    state: &AppState,
) -> Response<Body> {
    let entries = match list_entries(dir, &ctx.path).await {
        Ok(entries) => entries,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            return http::build_500_response();
        }
    };

    let data = json!({ "path": ctx.path, "files": entries });
    match template::render(&state.template, &data) {
        Ok(html) => {
            if state.config.logging.access_log {
                logger::log_response(200, html.len());
            }
            http::build_html_response(html)
        }
        Err(e) => {
            logger::log_error(&format!("Failed to render listing template: {e}"));
            http::build_500_response()
        }
    }
}

/// Immediate entries as `{url, name}` pairs, in enumeration order
async fn list_entries(dir: &Path, request_path: &str) -> io::Result<Vec<Value>> {
    let mut read_dir = fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push(json!({
            "url": join_url(request_path, &name),
            "name": name,
        }));
    }
    Ok(entries)
}

/// Join the request path with an entry name: `/sub` + `a.txt` -> `/sub/a.txt`
fn join_url(request_path: &str, name: &str) -> String {
    if request_path.ends_with('/') {
        format!("{request_path}{name}")
    } else {
        format!("{request_path}/{name}")
    }
}
