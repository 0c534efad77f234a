//! HTTP response building module
//!
//! Response builders for the status codes the server uses, plus the boxed
//! body type shared by buffered and streamed responses. Builders never
//! panic: a header that fails to build falls back to a bare response and
//! logs the error.

use crate::http::cache::Validator;
use crate::logger;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::Response;

/// Response body: boxed so buffered and streamed variants share one type
pub type Body = BoxBody<Bytes, std::io::Error>;

/// Wrap a buffer as a complete response body
pub fn full_body(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// An empty response body
pub fn empty_body() -> Body {
    Empty::new().map_err(|never| match never {}).boxed()
}

/// Build 304 Not Modified response
///
/// Carries only the validator header and the revalidation directive.
pub fn build_304_response(validator: &Validator) -> Response<Body> {
    Response::builder()
        .status(304)
        .header(validator.header_name(), validator.value())
        .header("Cache-Control", "no-cache")
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(empty_body())
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Body> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(full_body("NOT Found"))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(full_body("NOT Found"))
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Body> {
    Response::builder()
        .status(500)
        .header("Content-Type", "text/plain")
        .body(full_body("500 Internal Server Error"))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(full_body("500 Internal Server Error"))
        })
}

/// Build 200 HTML response (directory listings)
pub fn build_html_response(html: String) -> Response<Body> {
    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(full_body(html))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(empty_body())
        })
}

fn log_build_error(kind: &str, err: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {kind} response: {err}"));
}
