//! HTTP protocol layer module
//!
//! Protocol-level building blocks shared by the request handlers:
//! cache validation, content-encoding negotiation, MIME lookup and
//! response builders.

pub mod cache;
pub mod encoding;
pub mod mime;
pub mod response;

// Re-export commonly used items
pub use response::{
    build_304_response, build_404_response, build_500_response, build_html_response, Body,
};
