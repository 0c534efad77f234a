//! staticd — minimal async HTTP static-file server.
//!
//! Given a root directory, serves files and auto-generated directory
//! listings, with conditional caching (`ETag` or `Last-Modified`) and
//! content-encoding negotiation (gzip/deflate).

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod template;
