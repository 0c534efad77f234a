//! HTTP cache validation module
//!
//! Two validator strategies, selected once at construction time:
//! a content-digest `ETag` (md5 of the full file bytes, base64-encoded)
//! and an mtime-based `Last-Modified` HTTP-date. Both are compared
//! against the client's conditional header with exact string equality —
//! no weak-validator or date-range semantics.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::Deserialize;
use std::time::SystemTime;

/// Validator strategy, chosen in the `cache.strategy` config key
///
/// `etag` is correctness-robust but reads the full file on every request;
/// `last-modified` is cheap but second-granular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStrategy {
    #[default]
    Etag,
    LastModified,
}

/// A computed validator, carrying the response header it is sent in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    Etag(String),
    LastModified(String),
}

impl Validator {
    pub fn header_name(&self) -> &'static str {
        match self {
            Self::Etag(_) => "ETag",
            Self::LastModified(_) => "Last-Modified",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Etag(v) | Self::LastModified(v) => v,
        }
    }
}

/// Content-digest `ETag`: md5 over the full file bytes, base64-encoded
pub fn content_etag(content: &[u8]) -> String {
    STANDARD.encode(Md5::digest(content))
}

/// Format a modification time as an HTTP-date (RFC 7231, always GMT)
pub fn http_date(mtime: SystemTime) -> String {
    let datetime: DateTime<Utc> = mtime.into();
    datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Compare the client's conditional header against the computed validator
///
/// Exact string match; absence means not cached.
pub fn matches(conditional: Option<&str>, validator: &str) -> bool {
    conditional.is_some_and(|token| token == validator)
}
