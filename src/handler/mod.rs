//! Request handler module
//!
//! Resolves each request path against the root directory and dispatches to
//! directory-listing or file-serving logic.

pub mod directory;
pub mod file;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
