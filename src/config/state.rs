// Application state module
// Immutable per-server state shared across requests

use std::io;
use std::path::PathBuf;

use super::types::Config;
use crate::handler::directory::LISTING_TEMPLATE;

/// Application state
///
/// Read-only after construction; shared between connection tasks via `Arc`.
/// No request ever mutates it, so no cross-request locking is needed.
pub struct AppState {
    pub config: Config,
    /// Canonicalized root directory all request paths resolve under
    pub root: PathBuf,
    /// Directory-listing template, loaded once at construction
    pub template: String,
}

impl AppState {
    /// Build state from a loaded config, canonicalizing the root directory
    ///
    /// Fails when the configured directory does not exist or is inaccessible.
    pub fn new(config: Config) -> io::Result<Self> {
        let root = std::fs::canonicalize(&config.root.directory)?;
        Ok(Self {
            config,
            root,
            template: LISTING_TEMPLATE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_fails() {
        let mut config = Config::default();
        config.root.directory = "/definitely/not/a/real/path".to_string();
        assert!(AppState::new(config).is_err());
    }

    #[test]
    fn test_root_is_canonicalized() {
        let config = Config::default();
        let state = AppState::new(config).unwrap();
        assert!(state.root.is_absolute());
        assert!(!state.template.is_empty());
    }
}
