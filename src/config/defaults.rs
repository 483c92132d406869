//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn title() -> String {
        "Stories".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn route_prefix() -> String {
        "stories".into()
    }

    pub fn jobs() -> usize {
        8
    }
}

// ============================================================================
// [catalog] Section Defaults
// ============================================================================

pub mod catalog {
    use super::super::catalog::OnError;

    pub fn base_url() -> String {
        "https://demo.dev.datopian.com".into()
    }

    pub fn timeout_secs() -> u64 {
        10
    }

    pub fn on_error() -> OnError {
        OnError::Abort
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }
}
