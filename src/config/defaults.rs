//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn source() -> PathBuf {
        "src".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn page_extension() -> String {
        "html".into()
    }

    pub fn fragment_suffix() -> String {
        ".include.html".into()
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    pub fn debounce_ms() -> u64 {
        300
    }
}
