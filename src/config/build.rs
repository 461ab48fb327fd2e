//! `[build]` section configuration.
//!
//! Contains the source/output roots and the file naming rules that decide
//! which files are pages and which are fragments.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in weld.toml - build pass configuration.
///
/// # Example
/// ```toml
/// [build]
/// source = "src"                     # Pages and fragments
/// output = "public"                  # Mirrored, resolved pages
/// page_extension = "html"
/// fragment_suffix = ".include.html"
/// atomic_write = true
/// clean = false
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Source directory holding pages and fragments.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Extension (without dot) identifying page files.
    #[serde(default = "defaults::build::page_extension")]
    #[educe(Default = defaults::build::page_extension())]
    pub page_extension: String,

    /// File name suffix identifying fragment files.
    #[serde(default = "defaults::build::fragment_suffix")]
    #[educe(Default = defaults::build::fragment_suffix())]
    pub fragment_suffix: String,

    /// Write pages through a temp file renamed over the destination,
    /// so readers of the output tree never see a half-written page.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub atomic_write: bool,

    /// Remove the output directory before each build pass.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,
}
