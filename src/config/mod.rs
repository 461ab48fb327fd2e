//! Site configuration management for `weld.toml`.
//!
//! The config file is optional: every field has a default, so a bare
//! project with `src/` and no `weld.toml` builds into `public/`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[build]`   | Source/output roots, page and fragment naming    |
//! | `[watch]`   | Rebuild-on-change behaviour (debounce)           |
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "src"
//! output = "public"
//! fragment_suffix = ".include.html"
//!
//! [watch]
//! debounce_ms = 300
//! ```

mod build;
pub mod defaults;
mod error;
mod watch;

pub use build::BuildConfig;
pub use error::ConfigError;
pub use watch::WatchConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing weld.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `weld.toml` (or `--config`) under the CLI root, falling back to
    /// defaults when the file does not exist, then apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.update_path_with_root(&root, &cli.config);

        match cli.subcommand() {
            Commands::Build { clean } => self.build.clean |= clean,
            Commands::Watch { debounce } => {
                Self::update_option(&mut self.watch.debounce_ms, debounce.as_ref());
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all paths against the root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config_file: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config_file));
        self.build.source = Self::normalize_path(&root.join(&self.build.source));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before any build pass runs.
    ///
    /// Also strips a leading dot from `page_extension` (`.html` → `html`).
    pub fn validate(&mut self) -> Result<()> {
        let build = &mut self.build;

        if let Some(ext) = build.page_extension.strip_prefix('.') {
            build.page_extension = ext.to_owned();
        }
        if build.page_extension.is_empty() {
            bail!(ConfigError::Validation(
                "[build.page_extension] must not be empty".into()
            ));
        }
        if build.fragment_suffix.is_empty() {
            bail!(ConfigError::Validation(
                "[build.fragment_suffix] must not be empty".into()
            ));
        }

        // Writing into the watched tree would retrigger the watcher forever
        if build.output == build.source {
            bail!(ConfigError::Validation(
                "[build.output] must differ from [build.source]".into()
            ));
        }
        if build.output.starts_with(&build.source) {
            bail!(ConfigError::Validation(format!(
                "[build.output] `{}` must not be inside [build.source] `{}`",
                build.output.display(),
                build.source.display()
            )));
        }
        if build.clean && build.source.starts_with(&build.output) {
            bail!(ConfigError::Validation(format!(
                "[build.clean] would delete [build.source] `{}` inside [build.output] `{}`",
                build.source.display(),
                build.output.display()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
