//! Site building orchestration.
//!
//! One build pass fully reconstructs the output tree from the source tree.
//!
//! # Architecture
//!
//! ```text
//! Builder::run()
//!     │
//!     ├── ensure output root (optionally cleaned first)
//!     │
//!     ├── CacheBust::generate() ──► one token for the whole pass
//!     │
//!     ├── load_fragments() ──► FragmentTable snapshot for the whole pass
//!     │
//!     └── for each page (sorted):
//!             read ──► render_page() ──► write mirrored destination
//! ```
//!
//! Pages are processed sequentially. The first failing page aborts the
//! pass; pages written before it stay on disk.

use crate::{
    cachebust::CacheBust,
    config::BuildConfig,
    error::BuildError,
    include::load_fragments,
    log,
    render::render_page,
    utils::fs::{collect_all_files, name_ends_with, read_text, write_text},
};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

/// Summary of a completed build pass.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub cachebust: CacheBust,
    pub pages: usize,
    pub fragments: usize,
    pub duration: Duration,
}

/// Runs build passes over one source root into one output root.
///
/// Holds no state between passes, so `run()` can be called any number of
/// times, and builders over different roots never interfere.
#[derive(Debug, Clone)]
pub struct Builder {
    source: PathBuf,
    output: PathBuf,
    page_extension: String,
    fragment_suffix: String,
    atomic_write: bool,
    clean: bool,
}

impl Builder {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            source: config.source.clone(),
            output: config.output.clone(),
            page_extension: config.page_extension.clone(),
            fragment_suffix: config.fragment_suffix.clone(),
            atomic_write: config.atomic_write,
            clean: config.clean,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether `path` is a fragment (name ends with the fragment suffix).
    pub fn is_fragment(&self, path: &Path) -> bool {
        name_ends_with(path, &self.fragment_suffix)
    }

    /// Whether `path` is a page: page extension, and not a fragment.
    pub fn is_page(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == self.page_extension)
            && !self.is_fragment(path)
    }

    /// Mirror `page` (under the source root) into the output root.
    fn destination(&self, page: &Path) -> PathBuf {
        let rel = page.strip_prefix(&self.source).unwrap_or(page);
        self.output.join(rel)
    }

    /// Run one full build pass.
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();

        if !self.source.is_dir() {
            return Err(BuildError::SourceRootMissing(self.source.clone()));
        }

        self.prepare_output()?;

        let cachebust = CacheBust::generate();
        let fragments = load_fragments(&self.source, &self.fragment_suffix)?;

        let pages: Vec<_> = collect_all_files(&self.source)?
            .into_iter()
            .filter(|p| self.is_page(p))
            .collect();

        for page in &pages {
            let text = read_text(page)?;
            let rendered = render_page(&text, &fragments, &cachebust);
            write_text(&self.destination(page), &rendered, self.atomic_write)?;
        }

        let report = BuildReport {
            cachebust,
            pages: pages.len(),
            fragments: fragments.len(),
            duration: started.elapsed(),
        };
        log_build_result(&report);

        Ok(report)
    }

    /// Create the output root, clearing it first when `clean` is set.
    fn prepare_output(&self) -> Result<(), BuildError> {
        if self.clean && self.source.starts_with(&self.output) {
            return Err(BuildError::write(
                &self.output,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "refusing to clean an output root that contains the source root",
                ),
            ));
        }
        if self.clean && self.output.exists() {
            fs::remove_dir_all(&self.output)
                .map_err(|err| BuildError::write(&self.output, err))?;
        }
        fs::create_dir_all(&self.output).map_err(|err| BuildError::write(&self.output, err))
    }
}

/// Log the completion signal of a pass.
fn log_build_result(report: &BuildReport) {
    if report.pages == 0 {
        log!("warn"; "no pages found, output is empty");
    }
    log!(
        "build";
        "done: {} pages, {} fragments in {:.0?}, cachebust {}",
        report.pages,
        report.fragments,
        report.duration,
        report.cachebust
    );
}

// ============================================================================
// Tests
// ============================================================================
