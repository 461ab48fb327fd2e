//! Filesystem helpers shared by the include loader and the builder.

use crate::error::BuildError;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively, sorted by path.
///
/// Unlike a best-effort scan, any traversal error is returned: a build pass
/// must not silently skip unreadable directories.
pub fn collect_all_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_str().unwrap_or_default();
        if !IGNORED_FILES.contains(&name) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Relative path of `path` under `root` with `/` separators on every platform.
///
/// This is the form authors write inside `{{ ... }}` placeholders.
pub fn rel_key(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Check whether the file name of `path` ends with `suffix`.
pub fn name_ends_with(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(suffix))
}

/// Read a source file as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|err| BuildError::unreadable(path, err))
}

/// Write `content` to `dest`, creating parent directories as needed.
///
/// With `atomic`, the content goes to a temp file in the destination
/// directory which is then renamed over `dest`.
pub fn write_text(dest: &Path, content: &str, atomic: bool) -> Result<(), BuildError> {
    let parent = dest.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|err| BuildError::write(parent, err))?;

    if !atomic {
        return fs::write(dest, content).map_err(|err| BuildError::write(dest, err));
    }

    let mut tmp = tempfile::Builder::new()
        .prefix(".weld-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|err| BuildError::write(parent, err))?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.write_all(content.as_bytes())
        .map_err(|err| BuildError::write(&tmp_path, err))?;
    tmp.persist(dest)
        .map_err(|err| BuildError::write(dest, err.error))?;
    Ok(())
}
