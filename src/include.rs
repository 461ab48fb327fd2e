//! Include loader.
//!
//! Scans the source tree for fragment files and loads them into a
//! [`FragmentTable`] keyed by their `/`-separated path relative to the
//! source root, e.g. `blog/partials/nav.include.html`.

use crate::{
    error::BuildError,
    log,
    utils::fs::{collect_all_files, name_ends_with, read_text, rel_key},
};
use std::{collections::BTreeMap, path::Path};

/// Fragment texts for one build pass, keyed by relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentTable {
    entries: BTreeMap<String, String>,
}

impl FragmentTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The placeholder a page writes to pull in `key`, e.g. `{{ nav.include.html }}`.
    pub fn placeholder_for(key: &str) -> String {
        format!("{{{{ {key} }}}}")
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FragmentTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (key, text) in iter {
            table.insert(key, text);
        }
        table
    }
}

/// Load every file under `root` whose name ends with `suffix`.
///
/// Any unreadable or non-UTF-8 fragment fails the whole load.
pub fn load_fragments(root: &Path, suffix: &str) -> Result<FragmentTable, BuildError> {
    let mut table = FragmentTable::default();

    for path in collect_all_files(root)?
        .into_iter()
        .filter(|p| name_ends_with(p, suffix))
    {
        let Some(key) = rel_key(&path, root) else {
            continue;
        };
        let text = read_text(&path)?;
        table.insert(key, text);
    }

    if table.is_empty() {
        log!("include"; "no *{suffix} fragments found");
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SUFFIX: &str = ".include.html";

    #[test]
    fn test_load_fragments_nested() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("blog/partials")).unwrap();
        fs::write(root.join("header.include.html"), "<h1>Hi</h1>").unwrap();
        fs::write(root.join("blog/partials/nav.include.html"), "<nav></nav>").unwrap();
        fs::write(root.join("index.html"), "{{ header.include.html }}").unwrap();

        let table = load_fragments(root, SUFFIX).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("header.include.html"), Some("<h1>Hi</h1>"));
        assert_eq!(table.get("blog/partials/nav.include.html"), Some("<nav></nav>"));
        assert_eq!(table.get("index.html"), None);
    }

    #[test]
    fn test_load_fragments_keys_are_case_sensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Nav.include.html"), "x").unwrap();

        let table = load_fragments(dir.path(), SUFFIX).unwrap();
        assert!(table.get("Nav.include.html").is_some());
        assert!(table.get("nav.include.html").is_none());
    }

    #[test]
    fn test_load_fragments_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<p></p>").unwrap();

        let table = load_fragments(dir.path(), SUFFIX).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_load_fragments_invalid_utf8_fails_whole_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.include.html"), "fine").unwrap();
        fs::write(dir.path().join("b.include.html"), [0xc3, 0x28]).unwrap();

        let err = load_fragments(dir.path(), SUFFIX).unwrap_err();
        assert!(err.path().ends_with("b.include.html"));
    }

    #[test]
    fn test_from_iterator() {
        let table: FragmentTable = [("a.include.html", "A")].into_iter().collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a.include.html"), Some("A"));
    }

    #[test]
    fn test_iter_in_key_order() {
        let table: FragmentTable = [("z.include.html", "Z"), ("a/b.include.html", "B")]
            .into_iter()
            .collect();

        let entries: Vec<_> = table.iter().collect();
        assert_eq!(entries, [("a/b.include.html", "B"), ("z.include.html", "Z")]);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_placeholder_for() {
        assert_eq!(
            FragmentTable::placeholder_for("blog/nav.include.html"),
            "{{ blog/nav.include.html }}"
        );
        assert_eq!(FragmentTable::placeholder_for("cachebust"), "{{ cachebust }}");
    }
}
