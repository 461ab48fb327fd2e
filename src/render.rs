//! Placeholder substitution for a single page.
//!
//! Placeholders are `{{ <token> }}` with exactly one space on each side.
//! `<token>` is either `cachebust` or the relative path of a fragment.
//!
//! Rules:
//! - fragment placeholders are replaced by the fragment text
//! - `{{ cachebust }}` is replaced by the pass token, also inside inlined fragment text
//! - unknown placeholders are kept verbatim
//! - inlined fragment text is not scanned again for fragment placeholders

use crate::{
    cachebust::{CACHEBUST_KEY, CacheBust},
    include::FragmentTable,
};

const OPEN: &str = "{{ ";
const CLOSE: &str = " }}";

/// Resolve all known placeholders in `page`.
pub fn render_page(page: &str, fragments: &FragmentTable, cachebust: &CacheBust) -> String {
    let mut out = String::with_capacity(page.len());
    let mut rest = page;

    // No known key is longer than this, so the closer is only searched within
    // reach of the opener. Keeps a page full of stray `{{ ` linear.
    let max_key = fragments
        .iter()
        .map(|(key, _)| key.len())
        .max()
        .unwrap_or(0)
        .max(CACHEBUST_KEY.len());

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let window = &after_open[..char_floor(after_open, max_key + CLOSE.len())];

        let replacement = window.find(CLOSE).and_then(|end| {
            let key = &after_open[..end];
            lookup(key, fragments, cachebust).map(|text| (text, end))
        });

        match replacement {
            Some((text, end)) => {
                out.push_str(&rest[..start]);
                out.push_str(&text);
                rest = &after_open[end + CLOSE.len()..];
            }
            None => {
                // Keep one char and rescan, so `{{ {{ a }}` still resolves `{{ a }}`
                let skip = start + '{'.len_utf8();
                out.push_str(&rest[..skip]);
                rest = &rest[skip..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn lookup(key: &str, fragments: &FragmentTable, cachebust: &CacheBust) -> Option<String> {
    if key == CACHEBUST_KEY {
        Some(cachebust.as_str().to_owned())
    } else {
        fragments
            .get(key)
            .map(|text| replace_cachebust(text, cachebust))
    }
}

/// Largest char boundary of `s` at or below `index`.
fn char_floor(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn replace_cachebust(text: &str, cachebust: &CacheBust) -> String {
    text.replace(
        &FragmentTable::placeholder_for(CACHEBUST_KEY),
        cachebust.as_str(),
    )
}
