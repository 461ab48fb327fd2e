//! File system watcher for rebuild on change.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐ request(paths) ┌──────────────────────┐  recv  ┌─────────────────┐
//! │ notify   │───────────────▶│ RebuildQueue         │───────▶│ consumer loop   │
//! │ callback │                │ pending: path set    │        │ debounce, drain │
//! └──────────┘                │ slot: sync_channel(1)│        │ Builder::run()  │
//! ┌──────────┐  shutdown()    │                      │        └─────────────────┘
//! │ ctrl+c   │───────────────▶│                      │
//! └──────────┘                └──────────────────────┘
//! ```
//!
//! The slot holds at most one wake-up signal. Requests made while one is
//! already pending only add their paths to the pending set, so a burst of
//! events (an editor save is often delete + create + modify) collapses
//! into a single pass. Passes run one at a time on the consumer thread and
//! never overlap.

use crate::{build::Builder, config::SiteConfig, log, logger::timestamp};
use anyhow::{Context, Result};
use notify::{
    Event, EventKind, RecursiveMode, Watcher,
    event::{MetadataKind, ModifyKind},
};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{Receiver, SyncSender, TryRecvError, TrySendError, sync_channel},
    },
    thread,
    time::Duration,
};

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Format path as relative to root for log display.
///
/// `/proj/src/blog/post.html` → `blog/post.html`
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Summarize changed paths for a single log line.
fn describe_changes(paths: &[PathBuf], root: &Path) -> String {
    match paths {
        [] => "source".to_owned(),
        [one] => rel_path(one, root),
        [first, rest @ ..] => format!("{} (+{} more)", rel_path(first, root), rest.len()),
    }
}

/// Log a build failure with the full error chain.
fn log_build_error(trigger: &str, err: &anyhow::Error) {
    if trigger.is_empty() {
        log!("error"; "build failed");
    } else {
        log!("error"; "build failed ({trigger})");
    }
    log!("error"; "{err:#}");
}

// =============================================================================
// Rebuild Queue
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Rebuild,
    Shutdown,
}

/// Producer side of the [`RebuildQueue`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Trigger {
    slot: SyncSender<Signal>,
    pending: Arc<Mutex<FxHashSet<PathBuf>>>,
}

impl Trigger {
    /// Record changed paths and ask for a rebuild.
    ///
    /// Returns `false` when a rebuild was already pending and this request
    /// was coalesced into it (or the consumer is gone).
    pub fn request(&self, paths: impl IntoIterator<Item = PathBuf>) -> bool {
        self.pending.lock().extend(paths);
        match self.slot.try_send(Signal::Rebuild) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }

    /// Stop the consumer loop after any pending pass has run.
    ///
    /// Blocks until the consumer has room for the signal.
    pub fn shutdown(&self) {
        self.slot.send(Signal::Shutdown).ok();
    }
}

/// Single-slot coalescing queue between change notifications and build passes.
pub struct RebuildQueue {
    slot: Receiver<Signal>,
    trigger: Trigger,
}

impl RebuildQueue {
    pub fn new() -> Self {
        let (tx, rx) = sync_channel(1);
        Self {
            slot: rx,
            trigger: Trigger {
                slot: tx,
                pending: Arc::default(),
            },
        }
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    /// Consume rebuild requests until shutdown, running `pass` once per
    /// settled batch with the sorted changed paths.
    ///
    /// A failing pass is logged and does not stop the loop.
    /// Returns the number of passes run.
    pub fn run<F>(self, debounce: Duration, mut pass: F) -> usize
    where
        F: FnMut(&[PathBuf]) -> Result<()>,
    {
        let Self { slot, trigger } = self;
        let pending = trigger.pending;
        drop(trigger.slot);

        let mut passes = 0;
        let mut stop = false;

        while !stop {
            match slot.recv() {
                Ok(Signal::Rebuild) => {}
                Ok(Signal::Shutdown) | Err(_) => break,
            }

            // Let the burst settle, then fold everything that arrived meanwhile
            thread::sleep(debounce);
            loop {
                match slot.try_recv() {
                    Ok(Signal::Rebuild) => continue,
                    Ok(Signal::Shutdown) => stop = true,
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => {}
                }
                break;
            }

            let mut paths: Vec<_> = std::mem::take(&mut *pending.lock()).into_iter().collect();
            if paths.is_empty() {
                log!("watch"; "changes already built, skipping");
                continue;
            }
            paths.sort();

            passes += 1;
            if let Err(err) = pass(&paths) {
                let first = paths.first().map(|p| p.display().to_string());
                log_build_error(first.as_deref().unwrap_or_default(), &err);
            }
        }

        passes
    }
}

impl Default for RebuildQueue {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// Events that can change the output: create, modify (incl. rename), remove.
fn is_relevant(event: &Event) -> bool {
    match event.kind {
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any => {
            true
        }
        EventKind::Access(_) | EventKind::Other => false,
    }
}

/// Changed paths worth a rebuild, or the source root for path-less events.
///
/// Anything the builder reads is kept, even when its name looks like an
/// editor artifact (`.draft.html` is still a page).
fn changed_paths(event: Event, builder: &Builder) -> Vec<PathBuf> {
    if event.paths.is_empty() {
        return vec![builder.source().to_path_buf()];
    }
    event
        .paths
        .into_iter()
        .filter(|p| builder.is_page(p) || builder.is_fragment(p) || !is_temp_file(p))
        .collect()
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the source root and rebuild on every settled batch of changes,
/// until Ctrl+C.
///
/// Fails if the watch cannot be established (e.g. the source root is missing).
pub fn watch_for_changes_blocking(config: &SiteConfig, builder: &Builder) -> Result<()> {
    let source = builder.source().to_path_buf();
    let queue = RebuildQueue::new();

    let events = queue.trigger();
    let rules = builder.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event) => {
            let paths = changed_paths(event, &rules);
            if !paths.is_empty() {
                events.request(paths);
            }
        }
        Ok(_) => {}
        Err(e) => log!("watch"; "error: {e}"),
    })
    .context("Failed to create file watcher")?;

    watcher
        .watch(&source, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch source: {}", source.display()))?;

    let signal = queue.trigger();
    ctrlc::set_handler(move || signal.shutdown()).context("Failed to set Ctrl+C handler")?;

    log!("watch"; "watching {}/ (ctrl+c to stop)", rel_path(&source, config.get_root()));

    let passes = queue.run(config.watch.debounce(), |paths| {
        log!("watch"; "[{}] {} changed, rebuilding...", timestamp(), describe_changes(paths, &source));
        builder.run()?;
        Ok(())
    });

    drop(watcher);
    log!("watch"; "stopped after {passes} rebuilds");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use notify::event::{CreateKind, RemoveKind};
    use std::sync::mpsc;

    const DEBOUNCE: Duration = Duration::from_millis(20);

    fn p(name: &str) -> PathBuf {
        PathBuf::from("/site/src").join(name)
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("src/.index.html.swp")));
        assert!(is_temp_file(Path::new("src/index.html~")));
        assert!(is_temp_file(Path::new("src/index.bak")));
        assert!(!is_temp_file(Path::new("src/index.html")));
        assert!(!is_temp_file(Path::new("src/nav.include.html")));
    }

    #[test]
    fn test_describe_changes() {
        let root = Path::new("/site/src");
        assert_eq!(describe_changes(&[], root), "source");
        assert_eq!(describe_changes(&[p("a.html")], root), "a.html");
        assert_eq!(
            describe_changes(&[p("blog/a.html"), p("b.html"), p("c.html")], root),
            "blog/a.html (+2 more)"
        );
    }

    #[test]
    fn test_is_relevant() {
        let event = |kind| Event::new(kind).add_path(p("a.html"));

        assert!(is_relevant(&event(EventKind::Create(CreateKind::File))));
        assert!(is_relevant(&event(EventKind::Remove(RemoveKind::File))));
        assert!(is_relevant(&event(EventKind::Modify(ModifyKind::Name(
            notify::event::RenameMode::Both
        )))));
        assert!(!is_relevant(&event(EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::AccessTime
        )))));
        assert!(!is_relevant(&event(EventKind::Access(
            notify::event::AccessKind::Read
        ))));
    }

    fn builder() -> Builder {
        let mut config = SiteConfig::default();
        config.build.source = PathBuf::from("/site/src");
        config.build.output = PathBuf::from("/site/public");
        Builder::new(&config.build)
    }

    #[test]
    fn test_changed_paths() {
        let builder = builder();
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(p("index.html"))
            .add_path(p(".index.html.swp"))
            .add_path(p("style.css~"));
        assert_eq!(changed_paths(event, &builder), vec![p("index.html")]);

        let bare = Event::new(EventKind::Any);
        assert_eq!(changed_paths(bare, &builder), vec![PathBuf::from("/site/src")]);
    }

    #[test]
    fn test_changed_paths_keeps_dot_named_sources() {
        let builder = builder();
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(p(".draft.html"))
            .add_path(p("blog/.nav.include.html"))
            .add_path(p(".nav.include.html.swp"));

        assert_eq!(
            changed_paths(event, &builder),
            vec![p(".draft.html"), p("blog/.nav.include.html")]
        );
    }

    #[test]
    fn test_rapid_requests_coalesce_into_one_pass() {
        let queue = RebuildQueue::new();
        let trigger = queue.trigger();

        // delete + create + modify of one save, plus an unrelated edit
        assert!(trigger.request([p("index.html")]));
        assert!(!trigger.request([p("index.html")]));
        assert!(!trigger.request([p("index.html")]));
        assert!(!trigger.request([p("nav.include.html")]));

        let consumer = thread::spawn(move || {
            let mut seen = Vec::new();
            let passes = queue.run(DEBOUNCE, |paths| {
                seen.push(paths.to_vec());
                Ok(())
            });
            (passes, seen)
        });
        trigger.shutdown();

        let (passes, seen) = consumer.join().unwrap();
        assert_eq!(passes, 1);
        assert_eq!(seen, vec![vec![p("index.html"), p("nav.include.html")]]);
    }

    #[test]
    fn test_requests_during_pass_run_one_follow_up_pass() {
        let queue = RebuildQueue::new();
        let trigger = queue.trigger();
        let during = queue.trigger();
        let (done_tx, done_rx) = mpsc::channel();

        trigger.request([p("a.html")]);
        let consumer = thread::spawn(move || {
            let mut seen = Vec::new();
            let passes = queue.run(DEBOUNCE, |paths| {
                if seen.is_empty() {
                    // events arriving while the first pass is in flight
                    assert!(during.request([p("b.html")]));
                    assert!(!during.request([p("c.html")]));
                }
                seen.push(paths.to_vec());
                done_tx.send(()).unwrap();
                Ok(())
            });
            (passes, seen)
        });

        done_rx.recv().unwrap();
        done_rx.recv().unwrap();
        trigger.shutdown();

        let (passes, seen) = consumer.join().unwrap();
        assert_eq!(passes, 2);
        assert_eq!(seen, vec![vec![p("a.html")], vec![p("b.html"), p("c.html")]]);
    }

    #[test]
    fn test_failed_pass_does_not_stop_loop() {
        let queue = RebuildQueue::new();
        let trigger = queue.trigger();
        let (done_tx, done_rx) = mpsc::channel();

        let consumer = thread::spawn(move || {
            let mut calls = 0;
            queue.run(DEBOUNCE, |_| {
                calls += 1;
                done_tx.send(()).unwrap();
                if calls == 1 {
                    Err(anyhow!("cannot read source `a.html`"))
                } else {
                    Ok(())
                }
            })
        });

        trigger.request([p("a.html")]);
        done_rx.recv().unwrap();
        trigger.request([p("a.html")]);
        done_rx.recv().unwrap();
        trigger.shutdown();

        assert_eq!(consumer.join().unwrap(), 2);
    }

    #[test]
    fn test_wake_up_without_paths_is_skipped() {
        let queue = RebuildQueue::new();
        let trigger = queue.trigger();

        assert!(trigger.request(Vec::new()));
        let consumer = thread::spawn(move || queue.run(DEBOUNCE, |_| Ok(())));
        trigger.shutdown();

        assert_eq!(consumer.join().unwrap(), 0);
    }

    #[test]
    fn test_shutdown_without_requests() {
        let queue = RebuildQueue::new();
        let trigger = queue.trigger();
        let consumer = thread::spawn(move || queue.run(DEBOUNCE, |_| Ok(())));

        trigger.shutdown();
        assert_eq!(consumer.join().unwrap(), 0);
    }

    #[test]
    fn test_request_after_consumer_gone() {
        let queue = RebuildQueue::new();
        let trigger = queue.trigger();
        drop(queue);

        assert!(!trigger.request([p("a.html")]));
    }

    #[test]
    fn test_watch_fails_for_missing_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.build.source = dir.path().join("missing");
        config.build.output = dir.path().join("public");

        let builder = Builder::new(&config.build);
        assert!(watch_for_changes_blocking(&config, &builder).is_err());
    }
}
