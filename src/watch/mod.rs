//! Hot Reload Watcher
//!
//! Bridges filesystem change notifications on the rule and settings files
//! into debounced reload events. The stores never learn how change
//! detection works; they only expose reload entry points that the loop here
//! calls. Watches the parent directories rather than the files themselves,
//! since atomic saves replace the files by rename.

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watcher init failed: {0}")]
    Init(#[from] notify::Error),

    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },
}

/// Which watched file changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTarget {
    Rules,
    Settings,
}

/// Watches the rule and settings files and delivers debounced
/// [`ReloadTarget`] events.
pub struct FileWatcher {
    // kept alive for the watcher's lifetime; dropping it unwatches
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<ReloadTarget>,
    debounce: Duration,
    pending: Vec<ReloadTarget>,
}

impl FileWatcher {
    /// Watch `rule_path` and `settings_path` for changes.
    pub fn new(rule_path: &Path, settings_path: &Path) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let rule_name = file_name(rule_path);
        let settings_name = file_name(settings_path);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "file watcher error");
                        return;
                    }
                };
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                for path in &event.paths {
                    let Some(name) = path.file_name() else {
                        continue;
                    };
                    if name == rule_name.as_os_str() {
                        let _ = tx.send(ReloadTarget::Rules);
                    } else if name == settings_name.as_os_str() {
                        let _ = tx.send(ReloadTarget::Settings);
                    }
                }
            })?;

        let mut watched_dirs = HashSet::new();
        for path in [rule_path, settings_path] {
            let dir = parent_dir(path);
            if !watched_dirs.insert(dir.clone()) {
                continue;
            }
            watcher
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|err| WatchError::Watch {
                    path: dir.clone(),
                    source: err,
                })?;
            tracing::debug!(dir = %dir.display(), "watching for rule/settings changes");
        }

        Ok(Self {
            _watcher: watcher,
            rx,
            debounce: Duration::from_millis(500),
            pending: Vec::new(),
        })
    }

    /// Override the debounce window (mostly for tests).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Next debounced change. A single save produces a burst of raw events
    /// (tmp write, rename); the burst is absorbed into one delivery per
    /// distinct target. `None` once the watcher backend shuts down.
    pub async fn next(&mut self) -> Option<ReloadTarget> {
        if !self.pending.is_empty() {
            return Some(self.pending.remove(0));
        }

        let first = self.rx.recv().await?;
        tokio::time::sleep(self.debounce).await;

        let mut targets = vec![first];
        while let Ok(target) = self.rx.try_recv() {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        let next = targets.remove(0);
        self.pending.extend(targets);
        Some(next)
    }

    /// Drive the watcher forever, invoking `on_change` for each debounced
    /// change. The loop ends when the watcher backend shuts down.
    pub async fn run(mut self, on_change: impl Fn(ReloadTarget)) {
        while let Some(target) = self.next().await {
            tracing::info!(?target, "file change detected; reloading");
            on_change(target);
        }
    }
}

fn file_name(path: &Path) -> OsString {
    path.file_name().map(OsString::from).unwrap_or_default()
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
