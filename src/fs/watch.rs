//! External-edit detection for the open document.
//!
//! Watches the document's parent directory (editors often replace files via
//! rename, which a file-level watch misses) and reports changes to the one
//! watched path. Writes made by mdnote itself are acknowledged by fingerprint
//! so they are not reported back as external edits.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, SystemTime};

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Removed(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let meta = std::fs::metadata(path).ok()?;
    Some(Fingerprint {
        len: meta.len(),
        modified: meta.modified().ok(),
    })
}

pub struct FileWatcher {
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<notify::Event>,
    watched: Option<(PathBuf, PathBuf)>,
    last_seen: Option<Fingerprint>,
}

impl FileWatcher {
    pub fn new() -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let _ = tx.send(event);
            },
            Config::default().with_poll_interval(WATCHER_POLL_INTERVAL),
        )?;
        Ok(Self {
            watcher,
            rx,
            watched: None,
            last_seen: None,
        })
    }

    /// Starts watching `path`, replacing any previous watch.
    pub fn watch(&mut self, path: &Path) -> Result<(), notify::Error> {
        self.unwatch();
        let file = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        self.last_seen = fingerprint(&file);
        tracing::debug!(path = %file.display(), "watching file");
        self.watched = Some((file, dir));
        Ok(())
    }

    pub fn unwatch(&mut self) {
        if let Some((_, dir)) = self.watched.take() {
            if let Err(e) = self.watcher.unwatch(&dir) {
                tracing::debug!(error = %e, "unwatch failed");
            }
        }
        self.last_seen = None;
        while self.rx.try_recv().is_ok() {}
    }

    pub fn watched_path(&self) -> Option<&Path> {
        self.watched.as_ref().map(|(file, _)| file.as_path())
    }

    /// Records the current on-disk state as our own, so the events our write
    /// produces are ignored.
    pub fn acknowledge_write(&mut self) {
        if let Some((file, _)) = &self.watched {
            self.last_seen = fingerprint(file);
        }
    }

    /// Drains pending notifications; returns at most one change for the
    /// watched file.
    pub fn poll(&mut self) -> Option<FileChange> {
        let (file, _) = self.watched.as_ref()?;
        let mut touched = false;
        while let Ok(event) = self.rx.try_recv() {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            if event.paths.iter().any(|p| p == file) {
                touched = true;
            }
        }
        if !touched {
            return None;
        }

        match fingerprint(file) {
            None => {
                self.last_seen = None;
                Some(FileChange::Removed(file.clone()))
            }
            Some(current) if Some(&current) != self.last_seen.as_ref() => {
                self.last_seen = Some(current);
                Some(FileChange::Modified(file.clone()))
            }
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn poll_until(watcher: &mut FileWatcher, timeout: Duration) -> Option<FileChange> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Some(change) = watcher.poll() {
                return Some(change);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        None
    }

    #[test]
    fn reports_external_modification() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        std::fs::write(&path, "one").unwrap();

        let mut watcher = FileWatcher::new().unwrap();
        watcher.watch(&path).unwrap();
        std::fs::write(&path, "something longer").unwrap();

        let change = poll_until(&mut watcher, Duration::from_secs(5));
        assert!(matches!(change, Some(FileChange::Modified(_))));
    }

    #[test]
    fn acknowledged_write_is_not_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        std::fs::write(&path, "one").unwrap();

        let mut watcher = FileWatcher::new().unwrap();
        watcher.watch(&path).unwrap();
        std::fs::write(&path, "own write").unwrap();
        watcher.acknowledge_write();

        assert_eq!(poll_until(&mut watcher, Duration::from_millis(800)), None);
    }

    #[test]
    fn unwatched_watcher_reports_nothing() {
        let mut watcher = FileWatcher::new().unwrap();
        assert_eq!(watcher.poll(), None);
        assert!(watcher.watched_path().is_none());
    }
}
