//! File watch manager: a registry of watched files and a background poll
//! loop that reacts exactly once per detected modification.
//!
//! The watch set is shared between the REPL loop (which mutates it through
//! `/watch` and `/killwatch`) and the poll task (which reads it and bumps
//! timestamps), so both sides go through an `RwLock`. Reactions are sent
//! over a channel; presentation stays with the receiver.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use sigil_core::{Result, SharedTable, SigilError};

/// State kept per watched file.
#[derive(Debug, Clone)]
struct WatchEntry {
    /// Modification time observed at registration or at the last reaction.
    last_modified: SystemTime,
    copy_to_clipboard: bool,
}

/// One detected modification: the file changed and its converted contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub path: PathBuf,
    pub converted: String,
    pub copy_to_clipboard: bool,
}

/// Owns the watch set and the poll loop.
///
/// Cloning is cheap and shares state; the REPL keeps one clone, the spawned
/// poll task another.
#[derive(Clone)]
pub struct WatchManager {
    watches: Arc<RwLock<HashMap<PathBuf, WatchEntry>>>,
    table: SharedTable,
    cancel: CancellationToken,
}

impl WatchManager {
    pub fn new(table: SharedTable) -> Self {
        Self {
            watches: Arc::new(RwLock::new(HashMap::new())),
            table,
            cancel: CancellationToken::new(),
        }
    }

    /// Registers a single file for polling.
    pub async fn add_watch(&self, path: &Path, copy_to_clipboard: bool) -> Result<()> {
        self.add_watches(std::slice::from_ref(&path.to_path_buf()), copy_to_clipboard)
            .await
    }

    /// Registers several files at once.
    ///
    /// Every path is validated before any watch is created, so a bad path
    /// leaves no partial registrations behind.
    pub async fn add_watches(&self, paths: &[PathBuf], copy_to_clipboard: bool) -> Result<()> {
        let mut validated = Vec::with_capacity(paths.len());
        for path in paths {
            validated.push((path.clone(), validate_target(path)?));
        }

        let mut watches = self.watches.write().await;
        for (path, last_modified) in validated {
            tracing::info!(target: "sigil_watch", "watching {}", path.display());
            watches.insert(
                path,
                WatchEntry {
                    last_modified,
                    copy_to_clipboard,
                },
            );
        }
        Ok(())
    }

    /// Stops watching the given paths. Paths not currently watched are
    /// silent no-ops.
    pub async fn remove_watches(&self, paths: &[PathBuf]) {
        let mut watches = self.watches.write().await;
        for path in paths {
            if watches.remove(path).is_some() {
                tracing::info!(target: "sigil_watch", "stopped watching {}", path.display());
            }
        }
    }

    /// Stops watching everything.
    pub async fn remove_all(&self) {
        let mut watches = self.watches.write().await;
        if !watches.is_empty() {
            tracing::info!(target: "sigil_watch", "stopped all {} watches", watches.len());
        }
        watches.clear();
    }

    pub async fn is_watching(&self, path: &Path) -> bool {
        self.watches.read().await.contains_key(path)
    }

    pub async fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.watches.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Checks every watch once and returns a reaction per file whose
    /// modification time strictly advanced since the stored value.
    ///
    /// Stat or read failures are logged and leave the entry untouched, so
    /// the next cycle retries. The stored timestamp is only bumped after a
    /// successful read, which coalesces rapid writes into one reaction and
    /// never drops a detected change.
    pub async fn poll_once(&self) -> Vec<Reaction> {
        let snapshot: Vec<(PathBuf, WatchEntry)> = {
            let watches = self.watches.read().await;
            watches.iter().map(|(p, e)| (p.clone(), e.clone())).collect()
        };

        let mut reactions = Vec::new();
        for (path, entry) in snapshot {
            let modified = match tokio::fs::metadata(&path)
                .await
                .and_then(|meta| meta.modified())
            {
                Ok(modified) => modified,
                Err(err) => {
                    tracing::warn!(
                        target: "sigil_watch",
                        "cannot stat {}: {err}; retrying next cycle",
                        path.display()
                    );
                    continue;
                }
            };

            if modified <= entry.last_modified {
                continue;
            }

            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(err) => {
                    tracing::warn!(
                        target: "sigil_watch",
                        "cannot read {}: {err}; retrying next cycle",
                        path.display()
                    );
                    continue;
                }
            };

            let converted = self.table.read().await.convert(&contents);

            // The entry may have been killed while we were reading; only a
            // still-present watch gets its timestamp bumped and a reaction.
            let mut watches = self.watches.write().await;
            if let Some(live) = watches.get_mut(&path) {
                live.last_modified = modified;
                reactions.push(Reaction {
                    path,
                    converted,
                    copy_to_clipboard: entry.copy_to_clipboard,
                });
            }
        }
        reactions
    }

    /// Spawns the poll loop as a background task.
    ///
    /// Each tick runs `poll_once` and forwards reactions over the channel.
    /// The task ends when `shutdown` is called or the receiver is dropped.
    pub fn spawn_poller(
        &self,
        poll_interval: Duration,
        reactions: mpsc::Sender<Reaction>,
    ) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                target: "sigil_watch",
                "poll loop started ({}s interval)",
                poll_interval.as_secs_f64()
            );

            loop {
                tokio::select! {
                    _ = manager.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        for reaction in manager.poll_once().await {
                            if reactions.send(reaction).await.is_err() {
                                tracing::debug!(target: "sigil_watch", "reaction receiver gone");
                                return;
                            }
                        }
                    }
                }
            }
            tracing::info!(target: "sigil_watch", "poll loop stopped");
        })
    }

    /// Cancels the poll loop. The caller awaits the `JoinHandle` returned by
    /// `spawn_poller` to guarantee no reaction happens after this.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// A watch target must exist and carry the `.txt` extension.
fn validate_target(path: &Path) -> Result<SystemTime> {
    if path.extension().and_then(|e| e.to_str()) != Some("txt") {
        return Err(SigilError::UnsupportedExtension(path.to_path_buf()));
    }
    let metadata =
        std::fs::metadata(path).map_err(|_| SigilError::FileNotFound(path.to_path_buf()))?;
    metadata.modified().map_err(SigilError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use sigil_core::ReplacementTable;
    use tempfile::TempDir;

    fn shared_table() -> SharedTable {
        Arc::new(RwLock::new(ReplacementTable::builtin()))
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Pushes the file's mtime into the future so a poll sees a strict
    /// advance regardless of filesystem timestamp granularity.
    fn touch_future(path: &Path, secs_ahead: u64) {
        let file = fs::OpenOptions::new().append(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(secs_ahead))
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_watch_missing_file_creates_no_entry() {
        let manager = WatchManager::new(shared_table());
        let missing = PathBuf::from("definitely-not-here.txt");

        let err = manager.add_watch(&missing, false).await.unwrap_err();
        assert!(matches!(err, SigilError::FileNotFound(_)));
        assert!(manager.watched_paths().await.is_empty());

        // Killing a watch that was never created is a harmless no-op.
        manager.remove_watches(&[missing.clone()]).await;
        assert!(!manager.is_watching(&missing).await);
    }

    #[tokio::test]
    async fn test_add_watch_rejects_non_txt_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.md", "AA");

        let manager = WatchManager::new(shared_table());
        let err = manager.add_watch(&path, false).await.unwrap_err();
        assert!(matches!(err, SigilError::UnsupportedExtension(_)));
        assert!(manager.watched_paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_watches_registers_nothing_on_partial_failure() {
        let dir = TempDir::new().unwrap();
        let good = write_file(&dir, "good.txt", "AA");
        let bad = dir.path().join("missing.txt");

        let manager = WatchManager::new(shared_table());
        let result = manager.add_watches(&[good.clone(), bad], false).await;

        assert!(result.is_err());
        assert!(!manager.is_watching(&good).await);
    }

    #[tokio::test]
    async fn test_poll_reacts_once_per_modification() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "proof.txt", "AA x");

        let manager = WatchManager::new(shared_table());
        manager.add_watch(&path, false).await.unwrap();

        // Unchanged file: nothing to do.
        assert!(manager.poll_once().await.is_empty());

        fs::write(&path, "AA x: x ee RR").unwrap();
        touch_future(&path, 2);

        let reactions = manager.poll_once().await;
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].converted, "∀ x: x ∈ ℝ");
        assert_eq!(reactions[0].path, path);

        // Coalesced: the same advance never reacts twice.
        assert!(manager.poll_once().await.is_empty());
    }

    #[tokio::test]
    async fn test_rapid_writes_coalesce_into_one_reaction() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.txt", "start");

        let manager = WatchManager::new(shared_table());
        manager.add_watch(&path, false).await.unwrap();

        // Two writes land between polls; one detected advance, one reaction.
        fs::write(&path, "first -> draft").unwrap();
        touch_future(&path, 2);
        fs::write(&path, "second -> draft").unwrap();
        touch_future(&path, 4);

        let reactions = manager.poll_once().await;
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].converted, "second → draft");
        assert!(manager.poll_once().await.is_empty());
    }

    #[tokio::test]
    async fn test_copy_flag_propagates_to_reactions() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "copy.txt", "x");

        let manager = WatchManager::new(shared_table());
        manager.add_watch(&path, true).await.unwrap();

        touch_future(&path, 2);
        let reactions = manager.poll_once().await;
        assert_eq!(reactions.len(), 1);
        assert!(reactions[0].copy_to_clipboard);
    }

    #[tokio::test]
    async fn test_read_failure_keeps_watch_alive() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "flaky.txt", "AA");

        let manager = WatchManager::new(shared_table());
        manager.add_watch(&path, false).await.unwrap();

        fs::remove_file(&path).unwrap();
        assert!(manager.poll_once().await.is_empty());
        assert!(manager.is_watching(&path).await);

        // File comes back with a newer timestamp; the retry reacts.
        fs::write(&path, "EE y").unwrap();
        touch_future(&path, 2);
        let reactions = manager.poll_once().await;
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].converted, "∃ y");
    }

    #[tokio::test]
    async fn test_remove_all_silences_next_poll() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.txt", "AA");
        let b = write_file(&dir, "b.txt", "EE");

        let manager = WatchManager::new(shared_table());
        manager.add_watches(&[a.clone(), b.clone()], false).await.unwrap();
        assert_eq!(manager.watched_paths().await.len(), 2);

        touch_future(&a, 2);
        touch_future(&b, 2);
        manager.remove_all().await;

        assert!(manager.watched_paths().await.is_empty());
        assert!(manager.poll_once().await.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_poller_before_further_reactions() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "live.txt", "AA");

        let manager = WatchManager::new(shared_table());
        manager.add_watch(&path, false).await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let poller = manager.spawn_poller(Duration::from_millis(20), tx);

        touch_future(&path, 2);
        let reaction = rx.recv().await.unwrap();
        assert_eq!(reaction.converted, "∀");

        manager.shutdown();
        poller.await.unwrap();

        // A later change must go unnoticed: the sender is gone.
        touch_future(&path, 4);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_table_updates_are_visible_to_poller() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "table.txt", "qed");

        let table = shared_table();
        let manager = WatchManager::new(Arc::clone(&table));
        manager.add_watch(&path, false).await.unwrap();

        table.write().await.add("qed", "∎");
        touch_future(&path, 2);

        let reactions = manager.poll_once().await;
        assert_eq!(reactions[0].converted, "∎");
    }
}
