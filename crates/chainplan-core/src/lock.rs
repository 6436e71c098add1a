//! Advisory locking for project files.
//!
//! A project file `plan.json` is guarded by the sidecar `plan.json.lock`.
//! Readers take [`LockMode::Shared`], the writer takes
//! [`LockMode::Exclusive`]. The project file itself is never locked, so the
//! atomic rename in [`crate::persistence`] can replace it while the sidecar
//! stays put.
//!
//! Locking never creates directories: the caller decides whether a missing
//! parent is an error (load) or something to create first (save).

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::{debug, trace};

use crate::error::ErrorCode;

/// Default wait for a project file lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Failure to take a project file lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another process held a conflicting lock for the whole wait.
    #[error("{} is locked by another process (waited {waited:?})", project.display())]
    Busy { project: PathBuf, waited: Duration },

    /// The sidecar could not be opened or locked.
    #[error("cannot lock {}", lock_file.display())]
    Open {
        lock_file: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// Machine-readable code associated with this lock error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Busy { .. } => ErrorCode::LockContention,
            Self::Open { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ErrorCode::ProjectFileMissing
            }
            Self::Open { .. } => ErrorCode::SnapshotWriteFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Held lock on a project file's sidecar. Unlocks on drop.
#[derive(Debug)]
pub struct SnapshotLock {
    file: File,
    lock_file: PathBuf,
    mode: LockMode,
}

impl SnapshotLock {
    /// Lock `project_file` for reading. Other readers may hold it too.
    ///
    /// # Errors
    ///
    /// [`LockError::Busy`] if a writer holds the lock past `timeout`;
    /// [`LockError::Open`] if the sidecar cannot be opened.
    pub fn shared(project_file: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(project_file, LockMode::Shared, timeout)
    }

    /// Lock `project_file` for rewriting, excluding readers and writers.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotLock::shared`].
    pub fn exclusive(project_file: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(project_file, LockMode::Exclusive, timeout)
    }

    fn acquire(project_file: &Path, mode: LockMode, timeout: Duration) -> Result<Self, LockError> {
        let lock_file = sidecar_path(project_file);
        let open_error = |source| LockError::Open {
            lock_file: lock_file.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_file)
            .map_err(open_error)?;

        let deadline = Instant::now() + timeout;
        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            match attempt {
                Ok(()) => break,
                Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(LockError::Busy {
                            project: project_file.to_path_buf(),
                            waited: timeout,
                        });
                    }
                    trace!(lock = %lock_file.display(), ?mode, "lock busy, waiting");
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(open_error(err)),
            }
        }

        debug!(lock = %lock_file.display(), ?mode, "project lock acquired");
        Ok(Self {
            file,
            lock_file,
            mode,
        })
    }

    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }

    /// Path of the sidecar file backing this lock.
    #[must_use]
    pub fn lock_file(&self) -> &Path {
        &self.lock_file
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// `plan.json` → `plan.json.lock`, next to the project file.
fn sidecar_path(project_file: &Path) -> PathBuf {
    let mut name = project_file
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".lock");
    project_file.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, Snapshot};
    use crate::persistence::{JsonFileStore, PersistencePort};
    use chrono::NaiveDate;
    use std::sync::mpsc;

    const SHORT: Duration = Duration::from_millis(30);

    fn saved_project(dir: &tempfile::TempDir) -> (PathBuf, JsonFileStore) {
        let path = dir.path().join("plan.json");
        let mut snapshot = Snapshot::empty(
            "locks",
            NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"),
        );
        snapshot.nodes.push(Node::new("T", "Ship", 1.0));
        let store = JsonFileStore::new(&path).with_lock_timeout(SHORT);
        store.save(&snapshot, None).expect("save");
        (path, store)
    }

    #[test]
    fn sidecar_sits_next_to_the_project_file() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/plans/q3.json")),
            PathBuf::from("/tmp/plans/q3.json.lock")
        );
        assert_eq!(sidecar_path(Path::new("plan.json")), PathBuf::from("plan.json.lock"));
    }

    #[test]
    fn readers_can_load_while_another_reader_holds_the_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (path, store) = saved_project(&dir);

        let held = SnapshotLock::shared(&path, SHORT).expect("shared");
        assert_eq!(held.mode(), LockMode::Shared);
        assert_eq!(held.lock_file(), dir.path().join("plan.json.lock"));

        let loaded = store.load(None).expect("load under shared lock");
        assert_eq!(loaded.nodes.len(), 1);
    }

    #[test]
    fn writer_lock_makes_load_fail_with_contention() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (path, store) = saved_project(&dir);

        let _held = SnapshotLock::exclusive(&path, SHORT).expect("exclusive");
        let err = store.load(None).expect_err("blocked");
        let lock = err.downcast_ref::<LockError>().expect("lock error");
        assert!(matches!(lock, LockError::Busy { project, .. } if *project == path));
        assert_eq!(lock.code(), ErrorCode::LockContention);
    }

    #[test]
    fn save_waits_for_readers_then_succeeds_once_they_leave() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (path, store) = saved_project(&dir);
        let snapshot = store.load(None).expect("load");

        let reader = SnapshotLock::shared(&path, SHORT).expect("shared");
        let err = store.save(&snapshot, None).expect_err("reader holds lock");
        assert!(err.downcast_ref::<LockError>().is_some());

        drop(reader);
        store.save(&snapshot, None).expect("save after release");
    }

    #[test]
    fn lock_taken_in_another_thread_blocks_until_released() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (path, _store) = saved_project(&dir);

        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let thread_path = path.clone();
        let writer = thread::spawn(move || {
            let _lock = SnapshotLock::exclusive(&thread_path, SHORT).expect("writer");
            locked_tx.send(()).expect("signal");
            release_rx.recv().expect("wait for release");
        });

        locked_rx.recv().expect("writer locked");
        assert!(matches!(
            SnapshotLock::shared(&path, SHORT),
            Err(LockError::Busy { .. })
        ));

        release_tx.send(()).expect("release");
        writer.join().expect("writer thread");
        SnapshotLock::exclusive(&path, SHORT).expect("free after release");
    }

    #[test]
    fn missing_directory_is_reported_not_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nodir/plan.json");

        let err = SnapshotLock::shared(&path, SHORT).expect_err("no directory");
        assert_eq!(err.code(), ErrorCode::ProjectFileMissing);
        assert!(!dir.path().join("nodir").exists());
    }
}
