//! Snapshot persistence.
//!
//! [`PersistencePort`] is the seam between use cases and storage. The only
//! adapter shipped here is [`JsonFileStore`], which keeps one snapshot per
//! JSON file and guards it with a sidecar advisory lock.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::lock::{DEFAULT_LOCK_TIMEOUT, SnapshotLock};
use crate::model::Snapshot;
use crate::validate::validate_snapshot;

/// Default project file name, relative to the working directory.
pub const DEFAULT_PROJECT_FILE: &str = "project.json";

/// Storage for whole snapshots. `None` means the adapter's default location.
pub trait PersistencePort {
    fn save(&self, snapshot: &Snapshot, path: Option<&Path>) -> Result<()>;
    fn load(&self, path: Option<&Path>) -> Result<Snapshot>;
}

/// One snapshot per pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    default_path: PathBuf,
    lock_timeout: Duration,
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT_FILE)
    }
}

impl JsonFileStore {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// How long [`PersistencePort`] calls wait for another process's lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    fn resolve<'a>(&'a self, path: Option<&'a Path>) -> &'a Path {
        path.unwrap_or(&self.default_path)
    }
}

impl PersistencePort for JsonFileStore {
    #[instrument(skip_all, fields(nodes = snapshot.nodes.len()))]
    fn save(&self, snapshot: &Snapshot, path: Option<&Path>) -> Result<()> {
        let path = self.resolve(path);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let _lock = SnapshotLock::exclusive(path, self.lock_timeout)?;

        let mut json = serde_json::to_string_pretty(snapshot).context("Failed to encode snapshot")?;
        json.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())
            .context("Failed to write snapshot")?;
        tmp.as_file().sync_all().context("Failed to sync snapshot")?;
        tmp.persist(path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!(path = %path.display(), bytes = json.len(), "snapshot saved");
        Ok(())
    }

    #[instrument(skip_all)]
    fn load(&self, path: Option<&Path>) -> Result<Snapshot> {
        let path = self.resolve(path);
        // A missing file must not leave a directory or sidecar behind.
        std::fs::metadata(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let _lock = SnapshotLock::shared(path, self.lock_timeout)?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        debug!(
            path = %path.display(),
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }
}

/// Store `snapshot` through `port`.
pub fn save_project(port: &dyn PersistencePort, snapshot: &Snapshot, path: Option<&Path>) -> Result<()> {
    port.save(snapshot, path)
}

/// Load a snapshot through `port` and validate it.
///
/// Validation failures surface as a [`crate::PlanError::InvalidSnapshot`]
/// inside the returned error chain.
pub fn load_project(port: &dyn PersistencePort, path: Option<&Path>) -> Result<Snapshot> {
    let snapshot = port.load(path)?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::model::{Edge, Node, Position};
    use chrono::NaiveDate;
    use std::cell::RefCell;

    fn sample() -> Snapshot {
        let mut s = Snapshot::empty(
            "launch",
            NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"),
        );
        let mut a = Node::new("A", "Build", 8.0);
        a.position = Some(Position { x: -280.0, y: 0.0 });
        s.nodes = vec![a, Node::new("T", "Ship", 0.0)];
        s.edges = vec![Edge::between("A", "T")];
        s
    }

    #[test]
    fn json_store_round_trips_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("plan.json"));

        store.save(&sample(), None).expect("save");
        let loaded = store.load(None).expect("load");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn json_is_pretty_printed_with_camel_case_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plan.json");
        JsonFileStore::default().save(&sample(), Some(&path)).expect("save");

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("{\n  \"project\": {"));
        assert!(text.contains("\"effortHours\": 8.0"));
        assert!(text.contains("\"dueDate\": \"2025-01-10\""));
        assert!(!text.contains("\"start\""), "unset dates are omitted");
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn save_creates_missing_directories_and_leaves_only_target_and_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/deeper/plan.json");
        JsonFileStore::default().save(&sample(), Some(&path)).expect("save");

        let mut names: Vec<String> = std::fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["plan.json", "plan.json.lock"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = JsonFileStore::default().load(Some(&path)).expect_err("missing");
        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[test]
    fn missing_file_in_missing_directory_leaves_nothing_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nodir/plan.json");
        let err = JsonFileStore::new(&path).load(None).expect_err("missing");

        let io_err = err.downcast_ref::<std::io::Error>().expect("io error in chain");
        assert_eq!(io_err.kind(), std::io::ErrorKind::NotFound);
        assert!(!dir.path().join("nodir").exists());
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn load_project_rejects_invalid_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("plan.json"));
        let mut bad = sample();
        bad.project.hours_per_day = 0.0;
        save_project(&store, &bad, None).expect("save");

        let err = load_project(&store, None).expect_err("invalid");
        let plan = err.downcast_ref::<PlanError>().expect("typed error");
        assert!(matches!(plan, PlanError::InvalidSnapshot { .. }));
    }

    #[derive(Default)]
    struct RecordingPort {
        saved: RefCell<Vec<(Snapshot, Option<PathBuf>)>>,
    }

    impl PersistencePort for RecordingPort {
        fn save(&self, snapshot: &Snapshot, path: Option<&Path>) -> Result<()> {
            self.saved
                .borrow_mut()
                .push((snapshot.clone(), path.map(Path::to_path_buf)));
            Ok(())
        }

        fn load(&self, _path: Option<&Path>) -> Result<Snapshot> {
            self.saved
                .borrow()
                .last()
                .map(|(s, _)| s.clone())
                .context("nothing saved")
        }
    }

    #[test]
    fn use_cases_forward_to_port() {
        let port = RecordingPort::default();
        let target = PathBuf::from("elsewhere.json");
        save_project(&port, &sample(), Some(&target)).expect("save");

        assert_eq!(port.saved.borrow().len(), 1);
        assert_eq!(port.saved.borrow()[0].1.as_deref(), Some(target.as_path()));
        assert_eq!(load_project(&port, None).expect("load"), sample());
    }
}
