pub mod chain;
pub mod check;
pub mod completions;
pub mod init;
pub mod layout;
pub mod schedule;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chainplan_core::Snapshot;
use chainplan_core::config::{ProjectConfig, resolve_config};
use chainplan_core::persistence::{JsonFileStore, load_project, save_project};

use crate::output::{OutputMode, select_output_mode};

/// Everything a command handler needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    /// Absolute path of the project JSON file.
    pub file: PathBuf,
    /// Directory holding the project file and its `.chainplan/` config.
    pub project_dir: PathBuf,
    pub output: OutputMode,
    pub config: ProjectConfig,
}

impl Context {
    /// Resolve the project file and load configuration around it.
    pub fn resolve(
        file: &Path,
        format_flag: Option<OutputMode>,
        json_flag: bool,
    ) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let file = if file.is_absolute() {
            file.to_path_buf()
        } else {
            cwd.join(file)
        };
        let project_dir = file
            .parent()
            .map_or_else(|| cwd.clone(), Path::to_path_buf);

        let effective = resolve_config(&project_dir, json_flag)?;
        let output = select_output_mode(format_flag, json_flag, Some(&effective.resolved_output));

        Ok(Self {
            file,
            project_dir,
            output,
            config: effective.project,
        })
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.file)
    }

    /// Load and validate the project snapshot.
    pub fn load(&self) -> Result<Snapshot> {
        load_project(&self.store(), None)
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        save_project(&self.store(), snapshot, None)
    }
}

/// Fixed-precision hours for human output (`8`, `4.5`, `2.25`).
pub fn format_hours(hours: f64) -> String {
    let text = format!("{hours:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}h")
}
