//! Initialization helpers for `.conductor/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use tracing::info;

use super::config::{ConductorConfig, write_config};
use super::session_store::{Session, write_session};

/// All canonical paths within `.conductor/` for a project root.
#[derive(Debug, Clone)]
pub struct ConductorPaths {
    pub root: PathBuf,
    pub conductor_dir: PathBuf,
    pub state_dir: PathBuf,
    pub turns_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub config_path: PathBuf,
    pub session_path: PathBuf,
    pub next_prompt_path: PathBuf,
}

impl ConductorPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let conductor_dir = root.join(".conductor");
        let state_dir = conductor_dir.join("state");
        Self {
            root: root.clone(),
            conductor_dir: conductor_dir.clone(),
            state_dir: state_dir.clone(),
            turns_dir: conductor_dir.join("turns"),
            gitignore_path: conductor_dir.join(".gitignore"),
            config_path: state_dir.join("config.toml"),
            session_path: state_dir.join("session.json"),
            next_prompt_path: conductor_dir.join("next_prompt.md"),
        }
    }
}

/// Options for `init_conductor`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing conductor-owned files.
    pub force: bool,
}

/// Create `.conductor/` scaffolding in `root` with a fresh session.
///
/// Fails if `.conductor/` already exists unless `options.force` is set.
pub fn init_conductor(root: &Path, options: &InitOptions) -> Result<ConductorPaths> {
    let paths = ConductorPaths::new(root);
    if paths.conductor_dir.exists() && !options.force {
        return Err(anyhow!(
            "conductor init: .conductor already exists (use --force to overwrite)"
        ));
    }
    if paths.conductor_dir.exists() && !paths.conductor_dir.is_dir() {
        return Err(anyhow!(
            "conductor init: .conductor exists but is not a directory"
        ));
    }

    create_dir(&paths.conductor_dir)?;
    create_dir(&paths.state_dir)?;
    if paths.turns_dir.exists() {
        // Turn numbers restart at 1.
        fs::remove_dir_all(&paths.turns_dir)
            .with_context(|| format!("clear turn logs {}", paths.turns_dir.display()))?;
    }
    create_dir(&paths.turns_dir)?;

    write_file(&paths.gitignore_path, CONDUCTOR_GITIGNORE)?;
    write_config(&paths.config_path, &ConductorConfig::default())?;
    let session = Session {
        session_id: Some(new_session_id()),
        ..Session::default()
    };
    write_session(&paths.session_path, &session)?;
    write_file(&paths.next_prompt_path, NEXT_PROMPT_PLACEHOLDER)?;

    info!(root = %root.display(), session_id = ?session.session_id, "initialized conductor");
    Ok(paths)
}

fn new_session_id() -> String {
    format!("session-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"))
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("write file {}", path.display()))
}

const NEXT_PROMPT_PLACEHOLDER: &str = "# Next prompt\n\nGenerated by `conductor turn`.\n";
const CONDUCTOR_GITIGNORE: &str = "turns/\nnext_prompt.md\n";
