//! Conductor configuration stored under `.conductor/state/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Conductor configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConductorConfig {
    /// Orientation turns after which the next prompt asks for the handover.
    pub orientation_nudge_after_turns: u32,

    /// Exploration turns after which the next prompt asks for the workflow signal.
    pub exploration_nudge_after_turns: u32,

    /// Truncate rendered prompts beyond this many bytes.
    pub prompt_budget_bytes: usize,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            orientation_nudge_after_turns: 4,
            exploration_nudge_after_turns: 6,
            prompt_budget_bytes: 40_000,
        }
    }
}

impl ConductorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.orientation_nudge_after_turns == 0 {
            return Err(anyhow!("orientation_nudge_after_turns must be > 0"));
        }
        if self.exploration_nudge_after_turns == 0 {
            return Err(anyhow!("exploration_nudge_after_turns must be > 0"));
        }
        if self.prompt_budget_bytes == 0 {
            return Err(anyhow!("prompt_budget_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ConductorConfig::default()`.
pub fn load_config(path: &Path) -> Result<ConductorConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = ConductorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ConductorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ConductorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
