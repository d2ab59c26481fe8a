// ============================================================
// Layer 6 — Run Config Store
// ============================================================
// Saves the PipelineConfig of a run as out/run_config.json and
// reads it back. Written before any batch is produced, so even
// a run that fails halfway leaves a record of its settings.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::application::config::PipelineConfig;

const CONFIG_FILE: &str = "run_config.json";

pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn save(&self, cfg: &PipelineConfig) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(path)
    }

    pub fn load(&self) -> Result<PipelineConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        serde_json::from_str(&json)
            .with_context(|| format!("Invalid run config in '{}'", path.display()))
    }
}
