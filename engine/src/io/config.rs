//! Engine configuration (TOML): scoring policy and complication model.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::complication::ComplicationModel;
use crate::core::scoring::ScoringPolicy;
use crate::io::fs_util::write_atomic;

/// Engine configuration.
///
/// Missing sections and fields fall back to the documented defaults, so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringPolicy,
    pub complications: ComplicationModel,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let mut errors = self.scoring.validate();
        errors.extend(self.complications.validate());
        if errors.is_empty() {
            return Ok(());
        }
        Err(anyhow!("invalid config: {}", errors.join("; ")))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &EngineConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = EngineConfig::default();
        cfg.scoring.order_penalty = 0.3;
        cfg.complications.default_probability = 0.5;
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    /// Partial files only override the fields they name.
    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[scoring]\nrisky_action_penalty = 0.25\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.scoring.risky_action_penalty, 0.25);
        assert_eq!(cfg.scoring.accuracy_weight, 0.6);
        assert_eq!(cfg.complications, ComplicationModel::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[complications]\ndefault_probability = 2.0\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("default_probability"));
    }
}
