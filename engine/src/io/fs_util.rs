//! Store layout and atomic file writes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Directory layout of a file-backed store rooted at `root`.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    pub root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn cases_dir(&self) -> PathBuf {
        self.root.join("cases")
    }

    pub fn case_dir(&self, case_id: &str) -> PathBuf {
        self.cases_dir().join(case_id)
    }

    pub fn case_path(&self, case_id: &str, version: u32) -> PathBuf {
        self.case_dir(case_id).join(format!("v{}.toml", version))
    }

    pub fn attempts_dir(&self) -> PathBuf {
        self.root.join("attempts")
    }

    pub fn attempt_path(&self, attempt_id: &str) -> PathBuf {
        self.attempts_dir().join(format!("{}.json", attempt_id))
    }

    pub fn scores_dir(&self, attempt_id: &str) -> PathBuf {
        self.root.join("scores").join(attempt_id)
    }

    pub fn score_path(&self, attempt_id: &str, revision: u32) -> PathBuf {
        self.scores_dir(attempt_id).join(format!("r{}.json", revision))
    }
}

/// Serialize `value` as pretty JSON with a trailing newline.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(value).context("serialize json")?;
    buf.push('\n');
    Ok(buf)
}

/// Write `contents` to `path` via a sibling temp file and rename.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents).with_context(|| format!("write temp {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

/// Reject ids that would escape the store layout.
pub fn ensure_path_safe_id(kind: &str, id: &str) -> Result<()> {
    let safe = !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
        && id != "."
        && id != "..";
    anyhow::ensure!(safe, "{} id '{}' is not usable as a file name", kind, id);
    Ok(())
}
