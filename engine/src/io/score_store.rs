//! Score revisions under `<root>/scores/<attempt_id>/r<revision>.json`.
//!
//! Each revision file is created once and never rewritten. Revisions are
//! written to a temp file in the same directory and linked into place only
//! when complete, so a failed write never leaves a partial `r<n>.json`.

use std::fs;
use std::io::{ErrorKind, Write};

use anyhow::{Context, Result, anyhow};
use tempfile::NamedTempFile;

use crate::core::scoring::Score;
use crate::io::fs_util::{StoreLayout, ensure_path_safe_id, to_pretty_json};

/// Persist one score revision. Re-saving an identical revision is a no-op.
pub fn save_score(layout: &StoreLayout, score: &Score) -> Result<()> {
    ensure_path_safe_id("attempt", &score.attempt_id)?;
    let path = layout.score_path(&score.attempt_id, score.revision);
    let dir = layout.scores_dir(&score.attempt_id);
    fs::create_dir_all(&dir).with_context(|| format!("create directory {}", dir.display()))?;
    let buf = to_pretty_json(score)?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(buf.as_bytes())
        .with_context(|| format!("write score {}", path.display()))?;

    match tmp.persist_noclobber(&path) {
        Ok(_) => {
            tracing::info!(
                attempt_id = %score.attempt_id,
                revision = score.revision,
                points = score.points,
                "stored score"
            );
            Ok(())
        }
        Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
            let existing = fs::read_to_string(&path)
                .with_context(|| format!("read score {}", path.display()))?;
            if existing == buf {
                return Ok(());
            }
            Err(anyhow!(
                "score revision {} for attempt '{}' already stored; scores are immutable",
                score.revision,
                score.attempt_id
            ))
        }
        Err(err) => Err(err.error).with_context(|| format!("store score {}", path.display())),
    }
}

/// Every stored revision for `attempt_id`, oldest first.
pub fn load_scores(layout: &StoreLayout, attempt_id: &str) -> Result<Vec<Score>> {
    ensure_path_safe_id("attempt", attempt_id)?;
    let dir = layout.scores_dir(attempt_id);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut scores = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry.context("read entry")?.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let score: Score = serde_json::from_str(&contents)
            .with_context(|| format!("parse score {}", path.display()))?;
        scores.push(score);
    }
    scores.sort_by_key(|score| score.revision);
    Ok(scores)
}

pub fn latest_score(layout: &StoreLayout, attempt_id: &str) -> Result<Option<Score>> {
    Ok(load_scores(layout, attempt_id)?.pop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DiagnosisMatch;

    fn sample(revision: u32, points: u32) -> Score {
        Score {
            attempt_id: "att-1".to_string(),
            case_id: "cough-fever".to_string(),
            case_version: 1,
            revision,
            accuracy: 1.0,
            efficiency: 0.5,
            safety_penalty: 0.0,
            diagnosis: DiagnosisMatch::Exact,
            plan_coverage: 1.0,
            total: f64::from(points) / 100.0,
            points,
            feedback: vec!["diagnosis matches the reference".to_string()],
        }
    }

    #[test]
    fn revisions_load_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        save_score(&layout, &sample(2, 70)).expect("r2");
        save_score(&layout, &sample(1, 80)).expect("r1");

        let scores = load_scores(&layout, "att-1").expect("load");
        assert_eq!(scores.iter().map(|s| s.revision).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(latest_score(&layout, "att-1").expect("latest").map(|s| s.points), Some(70));
    }

    /// A stored revision can be re-saved unchanged but never replaced.
    #[test]
    fn revisions_are_immutable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        save_score(&layout, &sample(1, 80)).expect("first");
        save_score(&layout, &sample(1, 80)).expect("identical");
        let err = save_score(&layout, &sample(1, 10)).expect_err("replace");
        assert!(err.to_string().contains("immutable"));
    }

    /// A failed save leaves no revision file behind, so the revision can be saved later.
    #[test]
    fn failed_save_leaves_no_partial_revision() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        // A plain file where the scores directory belongs makes the save fail.
        fs::create_dir_all(temp.path().join("scores")).expect("scores dir");
        let blocker = layout.scores_dir("att-1");
        fs::write(&blocker, "").expect("blocker");

        assert!(save_score(&layout, &sample(1, 80)).is_err());
        assert!(!layout.score_path("att-1", 1).exists());

        fs::remove_file(&blocker).expect("remove blocker");
        save_score(&layout, &sample(1, 80)).expect("retry");
        assert_eq!(load_scores(&layout, "att-1").expect("load"), vec![sample(1, 80)]);
        let entries = fs::read_dir(layout.scores_dir("att-1")).expect("read dir").count();
        assert_eq!(entries, 1, "no temp files left next to the revision");
    }

    #[test]
    fn missing_attempt_has_no_scores() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        assert!(load_scores(&layout, "att-9").expect("load").is_empty());
    }
}
