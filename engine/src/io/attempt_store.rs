//! Attempt records under `<root>/attempts/<id>.json`.
//!
//! Records are rewritten atomically on every save, but the action log and the
//! score revisions are append-only: a save whose log does not extend the stored
//! log is refused.

use std::fs;

use anyhow::{Context, Result, anyhow};

use crate::core::attempt::Attempt;
use crate::io::fs_util::{StoreLayout, ensure_path_safe_id, to_pretty_json, write_atomic};

pub fn save_attempt(layout: &StoreLayout, attempt: &Attempt) -> Result<()> {
    ensure_path_safe_id("attempt", attempt.id())?;
    let path = layout.attempt_path(attempt.id());
    if path.exists() {
        let stored = load_attempt(layout, attempt.id())?;
        ensure_extends(&stored, attempt)?;
    }
    write_atomic(&path, &to_pretty_json(attempt)?)?;
    tracing::debug!(
        attempt_id = attempt.id(),
        status = %attempt.status(),
        entries = attempt.log().len(),
        "stored attempt"
    );
    Ok(())
}

pub fn load_attempt(layout: &StoreLayout, attempt_id: &str) -> Result<Attempt> {
    ensure_path_safe_id("attempt", attempt_id)?;
    let path = layout.attempt_path(attempt_id);
    let contents =
        fs::read_to_string(&path).with_context(|| format!("read attempt {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse attempt {}", path.display()))
}

/// Load every stored attempt, sorted by id. Unreadable records are returned
/// as warnings rather than failing the whole listing.
pub fn list_attempts(layout: &StoreLayout) -> Result<(Vec<Attempt>, Vec<String>)> {
    let dir = layout.attempts_dir();
    let mut attempts = Vec::new();
    let mut warnings = Vec::new();
    if !dir.exists() {
        return Ok((attempts, warnings));
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry.context("read entry")?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    for path in paths {
        let parsed = fs::read_to_string(&path)
            .with_context(|| format!("read {}", path.display()))
            .and_then(|contents| {
                serde_json::from_str::<Attempt>(&contents).context("parse attempt")
            });
        match parsed {
            Ok(attempt) => attempts.push(attempt),
            Err(err) => warnings.push(format!("skip {}: {err:#}", path.display())),
        }
    }
    Ok((attempts, warnings))
}

fn ensure_extends(stored: &Attempt, next: &Attempt) -> Result<()> {
    if stored.case_id() != next.case_id()
        || stored.case_version() != next.case_version()
        || stored.student() != next.student()
    {
        return Err(anyhow!(
            "attempt '{}' identity changed (case or student differs from stored record)",
            next.id()
        ));
    }
    if !next.log().starts_with(stored.log()) {
        return Err(anyhow!(
            "attempt '{}' action log is append-only; stored {} entries are not a prefix",
            next.id(),
            stored.log().len()
        ));
    }
    if !next.scores().starts_with(stored.scores()) {
        return Err(anyhow!(
            "attempt '{}' score revisions are append-only",
            next.id()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::complication::ComplicationModel;
    use crate::core::reveal::apply_action;
    use crate::test_support::{fixed_time, started_attempt, two_finding_case};

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        let case = two_finding_case();
        let mut attempt = started_attempt(&case, "att-1");
        apply_action(&mut attempt, &case, "a", &ComplicationModel::default(), fixed_time())
            .expect("a");

        save_attempt(&layout, &attempt).expect("save");
        let loaded = load_attempt(&layout, "att-1").expect("load");
        assert_eq!(loaded, attempt);
    }

    /// Extending the log saves; rewriting history is refused.
    #[test]
    fn action_log_is_append_only() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        let case = two_finding_case();
        let model = ComplicationModel::default();

        let mut attempt = started_attempt(&case, "att-1");
        apply_action(&mut attempt, &case, "a", &model, fixed_time()).expect("a");
        save_attempt(&layout, &attempt).expect("save a");
        apply_action(&mut attempt, &case, "b", &model, fixed_time()).expect("b");
        save_attempt(&layout, &attempt).expect("save b");

        let fresh = started_attempt(&case, "att-1");
        let err = save_attempt(&layout, &fresh).expect_err("truncated log");
        assert!(err.to_string().contains("append-only"));
        assert_eq!(load_attempt(&layout, "att-1").expect("load").log().len(), 2);
    }

    #[test]
    fn list_skips_unreadable_records() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(temp.path());
        let case = two_finding_case();
        save_attempt(&layout, &started_attempt(&case, "att-1")).expect("save 1");
        save_attempt(&layout, &started_attempt(&case, "att-2")).expect("save 2");
        fs::write(layout.attempt_path("broken"), "{").expect("write broken");

        let (attempts, warnings) = list_attempts(&layout).expect("list");
        let ids: Vec<&str> = attempts.iter().map(|attempt| attempt.id()).collect();
        assert_eq!(ids, vec!["att-1", "att-2"]);
        assert_eq!(warnings.len(), 1);
    }
}
