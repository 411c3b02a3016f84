//! Scripted attempts: drive one attempt end to end from a TOML script.
//!
//! ```toml
//! attempt_id = "att-demo"
//! student = "student-1"
//! actions = ["history", "cbc", "cxr"]
//! diagnosis = "Community-acquired pneumonia"
//! plan = ["antibiotics"]
//! ```
//!
//! Complications are seeded by attempt id and sequence number, so the same
//! script against the same case version always produces the same score.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::attempt::Attempt;
use crate::core::case::Case;
use crate::core::scoring::Score;
use crate::core::types::{Identity, Submission};
use crate::engine::Engine;
use crate::io::attempt_store::save_attempt;
use crate::io::case_store::save_case;
use crate::io::fs_util::StoreLayout;
use crate::io::score_store::save_score;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayScript {
    pub attempt_id: String,
    pub student: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub give_up: bool,
    /// Abandon after the actions instead of submitting.
    #[serde(default)]
    pub abandon: bool,
}

pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read script {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parse script {}", path.display()))
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub attempt: Attempt,
    /// `None` when the script abandons the attempt.
    pub score: Option<Score>,
}

/// Run `script` against `case`, optionally persisting the case, attempt and
/// score under `store`.
///
/// A rejected step stops the replay; nothing is persisted in that case.
pub fn run_replay(
    engine: &Engine,
    case: &Case,
    script: &ReplayScript,
    store: Option<&StoreLayout>,
) -> Result<ReplayOutcome> {
    let student = Identity::student(script.student.clone());
    let mut attempt = engine
        .start_attempt_with_id(script.attempt_id.clone(), case, &student)
        .context("start attempt")?;

    for action_id in &script.actions {
        engine
            .apply_action(&mut attempt, case, action_id)
            .with_context(|| format!("apply '{}'", action_id))?;
    }

    let score = if script.abandon {
        engine.abandon(&mut attempt).context("abandon attempt")?;
        None
    } else {
        let submission = Submission {
            diagnosis: script.diagnosis.clone(),
            plan: script.plan.clone(),
            give_up: script.give_up,
        };
        engine
            .submit_with(&mut attempt, submission)
            .context("submit attempt")?;
        Some(
            engine
                .finalize_score(&mut attempt, case)
                .context("finalize score")?,
        )
    };

    if let Some(layout) = store {
        save_case(layout, case)?;
        save_attempt(layout, &attempt)?;
        if let Some(score) = &score {
            save_score(layout, score)?;
        }
    }

    Ok(ReplayOutcome { attempt, score })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::io::attempt_store::load_attempt;
    use crate::io::score_store::load_scores;
    use crate::test_support::{temp_store, two_finding_case};

    fn script(actions: &[&str]) -> ReplayScript {
        ReplayScript {
            attempt_id: "att-replay".to_string(),
            student: "student-1".to_string(),
            actions: actions.iter().map(|id| id.to_string()).collect(),
            diagnosis: "Community-acquired pneumonia".to_string(),
            plan: vec!["antibiotics".to_string()],
            give_up: false,
            abandon: false,
        }
    }

    #[test]
    fn parses_script_with_defaults() {
        let parsed: ReplayScript =
            toml::from_str("attempt_id = \"x\"\nstudent = \"s\"\ngive_up = true\n").expect("parse");
        assert!(parsed.actions.is_empty());
        assert!(parsed.give_up);
        assert!(!parsed.abandon);
    }

    /// A replay persists the case, the attempt and its score revision.
    #[test]
    fn replay_persists_records() {
        let temp = temp_store();
        let layout = StoreLayout::new(temp.path());
        let case = two_finding_case();

        let outcome =
            run_replay(&Engine::default(), &case, &script(&["a", "b"]), Some(&layout)).expect("replay");
        let score = outcome.score.expect("score");
        assert_eq!(score.points, 100);

        assert!(layout.case_path("cough-fever", 1).exists());
        assert_eq!(load_attempt(&layout, "att-replay").expect("attempt").log().len(), 2);
        assert_eq!(load_scores(&layout, "att-replay").expect("scores"), vec![score]);
    }

    /// A rejected step surfaces the engine error and persists nothing.
    #[test]
    fn rejected_step_stops_replay() {
        let temp = temp_store();
        let layout = StoreLayout::new(temp.path());
        let case = two_finding_case();

        let err = run_replay(&Engine::default(), &case, &script(&["b"]), Some(&layout))
            .expect_err("b before a");
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::ActionUnavailable { .. })
        ));
        assert!(!layout.attempt_path("att-replay").exists());
    }

    #[test]
    fn abandon_script_produces_no_score() {
        let mut abandoning = script(&["a"]);
        abandoning.abandon = true;
        let outcome =
            run_replay(&Engine::default(), &two_finding_case(), &abandoning, None).expect("replay");
        assert!(outcome.score.is_none());
        assert_eq!(
            outcome.attempt.status(),
            crate::core::types::AttemptStatus::Abandoned
        );
    }
}
