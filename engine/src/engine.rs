//! Engine facade: the call contract consumed by collaborators.
//!
//! The facade holds configuration only. Attempts are owned by the caller (or
//! wrapped in a [`crate::shared::SharedAttempt`] when shared across threads),
//! and cases are handed out as `Arc<Case>` so every attempt on a case version
//! reads the same validated definition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};
use tracing::{info, instrument, warn};

use crate::core::attempt::Attempt;
use crate::core::case::{Case, CaseDefinition};
use crate::core::reveal::{Frontier, apply_action, frontier};
use crate::core::scoring::Score;
use crate::core::types::{ActionLogEntry, Identity, Submission};
use crate::error::EngineError;
use crate::io::config::EngineConfig;

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Build an engine after validating `config`; the scoring policy and
    /// complication model are trusted from here on.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a definition into a shareable case.
    #[instrument(skip_all, fields(case_id = %definition.id, version = definition.version))]
    pub fn load_case(&self, definition: CaseDefinition) -> Result<Arc<Case>, EngineError> {
        match Case::from_definition(definition) {
            Ok(case) => {
                info!(
                    findings = case.findings().len(),
                    actions = case.actions().len(),
                    "case loaded"
                );
                Ok(Arc::new(case))
            }
            Err(err) => {
                warn!(error = %err, "case rejected");
                Err(err)
            }
        }
    }

    /// Start an attempt with a generated id.
    pub fn start_attempt(&self, case: &Case, student: &Identity) -> Result<Attempt, EngineError> {
        self.start_attempt_with_id(generate_attempt_id(Utc::now()), case, student)
    }

    /// Start an attempt under a caller-chosen id (replays, imports).
    #[instrument(skip_all, fields(case = %case.key(), student = %student.subject))]
    pub fn start_attempt_with_id(
        &self,
        attempt_id: impl Into<String>,
        case: &Case,
        student: &Identity,
    ) -> Result<Attempt, EngineError> {
        let mut attempt = Attempt::new(attempt_id, case, student).inspect_err(log_rejection)?;
        attempt.start()?;
        info!(attempt_id = attempt.id(), "attempt started");
        Ok(attempt)
    }

    #[instrument(skip_all, fields(attempt_id = attempt.id(), action_id = %action_id))]
    pub fn apply_action(
        &self,
        attempt: &mut Attempt,
        case: &Case,
        action_id: &str,
    ) -> Result<ActionLogEntry, EngineError> {
        self.apply_action_at(attempt, case, action_id, Utc::now())
    }

    /// [`Engine::apply_action`] with an explicit log timestamp.
    pub fn apply_action_at(
        &self,
        attempt: &mut Attempt,
        case: &Case,
        action_id: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<ActionLogEntry, EngineError> {
        let entry = apply_action(
            attempt,
            case,
            action_id,
            &self.config.complications,
            recorded_at,
        )
        .inspect_err(log_rejection)?;
        if entry.complication {
            info!(
                attempt_id = attempt.id(),
                seq = entry.seq,
                "complication triggered"
            );
        } else if entry.resolved_complication {
            info!(attempt_id = attempt.id(), seq = entry.seq, "complication resolved");
        }
        Ok(entry)
    }

    pub fn frontier<'a>(&self, attempt: &Attempt, case: &'a Case) -> Frontier<'a> {
        frontier(attempt, case)
    }

    #[instrument(skip_all, fields(attempt_id = attempt.id()))]
    pub fn submit(
        &self,
        attempt: &mut Attempt,
        diagnosis: &str,
        plan: Vec<String>,
    ) -> Result<(), EngineError> {
        self.submit_with(attempt, Submission::new(diagnosis, plan))
    }

    /// Submit a prepared submission (including the give-up override).
    pub fn submit_with(&self, attempt: &mut Attempt, submission: Submission) -> Result<(), EngineError> {
        attempt.submit(submission).inspect_err(log_rejection)?;
        info!(attempt_id = attempt.id(), "attempt submitted");
        Ok(())
    }

    /// Score a submitted attempt, or return its existing score.
    #[instrument(skip_all, fields(attempt_id = attempt.id()))]
    pub fn finalize_score(&self, attempt: &mut Attempt, case: &Case) -> Result<Score, EngineError> {
        let score = attempt
            .finalize_score(case, &self.config.scoring, false)
            .inspect_err(log_rejection)?;
        info!(revision = score.revision, points = score.points, "attempt scored");
        Ok(score)
    }

    /// Compute and append a new score revision under the current policy.
    #[instrument(skip_all, fields(attempt_id = attempt.id()))]
    pub fn rescore(&self, attempt: &mut Attempt, case: &Case) -> Result<Score, EngineError> {
        let score = attempt
            .finalize_score(case, &self.config.scoring, true)
            .inspect_err(log_rejection)?;
        info!(revision = score.revision, points = score.points, "attempt rescored");
        Ok(score)
    }

    #[instrument(skip_all, fields(attempt_id = attempt.id()))]
    pub fn abandon(&self, attempt: &mut Attempt) -> Result<(), EngineError> {
        attempt.abandon().inspect_err(log_rejection)?;
        info!("attempt abandoned");
        Ok(())
    }
}

fn log_rejection(err: &EngineError) {
    warn!(error = %err, "operation rejected");
}

/// `att-<timestamp>-<random suffix>`.
pub fn generate_attempt_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix = std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(6)
        .collect::<String>()
        .to_lowercase();
    format!("att-{}-{}", now.format("%Y%m%d_%H%M%S"), suffix)
}
