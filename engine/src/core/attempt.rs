//! Attempt state machine.
//!
//! An attempt is one student's run through one case version. Its fields are
//! crate-private: the reveal engine is the only writer of the revealed set,
//! cost and log, and the transition methods below are the only writers of the
//! status. Every method validates first and mutates last, so a rejected call
//! leaves the attempt exactly as it was.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::case::Case;
use crate::core::scoring::{Score, ScoringPolicy, score};
use crate::core::types::{ActionLogEntry, AttemptStatus, Identity, Role, Submission};
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub(crate) id: String,
    pub(crate) case_id: String,
    pub(crate) case_version: u32,
    pub(crate) student: String,
    pub(crate) status: AttemptStatus,
    pub(crate) revealed: BTreeSet<String>,
    pub(crate) used_actions: BTreeSet<String>,
    pub(crate) log: Vec<ActionLogEntry>,
    pub(crate) cumulative_cost: u32,
    pub(crate) complications: u32,
    pub(crate) emergency_unlocked: bool,
    pub(crate) submission: Option<Submission>,
    /// Score revisions, oldest first. Never rewritten, only appended.
    pub(crate) scores: Vec<Score>,
}

impl Attempt {
    /// Create a `NotStarted` attempt for `student` on `case`.
    ///
    /// Only the student role may own attempts.
    pub fn new(id: impl Into<String>, case: &Case, student: &Identity) -> Result<Self, EngineError> {
        if student.role != Role::Student {
            return Err(EngineError::Forbidden {
                subject: student.subject.clone(),
                operation: "start an attempt",
            });
        }
        Ok(Self {
            id: id.into(),
            case_id: case.id().to_string(),
            case_version: case.version(),
            student: student.subject.clone(),
            status: AttemptStatus::NotStarted,
            revealed: BTreeSet::new(),
            used_actions: BTreeSet::new(),
            log: Vec::new(),
            cumulative_cost: 0,
            complications: 0,
            emergency_unlocked: false,
            submission: None,
            scores: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn case_version(&self) -> u32 {
        self.case_version
    }

    pub fn student(&self) -> &str {
        &self.student
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn revealed(&self) -> &BTreeSet<String> {
        &self.revealed
    }

    pub fn used_actions(&self) -> &BTreeSet<String> {
        &self.used_actions
    }

    pub fn log(&self) -> &[ActionLogEntry] {
        &self.log
    }

    pub fn cumulative_cost(&self) -> u32 {
        self.cumulative_cost
    }

    pub fn complications(&self) -> u32 {
        self.complications
    }

    pub fn emergency_unlocked(&self) -> bool {
        self.emergency_unlocked
    }

    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn latest_score(&self) -> Option<&Score> {
        self.scores.last()
    }

    /// `NotStarted → InProgress`.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.status != AttemptStatus::NotStarted {
            return Err(self.not_active());
        }
        self.revealed.clear();
        self.used_actions.clear();
        self.log.clear();
        self.cumulative_cost = 0;
        self.status = AttemptStatus::InProgress;
        Ok(())
    }

    /// `InProgress | Complicated → Submitted`.
    ///
    /// Requires at least one revealed finding unless the submission gives up.
    pub fn submit(&mut self, submission: Submission) -> Result<(), EngineError> {
        self.ensure_active()?;
        if self.revealed.is_empty() && !submission.give_up {
            return Err(EngineError::PrematureSubmission {
                attempt_id: self.id.clone(),
            });
        }
        self.submission = Some(submission);
        self.status = AttemptStatus::Submitted;
        Ok(())
    }

    /// `InProgress | Complicated → Abandoned`. Called by the student or by an
    /// external timeout policy.
    pub fn abandon(&mut self) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.status = AttemptStatus::Abandoned;
        Ok(())
    }

    /// `Submitted → Scored`.
    ///
    /// Idempotent: once scored, returns the latest stored score unless
    /// `rescore` is set, in which case a new revision is computed and appended.
    pub fn finalize_score(
        &mut self,
        case: &Case,
        policy: &ScoringPolicy,
        rescore: bool,
    ) -> Result<Score, EngineError> {
        match self.status {
            AttemptStatus::Submitted => {}
            AttemptStatus::Scored => {
                if !rescore && let Some(existing) = self.scores.last() {
                    return Ok(existing.clone());
                }
            }
            AttemptStatus::Abandoned => return Err(self.not_active()),
            status => {
                return Err(EngineError::NotSubmitted {
                    attempt_id: self.id.clone(),
                    status,
                });
            }
        }
        let mut computed = score(self, case, policy)?;
        computed.revision = self.scores.len() as u32 + 1;
        self.scores.push(computed.clone());
        self.status = AttemptStatus::Scored;
        Ok(computed)
    }

    /// Reject callers other than the owning student.
    pub fn ensure_owned_by(&self, identity: &Identity) -> Result<(), EngineError> {
        if identity.role == Role::Student && identity.subject == self.student {
            return Ok(());
        }
        Err(EngineError::Forbidden {
            subject: identity.subject.clone(),
            operation: "act on another student's attempt",
        })
    }

    pub(crate) fn ensure_active(&self) -> Result<(), EngineError> {
        if self.status.is_active() {
            Ok(())
        } else {
            Err(self.not_active())
        }
    }

    pub(crate) fn ensure_case(&self, case: &Case) -> Result<(), EngineError> {
        if self.case_id == case.id() && self.case_version == case.version() {
            return Ok(());
        }
        Err(EngineError::CaseMismatch {
            attempt_id: self.id.clone(),
            expected: format!("{}@v{}", self.case_id, self.case_version),
            actual: case.key(),
        })
    }

    fn not_active(&self) -> EngineError {
        EngineError::AttemptNotActive {
            attempt_id: self.id.clone(),
            status: self.status,
        }
    }
}
