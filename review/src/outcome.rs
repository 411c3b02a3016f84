use serde::{Deserialize, Serialize};

use engine::core::attempt::Attempt;
use engine::core::types::{AttemptStatus, DiagnosisMatch};

/// Where a stored attempt ended up, for reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Exact,
    Partial,
    Incorrect,
    Abandoned,
    /// Not started, in progress, complicated or submitted but unscored.
    Open,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Exact => "exact",
            Outcome::Partial => "partial",
            Outcome::Incorrect => "incorrect",
            Outcome::Abandoned => "abandoned",
            Outcome::Open => "open",
        }
    }

    pub const ALL: [Outcome; 5] = [
        Outcome::Exact,
        Outcome::Partial,
        Outcome::Incorrect,
        Outcome::Abandoned,
        Outcome::Open,
    ];
}

/// Classify by status, using the latest score revision for scored attempts.
pub fn classify_outcome(attempt: &Attempt) -> Outcome {
    match attempt.status() {
        AttemptStatus::Abandoned => Outcome::Abandoned,
        AttemptStatus::Scored => match attempt.latest_score().map(|score| score.diagnosis) {
            Some(DiagnosisMatch::Exact) => Outcome::Exact,
            Some(DiagnosisMatch::Partial) => Outcome::Partial,
            Some(DiagnosisMatch::Incorrect) => Outcome::Incorrect,
            None => Outcome::Open,
        },
        _ => Outcome::Open,
    }
}
