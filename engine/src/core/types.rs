//! Shared deterministic types for engine core logic.
//!
//! These types define stable contracts between core components and are the
//! persisted shape of attempts and scores. Enums serialize as `snake_case`
//! labels so stored records stay readable and stable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clinical category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    History,
    Exam,
    Lab,
    Imaging,
}

impl FindingCategory {
    pub fn label(self) -> &'static str {
        match self {
            FindingCategory::History => "history",
            FindingCategory::Exam => "exam",
            FindingCategory::Lab => "lab",
            FindingCategory::Imaging => "imaging",
        }
    }
}

/// Role carried by the authenticated identity claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Student,
}

/// Opaque "authenticated identity + role" claim handed in by the caller.
///
/// The engine never authenticates; it only checks the role and ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
}

impl Identity {
    pub fn student(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Student,
        }
    }

    pub fn teacher(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Teacher,
        }
    }
}

/// Lifecycle status of an attempt.
///
/// `NotStarted → InProgress ⇄ Complicated → Submitted → Scored`, with
/// `Abandoned` reachable from the two active states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Complicated,
    Submitted,
    Scored,
    Abandoned,
}

impl AttemptStatus {
    /// Actions may only be applied in an active status.
    pub fn is_active(self) -> bool {
        matches!(self, AttemptStatus::InProgress | AttemptStatus::Complicated)
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Scored | AttemptStatus::Abandoned)
    }

    pub fn label(self) -> &'static str {
        match self {
            AttemptStatus::NotStarted => "not_started",
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Complicated => "complicated",
            AttemptStatus::Submitted => "submitted",
            AttemptStatus::Scored => "scored",
            AttemptStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Correctness of the submitted diagnosis label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisMatch {
    Exact,
    Partial,
    Incorrect,
}

/// Whether a log entry requested a finding directly or ordered an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryKind {
    Finding,
    Action,
}

/// One applied request in an attempt's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// 1-based position in the log; also the complication seed input.
    pub seq: u32,
    pub action_id: String,
    pub kind: InquiryKind,
    pub recorded_at: DateTime<Utc>,
    /// Findings revealed by this entry, in reveal order.
    pub revealed: Vec<String>,
    /// Findings the action triggers whose prerequisites were not yet met.
    #[serde(default)]
    pub withheld: Vec<String>,
    pub cost_charged: u32,
    #[serde(default)]
    pub complication: bool,
    #[serde(default)]
    pub resolved_complication: bool,
}

/// Final diagnosis and management plan, as structured selections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Submission {
    pub diagnosis: String,
    #[serde(default)]
    pub plan: Vec<String>,
    /// Explicit "give up" override: allows submitting with nothing revealed.
    #[serde(default)]
    pub give_up: bool,
}

impl Submission {
    pub fn new(diagnosis: impl Into<String>, plan: Vec<String>) -> Self {
        Self {
            diagnosis: diagnosis.into(),
            plan,
            give_up: false,
        }
    }

    pub fn giving_up(mut self) -> Self {
        self.give_up = true;
        self
    }
}

/// Normalize a structured label for comparison: trim, lowercase, and collapse
/// internal whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
