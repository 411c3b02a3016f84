//! Case model: the authored definition and its validated, read-only form.
//!
//! A [`CaseDefinition`] is plain authored data. A [`Case`] can only be built by
//! validating a definition, so holding a `Case` means the prerequisite graph is
//! a DAG and every referenced id exists. `Case` serializes back to its
//! definition, which keeps stored cases round-trippable.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::invariants::validate_case_definition;
use crate::core::types::{FindingCategory, InquiryKind};
use crate::error::EngineError;

/// Authored case, as read from a case file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDefinition {
    /// Slug identifier (`[a-z0-9_-]+`).
    pub id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub title: String,
    /// Patient vignette shown when the attempt starts.
    pub vignette: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Demographic facts shown alongside the vignette.
    #[serde(default)]
    pub patient: BTreeMap<String, String>,
    #[serde(default)]
    pub findings: Vec<FindingNode>,
    #[serde(default)]
    pub actions: Vec<ActionOption>,
    pub reference: ReferencePathway,
}

fn default_version() -> u32 {
    1
}

/// A revealable piece of clinical information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingNode {
    pub id: String,
    pub category: FindingCategory,
    /// Findings that must be revealed before this one becomes available.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub content: String,
    #[serde(default)]
    pub reveal_cost: u32,
    /// Only revealable after a complication has unlocked the emergency set.
    #[serde(default)]
    pub emergency: bool,
}

/// An orderable action (test, procedure, treatment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOption {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub cost: u32,
    #[serde(default)]
    pub risky: bool,
    #[serde(default)]
    pub single_use: bool,
    #[serde(default)]
    pub triggers: ActionTriggers,
    /// Overrides the configured complication probability for this action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complication_probability: Option<f64>,
    /// Applying this action while complicated returns the attempt to in-progress.
    #[serde(default)]
    pub resolves_complication: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionTriggers {
    /// Findings revealed by the action, subject to their prerequisites.
    #[serde(default)]
    pub reveals: Vec<String>,
    /// The action always complicates when risky.
    #[serde(default)]
    pub complication: bool,
}

/// Expert-defined ground truth for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePathway {
    /// Minimal sufficient set of finding/action ids.
    pub required: Vec<String>,
    /// When true, `required` is also the expected order.
    #[serde(default)]
    pub ordered: bool,
    pub diagnosis: String,
    /// Acceptable near-miss diagnoses, earning partial credit.
    #[serde(default)]
    pub near_misses: Vec<String>,
    #[serde(default)]
    pub management_plan: Vec<String>,
}

/// A validated, immutable case. Safe to share across attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CaseDefinition", into = "CaseDefinition")]
pub struct Case {
    definition: CaseDefinition,
    finding_index: BTreeMap<String, usize>,
    action_index: BTreeMap<String, usize>,
}

impl TryFrom<CaseDefinition> for Case {
    type Error = EngineError;

    fn try_from(definition: CaseDefinition) -> Result<Self, Self::Error> {
        Case::from_definition(definition)
    }
}

impl From<Case> for CaseDefinition {
    fn from(case: Case) -> Self {
        case.definition
    }
}

impl Case {
    /// Validate a definition and build the case, or fail with every violation.
    pub fn from_definition(definition: CaseDefinition) -> Result<Self, EngineError> {
        let errors = validate_case_definition(&definition);
        if !errors.is_empty() {
            return Err(EngineError::MalformedCase(errors));
        }
        let finding_index = definition
            .findings
            .iter()
            .enumerate()
            .map(|(index, finding)| (finding.id.clone(), index))
            .collect();
        let action_index = definition
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| (action.id.clone(), index))
            .collect();
        Ok(Self {
            definition,
            finding_index,
            action_index,
        })
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn version(&self) -> u32 {
        self.definition.version
    }

    /// `<id>@v<version>`, the key attempts and scores refer to.
    pub fn key(&self) -> String {
        format!("{}@v{}", self.definition.id, self.definition.version)
    }

    pub fn title(&self) -> &str {
        &self.definition.title
    }

    pub fn definition(&self) -> &CaseDefinition {
        &self.definition
    }

    pub fn reference(&self) -> &ReferencePathway {
        &self.definition.reference
    }

    pub fn findings(&self) -> &[FindingNode] {
        &self.definition.findings
    }

    pub fn actions(&self) -> &[ActionOption] {
        &self.definition.actions
    }

    pub fn finding(&self, id: &str) -> Option<&FindingNode> {
        self.finding_index
            .get(id)
            .map(|&index| &self.definition.findings[index])
    }

    pub fn action(&self, id: &str) -> Option<&ActionOption> {
        self.action_index
            .get(id)
            .map(|&index| &self.definition.actions[index])
    }

    /// Which namespace an id belongs to, if any.
    pub fn kind_of(&self, id: &str) -> Option<InquiryKind> {
        if self.finding_index.contains_key(id) {
            Some(InquiryKind::Finding)
        } else if self.action_index.contains_key(id) {
            Some(InquiryKind::Action)
        } else {
            None
        }
    }

    /// Cost of requesting a finding or ordering an action by id.
    pub fn cost_of(&self, id: &str) -> Option<u32> {
        match self.kind_of(id)? {
            InquiryKind::Finding => self.finding(id).map(|finding| finding.reveal_cost),
            InquiryKind::Action => self.action(id).map(|action| action.cost),
        }
    }

    /// Findings whose prerequisites are all in `revealed` (the DAG frontier,
    /// revealed findings included). Emergency findings are excluded.
    pub fn available_findings(&self, revealed: &BTreeSet<String>) -> Vec<&FindingNode> {
        self.available_findings_with(revealed, false)
    }

    /// Like [`Case::available_findings`], optionally including the emergency set.
    pub fn available_findings_with(
        &self,
        revealed: &BTreeSet<String>,
        emergency_unlocked: bool,
    ) -> Vec<&FindingNode> {
        self.definition
            .findings
            .iter()
            .filter(|finding| emergency_unlocked || !finding.emergency)
            .filter(|finding| prerequisites_met(finding, revealed))
            .collect()
    }

    /// Actions that are not exhausted (single-use actions already in `used`).
    pub fn available_actions(&self, used: &BTreeSet<String>) -> Vec<&ActionOption> {
        self.definition
            .actions
            .iter()
            .filter(|action| !(action.single_use && used.contains(&action.id)))
            .collect()
    }

    /// Sum of costs of the reference pathway's required items, widened so
    /// any set of `u32` costs fits.
    pub fn reference_cost(&self) -> u64 {
        self.definition
            .reference
            .required
            .iter()
            .filter_map(|id| self.cost_of(id))
            .map(u64::from)
            .sum()
    }
}

pub(crate) fn prerequisites_met(finding: &FindingNode, revealed: &BTreeSet<String>) -> bool {
    finding
        .prerequisites
        .iter()
        .all(|prerequisite| revealed.contains(prerequisite))
}
