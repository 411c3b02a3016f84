//! Scoring engine: a pure function from a submitted attempt and its case to a
//! structured [`Score`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::attempt::Attempt;
use crate::core::case::Case;
use crate::core::types::{DiagnosisMatch, InquiryKind, normalize_label};
use crate::error::EngineError;

/// Tunable scoring weights and penalties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub full_credit: f64,
    pub partial_credit: f64,
    /// Efficiency factor lost per omitted required item.
    pub omission_penalty: f64,
    /// Floor for the omission factor; omissions never zero efficiency.
    pub min_omission_factor: f64,
    pub order_penalty: f64,
    pub risky_action_penalty: f64,
    pub complication_penalty: f64,
    pub accuracy_weight: f64,
    pub efficiency_weight: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            full_credit: 1.0,
            partial_credit: 0.5,
            omission_penalty: 0.15,
            min_omission_factor: 0.25,
            order_penalty: 0.1,
            risky_action_penalty: 0.1,
            complication_penalty: 0.2,
            accuracy_weight: 0.6,
            efficiency_weight: 0.4,
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let fields = [
            ("full_credit", self.full_credit),
            ("partial_credit", self.partial_credit),
            ("omission_penalty", self.omission_penalty),
            ("min_omission_factor", self.min_omission_factor),
            ("order_penalty", self.order_penalty),
            ("risky_action_penalty", self.risky_action_penalty),
            ("complication_penalty", self.complication_penalty),
            ("accuracy_weight", self.accuracy_weight),
            ("efficiency_weight", self.efficiency_weight),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("scoring.{name} {value} outside [0, 1]"));
            }
        }
        if self.min_omission_factor <= 0.0 {
            errors.push("scoring.min_omission_factor must be > 0".to_string());
        }
        if ((self.accuracy_weight + self.efficiency_weight) - 1.0).abs() > 1e-9 {
            errors.push("scoring.accuracy_weight + efficiency_weight must equal 1".to_string());
        }
        if self.partial_credit > self.full_credit {
            errors.push("scoring.partial_credit must not exceed full_credit".to_string());
        }
        errors
    }
}

/// Immutable evaluation of one submitted attempt. Rescoring creates a new
/// revision rather than editing an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub attempt_id: String,
    pub case_id: String,
    pub case_version: u32,
    pub revision: u32,
    pub accuracy: f64,
    pub efficiency: f64,
    pub safety_penalty: f64,
    pub diagnosis: DiagnosisMatch,
    /// Fraction of the canonical management plan the student selected.
    pub plan_coverage: f64,
    pub total: f64,
    pub points: u32,
    pub feedback: Vec<String>,
}

/// Score a submitted attempt against its case.
///
/// Deterministic and side-effect free: the attempt is only read. The returned
/// score carries revision 1; [`Attempt::finalize_score`] assigns the real one.
pub fn score(attempt: &Attempt, case: &Case, policy: &ScoringPolicy) -> Result<Score, EngineError> {
    attempt.ensure_case(case)?;
    let submission = attempt
        .submission
        .as_ref()
        .ok_or_else(|| EngineError::NotSubmitted {
            attempt_id: attempt.id.clone(),
            status: attempt.status,
        })?;
    let reference = case.reference();
    let mut feedback = Vec::new();

    let diagnosis = match_diagnosis(&submission.diagnosis, &reference.diagnosis, &reference.near_misses);
    let guessed = attempt.revealed.is_empty();
    let accuracy = if guessed {
        0.0
    } else {
        match diagnosis {
            DiagnosisMatch::Exact => policy.full_credit,
            DiagnosisMatch::Partial => policy.partial_credit,
            DiagnosisMatch::Incorrect => 0.0,
        }
    };

    let obtained_at = first_obtained(attempt);
    let missing: Vec<&str> = reference
        .required
        .iter()
        .map(String::as_str)
        .filter(|id| !obtained_at.contains_key(*id))
        .collect();
    let out_of_order = reference.ordered && !in_reference_order(&reference.required, &obtained_at);

    let reference_cost = case.reference_cost();
    let actual_cost = u64::from(attempt.cumulative_cost);
    let ratio = if actual_cost == 0 {
        1.0
    } else {
        (reference_cost as f64 / actual_cost as f64).min(1.0)
    };
    let omission_factor = (1.0 - policy.omission_penalty * missing.len() as f64)
        .max(policy.min_omission_factor);
    let order_factor = if out_of_order {
        1.0 - policy.order_penalty
    } else {
        1.0
    };
    let efficiency = (ratio * omission_factor * order_factor).clamp(0.0, 1.0);

    let required: BTreeSet<&str> = reference.required.iter().map(String::as_str).collect();
    // Each logged run counts separately.
    let risky_runs: Vec<&str> = attempt
        .log
        .iter()
        .filter(|entry| entry.kind == InquiryKind::Action)
        .map(|entry| entry.action_id.as_str())
        .filter(|id| !required.contains(id))
        .filter(|id| case.action(id).is_some_and(|action| action.risky))
        .collect();
    let risky_unreferenced: BTreeSet<&str> = risky_runs.iter().copied().collect();
    let safety_penalty = risky_runs.len() as f64 * policy.risky_action_penalty
        + f64::from(attempt.complications) * policy.complication_penalty;

    let selected: BTreeSet<String> = submission.plan.iter().map(|item| normalize_label(item)).collect();
    let missing_plan: Vec<&str> = reference
        .management_plan
        .iter()
        .filter(|item| !selected.contains(&normalize_label(item)))
        .map(String::as_str)
        .collect();
    let plan_coverage = if reference.management_plan.is_empty() {
        1.0
    } else {
        (reference.management_plan.len() - missing_plan.len()) as f64
            / reference.management_plan.len() as f64
    };

    let total = (policy.accuracy_weight * accuracy + policy.efficiency_weight * efficiency
        - safety_penalty)
        .clamp(0.0, 1.0);
    let points = (total * 100.0).round() as u32;

    match diagnosis {
        DiagnosisMatch::Exact => feedback.push("diagnosis matches the reference".to_string()),
        DiagnosisMatch::Partial => feedback.push(format!(
            "diagnosis is a near miss; expected '{}'",
            reference.diagnosis
        )),
        DiagnosisMatch::Incorrect => {
            feedback.push(format!("diagnosis incorrect; expected '{}'", reference.diagnosis));
        }
    }
    if !missing.is_empty() {
        feedback.push(format!("missed required items: {}", missing.join(", ")));
    }
    if out_of_order {
        feedback.push("required items obtained out of the expected order".to_string());
    }
    if actual_cost > reference_cost {
        feedback.push(format!(
            "spent {} against a reference cost of {}",
            actual_cost, reference_cost
        ));
    }
    if !risky_unreferenced.is_empty() {
        feedback.push(format!(
            "risky actions outside the reference pathway: {}",
            risky_unreferenced.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    if attempt.complications > 0 {
        feedback.push(format!("triggered {} complication(s)", attempt.complications));
    }
    if guessed {
        feedback.push("no findings were revealed; diagnosis treated as a guess".to_string());
    }
    if !missing_plan.is_empty() {
        feedback.push(format!("management plan missing: {}", missing_plan.join(", ")));
    }

    Ok(Score {
        attempt_id: attempt.id.clone(),
        case_id: attempt.case_id.clone(),
        case_version: attempt.case_version,
        revision: 1,
        accuracy,
        efficiency,
        safety_penalty,
        diagnosis,
        plan_coverage,
        total,
        points,
        feedback,
    })
}

pub fn match_diagnosis(submitted: &str, canonical: &str, near_misses: &[String]) -> DiagnosisMatch {
    let submitted = normalize_label(submitted);
    if submitted.is_empty() {
        return DiagnosisMatch::Incorrect;
    }
    if submitted == normalize_label(canonical) {
        return DiagnosisMatch::Exact;
    }
    if near_misses
        .iter()
        .any(|near| normalize_label(near) == submitted)
    {
        return DiagnosisMatch::Partial;
    }
    DiagnosisMatch::Incorrect
}

/// Sequence number at which each finding or action was first obtained.
fn first_obtained(attempt: &Attempt) -> BTreeMap<&str, u32> {
    let mut obtained = BTreeMap::new();
    for entry in &attempt.log {
        if entry.kind == InquiryKind::Action {
            obtained.entry(entry.action_id.as_str()).or_insert(entry.seq);
        }
        for id in &entry.revealed {
            obtained.entry(id.as_str()).or_insert(entry.seq);
        }
    }
    obtained
}

/// True when the obtained required items appear in reference order.
/// Items obtained in the same entry are treated as simultaneous.
fn in_reference_order(required: &[String], obtained_at: &BTreeMap<&str, u32>) -> bool {
    let sequence: Vec<u32> = required
        .iter()
        .filter_map(|id| obtained_at.get(id.as_str()).copied())
        .collect();
    sequence.windows(2).all(|pair| pair[0] <= pair[1])
}
