//! Reveal engine: applies one student request to an attempt.
//!
//! The request is fully resolved against the case before anything is written,
//! so a rejected request never partially applies.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::core::attempt::Attempt;
use crate::core::case::{ActionOption, Case, FindingNode, prerequisites_met};
use crate::core::complication::{ComplicationModel, roll_seed_hex};
use crate::core::types::{ActionLogEntry, AttemptStatus, InquiryKind};
use crate::error::EngineError;

/// Apply `action_id` (a finding request or an action order) to `attempt`.
///
/// On success the new log entry is appended and returned. Errors leave the
/// attempt unchanged:
/// - [`EngineError::AttemptNotActive`] unless the attempt is in progress or complicated.
/// - [`EngineError::ActionUnavailable`] for unknown ids, findings off the
///   frontier or already revealed, and exhausted single-use actions.
pub fn apply_action(
    attempt: &mut Attempt,
    case: &Case,
    action_id: &str,
    model: &ComplicationModel,
    recorded_at: DateTime<Utc>,
) -> Result<ActionLogEntry, EngineError> {
    attempt.ensure_active()?;
    attempt.ensure_case(case)?;

    let seq = attempt.log.len() as u32 + 1;
    let staged = match case.kind_of(action_id) {
        Some(InquiryKind::Finding) => stage_finding(attempt, case, action_id)?,
        Some(InquiryKind::Action) => {
            let option = case
                .action(action_id)
                .ok_or_else(|| unavailable(action_id, "unknown id"))?;
            stage_action(attempt, case, option, model, seq)?
        }
        None => return Err(unavailable(action_id, "unknown id")),
    };

    let entry = ActionLogEntry {
        seq,
        action_id: action_id.to_string(),
        kind: staged.kind,
        recorded_at,
        revealed: staged.revealed,
        withheld: staged.withheld,
        cost_charged: staged.cost,
        complication: staged.complication,
        resolved_complication: staged.resolves,
    };

    attempt.revealed.extend(entry.revealed.iter().cloned());
    if staged.kind == InquiryKind::Action {
        attempt.used_actions.insert(action_id.to_string());
    }
    attempt.cumulative_cost = attempt.cumulative_cost.saturating_add(entry.cost_charged);
    if entry.complication {
        attempt.complications += 1;
        attempt.emergency_unlocked = true;
        attempt.status = AttemptStatus::Complicated;
    } else if entry.resolved_complication {
        attempt.status = AttemptStatus::InProgress;
    }
    attempt.log.push(entry.clone());
    Ok(entry)
}

/// What a student can do next: findings not yet revealed whose prerequisites
/// are met, and actions that are not exhausted.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontier<'a> {
    pub findings: Vec<&'a FindingNode>,
    pub actions: Vec<&'a ActionOption>,
}

/// Frontier for an arbitrary revealed/used state.
pub fn frontier_for<'a>(
    case: &'a Case,
    revealed: &BTreeSet<String>,
    used_actions: &BTreeSet<String>,
    emergency_unlocked: bool,
) -> Frontier<'a> {
    let findings = case
        .available_findings_with(revealed, emergency_unlocked)
        .into_iter()
        .filter(|finding| !revealed.contains(&finding.id))
        .collect();
    Frontier {
        findings,
        actions: case.available_actions(used_actions),
    }
}

/// Frontier of an attempt in its current state.
pub fn frontier<'a>(attempt: &Attempt, case: &'a Case) -> Frontier<'a> {
    frontier_for(
        case,
        &attempt.revealed,
        &attempt.used_actions,
        attempt.emergency_unlocked,
    )
}

struct Staged {
    kind: InquiryKind,
    revealed: Vec<String>,
    withheld: Vec<String>,
    cost: u32,
    complication: bool,
    resolves: bool,
}

fn stage_finding(attempt: &Attempt, case: &Case, finding_id: &str) -> Result<Staged, EngineError> {
    let finding = case
        .finding(finding_id)
        .ok_or_else(|| unavailable(finding_id, "unknown id"))?;
    if attempt.revealed.contains(finding_id) {
        return Err(unavailable(finding_id, "already revealed"));
    }
    if finding.emergency && !attempt.emergency_unlocked {
        return Err(unavailable(finding_id, "emergency finding is locked"));
    }
    if !prerequisites_met(finding, &attempt.revealed) {
        let missing: Vec<&str> = finding
            .prerequisites
            .iter()
            .filter(|p| !attempt.revealed.contains(*p))
            .map(String::as_str)
            .collect();
        return Err(unavailable(
            finding_id,
            &format!("prerequisites not revealed: {}", missing.join(", ")),
        ));
    }
    Ok(Staged {
        kind: InquiryKind::Finding,
        revealed: vec![finding_id.to_string()],
        withheld: Vec::new(),
        cost: finding.reveal_cost,
        complication: false,
        resolves: false,
    })
}

fn stage_action(
    attempt: &Attempt,
    case: &Case,
    option: &ActionOption,
    model: &ComplicationModel,
    seq: u32,
) -> Result<Staged, EngineError> {
    if option.single_use && attempt.used_actions.contains(&option.id) {
        return Err(unavailable(&option.id, "single-use action already used"));
    }

    let complication = model.fires(option, &attempt.id, seq);
    if option.risky {
        tracing::debug!(
            attempt_id = %attempt.id,
            action_id = %option.id,
            seq,
            seed = %roll_seed_hex(&attempt.id, seq),
            probability = model.probability_for(option),
            complication,
            "complication roll"
        );
    }
    let emergency_unlocked = attempt.emergency_unlocked || complication;
    let (revealed, withheld) = resolve_triggers(attempt, case, option, emergency_unlocked);
    let resolves = !complication
        && option.resolves_complication
        && attempt.status == AttemptStatus::Complicated;

    Ok(Staged {
        kind: InquiryKind::Action,
        revealed,
        withheld,
        cost: option.cost,
        complication,
        resolves,
    })
}

/// Reveal triggered findings to a fixpoint: a trigger may satisfy the
/// prerequisites of another trigger in the same list. Whatever is still
/// blocked at the end is withheld, never partially revealed.
fn resolve_triggers(
    attempt: &Attempt,
    case: &Case,
    option: &ActionOption,
    emergency_unlocked: bool,
) -> (Vec<String>, Vec<String>) {
    let mut known: BTreeSet<String> = attempt.revealed.clone();
    let mut pending: Vec<&str> = Vec::new();
    for id in &option.triggers.reveals {
        if !known.contains(id) && !pending.contains(&id.as_str()) {
            pending.push(id.as_str());
        }
    }

    let mut revealed = Vec::new();
    loop {
        let mut progressed = false;
        pending.retain(|id| {
            let Some(finding) = case.finding(id) else {
                return true;
            };
            if finding.emergency && !emergency_unlocked {
                return true;
            }
            if prerequisites_met(finding, &known) {
                known.insert(id.to_string());
                revealed.push(id.to_string());
                progressed = true;
                return false;
            }
            true
        });
        if !progressed {
            break;
        }
    }

    let withheld = pending.into_iter().map(str::to_string).collect();
    (revealed, withheld)
}

fn unavailable(action_id: &str, reason: &str) -> EngineError {
    EngineError::ActionUnavailable {
        action_id: action_id.to_string(),
        reason: reason.to_string(),
    }
}
