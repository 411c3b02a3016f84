//! Per-attempt exclusive section.
//!
//! Concurrent callers on one attempt are serialized by a mutex around the
//! attempt; different attempts share nothing. Readers get snapshots (clones)
//! so they never hold the lock across their own work.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use crate::core::attempt::Attempt;
use crate::core::case::Case;
use crate::core::complication::ComplicationModel;
use crate::core::reveal::apply_action;
use crate::core::scoring::{Score, ScoringPolicy};
use crate::core::types::{ActionLogEntry, Submission};
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct SharedAttempt {
    inner: Arc<Mutex<Attempt>>,
}

impl SharedAttempt {
    pub fn new(attempt: Attempt) -> Self {
        Self {
            inner: Arc::new(Mutex::new(attempt)),
        }
    }

    /// Clone of the current attempt state.
    pub fn snapshot(&self) -> Attempt {
        self.inner.lock().clone()
    }

    pub fn apply_action(
        &self,
        case: &Case,
        action_id: &str,
        model: &ComplicationModel,
    ) -> Result<ActionLogEntry, EngineError> {
        let mut attempt = self.inner.lock();
        apply_action(&mut attempt, case, action_id, model, Utc::now())
    }

    pub fn submit(&self, submission: Submission) -> Result<(), EngineError> {
        self.inner.lock().submit(submission)
    }

    pub fn abandon(&self) -> Result<(), EngineError> {
        self.inner.lock().abandon()
    }

    /// Score at most once: the status check and the transition happen under
    /// the same lock, so racing callers all observe the first stored score.
    pub fn finalize_score(&self, case: &Case, policy: &ScoringPolicy) -> Result<Score, EngineError> {
        self.inner.lock().finalize_score(case, policy, false)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::core::types::AttemptStatus;
    use crate::test_support::{action, started_attempt, two_finding_case};

    /// Racing finalizers all receive the same single score revision.
    #[test]
    fn finalize_is_at_most_once_across_threads() {
        let case = two_finding_case();
        let shared = SharedAttempt::new(started_attempt(&case, "att-1"));
        shared
            .apply_action(&case, "a", &ComplicationModel::default())
            .expect("a");
        shared
            .submit(Submission::new("Community-acquired pneumonia", Vec::new()))
            .expect("submit");

        let policy = ScoringPolicy::default();
        let scores: Vec<Score> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| shared.finalize_score(&case, &policy).expect("finalize")))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("join"))
                .collect()
        });

        assert!(scores.iter().all(|score| score == &scores[0]));
        let snapshot = shared.snapshot();
        assert_eq!(snapshot.scores().len(), 1);
        assert_eq!(snapshot.status(), AttemptStatus::Scored);
    }

    /// Concurrent actions are serialized: every entry gets a distinct sequence number.
    #[test]
    fn concurrent_actions_get_distinct_sequence_numbers() {
        let mut def = two_finding_case().definition().clone();
        def.actions.push(action("vitals", 1));
        let case = Case::from_definition(def).expect("case");
        let shared = SharedAttempt::new(started_attempt(&case, "att-1"));
        let model = ComplicationModel::default();

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        shared.apply_action(&case, "vitals", &model).expect("vitals");
                    }
                });
            }
        });

        let snapshot = shared.snapshot();
        let seqs: Vec<u32> = snapshot.log().iter().map(|entry| entry.seq).collect();
        assert_eq!(seqs, (1..=100).collect::<Vec<u32>>());
        assert_eq!(snapshot.cumulative_cost(), 100);
    }
}
