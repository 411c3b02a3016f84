//! Concurrent access to one attempt through `SharedAttempt`, and independent
//! attempts sharing one `Arc<Case>`.

use std::sync::Arc;
use std::thread;

use engine::Engine;
use engine::core::scoring::ScoringPolicy;
use engine::core::types::{Identity, Submission};
use engine::shared::SharedAttempt;
use engine::test_support::two_finding_definition;

/// Many students work the same case at once without interfering.
#[test]
fn independent_attempts_share_one_case() {
    let engine = Engine::default();
    let case = engine.load_case(two_finding_definition()).expect("case");

    let points: Vec<u32> = thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|n| {
                let case = Arc::clone(&case);
                let engine = &engine;
                scope.spawn(move || {
                    let mut attempt = engine
                        .start_attempt_with_id(
                            format!("att-{n}"),
                            &case,
                            &Identity::student(format!("student-{n}")),
                        )
                        .expect("start");
                    engine.apply_action(&mut attempt, &case, "a").expect("a");
                    if n % 2 == 0 {
                        engine.apply_action(&mut attempt, &case, "b").expect("b");
                    }
                    engine
                        .submit(&mut attempt, "Community-acquired pneumonia", vec!["antibiotics".to_string()])
                        .expect("submit");
                    engine.finalize_score(&mut attempt, &case).expect("score").points
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("join")).collect()
    });

    for (n, points) in points.iter().enumerate() {
        let expected = if n % 2 == 0 { 100 } else { 94 };
        assert_eq!(*points, expected, "attempt {n}");
    }
}

/// A submit racing a finalize never yields two score revisions.
#[test]
fn racing_submit_and_finalize_score_once() {
    let engine = Engine::default();
    let case = engine.load_case(two_finding_definition()).expect("case");
    let attempt = engine
        .start_attempt_with_id("att-race", &case, &Identity::student("student-1"))
        .expect("start");
    let shared = SharedAttempt::new(attempt);
    shared
        .apply_action(&case, "a", &engine.config().complications)
        .expect("a");
    shared
        .submit(Submission::new("Community-acquired pneumonia", Vec::new()))
        .expect("submit");

    let policy = ScoringPolicy::default();
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                shared.finalize_score(&case, &policy).expect("finalize");
                assert!(shared.submit(Submission::default().giving_up()).is_err());
            });
        }
    });

    assert_eq!(shared.snapshot().scores().len(), 1);
}
