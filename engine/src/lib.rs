//! Clinical case simulation and reasoning-evaluation engine.
//!
//! A student works through a teacher-authored case by requesting findings and
//! ordering actions, then submits a diagnosis and management plan. The engine
//! decides what may be revealed at each point, accounts for the cost and order
//! of the inquiry, and scores the finished attempt against the case's
//! reference pathway. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (case validation, reveal rules,
//!   attempt transitions, scoring). No I/O, no clocks, no ambient randomness.
//! - **[`io`]**: Side-effecting operations (config and file-backed stores for
//!   cases, attempts and scores).
//!
//! [`engine::Engine`] is the call contract consumed by collaborators,
//! [`shared::SharedAttempt`] serializes concurrent callers on one attempt, and
//! [`replay`] drives a scripted attempt end to end for the CLI.

pub mod core;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod replay;
pub mod shared;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::engine::Engine;
pub use crate::error::EngineError;
