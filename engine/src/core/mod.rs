//! Deterministic, pure logic shared by the engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests and
//! for replaying an attempt from its action log.

pub mod attempt;
pub mod case;
pub mod complication;
pub mod invariants;
pub mod reveal;
pub mod scoring;
pub mod types;
