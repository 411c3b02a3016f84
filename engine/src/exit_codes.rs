//! Stable exit codes for engine CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid input: unreadable file, bad config, or a malformed case.
pub const INVALID: i32 = 1;
/// An attempt operation was rejected (unavailable action, inactive attempt,
/// premature submission).
pub const REJECTED: i32 = 4;
