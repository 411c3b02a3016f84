//! I/O helpers: configuration and the file-backed case, attempt and score stores.

pub mod attempt_store;
pub mod case_store;
pub mod config;
pub mod fs_util;
pub mod score_store;
