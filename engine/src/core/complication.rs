//! Seeded complication model.
//!
//! Rolls are a pure function of `(attempt id, sequence number)` so an attempt
//! replays bit-identically. The seed is the first 8 bytes of
//! `SHA-256(attempt_id ":" seq_be)`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::case::ActionOption;

/// Configured complication probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplicationModel {
    /// Probability used for risky actions without their own override.
    pub default_probability: f64,
}

impl Default for ComplicationModel {
    fn default() -> Self {
        Self {
            default_probability: 0.25,
        }
    }
}

impl ComplicationModel {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.default_probability) {
            errors.push(format!(
                "complications.default_probability {} outside [0, 1]",
                self.default_probability
            ));
        }
        errors
    }

    /// Probability that `action` complicates. Non-risky actions never do.
    pub fn probability_for(&self, action: &ActionOption) -> f64 {
        if !action.risky {
            return 0.0;
        }
        if action.triggers.complication {
            return 1.0;
        }
        action
            .complication_probability
            .unwrap_or(self.default_probability)
    }

    /// Decide whether applying `action` as entry `seq` of `attempt_id` complicates.
    pub fn fires(&self, action: &ActionOption, attempt_id: &str, seq: u32) -> bool {
        let probability = self.probability_for(action);
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        roll(attempt_id, seq) < probability
    }
}

/// Seed bytes for a roll.
pub fn roll_seed(attempt_id: &str, seq: u32) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(attempt_id.as_bytes());
    hasher.update(b":");
    hasher.update(seq.to_be_bytes());
    let digest = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    seed
}

/// Hex form of [`roll_seed`], for audit logs.
pub fn roll_seed_hex(attempt_id: &str, seq: u32) -> String {
    hex::encode(roll_seed(attempt_id, seq))
}

/// Uniform sample in `[0, 1)` for entry `seq` of `attempt_id`.
pub fn roll(attempt_id: &str, seq: u32) -> f64 {
    let seed = u64::from_be_bytes(roll_seed(attempt_id, seq));
    let mut rng = StdRng::seed_from_u64(seed);
    rng.r#gen::<f64>()
}
