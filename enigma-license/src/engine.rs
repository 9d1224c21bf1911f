//! Protection-engine contract.
//!
//! The engine is an external, trusted oracle: it verifies keys, persists the
//! registered key, derives the hardware id and tracks trial counters. The core
//! only consumes the answers. Implementations: `MemoryEngine` for tests and
//! unprotected builds, `EnigmaSdk` (feature `enigma-sdk`) for the real thing.

use crate::key_info::KeyInformation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A (name, key) pair as persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKey {
    pub name: String,
    pub key: String,
}

impl StoredKey {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

/// A total/remaining counter pair reported for a trial limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialCounters {
    pub total: i32,
    pub left: i32,
}

impl TrialCounters {
    pub const fn new(total: i32, left: i32) -> Self {
        Self { total, left }
    }
}

/// Capabilities the licensing core consumes from the protection engine.
///
/// Every call is synchronous and assumed cheap. Failures carry no detail:
/// "engine unavailable", "key malformed" and "key rejected" all come back as
/// `false` / `None`.
pub trait ProtectionEngine: Send + Sync {
    /// Whether the running binary is wrapped by the protector.
    fn is_protected(&self) -> bool;

    /// Whether the protection runtime initialized correctly.
    fn is_integrated(&self) -> bool;

    /// Stable identifier of this machine.
    fn hardware_id(&self) -> String;

    /// Returns the persisted registration, if one is stored.
    fn load_key(&self) -> Option<StoredKey>;

    /// Checks a specific pair without side effects.
    fn check_key(&self, name: &str, key: &str) -> bool;

    /// Validates a pair and persists it in one step.
    fn check_and_save_key(&self, name: &str, key: &str) -> bool;

    /// Whether the currently persisted key, if any, is valid.
    fn load_and_check_key(&self) -> bool;

    /// Metadata for a specific pair, `None` if the pair is not valid.
    fn key_information(&self, name: &str, key: &str) -> Option<KeyInformation>;

    /// Removes the persisted key. Semantics are the engine's.
    fn delete_key(&self) -> bool;

    /// Execution counters, `None` when the trial is not execution-limited.
    fn trial_executions(&self) -> Option<TrialCounters>;

    /// Day counters, `None` when the trial is not day-limited.
    fn trial_days(&self) -> Option<TrialCounters>;

    /// Absolute trial expiration date, `None` when not configured.
    fn trial_expiration_date(&self) -> Option<NaiveDate>;
}

/// Decodes the engine's packed date: year in the low 16 bits, month in the
/// next 8, day in the top 8.
///
/// Returns `None` for `0` (not configured) and for bit patterns that are not
/// a real calendar date.
#[must_use]
pub fn decode_packed_date(packed: u32) -> Option<NaiveDate> {
    if packed == 0 {
        return None;
    }
    let year = (packed & 0xFFFF) as i32;
    let month = (packed >> 16) & 0xFF;
    let day = packed >> 24;
    NaiveDate::from_ymd_opt(year, month, day)
}
