//! Metadata embedded in a verified license key.
//!
//! A `KeyInformation` is only ever produced by the protection engine. Every
//! `use_*` flag gates its paired value: when the flag is false the value is
//! meaningless and the gated accessors return `None`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A calendar date as stored inside a license key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyDate {
    pub year: u16,
    pub month: u16,
    pub day: u16,
}

impl KeyDate {
    /// Creates a key date from its parts.
    #[must_use]
    pub const fn new(year: u16, month: u16, day: u16) -> Self {
        Self { year, month, day }
    }

    /// Converts to a `NaiveDate`, or `None` if the parts are not a real date.
    #[must_use]
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }
}

/// Limits, dates and flags carried by a license key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyInformation {
    /// Key is blacklisted as leaked.
    pub stolen: bool,
    pub creation: KeyDate,

    pub use_key_expiration: bool,
    pub expiration: KeyDate,

    pub use_hardware_locking: bool,

    pub use_executions_limit: bool,
    pub executions_count: u32,

    pub use_days_limit: bool,
    pub days_count: u32,

    pub use_run_time_limit: bool,
    pub run_time_minutes: u32,

    pub use_global_time_limit: bool,
    pub global_time_minutes: u32,

    pub use_county_limit: bool,
    pub country_code: u32,

    pub use_register_after: bool,
    pub register_after: KeyDate,

    pub use_register_before: bool,
    pub register_before: KeyDate,
}

impl KeyInformation {
    #[must_use]
    pub fn created_on(&self) -> Option<NaiveDate> {
        self.creation.to_naive_date()
    }

    /// Expiration date of the key, if the key expires.
    #[must_use]
    pub fn expires_on(&self) -> Option<NaiveDate> {
        gated(self.use_key_expiration, self.expiration).and_then(|d| d.to_naive_date())
    }

    #[must_use]
    pub fn executions_limit(&self) -> Option<u32> {
        gated(self.use_executions_limit, self.executions_count)
    }

    #[must_use]
    pub fn days_limit(&self) -> Option<u32> {
        gated(self.use_days_limit, self.days_count)
    }

    /// Per-run time limit in minutes.
    #[must_use]
    pub fn run_time_limit_minutes(&self) -> Option<u32> {
        gated(self.use_run_time_limit, self.run_time_minutes)
    }

    /// Cumulative time limit in minutes.
    #[must_use]
    pub fn global_time_limit_minutes(&self) -> Option<u32> {
        gated(self.use_global_time_limit, self.global_time_minutes)
    }

    #[must_use]
    pub fn country(&self) -> Option<u32> {
        gated(self.use_county_limit, self.country_code)
    }

    /// Earliest date the key may be registered on.
    #[must_use]
    pub fn register_after_date(&self) -> Option<NaiveDate> {
        gated(self.use_register_after, self.register_after).and_then(|d| d.to_naive_date())
    }

    /// Latest date the key may be registered on.
    #[must_use]
    pub fn register_before_date(&self) -> Option<NaiveDate> {
        gated(self.use_register_before, self.register_before).and_then(|d| d.to_naive_date())
    }
}

fn gated<T>(flag: bool, value: T) -> Option<T> {
    flag.then_some(value)
}
