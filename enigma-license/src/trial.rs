//! Trial evaluation.
//!
//! The trial is computed once per process from the engine's counters. Two
//! independent sources can bound it in time: a day countdown (relative to
//! today) and an absolute calendar date. The later of the two wins. A separate
//! execution counter can end the trial regardless of dates.

use crate::engine::ProtectionEngine;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Outcome of evaluating the trial at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialStatus {
    /// Execution budget exhausted or expiration date passed.
    Expired,
    /// Within the configured limits.
    Valid,
    /// No time-based limit is configured.
    Disabled,
}

/// Trial limits as computed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trial {
    executions_enabled: bool,
    executions_total: i32,
    executions_left: i32,
    /// Seconds since epoch, 0 when no expiration is configured.
    expiration_date: i64,
}

impl Trial {
    /// Computes the trial from the engine's current counters.
    pub fn compute(engine: &dyn ProtectionEngine) -> Self {
        Self::compute_at(engine, Utc::now())
    }

    /// Computes the trial as if the current time were `now`.
    pub fn compute_at(engine: &dyn ProtectionEngine, now: DateTime<Utc>) -> Self {
        let executions = engine.trial_executions();

        let day_candidate = engine
            .trial_days()
            .and_then(|days| day_countdown_expiration(now, days.left));

        let date_candidate = engine.trial_expiration_date().map(midnight_utc);

        let expiration_date = [day_candidate, date_candidate]
            .into_iter()
            .flatten()
            .fold(0, i64::max);

        let trial = Self {
            executions_enabled: executions.is_some(),
            executions_total: executions.map_or(0, |e| e.total),
            executions_left: executions.map_or(0, |e| e.left),
            expiration_date,
        };
        debug!(
            executions_enabled = trial.executions_enabled,
            executions_left = trial.executions_left,
            expiration_date = trial.expiration_date,
            "Trial computed"
        );
        trial
    }

    /// Evaluates the trial against the current wall-clock time.
    #[must_use]
    pub fn check_trial(&self) -> TrialStatus {
        self.check_trial_at(Utc::now())
    }

    /// Evaluates the trial at `now`.
    ///
    /// An exhausted execution budget expires the trial even when the date
    /// axis is far in the future or absent altogether.
    #[must_use]
    pub fn check_trial_at(&self, now: DateTime<Utc>) -> TrialStatus {
        if self.executions_enabled && self.executions_left < 0 {
            return TrialStatus::Expired;
        }

        if self.expiration_date == 0 {
            return TrialStatus::Disabled;
        }

        if now.timestamp() > self.expiration_date {
            TrialStatus::Expired
        } else {
            TrialStatus::Valid
        }
    }

    #[must_use]
    pub fn executions_enabled(&self) -> bool {
        self.executions_enabled
    }

    #[must_use]
    pub fn executions_total(&self) -> i32 {
        self.executions_total
    }

    #[must_use]
    pub fn executions_left(&self) -> i32 {
        self.executions_left
    }

    /// Expiration as seconds since epoch, `0` when not configured.
    #[must_use]
    pub fn expiration_date(&self) -> i64 {
        self.expiration_date
    }

    /// Expiration as a timestamp, `None` when not configured.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expiration_date == 0 {
            None
        } else {
            DateTime::from_timestamp(self.expiration_date, 0)
        }
    }
}

/// `now + days_left`, floored to the start of that UTC day.
fn day_countdown_expiration(now: DateTime<Utc>, days_left: i32) -> Option<i64> {
    let Some(shifted) = now.checked_add_signed(Duration::days(i64::from(days_left))) else {
        warn!(days_left, "Trial day countdown out of range, ignoring");
        return None;
    };
    Some(midnight_utc(shifted.date_naive()))
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}
