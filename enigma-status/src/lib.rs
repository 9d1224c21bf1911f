//! Status reporting and engine selection for the `enigma-status` tool.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use enigma_license::{
    KeyInformation, License, MemoryEngine, ProtectionEngine, RegistrationState, TrialStatus,
};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Snapshot of everything the facade exposes.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StatusReport {
    pub protected: bool,
    pub integrated: bool,
    pub hardware_id: String,
    pub registration: RegistrationReport,
    pub trial: TrialReport,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RegistrationReport {
    pub state: RegistrationState,
    pub name: Option<String>,
    pub key_info: Option<KeyInformation>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TrialReport {
    pub executions_enabled: bool,
    pub executions_total: i32,
    pub executions_left: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: TrialStatus,
}

impl StatusReport {
    pub fn collect(license: &License) -> Self {
        Self::collect_at(license, Utc::now())
    }

    /// Builds the report, evaluating the trial at `now`.
    pub fn collect_at(license: &License, now: DateTime<Utc>) -> Self {
        let registration = license.registration();
        let current = registration.current();
        let trial = license.trial();

        Self {
            protected: license.is_protected(),
            integrated: license.is_integrated(),
            hardware_id: license.hardware_id(),
            registration: RegistrationReport {
                state: registration.state(),
                name: current.as_ref().map(|c| c.name.clone()),
                key_info: current.map(|c| c.key_info),
            },
            trial: TrialReport {
                executions_enabled: trial.executions_enabled(),
                executions_total: trial.executions_total(),
                executions_left: trial.executions_left(),
                expires_at: trial.expires_at(),
                status: trial.check_trial_at(now),
            },
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Protected:    {}", yes_no(self.protected))?;
        writeln!(f, "Integrated:   {}", yes_no(self.integrated))?;
        writeln!(f, "Hardware ID:  {}", self.hardware_id)?;

        match (&self.registration.name, &self.registration.key_info) {
            (Some(name), Some(info)) => {
                writeln!(f, "Registered:   {name}")?;
                if info.stolen {
                    writeln!(f, "  key is marked as stolen")?;
                }
                if let Some(date) = info.expires_on() {
                    writeln!(f, "  key expires {date}")?;
                }
                if let Some(limit) = info.executions_limit() {
                    writeln!(f, "  executions limit {limit}")?;
                }
                if let Some(limit) = info.days_limit() {
                    writeln!(f, "  days limit {limit}")?;
                }
                if info.use_hardware_locking {
                    writeln!(f, "  locked to hardware")?;
                }
            }
            _ => writeln!(f, "Registered:   no")?,
        }

        let status = match self.trial.status {
            TrialStatus::Valid => "valid",
            TrialStatus::Expired => "expired",
            TrialStatus::Disabled => "disabled",
        };
        writeln!(f, "Trial:        {status}")?;
        if self.trial.executions_enabled {
            writeln!(
                f,
                "  executions {} of {} left",
                self.trial.executions_left, self.trial.executions_total
            )?;
        }
        if let Some(expires_at) = self.trial.expires_at {
            writeln!(f, "  expires {}", expires_at.format("%Y-%m-%d %H:%M UTC"))?;
        }
        Ok(())
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// `<config dir>/enigma/fixture.toml`, if the platform has a config dir.
pub fn default_fixture_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("enigma").join("fixture.toml"))
}

/// Picks the protection engine: an explicit fixture, then the default
/// fixture if present, then the protector SDK when compiled in.
pub fn open_engine(fixture: Option<&Path>) -> Result<Arc<dyn ProtectionEngine>> {
    if let Some(path) = fixture {
        return load_fixture_engine(path);
    }

    if let Some(path) = default_fixture_path().filter(|p| p.exists()) {
        return load_fixture_engine(&path);
    }

    sdk_engine()
}

fn load_fixture_engine(path: &Path) -> Result<Arc<dyn ProtectionEngine>> {
    let engine = MemoryEngine::load_fixture(path)
        .with_context(|| format!("Failed to load engine fixture {}", path.display()))?;
    info!("Using in-memory engine from {:?}", path);
    Ok(Arc::new(engine))
}

#[cfg(all(feature = "enigma-sdk", windows))]
fn sdk_engine() -> Result<Arc<dyn ProtectionEngine>> {
    info!("Using Enigma Protector SDK engine");
    Ok(Arc::new(enigma_license::EnigmaSdk::new()))
}

#[cfg(not(all(feature = "enigma-sdk", windows)))]
fn sdk_engine() -> Result<Arc<dyn ProtectionEngine>> {
    anyhow::bail!(
        "no protection engine available: pass --fixture or build with the enigma-sdk feature on Windows"
    )
}
