//! Error types for the licensing plumbing.
//!
//! Registration and trial decisions never surface these: the protection
//! engine reports success or failure only, and so does the decision logic.
//! These errors cover installing the process facade and loading engine
//! fixtures.

use std::path::PathBuf;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The process-wide facade was already installed.
    #[error("license facade already installed")]
    AlreadyInstalled,

    /// The process-wide facade was queried before being installed.
    #[error("license facade not installed")]
    NotInstalled,

    /// Fixture file could not be read.
    #[error("failed to read engine fixture {path:?}: {source}")]
    FixtureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fixture file is not valid TOML or has the wrong shape.
    #[error("invalid engine fixture: {0}")]
    FixtureParse(#[from] toml::de::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
