//! Clock generation errors.

use socweave_core::Hz;
use thiserror::Error;

/// Errors raised while building the clock and reset network.
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("clock mode '{mode}' requires toolchain '{required}', got '{toolchain}'")]
    UnsupportedToolchain {
        mode: &'static str,
        toolchain: String,
        required: String,
    },

    #[error("{key} must be non-zero")]
    ZeroFrequency { key: String },

    #[error("no {kind} limits for speedgrade {speedgrade}")]
    InvalidSpeedgrade { kind: &'static str, speedgrade: i8 },

    #[error("{block}: input clock {frequency} Hz outside supported range {min}..={max} Hz")]
    InputOutOfRange {
        block: String,
        frequency: Hz,
        min: Hz,
        max: Hz,
    },

    #[error("{block}: input clock already registered")]
    InputAlreadyRegistered { block: String },

    #[error("{block}: no input clock registered")]
    NoInputRegistered { block: String },

    #[error("{block}: at most {max} output clocks")]
    TooManyOutputs { block: String, max: usize },

    #[error("duplicate clock domain '{name}'")]
    DuplicateDomain { name: String },

    #[error("unknown clock domain '{name}'")]
    UnknownDomain { name: String },

    #[error(
        "{block}: cannot derive {target} Hz for domain '{domain}' from {reference} Hz \
         together with outputs [{others}]"
    )]
    UnachievableFrequency {
        block: String,
        domain: String,
        reference: Hz,
        target: Hz,
        others: String,
    },

    #[error("calibration source unavailable: {reason}")]
    CalibrationSourceUnavailable { reason: String },

    #[error("clock region '{region}' already has a calibration controller")]
    DuplicateCalibrationController { region: String },

    #[error("clock region '{region}' uses delay primitives but has no calibration controller")]
    MissingCalibrationController { region: String },
}

/// Result type for clock operations.
pub type Result<T> = std::result::Result<T, ClockError>;
