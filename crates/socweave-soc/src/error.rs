//! SoC assembly errors.

use std::fmt;

use socweave_board::BoardError;
use socweave_clock::ClockError;
use socweave_memory::MemoryError;
use thiserror::Error;

use crate::phase::BuildPhase;

/// Broad class of a build failure. Both abort the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad or inconsistent input, detected before anything is constructed.
    Configuration,
    /// Inconsistency found while assembling clocks, regions or peripherals.
    Composition,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Configuration => write!(f, "configuration error"),
            ErrorClass::Composition => write!(f, "composition error"),
        }
    }
}

/// Errors that abort an SoC build.
#[derive(Debug, Error)]
pub enum SocError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("board '{board}' does not support toolchain '{toolchain}' (supported: {supported})")]
    UnsupportedToolchain {
        board: String,
        toolchain: String,
        supported: String,
    },

    #[error("hard processor integration requires toolchain 'vivado', got '{toolchain}'")]
    HardProcessorToolchain { toolchain: String },

    #[error("features.hard-processor is set but part '{part}' has no hard processor")]
    NoHardProcessor { part: String },

    #[error("clock.source = hard-processor requires features.hard-processor")]
    ClockSourceWithoutHardProcessor,

    #[error("board '{board}' declares no reference clock with a frequency (needed by {needed_by})")]
    MissingReferenceClock {
        board: String,
        needed_by: &'static str,
    },

    #[error("features.{a} and features.{b} are mutually exclusive")]
    ConflictingFeatures { a: &'static str, b: &'static str },

    #[error("ethernet.ip '{value}' is not a valid IPv4 address")]
    InvalidIpAddress { value: String },

    #[error("peripheral '{peripheral}' wired in phase {phase}, before the clock was established")]
    PeripheralBeforeClock {
        peripheral: String,
        phase: BuildPhase,
    },

    #[error("invalid build phase transition {from} -> {to}")]
    PhaseOrder { from: BuildPhase, to: BuildPhase },

    #[error("peripheral '{peripheral}' is already wired")]
    DuplicatePeripheral { peripheral: String },

    #[error("peripheral '{peripheral}' requires '{requires}' to be wired first")]
    MissingDependency {
        peripheral: String,
        requires: &'static str,
    },

    #[error("peripheral '{peripheral}' unavailable: {reason}")]
    PeripheralUnavailable { peripheral: String, reason: String },
}

impl SocError {
    /// Classify the failure.
    pub fn class(&self) -> ErrorClass {
        match self {
            SocError::Clock(
                ClockError::DuplicateDomain { .. }
                | ClockError::DuplicateCalibrationController { .. }
                | ClockError::MissingCalibrationController { .. },
            ) => ErrorClass::Composition,
            SocError::Memory(MemoryError::InvalidMode { .. }) => ErrorClass::Configuration,
            SocError::Memory(_)
            | SocError::PhaseOrder { .. }
            | SocError::DuplicatePeripheral { .. }
            | SocError::MissingDependency { .. } => ErrorClass::Composition,
            _ => ErrorClass::Configuration,
        }
    }
}

/// Result type for SoC assembly.
pub type Result<T> = std::result::Result<T, SocError>;
