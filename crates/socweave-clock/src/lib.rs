//! Clock and reset generation for socweave.
//!
//! Three stages, run in order by the assembler:
//! - **Selector:** establishes the system clock domain from the hard processor
//!   or from an external reference through a synthesis block
//! - **Synthesis:** exact integer multiply/divide solving for PLL/MMCM blocks
//! - **Calibration:** the 200 MHz delay-calibration domain and one controller
//!   per clock region that uses I/O delay primitives

pub mod calibration;
pub mod error;
pub mod selector;
pub mod synthesis;
pub mod tree;

pub use calibration::{
    CalibrationController, CalibrationDomain, CalibrationSource, DelayCalibrationBuilder,
    CALIBRATION_FREQUENCY,
};
pub use error::{ClockError, Result};
pub use selector::{establish_system_clock, ClockMode, ClockSourceConfig};
pub use synthesis::{DividerConfig, FrequencySynthesisBlock, PrimitiveKind, SynthesisLimits};
pub use tree::ClockTree;
