//! Board descriptions for the socweave SoC assembler.
//!
//! A board description is the physical side of a build:
//! - **Device:** the FPGA part per board variant (and thus its speedgrade)
//! - **Signal bundles:** named groups of pins the assembler can request
//! - **PS7 configuration:** pass-through settings for the hard processor

pub mod board;
pub mod builtin;
pub mod bundle;
pub mod device;
pub mod error;
pub mod parse;
pub mod ps7;

pub use board::BoardDescription;
pub use bundle::{Pins, SignalBundle, Subsignal};
pub use device::{DevicePart, Toolchain};
pub use error::{BoardError, Result};
pub use ps7::Ps7Config;
