//! Top-level SoC assembly for socweave.
//!
//! Sequences the clock source selector, frequency synthesis and delay
//! calibration, composes the memory map, wires the requested peripherals and
//! produces an immutable handoff snapshot for the packaging tools.

pub mod assembler;
pub mod config;
pub mod error;
pub mod handoff;
pub mod peripheral;
pub mod phase;
pub mod report;

pub use assembler::{assemble, SocAssembler};
pub use config::{ClockSource, Features, SocConfig};
pub use error::{ErrorClass, Result, SocError};
pub use handoff::SocHandoff;
pub use peripheral::{Peripheral, PeripheralKind};
pub use phase::BuildPhase;
pub use report::BuildReport;
