//! Leaf data types for the socweave SoC assembler.
//!
//! Everything here is plain data produced by the clock and memory stages and
//! handed, unchanged, to the packaging collaborator:
//! - **Signals:** named nets and reset expressions over them
//! - **Clock domains:** a clock net, its nominal frequency, and its reset
//! - **Constraints:** period and false-path records for timing analysis

pub mod constraint;
pub mod domain;
pub mod hash;
pub mod signal;

pub use constraint::{Constraint, ConstraintSet};
pub use domain::{format_hz, ClockDomain, ClockRegion, Hz, MHZ};
pub use hash::{fingerprint, fingerprint_hex, Fingerprint};
pub use signal::{ResetExpr, SignalRef};
