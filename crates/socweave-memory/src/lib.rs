//! Memory region composition for hard-processor SoCs.
//!
//! A pure function from the hard processor's fixed memory map and the
//! requested feature set to a validated list of regions. Disjointness is
//! checked in one pass over the finished list.

pub mod compose;
pub mod error;
pub mod map;
pub mod region;

pub use compose::{compose_regions, validate_disjoint, RegionRequest};
pub use error::{MemoryError, Result};
pub use map::{HardProcessorMap, MemoryWindow, MIB};
pub use region::{AccessMode, MemoryRegion};
