//! Memory composition errors.

use thiserror::Error;

/// Errors raised while composing the address map. All are fatal.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("region '{region}' requests {requested:#x} bytes but the hard processor window is {window:#x} bytes")]
    RegionExceedsWindow {
        region: String,
        requested: u64,
        window: u64,
    },

    #[error("region '{region}' has zero size")]
    ZeroSize { region: String },

    #[error("region '{region}' wraps past the end of the address space")]
    AddressOverflow { region: String },

    #[error("duplicate region '{name}'")]
    DuplicateRegion { name: String },

    #[error("regions '{a}' ({a_start:#010x}..{a_end:#010x}) and '{b}' ({b_start:#010x}..{b_end:#010x}) overlap")]
    Overlap {
        a: String,
        a_start: u64,
        a_end: u64,
        b: String,
        b_start: u64,
        b_end: u64,
    },

    #[error("invalid access mode '{mode}' (expected a combination of r, w, x)")]
    InvalidMode { mode: String },
}

/// Result type for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
