//! Error types for board description operations.

use std::path::PathBuf;

/// Errors that can occur while loading or querying a board description.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading/writing board files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Board file not found.
    #[error("board file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// No built-in or project board with this name.
    #[error("unknown board '{name}'")]
    UnknownBoard { name: String },

    /// A requested signal bundle is absent from the board.
    #[error("board '{board}' has no signal bundle '{name}'")]
    MissingBundle { board: String, name: String },

    /// The requested variant is not defined for this board.
    #[error("board '{board}' has no variant '{variant}' (known: {known})")]
    UnknownVariant {
        board: String,
        variant: String,
        known: String,
    },

    /// A device part number could not be interpreted.
    #[error("invalid device part '{part}': {reason}")]
    InvalidPart { part: String, reason: String },

    /// Unrecognized toolchain identifier.
    #[error("unknown toolchain '{value}' (expected vivado, symbiflow, yosys+nextpnr or openxc7)")]
    UnknownToolchain { value: String },
}

/// Result type for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;
