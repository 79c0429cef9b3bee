//! Address regions and access modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MemoryError;

/// Subset of {read, write, execute}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessMode {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl AccessMode {
    pub const RW: AccessMode = AccessMode {
        read: true,
        write: true,
        execute: false,
    };
    pub const RX: AccessMode = AccessMode {
        read: true,
        write: false,
        execute: true,
    };
    pub const RWX: AccessMode = AccessMode {
        read: true,
        write: true,
        execute: true,
    };
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            f.write_str("r")?;
        }
        if self.write {
            f.write_str("w")?;
        }
        if self.execute {
            f.write_str("x")?;
        }
        Ok(())
    }
}

impl FromStr for AccessMode {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mode = AccessMode::default();
        for c in s.chars() {
            let flag = match c {
                'r' => &mut mode.read,
                'w' => &mut mode.write,
                'x' => &mut mode.execute,
                _ => return Err(MemoryError::InvalidMode { mode: s.into() }),
            };
            if *flag {
                return Err(MemoryError::InvalidMode { mode: s.into() });
            }
            *flag = true;
        }
        Ok(mode)
    }
}

impl Serialize for AccessMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccessMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A named, address-bounded slice of the physical address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemoryRegion {
    /// Region name (e.g., "sram", "rom", "flash").
    pub name: String,
    /// Physical base address.
    pub origin: u64,
    /// Length in bytes.
    pub size: u64,
    pub mode: AccessMode,
    /// Whether the linker script generator places sections here.
    pub linker: bool,
}

impl MemoryRegion {
    pub fn new(name: impl Into<String>, origin: u64, size: u64, mode: AccessMode) -> Self {
        Self {
            name: name.into(),
            origin,
            size,
            mode,
            linker: false,
        }
    }

    pub fn linker_visible(mut self) -> Self {
        self.linker = true;
        self
    }

    /// Exclusive end address, `None` if it would overflow.
    pub fn end(&self) -> Option<u64> {
        self.origin.checked_add(self.size)
    }

    /// Whether the half-open intervals `[origin, end)` intersect.
    /// Adjacent regions do not overlap.
    pub fn overlaps(&self, other: &MemoryRegion) -> bool {
        let a_end = self.origin as u128 + self.size as u128;
        let b_end = other.origin as u128 + other.size as u128;
        (self.origin as u128) < b_end && (other.origin as u128) < a_end
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: 0x{:08X} - 0x{:08X} ({} bytes) [{}]{}",
            self.name,
            self.origin,
            self.origin as u128 + self.size as u128,
            self.size,
            self.mode,
            if self.linker { " linker" } else { "" }
        )
    }
}
