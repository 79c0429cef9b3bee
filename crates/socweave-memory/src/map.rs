//! Fixed memory maps of hard processor subsystems.

use serde::{Deserialize, Serialize};

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// A fixed address window the hard processor exposes for one purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemoryWindow {
    pub origin: u64,
    pub size: u64,
}

/// The hard processor's RAM, ROM/boot and external-flash windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HardProcessorMap {
    pub name: String,
    /// DDR reachable from the fabric (the first 1 MiB is reserved for OCM).
    pub ram: MemoryWindow,
    /// On-chip memory where startup code runs.
    pub rom: MemoryWindow,
    /// Linear-addressed external flash.
    pub flash: MemoryWindow,
}

impl HardProcessorMap {
    /// Zynq-7000 processing system.
    pub fn zynq7000() -> Self {
        Self {
            name: "zynq7000".into(),
            ram: MemoryWindow {
                origin: 0x0010_0000,
                size: 512 * MIB,
            },
            rom: MemoryWindow {
                origin: 0xFFFC_0000,
                size: 0x4_0000,
            },
            flash: MemoryWindow {
                origin: 0xFC00_0000,
                size: 32 * MIB,
            },
        }
    }
}
