//! The immutable snapshot handed to the packaging tools.

use std::collections::BTreeMap;

use serde::Serialize;

use socweave_board::{DevicePart, Ps7Config, Toolchain};
use socweave_clock::{CalibrationDomain, FrequencySynthesisBlock};
use socweave_core::{fingerprint_hex, ClockDomain, ConstraintSet};
use socweave_memory::MemoryRegion;

use crate::config::ClockSource;
use crate::peripheral::Peripheral;

/// Finalized clock domains, constraints, memory regions, peripherals and
/// merged PS7 configuration of one build.
///
/// Only the assembler constructs it; there is no way to modify it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SocHandoff {
    pub(crate) ident: String,
    pub(crate) board: String,
    pub(crate) part: DevicePart,
    pub(crate) toolchain: Toolchain,
    pub(crate) clock_source: ClockSource,
    pub(crate) domains: Vec<ClockDomain>,
    pub(crate) blocks: Vec<FrequencySynthesisBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) calibration: Option<CalibrationDomain>,
    pub(crate) constraints: ConstraintSet,
    pub(crate) regions: Vec<MemoryRegion>,
    pub(crate) peripherals: Vec<Peripheral>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ps7_config: Option<Ps7Config>,
    pub(crate) constants: BTreeMap<String, String>,
}

impl SocHandoff {
    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn board(&self) -> &str {
        &self.board
    }

    pub fn part(&self) -> &DevicePart {
        &self.part
    }

    pub fn toolchain(&self) -> Toolchain {
        self.toolchain
    }

    pub fn clock_source(&self) -> ClockSource {
        self.clock_source
    }

    /// Clock domains; the first is the system domain.
    pub fn domains(&self) -> &[ClockDomain] {
        &self.domains
    }

    pub fn system_domain(&self) -> Option<&ClockDomain> {
        self.domains.first()
    }

    pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn blocks(&self) -> &[FrequencySynthesisBlock] {
        &self.blocks
    }

    pub fn calibration(&self) -> Option<&CalibrationDomain> {
        self.calibration.as_ref()
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn peripherals(&self) -> &[Peripheral] {
        &self.peripherals
    }

    pub fn peripheral(&self, name: &str) -> Option<&Peripheral> {
        self.peripherals.iter().find(|p| p.name == name)
    }

    /// Merged PS7 configuration; `None` without the hard processor.
    pub fn ps7_config(&self) -> Option<&Ps7Config> {
        self.ps7_config.as_ref()
    }

    /// Firmware constants (`CONFIG_CLOCK_FREQUENCY`, ...).
    pub fn constants(&self) -> &BTreeMap<String, String> {
        &self.constants
    }

    /// SHA-256 of the serialized snapshot, hex encoded.
    pub fn fingerprint(&self) -> String {
        fingerprint_hex(self)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
