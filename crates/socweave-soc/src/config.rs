//! Per-build configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use socweave_board::Toolchain;
use socweave_clock::{CalibrationSource, PrimitiveKind};
use socweave_core::{Hz, MHZ};
use socweave_memory::RegionRequest;

use crate::peripheral::DEFAULT_ETH_IP;

/// Where the system clock comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClockSource {
    /// The hard processor's fabric clock.
    HardProcessor,
    /// The board's reference oscillator through a synthesis block.
    ExternalReference,
}

impl ClockSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockSource::HardProcessor => "hard-processor",
            ClockSource::ExternalReference => "external-reference",
        }
    }
}

impl fmt::Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hard-processor" | "ps7" => Ok(ClockSource::HardProcessor),
            "external-reference" | "external" => Ok(ClockSource::ExternalReference),
            other => Err(format!(
                "unknown clock source '{other}' (expected hard-processor or external-reference)"
            )),
        }
    }
}

/// Feature flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Features {
    pub with_ethernet: bool,
    pub with_etherbone: bool,
    pub with_led_chaser: bool,
    /// Integrate the hard processor subsystem.
    pub hard_processor: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            with_ethernet: false,
            with_etherbone: false,
            with_led_chaser: true,
            hard_processor: true,
        }
    }
}

/// Everything one build needs besides the board description.
///
/// Built once per build and passed by reference; nothing is global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SocConfig {
    /// Board variant (the board's default when `None`).
    pub variant: Option<String>,
    pub toolchain: Toolchain,
    /// Target system clock frequency.
    pub sys_clk_freq: Hz,
    /// Explicit clock source; derived from the features when `None`.
    pub clock_source: Option<ClockSource>,
    /// Explicit calibration source; derived from the clock source when `None`.
    pub calibration_source: Option<CalibrationSource>,
    pub primitive: PrimitiveKind,
    pub features: Features,
    /// Etherbone IPv4 address.
    pub eth_ip: String,
    /// Region sizes; the full hard-processor windows when `None`.
    pub memory: Option<RegionRequest>,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            variant: None,
            toolchain: Toolchain::Vivado,
            sys_clk_freq: 100 * MHZ,
            clock_source: None,
            calibration_source: None,
            primitive: PrimitiveKind::default(),
            features: Features::default(),
            eth_ip: DEFAULT_ETH_IP.into(),
            memory: None,
        }
    }
}

impl SocConfig {
    /// Effective clock source: the hard processor when it is integrated,
    /// the reference oscillator otherwise.
    pub fn clock_source(&self) -> ClockSource {
        self.clock_source.unwrap_or(if self.features.hard_processor {
            ClockSource::HardProcessor
        } else {
            ClockSource::ExternalReference
        })
    }

    /// Effective calibration source. Follows the reference oscillator when
    /// the system clock does, the system clock otherwise.
    pub fn calibration_source(&self) -> CalibrationSource {
        self.calibration_source
            .unwrap_or(match self.clock_source() {
                ClockSource::ExternalReference => CalibrationSource::FromReference,
                ClockSource::HardProcessor => CalibrationSource::FromSystemClock,
            })
    }

    /// Whether an Ethernet PHY is needed.
    pub fn wants_ethernet_phy(&self) -> bool {
        self.features.with_ethernet || self.features.with_etherbone
    }

    /// The soft UART is replaced by the hard processor's console UART.
    pub fn wants_uart(&self) -> bool {
        !self.features.hard_processor
    }
}
