//! Peripherals wired onto the system clock domain.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::config::SocConfig;
use crate::error::{Result, SocError};

/// Etherbone address used when none is configured.
pub const DEFAULT_ETH_IP: &str = "192.168.1.50";

/// A peripheral the assembler knows how to wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum PeripheralKind {
    /// RGMII PHY. Its receive path uses I/O delay primitives.
    EthernetPhy,
    /// Ethernet MAC on the PHY.
    Ethernet,
    /// Etherbone bridge on the PHY.
    Etherbone { ip: Ipv4Addr },
    /// Running light over every `led` bundle.
    LedChaser,
    /// Soft UART on `serial`.
    Uart,
}

impl PeripheralKind {
    /// Instance name.
    pub fn name(&self) -> &'static str {
        match self {
            PeripheralKind::EthernetPhy => "ethphy",
            PeripheralKind::Ethernet => "ethmac",
            PeripheralKind::Etherbone { .. } => "etherbone",
            PeripheralKind::LedChaser => "leds",
            PeripheralKind::Uart => "uart",
        }
    }

    /// Signal bundles requested from the board.
    pub fn bundles(&self) -> &'static [&'static str] {
        match self {
            PeripheralKind::EthernetPhy => &["eth_clocks", "eth"],
            PeripheralKind::Ethernet | PeripheralKind::Etherbone { .. } => &[],
            PeripheralKind::LedChaser => &["led"],
            PeripheralKind::Uart => &["serial"],
        }
    }

    /// Peripheral that must be wired first.
    pub fn requires(&self) -> Option<&'static str> {
        match self {
            PeripheralKind::Ethernet | PeripheralKind::Etherbone { .. } => Some("ethphy"),
            _ => None,
        }
    }

    /// Bundle whose clock region holds this peripheral's I/O delay primitives.
    pub fn delay_bundle(&self) -> Option<&'static str> {
        match self {
            PeripheralKind::EthernetPhy => Some("eth"),
            _ => None,
        }
    }
}

impl fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeripheralKind::Etherbone { ip } => write!(f, "etherbone @ {ip}"),
            other => f.write_str(other.name()),
        }
    }
}

/// A wired peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Peripheral {
    pub name: String,
    #[serde(flatten)]
    pub kind: PeripheralKind,
    /// Clock domain the peripheral runs in.
    pub domain: String,
    /// Board bundles it is connected to, as `name:index`.
    pub pins: Vec<String>,
    /// Calibration controller serving its delay primitives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibrated_by: Option<String>,
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.domain)?;
        if !self.pins.is_empty() {
            write!(f, " on {}", self.pins.join(", "))?;
        }
        if let Some(ctrl) = &self.calibrated_by {
            write!(f, ", calibrated by {ctrl}")?;
        }
        Ok(())
    }
}

/// Parse an Etherbone address.
pub fn parse_ip(value: &str) -> Result<Ipv4Addr> {
    value.parse().map_err(|_| SocError::InvalidIpAddress {
        value: value.into(),
    })
}

/// Peripherals requested by `config`, in wiring order.
///
/// Ethernet and Etherbone exclude each other; the Etherbone address must
/// parse.
pub fn requested_peripherals(config: &SocConfig) -> Result<Vec<PeripheralKind>> {
    let features = &config.features;
    if features.with_ethernet && features.with_etherbone {
        return Err(SocError::ConflictingFeatures {
            a: "with-ethernet",
            b: "with-etherbone",
        });
    }

    let mut kinds = Vec::new();
    if config.wants_ethernet_phy() {
        kinds.push(PeripheralKind::EthernetPhy);
    }
    if features.with_ethernet {
        kinds.push(PeripheralKind::Ethernet);
    }
    if features.with_etherbone {
        kinds.push(PeripheralKind::Etherbone {
            ip: parse_ip(&config.eth_ip)?,
        });
    }
    if features.with_led_chaser {
        kinds.push(PeripheralKind::LedChaser);
    }
    if config.wants_uart() {
        kinds.push(PeripheralKind::Uart);
    }
    Ok(kinds)
}
