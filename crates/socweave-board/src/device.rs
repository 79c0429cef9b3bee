//! FPGA device parts and implementation toolchains.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};

/// A Xilinx part number such as `xc7z020-clg400-2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DevicePart(String);

impl DevicePart {
    pub fn new(part: impl Into<String>) -> Self {
        Self(part.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Speedgrade from the trailing `-N` field (`xc7z020-clg400-2` -> `-2`).
    pub fn speedgrade(&self) -> Result<i8> {
        let invalid = |reason: &str| BoardError::InvalidPart {
            part: self.0.clone(),
            reason: reason.into(),
        };
        let mut fields = self.0.split('-');
        let _device = fields.next().filter(|d| !d.is_empty()).ok_or_else(|| invalid("empty part number"))?;
        let _package = fields.next().ok_or_else(|| invalid("missing package field"))?;
        let grade = fields.next().ok_or_else(|| invalid("missing speedgrade field"))?;
        // Low-voltage grades carry a suffix letter ("-1L").
        let digits: String = grade.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<i8>() {
            Ok(n @ 1..=3) => Ok(-n),
            _ => Err(invalid("speedgrade must be 1, 2 or 3")),
        }
    }

    /// Zynq-7000 parts (`xc7z*`) carry the hard processor subsystem.
    pub fn has_hard_processor(&self) -> bool {
        self.0.to_ascii_lowercase().starts_with("xc7z")
    }
}

impl fmt::Display for DevicePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Implementation toolchain driving synthesis and place-and-route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Toolchain {
    #[serde(rename = "vivado")]
    Vivado,
    #[serde(rename = "symbiflow")]
    Symbiflow,
    #[serde(rename = "yosys+nextpnr")]
    YosysNextpnr,
    #[serde(rename = "openxc7")]
    Openxc7,
}

impl Toolchain {
    pub const ALL: [Toolchain; 4] = [
        Toolchain::Vivado,
        Toolchain::Symbiflow,
        Toolchain::YosysNextpnr,
        Toolchain::Openxc7,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Toolchain::Vivado => "vivado",
            Toolchain::Symbiflow => "symbiflow",
            Toolchain::YosysNextpnr => "yosys+nextpnr",
            Toolchain::Openxc7 => "openxc7",
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Toolchain {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        Toolchain::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BoardError::UnknownToolchain { value: s.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speedgrade_from_part() {
        assert_eq!(DevicePart::new("xc7z020-clg400-2").speedgrade().unwrap(), -2);
        assert_eq!(DevicePart::new("xc7z010-clg400-1").speedgrade().unwrap(), -1);
        assert_eq!(DevicePart::new("xc7a35t-csg324-1L").speedgrade().unwrap(), -1);
    }

    #[test]
    fn speedgrade_rejects_malformed_parts() {
        assert!(DevicePart::new("xc7z020").speedgrade().is_err());
        assert!(DevicePart::new("xc7z020-clg400-9").speedgrade().is_err());
        assert!(matches!(
            DevicePart::new("").speedgrade(),
            Err(BoardError::InvalidPart { .. })
        ));
    }

    #[test]
    fn zynq_parts_have_hard_processor() {
        assert!(DevicePart::new("xc7z020-clg400-3").has_hard_processor());
        assert!(!DevicePart::new("xc7a100t-csg324-1").has_hard_processor());
    }

    #[test]
    fn toolchain_names_round_trip() {
        for t in Toolchain::ALL {
            assert_eq!(t.as_str().parse::<Toolchain>().unwrap(), t);
        }
        assert!("quartus".parse::<Toolchain>().is_err());
    }
}
