//! Board description: the signal-request interface consumed by the assembler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use socweave_core::{ClockRegion, Hz};

use crate::bundle::SignalBundle;
use crate::device::{DevicePart, Toolchain};
use crate::error::{BoardError, Result};
use crate::ps7::Ps7Config;

/// A complete board: device variants, requestable bundles and PS7 settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardDescription {
    /// Board name (e.g., "antsdr-e200").
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Variant name to FPGA part.
    pub variants: BTreeMap<String, DevicePart>,
    /// Variant used when none is requested.
    pub default_variant: String,
    /// Toolchains able to implement designs for this board.
    #[serde(default = "default_toolchains")]
    pub toolchains: Vec<Toolchain>,
    /// Bundle carrying the external reference oscillator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_clock: Option<String>,
    /// Clock region whose general-purpose fabric I/O uses delay primitives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_delay_region: Option<ClockRegion>,
    /// Requestable signal bundles.
    #[serde(default)]
    pub bundles: Vec<SignalBundle>,
    /// Hard processor configuration.
    #[serde(default)]
    pub ps7_config: Ps7Config,
}

fn default_toolchains() -> Vec<Toolchain> {
    vec![Toolchain::Vivado]
}

impl BoardDescription {
    /// Look up the first bundle named `name`.
    pub fn request(&self, name: &str) -> Result<&SignalBundle> {
        self.bundles
            .iter()
            .filter(|b| b.name == name)
            .min_by_key(|b| b.index)
            .ok_or_else(|| BoardError::MissingBundle {
                board: self.name.clone(),
                name: name.into(),
            })
    }

    /// Every bundle named `name`, ordered by index. Empty is an error.
    pub fn request_all(&self, name: &str) -> Result<Vec<&SignalBundle>> {
        let mut found: Vec<_> = self.bundles.iter().filter(|b| b.name == name).collect();
        if found.is_empty() {
            return Err(BoardError::MissingBundle {
                board: self.name.clone(),
                name: name.into(),
            });
        }
        found.sort_by_key(|b| b.index);
        Ok(found)
    }

    /// Whether at least one bundle named `name` exists.
    pub fn has_bundle(&self, name: &str) -> bool {
        self.bundles.iter().any(|b| b.name == name)
    }

    /// Resolve a variant (or the default) to its FPGA part.
    pub fn part(&self, variant: Option<&str>) -> Result<&DevicePart> {
        let variant = variant.unwrap_or(&self.default_variant);
        self.variants
            .get(variant)
            .ok_or_else(|| BoardError::UnknownVariant {
                board: self.name.clone(),
                variant: variant.into(),
                known: self.variants.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }

    /// Frequency of the reference oscillator, if the board declares one.
    pub fn reference_frequency(&self) -> Option<Hz> {
        let name = self.reference_clock.as_deref()?;
        self.request(name).ok().and_then(|b| b.frequency)
    }

    pub fn supports_toolchain(&self, toolchain: Toolchain) -> bool {
        self.toolchains.contains(&toolchain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn request_existing_bundle() {
        let board = builtin::antsdr_e200();
        let eth = board.request("eth").unwrap();
        assert_eq!(eth.io_standard.as_deref(), Some("LVCMOS18"));
    }

    #[test]
    fn request_missing_bundle_names_board_and_bundle() {
        let board = builtin::krtkl_snickerdoodle();
        let err = board.request("eth").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("krtkl-snickerdoodle"));
        assert!(msg.contains("'eth'"));
    }

    #[test]
    fn request_all_orders_by_index() {
        let mut board = builtin::antsdr_e200();
        board.bundles.push(crate::SignalBundle::new("led").with_index(3));
        board.bundles.push(crate::SignalBundle::new("led").with_index(1));
        let leds = board.request_all("led").unwrap();
        let indices: Vec<_> = leds.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }

    #[test]
    fn unknown_variant_lists_known_ones() {
        let board = builtin::krtkl_snickerdoodle();
        let err = board.part(Some("z7-30")).unwrap_err();
        assert!(err.to_string().contains("z7-10, z7-20"));
        assert_eq!(board.part(None).unwrap().as_str(), "xc7z010-clg400-1");
    }

    #[test]
    fn reference_frequency_from_bundle() {
        assert_eq!(builtin::antsdr_e200().reference_frequency(), Some(40_000_000));
    }
}
