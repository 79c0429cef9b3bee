//! Delay-calibration domain and controllers.
//!
//! I/O delay primitives need a 200 MHz reference and one calibration
//! controller per clock region they sit in. Consumers register a request per
//! region; requests for an already-registered region are merged, so however
//! many peripherals share a region, it gets exactly one controller.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use socweave_core::{format_hz, ClockDomain, ClockRegion, Hz, ResetExpr, SignalRef, MHZ};

use crate::error::{ClockError, Result};
use crate::synthesis::{FrequencySynthesisBlock, SynthesisLimits};
use crate::tree::ClockTree;

/// Calibration reference frequency.
pub const CALIBRATION_FREQUENCY: Hz = 200 * MHZ;

/// Name of the calibration clock domain.
pub const CALIBRATION_DOMAIN: &str = "idelay";

/// How the calibration clock is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalibrationSource {
    /// An extra output on the block fed by the external reference, or a new
    /// block on the reference if there is none or its VCO cannot also reach
    /// 200 MHz.
    FromReference,
    /// A second, independent block fed by the system clock.
    FromSystemClock,
}

/// One calibration controller bound to a clock region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CalibrationController {
    pub name: String,
    pub region: ClockRegion,
    /// Calibration domain driving the controller.
    pub domain: String,
    /// Peripherals whose delay primitives this controller calibrates.
    pub consumers: Vec<String>,
}

/// The calibration domain with its controllers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CalibrationDomain {
    pub source: CalibrationSource,
    /// Clock the calibration domain is synthesized from.
    pub derived_from: SignalRef,
    /// Synthesis block producing it.
    pub block: String,
    pub frequency: Hz,
    pub controllers: Vec<CalibrationController>,
}

impl CalibrationDomain {
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    pub fn controller_for(&self, region: &ClockRegion) -> Option<&CalibrationController> {
        self.controllers.iter().find(|c| &c.region == region)
    }

    /// Check one controller per region: none twice, none missing from `required`.
    pub fn validate<'a>(&self, required: impl IntoIterator<Item = &'a ClockRegion>) -> Result<()> {
        let mut seen = BTreeSet::new();
        for c in &self.controllers {
            if !seen.insert(&c.region) {
                return Err(ClockError::DuplicateCalibrationController {
                    region: c.region.to_string(),
                });
            }
        }
        for region in required {
            if !seen.contains(region) {
                return Err(ClockError::MissingCalibrationController {
                    region: region.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Collects delay-primitive consumers and builds the calibration domain.
#[derive(Debug, Clone)]
pub struct DelayCalibrationBuilder {
    source: CalibrationSource,
    requests: BTreeMap<ClockRegion, Vec<String>>,
}

impl DelayCalibrationBuilder {
    pub fn new(source: CalibrationSource) -> Self {
        Self {
            source,
            requests: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> CalibrationSource {
        self.source
    }

    /// Register `consumer` as using delay primitives in `region`.
    ///
    /// Returns `true` if this is the first request for the region.
    pub fn request(&mut self, consumer: &str, region: ClockRegion) -> bool {
        let consumers = self.requests.entry(region.clone()).or_default();
        let first = consumers.is_empty();
        if !consumers.iter().any(|c| c == consumer) {
            consumers.push(consumer.to_string());
        }
        if first {
            debug!("calibration: region {region} requested by {consumer}");
        } else {
            debug!("calibration: region {region} already requested, merging {consumer}");
        }
        first
    }

    pub fn is_required(&self) -> bool {
        !self.requests.is_empty()
    }

    pub fn regions(&self) -> impl Iterator<Item = &ClockRegion> {
        self.requests.keys()
    }

    /// Create the calibration domain in `tree` and bind one controller per
    /// requested region. Returns `None` when nothing requested calibration.
    ///
    /// `reference` is the external oscillator; it is required for
    /// [`CalibrationSource::FromReference`].
    pub fn build(
        self,
        tree: &mut ClockTree,
        reference: Option<(SignalRef, Hz)>,
        limits: &SynthesisLimits,
    ) -> Result<Option<CalibrationDomain>> {
        if !self.is_required() {
            return Ok(None);
        }

        let (domain, block, derived_from) = match self.source {
            CalibrationSource::FromReference => {
                let (signal, frequency) = reference.ok_or_else(|| {
                    ClockError::CalibrationSourceUnavailable {
                        reason: "board has no reference clock to derive the calibration clock from"
                            .into(),
                    }
                })?;
                derive_from_reference(tree, signal, frequency, limits)?
            }
            CalibrationSource::FromSystemClock => derive_from_system(tree, limits)?,
        };
        tree.add_domain(domain)?;

        let mut controllers: Vec<CalibrationController> = Vec::new();
        for (region, consumers) in self.requests {
            bind_controller(&mut controllers, region, consumers)?;
        }
        info!(
            "calibration: {} MHz from {derived_from} via {block}, {} controller(s)",
            format_hz(CALIBRATION_FREQUENCY),
            controllers.len()
        );

        Ok(Some(CalibrationDomain {
            source: self.source,
            derived_from,
            block,
            frequency: CALIBRATION_FREQUENCY,
            controllers,
        }))
    }
}

fn bind_controller(
    controllers: &mut Vec<CalibrationController>,
    region: ClockRegion,
    consumers: Vec<String>,
) -> Result<()> {
    if controllers.iter().any(|c| c.region == region) {
        return Err(ClockError::DuplicateCalibrationController {
            region: region.to_string(),
        });
    }
    controllers.push(CalibrationController {
        name: format!("idelayctrl_{region}"),
        region,
        domain: CALIBRATION_DOMAIN.into(),
        consumers,
    });
    Ok(())
}

fn derive_from_reference(
    tree: &mut ClockTree,
    signal: SignalRef,
    frequency: Hz,
    limits: &SynthesisLimits,
) -> Result<(ClockDomain, String, SignalRef)> {
    let existing = tree
        .blocks()
        .iter()
        .find(|b| b.input().is_some_and(|i| i.signal == signal))
        .map(|b| b.name().to_string());

    if let Some(name) = existing {
        if let Some(block) = tree.block_mut(&name) {
            match block.create_clkout(CALIBRATION_DOMAIN, CALIBRATION_FREQUENCY) {
                Ok(domain) => return Ok((domain, name, signal)),
                // The shared VCO cannot serve both; give calibration its own block.
                Err(ClockError::UnachievableFrequency { others, .. }) => {
                    debug!("{name}: 200 MHz does not fit beside [{others}], adding a block on {signal}");
                }
                Err(e) => return Err(e),
            }
        }
    }

    let name = tree.next_block_name();
    let mut block =
        FrequencySynthesisBlock::new(&name, limits.clone(), ResetExpr::Signal(tree.soft_reset().clone()));
    block.register_clkin(signal.clone(), frequency)?;
    let domain = block.create_clkout(CALIBRATION_DOMAIN, CALIBRATION_FREQUENCY)?;
    let clkin = block.clkin();
    tree.add_block(block);
    // Reset comes from the system domain, asynchronous to this block's input.
    let sys_clk = tree.system().clock.clone();
    tree.add_false_path(sys_clk, clkin);
    Ok((domain, name, signal))
}

fn derive_from_system(
    tree: &mut ClockTree,
    limits: &SynthesisLimits,
) -> Result<(ClockDomain, String, SignalRef)> {
    let system = tree.system().clone();
    let name = tree.next_block_name();
    let mut block =
        FrequencySynthesisBlock::new(&name, limits.clone(), ResetExpr::Signal(tree.soft_reset().clone()));
    block.register_clkin(system.clock.clone(), system.frequency)?;
    let domain = block.create_clkout(CALIBRATION_DOMAIN, CALIBRATION_FREQUENCY)?;
    tree.add_block(block);
    Ok((domain, name, system.clock))
}
