//! System clock source selection.
//!
//! The two modes share no wiring: either the system clock is the hard
//! processor's fabric clock, or it comes out of a synthesis block fed by an
//! external oscillator.

use log::info;
use serde::{Deserialize, Serialize};

use socweave_board::Toolchain;
use socweave_core::{format_hz, ClockDomain, Hz, ResetExpr, SignalRef};

use crate::error::{ClockError, Result};
use crate::synthesis::{FrequencySynthesisBlock, SynthesisLimits};
use crate::tree::ClockTree;

/// Fabric clock 0 output of the hard processor.
pub const PS7_CLOCK: &str = "ps7.fclk_clk0";
/// Fabric reset 0 output of the hard processor (active high after inversion).
pub const PS7_RESET: &str = "ps7.fclk_reset0";
/// Externally requested soft reset of the clock/reset generator.
pub const SOFT_RESET: &str = "crg.rst";
/// Name of the system clock domain.
pub const SYSTEM_DOMAIN: &str = "sys";

/// Where the system clock comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum ClockMode {
    /// Alias the hard processor's fabric clock and reset.
    HardProcessorDerived,
    /// Synthesize from an external oscillator.
    ExternalReferenceDerived {
        reference: SignalRef,
        reference_frequency: Hz,
        limits: SynthesisLimits,
    },
}

impl ClockMode {
    pub fn label(&self) -> &'static str {
        match self {
            ClockMode::HardProcessorDerived => "hard-processor-derived",
            ClockMode::ExternalReferenceDerived { .. } => "external-reference-derived",
        }
    }
}

/// Clock source configuration for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClockSourceConfig {
    pub mode: ClockMode,
    pub target_frequency: Hz,
}

/// Produce the system clock domain and its reset.
///
/// Hard-processor wiring is only expressible with Vivado; any other toolchain
/// is a configuration error.
pub fn establish_system_clock(config: &ClockSourceConfig, toolchain: Toolchain) -> Result<ClockTree> {
    if config.target_frequency == 0 {
        return Err(ClockError::ZeroFrequency {
            key: "clock.target-frequency".into(),
        });
    }
    let soft_reset = SignalRef::new(SOFT_RESET);

    match &config.mode {
        ClockMode::HardProcessorDerived => {
            if toolchain != Toolchain::Vivado {
                return Err(ClockError::UnsupportedToolchain {
                    mode: config.mode.label(),
                    toolchain: toolchain.to_string(),
                    required: Toolchain::Vivado.to_string(),
                });
            }
            let system = ClockDomain::new(
                SYSTEM_DOMAIN,
                SignalRef::new(PS7_CLOCK),
                config.target_frequency,
                ResetExpr::signal(PS7_RESET).or(ResetExpr::Signal(soft_reset.clone())),
            );
            info!(
                "system clock: hard processor fabric clock at {} MHz",
                format_hz(config.target_frequency)
            );
            Ok(ClockTree::new(soft_reset, system))
        }
        ClockMode::ExternalReferenceDerived {
            reference,
            reference_frequency,
            limits,
        } => {
            if *reference_frequency == 0 {
                return Err(ClockError::ZeroFrequency {
                    key: "clock.reference-frequency".into(),
                });
            }
            let mut block = FrequencySynthesisBlock::new(
                "pll0",
                limits.clone(),
                ResetExpr::Signal(soft_reset.clone()),
            );
            block.register_clkin(reference.clone(), *reference_frequency)?;
            let system = block.create_clkout(SYSTEM_DOMAIN, config.target_frequency)?;
            let clkin = block.clkin();
            let sys_clk = system.clock.clone();
            info!(
                "system clock: {} {} MHz -> {} MHz",
                block.name(),
                format_hz(*reference_frequency),
                format_hz(config.target_frequency)
            );

            let mut tree = ClockTree::new(soft_reset, system);
            tree.add_block(block);
            // The soft reset reaching the block is asynchronous to its input.
            tree.add_false_path(sys_clk, clkin);
            Ok(tree)
        }
    }
}
