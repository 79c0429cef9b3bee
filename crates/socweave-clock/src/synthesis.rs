//! Frequency synthesis blocks (7-series PLLE2 / MMCME2, integer mode).
//!
//! A block registers one input clock and creates up to `max_outputs` output
//! domains. Every output must be reachable exactly:
//!
//! ```text
//! f_out = f_in * M / (D * O)
//! ```
//!
//! with the feedback multiplier `M`, input divider `D` and per-output divider
//! `O` inside the primitive's ranges and the VCO (`f_in * M / D`) inside the
//! speedgrade's VCO range. The configuration is re-solved on every new output,
//! so an unachievable request fails at the point it is made.

use std::fmt;
use std::ops::RangeInclusive;

use log::debug;
use serde::{Deserialize, Serialize};

use socweave_core::{format_hz, ClockDomain, Hz, ResetExpr, SignalRef, MHZ};

use crate::error::{ClockError, Result};

/// Synthesis primitive family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    #[default]
    Plle2,
    Mmcme2,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::Plle2 => write!(f, "PLLE2_ADV"),
            PrimitiveKind::Mmcme2 => write!(f, "MMCME2_ADV"),
        }
    }
}

/// Divider constraints of one primitive at one speedgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SynthesisLimits {
    pub kind: PrimitiveKind,
    pub speedgrade: i8,
    pub input_range: RangeInclusive<Hz>,
    pub vco_range: RangeInclusive<Hz>,
    pub multiplier_range: RangeInclusive<u32>,
    pub input_divider_range: RangeInclusive<u32>,
    pub output_divider_range: RangeInclusive<u32>,
    pub max_outputs: usize,
}

impl SynthesisLimits {
    /// Limits for `kind` at `speedgrade` (-1, -2 or -3).
    pub fn for_primitive(kind: PrimitiveKind, speedgrade: i8) -> Result<Self> {
        let vco_max = match (kind, speedgrade) {
            (PrimitiveKind::Plle2, -1) => 1600,
            (PrimitiveKind::Plle2, -2) => 1866,
            (PrimitiveKind::Plle2, -3) => 2133,
            (PrimitiveKind::Mmcme2, -1) => 1200,
            (PrimitiveKind::Mmcme2, -2) => 1440,
            (PrimitiveKind::Mmcme2, -3) => 1600,
            (PrimitiveKind::Plle2, _) => {
                return Err(ClockError::InvalidSpeedgrade {
                    kind: "PLLE2",
                    speedgrade,
                })
            }
            (PrimitiveKind::Mmcme2, _) => {
                return Err(ClockError::InvalidSpeedgrade {
                    kind: "MMCME2",
                    speedgrade,
                })
            }
        };
        Ok(match kind {
            PrimitiveKind::Plle2 => Self {
                kind,
                speedgrade,
                input_range: 19 * MHZ..=800 * MHZ,
                vco_range: 800 * MHZ..=vco_max * MHZ,
                multiplier_range: 2..=64,
                input_divider_range: 1..=56,
                output_divider_range: 1..=128,
                max_outputs: 6,
            },
            PrimitiveKind::Mmcme2 => Self {
                kind,
                speedgrade,
                input_range: 10 * MHZ..=800 * MHZ,
                vco_range: 600 * MHZ..=vco_max * MHZ,
                multiplier_range: 2..=64,
                input_divider_range: 1..=106,
                output_divider_range: 1..=128,
                max_outputs: 7,
            },
        })
    }
}

/// A solved divider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DividerConfig {
    pub input_divider: u32,
    pub feedback_multiplier: u32,
    /// VCO frequency, rounded down to whole hertz.
    pub vco: Hz,
    /// One divider per output, in output order.
    pub output_dividers: Vec<u32>,
}

impl DividerConfig {
    /// Exact output frequency of output `index` for input `f_in`, if integral.
    pub fn output_frequency(&self, f_in: Hz, index: usize) -> Option<Hz> {
        let o = *self.output_dividers.get(index)? as u128;
        let num = f_in as u128 * self.feedback_multiplier as u128;
        let den = self.input_divider as u128 * o;
        (num % den == 0).then(|| (num / den) as Hz)
    }
}

/// Search for a divider configuration producing every target exactly.
///
/// Input dividers ascend and multipliers descend, so the first hit has the
/// smallest input divider and the highest VCO for it.
pub fn solve(limits: &SynthesisLimits, f_in: Hz, targets: &[Hz]) -> Option<DividerConfig> {
    let f_in = f_in as u128;
    let vco_min = *limits.vco_range.start() as u128;
    let vco_max = *limits.vco_range.end() as u128;

    for d in limits.input_divider_range.clone() {
        let d = d as u128;
        for m in limits.multiplier_range.clone().rev() {
            let vco_num = f_in * m as u128;
            if vco_num < vco_min * d || vco_num > vco_max * d {
                continue;
            }
            let dividers: Option<Vec<u32>> = targets
                .iter()
                .map(|&t| {
                    let den = t as u128 * d;
                    if den == 0 || vco_num % den != 0 {
                        return None;
                    }
                    let o = u32::try_from(vco_num / den).ok()?;
                    limits.output_divider_range.contains(&o).then_some(o)
                })
                .collect();
            if let Some(output_dividers) = dividers {
                return Some(DividerConfig {
                    input_divider: d as u32,
                    feedback_multiplier: m,
                    vco: (vco_num / d) as Hz,
                    output_dividers,
                });
            }
        }
    }
    None
}

/// One requested output of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SynthesisOutput {
    pub domain: String,
    pub frequency: Hz,
}

/// A registered input clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SynthesisInput {
    pub signal: SignalRef,
    pub frequency: Hz,
}

/// A phase-locked multiply/divide block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FrequencySynthesisBlock {
    name: String,
    limits: SynthesisLimits,
    reset: ResetExpr,
    input: Option<SynthesisInput>,
    outputs: Vec<SynthesisOutput>,
    config: Option<DividerConfig>,
}

impl FrequencySynthesisBlock {
    /// A block named `name` (e.g. "pll0") whose reset input is driven by `reset`.
    pub fn new(name: impl Into<String>, limits: SynthesisLimits, reset: ResetExpr) -> Self {
        Self {
            name: name.into(),
            limits,
            reset,
            input: None,
            outputs: Vec::new(),
            config: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limits(&self) -> &SynthesisLimits {
        &self.limits
    }

    pub fn input(&self) -> Option<&SynthesisInput> {
        self.input.as_ref()
    }

    pub fn outputs(&self) -> &[SynthesisOutput] {
        &self.outputs
    }

    pub fn config(&self) -> Option<&DividerConfig> {
        self.config.as_ref()
    }

    /// Net the input clock is connected to inside the block.
    pub fn clkin(&self) -> SignalRef {
        SignalRef::new(format!("{}.clkin", self.name))
    }

    /// Lock indicator. Downstream logic is stable only while it is high.
    pub fn locked(&self) -> SignalRef {
        SignalRef::new(format!("{}.locked", self.name))
    }

    pub fn reset(&self) -> &ResetExpr {
        &self.reset
    }

    pub fn clkout(&self, index: usize) -> SignalRef {
        SignalRef::new(format!("{}.clkout{index}", self.name))
    }

    /// Register the single input clock.
    pub fn register_clkin(&mut self, signal: SignalRef, frequency: Hz) -> Result<()> {
        if self.input.is_some() {
            return Err(ClockError::InputAlreadyRegistered {
                block: self.name.clone(),
            });
        }
        if !self.limits.input_range.contains(&frequency) {
            return Err(ClockError::InputOutOfRange {
                block: self.name.clone(),
                frequency,
                min: *self.limits.input_range.start(),
                max: *self.limits.input_range.end(),
            });
        }
        debug!("{}: input {} at {} MHz", self.name, signal, format_hz(frequency));
        self.input = Some(SynthesisInput { signal, frequency });
        Ok(())
    }

    /// Add an output clock domain at exactly `frequency`.
    ///
    /// Fails without modifying the block if no divider configuration can
    /// produce this output together with the existing ones.
    pub fn create_clkout(&mut self, domain: &str, frequency: Hz) -> Result<ClockDomain> {
        let input = self.input.as_ref().ok_or_else(|| ClockError::NoInputRegistered {
            block: self.name.clone(),
        })?;
        if frequency == 0 {
            return Err(ClockError::ZeroFrequency {
                key: format!("{}.{domain}", self.name),
            });
        }
        if self.outputs.len() >= self.limits.max_outputs {
            return Err(ClockError::TooManyOutputs {
                block: self.name.clone(),
                max: self.limits.max_outputs,
            });
        }
        if self.outputs.iter().any(|o| o.domain == domain) {
            return Err(ClockError::DuplicateDomain {
                name: domain.into(),
            });
        }

        let mut targets: Vec<Hz> = self.outputs.iter().map(|o| o.frequency).collect();
        targets.push(frequency);
        let config = solve(&self.limits, input.frequency, &targets).ok_or_else(|| {
            ClockError::UnachievableFrequency {
                block: self.name.clone(),
                domain: domain.into(),
                reference: input.frequency,
                target: frequency,
                others: self
                    .outputs
                    .iter()
                    .map(|o| format!("{}={}", o.domain, o.frequency))
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })?;
        debug!(
            "{}: D={} M={} VCO={} MHz, dividers {:?}",
            self.name,
            config.input_divider,
            config.feedback_multiplier,
            format_hz(config.vco),
            config.output_dividers
        );

        let index = self.outputs.len();
        self.outputs.push(SynthesisOutput {
            domain: domain.into(),
            frequency,
        });
        self.config = Some(config);

        Ok(ClockDomain::new(
            domain,
            self.clkout(index),
            frequency,
            ResetExpr::not(ResetExpr::Signal(self.locked())).or(self.reset.clone()),
        ))
    }

    /// Achieved frequency of output `index` under the current configuration.
    pub fn achieved_frequency(&self, index: usize) -> Option<Hz> {
        let input = self.input.as_ref()?;
        self.config.as_ref()?.output_frequency(input.frequency, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pll(speedgrade: i8) -> FrequencySynthesisBlock {
        FrequencySynthesisBlock::new(
            "pll0",
            SynthesisLimits::for_primitive(PrimitiveKind::Plle2, speedgrade).unwrap(),
            ResetExpr::signal("crg.rst"),
        )
    }

    #[test]
    fn forty_to_one_twenty_five_is_exact() {
        let mut block = pll(-1);
        block.register_clkin("clk40".into(), 40 * MHZ).unwrap();
        let sys = block.create_clkout("sys", 125 * MHZ).unwrap();
        assert_eq!(sys.frequency, 125 * MHZ);
        assert_eq!(block.achieved_frequency(0), Some(125 * MHZ));
        let cfg = block.config().unwrap();
        assert_eq!(cfg.vco, 1000 * MHZ);
        assert_eq!(
            40 * MHZ * cfg.feedback_multiplier as u64
                / (cfg.input_divider as u64 * cfg.output_dividers[0] as u64),
            125 * MHZ
        );
    }

    #[test]
    fn second_output_shares_vco() {
        let mut block = pll(-2);
        block.register_clkin("clk40".into(), 40 * MHZ).unwrap();
        block.create_clkout("sys", 125 * MHZ).unwrap();
        block.create_clkout("idelay", 200 * MHZ).unwrap();
        assert_eq!(block.achieved_frequency(0), Some(125 * MHZ));
        assert_eq!(block.achieved_frequency(1), Some(200 * MHZ));
    }

    #[test]
    fn unachievable_output_leaves_block_untouched() {
        let mut block = pll(-1);
        block.register_clkin("clk40".into(), 40 * MHZ).unwrap();
        block.create_clkout("sys", 125 * MHZ).unwrap();
        let before = block.clone();
        let err = block.create_clkout("odd", 123_456_789).unwrap_err();
        assert!(matches!(err, ClockError::UnachievableFrequency { .. }));
        assert!(err.to_string().contains("sys=125000000"));
        assert_eq!(block, before);
    }

    #[test]
    fn output_reset_waits_for_lock() {
        let mut block = pll(-1);
        block.register_clkin("clk40".into(), 40 * MHZ).unwrap();
        let sys = block.create_clkout("sys", 100 * MHZ).unwrap();
        assert!(sys.reset.references(&block.locked()));
        assert!(sys.reset.has_term(&"crg.rst".into()));
        assert_eq!(sys.clock, "pll0.clkout0".into());
    }

    #[test]
    fn input_range_is_enforced() {
        let mut block = pll(-1);
        let err = block.register_clkin("clk".into(), 5 * MHZ).unwrap_err();
        assert!(matches!(err, ClockError::InputOutOfRange { .. }));
    }

    #[test]
    fn input_registered_once() {
        let mut block = pll(-1);
        block.register_clkin("clk40".into(), 40 * MHZ).unwrap();
        assert!(matches!(
            block.register_clkin("clk40".into(), 40 * MHZ),
            Err(ClockError::InputAlreadyRegistered { .. })
        ));
    }

    #[test]
    fn output_requires_input() {
        let mut block = pll(-1);
        assert!(matches!(
            block.create_clkout("sys", 100 * MHZ),
            Err(ClockError::NoInputRegistered { .. })
        ));
    }

    #[test]
    fn output_count_limit() {
        let mut block = pll(-1);
        block.register_clkin("clk40".into(), 40 * MHZ).unwrap();
        for i in 0..6 {
            block.create_clkout(&format!("cd{i}"), 100 * MHZ).unwrap();
        }
        assert!(matches!(
            block.create_clkout("cd6", 100 * MHZ),
            Err(ClockError::TooManyOutputs { max: 6, .. })
        ));
    }

    #[test]
    fn duplicate_output_domain() {
        let mut block = pll(-1);
        block.register_clkin("clk40".into(), 40 * MHZ).unwrap();
        block.create_clkout("sys", 100 * MHZ).unwrap();
        assert!(matches!(
            block.create_clkout("sys", 50 * MHZ),
            Err(ClockError::DuplicateDomain { .. })
        ));
    }

    #[test]
    fn speedgrade_widens_vco_range() {
        // 1800 MHz VCO is only legal from -2 upwards.
        let slow = SynthesisLimits::for_primitive(PrimitiveKind::Plle2, -1).unwrap();
        let fast = SynthesisLimits::for_primitive(PrimitiveKind::Plle2, -2).unwrap();
        assert!(solve(&slow, 100 * MHZ, &[1800 * MHZ]).is_none());
        assert_eq!(solve(&fast, 100 * MHZ, &[1800 * MHZ]).unwrap().vco, 1800 * MHZ);
    }

    #[test]
    fn mmcm_limits() {
        let limits = SynthesisLimits::for_primitive(PrimitiveKind::Mmcme2, -1).unwrap();
        assert_eq!(limits.max_outputs, 7);
        assert!(limits.input_range.contains(&(12 * MHZ)));
        assert!(SynthesisLimits::for_primitive(PrimitiveKind::Mmcme2, -4).is_err());
    }

    #[test]
    fn solver_prefers_highest_vco() {
        let limits = SynthesisLimits::for_primitive(PrimitiveKind::Plle2, -1).unwrap();
        let cfg = solve(&limits, 100 * MHZ, &[100 * MHZ]).unwrap();
        assert_eq!(cfg.input_divider, 1);
        assert_eq!(cfg.vco, 1600 * MHZ);
        assert_eq!(cfg.output_dividers, vec![16]);
    }
}
