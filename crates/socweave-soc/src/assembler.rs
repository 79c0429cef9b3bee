//! SoC assembler: preflight, then clock -> calibration -> regions ->
//! peripherals -> handoff.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use socweave_board::ps7::FPGA0_FREQ_KEY;
use socweave_board::{BoardDescription, DevicePart, Toolchain};
use socweave_clock::selector::SYSTEM_DOMAIN;
use socweave_clock::{
    establish_system_clock, CalibrationDomain, CalibrationSource, ClockError, ClockMode,
    ClockSourceConfig, ClockTree, DelayCalibrationBuilder, SynthesisLimits,
};
use socweave_core::{format_hz, ClockRegion, Hz, SignalRef};
use socweave_memory::{validate_disjoint, HardProcessorMap, MemoryRegion, RegionRequest};

use crate::config::{ClockSource, SocConfig};
use crate::error::{Result, SocError};
use crate::handoff::SocHandoff;
use crate::peripheral::{requested_peripherals, Peripheral, PeripheralKind};
use crate::phase::BuildPhase;

/// Bundles the hard processor wiring needs.
pub const PS7_BUNDLES: [&str; 5] = ["ps7_clk", "ps7_porb", "ps7_srstb", "ps7_mio", "ps7_ddram"];

/// Hard processor CPU clock reported to firmware.
pub const PS_CPU_FREQUENCY: Hz = 666_666_687;

/// One SoC build.
///
/// Created by [`SocAssembler::new`], which runs every configuration check
/// before anything is constructed. Each step then advances the build phase
/// by exactly one; [`SocAssembler::finalize`] consumes the assembler and
/// returns the handoff snapshot.
pub struct SocAssembler<'a> {
    board: &'a BoardDescription,
    config: &'a SocConfig,
    part: DevicePart,
    limits: SynthesisLimits,
    reference: Option<(SignalRef, Hz)>,
    memory_map: HardProcessorMap,
    plan: Vec<PeripheralKind>,
    calibration_requests: Option<DelayCalibrationBuilder>,
    required_regions: Vec<ClockRegion>,
    phase: BuildPhase,
    clock: Option<ClockTree>,
    calibration: Option<CalibrationDomain>,
    regions: Vec<MemoryRegion>,
    peripherals: Vec<Peripheral>,
}

/// Clock region of the bundle holding a peripheral's delay primitives.
fn delay_region(board: &BoardDescription, kind: &PeripheralKind, bundle: &str) -> Result<ClockRegion> {
    board
        .request(bundle)?
        .clock_region
        .clone()
        .ok_or_else(|| SocError::PeripheralUnavailable {
            peripheral: kind.name().into(),
            reason: format!("bundle '{bundle}' on board '{}' has no clock region", board.name),
        })
}

impl<'a> SocAssembler<'a> {
    /// Check `config` against `board` and plan the build.
    pub fn new(board: &'a BoardDescription, config: &'a SocConfig) -> Result<Self> {
        let part = board.part(config.variant.as_deref())?.clone();
        let speedgrade = part.speedgrade()?;

        if !board.supports_toolchain(config.toolchain) {
            return Err(SocError::UnsupportedToolchain {
                board: board.name.clone(),
                toolchain: config.toolchain.to_string(),
                supported: board
                    .toolchains
                    .iter()
                    .map(Toolchain::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let hard_processor = config.features.hard_processor;
        if hard_processor {
            if config.toolchain != Toolchain::Vivado {
                return Err(SocError::HardProcessorToolchain {
                    toolchain: config.toolchain.to_string(),
                });
            }
            if !part.has_hard_processor() {
                return Err(SocError::NoHardProcessor {
                    part: part.to_string(),
                });
            }
            for name in PS7_BUNDLES {
                board.request(name)?;
            }
            if board.ps7_config.is_empty() {
                warn!("board '{}' has an empty PS7 configuration", board.name);
            }
        }

        let clock_source = config.clock_source();
        if clock_source == ClockSource::HardProcessor && !hard_processor {
            return Err(SocError::ClockSourceWithoutHardProcessor);
        }
        let reference = board
            .reference_clock
            .as_ref()
            .zip(board.reference_frequency())
            .map(|(name, frequency)| (SignalRef::new(name.as_str()), frequency));
        if clock_source == ClockSource::ExternalReference && reference.is_none() {
            return Err(SocError::MissingReferenceClock {
                board: board.name.clone(),
                needed_by: "clock.source = external-reference",
            });
        }

        let plan = requested_peripherals(config)?;
        for kind in &plan {
            for bundle in kind.bundles() {
                board.request(bundle)?;
            }
        }

        let limits = SynthesisLimits::for_primitive(config.primitive, speedgrade)?;

        let mut requests = DelayCalibrationBuilder::new(config.calibration_source());
        // General fabric I/O next to the hard processor is delay-calibrated.
        if hard_processor {
            if let Some(region) = &board.io_delay_region {
                requests.request("crg", region.clone());
            }
        }
        for kind in &plan {
            if let Some(bundle) = kind.delay_bundle() {
                requests.request(kind.name(), delay_region(board, kind, bundle)?);
            }
        }
        if requests.is_required()
            && requests.source() == CalibrationSource::FromReference
            && reference.is_none()
        {
            return Err(SocError::MissingReferenceClock {
                board: board.name.clone(),
                needed_by: "calibration.source = from-reference",
            });
        }
        let required_regions: Vec<ClockRegion> = requests.regions().cloned().collect();

        info!(
            "{} ({part}, {}): {} clock at {} MHz, peripherals [{}]",
            board.name,
            config.toolchain,
            clock_source,
            format_hz(config.sys_clk_freq),
            plan.iter().map(PeripheralKind::name).collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            board,
            config,
            part,
            limits,
            reference,
            memory_map: HardProcessorMap::zynq7000(),
            plan,
            calibration_requests: Some(requests),
            required_regions,
            phase: BuildPhase::Unconfigured,
            clock: None,
            calibration: None,
            regions: Vec::new(),
            peripherals: Vec::new(),
        })
    }

    /// Use a different hard processor memory map.
    pub fn with_memory_map(mut self, map: HardProcessorMap) -> Self {
        self.memory_map = map;
        self
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn part(&self) -> &DevicePart {
        &self.part
    }

    /// Clock regions that need a calibration controller.
    pub fn required_calibration_regions(&self) -> &[ClockRegion] {
        &self.required_regions
    }

    pub fn clock_tree(&self) -> Option<&ClockTree> {
        self.clock.as_ref()
    }

    pub fn calibration(&self) -> Option<&CalibrationDomain> {
        self.calibration.as_ref()
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn peripherals(&self) -> &[Peripheral] {
        &self.peripherals
    }

    /// Establish the system clock and, if any consumer asked for it, the
    /// delay-calibration domain.
    pub fn establish_clock(&mut self) -> Result<()> {
        self.phase.check_transition(BuildPhase::ClockEstablished)?;

        let mode = match self.config.clock_source() {
            ClockSource::HardProcessor => ClockMode::HardProcessorDerived,
            ClockSource::ExternalReference => {
                let (reference, reference_frequency) =
                    self.reference.clone().ok_or_else(|| SocError::MissingReferenceClock {
                        board: self.board.name.clone(),
                        needed_by: "clock.source = external-reference",
                    })?;
                ClockMode::ExternalReferenceDerived {
                    reference,
                    reference_frequency,
                    limits: self.limits.clone(),
                }
            }
        };
        let source = ClockSourceConfig {
            mode,
            target_frequency: self.config.sys_clk_freq,
        };
        let mut tree = establish_system_clock(&source, self.config.toolchain)?;

        if let Some(requests) = self.calibration_requests.take() {
            self.calibration = requests.build(&mut tree, self.reference.clone(), &self.limits)?;
        }

        info!(
            "phase {}: {} domain(s), {} synthesis block(s)",
            BuildPhase::ClockEstablished,
            tree.domains().len(),
            tree.blocks().len()
        );
        self.clock = Some(tree);
        self.phase = BuildPhase::ClockEstablished;
        Ok(())
    }

    /// Compose the memory regions for the configured feature set.
    pub fn compose_regions(&mut self) -> Result<()> {
        self.phase.check_transition(BuildPhase::RegionsComposed)?;

        let request = self
            .config
            .memory
            .clone()
            .unwrap_or_else(|| RegionRequest::full(&self.memory_map));
        self.regions = socweave_memory::compose_regions(
            &self.memory_map,
            self.config.features.hard_processor,
            &request,
        )?;

        info!(
            "phase {}: {} region(s)",
            BuildPhase::RegionsComposed,
            self.regions.len()
        );
        self.phase = BuildPhase::RegionsComposed;
        Ok(())
    }

    /// Wire one peripheral onto the system clock domain.
    ///
    /// The system clock must exist; wiring is only possible once the regions
    /// are composed and before the wiring phase is closed.
    pub fn wire(&mut self, kind: PeripheralKind) -> Result<()> {
        let name = kind.name();
        let tree = match &self.clock {
            Some(tree) if self.phase.has_clock() => tree,
            _ => {
                return Err(SocError::PeripheralBeforeClock {
                    peripheral: name.into(),
                    phase: self.phase,
                })
            }
        };
        if self.phase != BuildPhase::RegionsComposed {
            return Err(SocError::PhaseOrder {
                from: self.phase,
                to: BuildPhase::PeripheralsWired,
            });
        }
        if self.peripherals.iter().any(|p| p.name == name) {
            return Err(SocError::DuplicatePeripheral {
                peripheral: name.into(),
            });
        }
        if let Some(requires) = kind.requires() {
            if !self.peripherals.iter().any(|p| p.name == requires) {
                return Err(SocError::MissingDependency {
                    peripheral: name.into(),
                    requires,
                });
            }
        }
        if kind == PeripheralKind::Uart && self.config.features.hard_processor {
            return Err(SocError::PeripheralUnavailable {
                peripheral: name.into(),
                reason: "the hard processor provides the console UART".into(),
            });
        }

        let domain = tree
            .domain(SYSTEM_DOMAIN)
            .ok_or_else(|| ClockError::UnknownDomain {
                name: SYSTEM_DOMAIN.into(),
            })?
            .name
            .clone();

        let mut pins = Vec::new();
        for bundle in kind.bundles() {
            if kind == PeripheralKind::LedChaser {
                pins.extend(self.board.request_all(bundle)?.iter().map(|b| b.qualified_name()));
            } else {
                pins.push(self.board.request(bundle)?.qualified_name());
            }
        }

        let calibrated_by = match kind.delay_bundle() {
            Some(bundle) => {
                let region = delay_region(self.board, &kind, bundle)?;
                let controller = self
                    .calibration
                    .as_ref()
                    .and_then(|c| c.controller_for(&region))
                    .ok_or_else(|| ClockError::MissingCalibrationController {
                        region: region.to_string(),
                    })?;
                Some(controller.name.clone())
            }
            None => None,
        };

        debug!("wired {kind} in domain {domain}");
        self.peripherals.push(Peripheral {
            name: name.into(),
            kind,
            domain,
            pins,
            calibrated_by,
        });
        Ok(())
    }

    /// Wire every planned peripheral and close the wiring phase.
    pub fn wire_requested(&mut self) -> Result<()> {
        for kind in self.plan.clone() {
            self.wire(kind)?;
        }
        self.phase.check_transition(BuildPhase::PeripheralsWired)?;
        info!(
            "phase {}: {} peripheral(s)",
            BuildPhase::PeripheralsWired,
            self.peripherals.len()
        );
        self.phase = BuildPhase::PeripheralsWired;
        Ok(())
    }

    /// Run the final checks and produce the handoff snapshot.
    pub fn finalize(self) -> Result<SocHandoff> {
        self.phase.check_transition(BuildPhase::Finalized)?;
        let tree = self.clock.ok_or(SocError::PhaseOrder {
            from: self.phase,
            to: BuildPhase::Finalized,
        })?;

        match &self.calibration {
            Some(calibration) => calibration.validate(&self.required_regions)?,
            None => {
                if let Some(region) = self.required_regions.first() {
                    return Err(ClockError::MissingCalibrationController {
                        region: region.to_string(),
                    }
                    .into());
                }
            }
        }
        validate_disjoint(&self.regions)?;

        let hard_processor = self.config.features.hard_processor;
        let sys_clk_freq = tree.system().frequency;
        let ps7_config = hard_processor.then(|| {
            self.board
                .ps7_config
                .merged([(FPGA0_FREQ_KEY, format_hz(sys_clk_freq))])
        });

        let mut constants = BTreeMap::new();
        constants.insert("SYS_CLK_FREQ".to_string(), sys_clk_freq.to_string());
        if hard_processor {
            constants.insert("CONFIG_CLOCK_FREQUENCY".into(), PS_CPU_FREQUENCY.to_string());
            constants.insert("INTEGRATED_SRAM_SIZE".into(), "0".into());
        } else {
            constants.insert("CONFIG_CLOCK_FREQUENCY".into(), sys_clk_freq.to_string());
        }

        let (domains, blocks, constraints) = tree.into_parts();
        let handoff = SocHandoff {
            ident: format!("socweave SoC on {}", self.board.name),
            board: self.board.name.clone(),
            part: self.part,
            toolchain: self.config.toolchain,
            clock_source: self.config.clock_source(),
            domains,
            blocks,
            calibration: self.calibration,
            constraints,
            regions: self.regions,
            peripherals: self.peripherals,
            ps7_config,
            constants,
        };
        info!("phase {}: {}", BuildPhase::Finalized, handoff.fingerprint());
        Ok(handoff)
    }
}

/// Run a complete build.
pub fn assemble(board: &BoardDescription, config: &SocConfig) -> Result<SocHandoff> {
    let mut soc = SocAssembler::new(board, config)?;
    soc.establish_clock()?;
    soc.compose_regions()?;
    soc.wire_requested()?;
    soc.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use socweave_board::builtin;

    #[test]
    fn steps_advance_one_phase_each() {
        let board = builtin::antsdr_e200();
        let config = SocConfig::default();
        let mut soc = SocAssembler::new(&board, &config).unwrap();
        assert_eq!(soc.phase(), BuildPhase::Unconfigured);
        soc.establish_clock().unwrap();
        assert_eq!(soc.phase(), BuildPhase::ClockEstablished);
        soc.compose_regions().unwrap();
        assert_eq!(soc.phase(), BuildPhase::RegionsComposed);
        soc.wire_requested().unwrap();
        assert_eq!(soc.phase(), BuildPhase::PeripheralsWired);
        let handoff = soc.finalize().unwrap();
        assert_eq!(handoff.board(), "antsdr-e200");
    }

    #[test]
    fn clock_cannot_be_established_twice() {
        let board = builtin::antsdr_e200();
        let config = SocConfig::default();
        let mut soc = SocAssembler::new(&board, &config).unwrap();
        soc.establish_clock().unwrap();
        let err = soc.establish_clock().unwrap_err();
        assert!(matches!(err, SocError::PhaseOrder { .. }));
    }

    #[test]
    fn regions_need_clock_first() {
        let board = builtin::antsdr_e200();
        let config = SocConfig::default();
        let mut soc = SocAssembler::new(&board, &config).unwrap();
        assert!(matches!(
            soc.compose_regions(),
            Err(SocError::PhaseOrder { .. })
        ));
    }

    #[test]
    fn wiring_before_regions_is_out_of_order() {
        let board = builtin::antsdr_e200();
        let config = SocConfig::default();
        let mut soc = SocAssembler::new(&board, &config).unwrap();
        soc.establish_clock().unwrap();
        let err = soc.wire(PeripheralKind::LedChaser).unwrap_err();
        assert!(matches!(err, SocError::PhaseOrder { .. }));
    }

    #[test]
    fn mac_needs_phy() {
        let board = builtin::antsdr_e200();
        let config = SocConfig::default();
        let mut soc = SocAssembler::new(&board, &config).unwrap();
        soc.establish_clock().unwrap();
        soc.compose_regions().unwrap();
        let err = soc.wire(PeripheralKind::Ethernet).unwrap_err();
        assert!(matches!(err, SocError::MissingDependency { requires: "ethphy", .. }));
    }

    #[test]
    fn unplanned_phy_has_no_controller_without_general_io_request() {
        let board = builtin::antsdr_e200();
        let mut config = SocConfig::default();
        config.features.hard_processor = false;
        let mut soc = SocAssembler::new(&board, &config).unwrap();
        soc.establish_clock().unwrap();
        soc.compose_regions().unwrap();
        let err = soc.wire(PeripheralKind::EthernetPhy).unwrap_err();
        assert!(matches!(
            err,
            SocError::Clock(ClockError::MissingCalibrationController { .. })
        ));
    }

    #[test]
    fn uart_rejected_with_hard_processor() {
        let board = builtin::antsdr_e200();
        let config = SocConfig::default();
        let mut soc = SocAssembler::new(&board, &config).unwrap();
        soc.establish_clock().unwrap();
        soc.compose_regions().unwrap();
        assert!(matches!(
            soc.wire(PeripheralKind::Uart),
            Err(SocError::PeripheralUnavailable { .. })
        ));
    }

    #[test]
    fn duplicate_wiring_rejected() {
        let board = builtin::antsdr_e200();
        let config = SocConfig::default();
        let mut soc = SocAssembler::new(&board, &config).unwrap();
        soc.establish_clock().unwrap();
        soc.compose_regions().unwrap();
        soc.wire(PeripheralKind::LedChaser).unwrap();
        assert!(matches!(
            soc.wire(PeripheralKind::LedChaser),
            Err(SocError::DuplicatePeripheral { .. })
        ));
    }

    #[test]
    fn planning_requests_calibration_for_general_io() {
        let board = builtin::antsdr_e200();
        let config = SocConfig::default();
        let soc = SocAssembler::new(&board, &config).unwrap();
        assert_eq!(
            soc.required_calibration_regions(),
            &[ClockRegion::new("X0Y1")]
        );
    }
}
