//! End-to-end assembly tests against the built-in boards.

use socweave_board::parse::{board_to_toml, resolve_board};
use socweave_board::{builtin, BoardError, Toolchain};
use socweave_clock::selector::{PS7_RESET, SOFT_RESET, SYSTEM_DOMAIN};
use socweave_clock::{
    establish_system_clock, CalibrationSource, ClockError, ClockMode, ClockSourceConfig,
    PrimitiveKind,
};
use socweave_core::{ClockRegion, MHZ};
use socweave_memory::{HardProcessorMap, MemoryError, MemoryWindow, RegionRequest, MIB};
use socweave_soc::{
    assemble, BuildPhase, ClockSource, ErrorClass, PeripheralKind, SocAssembler, SocConfig,
    SocError,
};

fn external(mhz: u64) -> SocConfig {
    let mut config = SocConfig::default();
    config.features.hard_processor = false;
    config.sys_clk_freq = mhz * MHZ;
    config
}

// --- clock source -------------------------------------------------------

#[test]
fn hard_processor_clock_has_no_synthesis_block() {
    let config = ClockSourceConfig {
        mode: ClockMode::HardProcessorDerived,
        target_frequency: 100 * MHZ,
    };
    let tree = establish_system_clock(&config, Toolchain::Vivado).unwrap();
    assert_eq!(tree.system().frequency, 100_000_000);
    assert!(tree.blocks().is_empty());
}

#[test]
fn hard_processor_build_runs_at_target_frequency() {
    // No delay-calibrated I/O on this board, so nothing needs a block.
    let mut config = SocConfig::default();
    config.features.with_led_chaser = false;

    let handoff = assemble(&builtin::krtkl_snickerdoodle(), &config).unwrap();
    let sys = handoff.system_domain().unwrap();
    assert_eq!(sys.name, SYSTEM_DOMAIN);
    assert_eq!(sys.frequency, 100_000_000);
    assert!(handoff.blocks().is_empty());
    assert!(handoff.calibration().is_none());
}

#[test]
fn hard_processor_system_clock_is_not_synthesized() {
    // The only block is the calibration block fed by the system clock.
    let handoff = assemble(&builtin::antsdr_e200(), &SocConfig::default()).unwrap();
    assert_eq!(handoff.blocks().len(), 1);
    let block = &handoff.blocks()[0];
    assert!(block.outputs().iter().all(|o| o.domain != SYSTEM_DOMAIN));
    assert_eq!(
        block.input().unwrap().signal,
        handoff.system_domain().unwrap().clock
    );
}

#[test]
fn hard_processor_reset_is_or_of_both_sources() {
    let handoff = assemble(&builtin::antsdr_e200(), &SocConfig::default()).unwrap();
    let reset = &handoff.system_domain().unwrap().reset;
    assert!(reset.has_term(&PS7_RESET.into()));
    assert!(reset.has_term(&SOFT_RESET.into()));
}

#[test]
fn external_reference_40_to_125() {
    let handoff = assemble(&builtin::antsdr_e200(), &external(125)).unwrap();
    assert_eq!(handoff.blocks().len(), 1);
    let pll = &handoff.blocks()[0];
    assert_eq!(pll.input().unwrap().frequency, 40_000_000);
    assert_eq!(pll.outputs().len(), 1);
    assert_eq!(pll.outputs()[0].frequency, 125_000_000);
    assert_eq!(pll.achieved_frequency(0), Some(125_000_000));

    let sys = handoff.system_domain().unwrap();
    assert_eq!(sys.frequency, 125_000_000);
    assert!(handoff.constraints().has_false_path(&sys.clock, &pll.clkin()));
}

#[test]
fn external_reference_outputs_are_exact() {
    for mhz in [50, 100, 125, 200] {
        let handoff = assemble(&builtin::antsdr_e200(), &external(mhz)).unwrap();
        let pll = &handoff.blocks()[0];
        assert_eq!(pll.achieved_frequency(0), Some(mhz * MHZ), "{mhz} MHz");
    }
}

#[test]
fn unachievable_frequency_is_a_configuration_error() {
    let mut config = external(0);
    config.sys_clk_freq = 123_456_789;
    let err = assemble(&builtin::antsdr_e200(), &config).unwrap_err();
    assert!(matches!(
        err,
        SocError::Clock(ClockError::UnachievableFrequency { .. })
    ));
    assert_eq!(err.class(), ErrorClass::Configuration);
}

#[test]
fn mmcm_primitive_is_honoured() {
    let mut config = external(100);
    config.primitive = PrimitiveKind::Mmcme2;
    let handoff = assemble(&builtin::antsdr_e200(), &config).unwrap();
    assert_eq!(handoff.blocks()[0].limits().kind, PrimitiveKind::Mmcme2);
}

// --- delay calibration ----------------------------------------------------

#[test]
fn ethernet_with_hard_processor_gets_one_controller() {
    let mut config = SocConfig::default();
    config.features.with_ethernet = true;
    let handoff = assemble(&builtin::antsdr_e200(), &config).unwrap();

    let calibration = handoff.calibration().unwrap();
    assert_eq!(calibration.controller_count(), 1);
    assert_eq!(calibration.frequency, 200_000_000);
    let controller = &calibration.controllers[0];
    assert_eq!(controller.region, ClockRegion::new("X0Y1"));
    assert_eq!(controller.consumers, vec!["crg", "ethphy"]);

    let phy = handoff.peripheral("ethphy").unwrap();
    assert_eq!(phy.calibrated_by.as_deref(), Some("idelayctrl_X0Y1"));
    assert!(handoff.peripheral("ethmac").is_some());
}

#[test]
fn distinct_regions_get_one_controller_each() {
    let mut board = builtin::antsdr_e200();
    for bundle in board.bundles.iter_mut().filter(|b| b.name == "eth") {
        bundle.clock_region = Some(ClockRegion::new("X1Y1"));
    }
    let mut config = SocConfig::default();
    config.features.with_ethernet = true;
    let handoff = assemble(&board, &config).unwrap();

    let calibration = handoff.calibration().unwrap();
    assert_eq!(calibration.controller_count(), 2);
    assert!(calibration.controller_for(&ClockRegion::new("X0Y1")).is_some());
    assert!(calibration.controller_for(&ClockRegion::new("X1Y1")).is_some());
    assert_eq!(
        handoff.peripheral("ethphy").unwrap().calibrated_by.as_deref(),
        Some("idelayctrl_X1Y1")
    );
}

#[test]
fn calibration_from_reference_shares_the_system_block() {
    let mut config = external(100);
    config.features.with_etherbone = true;
    let handoff = assemble(&builtin::antsdr_e200(), &config).unwrap();

    let calibration = handoff.calibration().unwrap();
    assert_eq!(calibration.source, CalibrationSource::FromReference);
    assert_eq!(calibration.controller_count(), 1);
    assert_eq!(handoff.blocks().len(), 1);
    let pll = &handoff.blocks()[0];
    assert_eq!(pll.outputs().len(), 2);
    assert_eq!(pll.achieved_frequency(1), Some(200_000_000));
}

#[test]
fn calibration_gets_own_reference_block_when_vco_cannot_be_shared() {
    let mut config = external(110);
    config.features.with_ethernet = true;
    let handoff = assemble(&builtin::antsdr_e200(), &config).unwrap();

    let calibration = handoff.calibration().unwrap();
    assert_eq!(calibration.source, CalibrationSource::FromReference);
    assert_eq!(calibration.block, "pll1");
    assert_eq!(calibration.derived_from.name(), "clk40");
    assert_eq!(handoff.blocks().len(), 2);
    assert_eq!(handoff.blocks()[0].outputs().len(), 1);
    assert_eq!(handoff.blocks()[0].achieved_frequency(0), Some(110_000_000));
    assert_eq!(handoff.blocks()[1].achieved_frequency(0), Some(200_000_000));
    assert_eq!(
        handoff.peripheral("ethphy").unwrap().calibrated_by.as_deref(),
        Some("idelayctrl_X0Y1")
    );
}

#[test]
fn calibration_from_system_clock_uses_second_block() {
    let mut config = external(100);
    config.features.with_ethernet = true;
    config.calibration_source = Some(CalibrationSource::FromSystemClock);
    let handoff = assemble(&builtin::antsdr_e200(), &config).unwrap();

    assert_eq!(handoff.blocks().len(), 2);
    let calibration = handoff.calibration().unwrap();
    assert_eq!(calibration.derived_from, handoff.system_domain().unwrap().clock);
    assert_eq!(calibration.block, "pll1");
}

#[test]
fn no_delay_consumers_no_calibration() {
    let handoff = assemble(&builtin::antsdr_e200(), &external(100)).unwrap();
    assert!(handoff.calibration().is_none());
    assert!(handoff.domain("idelay").is_none());
}

// --- memory regions -------------------------------------------------------

#[test]
fn ram_window_sized_request_is_accepted() {
    let mut config = SocConfig::default();
    config.memory = Some(RegionRequest {
        ram_size: 512 * MIB,
        rom_size: None,
        flash_size: None,
    });
    let handoff = assemble(&builtin::antsdr_e200(), &config).unwrap();
    assert_eq!(handoff.regions().len(), 1);
    let sram = handoff.region("sram").unwrap();
    assert_eq!(sram.origin, 0x0010_0000);
    assert_eq!(sram.size, 512 * MIB);
}

#[test]
fn oversized_ram_is_a_composition_error() {
    let mut config = SocConfig::default();
    config.memory = Some(RegionRequest {
        ram_size: 600 * MIB,
        rom_size: None,
        flash_size: None,
    });
    let err = assemble(&builtin::antsdr_e200(), &config).unwrap_err();
    assert!(matches!(
        err,
        SocError::Memory(MemoryError::RegionExceedsWindow { .. })
    ));
    assert_eq!(err.class(), ErrorClass::Composition);
}

#[test]
fn default_regions_are_disjoint() {
    let handoff = assemble(&builtin::antsdr_e200(), &SocConfig::default()).unwrap();
    let regions = handoff.regions();
    assert_eq!(regions.len(), 3);
    for (i, a) in regions.iter().enumerate() {
        for b in &regions[i + 1..] {
            assert!(!a.overlaps(b), "{a} overlaps {b}");
        }
    }
    assert!(handoff.region("rom").unwrap().linker);
    assert_eq!(handoff.region("flash").unwrap().origin, 0xFC00_0000);
}

#[test]
fn overlapping_memory_map_aborts_build() {
    let board = builtin::antsdr_e200();
    let config = SocConfig::default();
    let mut map = HardProcessorMap::zynq7000();
    map.rom = MemoryWindow {
        origin: 0xFC00_0000,
        size: 32 * MIB,
    };
    let mut soc = SocAssembler::new(&board, &config)
        .unwrap()
        .with_memory_map(map);
    soc.establish_clock().unwrap();
    let err = soc.compose_regions().unwrap_err();
    assert!(matches!(err, SocError::Memory(MemoryError::Overlap { .. })));
    assert_eq!(err.class(), ErrorClass::Composition);
    assert_eq!(soc.phase(), BuildPhase::ClockEstablished);
}

#[test]
fn no_hard_processor_no_regions() {
    let handoff = assemble(&builtin::antsdr_e200(), &external(100)).unwrap();
    assert!(handoff.regions().is_empty());
    assert!(handoff.ps7_config().is_none());
}

// --- phases and preflight -------------------------------------------------

#[test]
fn wiring_before_clock_is_rejected() {
    let board = builtin::antsdr_e200();
    let config = SocConfig::default();
    let mut soc = SocAssembler::new(&board, &config).unwrap();
    let err = soc.wire(PeripheralKind::LedChaser).unwrap_err();
    assert!(matches!(err, SocError::PeripheralBeforeClock { .. }));
    assert_eq!(err.class(), ErrorClass::Configuration);
    assert!(soc.peripherals().is_empty());
}

#[test]
fn finalize_requires_wiring_phase() {
    let board = builtin::antsdr_e200();
    let config = SocConfig::default();
    let mut soc = SocAssembler::new(&board, &config).unwrap();
    soc.establish_clock().unwrap();
    soc.compose_regions().unwrap();
    assert!(matches!(
        soc.finalize(),
        Err(SocError::PhaseOrder {
            from: BuildPhase::RegionsComposed,
            to: BuildPhase::Finalized
        })
    ));
}

#[test]
fn hard_processor_needs_vivado() {
    let mut config = SocConfig::default();
    config.toolchain = Toolchain::Openxc7;
    let err = SocAssembler::new(&builtin::antsdr_e200(), &config).err().unwrap();
    assert!(matches!(err, SocError::HardProcessorToolchain { .. }));
    assert!(err.to_string().contains("openxc7"));
}

#[test]
fn open_toolchain_without_hard_processor() {
    let mut config = external(100);
    config.toolchain = Toolchain::Openxc7;
    assert!(assemble(&builtin::antsdr_e200(), &config).is_ok());
}

#[test]
fn hard_processor_clock_without_integration_is_rejected() {
    let mut config = external(100);
    config.clock_source = Some(ClockSource::HardProcessor);
    let err = SocAssembler::new(&builtin::antsdr_e200(), &config).err().unwrap();
    assert!(matches!(err, SocError::ClockSourceWithoutHardProcessor));
}

#[test]
fn missing_bundle_detected_before_construction() {
    // snickerdoodle names its LED "user_led".
    let board = builtin::krtkl_snickerdoodle();
    let err = SocAssembler::new(&board, &SocConfig::default()).err().unwrap();
    assert!(matches!(
        err,
        SocError::Board(BoardError::MissingBundle { ref name, .. }) if name == "led"
    ));
    assert_eq!(err.class(), ErrorClass::Configuration);
}

#[test]
fn missing_ps7_bundle_rejected() {
    let mut board = builtin::antsdr_e200();
    board.bundles.retain(|b| b.name != "ps7_ddram");
    let err = assemble(&board, &SocConfig::default()).unwrap_err();
    assert!(err.to_string().contains("ps7_ddram"));
}

#[test]
fn unknown_variant_rejected() {
    let mut config = SocConfig::default();
    config.variant = Some("z7-99".into());
    let err = assemble(&builtin::antsdr_e200(), &config).unwrap_err();
    assert!(matches!(err, SocError::Board(BoardError::UnknownVariant { .. })));
}

#[test]
fn ethernet_and_etherbone_are_exclusive() {
    let mut config = SocConfig::default();
    config.features.with_ethernet = true;
    config.features.with_etherbone = true;
    let err = assemble(&builtin::antsdr_e200(), &config).unwrap_err();
    assert!(matches!(err, SocError::ConflictingFeatures { .. }));
}

// --- handoff --------------------------------------------------------------

#[test]
fn ps7_override_and_constants() {
    let mut config = SocConfig::default();
    config.sys_clk_freq = 62_500_000;
    let handoff = assemble(&builtin::antsdr_e200(), &config).unwrap();
    let ps7 = handoff.ps7_config().unwrap();
    assert_eq!(ps7.get("PCW_FPGA0_PERIPHERAL_FREQMHZ"), Some("62.5"));
    assert_eq!(
        handoff.constants().get("CONFIG_CLOCK_FREQUENCY").map(String::as_str),
        Some("666666687")
    );
    assert_eq!(
        handoff.constants().get("INTEGRATED_SRAM_SIZE").map(String::as_str),
        Some("0")
    );
    assert!(handoff.peripheral("uart").is_none());
}

#[test]
fn board_ps7_config_is_not_mutated() {
    let board = builtin::antsdr_e200();
    let mut config = SocConfig::default();
    config.sys_clk_freq = 50 * MHZ;
    assemble(&board, &config).unwrap();
    assert_eq!(board.ps7_config.get("PCW_FPGA0_PERIPHERAL_FREQMHZ"), Some("100"));
}

#[test]
fn soft_uart_without_hard_processor() {
    let handoff = assemble(&builtin::antsdr_e200(), &external(100)).unwrap();
    let uart = handoff.peripheral("uart").unwrap();
    assert_eq!(uart.pins, vec!["serial:0"]);
    assert_eq!(uart.domain, SYSTEM_DOMAIN);
    assert_eq!(
        handoff.constants().get("CONFIG_CLOCK_FREQUENCY").map(String::as_str),
        Some("100000000")
    );
}

#[test]
fn independent_builds_do_not_share_state() {
    let board = builtin::krtkl_snickerdoodle();
    let mut config_a = external(100);
    config_a.features.with_led_chaser = false;
    config_a.variant = Some("z7-10".into());
    let mut config_b = config_a.clone();
    config_b.variant = Some("z7-20".into());

    let a = assemble(&board, &config_a).unwrap();
    let b = assemble(&board, &config_b).unwrap();
    assert_eq!(a.blocks()[0].limits().speedgrade, -1);
    assert_eq!(b.blocks()[0].limits().speedgrade, -3);
    assert_eq!(a.blocks()[0].name(), b.blocks()[0].name());
}

#[test]
fn project_board_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("boards")).unwrap();
    let mut board = builtin::antsdr_e200();
    board.name = "custom-e200".into();
    std::fs::write(
        dir.path().join("boards/custom-e200.board.toml"),
        board_to_toml(&board).unwrap(),
    )
    .unwrap();

    let loaded = resolve_board(dir.path(), "custom-e200").unwrap();
    let handoff = assemble(&loaded, &SocConfig::default()).unwrap();
    assert_eq!(handoff.board(), "custom-e200");
    assert_eq!(handoff.ident(), "socweave SoC on custom-e200");
}
