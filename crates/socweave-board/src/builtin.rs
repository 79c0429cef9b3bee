//! Built-in board descriptions.

use std::collections::BTreeMap;

use socweave_core::MHZ;

use crate::board::BoardDescription;
use crate::bundle::{Pins, SignalBundle};
use crate::device::{DevicePart, Toolchain};
use crate::ps7::Ps7Config;

/// PS7 settings shared by the Zynq-7020 SDR-class boards below.
const ZYNQ_SDR_PS7: &[(&str, &str)] = &[
    ("PCW_PRESET_BANK1_VOLTAGE", "LVCMOS 1.8V"),
    ("PCW_CRYSTAL_PERIPHERAL_FREQMHZ", "50"),
    ("PCW_APU_PERIPHERAL_FREQMHZ", "650"),
    ("PCW_SDIO_PERIPHERAL_FREQMHZ", "50"),
    ("PCW_FPGA0_PERIPHERAL_FREQMHZ", "100"),
    ("PCW_UIPARAM_DDR_FREQ_MHZ", "525"),
    ("PCW_UIPARAM_DDR_BUS_WIDTH", "16 Bit"),
    ("PCW_UIPARAM_DDR_PARTNO", "MT41J256M16 RE-125"),
    ("PCW_UIPARAM_DDR_DQS_TO_CLK_DELAY_0", "0.040"),
    ("PCW_UIPARAM_DDR_DQS_TO_CLK_DELAY_1", "0.058"),
    ("PCW_UIPARAM_DDR_DQS_TO_CLK_DELAY_2", "-0.009"),
    ("PCW_UIPARAM_DDR_DQS_TO_CLK_DELAY_3", "-0.033"),
    ("PCW_UIPARAM_DDR_BOARD_DELAY0", "0.223"),
    ("PCW_UIPARAM_DDR_BOARD_DELAY1", "0.212"),
    ("PCW_UIPARAM_DDR_BOARD_DELAY2", "0.085"),
    ("PCW_UIPARAM_DDR_BOARD_DELAY3", "0.092"),
    ("PCW_QSPI_PERIPHERAL_ENABLE", "1"),
    ("PCW_QSPI_GRP_SINGLE_SS_ENABLE", "1"),
    ("PCW_QSPI_GRP_FBCLK_ENABLE", "1"),
    ("PCW_ENET0_PERIPHERAL_ENABLE", "1"),
    ("PCW_ENET0_ENET0_IO", "MIO 16 .. 27"),
    ("PCW_ENET0_GRP_MDIO_ENABLE", "1"),
    ("PCW_ENET0_GRP_MDIO_IO", "MIO 52 .. 53"),
    ("PCW_ENET0_RESET_ENABLE", "1"),
    ("PCW_ENET0_RESET_IO", "MIO 9"),
    ("PCW_SD0_PERIPHERAL_ENABLE", "1"),
    ("PCW_SD0_GRP_CD_ENABLE", "1"),
    ("PCW_SD0_GRP_CD_IO", "MIO 47"),
    ("PCW_UART0_PERIPHERAL_ENABLE", "1"),
    ("PCW_UART0_UART0_IO", "MIO 14 .. 15"),
    ("PCW_USB0_PERIPHERAL_ENABLE", "1"),
    ("PCW_USB0_RESET_ENABLE", "1"),
    ("PCW_USB0_RESET_IO", "MIO 46"),
    ("PCW_GPIO_MIO_GPIO_ENABLE", "1"),
    ("PCW_GPIO_MIO_GPIO_IO", "MIO"),
    ("PCW_GPIO_EMIO_GPIO_ENABLE", "0"),
];

/// Hard processor bundles. Their pins are fixed by the PS, only widths matter.
fn ps7_bundles() -> Vec<SignalBundle> {
    let ddram = [
        ("addr", 15),
        ("ba", 3),
        ("cas_n", 1),
        ("ck_n", 1),
        ("ck_p", 1),
        ("cke", 1),
        ("cs_n", 1),
        ("dm", 4),
        ("dq", 32),
        ("dqs_n", 4),
        ("dqs_p", 4),
        ("odt", 1),
        ("ras_n", 1),
        ("reset_n", 1),
        ("we_n", 1),
        ("vrn", 1),
        ("vrp", 1),
    ]
    .iter()
    .fold(SignalBundle::new("ps7_ddram"), |b, (name, width)| {
        b.with_subsignal(name, Pins::Width(*width))
    });

    vec![
        SignalBundle::new("ps7_clk").with_pins(Pins::Width(1)),
        SignalBundle::new("ps7_porb").with_pins(Pins::Width(1)),
        SignalBundle::new("ps7_srstb").with_pins(Pins::Width(1)),
        SignalBundle::new("ps7_mio").with_pins(Pins::Width(54)),
        ddram,
    ]
}

fn loc(pins: &str) -> Pins {
    Pins::Locations(pins.into())
}

/// MicroPhase ANTSDR E200 (Zynq-7020, AD9361 SDR with RGMII Ethernet).
pub fn antsdr_e200() -> BoardDescription {
    let mut bundles = vec![SignalBundle::new("clk40")
        .with_pins(loc("K17"))
        .with_io_standard("LVCMOS18")
        .in_region("X0Y1")
        .with_frequency(40 * MHZ)];
    bundles.extend(ps7_bundles());
    bundles.extend([
        SignalBundle::new("eth_clocks")
            .with_subsignal("tx", loc("D18"))
            .with_subsignal("rx", loc("H16"))
            .with_io_standard("LVCMOS18")
            .in_region("X0Y1"),
        SignalBundle::new("eth")
            .with_subsignal("mdio", loc("A20"))
            .with_subsignal("mdc", loc("B20"))
            .with_subsignal("rx_ctl", loc("G17"))
            .with_subsignal("rx_data", loc("F16 E17 E19 E18"))
            .with_subsignal("tx_ctl", loc("F20"))
            .with_subsignal("tx_data", loc("F19 D20 D19 C20"))
            .with_io_standard("LVCMOS18")
            .in_region("X0Y1"),
        SignalBundle::new("eth_rst")
            .with_pins(loc("B19"))
            .with_io_standard("LVCMOS18")
            .in_region("X0Y1"),
        SignalBundle::new("led")
            .with_pins(loc("V5"))
            .with_io_standard("LVCMOS33")
            .in_region("X1Y0"),
        SignalBundle::new("serial")
            .with_subsignal("tx", loc("U7"))
            .with_subsignal("rx", loc("V7"))
            .with_io_standard("LVCMOS33")
            .in_region("X1Y0"),
    ]);

    BoardDescription {
        name: "antsdr-e200".into(),
        description: "MicroPhase ANTSDR E200 (Zynq-7020, RGMII Ethernet)".into(),
        variants: BTreeMap::from([("z7-20".to_string(), DevicePart::new("xc7z020-clg400-2"))]),
        default_variant: "z7-20".into(),
        toolchains: Toolchain::ALL.to_vec(),
        reference_clock: Some("clk40".into()),
        io_delay_region: Some(socweave_core::ClockRegion::new("X0Y1")),
        bundles,
        ps7_config: Ps7Config::from_pairs(ZYNQ_SDR_PS7),
    }
}

/// krtkl snickerdoodle (Zynq-7010/7020 module; clock, LED and UART are placeholders
/// for carrier-board connections).
pub fn krtkl_snickerdoodle() -> BoardDescription {
    let mut bundles = vec![
        SignalBundle::new("clk100")
            .with_pins(loc("H16"))
            .with_io_standard("LVCMOS33")
            .in_region("X0Y1")
            .with_frequency(100 * MHZ),
        SignalBundle::new("user_led")
            .with_pins(loc("G14"))
            .with_io_standard("LVCMOS33"),
        SignalBundle::new("serial")
            .with_subsignal("tx", loc("D19"))
            .with_subsignal("rx", loc("D20"))
            .with_io_standard("LVCMOS33"),
    ];
    bundles.extend(ps7_bundles());

    BoardDescription {
        name: "krtkl-snickerdoodle".into(),
        description: "krtkl snickerdoodle (Zynq-7010/7020 module)".into(),
        variants: BTreeMap::from([
            ("z7-10".to_string(), DevicePart::new("xc7z010-clg400-1")),
            ("z7-20".to_string(), DevicePart::new("xc7z020-clg400-3")),
        ]),
        default_variant: "z7-10".into(),
        toolchains: Toolchain::ALL.to_vec(),
        reference_clock: Some("clk100".into()),
        io_delay_region: None,
        bundles,
        ps7_config: Ps7Config::from_pairs(ZYNQ_SDR_PS7),
    }
}

/// Resolve a built-in board by name.
pub fn resolve_board(name: &str) -> Option<BoardDescription> {
    match name {
        "antsdr-e200" => Some(antsdr_e200()),
        "krtkl-snickerdoodle" => Some(krtkl_snickerdoodle()),
        _ => None,
    }
}

/// Built-in board names with one-line descriptions.
pub fn builtin_boards() -> Vec<(&'static str, &'static str)> {
    vec![
        ("antsdr-e200", "MicroPhase ANTSDR E200 (Zynq-7020, 40 MHz ref, RGMII)"),
        ("krtkl-snickerdoodle", "krtkl snickerdoodle (Zynq-7010/7020 module)"),
    ]
}
