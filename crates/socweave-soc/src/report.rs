//! Human-readable build report.

use std::fmt;

use socweave_core::{format_hz, Constraint, Hz};

use crate::handoff::SocHandoff;

/// One synthesis block as shown in the report.
#[derive(Debug, Clone)]
pub struct BlockSummary {
    pub name: String,
    pub primitive: String,
    pub input: Option<(String, Hz)>,
    pub outputs: Vec<(String, Hz)>,
    /// (input divider, feedback multiplier, VCO)
    pub dividers: Option<(u32, u32, Hz)>,
}

/// Summary of a finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub ident: String,
    pub part: String,
    pub toolchain: String,
    pub clock_source: String,
    pub domains: Vec<String>,
    pub blocks: Vec<BlockSummary>,
    pub calibration_controllers: Vec<String>,
    pub false_paths: Vec<String>,
    pub regions: Vec<String>,
    pub peripherals: Vec<String>,
    /// Frequency written into the PS7 configuration, if integrated.
    pub ps7_fabric_clock: Option<String>,
    pub fingerprint: String,
}

impl BuildReport {
    pub fn from_handoff(handoff: &SocHandoff) -> Self {
        let blocks = handoff
            .blocks()
            .iter()
            .map(|b| BlockSummary {
                name: b.name().to_string(),
                primitive: b.limits().kind.to_string(),
                input: b.input().map(|i| (i.signal.to_string(), i.frequency)),
                outputs: b
                    .outputs()
                    .iter()
                    .map(|o| (o.domain.clone(), o.frequency))
                    .collect(),
                dividers: b
                    .config()
                    .map(|c| (c.input_divider, c.feedback_multiplier, c.vco)),
            })
            .collect();

        let false_paths = handoff
            .constraints()
            .iter()
            .filter(|c| matches!(c, Constraint::FalsePath { .. }))
            .map(|c| c.to_string())
            .collect();

        Self {
            ident: handoff.ident().to_string(),
            part: handoff.part().to_string(),
            toolchain: handoff.toolchain().to_string(),
            clock_source: handoff.clock_source().to_string(),
            domains: handoff
                .domains()
                .iter()
                .map(|d| format!("{d}, period {} ps", d.period_ps()))
                .collect(),
            blocks,
            calibration_controllers: handoff
                .calibration()
                .map(|c| {
                    c.controllers
                        .iter()
                        .map(|ctrl| format!("{} [{}]", ctrl.name, ctrl.consumers.join(", ")))
                        .collect()
                })
                .unwrap_or_default(),
            false_paths,
            regions: handoff.regions().iter().map(|r| r.to_string()).collect(),
            peripherals: handoff.peripherals().iter().map(|p| p.to_string()).collect(),
            ps7_fabric_clock: handoff
                .ps7_config()
                .and_then(|c| c.get(socweave_board::ps7::FPGA0_FREQ_KEY))
                .map(str::to_string),
            fingerprint: handoff.fingerprint(),
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.ident)?;
        writeln!(f, "Part: {} ({})", self.part, self.toolchain)?;
        writeln!(f, "Clock source: {}", self.clock_source)?;
        writeln!(f)?;

        writeln!(f, "--- Clock domains ({}) ---", self.domains.len())?;
        for d in &self.domains {
            writeln!(f, "  {d}")?;
        }

        if !self.blocks.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Synthesis blocks ({}) ---", self.blocks.len())?;
            for b in &self.blocks {
                write!(f, "  {} {}", b.name, b.primitive)?;
                if let Some((signal, hz)) = &b.input {
                    write!(f, " <- {signal} @ {} MHz", format_hz(*hz))?;
                }
                if let Some((d, m, vco)) = b.dividers {
                    write!(f, " (D={d} M={m} VCO={} MHz)", format_hz(vco))?;
                }
                writeln!(f)?;
                for (domain, hz) in &b.outputs {
                    writeln!(f, "    -> {domain} @ {} MHz", format_hz(*hz))?;
                }
            }
        }

        if !self.calibration_controllers.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "--- Calibration controllers ({}) ---",
                self.calibration_controllers.len()
            )?;
            for c in &self.calibration_controllers {
                writeln!(f, "  {c}")?;
            }
        }

        if !self.false_paths.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- False paths ---")?;
            for p in &self.false_paths {
                writeln!(f, "  {p}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- Memory regions ({}) ---", self.regions.len())?;
        for r in &self.regions {
            writeln!(f, "  {r}")?;
        }

        writeln!(f)?;
        writeln!(f, "--- Peripherals ({}) ---", self.peripherals.len())?;
        for p in &self.peripherals {
            writeln!(f, "  {p}")?;
        }

        if let Some(mhz) = &self.ps7_fabric_clock {
            writeln!(f)?;
            writeln!(f, "PS7 fabric clock 0: {mhz} MHz")?;
        }
        writeln!(f)?;
        writeln!(f, "Fingerprint: {}", self.fingerprint)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use crate::config::SocConfig;
    use socweave_board::builtin;

    #[test]
    fn report_for_hard_processor_build() {
        let handoff = assemble(&builtin::antsdr_e200(), &SocConfig::default()).unwrap();
        let report = BuildReport::from_handoff(&handoff);
        let output = format!("{report}");
        assert!(output.contains("socweave SoC on antsdr-e200"));
        assert!(output.contains("Clock source: hard-processor"));
        assert!(output.contains("idelayctrl_X0Y1"));
        assert!(output.contains("sram: 0x00100000"));
        assert!(output.contains("PS7 fabric clock 0: 100 MHz"));
    }

    #[test]
    fn report_for_external_reference_build() {
        let mut config = SocConfig::default();
        config.features.hard_processor = false;
        config.sys_clk_freq = 125_000_000;
        let handoff = assemble(&builtin::antsdr_e200(), &config).unwrap();
        let output = BuildReport::from_handoff(&handoff).to_string();
        assert!(output.contains("pll0 PLLE2_ADV <- clk40 @ 40 MHz"));
        assert!(output.contains("-> sys @ 125 MHz"));
        assert!(output.contains("sys: 125 MHz on pll0.clkout0"));
        assert!(output.contains("period 8000 ps"));
        assert!(output.contains("false-path"));
        assert!(output.contains("Memory regions (0)"));
        assert!(!output.contains("PS7 fabric clock"));
    }
}
