//! Clock domains and clock regions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::signal::{ResetExpr, SignalRef};

/// Frequency in hertz. Integer so that divider arithmetic stays exact.
pub type Hz = u64;

/// One megahertz.
pub const MHZ: Hz = 1_000_000;

/// Render a frequency in MHz, dropping the fraction when it is zero
/// (`100000000` -> `"100"`, `62500000` -> `"62.5"`).
pub fn format_hz(hz: Hz) -> String {
    let whole = hz / MHZ;
    let frac = hz % MHZ;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:06}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// An independent FPGA clock region (e.g. `X0Y1`).
///
/// I/O delay calibration is per clock region: every region that contains
/// delay primitives needs exactly one calibration controller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClockRegion(String);

impl ClockRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClockRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named clock plus its reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClockDomain {
    /// Domain name, unique within a build (e.g. "sys", "idelay").
    pub name: String,
    /// Net carrying the clock.
    pub clock: SignalRef,
    /// Nominal frequency. Informational; used for period constraints.
    pub frequency: Hz,
    /// Reset driving the domain.
    pub reset: ResetExpr,
}

impl ClockDomain {
    pub fn new(name: impl Into<String>, clock: SignalRef, frequency: Hz, reset: ResetExpr) -> Self {
        Self {
            name: name.into(),
            clock,
            frequency,
            reset,
        }
    }

    /// Clock period in picoseconds, rounded to nearest.
    pub fn period_ps(&self) -> u64 {
        if self.frequency == 0 {
            return 0;
        }
        (1_000_000_000_000 + self.frequency / 2) / self.frequency
    }
}

impl fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} MHz on {} (reset {})",
            self.name,
            format_hz(self.frequency),
            self.clock,
            self.reset
        )
    }
}
