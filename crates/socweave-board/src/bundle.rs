//! Signal bundles: named groups of physical pins.

use serde::{Deserialize, Serialize};

use socweave_core::{ClockRegion, Hz};

/// Pin assignment of a signal or subsignal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pins {
    /// Pins fixed by the hard processor; only the width is known.
    Width(u32),
    /// Space-separated package pin locations (e.g. `"F16 E17 E19 E18"`).
    Locations(String),
}

impl Pins {
    /// Number of pins.
    pub fn width(&self) -> u32 {
        match self {
            Pins::Width(n) => *n,
            Pins::Locations(s) => s.split_whitespace().count() as u32,
        }
    }

    /// Package locations, empty for hard-processor pins.
    pub fn locations(&self) -> Vec<&str> {
        match self {
            Pins::Width(_) => Vec::new(),
            Pins::Locations(s) => s.split_whitespace().collect(),
        }
    }
}

/// A named member of a bundle (e.g. `tx` of `serial`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Subsignal {
    pub name: String,
    pub pins: Pins,
}

/// A requestable group of pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignalBundle {
    /// Bundle name (e.g. "eth", "clk40", "ps7_ddram").
    pub name: String,
    /// Instance index; boards may carry several bundles with one name.
    #[serde(default)]
    pub index: u32,
    /// Pins of a single-signal bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pins: Option<Pins>,
    /// Members of a multi-signal bundle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsignals: Vec<Subsignal>,
    /// Electrical standard (e.g. "LVCMOS18").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_standard: Option<String>,
    /// Clock region holding the bundle's I/O.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_region: Option<ClockRegion>,
    /// Oscillator frequency, for clock inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Hz>,
}

impl SignalBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: 0,
            pins: None,
            subsignals: Vec::new(),
            io_standard: None,
            clock_region: None,
            frequency: None,
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn with_pins(mut self, pins: Pins) -> Self {
        self.pins = Some(pins);
        self
    }

    pub fn with_subsignal(mut self, name: &str, pins: Pins) -> Self {
        self.subsignals.push(Subsignal {
            name: name.into(),
            pins,
        });
        self
    }

    pub fn with_io_standard(mut self, standard: &str) -> Self {
        self.io_standard = Some(standard.into());
        self
    }

    pub fn in_region(mut self, region: &str) -> Self {
        self.clock_region = Some(ClockRegion::new(region));
        self
    }

    pub fn with_frequency(mut self, hz: Hz) -> Self {
        self.frequency = Some(hz);
        self
    }

    /// Total pin count over the bundle and its subsignals.
    pub fn width(&self) -> u32 {
        self.pins.as_ref().map(Pins::width).unwrap_or(0)
            + self.subsignals.iter().map(|s| s.pins.width()).sum::<u32>()
    }

    pub fn subsignal(&self, name: &str) -> Option<&Subsignal> {
        self.subsignals.iter().find(|s| s.name == name)
    }

    /// Display name in `name:index` form.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.name, self.index)
    }
}
