//! Pass-through configuration of the hard processor subsystem.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key holding the fabric clock 0 frequency in MHz.
pub const FPGA0_FREQ_KEY: &str = "PCW_FPGA0_PERIPHERAL_FREQMHZ";

/// PS7 PLL, DDR and MIO-routing settings as opaque key/value pairs.
///
/// Values are not interpreted. A board builds one at construction time and it
/// is never mutated afterwards; overrides produce a new map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ps7Config(BTreeMap<String, String>);

impl Ps7Config {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// A copy of this configuration with `overrides` applied on top.
    pub fn merged<'a>(&self, overrides: impl IntoIterator<Item = (&'a str, String)>) -> Self {
        let mut map = self.0.clone();
        for (k, v) in overrides {
            map.insert(k.to_string(), v);
        }
        Self(map)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
