//! `soc.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use socweave_board::Toolchain;
use socweave_clock::{CalibrationSource, PrimitiveKind};
use socweave_core::Hz;
use socweave_memory::RegionRequest;
use socweave_soc::{ClockSource, SocConfig};

/// File name searched for by [`SocManifest::find_and_load`].
pub const MANIFEST_FILE: &str = "soc.toml";

/// The top-level manifest of a socweave project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SocManifest {
    /// Project and board selection (required).
    pub soc: SocSection,
    #[serde(default)]
    pub clock: Option<ClockSection>,
    #[serde(default)]
    pub features: Option<FeaturesSection>,
    #[serde(default)]
    pub memory: Option<MemorySection>,
    #[serde(default)]
    pub ethernet: Option<EthernetSection>,
}

/// `[soc]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SocSection {
    /// Project name (required).
    pub name: String,
    /// Built-in board name or project board (`boards/<name>.board.toml`).
    pub board: String,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub toolchain: Option<String>,
}

/// `[clock]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClockSection {
    /// System clock frequency in Hz.
    #[serde(default)]
    pub sys_clk_freq: Option<Hz>,
    /// "hard-processor" or "external-reference".
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub calibration_source: Option<CalibrationSource>,
    #[serde(default)]
    pub primitive: Option<PrimitiveKind>,
}

/// `[features]` section. Unset flags keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeaturesSection {
    #[serde(default)]
    pub with_ethernet: Option<bool>,
    #[serde(default)]
    pub with_etherbone: Option<bool>,
    #[serde(default)]
    pub with_led_chaser: Option<bool>,
    #[serde(default)]
    pub hard_processor: Option<bool>,
}

/// `[memory]` section, sizes in bytes. Omitted sizes use the full window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemorySection {
    #[serde(default)]
    pub ram_size: Option<u64>,
    #[serde(default)]
    pub rom_size: Option<u64>,
    #[serde(default)]
    pub flash_size: Option<u64>,
    /// Leave out the ROM region.
    #[serde(default)]
    pub no_rom: bool,
    /// Leave out the flash region.
    #[serde(default)]
    pub no_flash: bool,
}

/// `[ethernet]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EthernetSection {
    #[serde(default)]
    pub ip: Option<String>,
}

impl SocManifest {
    /// Search upward from `start_dir` for a `soc.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: SocManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing soc.toml")
    }

    /// Build the SoC configuration described by this manifest.
    pub fn to_config(&self) -> Result<SocConfig> {
        let mut config = SocConfig {
            variant: self.soc.variant.clone(),
            ..SocConfig::default()
        };
        if let Some(toolchain) = &self.soc.toolchain {
            config.toolchain = toolchain
                .parse::<Toolchain>()
                .context("soc.toolchain")?;
        }

        if let Some(clock) = &self.clock {
            if let Some(hz) = clock.sys_clk_freq {
                config.sys_clk_freq = hz;
            }
            if let Some(source) = &clock.source {
                config.clock_source = Some(
                    source
                        .parse::<ClockSource>()
                        .map_err(|e| anyhow!(e))
                        .context("clock.source")?,
                );
            }
            config.calibration_source = clock.calibration_source;
            if let Some(primitive) = clock.primitive {
                config.primitive = primitive;
            }
        }

        if let Some(features) = &self.features {
            let f = &mut config.features;
            f.with_ethernet = features.with_ethernet.unwrap_or(f.with_ethernet);
            f.with_etherbone = features.with_etherbone.unwrap_or(f.with_etherbone);
            f.with_led_chaser = features.with_led_chaser.unwrap_or(f.with_led_chaser);
            f.hard_processor = features.hard_processor.unwrap_or(f.hard_processor);
        }

        if let Some(memory) = &self.memory {
            let full = RegionRequest::full(&socweave_memory::HardProcessorMap::zynq7000());
            config.memory = Some(RegionRequest {
                ram_size: memory.ram_size.unwrap_or(full.ram_size),
                rom_size: if memory.no_rom {
                    None
                } else {
                    memory.rom_size.or(full.rom_size)
                },
                flash_size: if memory.no_flash {
                    None
                } else {
                    memory.flash_size.or(full.flash_size)
                },
            });
        }

        if let Some(ip) = self.ethernet.as_ref().and_then(|e| e.ip.clone()) {
            config.eth_ip = ip;
        }
        Ok(config)
    }

    /// Generate the default template for `socweave init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[soc]
name = "{name}"
board = "antsdr-e200"
toolchain = "vivado"

[clock]
sys-clk-freq = 100000000

[features]
hard-processor = true
with-led-chaser = true
with-ethernet = false
with-etherbone = false

[ethernet]
ip = "192.168.1.50"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socweave_memory::MIB;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[soc]
name = "radio"
board = "antsdr-e200"
variant = "z7-20"
toolchain = "vivado"

[clock]
sys-clk-freq = 125000000
source = "external-reference"
calibration-source = "from-system-clock"
primitive = "mmcme2"

[features]
hard-processor = false
with-etherbone = true

[memory]
ram-size = 268435456
no-flash = true

[ethernet]
ip = "10.0.0.2"
"#;
        let manifest = SocManifest::from_str(toml_str).unwrap();
        assert_eq!(manifest.soc.name, "radio");
        let config = manifest.to_config().unwrap();
        assert_eq!(config.variant.as_deref(), Some("z7-20"));
        assert_eq!(config.sys_clk_freq, 125_000_000);
        assert_eq!(config.clock_source(), ClockSource::ExternalReference);
        assert_eq!(config.calibration_source(), CalibrationSource::FromSystemClock);
        assert_eq!(config.primitive, PrimitiveKind::Mmcme2);
        assert!(!config.features.hard_processor);
        assert!(config.features.with_etherbone);
        assert!(config.features.with_led_chaser);
        assert_eq!(config.eth_ip, "10.0.0.2");
        let memory = config.memory.unwrap();
        assert_eq!(memory.ram_size, 256 * MIB);
        assert!(memory.rom_size.is_some());
        assert!(memory.flash_size.is_none());
    }

    #[test]
    fn parse_minimal_manifest() {
        let toml_str = r#"
[soc]
name = "minimal"
board = "krtkl-snickerdoodle"
"#;
        let manifest = SocManifest::from_str(toml_str).unwrap();
        let config = manifest.to_config().unwrap();
        assert_eq!(config, SocConfig::default());
    }

    #[test]
    fn missing_board_is_an_error() {
        assert!(SocManifest::from_str("[soc]\nname = \"x\"\n").is_err());
    }

    #[test]
    fn unknown_toolchain_names_the_key() {
        let manifest = SocManifest::from_str(
            "[soc]\nname = \"x\"\nboard = \"antsdr-e200\"\ntoolchain = \"quartus\"\n",
        )
        .unwrap();
        let err = manifest.to_config().unwrap_err();
        assert!(format!("{err:#}").contains("soc.toolchain"));
    }

    #[test]
    fn template_round_trips() {
        let manifest = SocManifest::from_str(&SocManifest::template("demo")).unwrap();
        assert_eq!(manifest.soc.name, "demo");
        assert_eq!(manifest.soc.board, "antsdr-e200");
        assert!(manifest.to_config().is_ok());
    }

    #[test]
    fn find_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), SocManifest::template("up")).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found) = SocManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.soc.name, "up");
        assert_eq!(found, dir.path());
    }
}
