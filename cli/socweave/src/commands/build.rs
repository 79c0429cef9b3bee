//! `socweave build`: resolve board and configuration, assemble, emit the handoff.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use socweave_board::parse::resolve_board;
use socweave_board::Toolchain;
use socweave_core::Hz;
use socweave_soc::{assemble, BuildReport, ClockSource, SocConfig, SocHandoff};

use crate::manifest::SocManifest;
use crate::BuildArgs;

/// Board used when neither the manifest nor `--board` names one.
const DEFAULT_BOARD: &str = "antsdr-e200";

/// Run the build.
pub fn run(project_dir: &Path, manifest: Option<&SocManifest>, args: &BuildArgs) -> Result<()> {
    let board_name = args
        .board
        .as_deref()
        .or(manifest.map(|m| m.soc.board.as_str()))
        .unwrap_or(DEFAULT_BOARD);
    let board = resolve_board(project_dir, board_name)
        .with_context(|| format!("resolving board '{board_name}'"))?;

    let config = resolve_config(manifest, args)?;
    log::info!(
        "building for {} ({} clock, {} Hz)",
        board.name,
        config.clock_source(),
        config.sys_clk_freq
    );

    let handoff = assemble(&board, &config)
        .map_err(|e| anyhow!("{}: {e}", e.class()))
        .with_context(|| format!("assembling SoC for board '{}'", board.name))?;

    let output = render(&handoff, args.emit.as_deref().unwrap_or("text"))?;
    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, &output).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}

/// Manifest settings (or defaults), overridden by command-line flags.
fn resolve_config(manifest: Option<&SocManifest>, args: &BuildArgs) -> Result<SocConfig> {
    let mut config = match manifest {
        Some(m) => m.to_config()?,
        None => SocConfig::default(),
    };

    if args.variant.is_some() {
        config.variant = args.variant.clone();
    }
    if let Some(toolchain) = &args.toolchain {
        config.toolchain = toolchain.parse::<Toolchain>().context("--toolchain")?;
    }
    if let Some(freq) = &args.sys_clk_freq {
        config.sys_clk_freq = parse_frequency(freq).context("--sys-clk-freq")?;
    }
    if let Some(source) = &args.clock_source {
        config.clock_source = Some(
            source
                .parse::<ClockSource>()
                .map_err(|e| anyhow!(e))
                .context("--clock-source")?,
        );
    }
    if args.with_ethernet {
        config.features.with_ethernet = true;
        config.features.with_etherbone = false;
    }
    if args.with_etherbone {
        config.features.with_etherbone = true;
        config.features.with_ethernet = false;
    }
    if let Some(ip) = &args.eth_ip {
        config.eth_ip = ip.clone();
    }
    if args.no_led_chaser {
        config.features.with_led_chaser = false;
    }
    if args.no_hard_processor {
        config.features.hard_processor = false;
        config.clock_source = config
            .clock_source
            .filter(|s| *s != ClockSource::HardProcessor);
    }
    Ok(config)
}

fn render(handoff: &SocHandoff, emit: &str) -> Result<String> {
    match emit {
        "text" => Ok(BuildReport::from_handoff(handoff).to_string()),
        "json" => {
            let mut json = handoff.to_json().context("serializing handoff")?;
            json.push('\n');
            Ok(json)
        }
        other => bail!("unknown emit format '{other}' (expected 'text' or 'json')"),
    }
}

/// Parse a frequency such as `100000000`, `100e6`, `125M` or `62.5MHz` into Hz.
pub(crate) fn parse_frequency(s: &str) -> Result<Hz> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    let (number, mut exponent) = if let Some(n) = lower.strip_suffix("mhz") {
        (n, 6)
    } else if let Some(n) = lower.strip_suffix("khz") {
        (n, 3)
    } else if let Some(n) = lower.strip_suffix("hz") {
        (n, 0)
    } else if let Some(n) = lower.strip_suffix('m') {
        (n, 6)
    } else if let Some(n) = lower.strip_suffix('k') {
        (n, 3)
    } else {
        (lower.as_str(), 0)
    };
    let invalid = || anyhow!("invalid frequency '{s}'");

    let mut mantissa = number.trim();
    if let Some((m, e)) = mantissa.split_once('e') {
        let e: i32 = e.parse().map_err(|_| invalid())?;
        exponent += e;
        mantissa = m;
    }
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    // Value is digits * 10^(exponent - fraction length).
    let digits: u128 = format!("{int_part}{frac_part}").parse().map_err(|_| invalid())?;
    let scale = exponent - frac_part.len() as i32;
    let hz = if scale >= 0 {
        10u128
            .checked_pow(scale as u32)
            .and_then(|p| digits.checked_mul(p))
    } else {
        10u128
            .checked_pow(scale.unsigned_abs())
            .and_then(|p| (digits % p == 0).then(|| digits / p))
    };
    match hz.and_then(|hz| Hz::try_from(hz).ok()) {
        Some(hz) if hz > 0 => Ok(hz),
        _ => bail!("frequency '{s}' is not a positive whole number of Hz"),
    }
}
