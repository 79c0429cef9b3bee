//! `socweave board`: listing, description, validation and scaffolding of boards.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use socweave_board::builtin::builtin_boards;
use socweave_board::parse::{
    board_to_toml, discover_boards, generate_template, resolve_board, validate_board,
};
use socweave_board::BoardDescription;
use socweave_core::format_hz;

/// List built-in boards and the project's `boards/` directory.
pub fn list(project_dir: &Path) -> Result<()> {
    println!("Built-in boards:");
    println!();
    for (name, description) in builtin_boards() {
        println!("  {name:<25} {description}");
    }

    let project = discover_boards(project_dir)?;
    if !project.is_empty() {
        println!();
        println!("Project boards:");
        println!();
        for (name, path) in &project {
            println!("  {name:<25} {}", path.display());
        }
    }
    println!();
    println!("Use 'socweave board describe <name>' for details.");
    Ok(())
}

/// Describe a board in detail.
pub fn describe(name: &str, project_dir: &Path, format: Option<&str>) -> Result<()> {
    let board = resolve_board(project_dir, name)
        .with_context(|| format!("resolving board '{name}' (see 'socweave board list')"))?;

    match format {
        Some("toml") => print!("{}", board_to_toml(&board)?),
        Some(other) => bail!("unknown format '{other}' (expected 'toml')"),
        None => print!("{}", describe_text(&board)),
    }
    Ok(())
}

fn describe_text(board: &BoardDescription) -> String {
    let mut out = format!("=== Board: {} ===\n", board.name);
    if !board.description.is_empty() {
        out.push_str(&format!("{}\n", board.description));
    }
    out.push('\n');

    out.push_str("--- Variants ---\n");
    for (variant, part) in &board.variants {
        let marker = if *variant == board.default_variant { " (default)" } else { "" };
        out.push_str(&format!("  {variant:<10} {part}{marker}\n"));
    }
    let toolchains: Vec<&str> = board.toolchains.iter().map(|t| t.as_str()).collect();
    out.push_str(&format!("Toolchains: {}\n", toolchains.join(", ")));
    if let Some(reference) = &board.reference_clock {
        match board.reference_frequency() {
            Some(hz) => out.push_str(&format!("Reference clock: {reference} @ {} MHz\n", format_hz(hz))),
            None => out.push_str(&format!("Reference clock: {reference}\n")),
        }
    }
    if let Some(region) = &board.io_delay_region {
        out.push_str(&format!("I/O delay region: {region}\n"));
    }
    out.push('\n');

    out.push_str(&format!("--- Bundles ({}) ---\n", board.bundles.len()));
    for bundle in &board.bundles {
        let region = bundle
            .clock_region
            .as_ref()
            .map(|r| format!(" [{r}]"))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {:<20} {} pin(s){region}\n",
            bundle.qualified_name(),
            bundle.width()
        ));
    }

    if !board.ps7_config.is_empty() {
        out.push('\n');
        out.push_str(&format!("--- PS7 configuration ({}) ---\n", board.ps7_config.len()));
        for (key, value) in board.ps7_config.iter() {
            out.push_str(&format!("  {key} = {value}\n"));
        }
    }
    out
}

/// Validate a board description, printing every issue found.
pub fn validate(name: &str, project_dir: &Path) -> Result<()> {
    let board = resolve_board(project_dir, name).with_context(|| format!("loading board '{name}'"))?;

    match validate_board(&board) {
        Ok(()) => {
            println!("Board '{}' is valid.", board.name);
            Ok(())
        }
        Err(issues) => {
            let errors = issues.iter().filter(|i| i.severity == "error").count();
            for issue in &issues {
                println!("  {}: {}", issue.severity, issue.message);
            }
            if errors > 0 {
                bail!("board '{}' has {errors} error(s)", board.name);
            }
            println!("Board '{}' is valid ({} warning(s)).", board.name, issues.len());
            Ok(())
        }
    }
}

/// Write a board template to `boards/<name>.board.toml`.
pub fn add(name: &str, project_dir: &Path) -> Result<()> {
    let boards_dir = project_dir.join("boards");
    let path = boards_dir.join(format!("{name}.board.toml"));
    if path.exists() {
        bail!("board file '{}' already exists", path.display());
    }
    fs::create_dir_all(&boards_dir).context("creating boards/ directory")?;
    let template = generate_template(name)?;
    fs::write(&path, template).with_context(|| format!("writing {}", path.display()))?;

    println!("Created {}", path.display());
    println!("Edit the bundles and variants, then run 'socweave board validate {name}'.");
    Ok(())
}
