//! socweave CLI: assemble Zynq-7000 SoC configurations from board descriptions.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use env_logger::{Builder, Env};

use manifest::SocManifest;

#[derive(Parser)]
#[command(name = "socweave", version, about = "SoC assembler for FPGA boards with a hard processor")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new socweave project
    Init {
        /// Project name
        name: String,
    },
    /// Assemble the SoC and emit the handoff
    Build(BuildArgs),
    /// Manage board descriptions
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },
}

/// Options of `socweave build`. Each overrides the matching `soc.toml` key.
#[derive(clap::Args, Default)]
pub struct BuildArgs {
    /// Board name or path to a .board.toml file
    #[arg(long)]
    pub board: Option<String>,
    /// Board variant (e.g., z7-10, z7-20)
    #[arg(long)]
    pub variant: Option<String>,
    /// Toolchain (vivado, symbiflow, yosys+nextpnr, openxc7)
    #[arg(long)]
    pub toolchain: Option<String>,
    /// System clock frequency (e.g., 100e6, 125000000, 62.5MHz)
    #[arg(long)]
    pub sys_clk_freq: Option<String>,
    /// System clock source (hard-processor, external-reference)
    #[arg(long)]
    pub clock_source: Option<String>,
    /// Add an Ethernet MAC
    #[arg(long, conflicts_with = "with_etherbone")]
    pub with_ethernet: bool,
    /// Add an Etherbone bridge
    #[arg(long)]
    pub with_etherbone: bool,
    /// Etherbone IPv4 address
    #[arg(long)]
    pub eth_ip: Option<String>,
    /// Leave out the LED chaser
    #[arg(long)]
    pub no_led_chaser: bool,
    /// Do not integrate the hard processor
    #[arg(long)]
    pub no_hard_processor: bool,
    /// Output format (text, json)
    #[arg(long)]
    pub emit: Option<String>,
    /// Write the output to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum BoardAction {
    /// List built-in and project boards
    List,
    /// Show details of a board
    Describe {
        /// Board name
        name: String,
        /// Output format (default: human-readable, "toml" for TOML)
        #[arg(long)]
        format: Option<String>,
    },
    /// Add a board description template to boards/
    Add {
        /// Board name
        name: String,
    },
    /// Validate a board description
    Validate {
        /// Board name or path to a .board.toml file
        name: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    Builder::from_env(Env::default().default_filter_or(format!("socweave={}", level.as_str())))
        .format_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::Build(args) => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::build::run(&project_dir, manifest.as_ref(), &args)
        }

        Commands::Board { action } => {
            let (_, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            match action {
                BoardAction::List => commands::board::list(&project_dir),
                BoardAction::Describe { name, format } => {
                    commands::board::describe(&name, &project_dir, format.as_deref())
                }
                BoardAction::Add { name } => commands::board::add(&name, &project_dir),
                BoardAction::Validate { name } => commands::board::validate(&name, &project_dir),
            }
        }
    }
}

/// Try to load a manifest from the current directory upward. Returns (None, None) if not found.
fn load_manifest_optional(cwd: &Path) -> anyhow::Result<(Option<SocManifest>, Option<PathBuf>)> {
    match SocManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Full workflow: init -> board add -> build.
    #[test]
    fn init_board_build_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("workflow-test");

        commands::init::create_project(&project_path, "workflow-test").unwrap();
        assert!(project_path.join("soc.toml").is_file());

        commands::board::add("my-e200", &project_path).unwrap();
        commands::board::validate("my-e200", &project_path).unwrap();

        let (manifest, project_dir) = SocManifest::find_and_load(&project_path).unwrap().unwrap();
        assert_eq!(project_dir, project_path);

        let output = project_path.join("out/handoff.json");
        let args = BuildArgs {
            board: Some("my-e200".into()),
            emit: Some("json".into()),
            output: Some(output.clone()),
            ..BuildArgs::default()
        };
        commands::build::run(&project_path, Some(&manifest), &args).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(json["board"], "my-e200");
        assert_eq!(json["clock-source"], "hard-processor");
    }

    #[test]
    fn cli_parses_build_flags() {
        let cli = Cli::try_parse_from([
            "socweave",
            "-vv",
            "build",
            "--board",
            "antsdr-e200",
            "--sys-clk-freq",
            "125e6",
            "--with-etherbone",
            "--eth-ip",
            "10.0.0.2",
            "--no-hard-processor",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.board.as_deref(), Some("antsdr-e200"));
                assert!(args.with_etherbone);
                assert!(args.no_hard_processor);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn ethernet_flags_conflict() {
        let result = Cli::try_parse_from(["socweave", "build", "--with-ethernet", "--with-etherbone"]);
        assert!(result.is_err());
    }
}
