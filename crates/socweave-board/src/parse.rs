//! TOML parsing, serialization, validation, and discovery for board descriptions.
//!
//! Project boards are stored as `.board.toml` files in the `boards/` directory
//! of a socweave project.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::board::BoardDescription;
use crate::builtin;
use crate::error::{BoardError, Result};

/// A validation issue found in a board description.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Load a board from a `.board.toml` file.
pub fn load_board_toml(path: &Path) -> Result<BoardDescription> {
    if !path.exists() {
        return Err(BoardError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_board_toml(&content)
}

/// Parse a board from a TOML string.
pub fn parse_board_toml(toml_str: &str) -> Result<BoardDescription> {
    let board: BoardDescription = toml::from_str(toml_str)?;
    Ok(board)
}

/// Serialize a board to pretty TOML.
pub fn board_to_toml(board: &BoardDescription) -> Result<String> {
    let toml_str = toml::to_string_pretty(board)?;
    Ok(toml_str)
}

/// Validate a board description for structural correctness.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
pub fn validate_board(board: &BoardDescription) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut error = |message: String| {
        issues.push(ValidationIssue {
            severity: "error",
            message,
        })
    };

    // 1. Default variant exists and every part has a readable speedgrade
    if !board.variants.contains_key(&board.default_variant) {
        error(format!(
            "default variant '{}' is not listed in variants",
            board.default_variant
        ));
    }
    for (variant, part) in &board.variants {
        if let Err(e) = part.speedgrade() {
            error(format!("variant '{variant}': {e}"));
        }
    }

    // 2. No duplicate (name, index) pairs
    let mut seen = BTreeSet::new();
    for bundle in &board.bundles {
        if !seen.insert((bundle.name.as_str(), bundle.index)) {
            error(format!("duplicate bundle '{}'", bundle.qualified_name()));
        }
    }

    // 3. Every bundle has at least one pin
    for bundle in &board.bundles {
        if bundle.width() == 0 {
            error(format!("bundle '{}' has no pins", bundle.qualified_name()));
        }
    }

    // 4. Reference clock names an existing bundle with a frequency
    if let Some(name) = &board.reference_clock {
        match board.request(name) {
            Ok(b) if b.frequency.is_none() => {
                error(format!("reference clock '{name}' has no frequency"))
            }
            Ok(_) => {}
            Err(_) => error(format!("reference clock '{name}' is not a bundle")),
        }
    }

    // 5. At least one toolchain
    if board.toolchains.is_empty() {
        error("board lists no toolchains".into());
    }

    let has_ps7_bundles = board.bundles.iter().any(|b| b.name.starts_with("ps7_"));

    // 6. PS7 bundles need a PS7 configuration
    if has_ps7_bundles && board.ps7_config.is_empty() {
        error("board has ps7_* bundles but an empty ps7-config".into());
    }

    // 7. PS7 bundles on a part without a hard processor
    if has_ps7_bundles {
        for (variant, part) in &board.variants {
            if !part.has_hard_processor() {
                issues.push(ValidationIssue {
                    severity: "warning",
                    message: format!(
                        "variant '{variant}' ({part}) has no hard processor but the board declares ps7_* bundles"
                    ),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Generate a template `.board.toml` for a new board.
///
/// Seeds from the ANTSDR E200 with the given name.
pub fn generate_template(name: &str) -> Result<String> {
    let mut board = builtin::antsdr_e200();
    board.name = name.into();
    board.description = String::new();
    board_to_toml(&board)
}

/// Discover all `.board.toml` files in a project's `boards/` directory.
///
/// Returns a list of (board_name, file_path) pairs.
pub fn discover_boards(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let boards_dir = project_dir.join("boards");
    if !boards_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut boards = Vec::new();
    for entry in std::fs::read_dir(&boards_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".board.toml"))
            .map(str::to_string);
        if let Some(name) = name {
            boards.push((name, path));
        }
    }
    boards.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(boards)
}

/// Resolve a board by built-in name, project board name, or file path.
pub fn resolve_board(project_dir: &Path, name: &str) -> Result<BoardDescription> {
    if let Some(board) = builtin::resolve_board(name) {
        return Ok(board);
    }
    let as_path = Path::new(name);
    if name.ends_with(".toml") {
        return load_board_toml(as_path);
    }
    for (found, path) in discover_boards(project_dir)? {
        if found == name {
            return load_board_toml(&path);
        }
    }
    Err(BoardError::UnknownBoard { name: name.into() })
}
