//! `socweave init`: project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{SocManifest, MANIFEST_FILE};

/// Create a new socweave project in the directory `name`, relative to cwd.
pub fn run(name: &str) -> Result<()> {
    let project_dir = Path::new(name);
    create_project(project_dir, name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir.join("boards")).context("creating boards/ directory")?;
    fs::create_dir_all(project_dir.join("out")).context("creating out/ directory")?;

    fs::write(project_dir.join(MANIFEST_FILE), SocManifest::template(name))
        .context("writing soc.toml")?;
    fs::write(project_dir.join(".gitignore"), "out/\n").context("writing .gitignore")?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILE}");
    println!("  {name}/boards/");
    println!("  {name}/out/");
    println!("  {name}/.gitignore");

    Ok(())
}
