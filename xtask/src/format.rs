// Licensed under the Apache-2.0 license

use crate::PROJECT_ROOT;
use anyhow::{bail, Result};
use std::process::Command;

pub(crate) fn format() -> Result<()> {
    println!("Running: cargo fmt --check");
    let status = Command::new("cargo")
        .current_dir(&*PROJECT_ROOT)
        .args(["fmt", "--all", "--check"])
        .status()?;

    if !status.success() {
        bail!("cargo fmt found unformatted files; run \"cargo fmt --all\" from the repo root");
    }
    Ok(())
}
