// Licensed under the Apache-2.0 license

use crate::PROJECT_ROOT;
use anyhow::{bail, Result};
use std::process::Command;

pub(crate) fn clippy() -> Result<()> {
    println!("Running: cargo clippy");
    let status = Command::new("cargo")
        .current_dir(&*PROJECT_ROOT)
        .args([
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
            "--no-deps",
        ])
        .status()?;

    if !status.success() {
        bail!("cargo clippy failed");
    }
    Ok(())
}
