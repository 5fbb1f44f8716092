// Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

mod cargo_lock;
mod clippy;
mod format;
mod header;
mod precheckin;

pub(crate) static PROJECT_ROOT: LazyLock<PathBuf> = LazyLock::new(|| {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
});

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Xtask {
    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the SPI flash emulator, passing any further arguments through
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run clippy on all targets
    Clippy,
    /// Check that Cargo.lock doesn't need to be updated
    CargoLock,
    /// Check source code format
    Format,
    /// Check source code license headers
    HeaderCheck,
    /// Add license headers to source code files that are missing them
    HeaderFix,
    /// Run all checks that CI will run
    Precheckin,
    /// Run the unit, integration and command line tests
    Test,
}

fn main() {
    let cli = Xtask::parse();
    let result = match &cli.xtask {
        Commands::Run { args } => test::run_emulator(args).map(|_| ()),
        Commands::Clippy => clippy::clippy(),
        Commands::CargoLock => cargo_lock::cargo_lock(),
        Commands::Format => format::format(),
        Commands::HeaderCheck => header::check(),
        Commands::HeaderFix => header::fix(),
        Commands::Precheckin => precheckin::precheckin(),
        Commands::Test => test::test(),
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
}
