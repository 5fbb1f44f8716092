/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entrypoint for the SPI Flash Emulator.

--*/

use anyhow::{bail, Context};
use clap::Parser;
use emulator::{Emulator, EmulatorArgs};
use simple_logger::SimpleLogger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let cli = EmulatorArgs::parse();
    let _ = SimpleLogger::new().with_level(cli.log_level()).init();

    let running = Arc::new(AtomicBool::new(true));
    if cli.max_ticks == 0 {
        // stop the bus cleanly on Ctrl-C so the report is still printed.
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::Relaxed))
            .context("failed to install Ctrl-C handler")?;
    }

    let mut emulator = Emulator::from_args(&cli)?;
    let report = emulator.run(&running)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    if report.mismatches() > 0 {
        bail!("{} reads did not match the flash store", report.mismatches());
    }
    Ok(())
}
