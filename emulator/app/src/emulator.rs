/*++

Licensed under the Apache-2.0 license.

File Name:

    emulator.rs

Abstract:

    File contains the Emulator struct implementation.

--*/

use anyhow::{bail, Context};
use clap::Parser;
use clap_num::maybe_hex;
use emulator_bus::{BusProbe, Simulator};
use emulator_consts::{is_flash_address, SPI_ADDR_MAX};
use emulator_periph::{FlashStatus, FlashStore, SpiFlash, SpiHost};
use emulator_types::{FlashAddr, FlashWord, Tick};
use log::{info, warn, LevelFilter};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

fn parse_word(s: &str) -> Result<(FlashAddr, FlashWord), String> {
    let (addr, word) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid store entry: {s}. Expected ADDR=VALUE."))?;
    Ok((maybe_hex::<u32>(addr.trim())?, maybe_hex::<u32>(word.trim())?))
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("Invalid log level: {s}. Expected off, error, warn, info, debug or trace."))
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, name = "SPI Flash Emulator")]
pub struct EmulatorArgs {
    /// Raw flash image, four big-endian bytes per word.
    #[arg(long)]
    pub flash_image: Option<PathBuf>,

    /// Flash address the image is loaded at
    #[arg(long, value_parser=maybe_hex::<u32>, default_value_t = 0)]
    pub flash_image_offset: u32,

    /// Extra store entry as ADDR=VALUE. May be repeated.
    #[arg(long = "word", value_parser = parse_word)]
    pub words: Vec<(FlashAddr, FlashWord)>,

    /// Start from an empty store instead of the seed contents.
    #[arg(long, default_value_t = false)]
    pub no_seed: bool,

    /// Address the initiator reads. May be repeated.
    #[arg(long = "read", value_parser=maybe_hex::<u32>, default_values_t = [0x0, 0x4, 0x8])]
    pub reads: Vec<FlashAddr>,

    /// Initiator CLK half period in ticks
    #[arg(long, default_value_t = 4)]
    pub half_period: Tick,

    /// Tick budget for the reads. 0 keeps the bus running until Ctrl-C.
    #[arg(long, default_value_t = 1_000_000)]
    pub max_ticks: Tick,

    #[arg(long, value_parser = parse_level, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// Dump every line change. Implies trace logging.
    #[arg(short, long, default_value_t = false)]
    pub trace: bool,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl EmulatorArgs {
    pub fn log_level(&self) -> LevelFilter {
        if self.trace {
            LevelFilter::Trace
        } else {
            self.log_level
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadResult {
    pub address: FlashAddr,
    pub word: FlashWord,
    pub expected: FlashWord,
}

impl ReadResult {
    pub fn matches(&self) -> bool {
        self.word == self.expected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmulatorReport {
    pub ticks: Tick,
    pub transactions: u64,
    pub completed_reads: u64,
    pub aborted: u64,
    pub ignored: u64,
    pub reads: Vec<ReadResult>,
}

impl EmulatorReport {
    pub fn mismatches(&self) -> usize {
        self.reads.iter().filter(|r| !r.matches()).count()
    }
}

impl fmt::Display for EmulatorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for read in self.reads.iter() {
            writeln!(
                f,
                "0x{:06x}: 0x{:08x}{}",
                read.address,
                read.word,
                if read.matches() { "" } else { " (mismatch)" }
            )?;
        }
        writeln!(f, "Total SPI transactions observed: {}", self.transactions)?;
        write!(
            f,
            "Completed reads: {}, aborted: {}, ignored: {}, ticks: {}",
            self.completed_reads, self.aborted, self.ignored, self.ticks
        )
    }
}

/// One SPI link: a flash peer and an initiator issuing the configured reads.
pub struct Emulator {
    sim: Simulator,
    host: Rc<SpiHost>,
    status: Rc<FlashStatus>,
    store: Rc<RefCell<FlashStore>>,
    reads: Vec<FlashAddr>,
    max_ticks: Tick,
}

impl Emulator {
    /// Create an Emulator from command line arguments
    pub fn from_args(cli: &EmulatorArgs) -> anyhow::Result<Self> {
        let mut store = if cli.no_seed {
            FlashStore::new()
        } else {
            FlashStore::with_seed()
        };

        if let Some(path) = cli.flash_image.as_ref() {
            let image = std::fs::read(path)
                .with_context(|| format!("failed to read flash image {}", path.display()))?;
            let count = store
                .load_image(cli.flash_image_offset, &image)
                .with_context(|| format!("failed to load flash image {}", path.display()))?;
            info!(
                "Loaded {count} words from {} at 0x{:08x}",
                path.display(),
                cli.flash_image_offset
            );
        }

        for &(addr, word) in cli.words.iter() {
            store.store(addr, word)?;
        }

        Self::new(store, cli.reads.clone(), cli.half_period, cli.max_ticks)
    }

    pub fn new(
        store: FlashStore,
        reads: Vec<FlashAddr>,
        half_period: Tick,
        max_ticks: Tick,
    ) -> anyhow::Result<Self> {
        for &addr in reads.iter() {
            if !is_flash_address(addr) {
                bail!("read address 0x{addr:08x} is outside the SPI flash window");
            }
            if addr > SPI_ADDR_MAX {
                bail!("read address 0x{addr:08x} does not fit in a 24-bit READ");
            }
        }

        let mut sim = Simulator::new();
        let (host_pins, flash_pins) = sim.split_bus()?;
        let flash = SpiFlash::new(flash_pins, store);
        let status = flash.status();
        let store = flash.store();
        sim.spawn(flash.run())?;
        let host = Rc::new(SpiHost::new(host_pins, half_period)?);

        Ok(Self {
            sim,
            host,
            status,
            store,
            reads,
            max_ticks,
        })
    }

    pub fn status(&self) -> Rc<FlashStatus> {
        self.status.clone()
    }

    pub fn store(&self) -> Rc<RefCell<FlashStore>> {
        self.store.clone()
    }

    pub fn probe(&self) -> BusProbe {
        self.sim.probe()
    }

    /// Issue the configured reads.
    ///
    /// With a zero tick budget the bus keeps running after the reads until
    /// `running` is cleared.
    pub fn run(&mut self, running: &AtomicBool) -> anyhow::Result<EmulatorReport> {
        let results = Rc::new(RefCell::new(Vec::new()));
        let script = {
            let host = self.host.clone();
            let store = self.store.clone();
            let results = results.clone();
            let reads = self.reads.clone();
            async move {
                for address in reads {
                    let word = host.read_word(address).await;
                    let expected = store.borrow().read(address);
                    if word != expected {
                        warn!(
                            "Read 0x{word:08x} from 0x{address:06x}, store holds 0x{expected:08x}"
                        );
                    }
                    results.borrow_mut().push(ReadResult {
                        address,
                        word,
                        expected,
                    });
                }
            }
        };

        let start = self.sim.now();
        let handle = self.sim.spawn_with_handle(script)?;
        if self.max_ticks == 0 {
            self.sim.run_while(|_| running.load(Ordering::Relaxed));
            drop(handle);
        } else {
            self.sim
                .run_until(handle, self.max_ticks)
                .context("initiator did not finish its reads")?;
        }

        Ok(EmulatorReport {
            ticks: self.sim.now() - start,
            transactions: self.status.transactions(),
            completed_reads: self.status.reads(),
            aborted: self.status.aborted(),
            ignored: self.status.ignored(),
            reads: results.take(),
        })
    }
}
