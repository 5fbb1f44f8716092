/*++

Licensed under the Apache-2.0 license.

File Name:

    spi_flash.rs

Abstract:

    File contains SPI flash emulation: a bit-level peer answering single
    word READ commands from the flash store.

--*/

use crate::flash_store::FlashStore;
use bitfield::Bit;
use emulator_bus::{BusMonitor, Deselected, PeripheralPins};
use emulator_consts::FLASH_WORD_BITS;
use emulator_types::{FlashAddr, FlashWord, Level, SpiSignal};
use log::{debug, info, trace, warn};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FlashCommand {
    /// READ(addr24), answered with one 32-bit big-endian word.
    Read = 0x03,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FlashState {
    #[default]
    Idle,
    Command,
    Address,
    Response,
}

/// How a transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// All 32 response bits were driven.
    Read { address: FlashAddr, word: FlashWord },
    /// The opcode is not supported; the rest of the transaction was skipped.
    Ignored { opcode: u8 },
    /// CS_N rose in `state` after `bits` bits of the transaction.
    Aborted { state: FlashState, bits: u32 },
}

/// Observable state of a running [`SpiFlash`].
#[derive(Debug, Default)]
pub struct FlashStatus {
    state: Cell<FlashState>,
    transactions: Cell<u64>,
    reads: Cell<u64>,
    aborted: Cell<u64>,
    ignored: Cell<u64>,
    last_command: Cell<Option<u8>>,
    last_address: Cell<Option<FlashAddr>>,
    last_outcome: Cell<Option<TransactionOutcome>>,
}

impl FlashStatus {
    pub fn state(&self) -> FlashState {
        self.state.get()
    }

    /// Number of CS_N falling edges handled.
    pub fn transactions(&self) -> u64 {
        self.transactions.get()
    }

    pub fn reads(&self) -> u64 {
        self.reads.get()
    }

    pub fn aborted(&self) -> u64 {
        self.aborted.get()
    }

    pub fn ignored(&self) -> u64 {
        self.ignored.get()
    }

    /// Last opcode byte shifted in, supported or not.
    pub fn last_command(&self) -> Option<u8> {
        self.last_command.get()
    }

    /// Last fully decoded READ address.
    pub fn last_address(&self) -> Option<FlashAddr> {
        self.last_address.get()
    }

    pub fn last_outcome(&self) -> Option<TransactionOutcome> {
        self.last_outcome.get()
    }

    fn bump(counter: &Cell<u64>) {
        counter.set(counter.get() + 1);
    }
}

pub struct SpiFlash {
    pins: PeripheralPins,
    monitor: BusMonitor,
    store: Rc<RefCell<FlashStore>>,
    status: Rc<FlashStatus>,
}

impl SpiFlash {
    const COMMAND_BITS: u32 = 8;
    const ADDRESS_BYTES: u32 = 3;

    pub fn new(pins: PeripheralPins, store: FlashStore) -> Self {
        let monitor = pins.monitor();
        Self {
            pins,
            monitor,
            store: Rc::new(RefCell::new(store)),
            status: Rc::new(FlashStatus::default()),
        }
    }

    /// Shared handle to the backing store.
    pub fn store(&self) -> Rc<RefCell<FlashStore>> {
        self.store.clone()
    }

    pub fn status(&self) -> Rc<FlashStatus> {
        self.status.clone()
    }

    /// Serve transactions for as long as the simulation runs.
    pub async fn run(mut self) {
        loop {
            self.monitor.await_transaction_start().await;
            self.handle_transaction().await;
        }
    }

    /// Frame one transaction. Called right after a CS_N falling edge.
    pub async fn handle_transaction(&mut self) -> TransactionOutcome {
        FlashStatus::bump(&self.status.transactions);
        self.pins.release_miso();

        let mut bits = 0;
        let outcome = match self.transfer(&mut bits).await {
            Ok(outcome) => outcome,
            Err(Deselected) => TransactionOutcome::Aborted {
                state: self.status.state(),
                bits,
            },
        };

        self.pins.release_miso();
        self.status.state.set(FlashState::Idle);
        self.status.last_outcome.set(Some(outcome));
        match outcome {
            TransactionOutcome::Read { address, word } => {
                FlashStatus::bump(&self.status.reads);
                info!("SPI read from address 0x{address:06x}: 0x{word:08x}");
            }
            TransactionOutcome::Ignored { opcode } => {
                FlashStatus::bump(&self.status.ignored);
                warn!("Unsupported SPI command 0x{opcode:02x}, ignoring transaction");
            }
            TransactionOutcome::Aborted { state, bits } => {
                FlashStatus::bump(&self.status.aborted);
                debug!("SPI transaction aborted in {state:?} after {bits} bits");
            }
        }
        outcome
    }

    async fn transfer(&mut self, bits: &mut u32) -> Result<TransactionOutcome, Deselected> {
        self.status.state.set(FlashState::Command);
        let opcode = self.shift_in(Self::COMMAND_BITS, bits).await? as u8;
        self.status.last_command.set(Some(opcode));
        debug!("SPI command received: 0x{opcode:02x}");

        let Ok(cmd) = FlashCommand::try_from(opcode) else {
            return Ok(TransactionOutcome::Ignored { opcode });
        };

        match cmd {
            FlashCommand::Read => self.read(bits).await,
        }
    }

    async fn read(&mut self, bits: &mut u32) -> Result<TransactionOutcome, Deselected> {
        self.status.state.set(FlashState::Address);
        let mut address: FlashAddr = 0;
        for _ in 0..Self::ADDRESS_BYTES {
            let byte = self.shift_in(8, bits).await?;
            address = (address << 8) | byte;
        }
        self.status.last_address.set(Some(address));

        self.status.state.set(FlashState::Response);
        let word = self.store.borrow().read(address);
        self.shift_out(word, bits).await?;
        Ok(TransactionOutcome::Read { address, word })
    }

    // One MOSI sample per CLK high phase, MSB first.
    async fn shift_in(&self, count: u32, bits: &mut u32) -> Result<u32, Deselected> {
        let mut reg = 0;
        for _ in 0..count {
            self.monitor
                .wait_for_level(SpiSignal::Clk, Level::High)
                .await?;
            let bit = self.monitor.sample(SpiSignal::Mosi);
            reg = (reg << 1) | bit.bit();
            *bits += 1;
            trace!("MOSI bit {bit:?} at tick {}", self.monitor.clock().now());
            self.monitor
                .wait_for_level(SpiSignal::Clk, Level::Low)
                .await?;
        }
        Ok(reg)
    }

    // Drive each bit when CLK high is seen and hold it until CLK is low again.
    // Deselection while the last bit is held still counts as a full word.
    async fn shift_out(&self, word: FlashWord, bits: &mut u32) -> Result<(), Deselected> {
        for index in (0..FLASH_WORD_BITS as usize).rev() {
            self.monitor
                .wait_for_level(SpiSignal::Clk, Level::High)
                .await?;
            let level = Level::from(word.bit(index));
            self.pins.set_miso(level);
            *bits += 1;
            trace!("MISO bit {level:?} at tick {}", self.monitor.clock().now());
            let held = self
                .monitor
                .wait_for_level(SpiSignal::Clk, Level::Low)
                .await;
            if index != 0 {
                held?;
            }
        }
        Ok(())
    }
}
