/*++

Licensed under the Apache-2.0 license.

File Name:

    spi_host.rs

Abstract:

    File contains SPI host emulation: a bit-banged bus initiator issuing
    flash commands in mode 0.

--*/

use crate::spi_flash::FlashCommand;
use bitfield::Bit;
use emulator_bus::InitiatorPins;
use emulator_types::{FlashAddr, FlashWord, Level, Logic, SpiSignal, Tick};
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpiHostError {
    #[error("half clock period of {0} ticks is below the minimum of {min}", min = SpiHost::MIN_HALF_PERIOD)]
    HalfPeriodTooShort(Tick),
}

/// Drives CS_N, CLK and MOSI and samples MISO.
///
/// MOSI is set up while CLK is low, CLK is then held high for one half
/// period and MISO is sampled just before CLK falls again.
pub struct SpiHost {
    pins: InitiatorPins,
    half_period: Tick,
}

impl SpiHost {
    /// The peripheral needs one tick to see CLK high and one more for its
    /// MISO drive to become visible.
    pub const MIN_HALF_PERIOD: Tick = 2;

    pub fn new(pins: InitiatorPins, half_period: Tick) -> Result<Self, SpiHostError> {
        if half_period < Self::MIN_HALF_PERIOD {
            return Err(SpiHostError::HalfPeriodTooShort(half_period));
        }
        pins.set_cs_n(Logic::One);
        pins.set_clk(Logic::Zero);
        pins.set_mosi(Logic::Zero);
        Ok(Self { pins, half_period })
    }

    pub fn half_period(&self) -> Tick {
        self.half_period
    }

    pub async fn idle(&self, ticks: Tick) {
        self.pins.clock().delay(ticks).await;
    }

    /// Assert CS_N and wait half a period before the first edge.
    pub async fn select(&self) {
        self.pins.set_cs_n(Logic::Zero);
        self.idle(self.half_period).await;
    }

    /// Deassert CS_N half a period after the last edge and keep it high for
    /// another half period.
    pub async fn deselect(&self) {
        self.idle(self.half_period).await;
        self.pins.set_cs_n(Logic::One);
        self.pins.set_mosi(Logic::Zero);
        self.idle(self.half_period).await;
    }

    /// One full CLK cycle. Returns the MISO level sampled in the high phase.
    pub async fn shift_bit(&self, out: impl Into<Logic>) -> Level {
        self.pins.set_mosi(out);
        self.idle(self.half_period).await;
        self.pins.set_clk(Logic::One);
        self.idle(self.half_period).await;
        let sampled = self.pins.miso().resolve(SpiSignal::Miso.default_level());
        self.pins.set_clk(Logic::Zero);
        sampled
    }

    /// Full-duplex byte, MSB first.
    pub async fn transfer_byte(&self, out: u8) -> u8 {
        let mut input = 0u8;
        for index in (0..8).rev() {
            let bit = self.shift_bit(out.bit(index)).await;
            input = (input << 1) | bit.bit() as u8;
        }
        input
    }

    pub async fn write_byte(&self, out: u8) {
        self.transfer_byte(out).await;
    }

    /// Clock in a byte while holding MOSI low.
    pub async fn read_byte(&self) -> u8 {
        self.transfer_byte(0).await
    }

    /// Select, shift out `tx`, clock in `rx_len` bytes and deselect.
    pub async fn transaction(&self, tx: &[u8], rx_len: usize) -> Vec<u8> {
        self.select().await;
        for byte in tx {
            self.write_byte(*byte).await;
        }
        let mut rx = Vec::with_capacity(rx_len);
        for _ in 0..rx_len {
            rx.push(self.read_byte().await);
        }
        self.deselect().await;
        rx
    }

    /// READ one word. Only the low 24 bits of `addr` are sent.
    pub async fn read_word(&self, addr: FlashAddr) -> FlashWord {
        let rx = self.transaction(&Self::read_header(addr), 4).await;
        let word = FlashWord::from_be_bytes([rx[0], rx[1], rx[2], rx[3]]);
        debug!("SPI host read 0x{addr:06x}: 0x{word:08x}");
        word
    }

    /// READ that is cut off by deselecting after `response_bits` bits of
    /// the response. Returns the bits received, right aligned.
    pub async fn read_word_aborted(&self, addr: FlashAddr, response_bits: u32) -> u32 {
        self.select().await;
        for byte in Self::read_header(addr) {
            self.write_byte(byte).await;
        }
        let mut partial = 0u32;
        for _ in 0..response_bits {
            let bit = self.shift_bit(Logic::Zero).await;
            partial = (partial << 1) | bit.bit();
        }
        self.deselect().await;
        partial
    }

    /// Transaction carrying only an opcode byte.
    pub async fn send_opcode(&self, opcode: u8) {
        self.transaction(&[opcode], 0).await;
    }

    fn read_header(addr: FlashAddr) -> [u8; 4] {
        let [_, a2, a1, a0] = addr.to_be_bytes();
        [FlashCommand::Read.into(), a2, a1, a0]
    }
}
