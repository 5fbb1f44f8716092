/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the SoC address map and SPI flash protocol constants.

--*/

/// Start of the window routed to the external SPI flash.
pub const FLASH_WINDOW_START: u32 = 0x0000_0000;
/// Last address routed to the external SPI flash.
pub const FLASH_WINDOW_END: u32 = 0x7FFF_FFFF;

pub const GPIO_ADDR: u32 = 0x8000_0000;
pub const UART_DATA_ADDR: u32 = 0x8000_0004;
pub const UART_CTRL_ADDR: u32 = 0x8000_0008;
pub const UART_STATUS_ADDR: u32 = 0x8000_000C;

/// Widest address a READ command can carry.
pub const SPI_ADDR_BITS: u32 = 24;
pub const SPI_ADDR_MAX: u32 = (1 << SPI_ADDR_BITS) - 1;

/// Width of the word returned by a READ command.
pub const FLASH_WORD_BITS: u32 = 32;
pub const FLASH_WORD_BYTES: u32 = FLASH_WORD_BITS / 8;

/// SoC region an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocRegion {
    Flash,
    Gpio,
    UartData,
    UartCtrl,
    UartStatus,
    Unmapped,
}

impl SocRegion {
    pub fn decode(addr: u32) -> SocRegion {
        match addr {
            FLASH_WINDOW_START..=FLASH_WINDOW_END => SocRegion::Flash,
            GPIO_ADDR => SocRegion::Gpio,
            UART_DATA_ADDR => SocRegion::UartData,
            UART_CTRL_ADDR => SocRegion::UartCtrl,
            UART_STATUS_ADDR => SocRegion::UartStatus,
            _ => SocRegion::Unmapped,
        }
    }
}

pub fn is_flash_address(addr: u32) -> bool {
    SocRegion::decode(addr) == SocRegion::Flash
}
