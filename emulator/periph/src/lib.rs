/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the SPI flash emulator peripheral library.

--*/

mod flash_store;
mod spi_flash;
mod spi_host;

pub use flash_store::{FlashStore, StoreError, SEED_WORDS};
pub use spi_flash::{FlashCommand, FlashState, FlashStatus, SpiFlash, TransactionOutcome};
pub use spi_host::{SpiHost, SpiHostError};
