/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the signal level and SPI pin types shared by the bus and
    the peripherals.

--*/

mod logic;

pub use logic::{Level, Logic, SpiSignal};

/// Flash byte address as carried on the SPI bus.
pub type FlashAddr = u32;

/// 32-bit word held by the flash backing store.
pub type FlashWord = u32;

/// Simulation time, counted in bus ticks.
pub type Tick = u64;
