/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Library interface for the SPI Flash Emulator.

--*/

pub mod emulator;

pub use emulator::{Emulator, EmulatorArgs, EmulatorReport, ReadResult};
