/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the SPI bus simulation library.

--*/

mod clock;
mod lines;
mod monitor;
mod simulator;

pub use clock::{NextTick, SimClock};
pub use lines::{BusProbe, InitiatorPins, PeripheralPins};
pub use monitor::{BusMonitor, Deselected};
pub use simulator::{SimError, Simulator};
