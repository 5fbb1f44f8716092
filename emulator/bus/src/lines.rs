/*++

Licensed under the Apache-2.0 license.

File Name:

    lines.rs

Abstract:

    File contains the four SPI lines and the per-side pin handles that own
    them.

--*/

use crate::clock::SimClock;
use crate::monitor::BusMonitor;
use emulator_types::{Logic, SpiSignal};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Default)]
struct Line {
    current: Cell<Logic>,
    pending: Cell<Option<Logic>>,
}

/// Storage for the four SPI lines.
///
/// Drivers write a pending value that only becomes visible once the
/// simulator commits the tick, so every task sampling during a tick sees the
/// same values regardless of poll order.
#[derive(Default)]
pub(crate) struct SpiLines {
    lines: [Line; 4],
}

impl SpiLines {
    pub(crate) fn get(&self, signal: SpiSignal) -> Logic {
        self.lines[signal.index()].current.get()
    }

    fn drive(&self, signal: SpiSignal, value: Logic) {
        self.lines[signal.index()].pending.set(Some(value));
    }

    /// Make pending values visible. Returns true if any line changed.
    pub(crate) fn commit(&self) -> bool {
        let mut changed = false;
        for line in self.lines.iter() {
            if let Some(value) = line.pending.take() {
                changed |= line.current.replace(value) != value;
            }
        }
        changed
    }

    pub(crate) fn snapshot(&self) -> [Logic; 4] {
        SpiSignal::ALL.map(|s| self.get(s))
    }
}

/// Initiator side of the bus: drives CS_N, CLK and MOSI, observes MISO.
pub struct InitiatorPins {
    lines: Rc<SpiLines>,
    clock: Rc<SimClock>,
}

impl InitiatorPins {
    pub(crate) fn new(lines: Rc<SpiLines>, clock: Rc<SimClock>) -> Self {
        Self { lines, clock }
    }

    pub fn set_cs_n(&self, value: impl Into<Logic>) {
        self.lines.drive(SpiSignal::CsN, value.into());
    }

    pub fn set_clk(&self, value: impl Into<Logic>) {
        self.lines.drive(SpiSignal::Clk, value.into());
    }

    pub fn set_mosi(&self, value: impl Into<Logic>) {
        self.lines.drive(SpiSignal::Mosi, value.into());
    }

    pub fn miso(&self) -> Logic {
        self.lines.get(SpiSignal::Miso)
    }

    pub fn clock(&self) -> &Rc<SimClock> {
        &self.clock
    }
}

/// Peripheral side of the bus: drives MISO only.
pub struct PeripheralPins {
    lines: Rc<SpiLines>,
    clock: Rc<SimClock>,
}

impl PeripheralPins {
    pub(crate) fn new(lines: Rc<SpiLines>, clock: Rc<SimClock>) -> Self {
        Self { lines, clock }
    }

    pub fn set_miso(&self, value: impl Into<Logic>) {
        self.lines.drive(SpiSignal::Miso, value.into());
    }

    /// Stop driving MISO.
    pub fn release_miso(&self) {
        self.lines.drive(SpiSignal::Miso, Logic::Z);
    }

    /// Read-only view of the initiator-driven lines.
    pub fn monitor(&self) -> BusMonitor {
        BusMonitor::new(self.lines.clone(), self.clock.clone())
    }

    pub fn clock(&self) -> &Rc<SimClock> {
        &self.clock
    }
}

/// Passive observer of all four lines. Drives nothing.
#[derive(Clone)]
pub struct BusProbe {
    lines: Rc<SpiLines>,
}

impl BusProbe {
    pub(crate) fn new(lines: Rc<SpiLines>) -> Self {
        Self { lines }
    }

    pub fn get(&self, signal: SpiSignal) -> Logic {
        self.lines.get(signal)
    }

    /// Line values indexed by [`SpiSignal::index`].
    pub fn snapshot(&self) -> [Logic; 4] {
        self.lines.snapshot()
    }
}
