/*++

Licensed under the Apache-2.0 license.

File Name:

    monitor.rs

Abstract:

    File contains the SPI bus monitor: transaction framing and level waits
    as seen from the peripheral side.

--*/

use crate::clock::SimClock;
use crate::lines::SpiLines;
use emulator_types::{Level, SpiSignal, Tick};
use log::{debug, trace};
use std::rc::Rc;
use thiserror::Error;

/// Chip select was observed high while a transaction was open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("chip select deasserted")]
pub struct Deselected;

/// Samples the bus once per tick. Never drives a line.
pub struct BusMonitor {
    lines: Rc<SpiLines>,
    clock: Rc<SimClock>,
}

impl BusMonitor {
    pub(crate) fn new(lines: Rc<SpiLines>, clock: Rc<SimClock>) -> Self {
        Self { lines, clock }
    }

    /// Resolved level of `signal` at the current tick.
    ///
    /// `X` and `Z` are replaced by [`SpiSignal::default_level`].
    pub fn sample(&self, signal: SpiSignal) -> Level {
        let raw = self.lines.get(signal);
        if !raw.is_defined() {
            trace!(
                "{} is {} at tick {}, using {:?}",
                signal,
                raw,
                self.clock.now(),
                signal.default_level()
            );
        }
        raw.resolve(signal.default_level())
    }

    /// Current level of CLK. The caller decides which level is a sample point.
    pub fn sample_clock_edge(&self) -> Level {
        self.sample(SpiSignal::Clk)
    }

    pub fn is_selected(&self) -> bool {
        self.sample(SpiSignal::CsN).is_low()
    }

    /// Suspend until CS_N goes from high to low between two consecutive
    /// ticks. Returns the tick at which the low level was sampled.
    ///
    /// If CS_N is already low on entry, the current transaction has to end
    /// first. There is no timeout.
    pub async fn await_transaction_start(&self) -> Tick {
        let mut prev = self.sample(SpiSignal::CsN);
        loop {
            let now = self.clock.next_tick().await;
            let cur = self.sample(SpiSignal::CsN);
            if prev.is_high() && cur.is_low() {
                debug!("CS_N falling edge at tick {now}");
                return now;
            }
            prev = cur;
        }
    }

    /// Suspend until `signal` is sampled at `level`.
    ///
    /// CS_N is checked on every tick first; if it is high the wait is
    /// cancelled with [`Deselected`]. Waiting on CS_N itself is never
    /// cancelled.
    pub async fn wait_for_level(&self, signal: SpiSignal, level: Level) -> Result<(), Deselected> {
        loop {
            if signal != SpiSignal::CsN && !self.is_selected() {
                return Err(Deselected);
            }
            if self.sample(signal) == level {
                return Ok(());
            }
            self.clock.next_tick().await;
        }
    }

    pub fn clock(&self) -> &Rc<SimClock> {
        &self.clock
    }
}
