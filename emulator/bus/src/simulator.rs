/*++

Licensed under the Apache-2.0 license.

File Name:

    simulator.rs

Abstract:

    File contains the cooperative tick scheduler that runs the bus
    initiator and peripheral tasks.

--*/

use crate::clock::SimClock;
use crate::lines::{BusProbe, InitiatorPins, PeripheralPins, SpiLines};
use emulator_types::{Logic, SpiSignal, Tick};
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::RemoteHandle;
use futures::task::{LocalSpawnExt, SpawnError};
use futures::FutureExt;
use log::trace;
use std::future::Future;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to spawn simulation task: {0}")]
    Spawn(#[from] SpawnError),
    #[error("SPI bus has already been split between initiator and peripheral")]
    BusTaken,
    #[error("task did not complete within {0} ticks")]
    Timeout(Tick),
}

/// Single-threaded simulation of one SPI link.
///
/// Each [`step`](Simulator::step) polls every task until all of them are
/// suspended, commits the line values driven during the tick and then
/// advances the clock. A value driven at tick `t` is therefore sampled by
/// the other side at tick `t + 1` at the earliest.
pub struct Simulator {
    clock: Rc<SimClock>,
    lines: Rc<SpiLines>,
    bus_taken: bool,
    pool: LocalPool,
    spawner: LocalSpawner,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            clock: SimClock::new(),
            lines: Rc::new(SpiLines::default()),
            bus_taken: false,
            pool,
            spawner,
        }
    }

    pub fn clock(&self) -> Rc<SimClock> {
        self.clock.clone()
    }

    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Hand out the two sides of the bus. Can only be done once, so that
    /// every line has exactly one driver.
    pub fn split_bus(&mut self) -> Result<(InitiatorPins, PeripheralPins), SimError> {
        if self.bus_taken {
            return Err(SimError::BusTaken);
        }
        self.bus_taken = true;
        Ok((
            InitiatorPins::new(self.lines.clone(), self.clock.clone()),
            PeripheralPins::new(self.lines.clone(), self.clock.clone()),
        ))
    }

    pub fn probe(&self) -> BusProbe {
        BusProbe::new(self.lines.clone())
    }

    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<(), SimError> {
        self.spawner.spawn_local(task)?;
        Ok(())
    }

    /// Spawn a task whose result is collected with [`run_until`](Simulator::run_until).
    pub fn spawn_with_handle<F>(&self, task: F) -> Result<RemoteHandle<F::Output>, SimError>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        Ok(self.spawner.spawn_local_with_handle(task)?)
    }

    /// Run one tick.
    pub fn step(&mut self) {
        self.pool.run_until_stalled();
        self.end_tick();
    }

    pub fn run_for(&mut self, ticks: Tick) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Run while `keep_going` returns true. Returns the number of ticks run.
    pub fn run_while(&mut self, mut keep_going: impl FnMut(&Self) -> bool) -> Tick {
        let start = self.now();
        while keep_going(self) {
            self.step();
        }
        self.now() - start
    }

    /// Run until the task behind `handle` completes, for at most `max_ticks`.
    pub fn run_until<T: 'static>(
        &mut self,
        mut handle: RemoteHandle<T>,
        max_ticks: Tick,
    ) -> Result<T, SimError> {
        let deadline = self.now().saturating_add(max_ticks);
        loop {
            self.pool.run_until_stalled();
            if let Some(output) = (&mut handle).now_or_never() {
                return Ok(output);
            }
            if self.now() >= deadline {
                return Err(SimError::Timeout(max_ticks));
            }
            self.end_tick();
        }
    }

    fn end_tick(&mut self) {
        if self.lines.commit() {
            let [miso, mosi, clk, cs_n] = self.lines.snapshot();
            trace!(
                "tick {}: {}={} {}={} {}={} {}={}",
                self.now() + 1,
                SpiSignal::CsN,
                cs_n,
                SpiSignal::Clk,
                clk,
                SpiSignal::Mosi,
                mosi,
                SpiSignal::Miso,
                miso
            );
        }
        self.clock.advance();
    }

    /// Current raw value of a line.
    pub fn line(&self, signal: SpiSignal) -> Logic {
        self.lines.get(signal)
    }
}
