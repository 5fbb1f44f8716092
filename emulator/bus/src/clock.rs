/*++

Licensed under the Apache-2.0 license.

File Name:

    clock.rs

Abstract:

    File contains the simulation tick counter and the future used to
    suspend a task until a later tick.

--*/

use emulator_types::Tick;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Bus tick counter shared by every task of a simulation.
///
/// Tasks suspend on [`NextTick`] and are woken when the owning
/// [`Simulator`](crate::Simulator) advances the counter.
#[derive(Default)]
pub struct SimClock {
    now: Cell<Tick>,
    waiters: RefCell<Vec<Waker>>,
}

impl SimClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Current tick.
    pub fn now(&self) -> Tick {
        self.now.get()
    }

    /// Suspend until the next tick.
    pub fn next_tick(self: &Rc<Self>) -> NextTick {
        self.delay(1)
    }

    /// Suspend for `ticks` ticks. A zero delay completes immediately.
    pub fn delay(self: &Rc<Self>, ticks: Tick) -> NextTick {
        NextTick {
            clock: self.clone(),
            target: self.now().saturating_add(ticks),
        }
    }

    pub(crate) fn advance(&self) {
        self.now.set(self.now.get() + 1);
        let waiters = std::mem::take(&mut *self.waiters.borrow_mut());
        for waker in waiters {
            waker.wake();
        }
    }

    fn register(&self, waker: &Waker) {
        let mut waiters = self.waiters.borrow_mut();
        if !waiters.iter().any(|w| w.will_wake(waker)) {
            waiters.push(waker.clone());
        }
    }
}

/// Future returned by [`SimClock::next_tick`] and [`SimClock::delay`].
///
/// Resolves to the tick at which it completed.
pub struct NextTick {
    clock: Rc<SimClock>,
    target: Tick,
}

impl Future for NextTick {
    type Output = Tick;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Tick> {
        let now = self.clock.now();
        if now >= self.target {
            Poll::Ready(now)
        } else {
            self.clock.register(cx.waker());
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker;

    #[test]
    fn test_next_tick_waits_for_advance() {
        let clock = SimClock::new();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut fut = clock.next_tick();
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Pending);
        clock.advance();
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Ready(1));
    }

    #[test]
    fn test_zero_delay_is_ready() {
        let clock = SimClock::new();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut fut = clock.delay(0);
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Ready(0));
    }

    #[test]
    fn test_waiters_registered_once() {
        let clock = SimClock::new();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut fut = clock.delay(3);
        for _ in 0..4 {
            let _ = Pin::new(&mut fut).poll(&mut cx);
        }
        assert_eq!(clock.waiters.borrow().len(), 1);
        clock.advance();
        assert!(clock.waiters.borrow().is_empty());
    }

    #[test]
    fn test_huge_delay_saturates() {
        let clock = SimClock::new();
        clock.advance();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut fut = clock.delay(Tick::MAX);
        assert_eq!(fut.target, Tick::MAX);
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Pending);
    }
}
