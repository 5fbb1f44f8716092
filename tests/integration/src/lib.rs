// Licensed under the Apache-2.0 license

mod test_flash_image;
mod test_spi_bus;

#[cfg(test)]
mod test {
    use emulator_bus::{BusProbe, Simulator};
    use emulator_periph::{FlashStatus, FlashStore, SpiFlash, SpiHost};
    use emulator_types::{Logic, SpiSignal, Tick};
    use log::LevelFilter;
    use simple_logger::SimpleLogger;
    use std::cell::{Cell, RefCell};
    use std::future::Future;
    use std::rc::Rc;

    pub(crate) const MAX_TICKS: Tick = 1_000_000;

    /// A flash peer and an initiator on one simulated bus, with a watcher
    /// counting ticks on which MISO was still driven a tick after CS_N
    /// went high.
    pub(crate) struct Link {
        pub sim: Simulator,
        pub host: Rc<SpiHost>,
        pub status: Rc<FlashStatus>,
        pub store: Rc<RefCell<FlashStore>>,
        pub probe: BusProbe,
        pub miso_driven_while_idle: Rc<Cell<u64>>,
    }

    impl Link {
        pub(crate) fn new(store: FlashStore, half_period: Tick) -> Self {
            let _ = SimpleLogger::new().with_level(LevelFilter::Info).init();
            let mut sim = Simulator::new();
            let (host_pins, flash_pins) = sim.split_bus().unwrap();
            let flash = SpiFlash::new(flash_pins, store);
            let status = flash.status();
            let store = flash.store();
            sim.spawn(flash.run()).unwrap();

            let probe = sim.probe();
            let miso_driven_while_idle = Rc::new(Cell::new(0));
            {
                let probe = probe.clone();
                let count = miso_driven_while_idle.clone();
                let clock = sim.clock();
                sim.spawn(async move {
                    let mut was_idle = false;
                    loop {
                        let idle = probe.get(SpiSignal::CsN) == Logic::One;
                        if was_idle && idle && probe.get(SpiSignal::Miso) != Logic::Z {
                            count.set(count.get() + 1);
                        }
                        was_idle = idle;
                        clock.next_tick().await;
                    }
                })
                .unwrap();
            }

            Self {
                host: Rc::new(SpiHost::new(host_pins, half_period).unwrap()),
                sim,
                status,
                store,
                probe,
                miso_driven_while_idle,
            }
        }

        pub(crate) fn run<T, F>(&mut self, script: impl FnOnce(Rc<SpiHost>) -> F) -> T
        where
            T: 'static,
            F: Future<Output = T> + 'static,
        {
            let handle = self
                .sim
                .spawn_with_handle(script(self.host.clone()))
                .unwrap();
            self.sim.run_until(handle, MAX_TICKS).unwrap()
        }
    }

    #[test]
    fn test_seed_round_trip() {
        let mut link = Link::new(FlashStore::with_seed(), 4);
        let words = link.run(|host| async move {
            vec![host.read_word(0x0).await, host.read_word(0x4).await]
        });
        assert_eq!(words, vec![0x1234_5678, 0xABCD_EF00]);
        assert_eq!(link.status.reads(), 2);
        assert_eq!(link.miso_driven_while_idle.get(), 0);
        assert_eq!(link.probe.get(SpiSignal::Miso), Logic::Z);
    }
}
