// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use crate::test::Link;
    use emulator_consts::{FLASH_WORD_BITS, SPI_ADDR_MAX};
    use emulator_periph::{FlashCommand, FlashState, FlashStore, TransactionOutcome};
    use emulator_types::{FlashAddr, FlashWord};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Read(FlashAddr),
        Abort(FlashAddr, u32),
        Opcode(u8),
        Rewrite(FlashAddr, FlashWord),
    }

    fn random_store(rng: &mut StdRng, count: usize) -> (FlashStore, BTreeMap<FlashAddr, FlashWord>) {
        let mut store = FlashStore::new();
        let mut model = BTreeMap::new();
        for _ in 0..count {
            let addr = rng.gen_range(0..=SPI_ADDR_MAX) & !3;
            let word = rng.gen();
            store.store(addr, word).unwrap();
            model.insert(addr, word);
        }
        (store, model)
    }

    fn random_op(rng: &mut StdRng, addrs: &[FlashAddr]) -> Op {
        match rng.gen_range(0..7) {
            0..=2 => Op::Read(addrs[rng.gen_range(0..addrs.len())]),
            3 => Op::Read(rng.gen_range(0..=SPI_ADDR_MAX)),
            4 => Op::Abort(
                addrs[rng.gen_range(0..addrs.len())],
                rng.gen_range(0..FLASH_WORD_BITS),
            ),
            5 => Op::Rewrite(addrs[rng.gen_range(0..addrs.len())], rng.gen()),
            _ => loop {
                let opcode: u8 = rng.gen();
                if opcode != u8::from(FlashCommand::Read) {
                    break Op::Opcode(opcode);
                }
            },
        }
    }

    #[test]
    fn test_random_traffic() {
        let mut rng = StdRng::seed_from_u64(0x5b1_f1a5);
        let (store, mut model) = random_store(&mut rng, 64);
        let addrs: Vec<FlashAddr> = model.keys().copied().collect();
        let mut link = Link::new(store, 2);

        let (mut reads, mut aborted, mut ignored) = (0, 0, 0);
        for _ in 0..300 {
            match random_op(&mut rng, &addrs) {
                Op::Read(addr) => {
                    let word = link.run(move |host| async move { host.read_word(addr).await });
                    assert_eq!(word, model.get(&addr).copied().unwrap_or(0));
                    assert_eq!(link.status.last_address(), Some(addr));
                    reads += 1;
                }
                Op::Abort(addr, bits) => {
                    link.run(move |host| async move { host.read_word_aborted(addr, bits).await });
                    assert_eq!(
                        link.status.last_outcome(),
                        Some(TransactionOutcome::Aborted {
                            state: FlashState::Response,
                            bits: 32 + bits
                        })
                    );
                    aborted += 1;
                }
                Op::Opcode(opcode) => {
                    let rx = link.run(move |host| async move {
                        host.transaction(&[opcode, 0x00, 0x00, 0x00], 4).await
                    });
                    assert_eq!(rx, vec![0; 4]);
                    assert_eq!(link.status.last_command(), Some(opcode));
                    ignored += 1;
                }
                Op::Rewrite(addr, word) => {
                    // Stores between transactions are seen by the next READ.
                    let mut store = link.store.borrow_mut();
                    assert!(store.contains(addr));
                    store.store(addr, word).unwrap();
                    model.insert(addr, word);
                }
            }
            assert_eq!(link.status.state(), FlashState::Idle);
        }

        assert_eq!(link.status.reads(), reads);
        assert_eq!(link.status.aborted(), aborted);
        assert_eq!(link.status.ignored(), ignored);
        assert_eq!(link.status.transactions(), reads + aborted + ignored);
        assert_eq!(link.miso_driven_while_idle.get(), 0);
    }

    #[test]
    fn test_half_period_does_not_change_data() {
        let mut rng = StdRng::seed_from_u64(7);
        let (store, model) = random_store(&mut rng, 8);
        for half_period in [2, 3, 5, 8] {
            let mut link = Link::new(store.clone(), half_period);
            for (&addr, &word) in model.iter() {
                assert_eq!(
                    link.run(move |host| async move { host.read_word(addr).await }),
                    word
                );
            }
            assert_eq!(link.status.reads(), model.len() as u64);
        }
    }

    #[test]
    fn test_back_to_back_aborts_recover() {
        let mut link = Link::new(FlashStore::with_seed(), 3);
        let words = link.run(|host| async move {
            for bits in [0, 1, 31, 16] {
                host.read_word_aborted(0x8, bits).await;
            }
            host.send_opcode(0x9F).await;
            vec![host.read_word(0x8).await, host.read_word(0x4).await]
        });
        assert_eq!(words, vec![0x1122_3344, 0xABCD_EF00]);
        assert_eq!(link.status.aborted(), 4);
        assert_eq!(link.status.ignored(), 1);
        assert_eq!(link.status.reads(), 2);
        assert_eq!(link.miso_driven_while_idle.get(), 0);
    }
}
