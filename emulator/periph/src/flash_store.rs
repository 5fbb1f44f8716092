/*++

Licensed under the Apache-2.0 license.

File Name:

    flash_store.rs

Abstract:

    File contains the sparse word store backing the SPI flash emulation.

--*/

use emulator_consts::{is_flash_address, FLASH_WORD_BYTES};
use emulator_types::{FlashAddr, FlashWord};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("address 0x{0:08x} is not word aligned")]
    Unaligned(FlashAddr),
    #[error("address 0x{0:08x} is outside the SPI flash window")]
    OutOfWindow(FlashAddr),
    #[error("image of {len} bytes at 0x{offset:08x} does not fit in the SPI flash window")]
    ImageTooLarge { offset: FlashAddr, len: usize },
}

/// Contents the emulated flash starts with.
pub const SEED_WORDS: &[(FlashAddr, FlashWord)] = &[
    (0x00_0000, 0x1234_5678),
    (0x00_0004, 0xABCD_EF00),
    (0x00_0008, 0x1122_3344),
];

/// Sparse map of word-aligned flash addresses to 32-bit words.
///
/// Reads of addresses that were never stored return zero.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlashStore {
    words: HashMap<FlashAddr, FlashWord>,
}

impl FlashStore {
    pub const DEFAULT_WORD: FlashWord = 0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with [`SEED_WORDS`].
    pub fn with_seed() -> Self {
        Self {
            words: SEED_WORDS.iter().copied().collect(),
        }
    }

    /// Word at `addr`, or [`FlashStore::DEFAULT_WORD`] if none was stored.
    ///
    /// Lookup is by exact address; an unaligned address only hits if it was
    /// stored, which `store` never allows.
    pub fn read(&self, addr: FlashAddr) -> FlashWord {
        self.words
            .get(&addr)
            .copied()
            .unwrap_or(Self::DEFAULT_WORD)
    }

    pub fn contains(&self, addr: FlashAddr) -> bool {
        self.words.contains_key(&addr)
    }

    pub fn store(&mut self, addr: FlashAddr, word: FlashWord) -> Result<(), StoreError> {
        if !is_flash_address(addr) {
            return Err(StoreError::OutOfWindow(addr));
        }
        if addr % FLASH_WORD_BYTES != 0 {
            return Err(StoreError::Unaligned(addr));
        }
        self.words.insert(addr, word);
        Ok(())
    }

    /// Load a raw image, four big-endian bytes per word, starting at
    /// `offset`. A trailing partial word is padded with zero bytes.
    /// Returns the number of words written.
    pub fn load_image(&mut self, offset: FlashAddr, image: &[u8]) -> Result<usize, StoreError> {
        if offset % FLASH_WORD_BYTES != 0 {
            return Err(StoreError::Unaligned(offset));
        }
        let too_large = StoreError::ImageTooLarge {
            offset,
            len: image.len(),
        };
        let len = u32::try_from(image.len()).map_err(|_| too_large)?;
        if len > 0 {
            let last = offset.checked_add(len - 1).ok_or(too_large)?;
            if !is_flash_address(offset) || !is_flash_address(last) {
                return Err(too_large);
            }
        }

        let mut count = 0;
        for (index, chunk) in image.chunks(FLASH_WORD_BYTES as usize).enumerate() {
            let mut bytes = [0u8; FLASH_WORD_BYTES as usize];
            bytes[..chunk.len()].copy_from_slice(chunk);
            let addr = offset + (index as u32) * FLASH_WORD_BYTES;
            self.words.insert(addr, FlashWord::from_be_bytes(bytes));
            count += 1;
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Stored entries in ascending address order.
    pub fn entries(&self) -> Vec<(FlashAddr, FlashWord)> {
        let mut entries: Vec<_> = self.words.iter().map(|(a, w)| (*a, *w)).collect();
        entries.sort_unstable();
        entries
    }
}
