//! Shared sample memory
//!
//! One fixed allocation holding the 31 sample slots followed by a reserved
//! silent region. Voices address it by byte offset; the scopes only ever read.
//! Bytes are stored as atomics so the editor may rewrite sample data while
//! the scope thread and the GUI are reading it.

use crate::config::ScopeConfig;
use crate::constants::SAMPLE_SLOTS;
use std::sync::atomic::{AtomicI8, Ordering};

/// Fixed-size sample arena
pub struct SampleArena {
    bytes: Box<[AtomicI8]>,
    slot_size: usize,
    reserved_len: usize,
}

impl SampleArena {
    /// Allocate an arena of [`SAMPLE_SLOTS`] slots of `slot_size` bytes plus a
    /// zeroed reserved region of `reserved_len` bytes.
    pub fn new(slot_size: usize, reserved_len: usize) -> Self {
        let total = SAMPLE_SLOTS * slot_size + reserved_len;
        let bytes = (0..total).map(|_| AtomicI8::new(0)).collect();
        Self {
            bytes,
            slot_size,
            reserved_len,
        }
    }

    /// Allocate an arena sized from the configuration.
    pub fn from_config(config: &ScopeConfig) -> Self {
        Self::new(
            config.max_sample_length as usize,
            config.reserved_sample_length as usize,
        )
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the arena holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size of one sample slot.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Byte offset where a slot starts.
    pub fn slot_offset(&self, slot: usize) -> usize {
        slot * self.slot_size
    }

    /// Start of the reserved silent region.
    pub fn reserved_offset(&self) -> usize {
        SAMPLE_SLOTS * self.slot_size
    }

    /// Size of the reserved silent region.
    pub fn reserved_len(&self) -> usize {
        self.reserved_len
    }

    /// Read one sample. Out-of-range reads yield silence.
    #[inline]
    pub fn read(&self, offset: usize) -> i8 {
        self.bytes
            .get(offset)
            .map_or(0, |b| b.load(Ordering::Relaxed))
    }

    /// Copy sample data into the arena, truncated at the arena's end.
    ///
    /// Returns the number of bytes written.
    pub fn write(&self, offset: usize, data: &[i8]) -> usize {
        let Some(dest) = self.bytes.get(offset..) else {
            return 0;
        };
        let count = data.len().min(dest.len());
        for (cell, &value) in dest.iter().zip(&data[..count]) {
            cell.store(value, Ordering::Relaxed);
        }
        count
    }

    /// Which sample slot a read address belongs to.
    ///
    /// Returns `None` for a missing pointer and for anything at or past the
    /// end of the last slot (including the reserved region).
    pub fn slot_of(&self, offset: Option<usize>) -> Option<usize> {
        let offset = offset?;
        if self.slot_size == 0 || offset >= self.reserved_offset() {
            return None;
        }
        Some(offset / self.slot_size)
    }
}

impl std::fmt::Debug for SampleArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleArena")
            .field("len", &self.bytes.len())
            .field("slot_size", &self.slot_size)
            .field("reserved_len", &self.reserved_len)
            .finish()
    }
}
