//! Voice snapshot and sequence lock
//!
//! A [`VoiceState`] is the scope's view of one Paula voice: the region the
//! DMA is currently fetching from, the region latched in the registers for
//! the next reload, and the fractional timing used to follow the fetch
//! position. Every consumer works on a copy.
//!
//! The live record sits in a [`VoiceSlot`], a sequence lock built from
//! atomics. Readers never block a writer and never observe a half-written
//! record: they retry until the sequence number is even and unchanged across
//! the copy. Writers (the mixer's register pokes, the scope thread's position
//! update) exclude each other on the sequence number for the few stores a
//! write takes.

use crate::arena::SampleArena;
use crate::constants::MIN_REGION_LENGTH;
use crate::sync::Backoff;
use std::sync::atomic::{fence, AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Scope state of one voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceState {
    /// Voice is playing and contributes to the scopes
    pub active: bool,
    /// Arena offset of the region being fetched
    pub data: Option<usize>,
    /// Byte position inside the current region
    pub pos: i32,
    /// Length of the current region in bytes
    pub length: i32,
    /// Latched region start, taken over when the current region runs out
    pub new_data: Option<usize>,
    /// Latched region length in bytes
    pub new_length: i32,
    /// Fractional sample position, kept in `[0, 1)`
    pub d_phase: f64,
    /// Samples fetched per scope tick
    pub d_delta: f64,
    /// Period the cached delta was computed for
    pub old_period: Option<i32>,
    /// Cached delta for `old_period`
    pub d_old_scope_delta: f64,
    /// Volume register (0-64)
    pub volume: u8,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            active: false,
            data: None,
            pos: 0,
            length: 0,
            new_data: None,
            new_length: 0,
            d_phase: 0.0,
            d_delta: 0.0,
            old_period: None,
            d_old_scope_delta: 0.0,
            volume: 0,
        }
    }
}

impl VoiceState {
    /// Restart DMA on `data`/`length`.
    ///
    /// The region becomes both current and latched, the position and phase
    /// reset, and the voice turns active. Lengths below 2 are raised to 2.
    pub fn trigger(&mut self, data: usize, length: i32) {
        let length = length.max(MIN_REGION_LENGTH);

        self.data = Some(data);
        self.length = length;
        self.new_data = Some(data);
        self.new_length = length;
        self.pos = 0;
        self.d_phase = 0.0;
        self.active = true;
    }

    /// Whether the scopes have anything to show for this voice.
    #[inline]
    pub fn is_audible(&self) -> bool {
        self.active && self.data.is_some() && self.volume != 0 && self.length > 0
    }

    /// Walk the samples ahead of the current position.
    ///
    /// Read-only: when the walk runs off the current region it continues in
    /// the latched one, exactly like the DMA reload, without touching `self`.
    pub fn cursor<'a>(&self, arena: &'a SampleArena) -> SampleCursor<'a> {
        SampleCursor {
            arena,
            data: self.data,
            pos: self.pos,
            length: self.length,
            new_data: self.new_data,
            new_length: self.new_length,
        }
    }

    fn encode(&self) -> [u64; WORDS] {
        let mut head = (self.active as u64) | ((self.volume as u64) << 8);
        if let Some(period) = self.old_period {
            head |= HAS_OLD_PERIOD | ((period as u32 as u64) << 32);
        }
        [
            head,
            encode_ptr(self.data),
            encode_ptr(self.new_data),
            (self.pos as u32 as u64) | ((self.length as u32 as u64) << 32),
            self.new_length as u32 as u64,
            self.d_phase.to_bits(),
            self.d_delta.to_bits(),
            self.d_old_scope_delta.to_bits(),
        ]
    }

    fn decode(words: [u64; WORDS]) -> Self {
        let head = words[0];
        Self {
            active: head & 1 != 0,
            volume: (head >> 8) as u8,
            old_period: (head & HAS_OLD_PERIOD != 0).then_some((head >> 32) as u32 as i32),
            data: decode_ptr(words[1]),
            new_data: decode_ptr(words[2]),
            pos: words[3] as u32 as i32,
            length: (words[3] >> 32) as u32 as i32,
            new_length: words[4] as u32 as i32,
            d_phase: f64::from_bits(words[5]),
            d_delta: f64::from_bits(words[6]),
            d_old_scope_delta: f64::from_bits(words[7]),
        }
    }
}

const WORDS: usize = 8;
const HAS_OLD_PERIOD: u64 = 1 << 1;
// `usize::MAX` is never a valid arena offset, so it doubles as "no sample"
const NO_PTR: u64 = u64::MAX;

#[inline]
fn encode_ptr(ptr: Option<usize>) -> u64 {
    ptr.map_or(NO_PTR, |p| p as u64)
}

#[inline]
fn decode_ptr(word: u64) -> Option<usize> {
    (word != NO_PTR).then_some(word as usize)
}

/// Read-only sample walk produced by [`VoiceState::cursor`]
///
/// Never ends; bound it with `take`. A voice without data yields silence.
#[derive(Debug, Clone)]
pub struct SampleCursor<'a> {
    arena: &'a SampleArena,
    data: Option<usize>,
    pos: i32,
    length: i32,
    new_data: Option<usize>,
    new_length: i32,
}

impl Iterator for SampleCursor<'_> {
    type Item = i8;

    #[inline]
    fn next(&mut self) -> Option<i8> {
        let sample = match (self.data, usize::try_from(self.pos)) {
            (Some(base), Ok(pos)) => base
                .checked_add(pos)
                .map_or(0, |addr| self.arena.read(addr)),
            _ => 0,
        };

        self.pos += 1;
        if self.pos >= self.length {
            // Region done, continue where the DMA would reload from
            self.pos = 0;
            self.data = self.new_data;
            self.length = self.new_length;
        }

        Some(sample)
    }
}

/// Live, shared record of one voice
#[derive(Debug)]
pub struct VoiceSlot {
    /// Even: stable. Odd: a write is in progress.
    seq: AtomicU32,
    words: [AtomicU64; WORDS],
    /// GUI-owned: the idle placeholder is already on screen
    empty_scope_drawn: AtomicBool,
}

impl Default for VoiceSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceSlot {
    /// Create an inactive voice.
    pub fn new() -> Self {
        let words = VoiceState::default().encode();
        Self {
            seq: AtomicU32::new(0),
            words: words.map(AtomicU64::new),
            empty_scope_drawn: AtomicBool::new(false),
        }
    }

    /// Take a consistent copy of the record.
    #[inline]
    pub fn load(&self) -> VoiceState {
        self.load_versioned().1
    }

    /// Take a consistent copy together with the version it was read at.
    ///
    /// Pass the version to [`commit_if_unchanged`](Self::commit_if_unchanged).
    pub fn load_versioned(&self) -> (u32, VoiceState) {
        let mut backoff = Backoff::new();
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 0 {
                let words = self.read_words();
                fence(Ordering::Acquire);
                if self.seq.load(Ordering::Relaxed) == before {
                    return (before, VoiceState::decode(words));
                }
            }
            backoff.snooze();
        }
    }

    /// Replace the whole record.
    pub fn store(&self, state: &VoiceState) {
        let version = self.lock();
        self.write_words(state.encode());
        self.unlock(version);
    }

    /// Read-modify-write the record as one write.
    ///
    /// Writers exclude each other. A writer that finds the slot mid-write
    /// spins, then yields until the other write finishes. That write is a
    /// handful of stores, but if its thread is preempted in between, the
    /// waiting thread (the mixer, for a register poke) waits until it runs
    /// again. Readers never wait on writers this way.
    pub fn update<R>(&self, f: impl FnOnce(&mut VoiceState) -> R) -> R {
        let version = self.lock();
        let mut state = VoiceState::decode(self.read_words());
        let result = f(&mut state);
        self.write_words(state.encode());
        self.unlock(version);
        result
    }

    /// Write `state` back only if nobody wrote the slot since `version`.
    ///
    /// Returns `false` and leaves the slot untouched when a newer write (a
    /// trigger, a stop, a register poke) got there first; the caller's copy
    /// is stale and is dropped.
    pub fn commit_if_unchanged(&self, version: u32, state: &VoiceState) -> bool {
        if self
            .seq
            .compare_exchange(
                version,
                version.wrapping_add(1),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_err()
        {
            return false;
        }
        fence(Ordering::Release);
        self.write_words(state.encode());
        self.unlock(version);
        true
    }

    /// Whether the idle placeholder is already drawn.
    #[inline]
    pub fn empty_scope_drawn(&self) -> bool {
        self.empty_scope_drawn.load(Ordering::Relaxed)
    }

    /// Record whether the idle placeholder is on screen.
    #[inline]
    pub fn set_empty_scope_drawn(&self, drawn: bool) {
        self.empty_scope_drawn.store(drawn, Ordering::Relaxed);
    }

    fn lock(&self) -> u32 {
        let mut backoff = Backoff::new();
        loop {
            let current = self.seq.load(Ordering::Relaxed);
            if current & 1 == 0
                && self
                    .seq
                    .compare_exchange_weak(
                        current,
                        current.wrapping_add(1),
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    )
                    .is_ok()
            {
                fence(Ordering::Release);
                return current;
            }
            backoff.snooze();
        }
    }

    #[inline]
    fn unlock(&self, version: u32) {
        self.seq.store(version.wrapping_add(2), Ordering::Release);
    }

    #[inline]
    fn read_words(&self) -> [u64; WORDS] {
        std::array::from_fn(|i| self.words[i].load(Ordering::Relaxed))
    }

    #[inline]
    fn write_words(&self, words: [u64; WORDS]) {
        for (slot, word) in self.words.iter().zip(words) {
            slot.store(word, Ordering::Relaxed);
        }
    }
}
