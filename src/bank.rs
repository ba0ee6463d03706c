//! The four voice records
//!
//! [`ScopeBank`] owns the live [`VoiceSlot`]s, the VU level array and the two
//! busy flags. It is shared (behind an `Arc`) between the mixer, the scope
//! thread and the GUI; every method takes `&self` and none of them locks.
//!
//! The mixer-facing setters mirror the Paula registers: `set_data`/
//! `set_length` latch the next region, `set_period`/`set_volume` change
//! timing and level, and `trigger` restarts DMA.

use crate::arena::SampleArena;
use crate::config::ScopeConfig;
use crate::constants::{AMIGA_VOICES, MAX_VOLUME, MIN_REGION_LENGTH};
use crate::sync::BusyFlag;
use crate::voice::{VoiceSlot, VoiceState};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Shared scope state for all four voices
#[derive(Debug)]
pub struct ScopeBank {
    slots: [VoiceSlot; AMIGA_VOICES],
    arena: Arc<SampleArena>,
    /// `clock / scope_hz`
    delta_div: f64,
    vu_levels: [AtomicU8; AMIGA_VOICES],
    updating: BusyFlag,
    displaying: BusyFlag,
}

impl ScopeBank {
    /// Create a bank of inactive voices reading from `arena`.
    ///
    /// `delta_div` is the reference clock divided by the scope rate.
    pub fn new(arena: Arc<SampleArena>, delta_div: f64) -> Self {
        Self {
            slots: std::array::from_fn(|_| VoiceSlot::new()),
            arena,
            delta_div,
            vu_levels: std::array::from_fn(|_| AtomicU8::new(0)),
            updating: BusyFlag::new(),
            displaying: BusyFlag::new(),
        }
    }

    /// Create a bank and its arena from the configuration.
    pub fn from_config(config: &ScopeConfig) -> Self {
        Self::new(
            Arc::new(SampleArena::from_config(config)),
            config.period_to_delta_div(),
        )
    }

    /// The sample memory the voices point into.
    pub fn arena(&self) -> &Arc<SampleArena> {
        &self.arena
    }

    /// All live voice records.
    pub fn slots(&self) -> &[VoiceSlot; AMIGA_VOICES] {
        &self.slots
    }

    /// Live record of one voice.
    ///
    /// # Panics
    /// If `ch` is not below [`AMIGA_VOICES`].
    pub fn slot(&self, ch: usize) -> &VoiceSlot {
        &self.slots[ch]
    }

    /// Snapshot of one voice.
    ///
    /// # Panics
    /// If `ch` is not below [`AMIGA_VOICES`].
    pub fn voice(&self, ch: usize) -> VoiceState {
        self.slots[ch].load()
    }

    /// Snapshot of every voice (each copied consistently, not all at once).
    pub fn voices(&self) -> [VoiceState; AMIGA_VOICES] {
        std::array::from_fn(|ch| self.slots[ch].load())
    }

    /// Set the voice's timing from a Paula period.
    ///
    /// Repeating the previous period reuses the cached delta. Returns the
    /// delta in effect, or `None` for an unknown channel.
    pub fn set_period(&self, ch: usize, period: i32) -> Option<f64> {
        let div = self.delta_div;
        self.slots
            .get(ch)
            .map(|slot| slot.update(|v| v.apply_period(period, div)))
    }

    /// Set the volume register (clamped to 0-64).
    pub fn set_volume(&self, ch: usize, volume: u8) {
        if let Some(slot) = self.slots.get(ch) {
            slot.update(|v| v.volume = volume.min(MAX_VOLUME));
        }
    }

    /// Latch the start of the next region. `None` means "no sample", and so
    /// does an offset outside the arena.
    pub fn set_data(&self, ch: usize, data: Option<usize>) {
        let data = self.in_arena(data);
        if let Some(slot) = self.slots.get(ch) {
            slot.update(|v| v.new_data = data);
        }
    }

    /// Latch the length (in bytes) of the next region. Lengths below 2 are
    /// raised to 2.
    pub fn set_length(&self, ch: usize, length: i32) {
        let length = length.max(MIN_REGION_LENGTH);
        if let Some(slot) = self.slots.get(ch) {
            slot.update(|v| v.new_length = length);
        }
    }

    /// Restart DMA on a voice.
    ///
    /// `data == None` (or an offset outside the arena) plays the arena's
    /// reserved silent region. Lengths below 2 are raised to 2. The voice
    /// ends up active at position 0.
    pub fn trigger(&self, ch: usize, data: Option<usize>, length: i32) {
        let Some(slot) = self.slots.get(ch) else {
            return;
        };
        let data = self
            .in_arena(data)
            .unwrap_or_else(|| self.arena.reserved_offset());
        slot.update(|v| v.trigger(data, length));
    }

    #[inline]
    fn in_arena(&self, data: Option<usize>) -> Option<usize> {
        data.filter(|&offset| offset < self.arena.len())
    }

    /// Silence one voice's scope.
    ///
    /// Waits for an in-flight position update before clearing `active` and
    /// for an in-flight draw afterwards.
    pub fn stop_voice(&self, ch: usize) {
        let Some(slot) = self.slots.get(ch) else {
            return;
        };
        self.updating.wait_idle();
        slot.update(|v| v.active = false);
        self.displaying.wait_idle();
    }

    /// Silence every voice's scope.
    pub fn stop_all(&self) {
        self.updating.wait_idle();
        for slot in &self.slots {
            slot.update(|v| v.active = false);
        }
        self.displaying.wait_idle();
        log::debug!("all scopes stopped");
    }

    /// Drop every voice's cached period conversion.
    pub fn reset_period_cache(&self) {
        for slot in &self.slots {
            slot.update(VoiceState::reset_period_cache);
        }
    }

    /// Current VU bar heights (0-48).
    pub fn vu_levels(&self) -> [u8; AMIGA_VOICES] {
        std::array::from_fn(|ch| self.vu_levels[ch].load(Ordering::Relaxed))
    }

    pub(crate) fn vu_cells(&self) -> &[AtomicU8; AMIGA_VOICES] {
        &self.vu_levels
    }

    /// Set while the scope thread is advancing positions.
    pub fn updating(&self) -> &BusyFlag {
        &self.updating
    }

    /// Set while the GUI is drawing the scopes.
    pub fn displaying(&self) -> &BusyFlag {
        &self.displaying
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bank() -> ScopeBank {
        ScopeBank::new(Arc::new(SampleArena::new(256, 128)), 1000.0)
    }

    #[test]
    fn test_trigger_postconditions() {
        let bank = bank();
        for (ch, length) in [(0, 0), (1, 1), (2, -40), (3, 300)] {
            bank.slot(ch).update(|v| {
                v.pos = 77;
                v.d_phase = 0.9;
            });
            bank.trigger(ch, Some(bank.arena().slot_offset(ch)), length);

            let v = bank.voice(ch);
            assert!(v.active);
            assert_eq!(v.pos, 0);
            assert_eq!(v.d_phase, 0.0);
            assert!(v.length >= 2);
        }
        assert_eq!(bank.voice(3).length, 300);
    }

    #[test]
    fn test_trigger_without_data_uses_reserved_region() {
        let bank = bank();
        bank.trigger(1, None, 64);
        assert_eq!(bank.voice(1).data, Some(bank.arena().reserved_offset()));
    }

    #[test]
    fn test_set_period_caches_per_voice() {
        let bank = bank();
        assert_relative_eq!(bank.set_period(0, 250).unwrap(), 4.0);
        assert_relative_eq!(bank.set_period(1, 500).unwrap(), 2.0);
        assert_eq!(bank.voice(0).old_period, Some(250));
        assert_eq!(bank.voice(1).old_period, Some(500));
        assert_eq!(bank.set_period(9, 250), None);
    }

    #[test]
    fn test_reset_period_cache_clears_all() {
        let bank = bank();
        for ch in 0..AMIGA_VOICES {
            bank.set_period(ch, 428);
        }
        bank.reset_period_cache();
        assert!(bank.voices().iter().all(|v| v.old_period.is_none()));
        // Delta in effect is untouched until the next period write
        assert_relative_eq!(bank.voice(0).d_delta, 1000.0 / 428.0);
    }

    #[test]
    fn test_volume_clamped() {
        let bank = bank();
        bank.set_volume(0, 200);
        assert_eq!(bank.voice(0).volume, 64);
    }

    #[test]
    fn test_latched_region_survives_until_swap() {
        let bank = bank();
        bank.trigger(0, Some(0), 10);
        bank.set_data(0, Some(256));
        bank.set_length(0, 4);

        let v = bank.voice(0);
        assert_eq!(v.data, Some(0));
        assert_eq!(v.length, 10);
        assert_eq!(v.new_data, Some(256));
        assert_eq!(v.new_length, 4);
    }

    #[test]
    fn test_set_length_clamps_latched_length() {
        let bank = bank();
        bank.trigger(0, Some(0), 16);
        bank.set_length(0, 0);
        assert_eq!(bank.voice(0).new_length, 2);
        bank.set_length(0, -100);
        assert_eq!(bank.voice(0).new_length, 2);
    }

    #[test]
    fn test_zero_length_reload_keeps_position_bounded() {
        // Period 1 fetches 50000 bytes per tick, far more than any region
        let bank = ScopeBank::new(Arc::new(SampleArena::new(256, 128)), 50_000.0);
        bank.set_period(0, 1);
        bank.trigger(0, Some(0), 16);
        bank.set_length(0, 0);

        for _ in 0..50_000 {
            bank.update_positions();
            let v = bank.voice(0);
            assert!(v.pos >= 0 && v.pos < v.length, "pos {} length {}", v.pos, v.length);
        }
        assert_eq!(bank.voice(0).length, 2);
    }

    #[test]
    fn test_offsets_outside_arena_are_rejected() {
        let bank = bank();
        let len = bank.arena().len();

        bank.trigger(0, Some(len), 32);
        assert_eq!(bank.voice(0).data, Some(bank.arena().reserved_offset()));

        bank.trigger(1, Some(usize::MAX), 32);
        assert_eq!(bank.voice(1).data, Some(bank.arena().reserved_offset()));

        bank.set_data(1, Some(usize::MAX));
        assert_eq!(bank.voice(1).new_data, None);
        bank.set_data(1, Some(len - 1));
        assert_eq!(bank.voice(1).new_data, Some(len - 1));
    }

    #[test]
    fn test_stop_voice_and_stop_all() {
        let bank = bank();
        for ch in 0..AMIGA_VOICES {
            bank.trigger(ch, Some(0), 8);
        }
        bank.stop_voice(2);
        assert!(!bank.voice(2).active);
        assert!(bank.voice(1).active);

        bank.stop_all();
        assert!(bank.voices().iter().all(|v| !v.active));
    }

    #[test]
    fn test_unknown_channel_is_ignored() {
        let bank = bank();
        bank.trigger(4, None, 10);
        bank.set_volume(7, 10);
        bank.stop_voice(4);
        assert!(bank.voices().iter().all(|v| !v.active));
    }
}
