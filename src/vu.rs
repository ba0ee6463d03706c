//! VU-meter estimator
//!
//! Reads the samples each voice will fetch during the coming tick and turns
//! their average absolute amplitude into a bar height. This is steadier than
//! peaks taken from the mixer output and ignores filtering entirely.
//!
//! Bars sink by a fixed step every tick and are pushed back up whenever a
//! voice measures louder than what is shown (peak hold).

use crate::arena::SampleArena;
use crate::bank::ScopeBank;
use crate::constants::{VU_DECAY_STEP, VU_MAX_HEIGHT, VU_NORMALIZE};
use crate::voice::VoiceState;
use std::sync::atomic::Ordering;

/// Bar height after one tick of sinking.
#[inline]
pub fn decay(level: u8) -> u8 {
    level.saturating_sub(VU_DECAY_STEP)
}

/// Bar height for the samples `voice` fetches in one tick.
///
/// `None` when the voice is silent, inactive, or fetches less than one whole
/// sample per tick. Slow voices are left out rather than measured on a
/// single sample.
pub fn measure_level(voice: &VoiceState, arena: &SampleArena) -> Option<u8> {
    if !voice.is_audible() {
        return None;
    }

    let samples_to_scan = voice.d_delta as i32;
    if samples_to_scan <= 0 {
        return None;
    }

    let volume = voice.volume as i32;
    let running_amplitude: u64 = voice
        .cursor(arena)
        .take(samples_to_scan as usize)
        .map(|sample| (sample as i32 * volume).unsigned_abs() as u64)
        .sum();

    let avg_amplitude = running_amplitude as f64 / samples_to_scan as f64 * VU_NORMALIZE;
    let height = ((avg_amplitude + 0.5) as u32).min(VU_MAX_HEIGHT as u32);
    Some(height as u8)
}

impl ScopeBank {
    /// Sink every bar, then raise each to its voice's measured level.
    ///
    /// Called from the scope thread only.
    pub fn update_vu_meters(&self) {
        let cells = self.vu_cells();

        for cell in cells {
            let level = cell.load(Ordering::Relaxed);
            cell.store(decay(level), Ordering::Relaxed);
        }

        for (slot, cell) in self.slots().iter().zip(cells) {
            let voice = slot.load();
            let Some(height) = measure_level(&voice, self.arena()) else {
                continue;
            };
            if height > cell.load(Ordering::Relaxed) {
                cell.store(height, Ordering::Relaxed);
            }
        }
    }
}
