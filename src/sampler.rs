//! Sampler-screen read position
//!
//! The sample editor draws a play cursor over the sample being edited. A
//! voice only knows which region of the arena it is fetching from (and that
//! region may be the loop part, or already another sample after a swap), so
//! the absolute position has to be worked out from the read address.

use crate::bank::ScopeBank;
use serde::{Deserialize, Serialize};

/// Where a sample lives in the arena and how it loops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInfo {
    /// Arena offset of the first byte
    pub offset: usize,
    /// Length in bytes
    pub length: i32,
    /// Loop start in bytes, relative to `offset`
    pub loop_start: i32,
    /// Loop length in bytes
    pub loop_length: i32,
}

impl SampleInfo {
    /// Whether the sample has a real loop (not the 2-byte idle loop).
    pub fn loop_enabled(&self) -> bool {
        self.loop_start + self.loop_length > 2
    }
}

impl ScopeBank {
    /// Absolute position of voice `ch` inside sample `current_sample`.
    ///
    /// `None` when the voice is idle, plays a different sample, sits in the
    /// idle loop of a non-looping sample, or the position falls outside the
    /// sample.
    pub fn sample_read_pos(
        &self,
        ch: usize,
        current_sample: usize,
        sample: &SampleInfo,
    ) -> Option<i32> {
        let voice = self.slots().get(ch)?.load();
        if !voice.active {
            return None;
        }
        let data = voice.data?;

        if self.arena().slot_of(Some(data))? != current_sample {
            return None;
        }

        // No loop: a 2-byte region is the idle loop after the one-shot ended
        if !sample.loop_enabled() && voice.length == 2 {
            return None;
        }

        let read_address = data as i64 + voice.pos as i64;
        let real_pos = read_address - sample.offset as i64;
        if real_pos < 0 || real_pos >= sample.length as i64 {
            return None;
        }

        Some(real_pos as i32)
    }
}
