//! Position advancer
//!
//! Follows Paula's fetch position once per scope tick and replays the DMA
//! reload (current region exhausted -> continue from the latched registers)
//! purely through bookkeeping. Sample bytes are never read here.

use crate::bank::ScopeBank;
use crate::constants::MIN_REGION_LENGTH;
use crate::voice::VoiceState;

impl VoiceState {
    /// Advance one scope tick.
    ///
    /// Assumes at most one region runs out per tick: the position is wrapped
    /// once against the old length and then folded into the new one. That
    /// holds as long as a tick fetches fewer bytes than the shortest region,
    /// i.e. the scope rate stays well above the highest playback rate divided
    /// by the minimum region length. Faster voices land on a plausible but
    /// not exact position after the swap.
    ///
    /// A latched length below 2 is taken as 2, so the position always ends
    /// up inside the region that is current after the swap.
    pub fn advance(&mut self) {
        self.d_phase += self.d_delta;

        let whole_samples = self.d_phase as i32;
        self.d_phase -= whole_samples as f64;
        self.pos += whole_samples;

        if self.pos >= self.length {
            self.pos -= self.length;

            self.length = self.new_length.max(MIN_REGION_LENGTH);
            if self.pos >= self.length {
                self.pos %= self.length;
            }

            self.data = self.new_data;
        }
    }
}

impl ScopeBank {
    /// Advance every active voice by one tick.
    ///
    /// A voice that was written by someone else while its copy was being
    /// advanced keeps that newer write; its advance for this tick is dropped.
    pub fn update_positions(&self) {
        let _busy = self.updating().enter();

        for slot in self.slots() {
            let (version, mut state) = slot.load_versioned();
            if !state.active {
                continue;
            }

            state.advance();
            slot.commit_if_unchanged(version, &state);
        }
    }
}
