//! Period -> delta conversion with a one-entry cache
//!
//! Paula timing is given as a period (colour clocks per sample). The scopes
//! need the number of samples fetched per scope tick instead. Notes mostly
//! repeat the previous pitch, so each voice remembers the last period it
//! converted and skips the division when it sees it again.

use crate::voice::VoiceState;

/// Samples per scope tick for `period`.
///
/// `div` is `clock / scope_hz`. Periods below 1 are treated as 1.
#[inline]
pub fn period_to_delta(div: f64, period: i32) -> f64 {
    div / period.max(1) as f64
}

impl VoiceState {
    /// Set the voice's per-tick delta from a period.
    ///
    /// Returns the delta now in effect.
    pub fn apply_period(&mut self, period: i32, div: f64) -> f64 {
        if self.old_period != Some(period) {
            self.old_period = Some(period);
            self.d_old_scope_delta = period_to_delta(div, period);
        }

        self.d_delta = self.d_old_scope_delta;
        self.d_delta
    }

    /// Forget the cached conversion so the next period is recomputed.
    pub fn reset_period_cache(&mut self) {
        self.old_period = None;
        self.d_old_scope_delta = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PAULA_PAL_CLK, SCOPE_HZ};
    use approx::assert_relative_eq;

    const DIV: f64 = PAULA_PAL_CLK / SCOPE_HZ as f64;

    #[test]
    fn test_delta_for_c2() {
        // Period 428 is ProTracker's C-2
        let delta = period_to_delta(DIV, 428);
        assert_relative_eq!(delta, 3_546_895.0 / 64.0 / 428.0);
        assert!(delta > 129.0 && delta < 130.0);
    }

    #[test]
    fn test_cache_miss_computes_k_over_p() {
        let mut voice = VoiceState::default();
        assert_relative_eq!(voice.apply_period(428, DIV), DIV / 428.0);
        assert_relative_eq!(voice.apply_period(214, DIV), DIV / 214.0);
        assert_eq!(voice.old_period, Some(214));
    }

    #[test]
    fn test_cache_hit_reuses_cached_delta() {
        let mut voice = VoiceState::default();
        let first = voice.apply_period(300, DIV);

        // A hit must not recompute: a poisoned cache value shows through
        voice.d_old_scope_delta = 42.0;
        assert_eq!(voice.apply_period(300, DIV), 42.0);
        assert_eq!(voice.d_delta, 42.0);
        assert_ne!(first, 42.0);
    }

    #[test]
    fn test_reset_forces_recompute() {
        let mut voice = VoiceState::default();
        voice.apply_period(300, DIV);
        voice.d_old_scope_delta = 42.0;
        voice.reset_period_cache();
        assert_relative_eq!(voice.apply_period(300, DIV), DIV / 300.0);
    }

    #[test]
    fn test_degenerate_periods_clamp_to_one() {
        let mut voice = VoiceState::default();
        assert_relative_eq!(voice.apply_period(0, DIV), DIV);
        assert_relative_eq!(voice.apply_period(-7, DIV), DIV);
    }
}
