//! Paula Hardware Constants
//!
//! Shared constants used across the scope components: chip clocks, the
//! scope update rate, VU-meter scaling and the default on-screen geometry.

/// Number of Paula audio voices. Fixed by the hardware.
pub const AMIGA_VOICES: usize = 4;

/// PAL colour clock feeding Paula's period counters (Hz).
pub const PAULA_PAL_CLK: f64 = 3_546_895.0;

/// Scope update rate (Hz). Matches the display's vertical refresh.
pub const SCOPE_HZ: u32 = 64;

/// Number of sample slots in the arena (ProTracker samples 1-31).
pub const SAMPLE_SLOTS: usize = 31;

/// Default size of one sample slot in bytes (ProTracker 2.3 maximum).
pub const DEFAULT_MAX_SAMPLE_LENGTH: u32 = 0x1FFFE;

/// Default size of the reserved silent region placed after the slots.
pub const DEFAULT_RESERVED_SAMPLE_LENGTH: u32 = 0x20000;

/// Smallest region length a voice may play, in bytes.
pub const MIN_REGION_LENGTH: i32 = 2;

/// Highest volume register value.
pub const MAX_VOLUME: u8 = 64;

/// Tallest VU bar in pixels.
pub const VU_MAX_HEIGHT: u8 = 48;

/// Amount every VU bar sinks per scope tick.
pub const VU_DECAY_STEP: u8 = 4;

/// Maps an average of `|sample * volume|` onto the VU bar height.
///
/// A full-scale sample (128) at full volume (64) averages to 96 pixels before
/// the clamp to [`VU_MAX_HEIGHT`].
pub const VU_NORMALIZE: f64 = 96.0 / (128.0 * 64.0);

/// Right shift applied to `sample * -(volume << 7)` to land in scope rows.
pub const SCOPE_SAMPLE_SHIFT: u32 = 16;

/// Default scope strip geometry (matching the ProTracker main screen).
pub mod layout {
    /// X coordinate of the first channel's strip.
    pub const SCOPE_X: usize = 128;
    /// Y coordinate of the strips' top row.
    pub const SCOPE_Y: usize = 55;
    /// Strip width in pixels (one sample per column).
    pub const SCOPE_WIDTH: usize = 40;
    /// Strip height in pixels.
    pub const SCOPE_HEIGHT: usize = 33;
    /// Horizontal gap between two neighbouring strips.
    pub const SCOPE_SPACING: usize = 8;
    /// Width of the screen the strips are drawn into.
    pub const SCREEN_W: usize = 320;
}
