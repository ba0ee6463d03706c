//! Paula Quadrascope and VU Meters
//!
//! Display-side state for a four-voice, Paula-style sample player. The scopes
//! follow each voice's read position with the same fractional period timing
//! the mixer uses, replay the chip's "reload from the latched registers when
//! the region runs out" behaviour, and derive two things for the GUI: a
//! waveform strip per channel and a decaying VU level per channel.
//!
//! Nothing here produces audio. The mixer pokes voice registers through
//! [`ScopeBank`], a dedicated thread ([`ScopeDriver`]) advances positions at
//! the display refresh rate, and the GUI draws with [`ScopeRenderer`] whenever
//! it repaints. None of these paths takes a lock: voice records are published
//! through a per-voice sequence lock (see [`voice::VoiceSlot`]).
//!
//! # Crate feature flags
//! - `renderer` (default): waveform strip renderer for caller-owned pixel buffers
//!
//! # Quick start
//! ```no_run
//! use std::sync::Arc;
//! use paula_scopes::{HostState, ScopeConfig, ScopeSystem};
//!
//! let system = ScopeSystem::new(ScopeConfig::default()).unwrap();
//! let host = Arc::new(HostState::new());
//!
//! // Mixer side: latch registers and start DMA on voice 0
//! let bank = system.bank();
//! let start = bank.arena().slot_offset(0);
//! bank.set_volume(0, 64);
//! bank.set_period(0, 428);
//! bank.trigger(0, Some(start), 2048);
//!
//! system.start(host.clone()).unwrap();
//! // GUI, once per repaint:
//! let mut pixels = vec![0u32; 320 * 200];
//! let mut target = paula_scopes::FrameBuffer::new(&mut pixels, 320);
//! system.renderer().draw(&bank, &mut target);
//! let _levels = system.vu_levels();
//!
//! system.shutdown();
//! ```

#![warn(missing_docs)]

pub mod arena; // Shared sample memory
pub mod bank; // The four voice records
pub mod config; // Configuration
pub mod constants; // Hardware constants
pub mod driver; // Periodic scope thread
pub mod period; // Period -> delta cache
pub mod sampler; // Sampler-screen read position helper
pub mod sync; // Back-off and busy flags
pub mod system; // Session-level facade
pub mod timing; // Fixed-rate frame timer
pub mod voice; // Voice snapshot and sequence lock
pub mod vu; // VU-meter estimator

mod advance;

#[cfg(feature = "renderer")]
pub mod render; // Waveform strips

/// Error types for the scope subsystem
///
/// Only setup and control-plane operations fail. The real-time paths clamp
/// degenerate input or return `None` instead.
#[derive(thiserror::Error, Debug)]
pub enum ScopeError {
    /// The scope thread could not be created
    #[error("Couldn't create scope thread: {0}")]
    ThreadSpawn(std::io::Error),

    /// The scope thread is already running
    #[error("Scope thread is already running")]
    AlreadyRunning,

    /// IO error while reading configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration text could not be parsed
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Result type for scope operations
pub type Result<T> = std::result::Result<T, ScopeError>;

// Public API exports
pub use arena::SampleArena;
pub use bank::ScopeBank;
pub use config::{ScopeConfig, ScopeLayout};
pub use constants::AMIGA_VOICES;
pub use driver::{HostState, ScopeDriver, ScopeHost};
pub use sampler::SampleInfo;
pub use system::ScopeSystem;
pub use timing::FrameTimer;
pub use voice::{VoiceSlot, VoiceState};

#[cfg(feature = "renderer")]
pub use render::{FrameBuffer, PixelTarget, ScopePalette, ScopeRenderer};
