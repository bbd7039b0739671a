//! Pig Slash - a reflex slashing mini-game
//!
//! Core modules:
//! - `sim`: Deterministic game core (stroke geometry, rounds, scoring)
//! - `settings`: Difficulty tiers and persisted preferences
//!
//! Rendering and raw event capture live in the platform driver (`main.rs`);
//! the sim never touches the DOM.

pub mod settings;
pub mod sim;

pub use settings::{Difficulty, Settings};

/// Game tuning constants
pub mod consts {
    /// Minimum interval between sampled stroke points
    pub const STROKE_THROTTLE_MS: f64 = 30.0;

    /// Keep-out border when placing targets inside the arena
    pub const SPAWN_MARGIN: f32 = 16.0;
    /// Target bounding box size
    pub const TARGET_WIDTH: f32 = 80.0;
    pub const TARGET_HEIGHT: f32 = 80.0;
    /// Targets per round (inclusive bounds)
    pub const MIN_TARGETS: u32 = 1;
    pub const MAX_TARGETS: u32 = 5;
    /// Placement retries before an overlapping spot is accepted as-is
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 32;

    /// Countdown display update period
    pub const COUNTDOWN_TICK_MS: f64 = 100.0;
    /// Pause between a round resolving and the next spawn
    pub const SETTLE_DELAY_MS: f64 = 50.0;

    /// Lifetime of the cosmetic hit overlay
    pub const HIT_EFFECT_MS: i32 = 800;
}
