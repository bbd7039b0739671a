//! Deterministic game core
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Seeded RNG only
//! - Timestamps supplied by the driver
//! - No rendering or platform dependencies

pub mod geometry;
pub mod score;
pub mod state;
pub mod stroke;
pub mod tick;

pub use geometry::{Rect, seg_seg_intersect, slash_hits_rect};
pub use score::round_score;
pub use state::{
    Arena, GameEvent, GameState, Round, RoundPhase, RoundTimer, Session, Target, TargetId,
};
pub use stroke::{Stroke, StrokeSampler};
pub use tick::{spawn_round, start_session, submit_stroke, tick};
