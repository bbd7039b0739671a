//! Round and session state
//!
//! Everything the controller mutates lives here. The driver observes through
//! drained [`GameEvent`]s and never writes back into the core.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::geometry::Rect;
use crate::settings::Difficulty;

/// Identifier for a spawned target, unique within a session.
pub type TargetId = u32;

/// Playfield dimensions, in the same coordinate space as strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

/// A spawned, eliminable pig. `alive` flips to false at most once; the
/// target list is discarded with its round, so no target outlives one.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub id: TargetId,
    pub rect: Rect,
    pub alive: bool,
}

/// The one-shot round deadline plus the periodic countdown tick, owned by
/// the live round.
///
/// Both are cancelled together on every resolution path, and `tick` checks
/// `armed` before acting, so a stale deadline can never fire after its round
/// resolved.
#[derive(Debug, Clone, Copy)]
pub struct RoundTimer {
    pub deadline_at: f64,
    pub next_tick_at: f64,
    armed: bool,
}

impl RoundTimer {
    pub fn arm(now_ms: f64, duration_ms: f64) -> Self {
        Self {
            deadline_at: now_ms + duration_ms,
            // First countdown emission happens on the next frame
            next_tick_at: now_ms,
            armed: true,
        }
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn armed(&self) -> bool {
        self.armed
    }
}

/// One spawn-to-resolution cycle.
#[derive(Debug, Clone)]
pub struct Round {
    pub targets: Vec<Target>,
    pub kill_count: u32,
    pub started_at: f64,
    pub duration_ms: f64,
    pub timer: RoundTimer,
}

impl Round {
    /// Remaining time on the round clock, clamped at zero.
    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        (self.started_at + self.duration_ms - now_ms).max(0.0)
    }

    /// All targets down. False for an empty list, which spawn never produces.
    pub fn cleared(&self) -> bool {
        !self.targets.is_empty() && self.kill_count >= self.targets.len() as u32
    }
}

/// Cumulative score/miss state spanning all rounds since session start.
/// Mutated only by the round controller at resolution.
#[derive(Debug, Clone)]
pub struct Session {
    pub score: u64,
    pub miss_count: u32,
    pub difficulty: Difficulty,
}

impl Session {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            score: 0,
            miss_count: 0,
            difficulty,
        }
    }
}

/// Controller phase. Spawning and resolving are instantaneous; only these
/// states persist between callbacks. There is no terminal phase: the game
/// is endless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundPhase {
    /// Session not started (difficulty screen up)
    Idle,
    /// A round is live and accepting strokes
    Active,
    /// Post-resolution pause before the next spawn
    Settling { until: f64 },
}

/// Observational events for the driver (target visuals, HUD, effects).
/// Nothing feeds back into the core.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RoundStarted { targets: Vec<Target> },
    TargetHit { id: TargetId, rect: Rect },
    ScoreChanged { score: u64 },
    MissCountChanged { miss_count: u32 },
    CountdownTick { remaining_ms: f64 },
    RoundResolved { success: bool, kills: u32 },
}

/// Complete game state. Deterministic given the seed and the driver's
/// timestamp/stroke sequence.
#[derive(Debug)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub arena: Arena,
    pub phase: RoundPhase,
    pub round: Option<Round>,
    pub session: Session,
    next_id: TargetId,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64, arena: Arena) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            arena,
            phase: RoundPhase::Idle,
            round: None,
            session: Session::new(Difficulty::default()),
            next_id: 1,
            events: Vec::new(),
        }
    }

    /// Allocate a target id.
    pub(crate) fn next_target_id(&mut self) -> TargetId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The driver resized the playfield. Applies from the next spawn on.
    pub fn set_arena(&mut self, arena: Arena) {
        self.arena = arena;
    }

    /// Refresh a target's bounding box from the rendering collaborator
    /// (layout may have shifted since spawn). No-op for unknown or dead
    /// targets.
    pub fn update_target_rect(&mut self, id: TargetId, rect: Rect) {
        if let Some(round) = &mut self.round {
            if let Some(target) = round.targets.iter_mut().find(|t| t.id == id && t.alive) {
                target.rect = rect;
            }
        }
    }

    /// Take all events accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
