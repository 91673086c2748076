//! Tank Battle - grid-based tank combat simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (level, tanks, bullets, power-ups, AI, game loop)
//! - `tuning`: Data-driven game balance
//! - `error`: Configuration errors
//!
//! The simulation is presentation-agnostic. It reads intents through
//! [`sim::InputSource`] and publishes [`sim::GameEvent`]s; rendering, audio and
//! UI live outside this crate.

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::TuningError;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal tick length (60 Hz frame)
    pub const SIM_DT_MS: u32 = 16;
    /// Hard cap on a single tick's elapsed time (a stalled frame must not fire every timer at once)
    pub const MAX_TICK_MS: u32 = 250;
    /// Size of one grid cell in world units
    pub const CELL_SIZE: f32 = 1.0;
}

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.sin().atan2(angle.cos());
    // atan2 can return -π for inputs on the negative real axis
    if wrapped <= -std::f32::consts::PI {
        std::f32::consts::PI
    } else {
        wrapped
    }
}

/// Unit forward vector on the X/Z plane for a body rotation (0 faces +Z)
#[inline]
pub fn forward_vector(rotation: f32) -> Vec2 {
    Vec2::new(rotation.sin(), rotation.cos())
}

/// Rotation that faces along `dir` (inverse of [`forward_vector`])
#[inline]
pub fn heading_of(dir: Vec2) -> f32 {
    dir.x.atan2(dir.y)
}
