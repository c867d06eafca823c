//! Purrkour - an endless side-scrolling cat runner
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (terrain, entities, collisions, spawning,
//!   progression director, scripted setpieces)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences (speed preset, screen shake)
//!
//! Rendering, audio and input wiring are external collaborators: they read
//! the state produced by [`sim::tick`] and push intents through
//! [`sim::TickInput`].

pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{Settings, SpeedPreset};
pub use tuning::{SpawnTuning, Tuning};

/// Game configuration constants
pub mod consts {
    /// Host animation callback rate the frame counters are tuned for
    pub const FRAMES_PER_SECOND: u32 = 60;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 58.0;
    pub const PLAYER_BASE_X: f32 = 110.0;
    pub const PLAYER_MIN_X: f32 = 70.0;
    pub const PLAYER_MAX_X: f32 = 210.0;
    pub const BASE_MAX_JUMPS: u8 = 2;
    pub const TRIPLE_MAX_JUMPS: u8 = 3;

    /// Per-frame gravitational acceleration (pixels/frame²)
    pub const GRAVITY: f32 = 0.34;
    /// Upward velocity applied by a jump (negative = up)
    pub const JUMP_VELOCITY: f32 = -9.0;
    /// Jump boost while catnip is active
    pub const CATNIP_JUMP_BOOST: f32 = 1.08;
    /// Gravity multiplier while catnip is active
    pub const CATNIP_GRAVITY: f32 = 0.95;
    /// World scroll multiplier while catnip is active
    pub const CATNIP_SPEED: f32 = 0.82;

    /// Largest world-scroll distance resolved in one collision substep
    pub const MAX_SUBSTEP: f32 = 4.0;

    /// Timer lengths (frames)
    pub const INVULN_FRAMES: u32 = 90;
    pub const SLOW_FRAMES: u32 = 180;
    pub const CATNIP_FRAMES: u32 = 320;
    pub const TRIPLE_JUMP_FRAMES: u32 = 320;
    pub const CHASE_FRAMES: u32 = 360;
    pub const BARK_INTERVAL: u32 = 55;
    pub const CHECKPOINT_GLOW_FRAMES: u32 = 120;
    pub const CHECKPOINT_SAVE_GLOW_FRAMES: u32 = 90;
    pub const LIFE_PULSE_FRAMES: u32 = 60;
    pub const SAFE_AFTER_CHECKPOINT: u32 = 180;

    /// Slow multiplier applied by yarn
    pub const SLOW_STRENGTH: f32 = 0.65;
    /// Permanent speed bump per mouse
    pub const MOUSE_SPEED_BUMP: f32 = 0.010;

    /// Entities further left than this are dropped
    pub const CLEANUP_X: f32 = -260.0;

    /// Default viewport (portrait phone)
    pub const DEFAULT_VIEWPORT_W: f32 = 360.0;
    pub const DEFAULT_VIEWPORT_H: f32 = 640.0;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep on a clamped `t`
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Quadratic ease-in-out on a clamped `t`
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        // Clamped outside [0, 1]
        assert_eq!(smoothstep(-3.0), 0.0);
        assert_eq!(smoothstep(7.0), 1.0);
    }

    #[test]
    fn test_ease_in_out_is_monotonic() {
        let mut prev = ease_in_out(0.0);
        for i in 1..=100 {
            let v = ease_in_out(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
        assert!((prev - 1.0).abs() < 1e-6);
    }
}
