//! The runner: gravity, jump charges, horizontal easing and animation

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use super::state::GameState;
use crate::consts::*;

/// Airborne animation frame; run-cycle frames are 0..4
pub const AIR_FRAME: u8 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub vy: f32,
    pub size: Vec2,
    pub base_x: f32,
    pub on_surface: bool,
    pub jumps_left: u8,
    pub max_jumps: u8,
    /// Frames since the run-cycle started
    pub anim_t: u32,
    pub frame: u8,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_BASE_X, 0.0),
            vy: 0.0,
            size: Vec2::splat(PLAYER_SIZE),
            base_x: PLAYER_BASE_X,
            on_surface: true,
            jumps_left: BASE_MAX_JUMPS,
            max_jumps: BASE_MAX_JUMPS,
            anim_t: 0,
            frame: 0,
        }
    }
}

impl Player {
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Box used for hazard and pickup contact
    pub fn hitbox(&self) -> Rect {
        self.rect().inset(12.0, 12.0, 12.0, 6.0)
    }

    /// Box pushed out of solids
    pub fn body_box(&self) -> Rect {
        self.rect().inset(10.0, 10.0, 10.0, 4.0)
    }

    /// Where speech bubbles anchor
    pub fn bubble_anchor(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.size.x * 0.55, self.pos.y - 8.0)
    }

    /// Spend a jump charge. Returns false when nothing happened.
    pub fn jump(&mut self, state: &GameState) -> bool {
        if state.finished || self.jumps_left == 0 {
            return false;
        }
        let boost = if state.timers.catnip > 0 {
            CATNIP_JUMP_BOOST
        } else {
            1.0
        };
        self.vy = JUMP_VELOCITY * boost;
        self.jumps_left -= 1;
        true
    }

    pub fn gravity_step(&mut self, state: &GameState) {
        let g = if state.timers.catnip > 0 {
            GRAVITY * CATNIP_GRAVITY
        } else {
            GRAVITY
        };
        self.vy += g;
        self.pos.y += self.vy;
    }

    /// Stand on the terrain at the base x with full charges
    pub fn reset_at(&mut self, surface_y: f32) {
        self.pos = Vec2::new(self.base_x, surface_y - self.size.y);
        self.vy = 0.0;
        self.on_surface = true;
        self.max_jumps = BASE_MAX_JUMPS;
        self.jumps_left = self.max_jumps;
    }

    /// Record this frame's surface contact; charges refill on touchdown
    pub fn settle(&mut self, on_surface: bool) {
        if on_surface && !self.on_surface {
            self.jumps_left = self.max_jumps;
        }
        self.on_surface = on_surface;
    }

    /// Charges shrink with the cap but never grow past it
    pub fn set_max_jumps(&mut self, max_jumps: u8) {
        self.max_jumps = max_jumps;
        self.jumps_left = self.jumps_left.min(max_jumps);
    }

    /// Keep the runner on screen, easing back toward its base x
    pub fn clamp_x(&mut self, viewport_w: f32) {
        let max_x = (viewport_w * 0.45).min(PLAYER_MAX_X).max(PLAYER_MIN_X);
        self.pos.x = self.pos.x.clamp(PLAYER_MIN_X, max_x);
        let target = self.base_x.clamp(PLAYER_MIN_X, max_x);
        if self.pos.x > target + 8.0 {
            self.pos.x += (target - self.pos.x) * 0.08;
        }
    }

    /// Advance the run cycle, faster at higher speed
    pub fn select_frame(&mut self, effective_speed: f32) {
        self.anim_t += 1;
        self.frame = if self.on_surface {
            let run_rate = (10.0 - effective_speed * 1.6).clamp(4.0, 10.0);
            ((self.anim_t as f32 / run_rate).floor() as u32 % 4) as u8
        } else {
            AIR_FRAME
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Viewport;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn state() -> GameState {
        GameState::new(1, &Tuning::default(), Viewport::default())
    }

    #[test]
    fn test_double_jump_then_no_op() {
        let state = state();
        let mut player = Player::default();
        player.reset_at(560.0);
        assert_eq!(player.jumps_left, 2);
        assert!(player.jump(&state));
        player.gravity_step(&state);
        player.settle(false);
        assert!(player.jump(&state));
        assert_eq!(player.jumps_left, 0);
        let vy = player.vy;
        assert!(!player.jump(&state));
        assert_eq!(player.jumps_left, 0);
        assert_eq!(player.vy, vy);
    }

    #[test]
    fn test_jump_ignored_when_finished() {
        let mut state = state();
        state.finished = true;
        let mut player = Player::default();
        assert!(!player.jump(&state));
        assert_eq!(player.jumps_left, BASE_MAX_JUMPS);
    }

    #[test]
    fn test_catnip_jumps_higher_and_falls_softer() {
        let mut state = state();
        let mut plain = Player::default();
        plain.jump(&state);
        state.timers.catnip = 10;
        let mut boosted = Player::default();
        boosted.jump(&state);
        assert!(boosted.vy < plain.vy);
        let before = boosted.vy;
        boosted.gravity_step(&state);
        assert!((boosted.vy - before - GRAVITY * CATNIP_GRAVITY).abs() < 1e-6);
    }

    #[test]
    fn test_charges_refill_on_touchdown_only() {
        let mut player = Player::default();
        player.jumps_left = 0;
        player.on_surface = true;
        player.settle(true);
        assert_eq!(player.jumps_left, 0);
        player.settle(false);
        player.settle(true);
        assert_eq!(player.jumps_left, BASE_MAX_JUMPS);
    }

    #[test]
    fn test_clamp_x_eases_home() {
        let mut player = Player::default();
        player.pos.x = 400.0;
        player.clamp_x(360.0);
        // max_x = min(0.45 * 360, 210) = 162
        assert!(player.pos.x < 162.0);
        player.pos.x = 10.0;
        player.clamp_x(360.0);
        assert_eq!(player.pos.x, PLAYER_MIN_X);
    }

    #[test]
    fn test_frame_selection() {
        let mut player = Player::default();
        player.on_surface = false;
        player.select_frame(3.0);
        assert_eq!(player.frame, AIR_FRAME);
        player.on_surface = true;
        for _ in 0..50 {
            player.select_frame(3.0);
            assert!(player.frame < 4);
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Jump,
        Fall,
        Land,
        Cap(bool),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Jump),
            Just(Op::Fall),
            Just(Op::Land),
            any::<bool>().prop_map(Op::Cap),
        ]
    }

    proptest! {
        #[test]
        fn prop_charges_stay_in_range(ops in prop::collection::vec(op(), 1..200)) {
            let state = state();
            let mut player = Player::default();
            for op in ops {
                let was_on_surface = player.on_surface;
                let before = player.jumps_left;
                let cap_before = player.max_jumps;
                match op {
                    Op::Jump => { player.jump(&state); }
                    Op::Fall => player.settle(false),
                    Op::Land => player.settle(true),
                    Op::Cap(triple) => {
                        player.set_max_jumps(if triple { TRIPLE_MAX_JUMPS } else { BASE_MAX_JUMPS })
                    }
                }
                prop_assert!(player.jumps_left <= player.max_jumps);
                if player.jumps_left > before {
                    // Only a touchdown refills
                    prop_assert!(!was_on_surface && player.on_surface);
                    prop_assert_eq!(player.jumps_left, player.max_jumps);
                }
                prop_assert!(player.max_jumps == cap_before || matches!(op, Op::Cap(_)));
            }
        }
    }
}
