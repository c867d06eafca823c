//! Scripted vehicle setpieces
//!
//! A setpiece runs `approach → board → travel → arrive` on fixed frame
//! budgets. While active it owns the world scroll factor and the vehicle pose;
//! the resolver keeps the player glued to the boarding spot or the seat.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::EntityStore;
use super::state::{GameEvent, GameState};
use super::terrain::Terrain;
use super::theme::ThemeKey;
use crate::smoothstep;

pub const APPROACH_FRAMES: u32 = 240;
pub const BOARD_FRAMES: u32 = 90;
pub const TRAVEL_FRAMES: u32 = 420;
pub const ARRIVE_FRAMES: u32 = 180;
/// Sum of all phases
pub const SCRIPT_FRAMES: u32 = APPROACH_FRAMES + BOARD_FRAMES + TRAVEL_FRAMES + ARRIVE_FRAMES;
/// Forced completion after this many frames
pub const HARD_CAP: u32 = SCRIPT_FRAMES + 60;

/// Safe window and invulnerability granted on landing
pub const LANDING_SAFE_FRAMES: u32 = 180;
pub const LANDING_INVULN_FRAMES: u32 = 60;

/// Vehicle hovers this far above the ground while parked
const PARKED_HEIGHT: f32 = 110.0;
/// Rocket cruise scroll factor
const ROCKET_CRUISE: f32 = 0.35;
/// Arrive progress at which the player steps out
const RELEASE_AT: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SetpieceKind {
    #[default]
    Ocean,
    Rocket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Vehicle {
    #[default]
    Balloon,
    Raft,
    Zeppelin,
    Rocket,
}

impl Vehicle {
    /// Ocean crossings pick a craft at random
    pub fn pick_for(kind: SetpieceKind, rng: &mut Pcg32) -> Self {
        match kind {
            SetpieceKind::Rocket => Vehicle::Rocket,
            SetpieceKind::Ocean => {
                let r: f32 = rng.random();
                if r < 0.18 {
                    Vehicle::Zeppelin
                } else if r < 0.32 {
                    Vehicle::Raft
                } else {
                    Vehicle::Balloon
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SetpiecePhase {
    #[default]
    None,
    Approach,
    Board,
    Travel,
    Arrive,
}

/// Setpiece state shared with the resolver, director and renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetpieceRecord {
    pub active: bool,
    pub kind: SetpieceKind,
    pub vehicle: Vehicle,
    pub phase: SetpiecePhase,
    /// Frames in the current phase
    pub phase_t: u32,
    /// Frames since the setpiece started
    pub t: u32,
    /// World scroll multiplier
    pub scroll: f32,
    /// Vehicle anchor in screen space
    pub vehicle_pos: Vec2,
    /// Screen x where the ocean begins (viewport width = no ocean)
    pub ocean_mask_x: f32,
    pub player_in_vehicle: bool,
    /// Rocket boarding done
    pub boarded: bool,
    /// Camera shake amplitude
    pub shake: f32,
    /// Set on completion; the director consumes it
    pub finished: bool,
    /// Armed by the director, started by the manager
    pub requested: Option<SetpieceKind>,
    pub target_theme: Option<ThemeKey>,
    whooshed: bool,
    motion_phase: f32,
    arrive_from: f32,
}

impl Default for SetpieceRecord {
    fn default() -> Self {
        Self {
            active: false,
            kind: SetpieceKind::Ocean,
            vehicle: Vehicle::Balloon,
            phase: SetpiecePhase::None,
            phase_t: 0,
            t: 0,
            scroll: 1.0,
            vehicle_pos: Vec2::ZERO,
            ocean_mask_x: f32::MAX,
            player_in_vehicle: false,
            boarded: false,
            shake: 0.0,
            finished: false,
            requested: None,
            target_theme: None,
            whooshed: false,
            motion_phase: 0.0,
            arrive_from: 1.0,
        }
    }
}

impl SetpieceRecord {
    /// Queue a setpiece; it starts on the manager's next update
    pub fn request(&mut self, kind: SetpieceKind, target_theme: Option<ThemeKey>) {
        self.finished = false;
        self.requested = Some(kind);
        self.target_theme = target_theme;
        self.t = 0;
        self.phase_t = 0;
    }

    /// Player top-left while riding
    pub fn seat(&self, player_size: Vec2) -> Vec2 {
        Vec2::new(
            self.vehicle_pos.x - player_size.x * 0.5,
            self.vehicle_pos.y + 24.0 - player_size.y * 0.5,
        )
    }

    /// Player x to walk toward before boarding
    pub fn boarding_x(&self, player_size: Vec2) -> f32 {
        self.vehicle_pos.x - 40.0 - player_size.x
    }

    /// Frames progress over the whole script, 0..1
    pub fn progress(&self) -> f32 {
        (self.t as f32 / SCRIPT_FRAMES as f32).clamp(0.0, 1.0)
    }

    fn enter(&mut self, phase: SetpiecePhase) {
        self.phase = phase;
        self.phase_t = 0;
    }
}

/// Drives the setpiece script
#[derive(Debug, Clone)]
pub struct SetpieceManager {
    shake_enabled: bool,
}

impl SetpieceManager {
    pub fn new(shake_enabled: bool) -> Self {
        Self { shake_enabled }
    }

    pub fn set_shake_enabled(&mut self, enabled: bool) {
        self.shake_enabled = enabled;
    }

    /// Advance one frame
    pub fn update(
        &mut self,
        state: &mut GameState,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
    ) {
        if !state.setpiece.active {
            match state.setpiece.requested.take() {
                Some(kind) => self.start(state, kind, entities, rng),
                None => return,
            }
        }

        let w = state.viewport.w;
        let h = state.viewport.h;
        let mut release = false;
        let mut fade_to = None;
        {
            let sp = &mut state.setpiece;
            sp.t += 1;
            sp.phase_t += 1;
            sp.shake = 0.0;

            match sp.phase {
                SetpiecePhase::Approach => {
                    sp.vehicle_pos = parked(w * 0.76, terrain);
                    let u = sp.phase_t as f32 / APPROACH_FRAMES as f32;
                    sp.scroll = 1.0 - smoothstep(u);
                    sp.ocean_mask_x = w;
                    if sp.phase_t >= APPROACH_FRAMES {
                        sp.enter(SetpiecePhase::Board);
                        sp.scroll = 0.0;
                        entities.say("all aboard", sp.vehicle_pos);
                    }
                }
                SetpiecePhase::Board => {
                    sp.vehicle_pos = parked(w * 0.76, terrain);
                    let u = (sp.phase_t as f32 / BOARD_FRAMES as f32).clamp(0.0, 1.0);
                    sp.scroll = 0.0;
                    match sp.kind {
                        SetpieceKind::Ocean => {
                            let reveal = smoothstep((u - 0.35) / 0.65);
                            sp.ocean_mask_x =
                                (sp.vehicle_pos.x - 40.0 - reveal * 220.0).clamp(0.0, w);
                        }
                        SetpieceKind::Rocket => {
                            if u >= 0.5 && !sp.boarded {
                                sp.boarded = true;
                                sp.player_in_vehicle = true;
                            }
                            if sp.boarded && self.shake_enabled {
                                let rumble = smoothstep((u - 0.5) / 0.5);
                                sp.shake = 1.0 + rumble * 2.0;
                            }
                        }
                    }
                    if sp.phase_t >= BOARD_FRAMES {
                        sp.enter(SetpiecePhase::Travel);
                        sp.player_in_vehicle = true;
                        fade_to = sp.target_theme;
                    }
                }
                SetpiecePhase::Travel => {
                    let u = (sp.phase_t as f32 / TRAVEL_FRAMES as f32).clamp(0.0, 1.0);
                    let drift_t = sp.t as f32 + sp.motion_phase;
                    match sp.kind {
                        SetpieceKind::Ocean => {
                            sp.ocean_mask_x = 0.0;
                            sp.scroll = smoothstep(u / 0.18);
                            sp.vehicle_pos = Vec2::new(
                                w * (0.28 + 0.16 * (drift_t * 0.006).sin()),
                                h * 0.28 + (drift_t * 0.02).sin() * 6.0,
                            );
                        }
                        SetpieceKind::Rocket => {
                            sp.ocean_mask_x = w;
                            sp.scroll = ROCKET_CRUISE;
                            sp.vehicle_pos =
                                Vec2::new(w * 0.5, h * 0.38 + (drift_t * 0.06).sin() * 3.5);
                        }
                    }
                    if !sp.whooshed && sp.phase_t > 20 {
                        sp.whooshed = true;
                        state.events.push(GameEvent::Whoosh);
                    }
                    if sp.phase_t >= TRAVEL_FRAMES {
                        sp.arrive_from = sp.scroll;
                        sp.enter(SetpiecePhase::Arrive);
                    }
                }
                SetpiecePhase::Arrive => {
                    let u = (sp.phase_t as f32 / ARRIVE_FRAMES as f32).clamp(0.0, 1.0);
                    let land = parked(w * 0.72, terrain);
                    let cruise_y = match sp.kind {
                        SetpieceKind::Ocean => h * 0.28,
                        SetpieceKind::Rocket => h * 0.38,
                    };
                    let settle = smoothstep(u / 0.5);
                    sp.vehicle_pos = Vec2::new(land.x, land.y * settle + cruise_y * (1.0 - settle));
                    match sp.kind {
                        SetpieceKind::Ocean => {
                            let retreat = smoothstep(u);
                            sp.ocean_mask_x = (sp.vehicle_pos.x - 40.0 + retreat * (w + 60.0))
                                .clamp(0.0, w);
                            sp.scroll = 1.0 - smoothstep((u - 0.55) / 0.45);
                        }
                        SetpieceKind::Rocket => {
                            sp.ocean_mask_x = w;
                            sp.scroll = sp.arrive_from * (1.0 - smoothstep(u));
                        }
                    }
                    if u >= RELEASE_AT {
                        sp.player_in_vehicle = false;
                    }
                    if sp.phase_t >= ARRIVE_FRAMES {
                        release = true;
                    }
                }
                SetpiecePhase::None => release = true,
            }

            if sp.t > HARD_CAP {
                log::warn!("Setpiece hit the frame cap in {:?}", sp.phase);
                release = true;
            }
        }

        if let Some(target) = fade_to {
            state.start_theme_fade(target, 90);
        }
        if release {
            self.finish(state);
        }
    }

    fn start(
        &mut self,
        state: &mut GameState,
        kind: SetpieceKind,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
    ) {
        let sp = &mut state.setpiece;
        sp.active = true;
        sp.kind = kind;
        sp.vehicle = Vehicle::pick_for(kind, rng);
        sp.enter(SetpiecePhase::Approach);
        sp.t = 0;
        sp.scroll = 1.0;
        sp.ocean_mask_x = state.viewport.w;
        sp.vehicle_pos = Vec2::new(state.viewport.w * 0.76, 0.0);
        sp.player_in_vehicle = false;
        sp.boarded = false;
        sp.shake = 0.0;
        sp.finished = false;
        sp.whooshed = false;
        sp.motion_phase = rng.random::<f32>() * 1000.0;
        sp.arrive_from = 1.0;
        entities.clear_world();
        state.chase = Default::default();
        state.events.push(GameEvent::SetpieceStarted);
        log::info!("Setpiece started: {:?} by {:?}", kind, state.setpiece.vehicle);
    }

    fn finish(&mut self, state: &mut GameState) {
        let sp = &mut state.setpiece;
        sp.active = false;
        sp.phase = SetpiecePhase::None;
        sp.phase_t = 0;
        sp.scroll = 1.0;
        sp.ocean_mask_x = state.viewport.w;
        sp.player_in_vehicle = false;
        sp.shake = 0.0;
        sp.finished = true;
        let frames = sp.t;
        state.timers.safe = LANDING_SAFE_FRAMES;
        state.timers.invuln = state.timers.invuln.max(LANDING_INVULN_FRAMES);
        state.events.push(GameEvent::SetpieceFinished);
        log::info!("Setpiece finished after {frames} frames");
    }
}

fn parked(x: f32, terrain: &Terrain) -> Vec2 {
    Vec2::new(x, terrain.surface_at(x) - PARKED_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Viewport;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;

    struct Rig {
        state: GameState,
        terrain: Terrain,
        entities: EntityStore,
        rng: Pcg32,
        manager: SetpieceManager,
    }

    fn rig(seed: u64) -> Rig {
        let mut rng = Pcg32::seed_from_u64(seed);
        let viewport = Viewport::default();
        let terrain = Terrain::new(viewport, &mut rng);
        Rig {
            state: GameState::new(seed, &Tuning::default(), viewport),
            terrain,
            entities: EntityStore::new(),
            rng,
            manager: SetpieceManager::new(true),
        }
    }

    impl Rig {
        fn step(&mut self) {
            self.manager.update(
                &mut self.state,
                &self.terrain,
                &mut self.entities,
                &mut self.rng,
            );
        }
    }

    #[test]
    fn test_ocean_phase_timeline() {
        let mut rig = rig(9);
        rig.state.score = 100;
        rig.state
            .setpiece
            .request(SetpieceKind::Ocean, Some(ThemeKey::Island));

        let mut phases = Vec::new();
        let mut frames = 0;
        while !rig.state.setpiece.finished {
            rig.step();
            frames += 1;
            let phase = rig.state.setpiece.phase;
            if phases.last() != Some(&phase) {
                phases.push(phase);
            }
            assert!(frames <= HARD_CAP);
        }
        assert_eq!(frames, 930);
        assert_eq!(
            phases,
            vec![
                SetpiecePhase::Approach,
                SetpiecePhase::Board,
                SetpiecePhase::Travel,
                SetpiecePhase::Arrive,
                SetpiecePhase::None,
            ]
        );
        assert!(!rig.state.setpiece.active);
        assert_eq!(rig.state.timers.safe, LANDING_SAFE_FRAMES);
        assert_eq!(rig.state.theme, ThemeKey::Island);
    }

    #[test]
    fn test_phase_boundaries() {
        let mut rig = rig(3);
        rig.state.setpiece.request(SetpieceKind::Ocean, None);
        for _ in 0..APPROACH_FRAMES - 1 {
            rig.step();
        }
        assert_eq!(rig.state.setpiece.phase, SetpiecePhase::Approach);
        assert!(rig.state.setpiece.scroll < 0.01);
        rig.step();
        assert_eq!(rig.state.setpiece.phase, SetpiecePhase::Board);
        assert_eq!(rig.state.setpiece.scroll, 0.0);
        for _ in 0..BOARD_FRAMES {
            rig.step();
        }
        assert_eq!(rig.state.setpiece.phase, SetpiecePhase::Travel);
        assert!(rig.state.setpiece.player_in_vehicle);
        for _ in 0..30 {
            rig.step();
        }
        let whooshes = rig
            .state
            .events
            .iter()
            .filter(|e| **e == GameEvent::Whoosh)
            .count();
        assert_eq!(whooshes, 1);
        assert_eq!(rig.state.setpiece.ocean_mask_x, 0.0);
    }

    #[test]
    fn test_start_clears_world() {
        let mut rig = rig(5);
        rig.entities.add(
            crate::sim::rect::Rect::new(300.0, 500.0, 80.0, 56.0),
            crate::sim::entity::YMode::Fixed,
            crate::sim::entity::EntityKind::Platform(crate::sim::entity::PlatformKind::Fence),
        );
        rig.state.setpiece.request(SetpieceKind::Rocket, Some(ThemeKey::Mars));
        rig.step();
        assert!(rig.entities.is_empty());
        assert!(rig.state.setpiece.active);
        assert_eq!(rig.state.setpiece.vehicle, Vehicle::Rocket);
    }

    #[test]
    fn test_rocket_boards_midway_and_cruises() {
        let mut rig = rig(11);
        rig.state.setpiece.request(SetpieceKind::Rocket, Some(ThemeKey::Mars));
        for _ in 0..APPROACH_FRAMES + BOARD_FRAMES / 2 + 1 {
            rig.step();
        }
        assert!(rig.state.setpiece.boarded);
        assert!(rig.state.setpiece.shake > 0.0);
        for _ in 0..BOARD_FRAMES {
            rig.step();
        }
        assert_eq!(rig.state.setpiece.phase, SetpiecePhase::Travel);
        assert_eq!(rig.state.setpiece.scroll, ROCKET_CRUISE);
    }

    #[test]
    fn test_shake_disabled() {
        let mut rig = rig(11);
        rig.manager.set_shake_enabled(false);
        rig.state.setpiece.request(SetpieceKind::Rocket, None);
        for _ in 0..APPROACH_FRAMES + BOARD_FRAMES - 1 {
            rig.step();
            assert_eq!(rig.state.setpiece.shake, 0.0);
        }
    }

    #[test]
    fn test_idle_manager_does_nothing() {
        let mut rig = rig(1);
        rig.step();
        assert!(!rig.state.setpiece.active);
        assert!(rig.state.events.is_empty());
    }

    fn phase() -> impl Strategy<Value = SetpiecePhase> {
        prop_oneof![
            Just(SetpiecePhase::Approach),
            Just(SetpiecePhase::Board),
            Just(SetpiecePhase::Travel),
            Just(SetpiecePhase::Arrive),
            Just(SetpiecePhase::None),
        ]
    }

    proptest! {
        #[test]
        fn prop_always_finishes_within_cap(
            seed in any::<u64>(),
            rocket in any::<bool>(),
            phase in phase(),
            phase_t in 0u32..500,
            t in 0u32..HARD_CAP,
        ) {
            let mut rig = rig(seed);
            let kind = if rocket { SetpieceKind::Rocket } else { SetpieceKind::Ocean };
            rig.state.setpiece.request(kind, None);
            rig.step();
            rig.state.setpiece.phase = phase;
            rig.state.setpiece.phase_t = phase_t;
            rig.state.setpiece.t = t;
            let mut frames = 0;
            while !rig.state.setpiece.finished {
                rig.step();
                frames += 1;
                prop_assert!(frames <= HARD_CAP);
            }
            prop_assert!(rig.state.setpiece.scroll == 1.0);
        }
    }
}
