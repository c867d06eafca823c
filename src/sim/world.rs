//! The world: every simulation component plus the run RNG
//!
//! Hosts construct one `World`, feed it [`super::TickInput`]s through
//! [`super::tick`] and read a [`Snapshot`] back for drawing and the HUD.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::entity::{Bubble, Entity, EntityStore, Pawprint, Toast};
use super::player::Player;
use super::progression::Director;
use super::resolver::Resolver;
use super::setpiece::{SetpieceKind, SetpieceManager, SetpiecePhase, Vehicle};
use super::spawn::Spawner;
use super::state::{Band, GameEvent, GameState, Mood, Viewport};
use super::terrain::Terrain;
use super::theme::ThemeKey;
use crate::settings::Settings;
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct World {
    pub state: GameState,
    pub player: Player,
    pub terrain: Terrain,
    pub entities: EntityStore,
    pub director: Director,
    pub setpieces: SetpieceManager,
    pub spawner: Spawner,
    pub resolver: Resolver,
    pub tuning: Tuning,
    pub settings: Settings,
    pub(crate) rng: Pcg32,
}

impl World {
    pub fn new(seed: u64, tuning: Tuning, settings: Settings, viewport: Viewport) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let terrain = Terrain::new(viewport, &mut rng);
        let mut state = GameState::new(seed, &tuning, viewport);
        state.speed_mul = settings.speed.multiplier();

        let mut world = Self {
            state,
            player: Player::default(),
            terrain,
            entities: EntityStore::new(),
            director: Director::new(&tuning),
            setpieces: SetpieceManager::new(settings.screen_shake),
            spawner: Spawner::new(&tuning),
            resolver: Resolver::new(&tuning),
            tuning,
            settings,
            rng,
        };
        world.begin_run();
        log::info!("Run started (seed {seed})");
        world
    }

    fn begin_run(&mut self) {
        self.player = Player::default();
        self.player.reset_at(self.surface_under_player());
        self.director.start(&mut self.state, &mut self.entities);
    }

    fn surface_under_player(&self) -> f32 {
        self.terrain
            .surface_at(self.player.base_x + self.player.size.x * 0.5)
    }

    /// Full reset after the last life; host choices survive
    pub fn restart(&mut self) {
        self.state = self.state.restarted(&self.tuning);
        self.entities.reset();
        self.spawner.reset();
        self.terrain.init(self.state.viewport, &mut self.rng);
        self.begin_run();
        self.state.push_event(GameEvent::Restart);
        self.entities.show_toast("new run", 90);
        log::info!("Run restarted");
    }

    /// Regenerate the terrain for a new viewport
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.state.viewport {
            return;
        }
        log::debug!("Viewport resized to {}x{}", viewport.w, viewport.h);
        self.state.viewport = viewport;
        self.terrain.init(viewport, &mut self.rng);
        let ground = self.terrain.surface_at(self.player.pos.x + self.player.size.x * 0.5)
            - self.player.size.y;
        self.player.pos.y = self.player.pos.y.min(ground);
        self.player.clamp_x(viewport.w);
    }

    /// Advance to the next speed preset
    pub fn cycle_speed(&mut self) {
        self.state.speed_mul = self.settings.cycle_speed();
    }

    pub fn set_screen_shake(&mut self, enabled: bool) {
        self.settings.screen_shake = enabled;
        self.setpieces.set_shake_enabled(enabled);
    }

    /// Read-only view for the renderer and HUD
    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let sp = &state.setpiece;
        Snapshot {
            tick: state.tick,
            score: state.score,
            lives: state.lives,
            max_lives: state.max_lives,
            mice: state.mice,
            theme: state.theme,
            theme_label: state.theme_label(),
            theme_fade: state.fade.progress(),
            fade_from: state.fade.from,
            beat: state.progression.beat_id.as_str(),
            speed_multiplier: state.speed_mul,
            speed_preset: self.settings.speed.as_str(),
            toast: self.entities.toast.clone(),
            bubbles: self.entities.bubbles.clone(),
            pawprints: self.entities.pawprints.clone(),
            entities: self.entities.iter().cloned().collect(),
            player: PlayerView {
                pos: self.player.pos,
                size: self.player.size,
                frame: self.player.frame,
                on_surface: self.player.on_surface,
                jumps_left: self.player.jumps_left,
                max_jumps: self.player.max_jumps,
                invulnerable: state.is_invulnerable(),
            },
            setpiece: SetpieceView {
                active: sp.active,
                kind: sp.kind,
                vehicle: sp.vehicle,
                phase: sp.phase,
                vehicle_pos: sp.vehicle_pos,
                ocean_mask_x: sp.ocean_mask_x,
                shake: sp.shake,
                player_in_vehicle: sp.player_in_vehicle,
            },
            night: state.night_level(),
            band: state.band,
            mood: state.mood(),
            checkpoint_active: state.checkpoint_active,
            home_fade: state.home.fade,
            paused: state.pause.active,
            finished: state.finished,
            events: state.events.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub size: Vec2,
    pub frame: u8,
    pub on_surface: bool,
    pub jumps_left: u8,
    pub max_jumps: u8,
    pub invulnerable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetpieceView {
    pub active: bool,
    pub kind: SetpieceKind,
    pub vehicle: Vehicle,
    pub phase: SetpiecePhase,
    pub vehicle_pos: Vec2,
    pub ocean_mask_x: f32,
    pub shake: f32,
    pub player_in_vehicle: bool,
}

/// Everything a renderer, HUD or audio layer polls after a step
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u32,
    pub lives: u8,
    pub max_lives: u8,
    pub mice: u32,
    pub theme: ThemeKey,
    pub theme_label: &'static str,
    pub theme_fade: f32,
    pub fade_from: ThemeKey,
    pub beat: &'static str,
    pub speed_multiplier: f32,
    pub speed_preset: &'static str,
    pub toast: Option<Toast>,
    pub bubbles: Vec<Bubble>,
    pub pawprints: Vec<Pawprint>,
    pub entities: Vec<Entity>,
    pub player: PlayerView,
    pub setpiece: SetpieceView,
    pub night: f32,
    pub band: Band,
    pub mood: Mood,
    pub checkpoint_active: bool,
    pub home_fade: f32,
    pub paused: bool,
    pub finished: bool,
    pub events: Vec<GameEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(seed: u64) -> World {
        World::new(seed, Tuning::default(), Settings::default(), Viewport::default())
    }

    #[test]
    fn test_new_world_starts_on_the_ground() {
        let w = world(1);
        assert!(w.player.on_surface);
        assert_eq!(w.player.jumps_left, 2);
        let ground = w.terrain.surface_at(w.player.pos.x + w.player.size.x * 0.5);
        assert!((w.player.bottom() - ground).abs() < 1e-3);
        assert_eq!(w.state.progression.beat_idx, 0);
        assert_eq!(w.state.lives, 7);
    }

    #[test]
    fn test_restart_keeps_preset() {
        let mut w = world(2);
        w.cycle_speed();
        w.state.score = 55;
        w.state.lives = 0;
        w.entities.say("hi", Vec2::ZERO);
        w.restart();
        assert_eq!(w.state.score, 0);
        assert_eq!(w.state.lives, 7);
        assert_eq!(w.state.speed_mul, 1.2);
        assert!(w.entities.bubbles.is_empty());
        assert!(w.state.events.contains(&GameEvent::Restart));
    }

    #[test]
    fn test_resize_regenerates_terrain() {
        let mut w = world(3);
        w.resize(Viewport { w: 800.0, h: 600.0 });
        assert_eq!(w.state.viewport.w, 800.0);
        let last = w.terrain.points().last().map(|p| p.x).unwrap_or(0.0);
        assert!(last >= 800.0);
        assert!(w.player.bottom() <= w.terrain.surface_at(w.player.pos.x + 29.0) + 1e-3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let w = world(4);
        let json = serde_json::to_string(&w.snapshot()).unwrap();
        assert!(json.contains("\"theme_label\":\"Forest\""));
        assert!(json.contains("\"lives\":7"));
    }

    #[test]
    fn test_shake_preference_reaches_setpieces() {
        let mut w = world(5);
        w.set_screen_shake(false);
        assert!(!w.settings.screen_shake);
    }
}
