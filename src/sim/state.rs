//! Game state and core simulation types
//!
//! One `GameState` per run. Components never read globals: the tick hands
//! this record to each of them in turn.

use serde::{Deserialize, Serialize};

use super::progression::ProgressionRecord;
use super::setpiece::SetpieceRecord;
use super::theme::ThemeKey;
use crate::consts::*;
use crate::tuning::Tuning;

/// Host viewport in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub w: f32,
    pub h: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            w: DEFAULT_VIEWPORT_W,
            h: DEFAULT_VIEWPORT_H,
        }
    }
}

/// Player altitude classification used to bias spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Band {
    #[default]
    Ground,
    Mid,
    Air,
}

impl Band {
    /// Feet this far above the ground count as `Mid`
    pub const MID_HEIGHT: f32 = 90.0;
    /// Feet this far above the ground count as `Air`
    pub const AIR_HEIGHT: f32 = 220.0;

    /// Classify by height of the player's feet above the terrain surface
    pub fn from_altitude(altitude: f32) -> Self {
        if altitude >= Self::AIR_HEIGHT {
            Band::Air
        } else if altitude >= Self::MID_HEIGHT {
            Band::Mid
        } else {
            Band::Ground
        }
    }
}

/// Discrete cues for the audio/HUD collaborators, cleared every step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jump,
    Hit,
    Slow,
    Bark,
    Mouse,
    Catnip,
    Fish,
    ExtraLife,
    Checkpoint,
    CheckpointSaved,
    Whoosh,
    BeatEntered(String),
    SetpieceStarted,
    SetpieceFinished,
    Restart,
}

/// Frame countdowns; all decremented once per step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timers {
    pub invuln: u32,
    pub slow: u32,
    pub catnip: u32,
    pub triple_jump: u32,
    pub checkpoint_glow: u32,
    pub safe: u32,
    pub life_pulse: u32,
}

impl Timers {
    pub fn tick(&mut self) {
        for t in [
            &mut self.invuln,
            &mut self.slow,
            &mut self.catnip,
            &mut self.triple_jump,
            &mut self.checkpoint_glow,
            &mut self.safe,
            &mut self.life_pulse,
        ] {
            *t = t.saturating_sub(1);
        }
    }
}

/// Dog chase sub-state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChaseRecord {
    pub active: bool,
    pub timer: u32,
    pub bark_timer: u32,
}

/// Visual crossfade between two themes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeFade {
    pub from: ThemeKey,
    pub to: ThemeKey,
    pub t: u32,
    pub dur: u32,
    pub active: bool,
}

impl ThemeFade {
    fn settled(key: ThemeKey) -> Self {
        Self {
            from: key,
            to: key,
            t: 0,
            dur: 0,
            active: false,
        }
    }

    /// Blend factor from `from` (0) to `to` (1)
    pub fn progress(&self) -> f32 {
        if !self.active || self.dur == 0 {
            1.0
        } else {
            (self.t as f32 / self.dur as f32).clamp(0.0, 1.0)
        }
    }
}

/// Pause / rest toggle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PauseRecord {
    pub active: bool,
    /// Frames spent paused in the current rest
    pub frames: u32,
}

/// Home / finish sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HomePhase {
    #[default]
    Off,
    /// Home marker scrolling in
    Approach,
    /// Fading out
    Fade,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeRecord {
    pub phase: HomePhase,
    pub x: f32,
    pub fade: f32,
}

/// Player mood shown by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Calm,
    Happy,
    Proud,
    Annoyed,
}

/// Complete run state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed
    pub seed: u64,
    /// Simulation tick counter
    pub tick: u64,
    pub score: u32,
    pub mice: u32,
    pub lives: u8,
    pub max_lives: u8,
    /// Base world speed written by the director each frame
    pub speed: f32,
    /// Permanent bonus accumulated from mice
    pub speed_bonus: f32,
    /// User speed preset multiplier
    pub speed_mul: f32,
    /// Effective speed before the setpiece scroll factor
    pub effective_speed: f32,
    /// World scroll distance of the last resolved frame
    pub scroll_delta: f32,
    pub timers: Timers,
    pub slow_strength: f32,
    /// Blanket shield: absorbs the next life loss
    pub checkpoint_active: bool,
    pub chase: ChaseRecord,
    pub theme: ThemeKey,
    /// Pinned theme; suspends director-driven theme changes
    pub theme_override: Option<ThemeKey>,
    pub fade: ThemeFade,
    pub band: Band,
    pub setpiece: SetpieceRecord,
    pub progression: ProgressionRecord,
    pub pause: PauseRecord,
    pub home: HomeRecord,
    pub finished: bool,
    /// Frames until a pending restart
    pub restart_in: Option<u32>,
    pub last_hit_tick: Option<u64>,
    pub viewport: Viewport,
    /// Cues produced during the current step
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64, tuning: &Tuning, viewport: Viewport) -> Self {
        let mut setpiece = SetpieceRecord::default();
        setpiece.ocean_mask_x = viewport.w;
        Self {
            seed,
            tick: 0,
            score: 0,
            mice: 0,
            lives: tuning.start_lives,
            max_lives: tuning.max_lives,
            speed: 2.15 + tuning.base_speed_boost,
            speed_bonus: 0.0,
            speed_mul: 1.0,
            effective_speed: 0.0,
            scroll_delta: 0.0,
            timers: Timers::default(),
            slow_strength: SLOW_STRENGTH,
            checkpoint_active: false,
            chase: ChaseRecord::default(),
            theme: ThemeKey::Forest,
            theme_override: None,
            fade: ThemeFade::settled(ThemeKey::Forest),
            band: Band::Ground,
            setpiece,
            progression: ProgressionRecord::default(),
            pause: PauseRecord::default(),
            home: HomeRecord::default(),
            finished: false,
            restart_in: None,
            last_hit_tick: None,
            viewport,
            events: Vec::new(),
        }
    }

    /// Fresh run state that keeps host-owned choices (viewport, speed preset,
    /// pinned theme)
    pub fn restarted(&self, tuning: &Tuning) -> Self {
        let mut fresh = Self::new(self.seed, tuning, self.viewport);
        fresh.speed_mul = self.speed_mul;
        fresh.theme_override = self.theme_override;
        if let Some(key) = self.theme_override {
            fresh.theme = key;
            fresh.fade = ThemeFade::settled(key);
        }
        fresh
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Request a crossfade to `to`. Ignored while a theme is pinned.
    pub fn start_theme_fade(&mut self, to: ThemeKey, dur: u32) {
        if self.theme_override.is_some() {
            return;
        }
        if self.theme == to {
            return;
        }
        self.fade = ThemeFade {
            from: self.theme,
            to,
            t: 0,
            dur,
            active: dur > 0,
        };
        self.theme = to;
    }

    /// Pin or release the theme
    pub fn set_theme_override(&mut self, key: Option<ThemeKey>) {
        self.theme_override = key;
        if let Some(key) = key {
            self.fade = ThemeFade {
                from: self.theme,
                to: key,
                t: 0,
                dur: 40,
                active: self.theme != key,
            };
            self.theme = key;
        }
    }

    pub fn update_fade(&mut self) {
        if self.fade.active {
            self.fade.t += 1;
            if self.fade.t >= self.fade.dur {
                self.fade.active = false;
                self.fade.from = self.fade.to;
            }
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.timers.invuln > 0
    }

    /// Jump charges allowed right now
    pub fn max_jumps(&self) -> u8 {
        if self.timers.triple_jump > 0 {
            TRIPLE_MAX_JUMPS
        } else {
            BASE_MAX_JUMPS
        }
    }

    /// `base * speedMultiplier * catnip * slow`, before the setpiece scroll factor
    pub fn compute_effective_speed(&self) -> f32 {
        let catnip = if self.timers.catnip > 0 { CATNIP_SPEED } else { 1.0 };
        let slow = if self.timers.slow > 0 {
            self.slow_strength
        } else {
            1.0
        };
        (self.speed + self.speed_bonus) * self.speed_mul * catnip * slow
    }

    /// Scroll multiplier of the active setpiece (1 when none)
    pub fn scroll_factor(&self) -> f32 {
        if self.setpiece.active {
            self.setpiece.scroll
        } else {
            1.0
        }
    }

    /// Smoothed night level (0 = day, 1 = night)
    pub fn night_level(&self) -> f32 {
        self.progression.night.clamp(0.0, 1.0)
    }

    pub fn theme_label(&self) -> &'static str {
        self.theme.theme().label
    }

    pub fn mood(&self) -> Mood {
        if self
            .last_hit_tick
            .is_some_and(|t| self.tick.saturating_sub(t) < 240)
        {
            Mood::Annoyed
        } else if self.mice >= 12 {
            Mood::Proud
        } else if self.mice >= 4 {
            Mood::Happy
        } else {
            Mood::Calm
        }
    }

    /// Spawning is suppressed during setpieces and the finish sequence
    pub fn spawning_suppressed(&self) -> bool {
        self.setpiece.active
            || self.setpiece.requested.is_some()
            || self.home.phase != HomePhase::Off
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(7, &Tuning::default(), Viewport::default())
    }

    #[test]
    fn test_band_classification() {
        assert_eq!(Band::from_altitude(0.0), Band::Ground);
        assert_eq!(Band::from_altitude(120.0), Band::Mid);
        assert_eq!(Band::from_altitude(400.0), Band::Air);
    }

    #[test]
    fn test_timers_saturate() {
        let mut timers = Timers {
            invuln: 1,
            ..Default::default()
        };
        timers.tick();
        timers.tick();
        assert_eq!(timers.invuln, 0);
        assert_eq!(timers.slow, 0);
    }

    #[test]
    fn test_effective_speed_multipliers() {
        let mut s = state();
        s.speed = 4.0;
        s.speed_mul = 1.2;
        assert!((s.compute_effective_speed() - 4.8).abs() < 1e-5);
        s.timers.catnip = 10;
        s.timers.slow = 10;
        let expected = 4.0 * 1.2 * CATNIP_SPEED * SLOW_STRENGTH;
        assert!((s.compute_effective_speed() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_theme_fade_completes() {
        let mut s = state();
        s.start_theme_fade(ThemeKey::Ocean, 3);
        assert_eq!(s.theme, ThemeKey::Ocean);
        assert_eq!(s.fade.from, ThemeKey::Forest);
        assert!(s.fade.active);
        for _ in 0..3 {
            s.update_fade();
        }
        assert!(!s.fade.active);
        assert_eq!(s.fade.progress(), 1.0);
    }

    #[test]
    fn test_pinned_theme_ignores_fades() {
        let mut s = state();
        s.set_theme_override(Some(ThemeKey::Desert));
        s.start_theme_fade(ThemeKey::Ocean, 80);
        assert_eq!(s.theme, ThemeKey::Desert);
        s.set_theme_override(None);
        s.start_theme_fade(ThemeKey::Ocean, 80);
        assert_eq!(s.theme, ThemeKey::Ocean);
    }

    #[test]
    fn test_restart_keeps_host_choices() {
        let mut s = state();
        s.score = 99;
        s.speed_mul = 1.4;
        s.set_theme_override(Some(ThemeKey::City));
        let fresh = s.restarted(&Tuning::default());
        assert_eq!(fresh.score, 0);
        assert_eq!(fresh.lives, 7);
        assert_eq!(fresh.speed_mul, 1.4);
        assert_eq!(fresh.theme, ThemeKey::City);
    }

    #[test]
    fn test_mood() {
        let mut s = state();
        assert_eq!(s.mood(), Mood::Calm);
        s.mice = 5;
        assert_eq!(s.mood(), Mood::Happy);
        s.tick = 500;
        s.last_hit_tick = Some(400);
        assert_eq!(s.mood(), Mood::Annoyed);
    }
}
