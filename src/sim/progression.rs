//! Progression director: the beat table and its state machine
//!
//! One place decides what happens when. Each beat pins a theme, a speed
//! curve, a night target and optionally a setpiece; the rest of the
//! simulation only reads the director's outputs.

use serde::{Deserialize, Serialize};

use super::entity::EntityStore;
use super::setpiece::SetpieceKind;
use super::state::{GameEvent, GameState, HomePhase};
use super::theme::ThemeKey;
use crate::consts::SAFE_AFTER_CHECKPOINT;
use crate::tuning::Tuning;
use crate::{ease_in_out, lerp, smoothstep};

/// Night level smoothing factor per frame
const NIGHT_TAU: f32 = 0.08;
/// Theme crossfade lengths
const SETPIECE_FADE: u32 = 110;
const BEAT_FADE: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeatId {
    #[default]
    ForestIntro,
    CheckpointBreath,
    OceanJourney,
    IslandRest,
    RocketFlight,
    MarsRun,
    RocketReturn,
    MountainFocus,
    NightPassage,
    JungleRun,
    CliffRun,
    CityRun,
    DesertRun,
    ReturnJourney,
}

impl BeatId {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeatId::ForestIntro => "FOREST_INTRO",
            BeatId::CheckpointBreath => "CHECKPOINT_BREATH",
            BeatId::OceanJourney => "OCEAN_JOURNEY",
            BeatId::IslandRest => "ISLAND_REST",
            BeatId::RocketFlight => "ROCKET_FLIGHT",
            BeatId::MarsRun => "MARS_RUN",
            BeatId::RocketReturn => "ROCKET_RETURN",
            BeatId::MountainFocus => "MOUNTAIN_FOCUS",
            BeatId::NightPassage => "NIGHT_PASSAGE",
            BeatId::JungleRun => "JUNGLE_RUN",
            BeatId::CliffRun => "CLIFF_RUN",
            BeatId::CityRun => "CITY_RUN",
            BeatId::DesertRun => "DESERT_RUN",
            BeatId::ReturnJourney => "RETURN_JOURNEY",
        }
    }
}

/// One entry of the beat table
#[derive(Debug)]
pub struct Beat {
    pub id: BeatId,
    pub theme: ThemeKey,
    /// Score needed to finish the beat (ignored for setpiece beats)
    pub len_score: u32,
    pub night: bool,
    /// Safe window armed on entry (frames)
    pub safe_on_enter: u32,
    pub setpiece: Option<SetpieceKind>,
    pub target_theme: Option<ThemeKey>,
}

const fn beat(id: BeatId, theme: ThemeKey, len_score: u32) -> Beat {
    Beat {
        id,
        theme,
        len_score,
        night: false,
        safe_on_enter: 0,
        setpiece: None,
        target_theme: None,
    }
}

const fn journey(id: BeatId, theme: ThemeKey, kind: SetpieceKind, target: ThemeKey) -> Beat {
    Beat {
        id,
        theme,
        len_score: 1,
        night: false,
        safe_on_enter: 0,
        setpiece: Some(kind),
        target_theme: Some(target),
    }
}

/// Cyclic beat table; after the last beat the run loops to the first
pub static BEATS: [Beat; 14] = [
    beat(BeatId::ForestIntro, ThemeKey::Forest, 120),
    Beat {
        safe_on_enter: SAFE_AFTER_CHECKPOINT,
        ..beat(BeatId::CheckpointBreath, ThemeKey::Forest, 20)
    },
    journey(
        BeatId::OceanJourney,
        ThemeKey::Ocean,
        SetpieceKind::Ocean,
        ThemeKey::Island,
    ),
    Beat {
        safe_on_enter: SAFE_AFTER_CHECKPOINT,
        ..beat(BeatId::IslandRest, ThemeKey::Island, 130)
    },
    journey(
        BeatId::RocketFlight,
        ThemeKey::Mars,
        SetpieceKind::Rocket,
        ThemeKey::Mars,
    ),
    beat(BeatId::MarsRun, ThemeKey::Mars, 130),
    journey(
        BeatId::RocketReturn,
        ThemeKey::Mars,
        SetpieceKind::Rocket,
        ThemeKey::Mountain,
    ),
    beat(BeatId::MountainFocus, ThemeKey::Mountain, 70),
    Beat {
        night: true,
        ..beat(BeatId::NightPassage, ThemeKey::Mountain, 60)
    },
    beat(BeatId::JungleRun, ThemeKey::Jungle, 130),
    beat(BeatId::CliffRun, ThemeKey::Cliff, 130),
    beat(BeatId::CityRun, ThemeKey::City, 130),
    beat(BeatId::DesertRun, ThemeKey::Desert, 130),
    journey(
        BeatId::ReturnJourney,
        ThemeKey::Ocean,
        SetpieceKind::Ocean,
        ThemeKey::Forest,
    ),
];

/// Table index of the checkpoint breather
pub const BREATH_IDX: usize = 1;

/// Additive ambience layer levels for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbiencePreset {
    pub whoosh: f32,
    pub ocean: f32,
    pub rumble: f32,
    pub engine: f32,
    pub night: f32,
    /// Crossfade time constant (seconds)
    pub tau: f32,
}

/// Why a beat was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterReason {
    Boot,
    Auto,
    Checkpoint,
    Resume,
    SetpieceFinished,
}

/// Director state kept on the game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionRecord {
    pub beat_idx: usize,
    pub beat_id: BeatId,
    pub beat_start_score: u32,
    /// Frames since the beat started
    pub beat_tick: u32,
    /// Smoothed night level 0..1
    pub night: f32,
    pub night_target: f32,
    pub ambience: Option<AmbiencePreset>,
    last_checkpoint_active: bool,
    forced_breath: bool,
    resume_idx: Option<usize>,
}

impl Default for ProgressionRecord {
    fn default() -> Self {
        Self {
            beat_idx: 0,
            beat_id: BEATS[0].id,
            beat_start_score: 0,
            beat_tick: 0,
            night: 0.0,
            night_target: 0.0,
            ambience: None,
            last_checkpoint_active: false,
            forced_breath: false,
            resume_idx: None,
        }
    }
}

/// Base speed curve per beat over the beat's progress `u`
pub fn speed_for_beat(id: BeatId, u: f32) -> f32 {
    match id {
        BeatId::ForestIntro => lerp(2.05, 2.35, ease_in_out(u)),
        BeatId::CheckpointBreath => lerp(2.10, 2.05, smoothstep(u)),
        BeatId::OceanJourney => lerp(1.80, 1.65, smoothstep(u)),
        BeatId::IslandRest => lerp(1.95, 2.15, ease_in_out(u)),
        BeatId::MountainFocus => lerp(2.25, 2.85, ease_in_out(u)),
        BeatId::NightPassage => lerp(2.35, 2.60, ease_in_out(u)),
        _ => 2.25,
    }
}

/// Ambience layer for a beat, if it defines one
pub fn ambience_for_beat(id: BeatId, night: f32) -> Option<AmbiencePreset> {
    let n = night.clamp(0.0, 1.0);
    let preset = |whoosh, ocean, rumble, engine, night, tau| AmbiencePreset {
        whoosh,
        ocean,
        rumble,
        engine,
        night,
        tau,
    };
    match id {
        BeatId::CheckpointBreath => Some(preset(0.03, 0.04, 0.02, 0.0001, 0.02 + n * 0.05, 0.22)),
        BeatId::OceanJourney => Some(preset(0.10, 0.28, 0.05, 0.02, 0.02 + n * 0.08, 0.18)),
        BeatId::IslandRest => Some(preset(0.02, 0.10, 0.02, 0.0001, 0.02 + n * 0.05, 0.20)),
        BeatId::MountainFocus => Some(preset(0.06, 0.0001, 0.10, 0.0001, 0.02 + n * 0.06, 0.14)),
        BeatId::NightPassage => Some(preset(0.05, 0.02, 0.06, 0.0001, 0.06 + n * 0.18, 0.14)),
        _ => None,
    }
}

/// Beat-table state machine
#[derive(Debug, Clone)]
pub struct Director {
    base_speed_boost: f32,
    home_score: Option<u32>,
}

impl Director {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            base_speed_boost: tuning.base_speed_boost,
            home_score: tuning.home_score,
        }
    }

    pub fn current_beat(state: &GameState) -> &'static Beat {
        BEATS.get(state.progression.beat_idx).unwrap_or(&BEATS[0])
    }

    /// Enter the first beat of a fresh run
    pub fn start(&mut self, state: &mut GameState, entities: &mut EntityStore) {
        state.progression = ProgressionRecord::default();
        self.enter_beat(state, entities, 0, EnterReason::Boot);
        self.apply_outputs(state);
    }

    pub fn update(&mut self, state: &mut GameState, entities: &mut EntityStore) {
        state.progression.beat_tick += 1;
        self.maybe_checkpoint_breath(state, entities);
        self.advance_if_needed(state, entities);
        self.maybe_start_home(state);
        self.apply_outputs(state);
    }

    /// Jump straight to a beat by id (host debug hook)
    pub fn enter_beat_by_id(
        &mut self,
        state: &mut GameState,
        entities: &mut EntityStore,
        id: BeatId,
    ) -> bool {
        match BEATS.iter().position(|b| b.id == id) {
            Some(idx) => {
                self.enter_beat(state, entities, idx, EnterReason::Auto);
                true
            }
            None => false,
        }
    }

    pub fn enter_beat(
        &mut self,
        state: &mut GameState,
        entities: &mut EntityStore,
        idx: usize,
        reason: EnterReason,
    ) {
        let idx = if idx < BEATS.len() { idx } else { 0 };
        let beat = &BEATS[idx];
        let p = &mut state.progression;
        p.beat_idx = idx;
        p.beat_id = beat.id;
        p.beat_start_score = state.score;
        p.beat_tick = 0;
        p.forced_breath = reason == EnterReason::Checkpoint;
        p.night_target = if beat.night { 1.0 } else { 0.0 };

        let fade = if beat.setpiece.is_some() {
            SETPIECE_FADE
        } else {
            BEAT_FADE
        };
        state.start_theme_fade(beat.theme, fade);

        if beat.safe_on_enter > 0 {
            state.timers.safe = beat.safe_on_enter;
        }

        match beat.setpiece {
            Some(kind) => {
                state.setpiece.request(kind, beat.target_theme);
                entities.clear_world();
                state.timers.safe = 0;
            }
            None => state.setpiece.target_theme = None,
        }

        state.push_event(GameEvent::BeatEntered(beat.id.as_str().to_string()));
        log::info!(
            "Beat {} ({:?}) at score {}",
            beat.id.as_str(),
            reason,
            state.score
        );
    }

    /// A freshly collected blanket interrupts the script with a breather
    fn maybe_checkpoint_breath(&mut self, state: &mut GameState, entities: &mut EntityStore) {
        let was = state.progression.last_checkpoint_active;
        let now = state.checkpoint_active;
        state.progression.last_checkpoint_active = now;

        if !was && now && !state.setpiece.active {
            state.progression.resume_idx = Some((state.progression.beat_idx + 1) % BEATS.len());
            self.enter_beat(state, entities, BREATH_IDX, EnterReason::Checkpoint);
        }
    }

    fn advance_if_needed(&mut self, state: &mut GameState, entities: &mut EntityStore) {
        let beat = Self::current_beat(state);
        let next_idx = (state.progression.beat_idx + 1) % BEATS.len();

        if beat.setpiece.is_some() {
            if state.setpiece.finished {
                state.setpiece.finished = false;
                self.enter_beat(state, entities, next_idx, EnterReason::SetpieceFinished);
            }
            return;
        }

        if Self::beat_progress(state, beat) < 1.0 {
            return;
        }

        if beat.id == BeatId::CheckpointBreath && state.progression.forced_breath {
            let resume = state.progression.resume_idx.take().unwrap_or(next_idx);
            self.enter_beat(state, entities, resume, EnterReason::Resume);
            return;
        }

        self.enter_beat(state, entities, next_idx, EnterReason::Auto);
    }

    fn maybe_start_home(&mut self, state: &mut GameState) {
        let Some(home_score) = self.home_score else {
            return;
        };
        if state.home.phase == HomePhase::Off
            && !state.setpiece.active
            && state.setpiece.requested.is_none()
            && state.score >= home_score
        {
            state.home.phase = HomePhase::Approach;
            state.home.x = state.viewport.w + 60.0;
            log::info!("Home in sight at score {}", state.score);
        }
    }

    fn beat_progress(state: &GameState, beat: &Beat) -> f32 {
        let gained = state.score.saturating_sub(state.progression.beat_start_score);
        (gained as f32 / beat.len_score.max(1) as f32).clamp(0.0, 1.0)
    }

    fn apply_outputs(&mut self, state: &mut GameState) {
        let beat = Self::current_beat(state);
        let u = if beat.setpiece.is_some() {
            state.setpiece.progress()
        } else {
            Self::beat_progress(state, beat)
        };
        state.speed = speed_for_beat(beat.id, u) + self.base_speed_boost;

        let p = &mut state.progression;
        p.night = lerp(p.night, p.night_target, NIGHT_TAU);
        p.ambience = ambience_for_beat(beat.id, p.night.clamp(0.0, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EntityKind, PlatformKind, YMode};
    use crate::sim::rect::Rect;
    use crate::sim::state::Viewport;

    fn setup() -> (Director, GameState, EntityStore) {
        let tuning = Tuning::default();
        let mut director = Director::new(&tuning);
        let mut state = GameState::new(1, &tuning, Viewport::default());
        let mut entities = EntityStore::new();
        director.start(&mut state, &mut entities);
        (director, state, entities)
    }

    #[test]
    fn test_boot_enters_first_beat() {
        let (_, state, _) = setup();
        assert_eq!(state.progression.beat_id, BeatId::ForestIntro);
        assert_eq!(state.theme, ThemeKey::Forest);
        assert!((state.speed - (2.05 + 2.35)).abs() < 1e-4);
    }

    #[test]
    fn test_checkpoint_breath_resumes_after_interrupted_beat() {
        let (mut director, mut state, mut entities) = setup();
        state.score = 40;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_id, BeatId::ForestIntro);

        state.checkpoint_active = true;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_id, BeatId::CheckpointBreath);
        assert_eq!(state.progression.beat_start_score, 40);
        assert_eq!(state.timers.safe, SAFE_AFTER_CHECKPOINT);

        // Holding the shield does not retrigger
        state.score = 50;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_idx, BREATH_IDX);

        // Breath length elapses: resume at the beat that followed FOREST_INTRO
        state.score = 60;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_idx, 1);
        assert!(!state.progression.forced_breath);

        // Scheduled breath then proceeds normally, not to CHECKPOINT_BREATH + 1 twice
        state.score = 80;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_id, BeatId::OceanJourney);
    }

    #[test]
    fn test_breath_mid_table_resumes_in_place() {
        let (mut director, mut state, mut entities) = setup();
        director.enter_beat_by_id(&mut state, &mut entities, BeatId::JungleRun);
        state.score = 10;
        state.checkpoint_active = true;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_id, BeatId::CheckpointBreath);
        state.score = 30;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_id, BeatId::CliffRun);
    }

    #[test]
    fn test_setpiece_beat_waits_for_finish() {
        let (mut director, mut state, mut entities) = setup();
        entities.add(
            Rect::new(300.0, 500.0, 80.0, 56.0),
            YMode::Fixed,
            EntityKind::Platform(PlatformKind::Fence),
        );
        state.timers.safe = 50;
        director.enter_beat_by_id(&mut state, &mut entities, BeatId::OceanJourney);
        assert!(entities.is_empty());
        assert_eq!(state.timers.safe, 0);
        assert_eq!(state.setpiece.requested, Some(SetpieceKind::Ocean));
        assert_eq!(state.setpiece.target_theme, Some(ThemeKey::Island));

        state.score = 500;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_id, BeatId::OceanJourney);

        state.setpiece.finished = true;
        director.update(&mut state, &mut entities);
        assert_eq!(state.progression.beat_id, BeatId::IslandRest);
        assert!(!state.setpiece.finished);
        assert_eq!(state.timers.safe, SAFE_AFTER_CHECKPOINT);
    }

    #[test]
    fn test_beats_visit_in_order_and_loop() {
        let (mut director, mut state, mut entities) = setup();
        let mut visited = vec![state.progression.beat_idx];
        for _ in 0..20_000 {
            if Director::current_beat(&state).setpiece.is_some() {
                state.setpiece.requested = None;
                state.setpiece.finished = true;
            } else {
                state.score += 1;
            }
            director.update(&mut state, &mut entities);
            if visited.last() != Some(&state.progression.beat_idx) {
                visited.push(state.progression.beat_idx);
            }
            if visited.len() > BEATS.len() {
                break;
            }
        }
        let expected: Vec<usize> = (0..BEATS.len()).chain(std::iter::once(0)).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_night_is_smoothed() {
        let (mut director, mut state, mut entities) = setup();
        director.enter_beat_by_id(&mut state, &mut entities, BeatId::NightPassage);
        director.update(&mut state, &mut entities);
        let first = state.progression.night;
        assert!(first > 0.0 && first < 0.2);
        for _ in 0..200 {
            director.update(&mut state, &mut entities);
        }
        assert!(state.night_level() > 0.99);
        assert!(state.progression.ambience.is_some());
    }

    #[test]
    fn test_speed_curves() {
        assert!((speed_for_beat(BeatId::MountainFocus, 1.0) - 2.85).abs() < 1e-5);
        assert!((speed_for_beat(BeatId::OceanJourney, 0.0) - 1.80).abs() < 1e-5);
        assert_eq!(speed_for_beat(BeatId::CityRun, 0.5), 2.25);
        assert!(ambience_for_beat(BeatId::CityRun, 0.0).is_none());
    }

    #[test]
    fn test_pinned_theme_survives_beat_changes() {
        let (mut director, mut state, mut entities) = setup();
        state.set_theme_override(Some(ThemeKey::Desert));
        director.enter_beat_by_id(&mut state, &mut entities, BeatId::JungleRun);
        assert_eq!(state.theme, ThemeKey::Desert);
        assert_eq!(state.progression.beat_id, BeatId::JungleRun);
    }

    #[test]
    fn test_home_sequence_trigger() {
        let tuning = Tuning {
            home_score: Some(30),
            ..Default::default()
        };
        let mut director = Director::new(&tuning);
        let mut state = GameState::new(1, &tuning, Viewport::default());
        let mut entities = EntityStore::new();
        director.start(&mut state, &mut entities);
        state.score = 30;
        director.update(&mut state, &mut entities);
        assert_eq!(state.home.phase, HomePhase::Approach);
    }
}
