//! Content spawner
//!
//! A countdown in world distance decides *when* a pack appears at the right
//! edge; a theme-, score- and band-weighted roll decides *what*. Every
//! ground placement probes a few offsets so nothing spawns inside a solid.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{
    BirdState, CollectibleKind, DogState, EntityId, EntityKind, EntityStore, Obstacle,
    PlatformKind, YMode,
};
use super::rect::Rect;
use super::state::{Band, GameState};
use super::terrain::Terrain;
use super::theme::{BirdVariant, DogSlot, SpawnWeights, Theme};
use crate::tuning::{SpawnTuning, Tuning};

/// Packs appear this far right of the viewport edge
const PACK_OFFSET: f32 = 140.0;
const LIFE_OFFSET: f32 = 260.0;
const CHECKPOINT_OFFSET: f32 = 200.0;

/// Offsets tried, in order, when placing a collectible
const COLLECTIBLE_PROBES: [(f32, f32); 7] = [
    (0.0, 0.0),
    (0.0, -18.0),
    (0.0, -36.0),
    (18.0, -18.0),
    (-18.0, -18.0),
    (24.0, -36.0),
    (-24.0, -36.0),
];
const GROUND_NUDGES: u32 = 7;
const FENCE_SHIFTS: u32 = 10;

/// Hazard slot chosen for a pack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Fence,
    Dog,
    Bird,
    Yarn,
    Tunnel,
}

/// Final per-pack probabilities after score, theme and band weighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotOdds {
    pub fence: f32,
    pub dog: f32,
    pub bird: f32,
    pub yarn: f32,
    pub tunnel: f32,
    pub mouse: f32,
    pub fish: f32,
    pub catnip: f32,
}

/// Result of a placement probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub pos: Vec2,
    /// No clear spot was found; `pos` is the guaranteed-valid fallback
    pub fallback: bool,
}

/// Bookkeeping for one spawned entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placed {
    pub id: EntityId,
    /// Box checked against existing solids (None for free-flying spawns)
    pub probe: Option<Rect>,
    pub fallback: bool,
}

/// Band multipliers: higher up favours birds and pickups over ground hazards
pub fn band_bias(band: Band) -> SpawnWeights {
    match band {
        Band::Ground => SpawnWeights::NEUTRAL,
        Band::Mid => SpawnWeights {
            fence: 0.85,
            dog: 0.75,
            bird: 1.60,
            yarn: 0.85,
            tunnel: 0.85,
            mouse: 1.10,
            fish: 1.05,
            catnip: 1.05,
        },
        Band::Air => SpawnWeights {
            fence: 0.55,
            dog: 0.45,
            bird: 1.35,
            yarn: 0.60,
            tunnel: 0.55,
            mouse: 1.15,
            fish: 1.10,
            catnip: 1.10,
        },
    }
}

/// Emits obstacle/collectible packs ahead of the viewport
#[derive(Debug, Clone)]
pub struct Spawner {
    tuning: SpawnTuning,
    bonus_life_interval: u32,
    checkpoint_interval: u32,
    next_spawn_in: f32,
    last_life_score: Option<u32>,
    last_checkpoint_score: Option<u32>,
    /// Entities emitted by the most recent spawn call
    pub last_placed: Vec<Placed>,
}

impl Spawner {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tuning: tuning.spawn.clone(),
            bonus_life_interval: tuning.bonus_life_interval,
            checkpoint_interval: tuning.checkpoint_interval,
            next_spawn_in: tuning.spawn.initial_countdown,
            last_life_score: None,
            last_checkpoint_score: None,
            last_placed: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.next_spawn_in = self.tuning.initial_countdown;
        self.last_life_score = None;
        self.last_checkpoint_score = None;
        self.last_placed.clear();
    }

    pub fn next_spawn_in(&self) -> f32 {
        self.next_spawn_in
    }

    /// Minimum gap between packs; shrinks with score down to a floor
    pub fn min_gap_for_score(&self, score: u32) -> f32 {
        let t = &self.tuning;
        (t.gap_base - score as f32 * t.gap_slope).clamp(t.gap_min, t.gap_base)
    }

    /// Back-to-back hazards are only allowed past a score threshold
    pub fn close_gap_chance(&self, score: u32) -> f32 {
        if score < self.tuning.close_gap_start_score {
            0.0
        } else {
            self.tuning.close_gap_chance_max
        }
    }

    pub fn slot_odds(&self, state: &GameState) -> SlotOdds {
        let theme = state.theme.theme();
        let s = state.score as f32;
        let t = &self.tuning;
        let z = theme.zone(state.band);
        let m = theme.spawns.scaled(&band_bias(state.band));

        let fence = z.fence * (0.24 + s * 0.0022).clamp(0.22, 0.32);
        let bird = z.bird * ((0.09 + s * 0.0018) * t.animals_scale).clamp(0.07, 0.14);
        let dog = z.dog * ((0.10 + s * 0.0017) * t.animals_scale).clamp(0.08, 0.16);
        let yarn = z.yarn * 0.18;
        let tunnel = if state.score >= t.tunnel_start_score {
            z.tunnel * (0.04 + s * 0.0006).clamp(0.04, 0.10)
        } else {
            0.0
        };
        let mouse = 0.18 * t.collectibles_scale;
        let fish = ((0.05 + s * 0.0008) * t.collectibles_scale).clamp(0.04, 0.07);
        let catnip = if state.timers.catnip > 0 {
            0.0
        } else {
            z.catnip * ((0.05 + s * 0.0008) * t.collectibles_scale).clamp(0.04, 0.08)
        };

        SlotOdds {
            fence: fence * m.fence,
            dog: dog * m.dog,
            bird: bird * m.bird,
            yarn: yarn * m.yarn,
            tunnel: tunnel * m.tunnel,
            mouse: mouse * m.mouse,
            fish: fish * m.fish,
            catnip: catnip * m.catnip,
        }
    }

    /// Cumulative roll; safe windows only ever get fences
    pub fn roll_slot(odds: &SlotOdds, safe: bool, rng: &mut Pcg32) -> Slot {
        if safe {
            return Slot::Fence;
        }
        let r: f32 = rng.random();
        let mut acc = 0.0;
        for (p, slot) in [
            (odds.fence, Slot::Fence),
            (odds.dog, Slot::Dog),
            (odds.bird, Slot::Bird),
            (odds.yarn, Slot::Yarn),
            (odds.tunnel, Slot::Tunnel),
        ] {
            acc += p;
            if r < acc {
                return slot;
            }
        }
        Slot::Fence
    }

    /// Per-frame countdown plus the bonus-life and checkpoint offers
    pub fn update(
        &mut self,
        state: &mut GameState,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
    ) {
        self.last_placed.clear();
        if state.spawning_suppressed() {
            return;
        }

        self.next_spawn_in -= state.scroll_delta;
        if self.next_spawn_in <= 0.0 {
            let x = state.viewport.w + PACK_OFFSET;
            let safe = state.timers.safe > 0;
            self.spawn_pack(state, terrain, entities, rng, x, safe);
        }

        self.maybe_offer_life(state, terrain, entities);
        self.maybe_offer_checkpoint(state, terrain, entities);
    }

    fn maybe_offer_life(
        &mut self,
        state: &GameState,
        terrain: &Terrain,
        entities: &mut EntityStore,
    ) {
        let score = state.score;
        if state.lives >= state.max_lives
            || score == 0
            || score % self.bonus_life_interval != 0
            || self.last_life_score == Some(score)
            || entities.has_live_collectible(CollectibleKind::Life)
        {
            return;
        }
        self.last_life_score = Some(score);
        let x = state.viewport.w + LIFE_OFFSET;
        let y = terrain.surface_at(x) - 90.0;
        self.add_collectible(entities, terrain, CollectibleKind::Life, x, y, 20.0, 20.0);
        log::debug!("Bonus life offered at score {score}");
    }

    fn maybe_offer_checkpoint(
        &mut self,
        state: &GameState,
        terrain: &Terrain,
        entities: &mut EntityStore,
    ) {
        let score = state.score;
        if score == 0
            || score % self.checkpoint_interval != 0
            || self.last_checkpoint_score == Some(score)
            || state.checkpoint_active
            || entities.has_live_checkpoint()
        {
            return;
        }
        self.last_checkpoint_score = Some(score);
        let (w, h) = (34.0, 22.0);
        let x = state.viewport.w + CHECKPOINT_OFFSET;
        let y = terrain.surface_at(x) - h - 4.0;
        let placement = place_collectible(entities, terrain, x, y, w, h);
        let rect = Rect::new(placement.pos.x, placement.pos.y, w, h);
        let id = entities.add(rect, YMode::Fixed, EntityKind::Checkpoint { used: false });
        self.last_placed.push(Placed {
            id,
            probe: Some(rect),
            fallback: placement.fallback,
        });
        log::debug!("Checkpoint offered at score {score}");
    }

    /// Emit one pack at `spawn_x` and rearm the countdown
    pub fn spawn_pack(
        &mut self,
        state: &GameState,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
        spawn_x: f32,
        safe: bool,
    ) {
        let theme = state.theme.theme();
        let odds = self.slot_odds(state);
        let gap_min = self.min_gap_for_score(state.score);
        let close_gap = if rng.random::<f32>() < self.close_gap_chance(state.score) {
            (gap_min * (0.62 + rng.random::<f32>() * 0.12)).floor()
        } else {
            0.0
        };

        let slot = Self::roll_slot(&odds, safe, rng);
        log::debug!(
            "Pack {:?} at score {} (theme {}, band {:?}, safe {})",
            slot,
            state.score,
            theme.label,
            state.band,
            safe
        );

        match slot {
            Slot::Fence => self.spawn_fences(terrain, entities, rng, spawn_x, &odds),
            Slot::Bird => {
                let variant = bird_variant(theme, state.night_level(), rng);
                self.spawn_bird(state, terrain, entities, rng, spawn_x, variant);
            }
            Slot::Dog => self.spawn_dog_slot(theme, terrain, entities, rng, spawn_x),
            Slot::Yarn => self.spawn_yarn(terrain, entities, spawn_x, 28.0),
            Slot::Tunnel => self.spawn_tunnel(terrain, entities, rng, spawn_x),
        }

        self.spawn_extras(terrain, entities, rng, spawn_x, &odds);

        if close_gap > 0.0 {
            let x2 = spawn_x + close_gap;
            if rng.random::<f32>() < 0.55 {
                self.spawn_yarn(terrain, entities, x2, 26.0);
            } else {
                let y = terrain.surface_at(x2) - (160.0 + rng.random::<f32>() * 40.0);
                let rect = Rect::new(x2, y, 34.0, 18.0);
                let variant = bird_variant(theme, state.night_level(), rng);
                let id = entities.add(
                    rect,
                    YMode::Fixed,
                    EntityKind::Obstacle(Obstacle::Bird(BirdState {
                        variant,
                        flap_t: rng.random::<f32>() * 1000.0,
                        drop: false,
                        vy: 0.0,
                        rest_y: y,
                        landed_timer: 0,
                    })),
                );
                self.last_placed.push(Placed {
                    id,
                    probe: None,
                    fallback: false,
                });
            }
        }

        self.next_spawn_in = gap_min + (rng.random::<f32>() * self.tuning.gap_jitter).floor();
        if safe {
            self.next_spawn_in += self.tuning.safe_extra_gap;
        }
    }

    fn spawn_fences(
        &mut self,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
        spawn_x: f32,
        odds: &SlotOdds,
    ) {
        let t = &self.tuning;
        let staircase = rng.random::<f32>() < t.staircase_chance;
        let count = if staircase {
            rng.random_range(t.staircase_min..=t.staircase_max)
        } else {
            1
        };
        let collectibles_scale = t.collectibles_scale;

        let mut x = spawn_x;
        let mut lift = 0.0;
        for step in 0..count {
            let w = 72.0 + (rng.random::<f32>() * 28.0).floor();
            let h = 56.0;

            // Staircases climb; single fences sometimes float
            let grounded = if staircase {
                if step > 0 {
                    lift += 40.0 + rng.random::<f32>() * 20.0;
                }
                step == 0
            } else {
                let grounded = rng.random::<f32>() < 0.68;
                if !grounded {
                    lift = 80.0 + rng.random::<f32>() * 110.0;
                }
                grounded
            };

            let top_at = |x: f32| terrain.surface_at(x) - h - if grounded { 0.0 } else { lift };
            let probe_at = |x: f32| Rect::new(x, top_at(x), w, h).inset(8.0, 2.0, 8.0, 0.0);

            let mut top = top_at(x);
            let mut fallback = false;
            let mut shifts = 0;
            while entities.overlaps_solid(&probe_at(x)) {
                if shifts == FENCE_SHIFTS {
                    fallback = true;
                    break;
                }
                x += w + 34.0;
                top = top_at(x);
                shifts += 1;
            }

            let (y_mode, rect) = if grounded {
                (YMode::Ground { offset: -h }, Rect::new(x, top, w, h))
            } else {
                (YMode::Fixed, Rect::new(x, top, w, h))
            };
            let id = entities.add(rect, y_mode, EntityKind::Platform(PlatformKind::Fence));
            self.last_placed.push(Placed {
                id,
                probe: Some(probe_at(x)),
                fallback,
            });

            // Goodies riding on the fence
            if rng.random::<f32>() < 0.30 * collectibles_scale {
                let (cx, cy) = (x + w * 0.36, top - 28.0);
                let kind = CollectibleKind::Mouse;
                self.add_collectible(entities, terrain, kind, cx, cy, 22.0, 16.0);
            }
            if rng.random::<f32>() < odds.catnip * 0.55 {
                let (cx, cy) = (x + w * 0.64, top - 36.0);
                let kind = CollectibleKind::Catnip;
                self.add_collectible(entities, terrain, kind, cx, cy, 18.0, 18.0);
            }
            if rng.random::<f32>() < odds.fish * 0.45 {
                let (cx, cy) = (x + w * 0.16, top - 28.0);
                let kind = CollectibleKind::Fish;
                self.add_collectible(entities, terrain, kind, cx, cy, 18.0, 14.0);
            }

            x += w + 40.0;
        }
    }

    fn spawn_bird(
        &mut self,
        state: &GameState,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
        spawn_x: f32,
        variant: BirdVariant,
    ) {
        let (w, h) = (36.0, 20.0);
        let extra = if state.timers.catnip > 0 { 18.0 } else { 0.0 };
        let ground = terrain.surface_at(spawn_x);
        let drop = rng.random::<f32>() < 0.22;
        let y = if drop {
            -80.0 - rng.random::<f32>() * 140.0
        } else {
            ground - (150.0 + rng.random::<f32>() * 75.0 + extra)
        };
        let rest_y = ground - (150.0 + rng.random::<f32>() * 60.0 + extra);
        let vy = if drop {
            0.2 + rng.random::<f32>() * 0.6
        } else {
            0.0
        };
        let id = entities.add(
            Rect::new(spawn_x, y, w, h),
            YMode::Fixed,
            EntityKind::Obstacle(Obstacle::Bird(BirdState {
                variant,
                flap_t: rng.random::<f32>() * 1000.0,
                drop,
                vy,
                rest_y,
                landed_timer: 0,
            })),
        );
        self.last_placed.push(Placed {
            id,
            probe: None,
            fallback: false,
        });
    }

    /// The dog slot is re-skinned per theme
    fn spawn_dog_slot(
        &mut self,
        theme: &Theme,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
        spawn_x: f32,
    ) {
        let (w, h) = match theme.dog_slot {
            DogSlot::Car => (110.0, 44.0),
            DogSlot::Monkey => (54.0, 54.0),
            DogSlot::Goat | DogSlot::Scorpion => (58.0, 48.0),
            DogSlot::Dog => (58.0, 36.0),
        };
        let pad = 26.0;
        let placement = place_ground_obstacle(entities, terrain, spawn_x, w, h, pad);
        let kind = match theme.dog_slot {
            DogSlot::Car => EntityKind::Platform(PlatformKind::Car),
            DogSlot::Monkey => EntityKind::Obstacle(Obstacle::Monkey { t: 0 }),
            DogSlot::Goat => EntityKind::Obstacle(Obstacle::Goat),
            DogSlot::Scorpion => EntityKind::Obstacle(Obstacle::Scorpion { t: 0 }),
            DogSlot::Dog => EntityKind::Obstacle(Obstacle::Dog(DogState {
                asleep: rng.random::<f32>() < 0.55,
                chasing: false,
                chase_boost: 1.45 + rng.random::<f32>() * 0.22,
                anim: rng.random::<f32>() * 100.0,
            })),
        };
        self.add_ground(entities, placement, w, h, pad, kind);
    }

    fn spawn_yarn(&mut self, terrain: &Terrain, entities: &mut EntityStore, x: f32, size: f32) {
        let pad = 18.0;
        let placement = place_ground_obstacle(entities, terrain, x, size, size, pad);
        self.add_ground(
            entities,
            placement,
            size,
            size,
            pad,
            EntityKind::Obstacle(Obstacle::Yarn),
        );
    }

    /// Overhead slab the runner ducks under or hops onto
    fn spawn_tunnel(
        &mut self,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
        spawn_x: f32,
    ) {
        let w = 150.0 + (rng.random::<f32>() * 40.0).floor();
        let h = 26.0;
        let clearance = 150.0 + rng.random::<f32>() * 30.0;
        let mut fallback = true;
        let mut rect = Rect::new(spawn_x, terrain.surface_at(spawn_x) - clearance - h, w, h);
        for k in 0..GROUND_NUDGES {
            let x = spawn_x + nudge(k);
            let candidate = Rect::new(x, terrain.surface_at(x) - clearance - h, w, h);
            if !entities.overlaps_solid(&candidate.padded(18.0)) {
                rect = candidate;
                fallback = false;
                break;
            }
        }
        let id = entities.add(rect, YMode::Fixed, EntityKind::Obstacle(Obstacle::Tunnel));
        self.last_placed.push(Placed {
            id,
            probe: Some(rect.padded(18.0)),
            fallback,
        });
    }

    /// Loose pickups around the pack
    fn spawn_extras(
        &mut self,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
        spawn_x: f32,
        odds: &SlotOdds,
    ) {
        if rng.random::<f32>() < odds.mouse {
            let x = spawn_x + 30.0 + rng.random::<f32>() * 40.0;
            let y = if rng.random::<f32>() < 0.70 {
                terrain.surface_at(x) - 16.0
            } else {
                terrain.surface_at(x) - 70.0 - rng.random::<f32>() * 25.0
            };
            self.add_collectible(entities, terrain, CollectibleKind::Mouse, x, y, 22.0, 16.0);
        }
        if rng.random::<f32>() < odds.fish * 0.55 {
            let x = spawn_x + 40.0;
            let y = terrain.surface_at(x) - 88.0 - rng.random::<f32>() * 30.0;
            self.add_collectible(entities, terrain, CollectibleKind::Fish, x, y, 18.0, 14.0);
        }
        if rng.random::<f32>() < odds.catnip * 0.55 {
            let x = spawn_x + 20.0;
            let y = terrain.surface_at(x) - 100.0 - rng.random::<f32>() * 40.0;
            self.add_collectible(entities, terrain, CollectibleKind::Catnip, x, y, 18.0, 18.0);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_collectible(
        &mut self,
        entities: &mut EntityStore,
        terrain: &Terrain,
        kind: CollectibleKind,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    ) {
        let placement = place_collectible(entities, terrain, x, y, w, h);
        let rect = Rect::new(placement.pos.x, placement.pos.y, w, h);
        let id = entities.add(
            rect,
            YMode::Fixed,
            EntityKind::Collectible { kind, taken: false },
        );
        self.last_placed.push(Placed {
            id,
            probe: Some(rect),
            fallback: placement.fallback,
        });
    }

    fn add_ground(
        &mut self,
        entities: &mut EntityStore,
        placement: Placement,
        w: f32,
        h: f32,
        pad: f32,
        kind: EntityKind,
    ) {
        let rect = Rect::new(placement.pos.x, placement.pos.y, w, h);
        let id = entities.add(rect, YMode::Ground { offset: -h }, kind);
        self.last_placed.push(Placed {
            id,
            probe: Some(rect.padded(pad)),
            fallback: placement.fallback,
        });
    }
}

fn bird_variant(theme: &Theme, night: f32, rng: &mut Pcg32) -> BirdVariant {
    if night > 0.78 && rng.random::<f32>() < 0.45 {
        BirdVariant::Bat
    } else {
        theme.bird_variant
    }
}

/// 0, +20, -20, +40, -40, ...
fn nudge(k: u32) -> f32 {
    if k == 0 {
        0.0
    } else {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        sign * 20.0 * k.div_ceil(2) as f32
    }
}

/// First clear spot among a few offsets, else lift well above the ground
pub fn place_collectible(
    entities: &EntityStore,
    terrain: &Terrain,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
) -> Placement {
    for (dx, dy) in COLLECTIBLE_PROBES {
        let probe = Rect::new(x + dx, y + dy, w, h);
        if !entities.overlaps_solid(&probe) {
            return Placement {
                pos: probe.pos,
                fallback: false,
            };
        }
    }
    Placement {
        pos: Vec2::new(x, y.min(terrain.surface_at(x) - 110.0 - h)),
        fallback: true,
    }
}

/// Nudge along x until the padded box is clear, else keep the original spot
pub fn place_ground_obstacle(
    entities: &EntityStore,
    terrain: &Terrain,
    x: f32,
    w: f32,
    h: f32,
    pad: f32,
) -> Placement {
    for k in 0..GROUND_NUDGES {
        let xx = x + nudge(k);
        let yy = terrain.surface_at(xx) - h;
        if !entities.overlaps_solid(&Rect::new(xx, yy, w, h).padded(pad)) {
            return Placement {
                pos: Vec2::new(xx, yy),
                fallback: false,
            };
        }
    }
    Placement {
        pos: Vec2::new(x, terrain.surface_at(x) - h),
        fallback: true,
    }
}
