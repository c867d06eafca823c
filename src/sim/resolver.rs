//! Per-frame collision and physics resolver
//!
//! Advances timers, scrolls the world in bounded substeps, pushes the player
//! out of solids, then runs hazards, pickups, scoring and cleanup.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{Face, lands_on, resolve_solid, standing_y};
use super::entity::{
    CollectibleKind, DEFAULT_TOAST_FRAMES, DogState, EntityId, EntityKind, EntityStore, Obstacle,
};
use super::player::Player;
use super::setpiece::SetpiecePhase;
use super::state::{Band, ChaseRecord, GameEvent, GameState, HomePhase};
use super::terrain::Terrain;
use crate::consts::*;
use crate::tuning::Tuning;

/// Entities count as passed once their right edge is this far behind the player
const SCORE_MARGIN: f32 = 10.0;
/// A chasing dog starts at least this far behind the player
const CHASE_START_GAP: f32 = 180.0;
/// Separation at which the chase rubber band is fully stretched
const CHASE_RUBBER_BAND: f32 = 220.0;
const BIRD_SQUASH_FRAMES: u32 = 12;
const PAWPRINT_EVERY: u64 = 12;
const PAWPRINT_MIN_SPEED: f32 = 1.4;
const HOME_FADE_STEP: f32 = 0.010;
/// Horizontal easing toward the boarding spot
const BOARD_EASE: f32 = 0.08;

/// First hazard the player touched this frame
#[derive(Debug, Clone, Copy, PartialEq)]
enum Contact {
    Slow(EntityId),
    Chase(EntityId),
    Hurt(EntityId),
}

#[derive(Debug, Clone)]
pub struct Resolver {
    restart_delay: u32,
}

impl Resolver {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            restart_delay: tuning.restart_delay,
        }
    }

    /// Advance the player and the world by one frame
    pub fn update(
        &mut self,
        state: &mut GameState,
        player: &mut Player,
        terrain: &Terrain,
        entities: &mut EntityStore,
        rng: &mut Pcg32,
    ) {
        state.tick += 1;
        state.timers.tick();
        player.set_max_jumps(state.max_jumps());
        state.effective_speed = state.compute_effective_speed();
        state.scroll_delta = state.effective_speed * state.scroll_factor();

        if state.setpiece.active {
            scripted_step(state, player, terrain);
            state.band = Band::Ground;
        } else {
            physics_step(state, player, terrain, entities);
            self.update_chase(state, player, entities);
            self.resolve_hazards(state, player, entities);
            collect(state, player, entities, rng);
            score_and_cleanup(state, player, entities);
            state.band = band_of(player, terrain);
            update_home(state, player);
        }

        for e in entities.iter_mut() {
            e.animate(state.scroll_delta);
        }
        entities.update_pawprints(state.scroll_delta);
        if !state.setpiece.active {
            maybe_pawprint(state, player, terrain, entities, rng);
        }
        player.select_frame(state.scroll_delta);
        entities.update_messages();
        state.update_fade();
    }

    fn update_chase(&self, state: &mut GameState, player: &Player, entities: &mut EntityStore) {
        if !state.chase.active {
            return;
        }
        let Some(id) = entities.chasing_dog_id() else {
            state.chase = ChaseRecord::default();
            return;
        };

        let eff = state.effective_speed;
        let cat_x = player.pos.x;
        let hitbox = player.hitbox();
        let mut caught = false;
        if let Some(dog) = entities.get_mut(id) {
            let boost = match &dog.kind {
                EntityKind::Obstacle(Obstacle::Dog(d)) => d.chase_boost,
                _ => 1.0,
            };
            let rubber = ((cat_x - dog.rect.x()) / CHASE_RUBBER_BAND).clamp(0.0, 1.0);
            let x = dog.rect.x() + eff * boost * (0.85 + 0.65 * rubber);
            dog.rect.pos.x = x.clamp(-100.0, cat_x + 90.0);
            caught = dog.rect.inset(6.0, 6.0, 6.0, 4.0).overlaps(&hitbox);
        }

        let chase = &mut state.chase;
        chase.timer = chase.timer.saturating_sub(1);
        if chase.bark_timer == 0 {
            chase.bark_timer = BARK_INTERVAL;
            state.events.push(GameEvent::Bark);
        } else {
            chase.bark_timer -= 1;
        }

        if caught {
            if !state.is_invulnerable() {
                self.lose_life(state, player, entities);
            }
            // The dog is spent either way
            entities.remove(id);
            state.chase = ChaseRecord::default();
        } else if state.chase.timer == 0 {
            if let Some(EntityKind::Obstacle(Obstacle::Dog(dog))) =
                entities.get_mut(id).map(|e| &mut e.kind)
            {
                dog.chasing = false;
            }
            state.chase = ChaseRecord::default();
            entities.show_toast("escaped!", DEFAULT_TOAST_FRAMES);
            log::debug!("Chase escaped at tick {}", state.tick);
        }
    }

    /// Hazards only bite while the player is vulnerable
    fn resolve_hazards(&self, state: &mut GameState, player: &Player, entities: &mut EntityStore) {
        if state.is_invulnerable() {
            return;
        }
        let hitbox = player.hitbox();
        let chase_active = state.chase.active;
        let contact = entities
            .iter()
            .filter(|e| e.is_hazard() && !e.is_landed_on() && e.hitbox().overlaps(&hitbox))
            .find_map(|e| match &e.kind {
                EntityKind::Obstacle(Obstacle::Yarn) => Some(Contact::Slow(e.id)),
                // The chasing dog is handled by the chase itself
                EntityKind::Obstacle(Obstacle::Dog(DogState { chasing, .. })) => {
                    (!chasing && !chase_active).then_some(Contact::Chase(e.id))
                }
                _ => Some(Contact::Hurt(e.id)),
            });

        match contact {
            Some(Contact::Slow(id)) => {
                entities.remove(id);
                state.timers.slow = SLOW_FRAMES;
                state.events.push(GameEvent::Slow);
                entities.say("slow…", player.bubble_anchor());
            }
            Some(Contact::Chase(id)) => start_chase(state, player, entities, id),
            Some(Contact::Hurt(id)) => {
                self.lose_life(state, player, entities);
                entities.remove(id);
            }
            None => {}
        }
    }

    /// Take a hit. A blanket shield absorbs it instead of a life.
    pub fn lose_life(&self, state: &mut GameState, player: &Player, entities: &mut EntityStore) {
        state.timers.invuln = INVULN_FRAMES;
        state.last_hit_tick = Some(state.tick);
        state.events.push(GameEvent::Hit);

        if state.checkpoint_active {
            state.checkpoint_active = false;
            state.timers.checkpoint_glow = CHECKPOINT_SAVE_GLOW_FRAMES;
            state.events.push(GameEvent::CheckpointSaved);
            entities.show_toast("the blanket saved you", DEFAULT_TOAST_FRAMES);
        } else {
            state.lives = state.lives.saturating_sub(1);
            state.score = state.score.saturating_sub(2);
            state.mice = state.mice.saturating_sub(1);
            entities.say("ouch", player.bubble_anchor());
        }
        log::debug!(
            "Hit at tick {}: {} lives left, score {}",
            state.tick,
            state.lives,
            state.score
        );

        state.chase = ChaseRecord::default();
        entities.retain(|e| !e.is_chasing_dog());

        if state.lives == 0 && state.restart_in.is_none() {
            state.restart_in = Some(self.restart_delay);
            entities.show_toast("out of lives", DEFAULT_TOAST_FRAMES);
            log::info!("Out of lives at score {}, restarting", state.score);
        }
    }
}

fn start_chase(state: &mut GameState, player: &Player, entities: &mut EntityStore, id: EntityId) {
    let Some(e) = entities.get_mut(id) else {
        return;
    };
    e.rect.pos.x = e.rect.x().min(player.pos.x - CHASE_START_GAP);
    if let EntityKind::Obstacle(Obstacle::Dog(dog)) = &mut e.kind {
        dog.chasing = true;
        dog.asleep = false;
    }
    state.chase = ChaseRecord {
        active: true,
        timer: CHASE_FRAMES,
        bark_timer: 0,
    };
    entities.say("nope!", player.bubble_anchor());
    log::debug!("Chase started at tick {}", state.tick);
}

/// Gravity, terrain clamp and substepped solid resolution
fn physics_step(
    state: &GameState,
    player: &mut Player,
    terrain: &Terrain,
    entities: &mut EntityStore,
) {
    let prev_bottom = player.bottom();
    player.gravity_step(state);
    let mut on_surface = clamp_to_ground(player, terrain);

    let total = state.scroll_delta.max(0.0);
    let steps = (total / MAX_SUBSTEP).ceil().max(1.0) as u32;
    let dx = total / steps as f32;
    for _ in 0..steps {
        for e in entities.iter_mut() {
            e.rect.pos.x -= dx;
            e.apply_ground_y(terrain);
        }
        on_surface |= resolve_solids(player, prev_bottom, entities);
    }
    on_surface |= clamp_to_ground(player, terrain);

    player.settle(on_surface);
    player.clamp_x(state.viewport.w);
}

fn clamp_to_ground(player: &mut Player, terrain: &Terrain) -> bool {
    let ground_y = terrain.surface_at(player.pos.x + player.size.x * 0.5) - player.size.y;
    if player.pos.y >= ground_y {
        player.pos.y = ground_y;
        player.vy = player.vy.min(0.0);
        true
    } else {
        false
    }
}

/// Land on or push out of every solid; true when standing on one
fn resolve_solids(player: &mut Player, prev_bottom: f32, entities: &mut EntityStore) -> bool {
    let mut standing = false;
    for e in entities.iter_mut() {
        if !e.is_landable() {
            continue;
        }
        if lands_on(prev_bottom, &player.rect(), player.vy, &e.rect) {
            player.pos.y = standing_y(e.rect.y(), player.size.y);
            player.vy = 0.0;
            standing = true;
            if let EntityKind::Obstacle(Obstacle::Bird(bird)) = &mut e.kind {
                bird.landed_timer = BIRD_SQUASH_FRAMES;
            }
            continue;
        }
        if !e.is_solid() {
            continue;
        }
        let c = resolve_solid(&player.body_box(), &e.solid_box());
        if !c.hit {
            continue;
        }
        player.pos += c.delta;
        match c.face {
            Some(Face::Top) if player.vy >= 0.0 => {
                player.vy = 0.0;
                standing = true;
            }
            Some(Face::Bottom) => player.vy = player.vy.max(0.0),
            _ => {}
        }
    }
    standing
}

/// Setpieces take over the player: walk to the vehicle, ride, step off
fn scripted_step(state: &GameState, player: &mut Player, terrain: &Terrain) {
    let sp = &state.setpiece;
    if sp.player_in_vehicle {
        player.pos = sp.seat(player.size);
        player.vy = 0.0;
        player.settle(false);
        return;
    }
    let target = match sp.phase {
        SetpiecePhase::Board => sp.boarding_x(player.size),
        _ => player.base_x,
    };
    player.pos.x += (target - player.pos.x) * BOARD_EASE;
    player.pos.y = terrain.surface_at(player.pos.x + player.size.x * 0.5) - player.size.y;
    player.vy = 0.0;
    player.settle(true);
}

fn collect(
    state: &mut GameState,
    player: &mut Player,
    entities: &mut EntityStore,
    rng: &mut Pcg32,
) {
    let hitbox = player.hitbox();
    let mut picked = Vec::new();
    let mut blanket = false;
    for e in entities.iter_mut() {
        if !e.rect.overlaps(&hitbox) {
            continue;
        }
        match &mut e.kind {
            EntityKind::Collectible { kind, taken } if !*taken => {
                *taken = true;
                picked.push(*kind);
            }
            EntityKind::Checkpoint { used } if !*used => {
                *used = true;
                blanket = true;
            }
            _ => {}
        }
    }
    entities.retain(|e| !matches!(e.kind, EntityKind::Collectible { taken: true, .. }));

    let anchor = player.bubble_anchor();
    for kind in picked {
        match kind {
            CollectibleKind::Mouse => {
                state.mice += 1;
                state.score += 1;
                state.speed_bonus += MOUSE_SPEED_BUMP;
                state.events.push(GameEvent::Mouse);
                if rng.random::<f32>() < 0.4 {
                    entities.say("miau!", anchor);
                }
            }
            CollectibleKind::Catnip => {
                state.timers.catnip = CATNIP_FRAMES;
                state.events.push(GameEvent::Catnip);
                entities.show_toast("catnip!", DEFAULT_TOAST_FRAMES);
            }
            CollectibleKind::Fish => {
                state.timers.triple_jump = TRIPLE_JUMP_FRAMES;
                player.set_max_jumps(state.max_jumps());
                player.jumps_left = (player.jumps_left + 1).min(player.max_jumps);
                state.events.push(GameEvent::Fish);
                entities.show_toast("triple jump!", DEFAULT_TOAST_FRAMES);
            }
            CollectibleKind::Life => {
                state.lives = (state.lives + 1).min(state.max_lives);
                state.timers.life_pulse = LIFE_PULSE_FRAMES;
                state.events.push(GameEvent::ExtraLife);
            }
        }
    }

    if blanket {
        state.checkpoint_active = true;
        state.timers.checkpoint_glow = CHECKPOINT_GLOW_FRAMES;
        state.events.push(GameEvent::Checkpoint);
        entities.show_toast("checkpoint", DEFAULT_TOAST_FRAMES);
        entities.say("purr", anchor);
    }
}

/// Each passed obstacle or platform scores once; far-left entities go away
fn score_and_cleanup(state: &mut GameState, player: &Player, entities: &mut EntityStore) {
    let line = player.pos.x - SCORE_MARGIN;
    let mut gained = 0;
    for e in entities.iter_mut() {
        if e.is_scorable() && !e.scored && e.rect.right() < line {
            e.scored = true;
            gained += 1;
        }
    }
    state.score += gained;
    entities.retain(|e| e.rect.right() >= CLEANUP_X);
}

fn band_of(player: &Player, terrain: &Terrain) -> Band {
    let surface = terrain.surface_at(player.pos.x + player.size.x * 0.5);
    Band::from_altitude((surface - player.bottom()).max(0.0))
}

fn maybe_pawprint(
    state: &GameState,
    player: &Player,
    terrain: &Terrain,
    entities: &mut EntityStore,
    rng: &mut Pcg32,
) {
    if state.tick % PAWPRINT_EVERY == 0
        && player.on_surface
        && state.effective_speed >= PAWPRINT_MIN_SPEED
        && rng.random::<f32>() < 0.4
    {
        let x = player.pos.x + player.size.x * 0.35;
        entities.drop_pawprint(Vec2::new(x, terrain.surface_at(x) - 6.0));
    }
}

fn update_home(state: &mut GameState, player: &Player) {
    let home = &mut state.home;
    match home.phase {
        HomePhase::Off => {}
        HomePhase::Approach => {
            home.x -= state.scroll_delta;
            if home.x < player.pos.x - 40.0 {
                home.phase = HomePhase::Fade;
                log::info!("Home reached at score {}", state.score);
            }
        }
        HomePhase::Fade => {
            home.fade = (home.fade + HOME_FADE_STEP).min(1.0);
            if home.fade >= 1.0 && !state.finished {
                state.finished = true;
                log::info!("Run finished at score {}", state.score);
            }
        }
    }
}
