//! Per-frame simulation step
//!
//! One call advances the whole world exactly once, always in the same order:
//! director, terrain, resolver, setpiece manager, spawner.

use super::state::{GameEvent, Viewport};
use super::theme::ThemeKey;
use super::world::World;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Jump (tap/space)
    pub jump: bool,
    /// Pause/rest toggle
    pub pause: bool,
    /// Cycle the speed preset
    pub cycle_speed: bool,
    /// `Some(Some(key))` pins a theme, `Some(None)` releases the pin
    pub theme_override: Option<Option<ThemeKey>>,
    /// New viewport size when the host resized
    pub viewport: Option<Viewport>,
    /// Demo mode - the cat jumps by itself
    pub autopilot: bool,
}

/// Advance the world by one frame
pub fn tick(world: &mut World, input: &TickInput) {
    world.state.events.clear();

    // Host intents land even while paused
    if input.cycle_speed {
        world.cycle_speed();
    }
    if let Some(key) = input.theme_override {
        world.state.set_theme_override(key);
    }
    if let Some(viewport) = input.viewport {
        world.resize(viewport);
    }

    if input.pause {
        let pause = &mut world.state.pause;
        pause.active = !pause.active;
        pause.frames = 0;
        log::info!("{}", if pause.active { "Paused" } else { "Resumed" });
    }
    if world.state.pause.active {
        world.state.pause.frames += 1;
        return;
    }
    if world.state.finished {
        return;
    }

    if let Some(frames) = world.state.restart_in {
        if frames == 0 {
            world.restart();
            return;
        }
        world.state.restart_in = Some(frames - 1);
    }

    let jump = input.jump || (input.autopilot && autopilot_wants_jump(world));
    if jump && !world.state.setpiece.active && world.player.jump(&world.state) {
        world.state.push_event(GameEvent::Jump);
    }

    let World {
        state,
        player,
        terrain,
        entities,
        director,
        setpieces,
        spawner,
        resolver,
        rng,
        ..
    } = world;

    director.update(state, entities);
    // The resolver recomputes scroll this frame; terrain follows last frame's
    terrain.update(state.scroll_delta, rng);
    resolver.update(state, player, terrain, entities, rng);
    setpieces.update(state, terrain, entities, rng);
    spawner.update(state, terrain, entities, rng);
}

/// Jump when something hurtful or walled sits just ahead at running height
fn autopilot_wants_jump(world: &World) -> bool {
    let player = &world.player;
    let body = player.rect();
    let lookahead = 40.0 + world.state.effective_speed * 14.0;

    let threat = world.entities.iter().any(|e| {
        (e.is_hazard() || e.is_solid())
            && e.rect.right() > body.x()
            && e.rect.x() < body.right() + lookahead
            && e.rect.bottom() > body.y()
            && e.rect.y() < body.bottom()
    });

    // Second jump once the first one starts falling
    threat && (player.on_surface || player.vy > 1.5)
}
