//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One `tick()` per host frame, fixed component order
//! - Seeded RNG only, owned by the [`World`]
//! - Stable iteration order (entities in spawn order)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod entity;
pub mod player;
pub mod progression;
pub mod rect;
pub mod resolver;
pub mod setpiece;
pub mod spawn;
pub mod state;
pub mod terrain;
pub mod theme;
pub mod tick;
pub mod world;

pub use collision::{Correction, Face, lands_on, resolve_solid};
pub use entity::{
    Bubble, CollectibleKind, Entity, EntityId, EntityKind, EntityStore, Obstacle, Pawprint,
    PlatformKind, Toast, YMode,
};
pub use player::Player;
pub use progression::{AmbiencePreset, BEATS, Beat, BeatId, Director};
pub use rect::Rect;
pub use resolver::Resolver;
pub use setpiece::{SetpieceKind, SetpieceManager, SetpiecePhase, SetpieceRecord, Vehicle};
pub use spawn::{Placement, Slot, SlotOdds, Spawner};
pub use state::{Band, GameEvent, GameState, HomePhase, Mood, Viewport};
pub use terrain::Terrain;
pub use theme::{BirdVariant, ThemeKey};
pub use tick::{TickInput, tick};
pub use world::{Snapshot, World};
