//! World entities and the live entity store
//!
//! Every entity shares a bounding box and a vertical anchoring mode; the
//! per-type payload lives in [`EntityKind`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use super::terrain::Terrain;
use super::theme::BirdVariant;

pub type EntityId = u32;

/// Vertical anchoring
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum YMode {
    /// Top edge follows the terrain: `y = surface(x) + offset`
    Ground { offset: f32 },
    /// World-space y, untouched by the terrain
    #[default]
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogState {
    pub asleep: bool,
    pub chasing: bool,
    /// Multiplier on the scroll speed while chasing
    pub chase_boost: f32,
    pub anim: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirdState {
    pub variant: BirdVariant,
    pub flap_t: f32,
    /// Falling in from above the viewport
    pub drop: bool,
    pub vy: f32,
    /// Height a dropping bird settles at
    pub rest_y: f32,
    /// Frames of the "landed on" squash
    pub landed_timer: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Yarn,
    Dog(DogState),
    Bird(BirdState),
    /// Overhead slab; solid rather than harmful
    Tunnel,
    Monkey { t: u32 },
    Goat,
    Scorpion { t: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectibleKind {
    Mouse,
    Catnip,
    Fish,
    Life,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformKind {
    Fence,
    Car,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle(Obstacle),
    Collectible { kind: CollectibleKind, taken: bool },
    Platform(PlatformKind),
    /// Blanket checkpoint
    Checkpoint { used: bool },
}

/// A live world object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub rect: Rect,
    pub y_mode: YMode,
    /// Already counted by the scoring pass
    pub scored: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn is_platform(&self) -> bool {
        matches!(self.kind, EntityKind::Platform(_))
    }

    /// Blocks the player from the side and can be stood on
    pub fn is_solid(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Platform(_) | EntityKind::Obstacle(Obstacle::Tunnel)
        )
    }

    /// Birds can be stood on too, which cancels their damage
    pub fn is_landable(&self) -> bool {
        self.is_solid() || matches!(self.kind, EntityKind::Obstacle(Obstacle::Bird(_)))
    }

    /// Obstacle whose contact hurts, slows or starts a chase
    pub fn is_hazard(&self) -> bool {
        match &self.kind {
            EntityKind::Obstacle(o) => !matches!(o, Obstacle::Tunnel | Obstacle::Goat),
            _ => false,
        }
    }

    pub fn is_scorable(&self) -> bool {
        matches!(self.kind, EntityKind::Obstacle(_) | EntityKind::Platform(_))
    }

    pub fn is_chasing_dog(&self) -> bool {
        matches!(
            &self.kind,
            EntityKind::Obstacle(Obstacle::Dog(DogState { chasing: true, .. }))
        )
    }

    /// A bird that was just stood on does no damage
    pub fn is_landed_on(&self) -> bool {
        matches!(
            &self.kind,
            EntityKind::Obstacle(Obstacle::Bird(BirdState { landed_timer, .. }))
                if *landed_timer > 0
        )
    }

    pub fn is_live_collectible(&self, wanted: CollectibleKind) -> bool {
        matches!(self.kind, EntityKind::Collectible { kind, taken: false } if kind == wanted)
    }

    /// Box used for hazard contact
    pub fn hitbox(&self) -> Rect {
        match &self.kind {
            EntityKind::Obstacle(Obstacle::Monkey { .. }) => self.rect.inset(6.0, 8.0, 6.0, 4.0),
            EntityKind::Obstacle(Obstacle::Scorpion { .. }) => {
                self.rect.inset(4.0, 6.0, 4.0, 2.0)
            }
            EntityKind::Obstacle(_) => self.rect.inset(4.0, 4.0, 4.0, 4.0),
            _ => self.rect,
        }
    }

    /// Box the player is pushed out of (solids only)
    pub fn solid_box(&self) -> Rect {
        self.rect.inset(10.0, 6.0, 10.0, 0.0)
    }

    /// Box that later spawns must not intersect
    pub fn spawn_block_box(&self) -> Option<Rect> {
        match &self.kind {
            EntityKind::Platform(_) | EntityKind::Obstacle(Obstacle::Tunnel) => {
                Some(self.rect.inset(8.0, 4.0, 8.0, 0.0))
            }
            EntityKind::Obstacle(Obstacle::Yarn | Obstacle::Dog(_)) => {
                Some(self.rect.inset(2.0, 2.0, 2.0, 2.0))
            }
            _ => None,
        }
    }

    /// Re-anchor a ground-locked entity to the terrain
    pub fn apply_ground_y(&mut self, terrain: &Terrain) {
        if let YMode::Ground { offset } = self.y_mode {
            let mut y = terrain.surface_at(self.rect.x()) + offset;
            if let EntityKind::Obstacle(Obstacle::Monkey { t }) = self.kind {
                y += (t as f32 * 0.08).sin() * 1.2;
            }
            self.rect.pos.y = y;
        }
    }

    /// Per-frame animation and self-propelled motion
    pub fn animate(&mut self, scroll: f32) {
        let EntityKind::Obstacle(obstacle) = &mut self.kind else {
            return;
        };
        match obstacle {
            Obstacle::Bird(bird) => {
                bird.flap_t += 1.0;
                bird.landed_timer = bird.landed_timer.saturating_sub(1);
                if bird.drop {
                    bird.vy = (bird.vy + 0.05).min(4.0);
                    self.rect.pos.y += bird.vy;
                    if self.rect.y() >= bird.rest_y {
                        self.rect.pos.y = bird.rest_y;
                        bird.drop = false;
                        bird.vy = 0.0;
                    }
                }
            }
            Obstacle::Dog(dog) => {
                if !dog.asleep {
                    dog.anim += 1.0;
                }
            }
            Obstacle::Monkey { t } => *t += 1,
            Obstacle::Scorpion { t } => {
                *t += 1;
                let scuttle = (*t as f32 * 0.35).sin() * 0.35;
                self.rect.pos.x -= scroll * 0.18 + scuttle;
            }
            Obstacle::Yarn | Obstacle::Tunnel | Obstacle::Goat => {}
        }
    }
}

/// Decorative footprint left behind the runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pawprint {
    pub pos: Vec2,
    pub life: u32,
}

/// Floating speech bubble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub text: String,
    pub pos: Vec2,
    pub life: u32,
}

/// Short-lived banner message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toast {
    pub text: String,
    pub frames: u32,
}

pub const BUBBLE_LIFE: u32 = 70;
pub const PAWPRINT_LIFE: u32 = 220;
pub const DEFAULT_TOAST_FRAMES: u32 = 120;

/// Live entity list plus decorative particles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    entities: Vec<Entity>,
    pub pawprints: Vec<Pawprint>,
    pub bubbles: Vec<Bubble>,
    pub toast: Option<Toast>,
    next_id: EntityId,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    pub fn add(&mut self, rect: Rect, y_mode: YMode, kind: EntityKind) -> EntityId {
        let id = self.next_entity_id();
        self.entities.push(Entity {
            id,
            rect,
            y_mode,
            scored: false,
            kind,
        });
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(idx))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn retain(&mut self, f: impl FnMut(&Entity) -> bool) {
        self.entities.retain(f);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop every entity and pawprint; bubbles and the toast survive
    pub fn clear_world(&mut self) {
        self.entities.clear();
        self.pawprints.clear();
    }

    /// Drop everything, including messages
    pub fn reset(&mut self) {
        self.clear_world();
        self.bubbles.clear();
        self.toast = None;
    }

    /// Does `probe` intersect anything spawns must avoid?
    pub fn overlaps_solid(&self, probe: &Rect) -> bool {
        self.entities
            .iter()
            .filter_map(Entity::spawn_block_box)
            .any(|b| probe.overlaps(&b))
    }

    pub fn has_live_collectible(&self, kind: CollectibleKind) -> bool {
        self.entities.iter().any(|e| e.is_live_collectible(kind))
    }

    pub fn has_live_checkpoint(&self) -> bool {
        self.entities
            .iter()
            .any(|e| matches!(e.kind, EntityKind::Checkpoint { used: false }))
    }

    pub fn chasing_dog_id(&self) -> Option<EntityId> {
        self.entities.iter().find(|e| e.is_chasing_dog()).map(|e| e.id)
    }

    pub fn say(&mut self, text: impl Into<String>, pos: Vec2) {
        self.bubbles.push(Bubble {
            text: text.into(),
            pos,
            life: BUBBLE_LIFE,
        });
    }

    pub fn show_toast(&mut self, text: impl Into<String>, frames: u32) {
        self.toast = Some(Toast {
            text: text.into(),
            frames,
        });
    }

    /// Age bubbles and the toast
    pub fn update_messages(&mut self) {
        for b in &mut self.bubbles {
            b.pos.y -= 0.08;
            b.life = b.life.saturating_sub(1);
        }
        self.bubbles.retain(|b| b.life > 0);
        if let Some(toast) = &mut self.toast {
            toast.frames = toast.frames.saturating_sub(1);
            if toast.frames == 0 {
                self.toast = None;
            }
        }
    }

    pub fn drop_pawprint(&mut self, pos: Vec2) {
        self.pawprints.push(Pawprint {
            pos,
            life: PAWPRINT_LIFE,
        });
    }

    pub fn update_pawprints(&mut self, dx: f32) {
        for p in &mut self.pawprints {
            p.pos.x -= dx;
            p.life = p.life.saturating_sub(1);
        }
        self.pawprints.retain(|p| p.life > 0 && p.pos.x >= -50.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fence(store: &mut EntityStore, x: f32) -> EntityId {
        store.add(
            Rect::new(x, 500.0, 80.0, 56.0),
            YMode::Fixed,
            EntityKind::Platform(PlatformKind::Fence),
        )
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = EntityStore::new();
        let a = fence(&mut store, 0.0);
        let b = fence(&mut store, 200.0);
        assert_ne!(a, b);
        assert_eq!(store.remove(a).map(|e| e.id), Some(a));
        assert!(store.get(a).is_none());
        assert!(store.get(b).is_some());
    }

    #[test]
    fn test_overlaps_solid_uses_inset_box() {
        let mut store = EntityStore::new();
        fence(&mut store, 100.0);
        // Touches the fence only inside its 8px side inset
        assert!(!store.overlaps_solid(&Rect::new(80.0, 510.0, 26.0, 10.0)));
        assert!(store.overlaps_solid(&Rect::new(120.0, 510.0, 10.0, 10.0)));
        // Collectibles never block
        store.add(
            Rect::new(300.0, 300.0, 20.0, 20.0),
            YMode::Fixed,
            EntityKind::Collectible {
                kind: CollectibleKind::Mouse,
                taken: false,
            },
        );
        assert!(!store.overlaps_solid(&Rect::new(300.0, 300.0, 20.0, 20.0)));
    }

    #[test]
    fn test_clear_world_keeps_messages() {
        let mut store = EntityStore::new();
        fence(&mut store, 0.0);
        store.drop_pawprint(Vec2::new(10.0, 10.0));
        store.say("purr", Vec2::ZERO);
        store.show_toast("hello", 10);
        store.clear_world();
        assert!(store.is_empty());
        assert!(store.pawprints.is_empty());
        assert_eq!(store.bubbles.len(), 1);
        assert!(store.toast.is_some());
    }

    #[test]
    fn test_messages_expire() {
        let mut store = EntityStore::new();
        store.say("miau!", Vec2::new(0.0, 100.0));
        store.show_toast("hi", 2);
        store.update_messages();
        assert!((store.bubbles[0].pos.y - 99.92).abs() < 1e-4);
        store.update_messages();
        assert!(store.toast.is_none());
        for _ in 0..BUBBLE_LIFE {
            store.update_messages();
        }
        assert!(store.bubbles.is_empty());
    }

    #[test]
    fn test_drop_bird_settles_at_rest_height() {
        let mut store = EntityStore::new();
        let id = store.add(
            Rect::new(200.0, -100.0, 36.0, 20.0),
            YMode::Fixed,
            EntityKind::Obstacle(Obstacle::Bird(BirdState {
                variant: BirdVariant::Crow,
                flap_t: 0.0,
                drop: true,
                vy: 0.5,
                rest_y: 350.0,
                landed_timer: 0,
            })),
        );
        for _ in 0..2000 {
            for e in store.iter_mut() {
                e.animate(3.0);
            }
        }
        let bird = store.get(id).unwrap();
        assert_eq!(bird.rect.y(), 350.0);
        assert!(matches!(
            bird.kind,
            EntityKind::Obstacle(Obstacle::Bird(BirdState { drop: false, .. }))
        ));
    }

    #[test]
    fn test_classification() {
        let mut store = EntityStore::new();
        let goat = store.add(
            Rect::new(0.0, 0.0, 58.0, 48.0),
            YMode::Ground { offset: -48.0 },
            EntityKind::Obstacle(Obstacle::Goat),
        );
        let tunnel = store.add(
            Rect::new(0.0, 0.0, 150.0, 26.0),
            YMode::Fixed,
            EntityKind::Obstacle(Obstacle::Tunnel),
        );
        let goat = store.get(goat).unwrap();
        let tunnel = store.get(tunnel).unwrap();
        assert!(!goat.is_hazard());
        assert!(goat.is_scorable());
        assert!(tunnel.is_solid());
        assert!(!tunnel.is_hazard());
    }
}
