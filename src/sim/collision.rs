//! Collision primitives for box-vs-box resolution
//!
//! Pure functions: given the player's boxes and a solid, report how the
//! player has to move. The resolver applies the result.

use glam::Vec2;

use super::rect::Rect;

/// Which face of the solid the player was pushed out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Left,
    Right,
    Top,
    Bottom,
}

/// Result of resolving the player against one solid
#[derive(Debug, Clone)]
pub struct Correction {
    /// Whether the boxes overlapped at all
    pub hit: bool,
    /// Displacement to apply to the player
    pub delta: Vec2,
    pub face: Option<Face>,
}

impl Correction {
    pub fn miss() -> Self {
        Self {
            hit: false,
            delta: Vec2::ZERO,
            face: None,
        }
    }

    /// Pushed up onto the solid's top face
    pub fn is_top(&self) -> bool {
        self.face == Some(Face::Top)
    }
}

/// Share of a rightward push that is actually applied. Rightward corrections
/// are damped so a solid can never shove the player off the right edge.
pub const RIGHT_PUSH_DAMPING: f32 = 0.35;

/// Resolve `body` out of `solid` along the axis of least overlap
pub fn resolve_solid(body: &Rect, solid: &Rect) -> Correction {
    if !body.overlaps(solid) {
        return Correction::miss();
    }

    let overlap_l = body.right() - solid.x();
    let overlap_r = solid.right() - body.x();
    let overlap_t = body.bottom() - solid.y();
    let overlap_b = solid.bottom() - body.y();

    let min_x = overlap_l.min(overlap_r);
    let min_y = overlap_t.min(overlap_b);

    let (delta, face) = if min_x < min_y {
        if overlap_l < overlap_r {
            (Vec2::new(-(overlap_l + 0.5), 0.0), Face::Left)
        } else {
            (
                Vec2::new(-(overlap_r + 0.5) * RIGHT_PUSH_DAMPING, 0.0),
                Face::Right,
            )
        }
    } else if overlap_t < overlap_b {
        (Vec2::new(0.0, -(overlap_t + 0.5)), Face::Top)
    } else {
        (Vec2::new(0.0, overlap_b + 0.5), Face::Bottom)
    };

    Correction {
        hit: true,
        delta,
        face: Some(face),
    }
}

/// Top band a falling player can land through
pub const LANDING_BAND: f32 = 10.0;

/// Did the player fall onto `top` this frame?
///
/// True when last frame's feet were above (or within the band of) the top
/// edge, this frame's feet are at or below it, the player is not rising, and
/// the middle 40% of the player overlaps the landing surface horizontally.
pub fn lands_on(prev_bottom: f32, player: &Rect, vy: f32, target: &Rect) -> bool {
    let top = target.y();
    let in_band = prev_bottom <= top + LANDING_BAND && player.bottom() >= top;
    let x_overlap = player.x() + player.w() * 0.70 > target.x()
        && player.x() + player.w() * 0.30 < target.right();
    vy >= 0.0 && in_band && x_overlap
}

/// Player top-left y that stands on a surface at `top`
pub fn standing_y(top: f32, player_h: f32) -> f32 {
    top - player_h + 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_overlap_is_miss() {
        let body = Rect::new(0.0, 0.0, 10.0, 10.0);
        let solid = Rect::new(20.0, 0.0, 10.0, 10.0);
        let c = resolve_solid(&body, &solid);
        assert!(!c.hit);
        assert_eq!(c.delta, Vec2::ZERO);
    }

    #[test]
    fn test_side_hit_pushes_left() {
        // Body runs into the solid's left face
        let body = Rect::new(0.0, 0.0, 40.0, 40.0);
        let solid = Rect::new(35.0, -20.0, 60.0, 100.0);
        let c = resolve_solid(&body, &solid);
        assert_eq!(c.face, Some(Face::Left));
        assert!((c.delta.x + 5.5).abs() < 1e-5);
        assert_eq!(c.delta.y, 0.0);
    }

    #[test]
    fn test_right_face_push_is_damped_and_still_leftward() {
        // Body overlaps the solid's right face by 4
        let body = Rect::new(56.0, 0.0, 40.0, 40.0);
        let solid = Rect::new(0.0, -20.0, 60.0, 100.0);
        let c = resolve_solid(&body, &solid);
        assert_eq!(c.face, Some(Face::Right));
        assert!((c.delta.x + 4.5 * RIGHT_PUSH_DAMPING).abs() < 1e-5);
    }

    #[test]
    fn test_shallow_vertical_overlap_lands_on_top() {
        let body = Rect::new(10.0, 0.0, 40.0, 42.0);
        let solid = Rect::new(0.0, 40.0, 100.0, 30.0);
        let c = resolve_solid(&body, &solid);
        assert!(c.is_top());
        assert!((c.delta.y + 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_bonk_from_below() {
        let body = Rect::new(10.0, 68.0, 40.0, 40.0);
        let solid = Rect::new(0.0, 40.0, 100.0, 30.0);
        let c = resolve_solid(&body, &solid);
        assert_eq!(c.face, Some(Face::Bottom));
        assert!(c.delta.y > 0.0);
    }

    #[test]
    fn test_landing_band() {
        let target = Rect::new(100.0, 400.0, 80.0, 56.0);
        let player = Rect::new(90.0, 345.0, 58.0, 58.0);
        // Fell from above through the top edge
        assert!(lands_on(396.0, &player, 2.0, &target));
        // Rising through it does not count
        assert!(!lands_on(396.0, &player, -2.0, &target));
        // Already well below the top last frame: side contact, not a landing
        assert!(!lands_on(420.0, &player, 2.0, &target));
        // Only the outer 30% overlaps horizontally
        let edge = Rect::new(30.0, 345.0, 58.0, 58.0);
        assert!(!lands_on(396.0, &edge, 2.0, &target));
    }

    #[test]
    fn test_standing_y() {
        assert_eq!(standing_y(400.0, 58.0), 344.0);
    }
}
