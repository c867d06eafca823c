//! Axis-aligned box geometry for entities and the player
//!
//! Screen space: x grows right, y grows down. A box is anchored at its
//! top-left corner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn w(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn h(&self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test (touching edges do not overlap)
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x() < other.right()
            && self.right() > other.x()
            && self.y() < other.bottom()
            && self.bottom() > other.y()
    }

    /// Shrink each side by the given amount; sizes never drop below 1
    pub fn inset(&self, left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect::new(
            self.x() + left,
            self.y() + top,
            (self.w() - left - right).max(1.0),
            (self.h() - top - bottom).max(1.0),
        )
    }

    /// Grow uniformly by `pad` on every side
    pub fn padded(&self, pad: f32) -> Rect {
        Rect::new(
            self.x() - pad,
            self.y() - pad,
            self.w() + pad * 2.0,
            self.h() + pad * 2.0,
        )
    }

    pub fn translated(&self, delta: Vec2) -> Rect {
        Rect {
            pos: self.pos + delta,
            size: self.size,
        }
    }

    /// Horizontal overlap length (0 when disjoint)
    pub fn overlap_x(&self, other: &Rect) -> f32 {
        (self.right().min(other.right()) - self.x().max(other.x())).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_excludes_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        let c = Rect::new(9.5, 9.5, 10.0, 10.0);
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_inset_never_collapses() {
        let r = Rect::new(0.0, 0.0, 10.0, 8.0).inset(8.0, 4.0, 8.0, 0.0);
        assert_eq!(r.x(), 8.0);
        assert_eq!(r.w(), 1.0);
        assert_eq!(r.h(), 4.0);
    }

    #[test]
    fn test_padded_and_overlap_x() {
        let a = Rect::new(10.0, 10.0, 20.0, 20.0);
        let p = a.padded(5.0);
        assert_eq!(p, Rect::new(5.0, 5.0, 30.0, 30.0));
        let b = Rect::new(25.0, 0.0, 100.0, 5.0);
        assert_eq!(a.overlap_x(&b), 5.0);
        assert_eq!(a.overlap_x(&Rect::new(100.0, 0.0, 1.0, 1.0)), 0.0);
    }
}
