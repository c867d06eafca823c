//! Procedural rolling terrain
//!
//! The ground is a run of control points spaced `STEP_X` apart. Heights are
//! generated with a slope-damped random walk so hills stay beatable, and the
//! surface between two points is smoothstep-interpolated.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::Viewport;
use crate::{lerp, smoothstep};

/// Horizontal spacing of control points
pub const STEP_X: f32 = 170.0;
/// Largest height change between neighbouring points
pub const MAX_DELTA: f32 = 44.0;
/// Points seeded around the base height before regular generation
const SEED_POINTS: usize = 10;

/// Ground height profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    points: Vec<Vec2>,
    viewport_w: f32,
    min_y: f32,
    max_y: f32,
    base_y: f32,
}

impl Terrain {
    /// Create and seed a terrain for the given viewport
    pub fn new(viewport: Viewport, rng: &mut Pcg32) -> Self {
        let mut terrain = Self {
            points: Vec::new(),
            viewport_w: viewport.w,
            min_y: 0.0,
            max_y: 0.0,
            base_y: 0.0,
        };
        terrain.init(viewport, rng);
        terrain
    }

    /// (Re)generate the point run; also used when the viewport resizes
    pub fn init(&mut self, viewport: Viewport, rng: &mut Pcg32) {
        self.viewport_w = viewport.w;
        self.min_y = viewport.h - 190.0;
        self.max_y = viewport.h - 46.0;
        self.base_y = viewport.h - 80.0;
        self.points.clear();

        let mut x = -STEP_X;
        let mut y = self.base_y;
        for _ in 0..SEED_POINTS {
            self.points.push(Vec2::new(x, y));
            x += STEP_X;
            let dy = rng.random_range(-1.0..1.0) * MAX_DELTA * 0.30;
            y = (y + dy).clamp(self.min_y, self.max_y);
        }
        self.extend(rng);
    }

    /// Scroll left by `dx`, drop points past the left margin, extend on the right
    pub fn update(&mut self, dx: f32, rng: &mut Pcg32) {
        for p in &mut self.points {
            p.x -= dx;
        }
        while self.points.len() > 2 && self.points[1].x < -STEP_X {
            self.points.remove(0);
        }
        self.extend(rng);
    }

    fn extend(&mut self, rng: &mut Pcg32) {
        while self
            .points
            .last()
            .is_some_and(|p| p.x < self.viewport_w + STEP_X)
        {
            self.add_point(rng);
        }
    }

    fn add_point(&mut self, rng: &mut Pcg32) {
        let n = self.points.len();
        let last = self.points[n - 1];
        let prev = if n >= 2 { self.points[n - 2] } else { last };
        let slope = last.y - prev.y;

        let noise = rng.random_range(-1.0..1.0) * MAX_DELTA;
        let delta = (-slope * 0.35 + noise * 0.30).clamp(-MAX_DELTA, MAX_DELTA);
        let y = (last.y + delta).clamp(self.min_y, self.max_y);
        self.points.push(Vec2::new(last.x + STEP_X, y));
    }

    /// Interpolated surface height at screen x
    pub fn surface_at(&self, x: f32) -> f32 {
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if x >= a.x && x <= b.x {
                let u = (x - a.x) / (b.x - a.x);
                return lerp(a.y, b.y, smoothstep(u));
            }
        }
        // Outside the generated run: clamp to the nearest end
        match (self.points.first(), self.points.last()) {
            (Some(first), _) if x < first.x => first.y,
            (_, Some(last)) => last.y,
            _ => self.base_y,
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn min_y(&self) -> f32 {
        self.min_y
    }

    pub fn max_y(&self) -> f32 {
        self.max_y
    }

    pub fn base_y(&self) -> f32 {
        self.base_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn viewport() -> Viewport {
        Viewport { w: 360.0, h: 640.0 }
    }

    fn assert_invariants(t: &Terrain) {
        let pts = t.points();
        for p in pts {
            assert!(p.y >= t.min_y() && p.y <= t.max_y(), "y {} out of bounds", p.y);
        }
        for pair in pts.windows(2) {
            assert!(pair[1].x > pair[0].x);
            assert!((pair[1].y - pair[0].y).abs() <= MAX_DELTA + 1e-3);
        }
        // Viewport plus one step of margin on both sides
        assert!(pts[0].x <= -STEP_X + 1e-3 || pts[1].x < 0.0);
        assert!(pts[pts.len() - 1].x >= 360.0 + STEP_X);
    }

    #[test]
    fn test_init_covers_viewport() {
        let mut rng = Pcg32::seed_from_u64(1);
        let t = Terrain::new(viewport(), &mut rng);
        assert_invariants(&t);
        assert_eq!(t.points()[0], Vec2::new(-STEP_X, t.base_y()));
    }

    #[test]
    fn test_surface_hits_control_points() {
        let mut rng = Pcg32::seed_from_u64(2);
        let t = Terrain::new(viewport(), &mut rng);
        for p in t.points() {
            assert!((t.surface_at(p.x) - p.y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_resize_regenerates() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut t = Terrain::new(viewport(), &mut rng);
        t.init(Viewport { w: 1280.0, h: 720.0 }, &mut rng);
        assert_eq!(t.max_y(), 720.0 - 46.0);
        assert!(t.points().last().unwrap().x >= 1280.0 + STEP_X);
    }

    proptest! {
        #[test]
        fn prop_bounds_hold_while_scrolling(
            seed in any::<u64>(),
            dxs in prop::collection::vec(0.0f32..40.0, 1..400),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut t = Terrain::new(viewport(), &mut rng);
            for dx in dxs {
                t.update(dx, &mut rng);
            }
            assert_invariants(&t);
        }

        #[test]
        fn prop_surface_is_continuous(seed in any::<u64>(), x in -150.0f32..500.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let t = Terrain::new(viewport(), &mut rng);
            let eps = 0.01;
            let a = t.surface_at(x);
            let b = t.surface_at(x + eps);
            // Max slope of a smoothstep segment is 1.5 * MAX_DELTA / STEP_X
            prop_assert!((a - b).abs() <= 1.5 * MAX_DELTA / STEP_X * eps + 1e-3);
        }
    }
}
