//! 2D vector helpers and axis-aligned rectangles
//!
//! Screen convention: x grows right, y grows down.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Two-component f64 vector. Value semantics: every operation returns a new vector.
pub type Vector2 = DVec2;

/// Operations the integrator needs beyond what glam provides
pub trait VectorExt: Sized {
    /// Snap each component whose magnitude is below `epsilon` to zero
    fn threshold(self, epsilon: f64) -> Self;
    /// Clamp each component into `[min, max]`
    fn clamp_components(self, min: f64, max: f64) -> Self;
    /// Unit vector, or zero for a zero-length input
    fn normalized(self) -> Self;
}

impl VectorExt for DVec2 {
    #[inline]
    fn threshold(self, epsilon: f64) -> Self {
        let snap = |c: f64| if c.abs() < epsilon { 0.0 } else { c };
        DVec2::new(snap(self.x), snap(self.y))
    }

    #[inline]
    fn clamp_components(self, min: f64, max: f64) -> Self {
        DVec2::new(self.x.clamp(min, max), self.y.clamp(min, max))
    }

    #[inline]
    fn normalized(self) -> Self {
        self.normalize_or_zero()
    }
}

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at `pos` with the given size
    pub fn from_pos_size(pos: Vector2, size: Vector2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn min(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> Vector2 {
        Vector2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive AABB test: touching edges count as intersecting
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn contains_point(&self, p: Vector2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Overlap extent along each axis (negative when separated on that axis)
    pub fn overlap(&self, other: &Rect) -> Vector2 {
        Vector2::new(
            self.right().min(other.right()) - self.x.max(other.x),
            self.bottom().min(other.bottom()) - self.y.max(other.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_threshold_snaps_small_components() {
        let v = Vector2::new(0.001, -3.0).threshold(0.01);
        assert_eq!(v, Vector2::new(0.0, -3.0));
        let v = Vector2::new(-0.009, 0.009).threshold(0.01);
        assert_eq!(v, Vector2::ZERO);
    }

    #[test]
    fn test_normalized_zero_is_zero() {
        assert_eq!(Vector2::ZERO.normalized(), Vector2::ZERO);
        let n = Vector2::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_components() {
        let v = Vector2::new(12.0, -12.0).clamp_components(-5.0, 5.0);
        assert_eq!(v, Vector2::new(5.0, -5.0));
    }

    #[test]
    fn test_rect_intersects_and_overlap() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(10.0, 4.0, 16.0, 16.0);
        let c = Rect::new(40.0, 0.0, 4.0, 4.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.overlap(&b), Vector2::new(6.0, 12.0));
        assert!(a.overlap(&c).x < 0.0);
    }

    #[test]
    fn test_rect_touching_edges_intersect() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(16.0, 0.0, 16.0, 16.0);
        assert!(a.intersects(&b));
        assert!(!a.contains_point(Vector2::new(16.0, 8.0)));
        assert!(b.contains_point(Vector2::new(16.0, 8.0)));
    }

    proptest! {
        #[test]
        fn prop_threshold_never_leaves_small_components(x in -1.0f64..1.0, y in -1.0f64..1.0, eps in 0.0f64..0.5) {
            let v = Vector2::new(x, y).threshold(eps);
            prop_assert!(v.x == 0.0 || v.x.abs() >= eps);
            prop_assert!(v.y == 0.0 || v.y.abs() >= eps);
            prop_assert!(v.x == 0.0 || v.x == x);
            prop_assert!(v.y == 0.0 || v.y == y);
        }

        #[test]
        fn prop_intersects_is_symmetric(
            ax in -50.0f64..50.0, ay in -50.0f64..50.0, aw in 0.0f64..40.0, ah in 0.0f64..40.0,
            bx in -50.0f64..50.0, by in -50.0f64..50.0, bw in 0.0f64..40.0, bh in 0.0f64..40.0,
        ) {
            let a = Rect::new(ax, ay, aw, ah);
            let b = Rect::new(bx, by, bw, bh);
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }
    }
}
