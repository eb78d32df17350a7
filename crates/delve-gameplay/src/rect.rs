//! Axis-aligned rectangle math for swept collision.
//!
//! Rectangles are stored as top-left corner plus size, in tile units, with
//! `y` growing downwards. The swept test treats the mover as a point: the
//! obstacle is first grown by the mover's half-extents (a Minkowski sum), then
//! each edge of the grown rectangle is tested against the point's path.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Which axis a contact blocks.
///
/// A `Horizontal` plane is hit through the top or bottom edge and blocks
/// vertical motion; a `Vertical` plane is hit through the left or right edge
/// and blocks horizontal motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionPlane {
    /// No contact
    #[default]
    None,
    /// Top or bottom edge
    Horizontal,
    /// Left or right edge
    Vertical,
    /// Both axes blocked (corner contact)
    Both,
}

/// An edge of a rectangle, in wall-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RectEdge {
    /// Edge 0
    Top,
    /// Edge 1
    Right,
    /// Edge 2
    Bottom,
    /// Edge 3
    Left,
}

impl RectEdge {
    /// All edges in wall-index order.
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// Returns the wall index (0 = top, 1 = right, 2 = bottom, 3 = left).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Right => 1,
            Self::Bottom => 2,
            Self::Left => 3,
        }
    }

    /// Returns the plane a hit on this edge is classified as.
    ///
    /// Even wall indices are horizontal, odd ones vertical.
    #[must_use]
    pub const fn plane(self) -> CollisionPlane {
        if self.index() % 2 == 0 {
            CollisionPlane::Horizontal
        } else {
            CollisionPlane::Vertical
        }
    }
}

/// Axis-aligned rectangle in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FloatRect {
    /// Left edge
    pub left: f32,
    /// Top edge
    pub top: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl FloatRect {
    /// Creates a new rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Creates a rectangle of the given size anchored at the origin.
    #[must_use]
    pub const fn from_size(size: Vec2) -> Self {
        Self::new(0.0, 0.0, size.x, size.y)
    }

    /// Returns the top-left corner.
    #[must_use]
    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    /// Returns the size as a vector.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Returns half of the size.
    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Returns the right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Returns the bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.top_left() + self.half_extents()
    }

    /// Returns the rectangle moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.left + offset.x, self.top + offset.y, self.width, self.height)
    }

    /// Grows `self` by the half-extents of `mover` on every side.
    ///
    /// Testing the mover's center point against the result is equivalent to
    /// testing the mover's full rectangle against `self`.
    #[must_use]
    pub fn minkowski_sum(&self, mover: &Self) -> Self {
        let half = mover.half_extents();
        Self::new(
            self.left - half.x,
            self.top - half.y,
            self.width + mover.width,
            self.height + mover.height,
        )
    }

    /// Static overlap test. Rectangles that only touch do not collide.
    #[must_use]
    pub fn collides_with(&self, other: &Self) -> bool {
        self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }

    /// Point-in-rectangle test, boundary included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    /// Time at which `point` moving by `delta` crosses `edge`.
    ///
    /// Returns `Some(t)` with `t` in `[0, 1]` only when the point is moving
    /// towards the edge, reaches it within this displacement, and the
    /// crossing lies within the edge's extent (not just on its infinite line).
    /// A `t` of exactly 0 means the point starts in contact.
    #[must_use]
    pub fn max_time(&self, point: Vec2, delta: Vec2, edge: RectEdge) -> Option<f32> {
        // (edge line, point coord, motion) along the edge normal, then the
        // same along the edge itself with the edge's extent.
        let (line, origin, motion, along, along_motion, lo, hi) = match edge {
            RectEdge::Top => (self.top, point.y, delta.y, point.x, delta.x, self.left, self.right()),
            RectEdge::Bottom => (
                self.bottom(),
                point.y,
                delta.y,
                point.x,
                delta.x,
                self.left,
                self.right(),
            ),
            RectEdge::Left => (self.left, point.x, delta.x, point.y, delta.y, self.top, self.bottom()),
            RectEdge::Right => (
                self.right(),
                point.x,
                delta.x,
                point.y,
                delta.y,
                self.top,
                self.bottom(),
            ),
        };

        let approaching = match edge {
            RectEdge::Top | RectEdge::Left => motion > 0.0,
            RectEdge::Bottom | RectEdge::Right => motion < 0.0,
        };
        if !approaching {
            return None;
        }

        let t = (line - origin) / motion;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        let crossing = along + along_motion * t;
        (lo..=hi).contains(&crossing).then_some(t)
    }

    /// Earliest edge hit of `point` moving by `delta`, with the edge it hit.
    #[must_use]
    pub fn time_of_impact(&self, point: Vec2, delta: Vec2) -> Option<(f32, RectEdge)> {
        RectEdge::ALL
            .iter()
            .filter_map(|&edge| self.max_time(point, delta, edge).map(|t| (t, edge)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rect_edges() {
        let rect = FloatRect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(rect.right(), 4.0);
        assert_eq!(rect.bottom(), 6.0);
        assert_eq!(rect.center(), Vec2::new(2.5, 4.0));
    }

    #[test]
    fn test_edge_planes() {
        assert_eq!(RectEdge::Top.plane(), CollisionPlane::Horizontal);
        assert_eq!(RectEdge::Bottom.plane(), CollisionPlane::Horizontal);
        assert_eq!(RectEdge::Left.plane(), CollisionPlane::Vertical);
        assert_eq!(RectEdge::Right.plane(), CollisionPlane::Vertical);
    }

    #[test]
    fn test_minkowski_sum() {
        let tile = FloatRect::new(5.0, 5.0, 1.0, 1.0);
        let mover = FloatRect::new(0.0, 0.0, 0.4, 0.2);
        let grown = tile.minkowski_sum(&mover);
        assert!((grown.left - 4.8).abs() < 1e-6);
        assert!((grown.top - 4.9).abs() < 1e-6);
        assert!((grown.width - 1.4).abs() < 1e-6);
        assert!((grown.height - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_collides_with() {
        let a = FloatRect::new(0.0, 0.0, 10.0, 10.0);
        let b = FloatRect::new(5.0, 5.0, 10.0, 10.0);
        let c = FloatRect::new(20.0, 20.0, 10.0, 10.0);
        let touching = FloatRect::new(10.0, 0.0, 5.0, 5.0);

        assert!(a.collides_with(&b));
        assert!(b.collides_with(&a));
        assert!(!a.collides_with(&c));
        assert!(!a.collides_with(&touching));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let rect = FloatRect::new(0.0, 0.0, 1.0, 1.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(rect.contains(Vec2::new(1.0, 1.0)));
        assert!(!rect.contains(Vec2::new(1.01, 0.5)));
    }

    #[test]
    fn test_max_time_left_edge() {
        let rect = FloatRect::new(4.0, 0.0, 1.0, 2.0);
        let t = rect.max_time(Vec2::new(2.0, 1.0), Vec2::new(4.0, 0.0), RectEdge::Left);
        assert_eq!(t, Some(0.5));
    }

    #[test]
    fn test_max_time_zero_motion_is_no_hit() {
        let rect = FloatRect::new(4.0, 0.0, 1.0, 2.0);
        assert_eq!(
            rect.max_time(Vec2::new(2.0, 1.0), Vec2::new(0.0, 3.0), RectEdge::Left),
            None
        );
    }

    #[test]
    fn test_max_time_outside_edge_span() {
        let rect = FloatRect::new(4.0, 0.0, 1.0, 2.0);
        // Crosses the left edge's line at y = 5, below the edge.
        assert_eq!(
            rect.max_time(Vec2::new(2.0, 5.0), Vec2::new(4.0, 0.0), RectEdge::Left),
            None
        );
    }

    #[test]
    fn test_max_time_moving_away() {
        let rect = FloatRect::new(4.0, 0.0, 1.0, 2.0);
        assert_eq!(
            rect.max_time(Vec2::new(2.0, 1.0), Vec2::new(-4.0, 0.0), RectEdge::Left),
            None
        );
        // Inside the rectangle and heading out through the right edge.
        assert_eq!(
            rect.max_time(Vec2::new(4.5, 1.0), Vec2::new(4.0, 0.0), RectEdge::Right),
            None
        );
    }

    #[test]
    fn test_max_time_beyond_displacement() {
        let rect = FloatRect::new(4.0, 0.0, 1.0, 2.0);
        assert_eq!(
            rect.max_time(Vec2::new(2.0, 1.0), Vec2::new(1.0, 0.0), RectEdge::Left),
            None
        );
    }

    #[test]
    fn test_max_time_starting_in_contact() {
        let rect = FloatRect::new(4.0, 0.0, 1.0, 2.0);
        assert_eq!(
            rect.max_time(Vec2::new(4.0, 1.0), Vec2::new(1.0, 0.0), RectEdge::Left),
            Some(0.0)
        );
    }

    #[test]
    fn test_time_of_impact_picks_earliest_edge() {
        let rect = FloatRect::new(0.0, 0.0, 2.0, 2.0);
        // Moving down-right from above-left; hits the top edge first.
        let hit = rect.time_of_impact(Vec2::new(0.5, -1.0), Vec2::new(1.0, 2.0));
        let (t, edge) = hit.expect("should hit");
        assert_eq!(edge, RectEdge::Top);
        assert!((t - 0.5).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_max_time_in_unit_range(
            left in -10.0f32..10.0,
            top in -10.0f32..10.0,
            width in 0.1f32..5.0,
            height in 0.1f32..5.0,
            px in -20.0f32..20.0,
            py in -20.0f32..20.0,
            dx in -30.0f32..30.0,
            dy in -30.0f32..30.0,
        ) {
            let rect = FloatRect::new(left, top, width, height);
            for edge in RectEdge::ALL {
                if let Some(t) = rect.max_time(Vec2::new(px, py), Vec2::new(dx, dy), edge) {
                    prop_assert!((0.0..=1.0).contains(&t));
                }
            }
        }
    }
}
