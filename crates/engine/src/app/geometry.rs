use std::ops::{Add, AddAssign, Neg, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle with `(x, y)` at the top-left corner and y growing downward.
///
/// Edges are half-open: two rectangles that only share an edge do not overlap, and a
/// rectangle with zero width or height overlaps nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Geometric intersection of both rectangles, `None` when they do not overlap.
    pub fn clip(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partially_overlapping_rects_clip_to_shared_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        assert!(a.overlaps(&b));
        assert_eq!(a.clip(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(b.clip(&a), a.clip(&b));
    }

    #[test]
    fn contained_rect_clips_to_itself() {
        let outer = Rect::new(-20.0, -20.0, 40.0, 40.0);
        let inner = Rect::new(-2.0, 3.0, 4.0, 5.0);

        assert_eq!(outer.clip(&inner), Some(inner));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right_neighbour = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below_neighbour = Rect::new(0.0, 10.0, 10.0, 10.0);

        assert!(!a.overlaps(&right_neighbour));
        assert!(!a.overlaps(&below_neighbour));
        assert_eq!(a.clip(&right_neighbour), None);
    }

    #[test]
    fn empty_rect_never_overlaps() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let empty = Rect::new(2.0, 2.0, 0.0, 5.0);

        assert!(!a.overlaps(&empty));
        assert!(!empty.overlaps(&a));
    }

    #[test]
    fn vec2_arithmetic() {
        let mut p = Vec2::new(100.0, -50.0) + Vec2::new(0.0, -200.0);
        assert_eq!(p, Vec2::new(100.0, -250.0));
        p += Vec2::new(1.0, 1.0);
        assert_eq!(p - Vec2::new(1.0, 1.0), Vec2::new(100.0, -250.0));
        assert_eq!(-Vec2::new(1.0, -2.0), Vec2::new(-1.0, 2.0));
    }
}
