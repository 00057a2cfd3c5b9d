use super::Vec2;

/// Screen rectangle stored as its `[x1, y1, x2, y2]` corners, in physical
/// pixels with the origin at the top-left of the surface.
///
/// Corners are kept as given. A rectangle whose `x2 < x1` is representable so
/// that drawing calls can reject it with a useful message.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    /// Rectangle with its top-left corner at `(x, y)`.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_corners(x, y, x + width, y + height)
    }

    #[inline]
    pub const fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn corners(self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline]
    pub fn top_left(self) -> Vec2 {
        Vec2::new(self.x1, self.y1)
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.corners().iter().all(|c| c.is_finite())
    }

    /// `x2 >= x1` and `y2 >= y1`. Zero-area rectangles qualify.
    #[inline]
    pub fn is_ordered(self) -> bool {
        self.is_finite() && self.x2 >= self.x1 && self.y2 >= self.y1
    }

    /// `x2 > x1` and `y2 > y1`.
    #[inline]
    pub fn has_area(self) -> bool {
        self.is_finite() && self.x2 > self.x1 && self.y2 > self.y1
    }

    /// Same area with the corners swapped into ascending order.
    #[inline]
    pub fn sorted(self) -> Self {
        Self::from_corners(
            self.x1.min(self.x2),
            self.y1.min(self.y2),
            self.x1.max(self.x2),
            self.y1.max(self.y2),
        )
    }

    /// Moves the rectangle so its top-left corner sits at
    /// `point - floor(size / 2)`. Odd sizes stay on whole pixels.
    pub fn centered_on(self, point: Vec2) -> Self {
        let (w, h) = (self.width(), self.height());
        Self::new(point.x - (w / 2.0).floor(), point.y - (h / 2.0).floor(), w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn corners_are_kept_as_given() {
        let rect = Rect::from_corners(100.0, 100.0, 1000.0, 800.0);
        assert_eq!(rect, Rect::new(100.0, 100.0, 900.0, 700.0));
        assert_eq!(rect.corners(), [100.0, 100.0, 1000.0, 800.0]);
        assert_eq!((rect.width(), rect.height()), (900.0, 700.0));
    }

    #[test]
    fn inverted_corners_give_negative_width() {
        let rect = Rect::from_corners(10.0, 0.0, 4.0, 5.0);
        assert_eq!(rect.width(), -6.0);
        assert!(!rect.is_ordered());
    }

    // ── validity ──────────────────────────────────────────────────────────

    #[test]
    fn zero_width_is_ordered_but_has_no_area() {
        let rect = Rect::from_corners(10.0, 10.0, 10.0, 20.0);
        assert!(rect.is_ordered());
        assert!(!rect.has_area());
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).has_area());
    }

    #[test]
    fn non_finite_corners_are_rejected() {
        let rect = Rect::from_corners(0.0, 0.0, f32::INFINITY, 5.0);
        assert!(!rect.is_ordered());
        assert!(!rect.has_area());
    }

    #[test]
    fn sorted_swaps_inverted_corners() {
        let rect = Rect::from_corners(10.0, 8.0, 6.0, 2.0).sorted();
        assert_eq!(rect.corners(), [6.0, 2.0, 10.0, 8.0]);
        let ok = Rect::new(1.0, 2.0, 10.0, 20.0);
        assert_eq!(ok.sorted(), ok);
    }

    // ── centered_on ───────────────────────────────────────────────────────

    #[test]
    fn centering_floors_half_size() {
        let rect = Rect::new(0.0, 0.0, 101.0, 50.0).centered_on(Vec2::new(400.0, 300.0));
        assert_eq!(rect.corners(), [350.0, 275.0, 451.0, 325.0]);
    }
}
