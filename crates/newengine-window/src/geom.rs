use serde::{Deserialize, Serialize};

/// Integer pixel coordinate (also used for sizes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn add(self, o: Point) -> Point {
        Point::new(self.x + o.x, self.y + o.y)
    }

    #[inline]
    pub fn sub(self, o: Point) -> Point {
        Point::new(self.x - o.x, self.y - o.y)
    }

    #[inline]
    pub fn mul(self, s: i32) -> Point {
        Point::new(self.x * s, self.y * s)
    }
}

/// Sub-pixel position, used by pointer input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Half-open rectangle `[min, max)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    #[inline]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0, y0),
            max: Point::new(x1, y1),
        }
    }

    #[inline]
    pub fn from_size(size: Point) -> Self {
        Self {
            min: Point::ZERO,
            max: size,
        }
    }

    #[inline]
    pub fn size(&self) -> Point {
        self.max.sub(self.min)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    #[inline]
    pub fn translate(&self, off: Point) -> Rect {
        Rect {
            min: self.min.add(off),
            max: self.max.add(off),
        }
    }

    #[inline]
    pub fn contains(&self, p: PointF) -> bool {
        p.x >= self.min.x as f32
            && p.y >= self.min.y as f32
            && p.x < self.max.x as f32
            && p.y < self.max.y as f32
    }

    /// `true` when `other` lies completely inside `self`.
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    #[inline]
    pub fn center(&self) -> PointF {
        PointF::new(
            (self.min.x + self.max.x) as f32 * 0.5,
            (self.min.y + self.max.y) as f32 * 0.5,
        )
    }
}

/// Pixel insets reported by the platform (notches, system bars).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Insets {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// Device independent length.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dp(pub f32);

/// Conversion factors from device independent units to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub px_per_dp: f32,
    pub px_per_sp: f32,
}

impl Default for Metric {
    fn default() -> Self {
        Self {
            px_per_dp: 1.0,
            px_per_sp: 1.0,
        }
    }
}

impl Metric {
    #[inline]
    pub fn from_scale(scale: f64) -> Self {
        Self {
            px_per_dp: scale as f32,
            px_per_sp: scale as f32,
        }
    }

    #[inline]
    pub fn dp(&self, v: Dp) -> i32 {
        (v.0 * self.px_per_dp).round() as i32
    }

    #[inline]
    pub fn px_to_dp(&self, px: i32) -> Dp {
        if self.px_per_dp == 0.0 {
            return Dp(px as f32);
        }
        Dp(px as f32 / self.px_per_dp)
    }
}

/// Non-premultiplied 8-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(0xff, 0xff, 0xff, 0xff);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(PointF::new(0.0, 0.0)));
        assert!(r.contains(PointF::new(9.5, 9.5)));
        assert!(!r.contains(PointF::new(10.0, 5.0)));
    }

    #[test]
    fn metric_rounds_dp() {
        let m = Metric::from_scale(1.5);
        assert_eq!(m.dp(Dp(32.0)), 48);
        assert_eq!(m.dp(Dp(1.0)), 2);
    }
}
