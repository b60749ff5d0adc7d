use serde::{Deserialize, Serialize};

/// Represents a point in content or screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn divide(&self, scalar: f64) -> Point {
        Point::new(self.x / scalar, self.y / scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    /// Apply `f` to both components
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Point {
        Point::new(f(self.x), f(self.y))
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// A width/height pair, used both for pixel dimensions and tile counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn times(&self, factor: f64) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }

    /// Apply `f` to both components
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Size {
        Size::new(f(self.width), f(self.height))
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 5.0);
        assert_eq!(a.add(&b), Point::new(4.0, 7.0));
        assert_eq!(b.subtract(&a), Point::new(2.0, 3.0));
        assert_eq!(a.multiply(2.0), Point::new(2.0, 4.0));
        assert_eq!(a.distance_to(&Point::new(4.0, 6.0)), 5.0);
    }

    #[test]
    fn test_size_map_and_times() {
        let size = Size::new(1200.0, 800.0).times(0.25);
        assert_eq!(size, Size::new(300.0, 200.0));
        assert_eq!(Size::new(2.2, 3.7).map(f64::ceil), Size::new(3.0, 4.0));
        assert!(Size::new(0.0, 10.0).is_empty());
    }
}
