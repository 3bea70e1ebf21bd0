use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// A point on the board. The text form is `"x,y"`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Shorthand for constructing a [`Point`].
#[must_use]
pub const fn pt(x: i32, y: i32) -> Point {
    Point { x, y }
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for Point {
    type Output = Point;

    fn mul(self, k: i32) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

impl Div<i32> for Point {
    type Output = Point;

    fn div(self, k: i32) -> Point {
        Point::new(self.x / k, self.y / k)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Error returned when a point fails to parse from its `"x,y"` text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid point: {0:?}")]
pub struct ParsePointError(pub String);

impl FromStr for Point {
    type Err = ParsePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s.split_once(',').ok_or_else(|| ParsePointError(s.into()))?;
        let x = x.trim().parse().map_err(|_| ParsePointError(s.into()))?;
        let y = y.trim().parse().map_err(|_| ParsePointError(s.into()))?;
        Ok(Point { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip() {
        for p in [pt(0, 0), pt(7, 9), pt(-1, 3), pt(12, -34)] {
            let s = p.to_string();
            assert_eq!(s.parse::<Point>().unwrap(), p);
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Point>().is_err());
        assert!("1".parse::<Point>().is_err());
        assert!("a,b".parse::<Point>().is_err());
        assert!("1,2,3".parse::<Point>().is_err());
    }

    #[test]
    fn vector_arithmetic() {
        assert_eq!(pt(1, 2) + pt(3, 4), pt(4, 6));
        assert_eq!(pt(3, 4) - pt(1, 2), pt(2, 2));
        assert_eq!(pt(1, 2) * 3, pt(3, 6));
        assert_eq!(pt(4, 6) / 2, pt(2, 3));
    }
}
