//! Screen-space geometry
//!
//! Coordinates follow screen convention: origin top-left, x grows right and
//! y grows down. Angles are in degrees.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use toolite_common::Error;

/// A point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Normalize to `[0, 360)`
fn normalize_degrees(deg: f64) -> f64 {
    let deg = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negatives
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// Angle of the vector from `p2` to `p1`, in `[0, 360)`.
///
/// 0 degrees points along +x and angles grow clockwise on screen.
pub fn angle_between(p1: impl Into<Point>, p2: impl Into<Point>) -> f64 {
    let (p1, p2) = (p1.into(), p2.into());
    let rad = (p1.y - p2.y).atan2(p1.x - p2.x);
    normalize_degrees(rad.to_degrees())
}

/// Where a ray from the center of a `width` x `height` box at `angle` degrees
/// leaves the box. Same angle convention as [`angle_between`].
pub fn find_intersection(width: f64, height: f64, angle: f64) -> Point {
    let (half_w, half_h) = (width / 2.0, height / 2.0);
    let rad = angle.to_radians();
    let (dx, dy) = (rad.cos(), rad.sin());

    let tx = if dx.abs() > f64::EPSILON {
        half_w / dx.abs()
    } else {
        f64::INFINITY
    };
    let ty = if dy.abs() > f64::EPSILON {
        half_h / dy.abs()
    } else {
        f64::INFINITY
    };
    let t = tx.min(ty);

    Point::new(half_w + dx * t, half_h + dy * t)
}

/// Origin for [`circle_position`] angles
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartAngle {
    #[default]
    Top,
    Right,
    Bottom,
    Left,
    /// Explicit offset, 0 = up, 90 = right
    Degrees(f64),
}

impl StartAngle {
    pub fn degrees(self) -> f64 {
        match self {
            StartAngle::Top => 0.0,
            StartAngle::Right => 90.0,
            StartAngle::Bottom => 180.0,
            StartAngle::Left => 270.0,
            StartAngle::Degrees(deg) => deg,
        }
    }
}

impl FromStr for StartAngle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(StartAngle::Top),
            "right" => Ok(StartAngle::Right),
            "bottom" => Ok(StartAngle::Bottom),
            "left" => Ok(StartAngle::Left),
            other => other
                .parse::<f64>()
                .map(StartAngle::Degrees)
                .map_err(|_| Error::invalid_input(format!("Unknown start angle: {:?}", s))),
        }
    }
}

/// Result of [`circle_position`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// Rotation that keeps an element facing outward, in `[0, 360)`
    pub rotation: f64,
}

/// Position on a circle of `radius` around `center`.
///
/// `angle` is measured from `start` in the direction given by `clockwise`;
/// 0 degrees points up and 90 points right.
pub fn circle_position(
    angle: f64,
    radius: f64,
    center: impl Into<Point>,
    start: StartAngle,
    clockwise: bool,
) -> Placement {
    let center = center.into();
    let sweep = if clockwise { angle } else { -angle };
    let effective = normalize_degrees(start.degrees() + sweep);
    let rad = effective.to_radians();

    Placement {
        x: center.x + radius * rad.sin(),
        y: center.y - radius * rad.cos(),
        rotation: effective,
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_angle_between_axes() {
        assert!(close(angle_between((10.0, 0.0), (0.0, 0.0)), 0.0));
        // y down, so +y is clockwise 90
        assert!(close(angle_between((0.0, 10.0), (0.0, 0.0)), 90.0));
        assert!(close(angle_between((-10.0, 0.0), (0.0, 0.0)), 180.0));
        assert!(close(angle_between((0.0, -10.0), (0.0, 0.0)), 270.0));
        assert!(close(angle_between((5.0, 5.0), (0.0, 0.0)), 45.0));
    }

    #[test]
    fn test_angle_between_same_point() {
        assert_eq!(angle_between((3.0, 3.0), (3.0, 3.0)), 0.0);
    }

    #[test]
    fn test_find_intersection() {
        let p = find_intersection(200.0, 100.0, 0.0);
        assert!(close(p.x, 200.0) && close(p.y, 50.0));

        let p = find_intersection(200.0, 100.0, 90.0);
        assert!(close(p.x, 100.0) && close(p.y, 100.0));

        let p = find_intersection(100.0, 100.0, 225.0);
        assert!(close(p.x, 0.0) && close(p.y, 0.0));

        // shallow angle hits the right edge
        let p = find_intersection(200.0, 100.0, 10.0);
        assert!(close(p.x, 200.0));
        assert!(p.y > 50.0 && p.y < 100.0);
    }

    #[test]
    fn test_circle_position_from_top() {
        let center = Point::new(100.0, 100.0);
        let p = circle_position(0.0, 50.0, center, StartAngle::Top, true);
        assert!(close(p.x, 100.0) && close(p.y, 50.0));

        let p = circle_position(90.0, 50.0, center, StartAngle::Top, true);
        assert!(close(p.x, 150.0) && close(p.y, 100.0));
        assert!(close(p.rotation, 90.0));

        let p = circle_position(90.0, 50.0, center, StartAngle::Top, false);
        assert!(close(p.x, 50.0) && close(p.y, 100.0));
        assert!(close(p.rotation, 270.0));
    }

    #[test]
    fn test_circle_position_custom_start() {
        let p = circle_position(0.0, 10.0, (0.0, 0.0), StartAngle::Bottom, true);
        assert!(close(p.x, 0.0) && close(p.y, 10.0));

        let p = circle_position(45.0, 10.0, (0.0, 0.0), StartAngle::Degrees(45.0), true);
        assert!(close(p.x, 10.0) && close(p.y, 0.0));
    }

    #[test]
    fn test_start_angle_parse() {
        assert_eq!("Left".parse::<StartAngle>().unwrap(), StartAngle::Left);
        assert_eq!("30".parse::<StartAngle>().unwrap(), StartAngle::Degrees(30.0));
        assert!("sideways".parse::<StartAngle>().is_err());
    }
}
