/*
 * Copyright 2019 Zejun Li
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use serde::{Deserialize, Serialize};

/// A single vertex. `exact` distinguishes vertices that came straight from
/// input data from ones a curve-flattening or boolean-op step produced;
/// the merge-length detector only trusts `exact` vertices when deciding
/// whether an edge is a straight line worth checking for collinearity.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_exact")]
    pub exact: bool,
}

fn default_exact() -> bool {
    true
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y, exact: true }
    }

    pub fn inexact(x: f64, y: f64) -> Point {
        Point { x, y, exact: false }
    }

    pub fn zero() -> Point {
        Point::new(0.0, 0.0)
    }

    pub fn distance_squared(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn vector_to(self, other: Point) -> Point {
        Point::inexact(other.x - self.x, other.y - self.y)
    }

    pub fn translated(self, dx: f64, dy: f64) -> Point {
        Point { x: self.x + dx, y: self.y + dy, exact: self.exact }
    }

    /// Rotates this point about the origin by `degrees`, matching the
    /// convention used throughout the placement and merge-length code
    /// (counter-clockwise, positive degrees).
    pub fn rotated(self, degrees: f64) -> Point {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Point {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
            exact: self.exact,
        }
    }
}

impl From<Point> for geo_types::Coord<f64> {
    fn from(point: Point) -> geo_types::Coord<f64> {
        geo_types::Coord { x: point.x, y: point.y }
    }
}

impl From<geo_types::Coord<f64>> for Point {
    fn from(coord: geo_types::Coord<f64>) -> Point {
        Point::inexact(coord.x, coord.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_ninety_degrees_swaps_axes() {
        let p = Point::new(1.0, 0.0).rotated(90.0);
        assert!((p.x).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-9);
        assert!((b.distance(a) - 5.0).abs() < 1e-9);
    }
}
