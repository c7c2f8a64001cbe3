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

use crate::geometry::point::Point;
use crate::geometry::primitives;

/// A single part or sheet: an outer ring plus zero or more holes (each a
/// `Polygon` in its own right, never a back-reference to its parent — see
/// the data-model note on avoiding cyclic structures).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Polygon {
    pub id: u64,
    pub source: usize,
    pub points: Vec<Point>,
    #[serde(default)]
    pub holes: Vec<Polygon>,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "Point::zero")]
    pub offset: Point,
}

impl Polygon {
    pub fn new(id: u64, source: usize, points: Vec<Point>) -> Polygon {
        Polygon { id, source, points, holes: Vec::new(), rotation: 0.0, offset: Point::zero() }
    }

    pub fn with_holes(mut self, holes: Vec<Polygon>) -> Polygon {
        self.holes = holes;
        self
    }

    pub fn area(&self) -> f64 {
        let mut total = primitives::area(&self.points).abs();
        for hole in &self.holes {
            total -= primitives::area(&hole.points).abs();
        }
        total
    }

    pub fn centroid(&self) -> Point {
        primitives::centroid(&self.points)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        primitives::bounding_box_of(&self.points)
    }

    /// A copy of this polygon with every vertex (outer ring and holes)
    /// rotated about the origin and then translated — the transform the
    /// placement worker applies to give a part its chromosome-assigned
    /// rotation before placement search begins. `rotation_degrees` is
    /// recorded as the polygon's absolute rotation; once it has been baked
    /// in this way, use `translated` (not another `transformed` call) to
    /// move the result, so that the recorded rotation isn't reset to
    /// whatever is passed for a later translate-only step.
    pub fn transformed(&self, rotation_degrees: f64, offset: Point) -> Polygon {
        let apply = |p: &Point| p.rotated(rotation_degrees).translated(offset.x, offset.y);
        Polygon {
            id: self.id,
            source: self.source,
            points: self.points.iter().map(apply).collect(),
            holes: self
                .holes
                .iter()
                .map(|hole| hole.transformed(rotation_degrees, offset))
                .collect(),
            rotation: rotation_degrees,
            offset,
        }
    }

    /// A copy of this polygon translated only, leaving `rotation` exactly
    /// as it is. Use this (not `transformed(0.0, ...)`) once a part's
    /// rotation has already been baked into its points, so the true
    /// rotation survives into world coordinates for NFP cache keys.
    pub fn translated(&self, offset: Point) -> Polygon {
        let apply = |p: &Point| p.translated(offset.x, offset.y);
        Polygon {
            id: self.id,
            source: self.source,
            points: self.points.iter().map(apply).collect(),
            holes: self.holes.iter().map(|hole| hole.translated(offset)).collect(),
            rotation: self.rotation,
            offset,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn empty() -> BoundingBox {
        BoundingBox {
            min: Point::inexact(f64::INFINITY, f64::INFINITY),
            max: Point::inexact(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn expand(&mut self, point: Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// A rectangle expanded outward on every side by `fraction` of its own
    /// dimensions, used to build the sheet frame for inner-NFP computation.
    pub fn expanded_by_fraction(&self, fraction: f64) -> BoundingBox {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        BoundingBox {
            min: Point::inexact(self.min.x - dx, self.min.y - dy),
            max: Point::inexact(self.max.x + dx, self.max.y + dy),
        }
    }

    pub fn to_polygon(&self) -> Vec<Point> {
        vec![
            Point::inexact(self.min.x, self.min.y),
            Point::inexact(self.max.x, self.min.y),
            Point::inexact(self.max.x, self.max.y),
            Point::inexact(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_subtracts_hole_area() {
        let outer = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let hole = vec![
            Point::new(2.0, 2.0),
            Point::new(4.0, 2.0),
            Point::new(4.0, 4.0),
            Point::new(2.0, 4.0),
        ];
        let polygon = Polygon::new(1, 0, outer).with_holes(vec![Polygon::new(2, 0, hole)]);
        assert!((polygon.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn transformed_translates_holes_too() {
        let outer = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let hole = vec![Point::new(0.1, 0.1), Point::new(0.2, 0.1), Point::new(0.2, 0.2)];
        let polygon = Polygon::new(1, 0, outer).with_holes(vec![Polygon::new(2, 0, hole)]);
        let moved = polygon.transformed(0.0, Point::new(5.0, 5.0));
        assert!((moved.holes[0].points[0].x - 5.1).abs() < 1e-9);
    }

    #[test]
    fn translated_preserves_rotation() {
        let outer = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let polygon = Polygon::new(1, 0, outer).transformed(90.0, Point::zero());
        let moved = polygon.translated(Point::new(3.0, 4.0));
        assert_eq!(moved.rotation, 90.0);
    }

    #[test]
    fn bounding_box_expanded_by_fraction_grows_symmetrically() {
        let mut bbox = BoundingBox::empty();
        bbox.expand(Point::new(0.0, 0.0));
        bbox.expand(Point::new(10.0, 10.0));
        let expanded = bbox.expanded_by_fraction(0.1);
        assert!((expanded.min.x - (-1.0)).abs() < 1e-9);
        assert!((expanded.max.x - 11.0).abs() < 1e-9);
    }
}
