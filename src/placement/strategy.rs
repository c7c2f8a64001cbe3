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

//! Placement strategies score a candidate position for the part currently
//! being placed; the worker picks the candidate with the lowest score.
//! `points` passed to `score` is every vertex of every part already placed
//! on the sheet, plus the candidate part at the position under test.

use crate::config::PlacementType;
use crate::geometry::{bounding_box_of, compute_convex_hull, area, Point};

pub trait PlacementStrategy: Send + Sync {
    fn score(&self, points: &[Point]) -> f64;
}

/// Default strategy: favors positions that keep the bounding box narrow,
/// weighting width twice as heavily as height so parts stack left-to-right
/// before growing tall (`2*width + height`).
pub struct Gravity;

impl PlacementStrategy for Gravity {
    fn score(&self, points: &[Point]) -> f64 {
        let bbox = bounding_box_of(points);
        2.0 * bbox.width() + bbox.height()
    }
}

/// Minimizes the area of the axis-aligned bounding box.
pub struct BoundingBox;

impl PlacementStrategy for BoundingBox {
    fn score(&self, points: &[Point]) -> f64 {
        let bbox = bounding_box_of(points);
        bbox.width() * bbox.height()
    }
}

/// Minimizes the area of the convex hull, which can pack concave parts
/// more tightly than a bounding-box objective at extra computation cost.
pub struct ConvexHull;

impl PlacementStrategy for ConvexHull {
    fn score(&self, points: &[Point]) -> f64 {
        let hull = compute_convex_hull(points, 1e-9);
        area(&hull).abs()
    }
}

pub fn strategy_for(placement_type: PlacementType) -> Box<dyn PlacementStrategy> {
    match placement_type {
        PlacementType::Gravity => Box::new(Gravity),
        PlacementType::BoundingBox => Box::new(BoundingBox),
        PlacementType::ConvexHull => Box::new(ConvexHull),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64, offset: f64) -> Vec<Point> {
        vec![
            Point::new(offset, 0.0),
            Point::new(offset + side, 0.0),
            Point::new(offset + side, side),
            Point::new(offset, side),
        ]
    }

    #[test]
    fn gravity_prefers_narrower_layout() {
        let gravity = Gravity;
        let narrow = square(2.0, 0.0);
        let mut wide = square(2.0, 0.0);
        wide.extend(square(2.0, 10.0));
        assert!(gravity.score(&narrow) < gravity.score(&wide));
    }

    #[test]
    fn bounding_box_scores_area() {
        let strategy = BoundingBox;
        let points = square(3.0, 0.0);
        assert!((strategy.score(&points) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn convex_hull_ignores_interior_points() {
        let strategy = ConvexHull;
        let mut points = square(4.0, 0.0);
        points.push(Point::new(2.0, 2.0));
        let with_interior = strategy.score(&points);
        let without_interior = strategy.score(&square(4.0, 0.0));
        assert!((with_interior - without_interior).abs() < 1e-9);
    }
}
