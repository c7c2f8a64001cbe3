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

//! Free-standing geometry primitives operating on point loops. Ported from
//! the reference implementation's `GeometryUtils`; no external crate
//! provides three-valued point-in-loop or the merge-length rotation trick,
//! so these stay hand-rolled.

use crate::geometry::point::Point;
use crate::geometry::polygon::{BoundingBox, Polygon};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    Collinear,
}

pub fn almost_equal(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

pub fn almost_equal_points(a: Point, b: Point, tolerance: f64) -> bool {
    a.distance_squared(b) <= tolerance * tolerance
}

fn within_bounds(value: f64, min_value: f64, max_value: f64, tolerance: f64) -> bool {
    let (lo, hi) = if min_value > max_value { (max_value, min_value) } else { (min_value, max_value) };
    value + tolerance >= lo && value - tolerance <= hi
}

pub fn dot(lhs: Point, rhs: Point) -> f64 {
    lhs.x * rhs.x + lhs.y * rhs.y
}

pub fn cross(lhs: Point, rhs: Point) -> f64 {
    lhs.x * rhs.y - lhs.y * rhs.x
}

fn cross3(origin: Point, a: Point, b: Point) -> f64 {
    cross(origin.vector_to(a), origin.vector_to(b))
}

pub fn normalize_vector(vector: Point) -> Point {
    let length_squared = vector.distance_squared(Point::zero());
    if almost_equal(length_squared, 0.0, 1e-9) {
        return Point::zero();
    }
    let length = length_squared.sqrt();
    Point::inexact(vector.x / length, vector.y / length)
}

pub fn orientation(a: Point, b: Point, c: Point, tolerance: f64) -> Orientation {
    let value = cross3(a, b, c);
    if value > tolerance {
        Orientation::CounterClockwise
    } else if value < -tolerance {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

pub fn is_point_on_segment(a: Point, b: Point, p: Point, tolerance: f64) -> bool {
    if almost_equal_points(a, p, tolerance) || almost_equal_points(b, p, tolerance) {
        return false;
    }
    if !within_bounds(p.x, a.x, b.x, tolerance) || !within_bounds(p.y, a.y, b.y, tolerance) {
        return false;
    }
    if !almost_equal(cross3(a, b, p), 0.0, tolerance) {
        return false;
    }
    let ab = a.vector_to(b);
    let ap = a.vector_to(p);
    let d = dot(ap, ab);
    if d < -tolerance {
        return false;
    }
    let length_squared = dot(ab, ab);
    d - length_squared <= tolerance
}

/// Intersection of segments `a`-`b` and `c`-`d`. `treat_as_infinite` skips
/// the in-bounds checks, so the lines are intersected rather than the
/// segments — used by the merge-length detector when projecting an edge
/// onto a placed edge's supporting line.
pub fn segment_intersection(
    a: Point,
    b: Point,
    c: Point,
    d: Point,
    treat_as_infinite: bool,
    tolerance: f64,
) -> Option<Point> {
    let a1 = b.y - a.y;
    let b1 = a.x - b.x;
    let c1 = b.x * a.y - a.x * b.y;

    let a2 = d.y - c.y;
    let b2 = c.x - d.x;
    let c2 = d.x * c.y - c.x * d.y;

    let denom = a1 * b2 - a2 * b1;
    if almost_equal(denom, 0.0, tolerance) {
        return None;
    }

    let x = (b1 * c2 - b2 * c1) / denom;
    let y = (a2 * c1 - a1 * c2) / denom;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    if !treat_as_infinite {
        if !within_bounds(x, a.x, b.x, tolerance) || !within_bounds(y, a.y, b.y, tolerance) {
            return None;
        }
        if !within_bounds(x, c.x, d.x, tolerance) || !within_bounds(y, c.y, d.y, tolerance) {
            return None;
        }
    }

    Some(Point::inexact(x, y))
}

pub fn find_intersections(a: &[Point], b: &[Point], tolerance: f64) -> Vec<Point> {
    let mut intersections = Vec::new();
    if a.len() < 2 || b.len() < 2 {
        return intersections;
    }

    for i in 0..a.len() {
        let a_start = a[i];
        let a_end = a[(i + 1) % a.len()];
        if almost_equal_points(a_start, a_end, tolerance) {
            continue;
        }

        for j in 0..b.len() {
            let b_start = b[j];
            let b_end = b[(j + 1) % b.len()];
            if almost_equal_points(b_start, b_end, tolerance) {
                continue;
            }

            let Some(intersection) =
                segment_intersection(a_start, a_end, b_start, b_end, false, tolerance)
            else {
                continue;
            };

            let duplicate = intersections
                .iter()
                .any(|&existing| almost_equal_points(existing, intersection, tolerance));
            if !duplicate {
                intersections.push(intersection);
            }
        }
    }

    intersections
}

pub fn bounding_box_of(points: &[Point]) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    for &point in points {
        bbox.expand(point);
    }
    bbox
}

/// Signed shoelace area of a single ring; positive for counter-clockwise
/// winding.
pub fn area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let current = points[i];
        let next = points[(i + 1) % points.len()];
        sum += current.x * next.y - next.x * current.y;
    }
    sum / 2.0
}

pub fn centroid(points: &[Point]) -> Point {
    if points.len() < 3 {
        return Point::zero();
    }

    let mut signed_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..points.len() {
        let current = points[i];
        let next = points[(i + 1) % points.len()];
        let cross_value = current.x * next.y - next.x * current.y;
        signed_area += cross_value;
        cx += (current.x + next.x) * cross_value;
        cy += (current.y + next.y) * cross_value;
    }

    signed_area /= 2.0;
    if almost_equal(signed_area, 0.0, 1e-9) {
        return Point::zero();
    }
    let factor = 1.0 / (6.0 * signed_area);
    Point::inexact(cx * factor, cy * factor)
}

/// Ray-casting point-in-loop test. Returns `None` ("undetermined") when the
/// point lies on the boundary, matching the reference implementation:
/// callers (the placement worker, NFP checks) treat an undetermined result
/// as "try a different candidate point" rather than guessing.
fn point_in_loop(loop_points: &[Point], point: Point, tolerance: f64) -> Option<bool> {
    if loop_points.len() < 3 {
        return None;
    }

    let mut inside = false;
    let n = loop_points.len();
    let mut j = n - 1;
    for i in 0..n {
        let current = loop_points[i];
        let prev = loop_points[j];
        j = i;

        if almost_equal_points(current, point, tolerance) || almost_equal_points(prev, point, tolerance) {
            return None;
        }
        if is_point_on_segment(prev, current, point, tolerance) {
            return None;
        }
        if almost_equal(prev.x, current.x, tolerance) && almost_equal(prev.y, current.y, tolerance) {
            continue;
        }

        let intersects = ((prev.y > point.y) != (current.y > point.y))
            && (point.x
                < (current.x - prev.x) * (point.y - prev.y) / (current.y - prev.y) + prev.x);
        if intersects {
            inside = !inside;
        }
    }

    Some(inside)
}

pub fn point_in_polygon(polygon: &Polygon, point: Point, tolerance: f64) -> Option<bool> {
    let outer = point_in_loop(&polygon.points, point, tolerance)?;
    if !outer {
        return Some(false);
    }
    for hole in &polygon.holes {
        let in_hole = point_in_loop(&hole.points, point, tolerance)?;
        if in_hole {
            return Some(false);
        }
    }
    Some(true)
}

/// Monotone-chain convex hull (Andrew's algorithm). Input need not be
/// sorted or deduplicated.
pub fn compute_convex_hull(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|lhs, rhs| {
        if !almost_equal(lhs.x, rhs.x, tolerance) {
            lhs.x.partial_cmp(&rhs.x).unwrap()
        } else {
            lhs.y.partial_cmp(&rhs.y).unwrap()
        }
    });
    sorted.dedup_by(|a, b| almost_equal_points(*a, *b, tolerance));

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point> = Vec::new();
    for &point in &sorted {
        while lower.len() >= 2 && cross3(lower[lower.len() - 2], lower[lower.len() - 1], point) <= tolerance {
            lower.pop();
        }
        lower.push(point);
    }

    let mut upper: Vec<Point> = Vec::new();
    for &point in sorted.iter().rev() {
        while upper.len() >= 2 && cross3(upper[upper.len() - 2], upper[upper.len() - 1], point) <= tolerance {
            upper.pop();
        }
        upper.push(point);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn area_of_unit_square_is_one() {
        assert!((area(&square(1.0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_square_is_center() {
        let c = centroid(&square(2.0));
        assert!((c.x - 1.0).abs() < 1e-9);
        assert!((c.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn point_in_polygon_interior_point_is_inside() {
        let polygon = Polygon::new(1, 0, square(4.0));
        let result = point_in_polygon(&polygon, Point::new(2.0, 2.0), 1e-9);
        assert_eq!(result, Some(true));
    }

    #[test]
    fn point_in_polygon_exterior_point_is_outside() {
        let polygon = Polygon::new(1, 0, square(4.0));
        let result = point_in_polygon(&polygon, Point::new(10.0, 10.0), 1e-9);
        assert_eq!(result, Some(false));
    }

    #[test]
    fn point_in_polygon_vertex_is_undetermined() {
        let polygon = Polygon::new(1, 0, square(4.0));
        let result = point_in_polygon(&polygon, Point::new(0.0, 0.0), 1e-9);
        assert_eq!(result, None);
    }

    #[test]
    fn point_inside_hole_is_outside() {
        let mut polygon = Polygon::new(1, 0, square(10.0));
        polygon.holes.push(Polygon::new(2, 0, vec![
            Point::new(2.0, 2.0),
            Point::new(4.0, 2.0),
            Point::new(4.0, 4.0),
            Point::new(2.0, 4.0),
        ]));
        let result = point_in_polygon(&polygon, Point::new(3.0, 3.0), 1e-9);
        assert_eq!(result, Some(false));
    }

    #[test]
    fn convex_hull_of_square_with_center_point_drops_center() {
        let mut points = square(4.0);
        points.push(Point::new(2.0, 2.0));
        let hull = compute_convex_hull(&points, 1e-9);
        assert_eq!(hull.len(), 4);
    }

    #[test]
    fn segment_intersection_finds_crossing_point() {
        let result = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
            false,
            1e-9,
        );
        let p = result.unwrap();
        assert!((p.x - 1.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_segments_have_no_intersection() {
        let result = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            false,
            1e-9,
        );
        assert!(result.is_none());
    }
}
