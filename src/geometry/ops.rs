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

//! The polygon boolean/offset/Minkowski backend. `GeometryBackend` is the
//! external-collaborator boundary: one production implementation built on
//! `geo`'s boolean ops and `geo_buffer`'s offsetting, with Minkowski sum
//! hand-rolled by edge convolution (neither crate computes it directly).
//!
//! The reference polygon library is assumed non-reentrant, so every call
//! into it serializes on a single mutex. That mutex is always released
//! before any NFP-cache lock is taken (see the cache module) to keep the
//! worker pool from starving on it.

use std::sync::Mutex;

use geo::{BooleanOps, Simplify};
use tracing::trace;

use crate::geometry::point::Point;
use crate::geometry::polygon::Polygon;

pub trait GeometryBackend: Send + Sync {
    fn union(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon>;
    fn difference(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon>;
    fn intersection(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon>;
    fn offset(&self, polygon: &Polygon, distance: f64) -> Vec<Polygon>;
    /// Minkowski sum `a ⊕ b` (outer rings only; a polygon's holes do not
    /// participate in the sum itself, matching the reference NFP
    /// calculator, which handles hole interiors separately via the
    /// `use_holes` placement option).
    fn minkowski_sum(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon>;
    fn simplify(&self, polygon: &Polygon, tolerance: f64) -> Polygon;
}

pub struct ProductionGeometryBackend {
    lock: Mutex<()>,
}

impl Default for ProductionGeometryBackend {
    fn default() -> Self {
        ProductionGeometryBackend { lock: Mutex::new(()) }
    }
}

impl ProductionGeometryBackend {
    pub fn new() -> ProductionGeometryBackend {
        ProductionGeometryBackend::default()
    }
}

fn to_geo(polygon: &Polygon) -> geo_types::Polygon<f64> {
    let outer = geo_types::LineString::from(
        polygon.points.iter().map(|&p| geo_types::Coord::from(p)).collect::<Vec<_>>(),
    );
    let holes = polygon
        .holes
        .iter()
        .map(|hole| {
            geo_types::LineString::from(
                hole.points.iter().map(|&p| geo_types::Coord::from(p)).collect::<Vec<_>>(),
            )
        })
        .collect();
    geo_types::Polygon::new(outer, holes)
}

fn loop_from_geo(line: &geo_types::LineString<f64>) -> Vec<Point> {
    let mut points: Vec<Point> = line.coords().map(|&c| Point::from(c)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn from_geo(polygon: &geo_types::Polygon<f64>, id: u64, source: usize) -> Polygon {
    let outer = loop_from_geo(polygon.exterior());
    let holes = polygon
        .interiors()
        .iter()
        .enumerate()
        .map(|(i, ring)| Polygon::new(id, source + i + 1, loop_from_geo(ring)))
        .collect();
    Polygon::new(id, source, outer).with_holes(holes)
}

fn multi_to_polygons(multi: geo_types::MultiPolygon<f64>, id: u64, source: usize) -> Vec<Polygon> {
    multi.0.iter().map(|p| from_geo(p, id, source)).collect()
}

impl GeometryBackend for ProductionGeometryBackend {
    fn union(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon> {
        let _guard = self.lock.lock().unwrap();
        let result = to_geo(a).union(&to_geo(b));
        multi_to_polygons(result, a.id, a.source)
    }

    fn difference(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon> {
        let _guard = self.lock.lock().unwrap();
        let result = to_geo(a).difference(&to_geo(b));
        multi_to_polygons(result, a.id, a.source)
    }

    fn intersection(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon> {
        let _guard = self.lock.lock().unwrap();
        let result = to_geo(a).intersection(&to_geo(b));
        multi_to_polygons(result, a.id, a.source)
    }

    fn offset(&self, polygon: &Polygon, distance: f64) -> Vec<Polygon> {
        let _guard = self.lock.lock().unwrap();
        let buffered = geo_buffer::buffer_polygon(&to_geo(polygon), distance);
        multi_to_polygons(buffered, polygon.id, polygon.source)
    }

    fn minkowski_sum(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon> {
        let _guard = self.lock.lock().unwrap();
        trace!(a_id = a.id, b_id = b.id, "computing minkowski sum by edge convolution");

        let quads = convolve_edges(&a.points, &b.points);
        let a_at_b_vertices = translate_copies(&a.points, &b.points);
        let b_at_a_vertices = translate_copies(&b.points, &a.points);

        let mut pieces: Vec<geo_types::Polygon<f64>> = Vec::new();
        pieces.extend(quads.into_iter().map(|ring| to_simple_geo(ring)));
        pieces.extend(a_at_b_vertices.into_iter().map(|ring| to_simple_geo(ring)));
        pieces.extend(b_at_a_vertices.into_iter().map(|ring| to_simple_geo(ring)));

        let mut accumulated = match pieces.first() {
            Some(first) => geo_types::MultiPolygon(vec![first.clone()]),
            None => return Vec::new(),
        };
        for piece in &pieces[1..] {
            accumulated = accumulated.union(piece);
        }

        multi_to_polygons(accumulated, a.id, a.source)
    }

    fn simplify(&self, polygon: &Polygon, tolerance: f64) -> Polygon {
        let _guard = self.lock.lock().unwrap();
        let simplified = to_geo(polygon).simplify(&tolerance);
        from_geo(&simplified, polygon.id, polygon.source)
    }
}

fn to_simple_geo(ring: Vec<Point>) -> geo_types::Polygon<f64> {
    geo_types::Polygon::new(
        geo_types::LineString::from(ring.into_iter().map(geo_types::Coord::from).collect::<Vec<_>>()),
        Vec::new(),
    )
}

/// One parallelogram per (edge of `a`, edge of `b`) pair: the Minkowski sum
/// of two segments. Ported from the reference convolution routine, which
/// convolves every edge pair of two polygons and relies on a final boolean
/// union (below) to collapse the result into the true sum region.
fn convolve_edges(a: &[Point], b: &[Point]) -> Vec<Vec<Point>> {
    let mut quads = Vec::new();
    if a.len() < 2 || b.len() < 2 {
        return quads;
    }
    for i in 0..a.len() {
        let p1 = a[i];
        let p2 = a[(i + 1) % a.len()];
        for j in 0..b.len() {
            let q1 = b[j];
            let q2 = b[(j + 1) % b.len()];
            quads.push(vec![
                Point::inexact(p1.x + q1.x, p1.y + q1.y),
                Point::inexact(p2.x + q1.x, p2.y + q1.y),
                Point::inexact(p2.x + q2.x, p2.y + q2.y),
                Point::inexact(p1.x + q2.x, p1.y + q2.y),
            ]);
        }
    }
    quads
}

/// A translated copy of `ring` for every vertex of `at_vertices`, i.e. the
/// vertex-translate term of the Minkowski sum.
fn translate_copies(ring: &[Point], at_vertices: &[Point]) -> Vec<Vec<Point>> {
    at_vertices
        .iter()
        .map(|&v| ring.iter().map(|&p| Point::inexact(p.x + v.x, p.y + v.y)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(
            1,
            0,
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(0.0, 1.0),
            ],
        )
    }

    #[test]
    fn union_of_overlapping_squares_is_larger_than_either() {
        let backend = ProductionGeometryBackend::new();
        let a = unit_square();
        let mut b = unit_square();
        b.points.iter_mut().for_each(|p| p.x += 0.5);
        let result = backend.union(&a, &b);
        let total_area: f64 = result.iter().map(Polygon::area).sum();
        assert!(total_area > 1.0);
    }

    #[test]
    fn minkowski_sum_of_two_unit_squares_is_two_by_two() {
        let backend = ProductionGeometryBackend::new();
        let a = unit_square();
        let b = unit_square();
        let result = backend.minkowski_sum(&a, &b);
        let total_area: f64 = result.iter().map(Polygon::area).sum();
        assert!((total_area - 4.0).abs() < 1e-6);
    }

    #[test]
    fn difference_of_identical_squares_is_empty() {
        let backend = ProductionGeometryBackend::new();
        let a = unit_square();
        let b = unit_square();
        let result = backend.difference(&a, &b);
        let total_area: f64 = result.iter().map(Polygon::area).sum();
        assert!(total_area < 1e-9);
    }
}
