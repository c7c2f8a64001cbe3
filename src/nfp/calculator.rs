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

//! High-level NFP calculation: integrates the geometry backend's Minkowski
//! sum with the cache. Mirrors the reference `NFPCalculator`'s
//! `getOuterNFP`/`getInnerNFP`/`getFrame` surface.

use std::sync::Arc;
use tracing::debug;

use crate::geometry::{GeometryBackend, Point, Polygon};
use crate::nfp::cache::{CacheStats, NfpCache};
use crate::nfp::key::NfpKey;

pub struct NfpCalculator {
    cache: Arc<NfpCache>,
    backend: Arc<dyn GeometryBackend>,
    /// Decimal places used to normalize rotations before hashing; derived
    /// from `Config::curve_tolerance` by the caller.
    key_precision: i32,
}

fn negate(polygon: &Polygon) -> Polygon {
    let points = polygon.points.iter().map(|p| Point::inexact(-p.x, -p.y)).collect();
    Polygon::new(polygon.id, polygon.source, points)
}

impl NfpCalculator {
    pub fn new(cache: Arc<NfpCache>, backend: Arc<dyn GeometryBackend>, key_precision: i32) -> NfpCalculator {
        NfpCalculator { cache, backend, key_precision }
    }

    fn key_for(&self, a: &Polygon, b: &Polygon, inside: bool) -> NfpKey {
        NfpKey::new(a.id, b.id, a.rotation, b.rotation, inside, self.key_precision)
    }

    fn compute_diff_nfp(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon> {
        let neg_b = negate(b);
        self.backend.minkowski_sum(a, &neg_b)
    }

    /// The locus of positions where `B`'s reference point may sit such
    /// that `B` touches but does not overlap `A`. When `inside` is set,
    /// `B` orbits within `A` instead of around its outside.
    pub fn get_outer_nfp(&self, a: &Polygon, b: &Polygon, inside: bool) -> Vec<Polygon> {
        if inside {
            return self.get_inner_nfp(a, b);
        }

        let key = self.key_for(a, b, false);
        if let Some(cached) = self.cache.find(&key) {
            return cached;
        }

        debug!(a_id = a.id, b_id = b.id, "nfp cache miss, computing outer nfp");
        let nfp = self.compute_diff_nfp(a, b);
        self.cache.insert(key, nfp.clone());
        nfp
    }

    /// Valid positions for `B`'s reference point such that `B` fits
    /// entirely inside `A`. Computed by taking the region that `B` would
    /// sweep across `A`'s own boundary (the same Minkowski sum used for
    /// the outer NFP) and subtracting it from `A` itself — the part of
    /// `A` far enough from its boundary that `B` cannot poke through it.
    pub fn get_inner_nfp(&self, a: &Polygon, b: &Polygon) -> Vec<Polygon> {
        let key = self.key_for(a, b, true);
        if let Some(cached) = self.cache.find(&key) {
            return cached;
        }

        debug!(a_id = a.id, b_id = b.id, "nfp cache miss, computing inner nfp");
        let boundary_band = self.compute_diff_nfp(a, b);
        let mut result = Vec::new();
        for band in &boundary_band {
            result.extend(self.backend.difference(a, band));
        }

        self.cache.insert(key, result.clone());
        result
    }

    /// A rectangular frame around `A`, expanded by 10% on every side, with
    /// `A` itself as a hole — used as the sheet boundary when placing
    /// parts that must stay within the frame's outer rectangle.
    pub fn get_frame(&self, a: &Polygon) -> Polygon {
        let expanded = a.bounding_box().expanded_by_fraction(0.1);
        Polygon::new(a.id, a.source, expanded.to_polygon()).with_holes(vec![a.clone()])
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ProductionGeometryBackend;

    fn square(side: f64, id: u64) -> Polygon {
        Polygon::new(
            id,
            0,
            vec![
                Point::new(0.0, 0.0),
                Point::new(side, 0.0),
                Point::new(side, side),
                Point::new(0.0, side),
            ],
        )
    }

    fn calculator() -> NfpCalculator {
        NfpCalculator::new(Arc::new(NfpCache::new()), Arc::new(ProductionGeometryBackend::new()), 4)
    }

    #[test]
    fn outer_nfp_is_cached_after_first_call() {
        let calc = calculator();
        let a = square(10.0, 1);
        let b = square(2.0, 2);
        let first = calc.get_outer_nfp(&a, &b, false);
        assert!(!first.is_empty());
        assert_eq!(calc.cache_stats().misses, 1);
        let _ = calc.get_outer_nfp(&a, &b, false);
        assert_eq!(calc.cache_stats().hits, 1);
    }

    #[test]
    fn frame_contains_source_polygon_as_hole() {
        let calc = calculator();
        let a = square(10.0, 1);
        let frame = calc.get_frame(&a);
        assert_eq!(frame.holes.len(), 1);
        assert_eq!(frame.holes[0].id, a.id);
        assert!(frame.bounding_box().width() > a.bounding_box().width());
    }

    #[test]
    fn inner_nfp_for_small_part_is_smaller_than_container() {
        let calc = calculator();
        let a = square(10.0, 1);
        let b = square(1.0, 2);
        let inner = calc.get_inner_nfp(&a, &b);
        let total_area: f64 = inner.iter().map(Polygon::area).sum();
        assert!(total_area < a.area());
    }
}
