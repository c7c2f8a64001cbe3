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

//! Detects aligned edges between a newly placed part and parts already on
//! the sheet, so the fitness function can reward layouts with shared
//! cutting lines. Ported edge-for-edge from the reference `mergedLength`
//! routine: rotate each candidate edge onto the +x axis, then look for
//! placed edges whose rotated endpoints both land on y≈0.

use crate::geometry::Point;
use crate::placement::worker::PlacedPart;

#[derive(Clone, Debug, Default)]
pub struct MergeResult {
    pub total_length: f64,
    pub segments: Vec<(Point, Point)>,
}

pub fn calculate_merged_length(
    placed: &[PlacedPart],
    new_part_points: &[Point],
    min_length: f64,
    tolerance: f64,
) -> MergeResult {
    calculate_merged_length_internal(placed, new_part_points, min_length, tolerance)
}

fn calculate_merged_length_internal(
    parts: &[PlacedPart],
    p: &[Point],
    min_length: f64,
    tolerance: f64,
) -> MergeResult {
    let min2 = min_length * min_length;
    let mut result = MergeResult::default();

    for i in 0..p.len() {
        let a1 = p[i];
        let a2 = if i + 1 == p.len() { p[0] } else { p[i + 1] };

        if !a1.exact || !a2.exact {
            continue;
        }

        let ax2 = (a2.x - a1.x) * (a2.x - a1.x);
        let ay2 = (a2.y - a1.y) * (a2.y - a1.y);
        if ax2 + ay2 < min2 {
            continue;
        }

        let angle = (a2.y - a1.y).atan2(a2.x - a1.x);
        let c = (-angle).cos();
        let s = (-angle).sin();
        let c2 = angle.cos();
        let s2 = angle.sin();

        let rel_a2 = Point::inexact(a2.x - a1.x, a2.y - a1.y);
        let rot_a2x = rel_a2.x * c - rel_a2.y * s;

        for part in parts {
            let b = &part.world_points;
            if b.len() > 1 {
                for k in 0..b.len() {
                    let b1 = b[k];
                    let b2 = if k + 1 == b.len() { b[0] } else { b[k + 1] };

                    if !b1.exact || !b2.exact {
                        continue;
                    }

                    let bx2 = (b2.x - b1.x) * (b2.x - b1.x);
                    let by2 = (b2.y - b1.y) * (b2.y - b1.y);
                    if bx2 + by2 < min2 {
                        continue;
                    }

                    let rel_b1 = Point::inexact(b1.x - a1.x, b1.y - a1.y);
                    let rel_b2 = Point::inexact(b2.x - a1.x, b2.y - a1.y);

                    let rot_b1 = Point::inexact(rel_b1.x * c - rel_b1.y * s, rel_b1.x * s + rel_b1.y * c);
                    let rot_b2 = Point::inexact(rel_b2.x * c - rel_b2.y * s, rel_b2.x * s + rel_b2.y * c);

                    if rot_b1.y.abs() >= tolerance || rot_b2.y.abs() >= tolerance {
                        continue;
                    }

                    let min1 = 0f64.min(rot_a2x);
                    let max1 = 0f64.max(rot_a2x);
                    let min2_seg = rot_b1.x.min(rot_b2.x);
                    let max2_seg = rot_b1.x.max(rot_b2.x);

                    if min2_seg >= max1 || max2_seg <= min1 {
                        continue;
                    }

                    let (len, rel_c1x, rel_c2x) =
                        if (min1 - min2_seg).abs() < tolerance && (max1 - max2_seg).abs() < tolerance {
                            (max1 - min1, min1, max1)
                        } else if min1 > min2_seg && max1 < max2_seg {
                            (max1 - min1, min1, max1)
                        } else if min2_seg > min1 && max2_seg < max1 {
                            (max2_seg - min2_seg, min2_seg, max2_seg)
                        } else {
                            let overlap = (max1.min(max2_seg) - min1.max(min2_seg)).max(0.0);
                            (overlap, max1.min(max2_seg), min1.max(min2_seg))
                        };

                    if len * len > min2 {
                        result.total_length += len;

                        let rel_c1 = Point::inexact(rel_c1x * c2, rel_c1x * s2);
                        let rel_c2 = Point::inexact(rel_c2x * c2, rel_c2x * s2);
                        let c1 = rel_c1.translated(a1.x, a1.y);
                        let c2_world = rel_c2.translated(a1.x, a1.y);
                        result.segments.push((c1, c2_world));
                    }
                }
            }

            if !part.hole_points.is_empty() {
                let holes_as_parts: Vec<PlacedPart> = part
                    .hole_points
                    .iter()
                    .map(|hole| PlacedPart { world_points: hole.clone(), hole_points: Vec::new() })
                    .collect();
                let child = calculate_merged_length_internal(&holes_as_parts, p, min_length, tolerance);
                result.total_length += child.total_length;
                result.segments.extend(child.segments);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edge_contributes_its_length() {
        let placed_edge = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let placed = vec![PlacedPart { world_points: placed_edge, hole_points: Vec::new() }];

        let new_part = vec![
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 10.0),
        ];

        let result = calculate_merged_length(&placed, &new_part, 1.0, 1e-9);
        assert!((result.total_length - 10.0).abs() < 1e-6);
    }

    #[test]
    fn short_edges_below_min_length_are_skipped() {
        let placed = vec![PlacedPart {
            world_points: vec![Point::new(0.0, 0.0), Point::new(0.5, 0.0), Point::new(0.5, 0.5)],
            hole_points: Vec::new(),
        }];
        let new_part = vec![Point::new(0.0, 0.0), Point::new(0.5, 0.0), Point::new(0.5, 0.5)];
        let result = calculate_merged_length(&placed, &new_part, 5.0, 1e-9);
        assert_eq!(result.total_length, 0.0);
    }

    #[test]
    fn non_exact_vertices_are_ignored() {
        let mut placed_edge = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        placed_edge[1].exact = false;
        let placed = vec![PlacedPart { world_points: placed_edge, hole_points: Vec::new() }];
        let new_part = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let result = calculate_merged_length(&placed, &new_part, 1.0, 1e-9);
        assert_eq!(result.total_length, 0.0);
    }
}
