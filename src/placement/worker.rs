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

//! Greedy placement: for each sheet in turn, place parts one at a time by
//! intersecting the part's inner NFP against the sheet with the union of
//! its outer NFPs against every part already placed, then picking the
//! lowest-scoring point in what's left.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::geometry::{GeometryBackend, Point, Polygon};
use crate::nfp::NfpCalculator;
use crate::placement::merge;
use crate::placement::strategy::{strategy_for, PlacementStrategy};

#[derive(Copy, Clone, Debug)]
pub struct Placement {
    pub position: Point,
    pub id: u64,
    pub source: usize,
    pub rotation: f64,
    /// The placement strategy's score for this part at its chosen
    /// position, against everything already placed on the same sheet.
    /// Summed across every placement into the fitness total.
    pub strategy_score: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PlacementResult {
    pub placements: Vec<Vec<Placement>>,
    pub fitness: f64,
    pub area: f64,
    pub merged_length: f64,
    pub unplaced_parts: Vec<Polygon>,
}

/// A part already placed on the current sheet, in world coordinates, kept
/// around for merge-length detection and for building the next part's
/// strategy score.
#[derive(Clone, Debug)]
pub struct PlacedPart {
    pub world_points: Vec<Point>,
    pub hole_points: Vec<Vec<Point>>,
}

pub struct PlacementWorker {
    backend: Arc<dyn GeometryBackend>,
    nfp_calculator: Arc<NfpCalculator>,
    strategy: Box<dyn PlacementStrategy>,
    config: Config,
    cancel: Arc<AtomicBool>,
}

impl PlacementWorker {
    pub fn new(
        backend: Arc<dyn GeometryBackend>,
        nfp_calculator: Arc<NfpCalculator>,
        config: Config,
        cancel: Arc<AtomicBool>,
    ) -> PlacementWorker {
        let strategy = strategy_for(config.placement_type);
        PlacementWorker { backend, nfp_calculator, strategy, config, cancel }
    }

    /// Places parts sheet by sheet. Checks the shared cancel flag before
    /// starting each sheet (including the first) and stops there, leaving
    /// whatever parts remain in `unplaced_parts` — an already-running
    /// single-sheet placement always completes normally.
    pub fn place_parts(&self, sheets: &[Polygon], parts: Vec<Polygon>) -> PlacementResult {
        let mut remaining = parts;
        let mut placements_per_sheet: Vec<Vec<Placement>> = Vec::new();
        let mut used_area = 0.0;
        let mut total_merged_length = 0.0;

        for sheet in sheets {
            if remaining.is_empty() {
                break;
            }
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }

            let mut placed_polys: Vec<Polygon> = Vec::new();
            let mut placed_parts: Vec<PlacedPart> = Vec::new();
            let mut placements: Vec<Placement> = Vec::new();
            let mut next_remaining = Vec::new();
            let mut sheet_used = false;
            let mut sheet_merged_length = 0.0;

            for part in remaining.drain(..) {
                let rotated = part.transformed(part.rotation, Point::zero());
                let inner_regions = self.nfp_calculator.get_inner_nfp(sheet, &rotated);
                if inner_regions.is_empty() {
                    next_remaining.push(part);
                    continue;
                }

                let final_regions = if placed_polys.is_empty() {
                    inner_regions
                } else {
                    self.subtract_placed(&inner_regions, &placed_polys, &rotated)
                };

                let candidates = extract_candidate_positions(&final_regions, &rotated);
                if candidates.is_empty() {
                    next_remaining.push(part);
                    continue;
                }

                let (position, strategy_score) =
                    self.choose_position(&candidates, &placed_parts, &rotated, placed_polys.is_empty());

                let world = rotated.translated(position);

                if self.config.merge_lines {
                    let min_length = self.config.overlap_tolerance.max(1e-6);
                    let merge_result =
                        merge::calculate_merged_length(&placed_parts, &world.points, min_length, 1e-6);
                    sheet_merged_length += merge_result.total_length;
                }

                placements.push(Placement {
                    position,
                    id: part.id,
                    source: part.source,
                    rotation: part.rotation,
                    strategy_score,
                });
                placed_parts.push(PlacedPart {
                    world_points: world.points.clone(),
                    hole_points: world.holes.iter().map(|h| h.points.clone()).collect(),
                });
                placed_polys.push(world);
                sheet_used = true;
            }

            remaining = next_remaining;
            if sheet_used {
                used_area += sheet.area();
            }
            placements_per_sheet.push(placements);
            total_merged_length += sheet_merged_length;
        }

        PlacementResult {
            placements: placements_per_sheet,
            fitness: 0.0,
            area: used_area,
            merged_length: total_merged_length,
            unplaced_parts: remaining,
        }
    }

    fn subtract_placed(&self, inner_regions: &[Polygon], placed_polys: &[Polygon], part: &Polygon) -> Vec<Polygon> {
        let mut outer_regions: Vec<Polygon> = Vec::new();
        for placed in placed_polys {
            outer_regions.extend(self.nfp_calculator.get_outer_nfp(placed, part, false));
        }

        let mut final_regions = inner_regions.to_vec();
        for outer in &outer_regions {
            let mut next_final = Vec::new();
            for region in &final_regions {
                next_final.extend(self.backend.difference(region, outer));
            }
            final_regions = next_final;
            if final_regions.is_empty() {
                break;
            }
        }
        final_regions
    }

    fn choose_position(
        &self,
        candidates: &[Point],
        placed_parts: &[PlacedPart],
        part: &Polygon,
        is_first: bool,
    ) -> (Point, f64) {
        let mut already_placed: Vec<Point> = Vec::new();
        for placed in placed_parts {
            already_placed.extend(placed.world_points.iter().copied());
        }

        if is_first {
            let position = *candidates
                .iter()
                .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap().then(a.y.partial_cmp(&b.y).unwrap()))
                .unwrap();
            let score = self.score_candidate(&already_placed, part, position);
            return (position, score);
        }

        candidates
            .iter()
            .map(|&candidate| (candidate, self.score_candidate(&already_placed, part, candidate)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap()
    }

    fn score_candidate(&self, already_placed: &[Point], part: &Polygon, candidate: Point) -> f64 {
        let mut combined = already_placed.to_vec();
        combined.extend(part.translated(candidate).points);
        self.strategy.score(&combined)
    }
}

/// Flattens NFP result polygons into candidate placement positions,
/// shifting each point by the part's own first vertex so the returned
/// point is the translation to apply to the part (not a raw NFP vertex).
fn extract_candidate_positions(final_nfp: &[Polygon], part: &Polygon) -> Vec<Point> {
    let Some(&reference) = part.points.first() else {
        return Vec::new();
    };
    let mut positions = Vec::new();
    for region in final_nfp {
        for &point in &region.points {
            positions.push(Point::inexact(point.x - reference.x, point.y - reference.y));
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ProductionGeometryBackend;
    use crate::nfp::NfpCache;

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

    fn worker() -> PlacementWorker {
        let backend: Arc<dyn GeometryBackend> = Arc::new(ProductionGeometryBackend::new());
        let calculator = Arc::new(NfpCalculator::new(Arc::new(NfpCache::new()), backend.clone(), 4));
        PlacementWorker::new(backend, calculator, Config::default(), Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn cancelling_before_any_sheet_leaves_every_part_unplaced() {
        let backend: Arc<dyn GeometryBackend> = Arc::new(ProductionGeometryBackend::new());
        let calculator = Arc::new(NfpCalculator::new(Arc::new(NfpCache::new()), backend.clone(), 4));
        let cancel = Arc::new(AtomicBool::new(true));
        let w = PlacementWorker::new(backend, calculator, Config::default(), cancel);
        let sheet = square(100.0, 1);
        let part = square(10.0, 2);
        let result = w.place_parts(&[sheet], vec![part]);
        assert_eq!(result.unplaced_parts.len(), 1);
        assert_eq!(result.placements.len(), 0);
    }

    #[test]
    fn single_part_on_large_sheet_places_successfully() {
        let w = worker();
        let sheet = square(100.0, 1);
        let part = square(10.0, 2);
        let result = w.place_parts(&[sheet], vec![part]);
        assert_eq!(result.unplaced_parts.len(), 0);
        assert_eq!(result.placements[0].len(), 1);
    }

    #[test]
    fn part_larger_than_every_sheet_is_unplaced() {
        let w = worker();
        let sheet = square(5.0, 1);
        let part = square(10.0, 2);
        let result = w.place_parts(&[sheet], vec![part]);
        assert_eq!(result.unplaced_parts.len(), 1);
    }

    #[test]
    fn extract_candidate_positions_shifts_by_reference_vertex() {
        let part = square(2.0, 1);
        let region = Polygon::new(9, 0, vec![Point::new(5.0, 5.0)]);
        let candidates = extract_candidate_positions(&[region], &part);
        assert_eq!(candidates, vec![Point::inexact(5.0, 5.0)]);
    }
}
