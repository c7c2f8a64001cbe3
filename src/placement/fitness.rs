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

//! Scores a completed placement. Lower is better: the GA sorts individuals
//! by this value and keeps the smallest.

use crate::geometry::{bounding_box_of, Polygon};
use crate::placement::worker::PlacementResult;

/// Unplaced parts are penalized far more heavily than any layout
/// inefficiency, so the GA always prefers a layout that places every part
/// over one that leaves any part off the sheet, regardless of area used.
const UNPLACED_PENALTY_SCALE: f64 = 1e8;

/// Unweighted: one unit of aligned cutting-edge length offsets fitness by
/// exactly one unit.
const MERGE_BONUS_WEIGHT: f64 = 1.0;

pub fn compute_fitness(result: &PlacementResult, sheets: &[Polygon]) -> f64 {
    let total_sheet_area: f64 = sheets.iter().map(Polygon::area).sum::<f64>().max(1.0);

    let mut fitness = 0.0;
    for (sheet, placements) in sheets.iter().zip(&result.placements) {
        if placements.is_empty() {
            continue;
        }
        fitness += sheet.area();

        let points: Vec<_> = placements.iter().map(|p| p.position).collect();
        let bbox = bounding_box_of(&points);
        fitness += bbox.width() / total_sheet_area;

        fitness += placements.iter().map(|p| p.strategy_score).sum::<f64>();
    }

    for part in &result.unplaced_parts {
        fitness += UNPLACED_PENALTY_SCALE * part.area() / total_sheet_area;
    }

    fitness - result.merged_length * MERGE_BONUS_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::placement::worker::Placement;

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

    #[test]
    fn unplaced_parts_dominate_the_score() {
        let sheets = vec![square(100.0, 1)];
        let placed = PlacementResult {
            placements: vec![vec![Placement {
                position: Point::zero(),
                id: 2,
                source: 0,
                rotation: 0.0,
                strategy_score: 0.0,
            }]],
            fitness: 0.0,
            area: 10_000.0,
            merged_length: 0.0,
            unplaced_parts: vec![],
        };
        let unplaced = PlacementResult {
            placements: vec![vec![]],
            fitness: 0.0,
            area: 0.0,
            merged_length: 0.0,
            unplaced_parts: vec![square(10.0, 3)],
        };

        assert!(compute_fitness(&unplaced, &sheets) > compute_fitness(&placed, &sheets));
    }

    #[test]
    fn higher_merged_length_lowers_fitness() {
        let sheets = vec![square(100.0, 1)];
        let base = PlacementResult {
            placements: vec![vec![Placement {
                position: Point::zero(),
                id: 2,
                source: 0,
                rotation: 0.0,
                strategy_score: 0.0,
            }]],
            fitness: 0.0,
            area: 10_000.0,
            merged_length: 0.0,
            unplaced_parts: vec![],
        };
        let mut merged = base.clone();
        merged.merged_length = 50.0;

        let delta = compute_fitness(&base, &sheets) - compute_fitness(&merged, &sheets);
        assert!((delta - 50.0).abs() < 1e-9);
    }
}
