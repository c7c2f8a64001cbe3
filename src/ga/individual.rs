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

use rand::Rng;

use crate::placement::Placement;

/// One candidate nesting solution: the order in which polygons (identified
/// by index into the engine's polygon pool, not a pointer) are offered to
/// the placement worker, and the rotation chosen for each. `placement[i]`
/// and `rotation[i]` refer to the same part.
#[derive(Clone, Debug)]
pub struct Individual {
    pub placement: Vec<usize>,
    pub rotation: Vec<f64>,
    pub fitness: f64,
    pub area: f64,
    pub merged_length: f64,
    pub placements: Vec<Vec<Placement>>,
    pub processing: bool,
}

impl Individual {
    /// The `adam` individual: parts in the given order, each given an
    /// independent random rotation drawn from `rotations` evenly-spaced
    /// angles.
    pub fn new_random(placement: Vec<usize>, rotations: u32, rng: &mut impl Rng) -> Individual {
        let rotation = (0..placement.len()).map(|_| random_rotation(rotations, rng)).collect();
        Individual {
            placement,
            rotation,
            fitness: f64::MAX,
            area: 0.0,
            merged_length: 0.0,
            placements: Vec::new(),
            processing: false,
        }
    }

    pub fn clone_reset(&self) -> Individual {
        let mut copy = self.clone();
        copy.processing = false;
        copy
    }

    /// Per-gene mutation: each adjacent pair in the placement order is
    /// swapped with probability `mutation_rate / 100`, and each rotation is
    /// independently redrawn with the same probability. Always resets
    /// fitness, since the individual changed.
    pub fn mutate(&mut self, mutation_rate: i32, rotations: u32, rng: &mut impl Rng) {
        let probability = mutation_rate as f64 * 0.01;

        for i in 0..self.placement.len() {
            if rng.gen::<f64>() < probability {
                let j = i + 1;
                if j < self.placement.len() {
                    self.placement.swap(i, j);
                }
            }
        }

        for rotation in self.rotation.iter_mut() {
            if rng.gen::<f64>() < probability {
                *rotation = random_rotation(rotations, rng);
            }
        }

        self.reset_fitness();
    }

    pub fn has_valid_fitness(&self) -> bool {
        self.fitness < f64::MAX
    }

    pub fn reset_fitness(&mut self) {
        self.fitness = f64::MAX;
        self.area = 0.0;
        self.merged_length = 0.0;
        self.placements.clear();
    }

    pub fn len(&self) -> usize {
        self.placement.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placement.is_empty()
    }
}

fn random_rotation(rotations: u32, rng: &mut impl Rng) -> f64 {
    let step = rng.gen_range(0..rotations);
    step as f64 * (360.0 / rotations as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mutate_always_resets_fitness() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut individual = Individual::new_random(vec![0, 1, 2], 4, &mut rng);
        individual.fitness = 123.0;
        individual.mutate(100, 4, &mut rng);
        assert_eq!(individual.fitness, f64::MAX);
    }

    #[test]
    fn mutate_with_zero_rate_never_changes_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut individual = Individual::new_random(vec![0, 1, 2, 3], 4, &mut rng);
        let before = individual.placement.clone();
        individual.mutate(0, 4, &mut rng);
        assert_eq!(individual.placement, before);
    }

    #[test]
    fn random_rotation_is_a_multiple_of_the_step_angle() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let angle = random_rotation(4, &mut rng);
            assert_eq!(angle % 90.0, 0.0);
        }
    }

    #[test]
    fn clone_reset_clears_processing_flag() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut individual = Individual::new_random(vec![0, 1], 4, &mut rng);
        individual.processing = true;
        let cloned = individual.clone_reset();
        assert!(!cloned.processing);
    }
}
