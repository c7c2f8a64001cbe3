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

use crate::config::Config;
use crate::ga::individual::Individual;

/// Manages one generation's individuals and the genetic operators that
/// produce the next one. Parts are referenced by pool index (see
/// `Individual`), never by pointer, so cloning a population is just
/// cloning plain data.
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    pub fn new() -> Population {
        Population { individuals: Vec::new() }
    }

    /// Builds the initial population: `adam` in the given part order with
    /// independent random rotations, then `population_size - 1` mutated
    /// clones of `adam`.
    pub fn initialize(&mut self, parts: Vec<usize>, config: &Config, rng: &mut impl Rng) {
        assert!(!parts.is_empty(), "parts list cannot be empty");

        self.individuals.clear();
        let adam = Individual::new_random(parts, config.rotations, rng);
        self.individuals.push(adam.clone());

        while self.individuals.len() < config.population_size {
            let mut mutant = adam.clone_reset();
            mutant.mutate(config.mutation_rate, config.rotations, rng);
            self.individuals.push(mutant);
        }
    }

    /// Single-point crossover: each child starts with one parent's genes
    /// up to a randomly chosen cut point (between 10% and 90% of the
    /// sequence), then fills the rest with the other parent's genes in
    /// their original order, skipping any part id already present.
    pub fn crossover(&self, parent1: &Individual, parent2: &Individual, rng: &mut impl Rng) -> (Individual, Individual) {
        assert!(!parent1.placement.is_empty() && !parent2.placement.is_empty());

        let fraction: f64 = rng.gen_range(0.1..=0.9);
        let cutpoint = (fraction * (parent1.placement.len() - 1) as f64).round() as usize;

        let mut child1 = take_prefix(parent1, cutpoint);
        let mut child2 = take_prefix(parent2, cutpoint);

        fill_remaining(&mut child1, parent2);
        fill_remaining(&mut child2, parent1);

        (child1, child2)
    }

    /// Weighted-random selection favoring individuals earlier in the
    /// (fitness-sorted) population. Index `i`'s selection band width is
    /// `2*weight*(n-i)/n` where `weight = 1/n`, so index 0 is twice as
    /// likely to be picked as the uniform baseline and the last index is
    /// vanishingly unlikely. `exclude` is compared by identity via index.
    pub fn select_weighted_random(&self, exclude: Option<usize>, rng: &mut impl Rng) -> Individual {
        assert!(!self.individuals.is_empty(), "cannot select from an empty population");

        let indices: Vec<usize> =
            (0..self.individuals.len()).filter(|&i| Some(i) != exclude).collect();
        assert!(!indices.is_empty(), "population empty after exclusion");

        let n = indices.len() as f64;
        let weight = 1.0 / n;
        let roll: f64 = rng.gen_range(0.0..1.0);

        let mut lower = 0.0;
        let mut upper = weight;
        for (rank, &index) in indices.iter().enumerate() {
            if roll > lower && roll < upper {
                return self.individuals[index].clone();
            }
            lower = upper;
            upper += 2.0 * weight * ((indices.len() - rank) as f64 / n);
        }

        self.individuals[indices[0]].clone()
    }

    /// Sorts by fitness, keeps the best individual (elitism), and fills
    /// the rest of the new generation with mutated crossover children of
    /// weighted-randomly selected parents.
    pub fn next_generation(&mut self, config: &Config, rng: &mut impl Rng) {
        assert!(!self.individuals.is_empty(), "cannot evolve an empty population");

        self.sort_by_fitness();
        let target_size = self.individuals.len();
        let mut next = vec![self.individuals[0].clone()];

        while next.len() < target_size {
            let male_index = self.weighted_random_index(None, rng);
            let female_index = self.weighted_random_index(Some(male_index), rng);
            let male = self.individuals[male_index].clone();
            let female = self.individuals[female_index].clone();

            let (mut child1, mut child2) = self.crossover(&male, &female, rng);
            child1.mutate(config.mutation_rate, config.rotations, rng);
            next.push(child1);

            if next.len() < target_size {
                child2.mutate(config.mutation_rate, config.rotations, rng);
                next.push(child2);
            }
        }

        self.individuals = next;
    }

    fn weighted_random_index(&self, exclude: Option<usize>, rng: &mut impl Rng) -> usize {
        let indices: Vec<usize> =
            (0..self.individuals.len()).filter(|&i| Some(i) != exclude).collect();
        let n = indices.len() as f64;
        let weight = 1.0 / n;
        let roll: f64 = rng.gen_range(0.0..1.0);

        let mut lower = 0.0;
        let mut upper = weight;
        for (rank, &index) in indices.iter().enumerate() {
            if roll > lower && roll < upper {
                return index;
            }
            lower = upper;
            upper += 2.0 * weight * ((indices.len() - rank) as f64 / n);
        }
        indices[0]
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    pub fn best(&self) -> &Individual {
        &self.individuals[0]
    }

    pub fn sort_by_fitness(&mut self) {
        self.individuals.sort_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap());
    }

    pub fn is_generation_complete(&self) -> bool {
        self.individuals.iter().all(Individual::has_valid_fitness)
    }

    pub fn processing_count(&self) -> usize {
        self.individuals.iter().filter(|i| i.processing).count()
    }

    pub fn clear(&mut self) {
        self.individuals.clear();
    }
}

impl Default for Population {
    fn default() -> Self {
        Population::new()
    }
}

fn take_prefix(parent: &Individual, cutpoint: usize) -> Individual {
    Individual {
        placement: parent.placement[..cutpoint].to_vec(),
        rotation: parent.rotation[..cutpoint].to_vec(),
        fitness: f64::MAX,
        area: 0.0,
        merged_length: 0.0,
        placements: Vec::new(),
        processing: false,
    }
}

fn fill_remaining(child: &mut Individual, donor: &Individual) {
    for (i, &part_id) in donor.placement.iter().enumerate() {
        if !child.placement.contains(&part_id) {
            child.placement.push(part_id);
            child.rotation.push(donor.rotation[i]);
        }
    }
}
