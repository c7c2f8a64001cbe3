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

//! The nesting state machine: `Uninitialized -> initialize -> Ready ->
//! start -> Running -> (step*) -> stop|complete -> Stopped`.
//!
//! Evaluation is driven by [`crate::parallel::GenerationScheduler`]:
//! `step()` queues placement tasks for whatever individuals still need a
//! fitness and applies whatever has finished since the last call, but
//! never blocks waiting on the rest. `stop()` sets a shared cancel flag
//! — observed by the scheduler before queueing a new task and by each
//! in-flight placement between sheets — and blocks until every
//! already-dispatched task has written its result back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, trace};

use crate::config::Config;
use crate::error::{Result, SolverError};
use crate::ga::Population;
use crate::geometry::{GeometryBackend, Polygon, ProductionGeometryBackend};
use crate::nfp::{NfpCache, NfpCalculator};
use crate::parallel::GenerationScheduler;
use crate::placement::Placement;

const MAX_SAVED_RESULTS: usize = 10;

#[derive(Clone, Debug)]
pub struct NestResult {
    pub placements: Vec<Vec<Placement>>,
    pub fitness: f64,
    pub area: f64,
    pub merged_length: f64,
    pub generation: u32,
    pub individual_index: usize,
}

#[derive(Copy, Clone, Debug)]
pub struct NestProgress {
    pub generation: u32,
    pub evaluations_completed: u64,
    pub best_fitness: f64,
    pub percent_complete: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Ready,
    Running,
    Stopped,
}

pub struct NestingEngine {
    config: Config,
    backend: Arc<dyn GeometryBackend>,
    nfp_calculator: Arc<NfpCalculator>,
    scheduler: GenerationScheduler,
    rng: StdRng,
    cancel: Arc<AtomicBool>,

    parts_pool: Arc<Vec<Polygon>>,
    sheets: Arc<Vec<Polygon>>,
    population: Population,

    state: EngineState,
    generation: u32,
    max_generations: u32,
    evaluations_completed: u64,
    started_at: Option<Instant>,

    results: Vec<NestResult>,
    progress_callback: Option<Box<dyn FnMut(&NestProgress) + Send>>,
    result_callback: Option<Box<dyn FnMut(&NestResult) + Send>>,
}

impl NestingEngine {
    pub fn new(config: Config) -> NestingEngine {
        let backend: Arc<dyn GeometryBackend> = Arc::new(ProductionGeometryBackend::new());
        let key_precision = key_precision_from(config.curve_tolerance);
        let nfp_calculator = Arc::new(NfpCalculator::new(Arc::new(NfpCache::new()), backend.clone(), key_precision));
        let cancel = Arc::new(AtomicBool::new(false));
        let scheduler = GenerationScheduler::new(backend.clone(), nfp_calculator.clone(), config, cancel.clone());
        let rng = if config.random_seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(config.random_seed)
        };

        NestingEngine {
            config,
            backend,
            nfp_calculator,
            scheduler,
            rng,
            cancel,
            parts_pool: Arc::new(Vec::new()),
            sheets: Arc::new(Vec::new()),
            population: Population::new(),
            state: EngineState::Uninitialized,
            generation: 0,
            max_generations: 0,
            evaluations_completed: 0,
            started_at: None,
            results: Vec::new(),
            progress_callback: None,
            result_callback: None,
        }
    }

    /// Expands quantities into the polygon pool (ids assigned by a single
    /// counter that runs across parts then sheets, `source` set to the
    /// pre-expansion index), builds the adam individual in descending-area
    /// order, and seeds the rest of the first population from it.
    pub fn initialize(&mut self, parts: Vec<(Polygon, u32)>, sheets: Vec<(Polygon, u32)>) -> Result<()> {
        if parts.is_empty() || parts.iter().all(|(_, qty)| *qty == 0) {
            return Err(SolverError::NoParts);
        }
        if sheets.is_empty() || sheets.iter().all(|(_, qty)| *qty == 0) {
            return Err(SolverError::NoSheets);
        }

        let mut next_id: u64 = 0;
        let mut part_pool = Vec::new();
        for (source, (polygon, qty)) in parts.into_iter().enumerate() {
            let spaced = self.apply_spacing(&polygon, self.config.spacing);
            for _ in 0..qty {
                let mut instance = spaced.clone();
                instance.id = next_id;
                instance.source = source;
                next_id += 1;
                part_pool.push(instance);
            }
        }

        let mut sheet_pool = Vec::new();
        for (source, (polygon, qty)) in sheets.into_iter().enumerate() {
            for _ in 0..qty {
                let mut instance = polygon.clone();
                instance.id = next_id;
                instance.source = source;
                next_id += 1;
                sheet_pool.push(instance);
            }
        }

        let mut adam_order: Vec<usize> = (0..part_pool.len()).collect();
        adam_order.sort_by(|&a, &b| part_pool[b].area().abs().partial_cmp(&part_pool[a].area().abs()).unwrap());

        self.population = Population::new();
        self.population.initialize(adam_order, &self.config, &mut self.rng);

        self.parts_pool = Arc::new(part_pool);
        self.sheets = Arc::new(sheet_pool);
        self.generation = 0;
        self.evaluations_completed = 0;
        self.results.clear();
        self.cancel.store(false, Ordering::Relaxed);
        self.state = EngineState::Ready;

        info!(parts = self.parts_pool.len(), sheets = self.sheets.len(), "engine initialized");
        Ok(())
    }

    pub fn start(
        &mut self,
        progress_callback: Option<Box<dyn FnMut(&NestProgress) + Send>>,
        result_callback: Option<Box<dyn FnMut(&NestResult) + Send>>,
        max_generations: u32,
    ) -> Result<()> {
        if self.state == EngineState::Uninitialized {
            return Err(SolverError::NotInitialized);
        }
        if self.state == EngineState::Running {
            return Err(SolverError::AlreadyRunning);
        }

        self.max_generations = max_generations;
        self.progress_callback = progress_callback;
        self.result_callback = result_callback;
        self.state = EngineState::Running;
        self.started_at = Some(Instant::now());
        info!(max_generations, "engine started");
        Ok(())
    }

    /// Sets the shared cancel flag and blocks until every placement task
    /// already dispatched for the current generation has written its
    /// result back, then transitions to `Stopped`.
    pub fn stop(&mut self) {
        if self.state == EngineState::Running {
            self.cancel.store(true, Ordering::Relaxed);
            self.scheduler.drain_all(&mut self.population);
            self.state = EngineState::Stopped;
            info!(generation = self.generation, "engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    /// Applies whatever placement results have arrived since the last
    /// call, advances to the next generation once every individual in the
    /// current one has a valid fitness, and queues placement tasks for the
    /// individuals that still need one. Never blocks waiting for a
    /// dispatched task to finish — returns `false` once the run is no
    /// longer making progress (not running, or just hit
    /// `max_generations`/the configured timeout with nothing left
    /// in flight).
    pub fn step(&mut self) -> bool {
        if self.state != EngineState::Running {
            return false;
        }

        let applied = self.scheduler.collect_completed(&mut self.population);
        self.evaluations_completed += applied as u64;

        if self.timed_out() {
            self.cancel.store(true, Ordering::Relaxed);
        }

        if self.population.is_generation_complete() {
            if self.cancel.load(Ordering::Relaxed) || (self.max_generations > 0 && self.generation >= self.max_generations) {
                self.state = EngineState::Stopped;
                return false;
            }
            self.population.next_generation(&self.config, &mut self.rng);
            self.generation += 1;
            trace!(generation = self.generation, "advanced generation");
        }

        if !self.cancel.load(Ordering::Relaxed) {
            self.scheduler.dispatch_pending(&mut self.population, self.sheets.clone(), self.parts_pool.clone());
        }

        self.maybe_record_best();

        let progress = self.progress();
        if let Some(callback) = self.progress_callback.as_mut() {
            callback(&progress);
        }

        true
    }

    fn timed_out(&self) -> bool {
        if self.config.timeout_seconds == 0 {
            return false;
        }
        match self.started_at {
            Some(start) => start.elapsed() > Duration::from_secs(self.config.timeout_seconds),
            None => false,
        }
    }

    fn maybe_record_best(&mut self) {
        let Some((index, best)) = self
            .population
            .individuals()
            .iter()
            .enumerate()
            .filter(|(_, i)| i.has_valid_fitness())
            .min_by(|(_, a), (_, b)| a.fitness.partial_cmp(&b.fitness).unwrap())
        else {
            return;
        };

        let is_new_best = self.results.first().map(|r| best.fitness < r.fitness).unwrap_or(true);
        if !is_new_best {
            return;
        }

        let result = NestResult {
            placements: best.placements.clone(),
            fitness: best.fitness,
            area: best.area,
            merged_length: best.merged_length,
            generation: self.generation,
            individual_index: index,
        };

        if let Some(callback) = self.result_callback.as_mut() {
            callback(&result);
        }

        self.results.insert(0, result);
        self.results.truncate(MAX_SAVED_RESULTS);
    }

    pub fn progress(&self) -> NestProgress {
        let best_fitness = self.results.first().map(|r| r.fitness).unwrap_or(f64::MAX);
        let percent_complete = if self.max_generations > 0 {
            (self.generation as f64 / self.max_generations as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        NestProgress {
            generation: self.generation,
            evaluations_completed: self.evaluations_completed,
            best_fitness,
            percent_complete,
        }
    }

    pub fn best_result(&self) -> Option<&NestResult> {
        self.results.first()
    }

    pub fn results(&self) -> &[NestResult] {
        &self.results
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn nfp_calculator(&self) -> &Arc<NfpCalculator> {
        &self.nfp_calculator
    }

    fn apply_spacing(&self, polygon: &Polygon, spacing: f64) -> Polygon {
        if spacing == 0.0 {
            return polygon.clone();
        }
        let offset = self.backend.offset(polygon, spacing / 2.0);
        offset.into_iter().next().unwrap_or_else(|| polygon.clone())
    }
}

fn key_precision_from(curve_tolerance: f64) -> i32 {
    if curve_tolerance <= 0.0 {
        return 6;
    }
    (-curve_tolerance.log10()).round().clamp(2.0, 9.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

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

    fn config() -> Config {
        let mut c = Config::default();
        c.population_size = 4;
        c.rotations = 4;
        c.threads = 2;
        c
    }

    #[test]
    fn initialize_without_parts_fails() {
        let mut engine = NestingEngine::new(config());
        let err = engine.initialize(vec![], vec![(square(10.0, 0), 1)]).unwrap_err();
        assert!(matches!(err, SolverError::NoParts));
    }

    #[test]
    fn initialize_without_sheets_fails() {
        let mut engine = NestingEngine::new(config());
        let err = engine.initialize(vec![(square(1.0, 0), 1)], vec![]).unwrap_err();
        assert!(matches!(err, SolverError::NoSheets));
    }

    #[test]
    fn starting_before_initialize_fails() {
        let mut engine = NestingEngine::new(config());
        let err = engine.start(None, None, 0).unwrap_err();
        assert!(matches!(err, SolverError::NotInitialized));
    }

    #[test]
    fn full_run_places_parts_and_stops_at_max_generations() {
        let mut engine = NestingEngine::new(config());
        engine
            .initialize(vec![(square(5.0, 0), 3)], vec![(square(100.0, 0), 1)])
            .unwrap();
        engine.start(None, None, 2).unwrap();

        // step() only queues and collects; it never waits on in-flight
        // placements, so a tight loop would spin far ahead of the worker
        // pool. A short sleep between calls keeps the bound meaningful
        // without asserting on wall-clock timing directly.
        let mut steps = 0;
        while engine.step() {
            steps += 1;
            assert!(steps < 100_000, "engine did not converge");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        assert!(!engine.is_running());
        let best = engine.best_result().expect("a result should have been recorded");
        assert!(best.fitness.is_finite());
    }

    #[test]
    fn stop_drains_in_flight_work_before_returning() {
        let mut engine = NestingEngine::new(config());
        engine
            .initialize(vec![(square(5.0, 0), 4)], vec![(square(100.0, 0), 1)])
            .unwrap();
        engine.start(None, None, 0).unwrap();
        engine.step();

        engine.stop();

        assert!(!engine.is_running());
        assert!(engine.population.individuals().iter().all(|i| !i.processing));
    }

    #[test]
    fn double_start_without_stop_is_rejected() {
        let mut engine = NestingEngine::new(config());
        engine
            .initialize(vec![(square(5.0, 0), 1)], vec![(square(100.0, 0), 1)])
            .unwrap();
        engine.start(None, None, 1).unwrap();
        let err = engine.start(None, None, 1).unwrap_err();
        assert!(matches!(err, SolverError::AlreadyRunning));
    }
}
