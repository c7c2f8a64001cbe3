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

//! Public façade: the surface a host application drives, wrapping
//! [`NestingEngine`] with the configuration setters, part/sheet
//! bookkeeping, and callback registration described for the solver API.

use std::thread;
use std::time::Duration;

use crate::config::{Config, GravityDirection, PlacementType};
use crate::engine::{NestingEngine, NestProgress, NestResult};
use crate::error::Result;
use crate::geometry::Polygon;

const MIN_POLYGON_VERTICES: usize = 3;
const MIN_POLYGON_AREA: f64 = 1e-9;

/// A part or sheet pending `start()`, along with its repeat count and
/// optional display name.
struct PendingShape {
    polygon: Polygon,
    quantity: u32,
    #[allow(dead_code)]
    name: Option<String>,
}

pub struct Solver {
    config: Config,
    parts: Vec<PendingShape>,
    sheets: Vec<PendingShape>,
    engine: Option<NestingEngine>,
}

impl Solver {
    pub fn new() -> Solver {
        Solver { config: Config::default(), parts: Vec::new(), sheets: Vec::new(), engine: None }
    }

    pub fn with_config(config: Config) -> Solver {
        Solver { config, parts: Vec::new(), sheets: Vec::new(), engine: None }
    }

    pub fn set_spacing(&mut self, value: f64) -> Result<()> {
        self.config.set_spacing(value)
    }

    pub fn set_rotations(&mut self, value: u32) {
        self.config.set_rotations(value);
    }

    pub fn set_population_size(&mut self, value: usize) -> Result<()> {
        self.config.set_population_size(value)
    }

    pub fn set_mutation_rate(&mut self, value: i32) -> Result<()> {
        self.config.set_mutation_rate(value)
    }

    pub fn set_threads(&mut self, value: usize) {
        self.config.set_threads(value);
    }

    pub fn set_placement_type(&mut self, value: &str) -> Result<()> {
        self.config.placement_type = PlacementType::parse(value)?;
        Ok(())
    }

    pub fn set_merge_lines(&mut self, value: bool) {
        self.config.merge_lines = value;
    }

    pub fn set_curve_tolerance(&mut self, value: f64) {
        if value > 0.0 {
            self.config.curve_tolerance = value;
        }
    }

    pub fn set_simplify(&mut self, value: bool) {
        self.config.simplify = value;
    }

    pub fn set_gravity_direction(&mut self, direction: GravityDirection) {
        self.config.gravity_direction = direction;
    }

    /// Adds a part with the given repeat count. Degenerate polygons
    /// (fewer than three vertices, or effectively zero area) are dropped
    /// silently — this mirrors the reference loader's validate-and-discard
    /// behavior rather than raising an error.
    pub fn add_part(&mut self, polygon: Polygon, quantity: u32, name: Option<String>) {
        if quantity == 0 || !is_nestable(&polygon) {
            return;
        }
        self.parts.push(PendingShape { polygon, quantity, name });
    }

    pub fn add_sheet(&mut self, polygon: Polygon, quantity: u32, name: Option<String>) {
        if quantity == 0 || !is_nestable(&polygon) {
            return;
        }
        self.sheets.push(PendingShape { polygon, quantity, name });
    }

    pub fn clear_parts(&mut self) {
        self.parts.clear();
    }

    pub fn clear_sheets(&mut self) {
        self.sheets.clear();
    }

    pub fn clear(&mut self) {
        self.clear_parts();
        self.clear_sheets();
        self.engine = None;
    }

    /// Initializes (or re-initializes, if the part/sheet set changed since
    /// the last run) the engine and starts it.
    pub fn start(&mut self, max_generations: u32) -> Result<()> {
        self.start_with_callbacks(None, None, max_generations)
    }

    pub fn start_with_callbacks(
        &mut self,
        progress_callback: Option<Box<dyn FnMut(&NestProgress) + Send>>,
        result_callback: Option<Box<dyn FnMut(&NestResult) + Send>>,
        max_generations: u32,
    ) -> Result<()> {
        let mut engine = NestingEngine::new(self.config);
        let parts = self.parts.iter().map(|p| (p.polygon.clone(), p.quantity)).collect();
        let sheets = self.sheets.iter().map(|s| (s.polygon.clone(), s.quantity)).collect();
        engine.initialize(parts, sheets)?;
        engine.start(progress_callback, result_callback, max_generations)?;
        self.engine = Some(engine);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
    }

    pub fn step(&mut self) -> bool {
        self.engine.as_mut().map(|engine| engine.step()).unwrap_or(false)
    }

    pub fn is_running(&self) -> bool {
        self.engine.as_ref().map(|engine| engine.is_running()).unwrap_or(false)
    }

    /// Drives `step()` in a loop until the run stops, sleeping
    /// `delay` between calls. Intended for callers without their own
    /// event loop (tests, CLIs, batch jobs); a host with a timer or event
    /// loop should call `step()` directly instead.
    pub fn run_until_complete(&mut self, max_generations: u32, delay: Duration) -> Result<()> {
        self.start(max_generations)?;
        while self.step() {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
        Ok(())
    }

    pub fn get_progress(&self) -> Option<NestProgress> {
        self.engine.as_ref().map(|engine| engine.progress())
    }

    pub fn get_best_result(&self) -> Option<&NestResult> {
        self.engine.as_ref().and_then(|engine| engine.best_result())
    }

    pub fn get_results(&self) -> &[NestResult] {
        self.engine.as_ref().map(|engine| engine.results()).unwrap_or(&[])
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new()
    }
}

fn is_nestable(polygon: &Polygon) -> bool {
    polygon.points.len() >= MIN_POLYGON_VERTICES && polygon.area().abs() > MIN_POLYGON_AREA
}
