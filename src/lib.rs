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

//! Irregular-shape 2D nesting: no-fit-polygon placement search driven by a
//! genetic algorithm, evaluated on a parallel worker pool.
//!
//! [`Solver`] is the entry point: configure it, add parts and sheets, then
//! either drive `step()` from a host event loop or call
//! `run_until_complete`.

#[macro_use]
extern crate quick_error;

pub mod config;
pub mod engine;
pub mod error;
pub mod ga;
pub mod geometry;
pub mod nfp;
pub mod parallel;
pub mod placement;
mod solver;

pub use config::{Config, GravityDirection, PlacementType};
pub use engine::{NestingEngine, NestProgress, NestResult};
pub use error::{Result, SolverError};
pub use geometry::{BoundingBox, GeometryBackend, Point, Polygon, ProductionGeometryBackend};
pub use solver::Solver;
