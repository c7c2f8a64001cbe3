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

//! Greedy part placement: NFP-driven candidate search, merge-length
//! detection for cutting optimization, and the fitness function the GA
//! optimizes.

mod fitness;
mod merge;
mod strategy;
mod worker;

pub use fitness::compute_fitness;
pub use strategy::{strategy_for, PlacementStrategy};
pub use worker::{Placement, PlacedPart, PlacementResult, PlacementWorker};
