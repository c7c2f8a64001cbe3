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

use ordered_float::OrderedFloat;

/// Cache key for a single NFP computation. Rotations are normalized to a
/// hashable, tolerance-stable representation (`OrderedFloat` over a value
/// rounded to the cache's configured precision) rather than compared with
/// an epsilon at lookup time, so two rotations that the reference
/// implementation's `almostEqual` would treat as identical hash the same.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NfpKey {
    pub id_a: u64,
    pub id_b: u64,
    rotation_a: OrderedFloat<f64>,
    rotation_b: OrderedFloat<f64>,
    pub inside: bool,
}

impl NfpKey {
    /// `precision` is decimal places to round to before hashing; callers
    /// derive it from `Config::curve_tolerance` so that cache keys become
    /// coarser as tolerance grows.
    pub fn new(id_a: u64, id_b: u64, rotation_a: f64, rotation_b: f64, inside: bool, precision: i32) -> NfpKey {
        NfpKey {
            id_a,
            id_b,
            rotation_a: OrderedFloat(round_to(rotation_a, precision)),
            rotation_b: OrderedFloat(round_to(rotation_b, precision)),
            inside,
        }
    }
}

fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    (value * factor).round() / factor
}
