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

//! Immutable run configuration. `Config` is constructed once (via
//! [`Config::default`] plus setters, or deserialized from the persistence
//! document) and handed to the engine by value; nothing mutates it while a
//! run is in progress, unlike the reference implementation's global config
//! singleton.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// Objective used to rank candidate placement positions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementType {
    Gravity,
    BoundingBox,
    ConvexHull,
}

impl Default for PlacementType {
    fn default() -> Self {
        PlacementType::Gravity
    }
}

impl PlacementType {
    /// Accepts both `"box"` and `"boundingbox"` on input; the persisted
    /// document always spells it out as `"boundingbox"`.
    pub fn parse(s: &str) -> Result<PlacementType> {
        match s.to_ascii_lowercase().as_str() {
            "gravity" => Ok(PlacementType::Gravity),
            "box" | "boundingbox" => Ok(PlacementType::BoundingBox),
            "convexhull" => Ok(PlacementType::ConvexHull),
            other => Err(SolverError::InvalidPlacementType(other.to_string())),
        }
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            PlacementType::Gravity => "gravity",
            PlacementType::BoundingBox => "boundingbox",
            PlacementType::ConvexHull => "convexhull",
        }
    }
}

/// Direction gravity-style placement biases towards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GravityDirection {
    Left,
    Right,
}

impl Default for GravityDirection {
    fn default() -> Self {
        GravityDirection::Left
    }
}

/// Every field carries `#[serde(default)]` so a persistence document saved
/// before a field existed still deserializes, falling back to that field's
/// `Default` impl rather than failing the whole document.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clipper_scale: f64,
    #[serde(default)]
    pub curve_tolerance: f64,
    #[serde(default)]
    pub spacing: f64,
    #[serde(default)]
    pub rotations: u32,
    #[serde(default)]
    pub population_size: usize,
    #[serde(default)]
    pub mutation_rate: i32,
    #[serde(default)]
    pub threads: usize,
    #[serde(default)]
    pub placement_type: PlacementType,
    #[serde(default)]
    pub merge_lines: bool,
    #[serde(default)]
    pub time_ratio: f64,
    #[serde(default)]
    pub scale: f64,
    #[serde(default)]
    pub simplify: bool,
    #[serde(default)]
    pub overlap_tolerance: f64,
    #[serde(default)]
    pub use_holes: bool,
    #[serde(default)]
    pub explore_concave: bool,
    #[serde(default)]
    pub max_iterations: u32,
    #[serde(default)]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub progressive: bool,
    #[serde(default)]
    pub gravity_direction: GravityDirection,
    /// 0 means seed from OS entropy.
    #[serde(default)]
    pub random_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clipper_scale: 10_000_000.0,
            curve_tolerance: 0.3,
            spacing: 0.0,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            threads: 4,
            placement_type: PlacementType::Gravity,
            merge_lines: true,
            time_ratio: 0.5,
            scale: 72.0,
            simplify: false,
            overlap_tolerance: 0.0001,
            use_holes: false,
            explore_concave: false,
            max_iterations: 0,
            timeout_seconds: 0,
            progressive: false,
            gravity_direction: GravityDirection::Left,
            random_seed: 0,
        }
    }
}

impl Config {
    pub fn set_spacing(&mut self, value: f64) -> Result<()> {
        if value < 0.0 {
            return Err(SolverError::InvalidMutationRate(0));
        }
        self.spacing = value;
        Ok(())
    }

    pub fn set_rotations(&mut self, value: u32) {
        // Out-of-range values (0) revert to the default, matching the
        // persistence-document's load-time sanitization rule below.
        self.rotations = if value == 0 { Config::default().rotations } else { value };
    }

    pub fn set_population_size(&mut self, value: usize) -> Result<()> {
        if value < 3 {
            return Err(SolverError::InvalidPopulationSize(value as i32));
        }
        self.population_size = value;
        Ok(())
    }

    pub fn set_mutation_rate(&mut self, value: i32) -> Result<()> {
        if !(0..=100).contains(&value) {
            return Err(SolverError::InvalidMutationRate(value));
        }
        self.mutation_rate = value;
        Ok(())
    }

    pub fn set_threads(&mut self, value: usize) {
        self.threads = if value == 0 { resolve_hardware_threads() } else { value };
    }

    pub fn resolved_threads(&self) -> usize {
        if self.threads == 0 {
            resolve_hardware_threads()
        } else {
            self.threads
        }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes the persistence document. Unknown keys are ignored by
    /// serde's default struct handling; out-of-range
    /// numeric values are reset to the default for that field.
    pub fn from_json_str(s: &str) -> serde_json::Result<Config> {
        let mut config: Config = serde_json::from_str(s)?;
        config.sanitize();
        Ok(config)
    }

    fn sanitize(&mut self) {
        let default = Config::default();
        if self.curve_tolerance <= 0.0 {
            self.curve_tolerance = default.curve_tolerance;
        }
        if self.rotations == 0 {
            self.rotations = default.rotations;
        }
        if self.population_size <= 2 {
            self.population_size = default.population_size;
        }
        if !(0..=100).contains(&self.mutation_rate) {
            self.mutation_rate = default.mutation_rate;
        }
        if self.clipper_scale <= 0.0 {
            self.clipper_scale = default.clipper_scale;
        }
        if self.spacing < 0.0 {
            self.spacing = default.spacing;
        }
    }
}

fn resolve_hardware_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .max(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_type_accepts_both_spellings() {
        assert_eq!(PlacementType::parse("box").unwrap(), PlacementType::BoundingBox);
        assert_eq!(PlacementType::parse("boundingbox").unwrap(), PlacementType::BoundingBox);
        assert_eq!(PlacementType::parse("BOX").unwrap(), PlacementType::BoundingBox);
    }

    #[test]
    fn placement_type_canonicalizes_to_boundingbox() {
        assert_eq!(PlacementType::BoundingBox.canonical_name(), "boundingbox");
    }

    #[test]
    fn placement_type_rejects_unknown() {
        assert!(PlacementType::parse("spiral").is_err());
    }

    #[test]
    fn hardware_thread_default_is_at_least_four() {
        let mut config = Config::default();
        config.set_threads(0);
        assert!(config.threads >= 4);
    }

    #[test]
    fn json_roundtrip_preserves_values() {
        let mut config = Config::default();
        config.set_mutation_rate(25).unwrap();
        let json = config.to_json_string().unwrap();
        let restored = Config::from_json_str(&json).unwrap();
        assert_eq!(restored.mutation_rate, 25);
    }

    #[test]
    fn document_missing_fields_still_deserializes() {
        let config = Config::from_json_str(r#"{"mutation_rate":25}"#).unwrap();
        assert_eq!(config.mutation_rate, 25);
        // Falls back to rotations' field-level default (0), which sanitize()
        // then reverts to Config::default()'s tuned value.
        assert_eq!(config.rotations, Config::default().rotations);
    }

    #[test]
    fn out_of_range_values_revert_to_default_on_load() {
        let json = r#"{"clipper_scale":10000000.0,"curve_tolerance":0.3,"spacing":0.0,
            "rotations":0,"population_size":1,"mutation_rate":500,"threads":4,
            "placement_type":"Gravity","merge_lines":true,"time_ratio":0.5,"scale":72.0,
            "simplify":false,"overlap_tolerance":0.0001,"use_holes":false,
            "explore_concave":false,"max_iterations":0,"timeout_seconds":0,
            "progressive":false,"gravity_direction":"Left","random_seed":0}"#;
        let config = Config::from_json_str(json).unwrap();
        let default = Config::default();
        assert_eq!(config.rotations, default.rotations);
        assert_eq!(config.population_size, default.population_size);
        assert_eq!(config.mutation_rate, default.mutation_rate);
    }
}
