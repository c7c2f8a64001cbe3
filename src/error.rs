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

use std::result::Result as StdResult;

quick_error! {
    #[derive(Debug)]
    pub enum SolverError {
        NoParts {
            description("no parts have been added, at least one part is required to start")
        }
        NoSheets {
            description("no sheets have been added, at least one sheet is required to start")
        }
        InvalidMutationRate(value: i32) {
            display("mutation rate must be between 0 and 100, got {}", value)
        }
        InvalidPopulationSize(value: i32) {
            display("population size must be at least 3, got {}", value)
        }
        InvalidPlacementType(value: String) {
            display("unknown placement type {:?}, expected gravity/box/boundingbox/convexhull", value)
        }
        NotInitialized {
            description("solver has not been initialized with parts and sheets yet")
        }
        AlreadyRunning {
            description("solver is already running, call stop() before start()")
        }
    }
}

pub type Result<T> = StdResult<T, SolverError>;
