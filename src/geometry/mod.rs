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

//! Geometry primitives and the polygon boolean/offset/Minkowski backend.

mod ops;
mod point;
mod polygon;
mod primitives;

pub use ops::{GeometryBackend, ProductionGeometryBackend};
pub use point::Point;
pub use polygon::{BoundingBox, Polygon};
pub use primitives::{
    almost_equal, almost_equal_points, area, bounding_box_of, centroid, compute_convex_hull,
    cross, dot, find_intersections, is_point_on_segment, normalize_vector, orientation,
    point_in_polygon, segment_intersection, Orientation,
};
