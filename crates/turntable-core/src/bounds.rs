// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Computes the world-space bounding box of a scene.

use std::fmt;

use crate::math::Aabb;
use crate::scene::{MeshInstance, Scene};

/// An error raised while computing scene bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundsError {
    /// The scene contains no mesh with at least one vertex.
    NoGeometry,
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsError::NoGeometry => write!(f, "Scene contains no mesh geometry"),
        }
    }
}

impl std::error::Error for BoundsError {}

/// Computes the union of every mesh's local box transformed into world space.
///
/// Each local box contributes its eight corners after transformation, so rotated meshes
/// yield a conservative box. Meshes whose local box is invalid (no vertices) are skipped.
///
/// # Errors
///
/// Returns [`BoundsError::NoGeometry`] if no mesh contributes any corner.
pub fn compute_bounds<'a, I>(meshes: I) -> Result<Aabb, BoundsError>
where
    I: IntoIterator<Item = &'a MeshInstance>,
{
    let mut contributing = 0usize;
    let bounds = meshes
        .into_iter()
        .filter(|mesh| mesh.local_bounds.is_valid())
        .fold(Aabb::INVALID, |acc, mesh| {
            contributing += 1;
            acc.merge(&mesh.local_bounds.transform_corners(&mesh.world_transform))
        });

    if contributing == 0 || !bounds.is_valid() {
        return Err(BoundsError::NoGeometry);
    }

    log::debug!(
        "Bounds of {} mesh(es): min {:?}, max {:?}",
        contributing,
        bounds.min.to_array(),
        bounds.max.to_array()
    );
    Ok(bounds)
}

/// Computes the world-space bounds of every mesh in `scene`.
pub fn scene_bounds(scene: &Scene) -> Result<Aabb, BoundsError> {
    compute_bounds(&scene.meshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Vec3};

    fn unit_cube(name: &str) -> MeshInstance {
        MeshInstance::new(name, Aabb::from_min_max(Vec3::ZERO, Vec3::ONE))
    }

    #[test]
    fn test_empty_collection_has_no_geometry() {
        let meshes: Vec<MeshInstance> = Vec::new();
        assert_eq!(compute_bounds(&meshes), Err(BoundsError::NoGeometry));
    }

    #[test]
    fn test_meshes_without_vertices_are_skipped() {
        let meshes = vec![MeshInstance::new("empty", Aabb::INVALID)];
        assert_eq!(compute_bounds(&meshes), Err(BoundsError::NoGeometry));
    }

    #[test]
    fn test_disjoint_meshes_union() {
        let meshes = vec![
            unit_cube("a"),
            unit_cube("b").with_transform(Mat4::from_translation(Vec3::new(9.0, 0.0, 0.0))),
        ];
        let bounds = compute_bounds(&meshes).unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(10.0, 1.0, 1.0));
        assert_eq!(bounds.max_dimension(), 10.0);
        assert_eq!(bounds.center(), Vec3::new(5.0, 0.5, 0.5));
    }

    #[test]
    fn test_scaled_mesh() {
        let meshes = vec![unit_cube("a").with_transform(Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0)))];
        let bounds = compute_bounds(&meshes).unwrap();
        assert_eq!(bounds.dimensions(), Vec3::new(2.0, 3.0, 4.0));
    }
}
