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

//! Temporarily replaces every material with a flat gray and restores it afterwards.
//!
//! The controller is a two-state machine:
//!
//! ```text
//! Normal --apply_override--> Override --restore--> Normal
//! ```
//!
//! Entering `Override` captures a [`DisplayModeSnapshot`]; leaving it reapplies that
//! snapshot verbatim, so the scene compares equal to its state before the cycle.

use std::fmt;
use std::ops::Deref;

use crate::math::LinearRgba;
use crate::scene::{DisplayType, Material, MaterialId, Scene};

/// Name of the material bound during the override.
pub const SOLID_MATERIAL_NAME: &str = "SolidMaterial";

/// An invalid transition or a scene that no longer matches its snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayModeError {
    /// `apply_override` was called while already overridden.
    AlreadyOverridden,
    /// `restore` was called without a prior override.
    NotOverridden,
    /// The scene changed shape between override and restore.
    SnapshotMismatch {
        /// Mesh count captured in the snapshot.
        expected_meshes: usize,
        /// Mesh count found on restore.
        found_meshes: usize,
        /// Material count captured in the snapshot.
        expected_materials: usize,
        /// Material count found on restore.
        found_materials: usize,
    },
}

impl fmt::Display for DisplayModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayModeError::AlreadyOverridden => {
                write!(f, "Display override is already active")
            }
            DisplayModeError::NotOverridden => {
                write!(f, "No display override to restore")
            }
            DisplayModeError::SnapshotMismatch {
                expected_meshes,
                found_meshes,
                expected_materials,
                found_materials,
            } => write!(
                f,
                "Scene no longer matches its display snapshot: expected {expected_meshes} mesh(es) \
                 and at least {expected_materials} material(s), found {found_meshes} and {found_materials}"
            ),
        }
    }
}

impl std::error::Error for DisplayModeError {}

/// The controller's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayModeState {
    /// The scene shows its own materials.
    Normal,
    /// Every mesh is bound to the solid material.
    Override,
}

/// One mesh's material binding and shading mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshDisplayState {
    /// The bound material slots.
    pub material_slots: Vec<MaterialId>,
    /// The shading mode.
    pub display_type: DisplayType,
}

/// Everything the override changes, captured beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayModeSnapshot {
    material_count: usize,
    meshes: Vec<MeshDisplayState>,
}

impl DisplayModeSnapshot {
    /// Captures the current material state of `scene`.
    pub fn capture(scene: &Scene) -> Self {
        Self {
            material_count: scene.materials.len(),
            meshes: scene
                .meshes
                .iter()
                .map(|mesh| MeshDisplayState {
                    material_slots: mesh.material_slots.clone(),
                    display_type: mesh.display_type,
                })
                .collect(),
        }
    }

    /// Material count at capture time.
    pub fn material_count(&self) -> usize {
        self.material_count
    }

    /// Per-mesh state at capture time.
    pub fn meshes(&self) -> &[MeshDisplayState] {
        &self.meshes
    }

    fn apply(self, scene: &mut Scene) -> Result<(), DisplayModeError> {
        if scene.meshes.len() != self.meshes.len() || scene.materials.len() < self.material_count
        {
            return Err(DisplayModeError::SnapshotMismatch {
                expected_meshes: self.meshes.len(),
                found_meshes: scene.meshes.len(),
                expected_materials: self.material_count,
                found_materials: scene.materials.len(),
            });
        }
        scene.materials.truncate(self.material_count);
        for (mesh, state) in scene.meshes.iter_mut().zip(self.meshes) {
            mesh.material_slots = state.material_slots;
            mesh.display_type = state.display_type;
        }
        Ok(())
    }
}

/// Applies and reverts the solid display override.
#[derive(Debug, Default)]
pub struct DisplayModeController {
    snapshot: Option<DisplayModeSnapshot>,
}

impl DisplayModeController {
    /// Creates a controller in the `Normal` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> DisplayModeState {
        if self.snapshot.is_some() {
            DisplayModeState::Override
        } else {
            DisplayModeState::Normal
        }
    }

    /// Binds a single neutral gray material to every mesh and switches them to solid shading.
    pub fn apply_override(&mut self, scene: &mut Scene) -> Result<(), DisplayModeError> {
        if self.snapshot.is_some() {
            return Err(DisplayModeError::AlreadyOverridden);
        }
        let snapshot = DisplayModeSnapshot::capture(scene);
        let solid = scene.add_material(Material::solid(
            SOLID_MATERIAL_NAME,
            LinearRgba::NEUTRAL_GRAY,
        ));
        for mesh in &mut scene.meshes {
            mesh.material_slots = vec![solid];
            mesh.display_type = DisplayType::Solid;
        }
        log::debug!(
            "Solid override applied to {} mesh(es)",
            snapshot.meshes.len()
        );
        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Reapplies the snapshot taken by [`apply_override`](Self::apply_override).
    ///
    /// On a mismatch the controller stays in `Override` so the caller can inspect it.
    pub fn restore(&mut self, scene: &mut Scene) -> Result<(), DisplayModeError> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or(DisplayModeError::NotOverridden)?
            .clone();
        snapshot.apply(scene)?;
        self.snapshot = None;
        log::debug!("Display state restored");
        Ok(())
    }

    /// Enters the override and returns a guard that restores on drop.
    pub fn scoped<'a>(
        &'a mut self,
        scene: &'a mut Scene,
    ) -> Result<OverrideGuard<'a>, DisplayModeError> {
        self.apply_override(scene)?;
        Ok(OverrideGuard {
            controller: self,
            scene,
        })
    }

    /// Runs `f` against the overridden scene, then restores it.
    pub fn with_override<R>(
        &mut self,
        scene: &mut Scene,
        f: impl FnOnce(&Scene) -> R,
    ) -> Result<R, DisplayModeError> {
        let guard = self.scoped(scene)?;
        let result = f(&guard);
        guard.finish()?;
        Ok(result)
    }
}

/// Keeps a scene in the override state until dropped or [`finish`](Self::finish)ed.
#[derive(Debug)]
pub struct OverrideGuard<'a> {
    controller: &'a mut DisplayModeController,
    scene: &'a mut Scene,
}

impl OverrideGuard<'_> {
    /// Restores the scene and reports any error.
    pub fn finish(self) -> Result<(), DisplayModeError> {
        let mut this = std::mem::ManuallyDrop::new(self);
        let OverrideGuard { controller, scene } = &mut *this;
        controller.restore(scene)
    }
}

impl Deref for OverrideGuard<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &*self.scene
    }
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.controller.restore(self.scene) {
            log::error!("Failed to restore display state: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Aabb, Vec3};
    use crate::scene::MeshInstance;

    fn textured_scene() -> Scene {
        let mut scene = Scene::new("chair.glb");
        let wood = scene.add_material(Material::solid("wood", LinearRgba::rgb(0.5, 0.3, 0.1)));
        let metal = scene.add_material(Material::solid("metal", LinearRgba::rgb(0.7, 0.7, 0.7)));
        let bounds = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        scene.add_mesh(MeshInstance::new("seat", bounds).with_materials(vec![wood, metal]));
        scene.add_mesh(MeshInstance::new("legs", bounds).with_materials(vec![metal]));
        scene.add_mesh(MeshInstance::new("untextured", bounds));
        scene
    }

    #[test]
    fn test_override_binds_single_gray_material() {
        let mut scene = textured_scene();
        let mut controller = DisplayModeController::new();
        controller.apply_override(&mut scene).unwrap();

        assert_eq!(controller.state(), DisplayModeState::Override);
        assert_eq!(scene.materials.len(), 3);
        let solid = &scene.materials[2];
        assert_eq!(solid.name, SOLID_MATERIAL_NAME);
        assert_eq!(solid.base_color, LinearRgba::NEUTRAL_GRAY);
        assert!(!solid.is_textured());
        for mesh in &scene.meshes {
            assert_eq!(mesh.material_slots, vec![2]);
            assert_eq!(mesh.display_type, DisplayType::Solid);
        }
    }

    #[test]
    fn test_restore_returns_exact_prior_state() {
        let mut scene = textured_scene();
        let before = scene.clone();
        let mut controller = DisplayModeController::new();

        controller.apply_override(&mut scene).unwrap();
        controller.restore(&mut scene).unwrap();

        assert_eq!(scene, before);
        assert_eq!(controller.state(), DisplayModeState::Normal);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut scene = textured_scene();
        let mut controller = DisplayModeController::new();
        assert_eq!(
            controller.restore(&mut scene),
            Err(DisplayModeError::NotOverridden)
        );

        controller.apply_override(&mut scene).unwrap();
        assert_eq!(
            controller.apply_override(&mut scene),
            Err(DisplayModeError::AlreadyOverridden)
        );
    }

    #[test]
    fn test_mismatch_keeps_override_state() {
        let mut scene = textured_scene();
        let mut controller = DisplayModeController::new();
        controller.apply_override(&mut scene).unwrap();
        scene.meshes.pop();

        assert!(matches!(
            controller.restore(&mut scene),
            Err(DisplayModeError::SnapshotMismatch {
                expected_meshes: 3,
                found_meshes: 2,
                ..
            })
        ));
        assert_eq!(controller.state(), DisplayModeState::Override);
    }

    #[test]
    fn test_guard_restores_on_early_drop() {
        let mut scene = textured_scene();
        let before = scene.clone();
        let mut controller = DisplayModeController::new();
        {
            let guard = controller.scoped(&mut scene).unwrap();
            assert_eq!(guard.meshes[0].display_type, DisplayType::Solid);
        }
        assert_eq!(controller.state(), DisplayModeState::Normal);
        assert_eq!(scene, before);
    }

    #[test]
    fn test_with_override_sees_solid_scene() {
        let mut scene = textured_scene();
        let mut controller = DisplayModeController::new();
        let solid_meshes = controller
            .with_override(&mut scene, |s| {
                s.meshes
                    .iter()
                    .filter(|m| m.display_type == DisplayType::Solid)
                    .count()
            })
            .unwrap();
        assert_eq!(solid_meshes, 3);
        assert_eq!(scene.materials.len(), 2);
    }
}
