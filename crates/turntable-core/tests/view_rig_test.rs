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

//! Integration tests for bounds, view rig and display override working together.

use approx::assert_relative_eq;
use turntable_core::display_mode::DisplayModeState;
use turntable_core::math::{Aabb, LinearRgba, Mat4, Vec3, MIN_FRAMING_EXTENT};
use turntable_core::renderer::MeshMaterialState;
use turntable_core::rig::{DisplayMode, Projection};
use turntable_core::scene::{Material, MeshInstance};
use turntable_core::{scene_bounds, DisplayModeController, Scene, ViewKind, ViewRig};

fn two_part_scene() -> Scene {
    let mut scene = Scene::new("table.glb");
    let wood = scene.add_material(Material::solid("wood", LinearRgba::rgb(0.4, 0.2, 0.1)));
    let cube = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
    scene.add_mesh(
        MeshInstance::new("top", cube)
            .with_transform(Mat4::from_scale(Vec3::new(10.0, 4.0, 1.0)))
            .with_materials(vec![wood]),
    );
    scene.add_mesh(
        MeshInstance::new("leg", cube)
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)))
            .with_materials(vec![wood]),
    );
    scene
}

#[test]
fn test_axis_distance_and_scale_follow_max_dimension() {
    let scene = two_part_scene();
    let bounds = scene_bounds(&scene).unwrap();
    assert_relative_eq!(bounds.max_dimension(), 10.0);

    let rig = ViewRig::from_bounds(bounds);
    for kind in [
        ViewKind::Front,
        ViewKind::Back,
        ViewKind::Left,
        ViewKind::Right,
        ViewKind::Top,
        ViewKind::Bottom,
    ] {
        let camera = rig.view(kind).camera.unwrap();
        assert_relative_eq!(
            camera.position.distance(bounds.center()),
            20.0,
            epsilon = 1e-4
        );
        match camera.projection {
            Projection::Orthographic { scale } => assert_relative_eq!(scale, 12.0, epsilon = 1e-5),
            other => panic!("{kind} should be orthographic, got {other:?}"),
        }
        assert_eq!(rig.view(kind).display_mode, DisplayMode::Normal);
    }
}

#[test]
fn test_bounds_center_is_midpoint() {
    let bounds = scene_bounds(&two_part_scene()).unwrap();
    assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -3.0));
    assert_eq!(bounds.max, Vec3::new(10.0, 4.0, 1.0));
    assert_eq!(bounds.center(), (bounds.min + bounds.max) * 0.5);
    let dims = bounds.dimensions();
    assert!(dims.x >= 0.0 && dims.y >= 0.0 && dims.z >= 0.0);
}

#[test]
fn test_flat_geometry_still_frames() {
    let mut scene = Scene::new("point.glb");
    scene.add_mesh(MeshInstance::new(
        "dot",
        Aabb::from_point(Vec3::new(1.0, 1.0, 1.0)),
    ));
    let rig = ViewRig::from_bounds(scene_bounds(&scene).unwrap());
    let front = rig.view(ViewKind::Front).camera.unwrap();
    assert_relative_eq!(front.position.y, 1.0 - 2.0 * MIN_FRAMING_EXTENT);
    assert!(front.position.x.is_finite());
}

#[test]
fn test_full_cycle_restores_scene() {
    let mut scene = two_part_scene();
    let before = scene.clone();
    let rig = ViewRig::from_bounds(scene_bounds(&scene).unwrap());
    let mut controller = DisplayModeController::new();

    let mut captured = Vec::new();
    for spec in rig.views {
        if spec.camera.is_none() {
            continue;
        }
        let state = match spec.display_mode {
            DisplayMode::SolidOverride => controller
                .with_override(&mut scene, MeshMaterialState::capture)
                .unwrap(),
            _ => MeshMaterialState::capture(&scene),
        };
        captured.push((spec.kind, state));
    }

    assert_eq!(controller.state(), DisplayModeState::Normal);
    assert_eq!(scene, before);
    assert_eq!(captured.len(), 7);
    let (_, iso) = captured
        .iter()
        .find(|(kind, _)| *kind == ViewKind::Isometric)
        .unwrap();
    assert!(iso.iter().all(|m| m.materials[0].name == "SolidMaterial"));
}

#[test]
fn test_rig_serializes_view_ids() {
    let rig = ViewRig::from_bounds(Aabb::from_min_max(Vec3::ZERO, Vec3::ONE));
    let json = serde_json::to_value(rig).unwrap();
    assert_eq!(json["views"][7]["kind"], "uv");
    assert_eq!(json["views"][6]["display_mode"], "solid_override");
    assert_eq!(json["lights"][0]["role"], "key");
}
