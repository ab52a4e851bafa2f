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

//! The closed set of views and the camera placed for each of them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math::{degrees_to_radians, Aabb, Mat4, Quaternion, Vec3, EPSILON};

/// Camera distance from the box center along each axis, in multiples of the framing extent.
pub const AXIS_DISTANCE_FACTOR: f32 = 2.0;
/// Orthographic scale of the axis views, in multiples of the framing extent.
pub const ORTHO_SCALE_FACTOR: f32 = 1.2;
/// Isometric camera offset from the box center, in multiples of the framing extent.
pub const ISOMETRIC_OFFSET: Vec3 = Vec3::new(1.5, -1.5, 1.5);
/// Focal length of the isometric camera.
pub const ISOMETRIC_LENS_MM: f32 = 50.0;
/// Sensor width shared by perspective cameras.
pub const SENSOR_WIDTH_MM: f32 = 36.0;

/// One of the eight panels of a turntable sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Camera on the −Y side.
    Front,
    /// Camera on the −X side.
    Left,
    /// Camera on the +Y side.
    Back,
    /// Camera on the +X side.
    Right,
    /// Camera above.
    Top,
    /// Camera below.
    Bottom,
    /// Perspective three-quarter view with the solid override.
    Isometric,
    /// The texture or UV layout of the model. Not a camera view.
    #[serde(rename = "uv")]
    UvLayout,
}

impl ViewKind {
    /// Every view in canonical render order.
    pub const ALL: [ViewKind; 8] = [
        ViewKind::Front,
        ViewKind::Left,
        ViewKind::Back,
        ViewKind::Right,
        ViewKind::Top,
        ViewKind::Bottom,
        ViewKind::Isometric,
        ViewKind::UvLayout,
    ];

    /// Every view in sheet order: row-major over a 4×2 grid.
    pub const COMPOSITE_ORDER: [ViewKind; 8] = [
        ViewKind::Front,
        ViewKind::Left,
        ViewKind::Back,
        ViewKind::Isometric,
        ViewKind::Top,
        ViewKind::Bottom,
        ViewKind::Right,
        ViewKind::UvLayout,
    ];

    /// The short ASCII identifier, as used on the command line and in job files.
    pub fn id(self) -> &'static str {
        match self {
            ViewKind::Front => "front",
            ViewKind::Left => "left",
            ViewKind::Back => "back",
            ViewKind::Right => "right",
            ViewKind::Top => "top",
            ViewKind::Bottom => "bottom",
            ViewKind::Isometric => "isometric",
            ViewKind::UvLayout => "uv",
        }
    }

    /// The label used in intermediate file names and on the sheet.
    pub fn label(self) -> &'static str {
        match self {
            ViewKind::Front => "正面",
            ViewKind::Left => "左视图",
            ViewKind::Back => "背面",
            ViewKind::Right => "右视图",
            ViewKind::Top => "俯视图",
            ViewKind::Bottom => "底视图",
            ViewKind::Isometric => "等轴测无材质",
            ViewKind::UvLayout => "UV贴图",
        }
    }

    /// An ASCII caption for faces that cannot draw [`ViewKind::label`].
    pub fn caption(self) -> &'static str {
        match self {
            ViewKind::Front => "Front",
            ViewKind::Left => "Left",
            ViewKind::Back => "Back",
            ViewKind::Right => "Right",
            ViewKind::Top => "Top",
            ViewKind::Bottom => "Bottom",
            ViewKind::Isometric => "Isometric (solid)",
            ViewKind::UvLayout => "UV Layout",
        }
    }

    /// The intermediate raster name for this view: `{model}_{label}.png`.
    pub fn file_name(self, model_name: &str) -> String {
        format!("{}_{}.png", model_name, self.label())
    }

    /// Returns `true` for views that place a camera.
    pub fn has_camera(self) -> bool {
        !matches!(self, ViewKind::UvLayout)
    }

    /// Parses an identifier, a label or a caption.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::UnsupportedView`] if `name` matches none of the eight views.
    pub fn from_name(name: &str) -> Result<Self, ViewError> {
        let trimmed = name.trim();
        ViewKind::ALL
            .into_iter()
            .find(|kind| {
                kind.id().eq_ignore_ascii_case(trimmed)
                    || kind.label() == trimmed
                    || kind.caption().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ViewError::UnsupportedView(name.to_owned()))
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ViewKind {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// An error raised when resolving a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The name does not identify one of the eight views.
    UnsupportedView(String),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::UnsupportedView(name) => write!(f, "Unsupported view '{name}'"),
        }
    }
}

impl std::error::Error for ViewError {}

/// Rendered rasters keyed by view.
pub type RenderedViews = BTreeMap<ViewKind, PathBuf>;

/// Camera projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Parallel projection covering `scale` world units across the frame.
    Orthographic {
        /// Width of the view volume in world units.
        scale: f32,
    },
    /// Pinhole projection described by a physical lens.
    Perspective {
        /// Focal length in millimetres.
        lens_mm: f32,
        /// Sensor width in millimetres.
        sensor_width_mm: f32,
    },
}

impl Projection {
    /// Horizontal field of view in radians, for perspective projections.
    pub fn horizontal_fov(&self) -> Option<f32> {
        match *self {
            Projection::Orthographic { .. } => None,
            Projection::Perspective {
                lens_mm,
                sensor_width_mm,
            } => Some(2.0 * (sensor_width_mm / (2.0 * lens_mm)).atan()),
        }
    }
}

/// What the renderer should do with materials for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// The asset's own materials.
    Normal,
    /// A flat gray material on every mesh.
    SolidOverride,
    /// No render; the texture or a synthesized UV layout is written instead.
    TextureExtraction,
}

/// A camera placed against a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    /// World-space position.
    pub position: Vec3,
    /// Orientation. The camera looks down its local −Z with local +Y up.
    pub rotation: Quaternion,
    /// The same orientation as XYZ Euler angles in radians.
    pub euler_xyz: Vec3,
    /// The point the camera is aimed at.
    pub target: Vec3,
    /// Projection parameters.
    pub projection: Projection,
}

impl CameraRig {
    /// The world-space viewing direction.
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// The world-space up direction of the image.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// Everything needed to produce one panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    /// Which panel this is.
    pub kind: ViewKind,
    /// The camera, absent for the UV layout.
    pub camera: Option<CameraRig>,
    /// Material handling for the panel.
    pub display_mode: DisplayMode,
}

/// Places the camera for a single view.
pub fn derive_view(kind: ViewKind, bounds: &Aabb) -> ViewSpec {
    let center = bounds.center();
    let d = bounds.framing_extent();

    let axis = |offset: Vec3, euler_deg: [f32; 3]| {
        let euler = Vec3::new(
            degrees_to_radians(euler_deg[0]),
            degrees_to_radians(euler_deg[1]),
            degrees_to_radians(euler_deg[2]),
        );
        Some(CameraRig {
            position: center + offset * (AXIS_DISTANCE_FACTOR * d),
            rotation: Quaternion::from_euler_xyz(euler.x, euler.y, euler.z),
            euler_xyz: euler,
            target: center,
            projection: Projection::Orthographic {
                scale: ORTHO_SCALE_FACTOR * d,
            },
        })
    };

    let (camera, display_mode) = match kind {
        ViewKind::Front => (axis(-Vec3::Y, [90.0, 0.0, 0.0]), DisplayMode::Normal),
        ViewKind::Back => (axis(Vec3::Y, [90.0, 0.0, 180.0]), DisplayMode::Normal),
        ViewKind::Left => (axis(-Vec3::X, [90.0, 0.0, 270.0]), DisplayMode::Normal),
        ViewKind::Right => (axis(Vec3::X, [90.0, 0.0, 90.0]), DisplayMode::Normal),
        ViewKind::Top => (axis(Vec3::Z, [0.0, 0.0, 0.0]), DisplayMode::Normal),
        ViewKind::Bottom => (axis(-Vec3::Z, [180.0, 0.0, 0.0]), DisplayMode::Normal),
        ViewKind::Isometric => {
            let position = center + ISOMETRIC_OFFSET * d;
            let rotation = look_at(position, center);
            let camera = CameraRig {
                position,
                rotation,
                euler_xyz: rotation.to_euler_xyz(),
                target: center,
                projection: Projection::Perspective {
                    lens_mm: ISOMETRIC_LENS_MM,
                    sensor_width_mm: SENSOR_WIDTH_MM,
                },
            };
            (Some(camera), DisplayMode::SolidOverride)
        }
        ViewKind::UvLayout => (None, DisplayMode::TextureExtraction),
    };

    ViewSpec {
        kind,
        camera,
        display_mode,
    }
}

/// Places every view against `bounds`, in [`ViewKind::ALL`] order.
pub fn derive_views(bounds: &Aabb) -> [ViewSpec; 8] {
    ViewKind::ALL.map(|kind| derive_view(kind, bounds))
}

/// Orientation for a camera at `eye` looking at `target`, keeping world +Z up in the image.
///
/// Falls back to world +Y as the up hint when looking straight along Z.
pub fn look_at(eye: Vec3, target: Vec3) -> Quaternion {
    let back = (eye - target).normalize();
    let mut right = Vec3::Z.cross(back);
    if right.length_squared() < EPSILON {
        right = Vec3::Y.cross(back);
    }
    let right = right.normalize();
    let up = back.cross(right);
    Quaternion::from_rotation_matrix(&Mat4::from_basis(right, up, back))
}
