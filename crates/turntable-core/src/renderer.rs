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

//! The contract between the pipeline and whatever produces the rasters.
//!
//! A [`RenderJob`] is a self-contained description of every camera view of one asset:
//! the lights, the environment, and for each pass the camera and the exact material
//! binding of every mesh at the moment the pass was planned. Backends never see the
//! [`Scene`] itself, so the solid override is carried as data rather than as shared state.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::math::LinearRgba;
use crate::rig::{CameraRig, DisplayMode, Environment, LightSpec, ViewKind};
use crate::scene::{DisplayType, Scene};

/// Engine and output settings shared by every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Engine identifier understood by the backend.
    pub engine: String,
    /// Compute device hint.
    pub device: String,
    /// Samples per pixel.
    pub samples: u32,
    /// Whether to run the denoiser.
    pub denoise: bool,
    /// Render the background as transparent.
    pub transparent_film: bool,
    /// Square output edge length in pixels.
    pub resolution: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            engine: "CYCLES".to_owned(),
            device: "GPU".to_owned(),
            samples: 64,
            denoise: true,
            transparent_film: true,
            resolution: 1000,
        }
    }
}

/// A material as the backend should build it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialBinding {
    /// Material name, matching the asset's material where it came from the asset.
    pub name: String,
    /// Linear base color factor.
    pub base_color: LinearRgba,
    /// Whether the asset's base color texture should be sampled.
    pub textured: bool,
}

/// The material state of one mesh for one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshMaterialState {
    /// Mesh name.
    pub mesh: String,
    /// Shading mode.
    pub display_type: DisplayType,
    /// Materials in slot order.
    pub materials: Vec<MaterialBinding>,
}

impl MeshMaterialState {
    /// Captures the material state of every mesh in `scene`.
    ///
    /// Slots that point outside the material table are skipped.
    pub fn capture(scene: &Scene) -> Vec<Self> {
        scene
            .meshes
            .iter()
            .map(|mesh| MeshMaterialState {
                mesh: mesh.name.clone(),
                display_type: mesh.display_type,
                materials: mesh
                    .material_slots
                    .iter()
                    .filter_map(|&id| scene.material(id))
                    .map(|m| MaterialBinding {
                        name: m.name.clone(),
                        base_color: m.base_color,
                        textured: m.is_textured(),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// One camera view to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPass {
    /// The view being rendered.
    pub view: ViewKind,
    /// Camera placement and projection.
    pub camera: CameraRig,
    /// Material handling requested for the view.
    pub display_mode: DisplayMode,
    /// Material state of every mesh for this pass.
    pub meshes: Vec<MeshMaterialState>,
    /// Where the raster must be written.
    pub output: PathBuf,
}

/// All passes for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    /// The model file the backend should load.
    pub model: PathBuf,
    /// Engine and output settings.
    pub settings: RenderSettings,
    /// World background.
    pub environment: Environment,
    /// The light rig.
    pub lights: Vec<LightSpec>,
    /// Camera passes, in render order.
    pub passes: Vec<RenderPass>,
}

impl RenderJob {
    /// Views whose output does not exist on disk, in sheet order.
    pub fn missing_views(&self) -> Vec<ViewKind> {
        ViewKind::COMPOSITE_ORDER
            .into_iter()
            .filter(|kind| {
                self.passes
                    .iter()
                    .any(|p| p.view == *kind && !p.output.is_file())
            })
            .collect()
    }
}

/// An error reported by a render backend.
#[derive(Debug)]
pub enum RenderError {
    /// The renderer program could not be located.
    NotFound {
        /// The program that was searched for.
        program: String,
    },
    /// The renderer could not be started.
    SpawnFailed {
        /// The program that failed to start.
        program: String,
        /// The underlying OS error.
        details: String,
    },
    /// The renderer exited unsuccessfully.
    NonZeroExit {
        /// Exit code, absent if the process was killed by a signal.
        code: Option<i32>,
        /// Tail of the renderer's standard error.
        stderr: String,
    },
    /// The renderer did not finish in time and was killed.
    Timeout {
        /// The limit that was exceeded, in seconds.
        seconds: u64,
    },
    /// The run was cancelled and the renderer was killed.
    Cancelled,
    /// The renderer exited successfully but these views have no raster.
    MissingOutputs(Vec<ViewKind>),
    /// The job could not be prepared or handed over.
    Job(String),
    /// An I/O error while supervising the renderer.
    Io(std::io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotFound { program } => {
                write!(f, "Renderer '{program}' was not found")
            }
            RenderError::SpawnFailed { program, details } => {
                write!(f, "Failed to start renderer '{program}': {details}")
            }
            RenderError::NonZeroExit { code, stderr } => match code {
                Some(code) => write!(f, "Renderer exited with code {code}: {stderr}"),
                None => write!(f, "Renderer was terminated by a signal: {stderr}"),
            },
            RenderError::Timeout { seconds } => {
                write!(f, "Renderer timed out after {seconds}s")
            }
            RenderError::Cancelled => write!(f, "Render cancelled"),
            RenderError::MissingOutputs(views) => {
                let ids: Vec<&str> = views.iter().map(|v| v.id()).collect();
                write!(f, "Renderer produced no raster for: {}", ids.join(", "))
            }
            RenderError::Job(msg) => write!(f, "Invalid render job: {msg}"),
            RenderError::Io(err) => write!(f, "Renderer I/O error: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

/// Produces the rasters described by a [`RenderJob`].
///
/// On success every [`RenderPass::output`] must exist.
pub trait RenderBackend: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &str;

    /// Renders every pass of `job`.
    fn render(&self, job: &RenderJob) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_mode::DisplayModeController;
    use crate::math::{Aabb, Vec3};
    use crate::scene::{Material, MeshInstance};

    #[test]
    fn test_capture_reflects_override() {
        let mut scene = Scene::new("lamp.glb");
        let brass = scene.add_material(Material {
            name: "brass".into(),
            base_color: LinearRgba::rgb(0.9, 0.6, 0.2),
            base_color_texture: Some(0),
        });
        scene.add_mesh(
            MeshInstance::new("body", Aabb::from_min_max(Vec3::ZERO, Vec3::ONE))
                .with_materials(vec![brass, 99]),
        );

        let normal = MeshMaterialState::capture(&scene);
        assert_eq!(normal[0].materials.len(), 1);
        assert!(normal[0].materials[0].textured);

        let solid = DisplayModeController::new()
            .with_override(&mut scene, MeshMaterialState::capture)
            .unwrap();
        assert_eq!(solid[0].display_type, DisplayType::Solid);
        assert_eq!(solid[0].materials[0].base_color, LinearRgba::NEUTRAL_GRAY);
        assert!(!solid[0].materials[0].textured);
    }

    #[test]
    fn test_render_error_messages() {
        let err = RenderError::NonZeroExit {
            code: Some(2),
            stderr: "boom".into(),
        };
        assert_eq!(err.to_string(), "Renderer exited with code 2: boom");
        assert_eq!(
            RenderError::Timeout { seconds: 5 }.to_string(),
            "Renderer timed out after 5s"
        );
        assert_eq!(
            RenderError::MissingOutputs(vec![ViewKind::Front, ViewKind::Isometric]).to_string(),
            "Renderer produced no raster for: front, isometric"
        );
    }
}
