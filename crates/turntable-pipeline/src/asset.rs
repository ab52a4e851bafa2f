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

//! The per-asset pipeline: normalize, import, frame, render, compose, clean up.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use turntable_compositor::{CompositeError, Compositor};
use turntable_core::math::Aabb;
use turntable_core::renderer::{MeshMaterialState, RenderPass};
use turntable_core::rig::{DisplayMode, Environment, RenderedViews};
use turntable_core::{
    composite_file_name, scene_bounds, DisplayModeController, RenderBackend, RenderError,
    RenderJob, RenderSettings, Scene, ViewKind, ViewRig,
};
use turntable_io::{convert_obj_to_glb, write_uv_layout, AssetFormat, GltfImporter};
use turntable_io::{ObjConverter, UvLayoutSource};

use crate::config::TurntableConfig;
use crate::error::PipelineError;

/// Options shared by every asset of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Square size of each view.
    pub resolution: u32,
    /// Keep per-view rasters after a successful composite.
    pub keep_intermediate: bool,
    /// Delete per-view rasters after a failure too.
    pub cleanup_on_failure: bool,
    /// Where per-view rasters go. `None` means next to the model.
    pub render_dir: Option<PathBuf>,
    /// Render preset sent to the backend.
    pub settings: RenderSettings,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&TurntableConfig::default())
    }
}

impl From<&TurntableConfig> for PipelineOptions {
    fn from(config: &TurntableConfig) -> Self {
        Self {
            resolution: config.resolution,
            keep_intermediate: config.keep_intermediate,
            cleanup_on_failure: config.cleanup_on_failure,
            render_dir: config.render_dir.clone(),
            settings: config.render_settings(),
        }
    }
}

/// One model to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    /// The `.glb`, `.gltf` or `.obj` file.
    pub model: PathBuf,
    /// Directory for the composite when `composite` is unset. Defaults to the model's.
    pub output_dir: Option<PathBuf>,
    /// Exact composite path.
    pub composite: Option<PathBuf>,
}

impl AssetRequest {
    /// A request with default output locations.
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            output_dir: None,
            composite: None,
        }
    }

    /// Writes the composite into `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Writes the composite to exactly `path`.
    pub fn with_composite(mut self, path: impl Into<PathBuf>) -> Self {
        self.composite = Some(path.into());
        self
    }
}

/// Where one asset's files will go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    /// The file stem, used for titles and intermediate names.
    pub model_name: String,
    /// The composite JPEG.
    pub composite: PathBuf,
    /// The directory for per-view rasters.
    pub render_dir: PathBuf,
}

impl AssetPaths {
    /// The eight per-view raster paths, in [`ViewKind::ALL`] order.
    pub fn intermediates(&self) -> Vec<PathBuf> {
        ViewKind::ALL
            .iter()
            .map(|kind| self.view_path(*kind))
            .collect()
    }

    /// The raster path for `kind`.
    pub fn view_path(&self, kind: ViewKind) -> PathBuf {
        self.render_dir.join(kind.file_name(&self.model_name))
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetReport {
    /// The input model.
    pub model: PathBuf,
    /// The written composite.
    pub composite: PathBuf,
    /// World-space bounds the rig was framed on.
    pub bounds: Aabb,
    /// How the UV panel was produced.
    pub uv_source: UvLayoutSource,
}

/// Runs the full per-asset pipeline against a render backend and a compositor.
pub struct AssetPipeline {
    options: PipelineOptions,
    renderer: Arc<dyn RenderBackend>,
    converter: Arc<dyn ObjConverter>,
    compositor: Compositor,
    cancel: Arc<AtomicBool>,
}

impl AssetPipeline {
    /// Creates a pipeline.
    pub fn new(
        options: PipelineOptions,
        renderer: Arc<dyn RenderBackend>,
        converter: Arc<dyn ObjConverter>,
        compositor: Compositor,
    ) -> Self {
        Self {
            options,
            renderer,
            converter,
            compositor,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares `flag` as the cancel signal. Pass the same flag to the backend so running
    /// renders are killed too.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// The cancel signal.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// The options this pipeline runs with.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Resolves the output locations for `request` without touching the disk.
    pub fn plan_paths(&self, request: &AssetRequest) -> Result<AssetPaths, PipelineError> {
        let model = &request.model;
        let model_name = model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PipelineError::UnsupportedFormat(model.clone()))?;
        let model_dir = parent_dir(model);

        let composite = match (&request.composite, &request.output_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join(composite_file_name(&model_name)),
            (None, None) => model_dir.join(composite_file_name(&model_name)),
        };
        let render_dir = self.options.render_dir.clone().unwrap_or(model_dir);

        Ok(AssetPaths {
            model_name,
            composite,
            render_dir,
        })
    }

    /// Processes one model end to end.
    ///
    /// On success only the composite remains, unless intermediates are kept. On
    /// failure no composite is written.
    pub fn run(&self, request: &AssetRequest) -> Result<AssetReport, PipelineError> {
        let started = Instant::now();
        let model = &request.model;
        let format = AssetFormat::from_path(model)
            .ok_or_else(|| PipelineError::UnsupportedFormat(model.clone()))?;
        if !model.is_file() {
            return Err(PipelineError::InputNotFound(model.clone()));
        }
        let paths = self.plan_paths(request)?;
        self.check_cancelled()?;

        // Holds the converted GLB until the render has read it.
        let mut scratch = None;
        let scene_path = if format.is_native() {
            model.clone()
        } else {
            let dir = tempfile::Builder::new().prefix("turntable-").tempdir()?;
            let glb = dir.path().join(format!("{}.glb", paths.model_name));
            convert_obj_to_glb(self.converter.as_ref(), model, Some(glb.as_path()))?;
            scratch = Some(dir);
            glb
        };

        let mut scene = GltfImporter::import_file(&scene_path)?;
        let bounds = scene_bounds(&scene)?;
        log::info!(
            "'{}' bounds {:?} to {:?} (extent {:.4})",
            paths.model_name,
            bounds.min,
            bounds.max,
            bounds.framing_extent()
        );
        let rig = ViewRig::from_bounds(bounds);
        let job = plan_render_job(
            &mut scene,
            &rig,
            &scene_path,
            &paths,
            &self.options.settings,
        )?;

        std::fs::create_dir_all(&paths.render_dir)?;
        let result = self.render_and_compose(&scene, &job, &paths);
        drop(scratch);

        let keep = match &result {
            Ok(_) => self.options.keep_intermediate,
            Err(_) => !self.options.cleanup_on_failure,
        };
        if keep {
            log::debug!("Keeping intermediates in '{}'", paths.render_dir.display());
        } else {
            remove_intermediates(&paths);
        }

        let uv_source = result?;
        log::info!(
            "Finished '{}' in {:.2}s -> '{}'",
            paths.model_name,
            started.elapsed().as_secs_f64(),
            paths.composite.display()
        );
        Ok(AssetReport {
            model: model.clone(),
            composite: paths.composite,
            bounds,
            uv_source,
        })
    }

    fn render_and_compose(
        &self,
        scene: &Scene,
        job: &RenderJob,
        paths: &AssetPaths,
    ) -> Result<UvLayoutSource, PipelineError> {
        self.check_cancelled()?;
        // Leftovers from an earlier failed run must not pass for this run's output.
        clear_stale_intermediates(paths)?;
        match self.renderer.render(job) {
            Ok(()) => {}
            Err(RenderError::MissingOutputs(views)) => {
                return Err(CompositeError::MissingView(views).into());
            }
            Err(e) => return Err(e.into()),
        }
        self.check_cancelled()?;

        let mut views = RenderedViews::new();
        for pass in &job.passes {
            if pass.output.is_file() {
                views.insert(pass.view, pass.output.clone());
            } else {
                log::warn!("No raster for the {} view at '{}'", pass.view, pass.output.display());
            }
        }

        let uv_path = paths.view_path(ViewKind::UvLayout);
        let uv_source = match write_uv_layout(scene, &uv_path, self.options.resolution) {
            Ok(source) => {
                views.insert(ViewKind::UvLayout, uv_path);
                source
            }
            Err(e) => {
                log::warn!("UV panel for '{}' failed: {e}", paths.model_name);
                UvLayoutSource::Placeholder
            }
        };

        if let Some(parent) = paths.composite.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.compositor
            .compose(&views, &paths.model_name, &paths.composite)?;
        Ok(uv_source)
    }

    fn check_cancelled(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Builds one render pass per camera view.
///
/// The isometric pass records the scene as seen under the solid override; the scene is
/// restored before the next pass is planned, so axis views always see the original
/// materials.
pub fn plan_render_job(
    scene: &mut Scene,
    rig: &ViewRig,
    model: &Path,
    paths: &AssetPaths,
    settings: &RenderSettings,
) -> Result<RenderJob, PipelineError> {
    let mut controller = DisplayModeController::new();
    let mut passes = Vec::with_capacity(ViewKind::ALL.len());

    for spec in &rig.views {
        let Some(camera) = spec.camera else {
            continue;
        };
        let meshes = match spec.display_mode {
            DisplayMode::SolidOverride => {
                controller.with_override(scene, MeshMaterialState::capture)?
            }
            DisplayMode::Normal | DisplayMode::TextureExtraction => {
                MeshMaterialState::capture(scene)
            }
        };
        passes.push(RenderPass {
            view: spec.kind,
            camera,
            display_mode: spec.display_mode,
            meshes,
            output: paths.view_path(spec.kind),
        });
    }

    Ok(RenderJob {
        model: model.to_path_buf(),
        settings: settings.clone(),
        environment: Environment::default(),
        lights: rig.lights.to_vec(),
        passes,
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn clear_stale_intermediates(paths: &AssetPaths) -> Result<(), PipelineError> {
    for path in paths.intermediates() {
        match std::fs::remove_file(&path) {
            Ok(()) => log::debug!("Removed stale '{}'", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn remove_intermediates(paths: &AssetPaths) {
    for path in paths.intermediates() {
        if !path.exists() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => log::debug!("Removed '{}'", path.display()),
            Err(e) => log::warn!("Could not remove '{}': {e}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turntable_compositor::{BitmapFace, LayoutOptions};
    use turntable_core::math::{Mat4, Vec3};
    use turntable_core::scene::{DisplayType, Material, MeshInstance};
    use turntable_core::display_mode::SOLID_MATERIAL_NAME;
    use turntable_core::math::LinearRgba;
    use turntable_io::BlenderObjConverter;

    struct NullRenderer;

    impl RenderBackend for NullRenderer {
        fn name(&self) -> &str {
            "null"
        }

        fn render(&self, _job: &RenderJob) -> Result<(), turntable_core::RenderError> {
            Ok(())
        }
    }

    fn pipeline(options: PipelineOptions) -> AssetPipeline {
        AssetPipeline::new(
            options,
            Arc::new(NullRenderer),
            Arc::new(BlenderObjConverter::default()),
            Compositor::with_face(LayoutOptions::default(), Box::new(BitmapFace)),
        )
    }

    fn textured_scene() -> Scene {
        let mut scene = Scene::new("chair.glb");
        let wood = scene.add_material(Material {
            name: "wood".into(),
            base_color: LinearRgba::rgb(0.5, 0.3, 0.1),
            base_color_texture: Some(0),
        });
        scene.add_mesh(
            MeshInstance::new("seat", Aabb::from_min_max(Vec3::ZERO, Vec3::ONE))
                .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0)))
                .with_materials(vec![wood]),
        );
        scene
    }

    #[test]
    fn test_default_paths_sit_next_to_the_model() {
        let paths = pipeline(PipelineOptions::default())
            .plan_paths(&AssetRequest::new("assets/chair.glb"))
            .unwrap();
        assert_eq!(paths.model_name, "chair");
        assert_eq!(paths.composite, PathBuf::from("assets/chair_eight_views.jpg"));
        assert_eq!(paths.render_dir, PathBuf::from("assets"));
        assert_eq!(
            paths.view_path(ViewKind::Front),
            PathBuf::from("assets/chair_正面.png")
        );
        assert_eq!(paths.intermediates().len(), 8);
    }

    #[test]
    fn test_output_dir_and_render_dir_are_honoured() {
        let options = PipelineOptions {
            render_dir: Some(PathBuf::from("/tmp/renders")),
            ..PipelineOptions::default()
        };
        let p = pipeline(options);
        let paths = p
            .plan_paths(&AssetRequest::new("chair.obj").with_output_dir("out"))
            .unwrap();
        assert_eq!(paths.composite, PathBuf::from("out/chair_eight_views.jpg"));
        assert_eq!(paths.render_dir, PathBuf::from("/tmp/renders"));

        let exact = p
            .plan_paths(&AssetRequest::new("chair.obj").with_composite("sheet.jpg"))
            .unwrap();
        assert_eq!(exact.composite, PathBuf::from("sheet.jpg"));
    }

    #[test]
    fn test_job_overrides_only_the_isometric_pass() {
        let mut scene = textured_scene();
        let before = scene.clone();
        let rig = ViewRig::from_bounds(scene_bounds(&scene).unwrap());
        let paths = pipeline(PipelineOptions::default())
            .plan_paths(&AssetRequest::new("chair.glb"))
            .unwrap();

        let job = plan_render_job(
            &mut scene,
            &rig,
            Path::new("chair.glb"),
            &paths,
            &RenderSettings::default(),
        )
        .unwrap();

        assert_eq!(scene, before);
        assert_eq!(job.passes.len(), 7);
        assert_eq!(job.lights.len(), 4);
        for pass in &job.passes {
            let mesh = &pass.meshes[0];
            if pass.view == ViewKind::Isometric {
                assert_eq!(pass.display_mode, DisplayMode::SolidOverride);
                assert_eq!(mesh.display_type, DisplayType::Solid);
                assert_eq!(mesh.materials[0].name, SOLID_MATERIAL_NAME);
            } else {
                assert_eq!(mesh.display_type, DisplayType::Textured);
                assert_eq!(mesh.materials[0].name, "wood");
            }
        }
    }

    #[test]
    fn test_slotless_mesh_still_gets_the_solid_material() {
        let mut scene = Scene::new("rock.glb");
        scene.add_mesh(MeshInstance::new(
            "rock",
            Aabb::from_min_max(Vec3::ZERO, Vec3::ONE),
        ));
        let before = scene.clone();
        let rig = ViewRig::from_bounds(scene_bounds(&scene).unwrap());
        let paths = pipeline(PipelineOptions::default())
            .plan_paths(&AssetRequest::new("rock.glb"))
            .unwrap();

        let job = plan_render_job(
            &mut scene,
            &rig,
            Path::new("rock.glb"),
            &paths,
            &RenderSettings::default(),
        )
        .unwrap();

        assert_eq!(scene, before);
        for pass in &job.passes {
            let materials = &pass.meshes[0].materials;
            if pass.view == ViewKind::Isometric {
                assert_eq!(materials.len(), 1);
                assert_eq!(materials[0].name, SOLID_MATERIAL_NAME);
                assert_eq!(materials[0].base_color, LinearRgba::NEUTRAL_GRAY);
            } else {
                assert!(materials.is_empty(), "{}", pass.view);
            }
        }
        // The Blender side appends the binding when the object has no slots.
        assert!(crate::config::RENDER_SCRIPT.contains("obj.data.materials.append(material)"));
    }

    #[test]
    fn test_unsupported_and_missing_inputs() {
        let p = pipeline(PipelineOptions::default());
        assert!(matches!(
            p.run(&AssetRequest::new("model.fbx")),
            Err(PipelineError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            p.run(&AssetRequest::new("/nonexistent/model.glb")),
            Err(PipelineError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_cancelled_pipeline_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("m.glb");
        std::fs::write(&model, b"").unwrap();

        let p = pipeline(PipelineOptions::default());
        p.cancel_flag().store(true, Ordering::Relaxed);
        assert!(matches!(
            p.run(&AssetRequest::new(&model)),
            Err(PipelineError::Cancelled)
        ));
    }
}
