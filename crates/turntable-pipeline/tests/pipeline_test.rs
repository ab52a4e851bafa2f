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

//! End-to-end tests with a stub renderer that paints solid panels.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use image::{Rgb, RgbImage};
use serde_json::json;
use turntable_compositor::{BitmapFace, CompositeError, Compositor, LayoutOptions};
use turntable_core::rig::DisplayMode;
use turntable_core::{RenderBackend, RenderError, RenderJob, ViewKind};
use turntable_io::{ConversionError, ObjConverter};
use turntable_pipeline::{
    AssetPipeline, AssetRequest, BatchOptions, BatchRunner, PipelineError, PipelineOptions,
    ProcessRenderer,
};

const PANEL_W: u32 = 32;
const PANEL_H: u32 = 24;

/// Writes one solid PNG per pass, optionally skipping a view.
#[derive(Default)]
struct PaintingRenderer {
    skip: Option<ViewKind>,
    jobs: Mutex<Vec<RenderJob>>,
}

impl RenderBackend for PaintingRenderer {
    fn name(&self) -> &str {
        "painting"
    }

    fn render(&self, job: &RenderJob) -> Result<(), RenderError> {
        for (i, pass) in job.passes.iter().enumerate() {
            if Some(pass.view) == self.skip {
                continue;
            }
            let shade = 40 + 25 * i as u8;
            RgbImage::from_pixel(PANEL_W, PANEL_H, Rgb([shade, 90, 200 - shade]))
                .save(&pass.output)
                .map_err(|e| RenderError::Job(e.to_string()))?;
        }
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.push(job.clone());
        }
        Ok(())
    }
}

struct FailingRenderer;

impl RenderBackend for FailingRenderer {
    fn name(&self) -> &str {
        "failing"
    }

    fn render(&self, _job: &RenderJob) -> Result<(), RenderError> {
        Err(RenderError::NonZeroExit {
            code: Some(1),
            stderr: "out of memory".into(),
        })
    }
}

/// Writes the triangle document in place of a real conversion.
struct TriangleConverter;

impl ObjConverter for TriangleConverter {
    fn convert(&self, _obj: &Path, output: &Path) -> Result<(), ConversionError> {
        let dir = output.parent().unwrap_or(Path::new("."));
        write_triangle(dir, output)?;
        Ok(())
    }
}

fn triangle_buffer() -> Vec<u8> {
    let floats: [f32; 15] = [
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 2.0, 1.0, //
        0.0, 0.0, //
        1.0, 0.0, //
        0.0, 1.0,
    ];
    floats.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Writes `tri.bin` into `dir` and a glTF document referencing it at `document`.
fn write_triangle(dir: &Path, document: &Path) -> std::io::Result<()> {
    fs::write(dir.join("tri.bin"), triangle_buffer())?;
    let doc = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "tri", "mesh": 0 }],
        "meshes": [{
            "primitives": [{ "attributes": { "POSITION": 0, "TEXCOORD_0": 1 } }]
        }],
        "buffers": [{ "uri": "tri.bin", "byteLength": 60 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 24 }
        ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 2.0, 1.0]
            },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" }
        ]
    });
    fs::write(document, serde_json::to_vec(&doc)?)
}

fn options() -> PipelineOptions {
    PipelineOptions {
        resolution: 64,
        ..PipelineOptions::default()
    }
}

fn pipeline(options: PipelineOptions, renderer: Arc<dyn RenderBackend>) -> AssetPipeline {
    AssetPipeline::new(
        options,
        renderer,
        Arc::new(TriangleConverter),
        Compositor::with_face(LayoutOptions::default(), Box::new(BitmapFace)),
    )
}

fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[test]
fn test_running_twice_leaves_only_the_composite() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("tri.gltf");
    write_triangle(dir.path(), &model)?;

    let renderer = Arc::new(PaintingRenderer::default());
    let pipeline = pipeline(options(), renderer.clone());

    for _ in 0..2 {
        let report = pipeline.run(&AssetRequest::new(&model))?;
        assert_eq!(report.composite, dir.path().join("tri_eight_views.jpg"));
        assert_eq!(
            file_names(dir.path())?,
            ["tri.bin", "tri.gltf", "tri_eight_views.jpg"]
        );
    }

    let sheet = image::open(dir.path().join("tri_eight_views.jpg"))?;
    assert_eq!(
        (sheet.width(), sheet.height()),
        (4 * PANEL_W + 50, 2 * (PANEL_H + 30) + 30 + 40)
    );

    let jobs = renderer.jobs.lock().map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(jobs.len(), 2);
    let iso = jobs[0]
        .passes
        .iter()
        .find(|p| p.view == ViewKind::Isometric)
        .ok_or_else(|| anyhow::anyhow!("no isometric pass"))?;
    assert_eq!(iso.display_mode, DisplayMode::SolidOverride);
    Ok(())
}

#[test]
fn test_keep_intermediate_leaves_every_view() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("tri.gltf");
    write_triangle(dir.path(), &model)?;

    let options = PipelineOptions {
        keep_intermediate: true,
        ..options()
    };
    pipeline(options, Arc::new(PaintingRenderer::default())).run(&AssetRequest::new(&model))?;

    for kind in ViewKind::ALL {
        assert!(dir.path().join(kind.file_name("tri")).is_file(), "{kind}");
    }
    Ok(())
}

#[test]
fn test_missing_view_fails_without_composite() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("tri.gltf");
    write_triangle(dir.path(), &model)?;

    let renderer = Arc::new(PaintingRenderer {
        skip: Some(ViewKind::Bottom),
        ..PaintingRenderer::default()
    });
    let result = pipeline(options(), renderer).run(&AssetRequest::new(&model));

    match result {
        Err(PipelineError::Composite(CompositeError::MissingView(missing))) => {
            assert_eq!(missing, vec![ViewKind::Bottom]);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!dir.path().join("tri_eight_views.jpg").exists());
    // Kept for debugging by default.
    assert!(dir.path().join(ViewKind::Front.file_name("tri")).is_file());
    Ok(())
}

#[test]
fn test_cleanup_on_failure_removes_intermediates() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("tri.gltf");
    write_triangle(dir.path(), &model)?;

    let options = PipelineOptions {
        cleanup_on_failure: true,
        ..options()
    };
    let renderer = Arc::new(PaintingRenderer {
        skip: Some(ViewKind::Top),
        ..PaintingRenderer::default()
    });
    assert!(pipeline(options, renderer).run(&AssetRequest::new(&model)).is_err());
    assert_eq!(file_names(dir.path())?, ["tri.bin", "tri.gltf"]);
    Ok(())
}

#[test]
fn test_rerun_does_not_reuse_rasters_from_a_failed_run() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("tri.gltf");
    write_triangle(dir.path(), &model)?;

    let first = Arc::new(PaintingRenderer {
        skip: Some(ViewKind::Top),
        ..PaintingRenderer::default()
    });
    assert!(pipeline(options(), first).run(&AssetRequest::new(&model)).is_err());
    // The failed run leaves its Bottom raster behind.
    assert!(dir.path().join(ViewKind::Bottom.file_name("tri")).is_file());

    let second = Arc::new(PaintingRenderer {
        skip: Some(ViewKind::Bottom),
        ..PaintingRenderer::default()
    });
    match pipeline(options(), second).run(&AssetRequest::new(&model)) {
        Err(PipelineError::Composite(CompositeError::MissingView(missing))) => {
            assert_eq!(missing, vec![ViewKind::Bottom]);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!dir.path().join("tri_eight_views.jpg").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_clean_exit_without_rasters_is_a_missing_view() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("tri.gltf");
    write_triangle(dir.path(), &model)?;

    // Exits zero without writing anything.
    let renderer = ProcessRenderer::new("sh", vec!["-c".into(), "exit 0".into()]);
    match pipeline(options(), Arc::new(renderer)).run(&AssetRequest::new(&model)) {
        Err(PipelineError::Composite(CompositeError::MissingView(missing))) => {
            let cameras: Vec<ViewKind> = ViewKind::COMPOSITE_ORDER
                .into_iter()
                .filter(|kind| kind.has_camera())
                .collect();
            assert_eq!(missing, cameras);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!dir.path().join("tri_eight_views.jpg").exists());
    Ok(())
}

#[test]
fn test_renderer_failure_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = dir.path().join("tri.gltf");
    write_triangle(dir.path(), &model)?;

    let result = pipeline(options(), Arc::new(FailingRenderer)).run(&AssetRequest::new(&model));
    match result {
        Err(PipelineError::Render(RenderError::NonZeroExit { code, .. })) => {
            assert_eq!(code, Some(1));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!dir.path().join("tri_eight_views.jpg").exists());
    Ok(())
}

#[test]
fn test_batch_tallies_success_and_failure() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    write_triangle(input.path(), &input.path().join("good.gltf"))?;
    fs::create_dir_all(input.path().join("nested"))?;
    fs::write(input.path().join("nested/crate.OBJ"), b"v 0 0 0\n")?;
    fs::write(input.path().join("broken.gltf"), b"{ not json")?;
    fs::write(input.path().join("readme.txt"), b"ignored")?;

    let runner = BatchRunner::new(
        pipeline(options(), Arc::new(PaintingRenderer::default())),
        BatchOptions {
            output_dir: Some(output.path().to_path_buf()),
            workers: 2,
        },
    );
    let summary = runner.run(input.path())?;

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].model, input.path().join("broken.gltf"));
    assert_eq!(file_names(output.path())?, ["crate.jpg", "good.jpg"]);

    let expected: Vec<PathBuf> = vec![output.path().join("good.jpg"), output.path().join("crate.jpg")];
    assert_eq!(summary.outputs, expected);
    Ok(())
}
