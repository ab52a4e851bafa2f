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

use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use turntable_compositor::Compositor;
use turntable_core::{scene_bounds, ViewRig};
use turntable_io::{convert_obj_to_glb, AssetFormat, BlenderObjConverter, GltfImporter};
use turntable_pipeline::{
    AssetPipeline, AssetRequest, BatchOptions, BatchRunner, PipelineOptions, ProcessRenderer,
    TurntableConfig,
};

use crate::{Cli, Command};

pub fn execute(cli: Cli) -> Result<ExitCode> {
    let mut config = TurntableConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Command::Render {
            model,
            output,
            resolution,
            keep_temp,
        } => {
            apply_overrides(&mut config, resolution, keep_temp, None)?;
            let pipeline = build_pipeline(&config);
            let mut request = AssetRequest::new(&model);
            if let Some(output) = output {
                request = request.with_composite(output);
            }
            let report = pipeline
                .run(&request)
                .with_context(|| format!("Failed to process '{}'", model.display()))?;
            println!("{}", report.composite.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Batch {
            directory,
            output_dir,
            resolution,
            keep_temp,
            workers,
        } => {
            apply_overrides(&mut config, resolution, keep_temp, workers)?;
            let runner = BatchRunner::new(
                build_pipeline(&config),
                BatchOptions {
                    output_dir,
                    workers: config.workers,
                },
            );
            let summary = runner
                .run(&directory)
                .with_context(|| format!("Failed to scan '{}'", directory.display()))?;

            println!(
                "Batch complete: {} file(s), {} succeeded, {} failed",
                summary.processed, summary.succeeded, summary.failed
            );
            for failure in &summary.failures {
                println!("  failed: {} ({})", failure.model.display(), failure.reason);
            }
            Ok(if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Convert { obj, output } => {
            let converter = converter(&config);
            let glb = convert_obj_to_glb(&converter, &obj, output.as_deref())
                .with_context(|| format!("Failed to convert '{}'", obj.display()))?;
            println!("{}", glb.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Rig { model } => {
            let rig = derive_rig(&config, &model)?;
            let text = serde_json::to_string_pretty(&serde_json::json!({
                "model": model,
                "rig": rig,
            }))?;
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn apply_overrides(
    config: &mut TurntableConfig,
    resolution: Option<u32>,
    keep_temp: bool,
    workers: Option<usize>,
) -> Result<()> {
    if let Some(resolution) = resolution {
        config.resolution = resolution;
    }
    if keep_temp {
        config.keep_intermediate = true;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }
    config.validate().context("Invalid command-line options")?;
    Ok(())
}

fn converter(config: &TurntableConfig) -> BlenderObjConverter {
    BlenderObjConverter::new(
        config.renderer.program.clone(),
        config.renderer.convert_timeout(),
    )
}

fn build_pipeline(config: &TurntableConfig) -> AssetPipeline {
    let cancel = Arc::new(AtomicBool::new(false));
    let renderer = ProcessRenderer::from_config(&config.renderer).with_cancel_flag(Arc::clone(&cancel));
    let compositor = Compositor::new(config.layout.clone(), &config.fonts.strategy());
    AssetPipeline::new(
        PipelineOptions::from(config),
        Arc::new(renderer),
        Arc::new(converter(config)),
        compositor,
    )
    .with_cancel_flag(cancel)
}

fn derive_rig(config: &TurntableConfig, model: &Path) -> Result<ViewRig> {
    let Some(format) = AssetFormat::from_path(model) else {
        bail!("Unsupported model format: '{}'", model.display());
    };

    let scratch = tempfile::tempdir()?;
    let scene_path = if format.is_native() {
        model.to_path_buf()
    } else {
        let glb = scratch.path().join("model.glb");
        convert_obj_to_glb(&converter(config), model, Some(glb.as_path()))
            .with_context(|| format!("Failed to convert '{}'", model.display()))?
    };

    let scene = GltfImporter::import_file(&scene_path)
        .with_context(|| format!("Failed to import '{}'", scene_path.display()))?;
    let bounds = scene_bounds(&scene)?;
    Ok(ViewRig::from_bounds(bounds))
}
