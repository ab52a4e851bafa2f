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

//! Directory batches over a bounded worker pool.
//!
//! Assets are discovered up front and sorted, so the first claimant of an output path is
//! deterministic. Workers pull requests from a bounded channel inside a thread scope; a
//! failure only affects its own asset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use serde::Serialize;
use turntable_io::find_assets;

use crate::asset::{AssetPipeline, AssetRequest};
use crate::error::PipelineError;

/// Batch-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Directory for composites. `None` writes each next to its model.
    pub output_dir: Option<PathBuf>,
    /// Assets processed concurrently.
    pub workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            workers: 1,
        }
    }
}

/// One failed asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// The model that failed.
    pub model: PathBuf,
    /// The error, rendered as text.
    pub reason: String,
}

/// Tally of a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Assets found and attempted.
    pub processed: usize,
    /// Assets with a composite.
    pub succeeded: usize,
    /// Assets without one.
    pub failed: usize,
    /// Written composites, in discovery order.
    pub outputs: Vec<PathBuf>,
    /// Failures, in discovery order.
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    /// Returns `true` when every asset succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs an [`AssetPipeline`] over every model in a directory tree.
pub struct BatchRunner {
    pipeline: AssetPipeline,
    options: BatchOptions,
}

impl BatchRunner {
    /// Creates a runner.
    pub fn new(pipeline: AssetPipeline, options: BatchOptions) -> Self {
        Self { pipeline, options }
    }

    /// The pipeline used for each asset.
    pub fn pipeline(&self) -> &AssetPipeline {
        &self.pipeline
    }

    /// The composite path for `model`: `{output_dir or model_dir}/{stem}.jpg`.
    pub fn output_path(&self, model: &Path) -> PathBuf {
        let stem = model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = match (&self.options.output_dir, model.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) => parent.to_path_buf(),
            (None, None) => PathBuf::from("."),
        };
        dir.join(format!("{stem}.jpg"))
    }

    /// Scans `root` and processes every model found.
    ///
    /// # Errors
    ///
    /// Only scanning errors abort the batch; asset failures are tallied.
    pub fn run(&self, root: &Path) -> Result<BatchSummary, PipelineError> {
        let models = find_assets(root)?;
        if models.is_empty() {
            log::warn!("No models found under '{}'", root.display());
            return Ok(BatchSummary::default());
        }
        if let Some(dir) = &self.options.output_dir {
            std::fs::create_dir_all(dir)?;
        }
        log::info!("Found {} model(s) under '{}'", models.len(), root.display());
        Ok(self.run_models(&models))
    }

    /// Processes an explicit list of models.
    pub fn run_models(&self, models: &[PathBuf]) -> BatchSummary {
        let total = models.len();
        let mut results: Vec<Option<Result<PathBuf, PipelineError>>> =
            (0..total).map(|_| None).collect();

        let mut jobs = Vec::with_capacity(total);
        for (index, outcome) in self.claim_outputs(models).into_iter().enumerate() {
            match outcome {
                Ok(request) => jobs.push((index, request)),
                Err(err) => results[index] = Some(Err(err)),
            }
        }

        let workers = self.options.workers.clamp(1, jobs.len().max(1));
        let (job_tx, job_rx) = bounded::<(usize, AssetRequest)>(workers);
        let (result_tx, result_rx) = unbounded();

        thread::scope(|scope| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let pipeline = &self.pipeline;
                scope.spawn(move || {
                    for (index, request) in job_rx.iter() {
                        let outcome = if pipeline.is_cancelled() {
                            Err(PipelineError::Cancelled)
                        } else {
                            log::info!(
                                "[{}/{}] worker {worker}: '{}'",
                                index + 1,
                                total,
                                request.model.display()
                            );
                            pipeline.run(&request).map(|report| report.composite)
                        };
                        if result_tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            for job in jobs {
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);

            for (index, outcome) in result_rx.iter() {
                results[index] = Some(outcome);
            }
        });

        let mut summary = BatchSummary {
            processed: total,
            ..BatchSummary::default()
        };
        for (model, outcome) in models.iter().zip(results) {
            match outcome.unwrap_or(Err(PipelineError::Cancelled)) {
                Ok(composite) => {
                    summary.succeeded += 1;
                    summary.outputs.push(composite);
                }
                Err(err) => {
                    log::error!("Failed '{}': {err}", model.display());
                    summary.failed += 1;
                    summary.failures.push(BatchFailure {
                        model: model.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        log::info!(
            "Batch finished: {} processed, {} succeeded, {} failed",
            summary.processed,
            summary.succeeded,
            summary.failed
        );
        summary
    }

    /// Builds a request per model, failing any that would write where an earlier one does.
    fn claim_outputs(&self, models: &[PathBuf]) -> Vec<Result<AssetRequest, PipelineError>> {
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        models
            .iter()
            .map(|model| {
                let request = AssetRequest::new(model).with_composite(self.output_path(model));
                let paths = self.pipeline.plan_paths(&request)?;
                let keys = [
                    paths.composite.clone(),
                    paths.render_dir.join(&paths.model_name),
                ];
                if let Some((key, owner)) = keys
                    .iter()
                    .find_map(|key| claimed.get(key).map(|owner| (key, owner)))
                {
                    return Err(PipelineError::OutputCollision {
                        path: key.clone(),
                        claimed_by: owner.clone(),
                    });
                }
                for key in keys {
                    claimed.insert(key, model.clone());
                }
                Ok(request)
            })
            .collect()
    }
}
