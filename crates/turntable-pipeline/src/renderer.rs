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

//! A [`RenderBackend`] that hands the job to an external program.
//!
//! The job is written as JSON to a temporary file and the program is run as
//! `{program} {args...} -- --job {file}`. The program must write every pass's
//! `output` and exit with status zero.

use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use turntable_core::{RenderBackend, RenderError, RenderJob};
use turntable_io::{ExternalCommand, ProcessError};

use crate::config::RendererConfig;

/// Lines of standard error kept in failure messages.
const STDERR_TAIL_LINES: usize = 20;

/// Runs an external renderer once per asset.
#[derive(Debug, Clone)]
pub struct ProcessRenderer {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl ProcessRenderer {
    /// A renderer invoking `program` with `args` and no deadline.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
            cancel: None,
        }
    }

    /// A renderer configured from the `[renderer]` section.
    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.program.clone(), config.invocation_args()).with_timeout(config.timeout())
    }

    /// Kills the program after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kills the program when `flag` is raised.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
}

impl RenderBackend for ProcessRenderer {
    fn name(&self) -> &str {
        &self.program
    }

    fn render(&self, job: &RenderJob) -> Result<(), RenderError> {
        if job.passes.is_empty() {
            return Err(RenderError::Job("the job has no passes".into()));
        }

        let mut job_file = tempfile::Builder::new()
            .prefix("turntable-job-")
            .suffix(".json")
            .tempfile()?;
        serde_json::to_writer_pretty(job_file.as_file_mut(), job)
            .map_err(|e| RenderError::Job(e.to_string()))?;
        job_file.as_file_mut().flush()?;

        let mut command = ExternalCommand::new(&self.program)
            .args(&self.args)
            .arg("--")
            .arg("--job")
            .arg(job_file.path())
            .timeout(self.timeout);
        if let Some(flag) = &self.cancel {
            command = command.cancel_flag(Arc::clone(flag));
        }

        log::info!(
            "Rendering {} view(s) of '{}' with '{}'",
            job.passes.len(),
            job.model.display(),
            self.program
        );
        let output = command.run().map_err(into_render_error)?;
        if !output.stdout.is_empty() {
            log::debug!("Renderer output:\n{}", output.stdout.trim_end());
        }

        if !output.status.success() {
            return Err(RenderError::NonZeroExit {
                code: output.status.code(),
                stderr: output.stderr_tail(STDERR_TAIL_LINES),
            });
        }

        let missing = job.missing_views();
        if !missing.is_empty() {
            return Err(RenderError::MissingOutputs(missing));
        }
        Ok(())
    }
}

fn into_render_error(err: ProcessError) -> RenderError {
    match err {
        ProcessError::NotFound { program } => RenderError::NotFound { program },
        ProcessError::Spawn { program, source } => RenderError::SpawnFailed {
            program,
            details: source.to_string(),
        },
        ProcessError::Timeout { seconds, .. } => RenderError::Timeout { seconds },
        ProcessError::Cancelled { .. } => RenderError::Cancelled,
        ProcessError::Wait { source, .. } => RenderError::Io(source),
    }
}
