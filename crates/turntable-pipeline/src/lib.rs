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

//! # Turntable Pipeline
//!
//! Wires the lower crates into runnable units: the configuration file, a render backend
//! that drives an external program, the per-asset pipeline and the directory batch.

#![warn(missing_docs)]

pub mod asset;
pub mod batch;
pub mod config;
pub mod error;
pub mod renderer;

pub use asset::{plan_render_job, AssetPaths, AssetPipeline, AssetReport, AssetRequest, PipelineOptions};
pub use batch::{BatchFailure, BatchOptions, BatchRunner, BatchSummary};
pub use config::{FontConfig, RendererConfig, TurntableConfig, DEFAULT_CONFIG_FILE, RENDER_SCRIPT};
pub use error::{ConfigError, PipelineError};
pub use renderer::ProcessRenderer;
