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

use std::path::PathBuf;

use thiserror::Error;
use turntable_compositor::CompositeError;
use turntable_core::{BoundsError, DisplayModeError, RenderError};
use turntable_io::{ConversionError, ImportError, ScanError};

/// A configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Read {
        /// The config file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config{}: {message}", quoted(.path))]
    Parse {
        /// The config file, if read from disk.
        path: Option<PathBuf>,
        /// The parser message.
        message: String,
    },

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn quoted(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" '{}'", p.display()))
        .unwrap_or_default()
}

/// Why one asset failed. Every stage error converts into this at the asset boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input extension is not `.glb`, `.gltf` or `.obj`.
    #[error("unsupported model format: '{0}'")]
    UnsupportedFormat(PathBuf),

    /// The input file does not exist.
    #[error("model '{0}' does not exist")]
    InputNotFound(PathBuf),

    /// OBJ to GLB conversion failed.
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// The model could not be imported.
    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    /// The model has no geometry to frame.
    #[error(transparent)]
    NoGeometry(#[from] BoundsError),

    /// The solid override could not be applied or reverted.
    #[error("display mode: {0}")]
    DisplayMode(#[from] DisplayModeError),

    /// The renderer failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The sheet could not be assembled.
    #[error("composition failed: {0}")]
    Composite(#[from] CompositeError),

    /// The input directory could not be scanned.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Another asset in the same batch already writes to this path.
    #[error("output '{path}' is already claimed by '{claimed_by}'")]
    OutputCollision {
        /// The contested path.
        path: PathBuf,
        /// The asset that claimed it first.
        claimed_by: PathBuf,
    },

    /// The run was cancelled before this asset finished.
    #[error("cancelled")]
    Cancelled,

    /// Filesystem error outside any specific stage.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
