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

//! Error types for the I/O crate.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a glTF file into a [`turntable_core::Scene`].
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid glTF.
    #[error("failed to parse glTF: {0}")]
    Parse(#[from] gltf::Error),

    /// A buffer or image could not be resolved.
    #[error("failed to resolve resource '{uri}': {reason}")]
    Resource {
        /// The URI, shortened for data URIs.
        uri: String,
        /// Why it failed.
        reason: String,
    },

    /// A binary chunk was referenced but is absent.
    #[error("GLB binary chunk is referenced but missing")]
    MissingBlob,
}

/// Failure while walking an input directory.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root does not exist or is not a directory.
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    /// An entry could not be read.
    #[error("failed to scan directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Failure while supervising an external program.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program is not on `PATH` and is not a valid path.
    #[error("program '{program}' was not found")]
    NotFound {
        /// The program that was looked up.
        program: String,
    },

    /// The program could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran past its deadline and was killed.
    #[error("'{program}' timed out after {seconds}s")]
    Timeout {
        /// The program that was killed.
        program: String,
        /// The deadline in seconds.
        seconds: u64,
    },

    /// The cancel flag was raised and the program was killed.
    #[error("'{program}' was cancelled")]
    Cancelled {
        /// The program that was killed.
        program: String,
    },

    /// Waiting on the program failed.
    #[error("failed to wait on '{program}': {source}")]
    Wait {
        /// The program being waited on.
        program: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Failure to convert an OBJ model to GLB.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The input file does not exist.
    #[error("input '{0}' does not exist")]
    InputNotFound(PathBuf),

    /// The input is not an OBJ file.
    #[error("input '{0}' is not an OBJ file")]
    NotObj(PathBuf),

    /// The converter could not be run to completion.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The converter exited unsuccessfully.
    #[error("converter exited with code {code:?}: {stderr}")]
    Failed {
        /// Exit code, absent if killed by a signal.
        code: Option<i32>,
        /// Tail of the converter's standard error.
        stderr: String,
    },

    /// The converter reported success but wrote nothing.
    #[error("converter did not produce '{0}'")]
    OutputMissing(PathBuf),

    /// Scratch space could not be prepared.
    #[error("failed to prepare conversion: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to write the UV layout panel.
#[derive(Debug, Error)]
pub enum UvLayoutError {
    /// The raster could not be encoded or written.
    #[error("failed to write UV layout '{path}': {source}")]
    Write {
        /// The output path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: image::ImageError,
    },
}
