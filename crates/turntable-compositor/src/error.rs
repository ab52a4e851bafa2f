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
use turntable_core::ViewKind;

/// Errors that prevent a sheet from being assembled.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// One or more of the eight images was not supplied.
    #[error("missing views: {}", format_views(.0))]
    MissingView(Vec<ViewKind>),
    /// A supplied image could not be read or decoded.
    #[error("failed to decode {view} image '{path}': {source}")]
    Decode {
        /// The panel the image belongs to.
        view: ViewKind,
        /// The file that failed.
        path: PathBuf,
        /// The decoder error.
        #[source]
        source: image::ImageError,
    },
    /// The sheet geometry is unusable (zero-sized panels or overflow).
    #[error("invalid layout: {0}")]
    Layout(String),
    /// JPEG encoding failed.
    #[error("failed to encode the sheet: {0}")]
    Encode(#[source] image::ImageError),
    /// Writing or renaming the output file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_views(views: &[ViewKind]) -> String {
    views
        .iter()
        .map(|v| v.id())
        .collect::<Vec<_>>()
        .join(", ")
}
