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

//! # Turntable I/O
//!
//! Everything that touches the filesystem or an external tool on the way into the
//! pipeline: glTF import, input discovery, OBJ conversion, supervised child processes
//! and the UV panel.

#![warn(missing_docs)]

pub mod convert;
pub mod error;
pub mod gltf_import;
pub mod process;
pub mod resolver;
pub mod scan;
pub mod uv_layout;

pub use convert::{convert_obj_to_glb, BlenderObjConverter, ObjConverter};
pub use error::{ConversionError, ImportError, ProcessError, ScanError, UvLayoutError};
pub use gltf_import::GltfImporter;
pub use process::{ExternalCommand, ProcessOutput};
pub use resolver::{FileSystemResolver, ResourceResolver};
pub use scan::{find_assets, AssetFormat};
pub use uv_layout::{write_uv_layout, UvLayoutSource};
