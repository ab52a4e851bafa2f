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

//! Discovers input models on disk.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ScanError;

/// Model formats accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFormat {
    /// Binary glTF.
    Glb,
    /// JSON glTF.
    Gltf,
    /// Wavefront OBJ, converted to GLB before import.
    Obj,
}

impl AssetFormat {
    /// Determines the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "glb" => Some(AssetFormat::Glb),
            "gltf" => Some(AssetFormat::Gltf),
            "obj" => Some(AssetFormat::Obj),
            _ => None,
        }
    }

    /// Returns `true` if the importer reads this format directly.
    pub fn is_native(self) -> bool {
        matches!(self, AssetFormat::Glb | AssetFormat::Gltf)
    }
}

/// Recursively finds every supported model under `root`, sorted by path.
pub fn find_assets(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut assets = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && AssetFormat::from_path(entry.path()).is_some() {
            assets.push(entry.into_path());
        }
    }
    assets.sort();
    log::debug!("Found {} asset(s) under '{}'", assets.len(), root.display());
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(AssetFormat::from_path(Path::new("a/Chair.GLB")), Some(AssetFormat::Glb));
        assert_eq!(AssetFormat::from_path(Path::new("b.gltf")), Some(AssetFormat::Gltf));
        assert_eq!(AssetFormat::from_path(Path::new("c.Obj")), Some(AssetFormat::Obj));
        assert_eq!(AssetFormat::from_path(Path::new("d.fbx")), None);
        assert_eq!(AssetFormat::from_path(Path::new("glb")), None);
        assert!(!AssetFormat::Obj.is_native());
    }
}
