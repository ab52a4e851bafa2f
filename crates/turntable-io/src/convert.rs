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

//! OBJ to GLB conversion through an external tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConversionError;
use crate::process::ExternalCommand;
use crate::scan::AssetFormat;

/// Converts an OBJ file into a GLB file.
pub trait ObjConverter: Send + Sync {
    /// Writes a GLB version of `obj` to `output`.
    ///
    /// Implementations may assume `obj` exists and `output`'s directory exists.
    fn convert(&self, obj: &Path, output: &Path) -> Result<(), ConversionError>;
}

const BLENDER_CONVERT_SCRIPT: &str = r#"
import sys
import bpy

argv = sys.argv[sys.argv.index("--") + 1:]
obj_path, glb_path = argv[0], argv[1]

bpy.ops.object.select_all(action='SELECT')
bpy.ops.object.delete()

if hasattr(bpy.ops.wm, "obj_import"):
    bpy.ops.wm.obj_import(filepath=obj_path)
else:
    bpy.ops.import_scene.obj(filepath=obj_path)

bpy.ops.export_scene.gltf(
    filepath=glb_path,
    export_format='GLB',
    export_texcoords=True,
    export_normals=True,
    export_materials='EXPORT',
)
"#;

/// Converts with Blender's bundled OBJ importer and glTF exporter.
#[derive(Debug, Clone)]
pub struct BlenderObjConverter {
    program: String,
    timeout: Option<Duration>,
}

impl BlenderObjConverter {
    /// Creates a converter that runs `program` (normally `blender`).
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Default for BlenderObjConverter {
    fn default() -> Self {
        Self::new("blender", Some(Duration::from_secs(300)))
    }
}

impl ObjConverter for BlenderObjConverter {
    fn convert(&self, obj: &Path, output: &Path) -> Result<(), ConversionError> {
        let result = ExternalCommand::new(&self.program)
            .args(["--background", "--factory-startup", "--python-expr"])
            .arg(BLENDER_CONVERT_SCRIPT)
            .arg("--")
            .arg(obj)
            .arg(output)
            .timeout(self.timeout)
            .run()?;

        if !result.status.success() {
            return Err(ConversionError::Failed {
                code: result.status.code(),
                stderr: result.stderr_tail(20),
            });
        }
        Ok(())
    }
}

/// Default GLB path for `obj`: same directory and stem.
pub fn default_glb_path(obj: &Path) -> PathBuf {
    obj.with_extension("glb")
}

/// Validates `obj`, converts it and checks the result exists.
///
/// When `output` is `None` the GLB is written next to the input.
pub fn convert_obj_to_glb(
    converter: &dyn ObjConverter,
    obj: &Path,
    output: Option<&Path>,
) -> Result<PathBuf, ConversionError> {
    if !obj.is_file() {
        return Err(ConversionError::InputNotFound(obj.to_path_buf()));
    }
    if AssetFormat::from_path(obj) != Some(AssetFormat::Obj) {
        return Err(ConversionError::NotObj(obj.to_path_buf()));
    }

    let output = output.map_or_else(|| default_glb_path(obj), Path::to_path_buf);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    log::info!("Converting '{}' to '{}'", obj.display(), output.display());
    converter.convert(obj, &output)?;

    if !output.is_file() {
        return Err(ConversionError::OutputMissing(output));
    }
    Ok(output)
}
