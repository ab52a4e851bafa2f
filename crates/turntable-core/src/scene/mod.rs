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

//! Defines the in-memory scene an asset is imported into.
//!
//! A [`Scene`] is an explicit value owned by a single pipeline run. It is passed by
//! reference to the bounds calculator and the view rig, and by mutable reference to the
//! display mode controller during the solid override.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::math::{Aabb, LinearRgba, Mat4, Vec2};

/// Index of a [`Material`] in [`Scene::materials`].
pub type MaterialId = usize;

/// Index of a [`TextureImage`] in [`Scene::textures`].
pub type TextureId = usize;

/// How the renderer should shade a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayType {
    /// Full material evaluation, including textures.
    #[default]
    Textured,
    /// Flat shading with the bound material's base color only.
    Solid,
}

/// An encoded image embedded in, or referenced by, the source asset.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    /// The image name, or a generated one if the asset left it blank.
    pub name: String,
    /// The declared MIME type, if any.
    pub mime_type: Option<String>,
    /// The encoded bytes exactly as stored in the asset.
    pub data: Vec<u8>,
}

/// A surface material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// The material name.
    pub name: String,
    /// Linear base color factor.
    pub base_color: LinearRgba,
    /// Optional base color texture.
    pub base_color_texture: Option<TextureId>,
}

impl Material {
    /// Creates an untextured material with the given name and color.
    pub fn solid(name: impl Into<String>, base_color: LinearRgba) -> Self {
        Self {
            name: name.into(),
            base_color,
            base_color_texture: None,
        }
    }

    /// Returns `true` if the material samples a base color texture.
    pub fn is_textured(&self) -> bool {
        self.base_color_texture.is_some()
    }
}

/// One placed mesh in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    /// The node or mesh name.
    pub name: String,
    /// Bounds of the vertex positions in mesh-local space.
    pub local_bounds: Aabb,
    /// Local-to-world transform, including every parent node.
    pub world_transform: Mat4,
    /// Bound materials, one per primitive.
    pub material_slots: Vec<MaterialId>,
    /// Current shading mode.
    pub display_type: DisplayType,
    /// Triangles in UV space, from the first texture coordinate set.
    pub uv_triangles: Vec<[Vec2; 3]>,
}

impl MeshInstance {
    /// Creates a mesh with no materials, identity transform and no UVs.
    pub fn new(name: impl Into<String>, local_bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            local_bounds,
            world_transform: Mat4::IDENTITY,
            material_slots: Vec::new(),
            display_type: DisplayType::default(),
            uv_triangles: Vec::new(),
        }
    }

    /// Sets the world transform.
    pub fn with_transform(mut self, world_transform: Mat4) -> Self {
        self.world_transform = world_transform;
        self
    }

    /// Sets the material slots.
    pub fn with_materials(mut self, material_slots: Vec<MaterialId>) -> Self {
        self.material_slots = material_slots;
        self
    }
}

/// An imported asset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    /// The file the scene was imported from.
    pub source: PathBuf,
    /// Every placed mesh.
    pub meshes: Vec<MeshInstance>,
    /// The material table meshes refer into.
    pub materials: Vec<Material>,
    /// The texture table materials refer into.
    pub textures: Vec<TextureImage>,
}

impl Scene {
    /// Creates an empty scene for the given source file.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// The source path.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Appends a material and returns its id.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Appends a mesh.
    pub fn add_mesh(&mut self, mesh: MeshInstance) {
        self.meshes.push(mesh);
    }

    /// Returns the material for `id`, if it exists.
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Texture ids in the order they should be tried as a base color source:
    /// textures bound as a base color first, in material order, then all others.
    pub fn texture_candidates(&self) -> Vec<TextureId> {
        let mut order: Vec<TextureId> = Vec::with_capacity(self.textures.len());
        let bound = self.materials.iter().filter_map(|m| m.base_color_texture);
        for id in bound.chain(0..self.textures.len()) {
            if id < self.textures.len() && !order.contains(&id) {
                order.push(id);
            }
        }
        order
    }

    /// Returns `true` if any mesh carries UV triangles.
    pub fn has_uvs(&self) -> bool {
        self.meshes.iter().any(|m| !m.uv_triangles.is_empty())
    }
}
