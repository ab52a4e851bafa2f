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

//! glTF scene importer with support for both embedded and external resources.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gltf::mesh::Mode;
use turntable_core::math::{Aabb, LinearRgba, Mat4, Vec2, Vec3};
use turntable_core::scene::{Material, MaterialId, MeshInstance, Scene, TextureImage};

use crate::error::ImportError;
use crate::resolver::{decode_data_uri, FileSystemResolver, ResourceResolver};

/// Name given to the material bound to primitives that declare none.
pub const DEFAULT_MATERIAL_NAME: &str = "DefaultMaterial";

/// Imports `.glb` and `.gltf` files into a [`Scene`].
#[derive(Clone)]
pub struct GltfImporter {
    resolver: Arc<dyn ResourceResolver>,
}

struct ImportContext<'b> {
    buffers: &'b [Vec<u8>],
    scene: Scene,
    default_material: Option<MaterialId>,
}

impl GltfImporter {
    /// Creates an importer that resolves external resources through `resolver`.
    pub fn new(resolver: Arc<dyn ResourceResolver>) -> Self {
        Self { resolver }
    }

    /// Reads and imports `path`, resolving external resources next to it.
    pub fn import_file(path: &Path) -> Result<Scene, ImportError> {
        let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let importer = Self::new(Arc::new(FileSystemResolver::for_document(path)));
        importer.import_slice(&bytes, path)
    }

    /// Imports a document held in memory. `source` is recorded on the scene.
    pub fn import_slice(
        &self,
        bytes: &[u8],
        source: impl Into<PathBuf>,
    ) -> Result<Scene, ImportError> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        let buffers = self.load_buffer_data(&gltf)?;

        let mut ctx = ImportContext {
            buffers: &buffers,
            scene: Scene::new(source),
            default_material: None,
        };
        ctx.scene.textures = self.load_images(&gltf, &buffers);
        for material in gltf.materials() {
            ctx.scene.add_material(convert_material(&material));
        }

        for node in root_nodes(&gltf.document) {
            visit_node(&node, Mat4::IDENTITY, &mut ctx);
        }

        let scene = ctx.scene;
        log::info!(
            "Imported '{}': {} mesh(es), {} material(s), {} texture(s)",
            scene.source().display(),
            scene.meshes.len(),
            scene.materials.len(),
            scene.textures.len()
        );
        Ok(scene)
    }

    fn load_buffer_data(&self, gltf: &gltf::Gltf) -> Result<Vec<Vec<u8>>, ImportError> {
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => {
                    let blob = gltf.blob.as_deref().ok_or(ImportError::MissingBlob)?;
                    buffer_data.push(blob.to_vec());
                }
                gltf::buffer::Source::Uri(uri) => {
                    if uri.starts_with("data:") {
                        buffer_data.push(decode_data_uri(uri)?.1);
                    } else {
                        buffer_data.push(self.resolver.resolve_buffer(uri)?);
                    }
                }
            }
        }
        Ok(buffer_data)
    }

    /// Loads every image. Images that fail to resolve are kept as empty entries so
    /// texture indices stay aligned with the document.
    fn load_images(&self, gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> Vec<TextureImage> {
        gltf.images()
            .map(|image| {
                let name = image
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("image_{}", image.index()));
                let loaded = match image.source() {
                    gltf::image::Source::View { view, mime_type } => {
                        let start = view.offset();
                        let end = start + view.length();
                        buffers
                            .get(view.buffer().index())
                            .and_then(|b| b.get(start..end))
                            .map(|bytes| (Some(mime_type.to_owned()), bytes.to_vec()))
                            .ok_or_else(|| ImportError::Resource {
                                uri: name.clone(),
                                reason: "buffer view out of range".to_owned(),
                            })
                    }
                    gltf::image::Source::Uri { uri, mime_type } => {
                        let declared = mime_type.map(str::to_owned);
                        if uri.starts_with("data:") {
                            decode_data_uri(uri).map(|(mime, data)| (mime.or(declared), data))
                        } else {
                            self.resolver
                                .resolve_image(uri)
                                .map(|data| (declared, data))
                        }
                    }
                };
                match loaded {
                    Ok((mime_type, data)) => TextureImage {
                        name,
                        mime_type,
                        data,
                    },
                    Err(e) => {
                        log::warn!("Skipping image '{name}': {e}");
                        TextureImage {
                            name,
                            mime_type: None,
                            data: Vec::new(),
                        }
                    }
                }
            })
            .collect()
    }
}

fn convert_material(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let name = material
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or_default()));
    Material {
        name,
        base_color: LinearRgba::from_array(pbr.base_color_factor()),
        base_color_texture: pbr
            .base_color_texture()
            .map(|info| info.texture().source().index()),
    }
}

/// Nodes of the default scene, else the first scene, else every node without a parent.
fn root_nodes(document: &gltf::Document) -> Vec<gltf::Node<'_>> {
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        return scene.nodes().collect();
    }
    let children: HashSet<usize> = document
        .nodes()
        .flat_map(|n| n.children().map(|c| c.index()))
        .collect();
    document
        .nodes()
        .filter(|n| !children.contains(&n.index()))
        .collect()
}

fn visit_node(node: &gltf::Node<'_>, parent: Mat4, ctx: &mut ImportContext<'_>) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let instance = build_instance(node, &mesh, world, ctx);
        ctx.scene.add_mesh(instance);
    }
    for child in node.children() {
        visit_node(&child, world, ctx);
    }
}

fn build_instance(
    node: &gltf::Node<'_>,
    mesh: &gltf::Mesh<'_>,
    world: Mat4,
    ctx: &mut ImportContext<'_>,
) -> MeshInstance {
    let name = node
        .name()
        .or_else(|| mesh.name())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

    let buffers = ctx.buffers;
    let mut local_bounds = Aabb::INVALID;
    let mut material_slots = Vec::new();
    let mut uv_triangles = Vec::new();

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        if let Some(positions) = reader.read_positions() {
            local_bounds = positions.fold(local_bounds, |acc, [x, y, z]| {
                acc.merged_with_point(Vec3::new(x, y, z))
            });
        }

        let slot = match primitive.material().index() {
            Some(index) => index,
            None => *ctx.default_material.get_or_insert_with(|| {
                ctx.scene
                    .add_material(Material::solid(DEFAULT_MATERIAL_NAME, LinearRgba::WHITE))
            }),
        };
        material_slots.push(slot);

        if primitive.mode() != Mode::Triangles {
            continue;
        }
        let Some(tex_coords) = reader.read_tex_coords(0) else {
            continue;
        };
        let uvs: Vec<Vec2> = tex_coords
            .into_f32()
            .map(|[u, v]| Vec2::new(u, v))
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..uvs.len() as u32).collect(),
        };
        for tri in indices.chunks_exact(3) {
            let corner = |i: u32| uvs.get(i as usize).copied();
            if let (Some(a), Some(b), Some(c)) = (corner(tri[0]), corner(tri[1]), corner(tri[2])) {
                uv_triangles.push([a, b, c]);
            }
        }
    }

    let mut instance = MeshInstance::new(name, local_bounds)
        .with_transform(world)
        .with_materials(material_slots);
    instance.uv_triangles = uv_triangles;
    instance
}
