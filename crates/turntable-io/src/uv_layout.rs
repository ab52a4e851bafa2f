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

//! Produces the UV panel: the model's base color texture if it has one, otherwise a
//! drawing of its UV triangles, otherwise a neutral checker.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use turntable_core::math::Vec2;
use turntable_core::scene::Scene;

use crate::error::UvLayoutError;

const CHECKER_CELLS: u32 = 16;
const CHECKER_LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CHECKER_DARK: Rgba<u8> = Rgba([232, 232, 232, 255]);
const EDGE_COLOR: Rgba<u8> = Rgba([32, 32, 32, 255]);

/// UVs further than this outside the unit square are not drawn.
const UV_DRAW_MARGIN: f32 = 1.0;

/// Where the UV panel came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UvLayoutSource {
    /// A texture embedded in or referenced by the model.
    Texture {
        /// The image name.
        name: String,
    },
    /// UV triangles drawn over a checker.
    Synthesized {
        /// Number of triangles drawn.
        triangles: usize,
    },
    /// A plain checker; the model has neither textures nor UVs.
    Placeholder,
}

/// Writes the UV panel for `scene` to `output` as PNG.
///
/// Textures are re-encoded at their native size; synthesized layouts are
/// `resolution` pixels square.
pub fn write_uv_layout(
    scene: &Scene,
    output: &Path,
    resolution: u32,
) -> Result<UvLayoutSource, UvLayoutError> {
    let save = |image: &RgbaImage| {
        image
            .save_with_format(output, ImageFormat::Png)
            .map_err(|source| UvLayoutError::Write {
                path: output.to_path_buf(),
                source,
            })
    };

    for id in scene.texture_candidates() {
        let texture = &scene.textures[id];
        if texture.data.is_empty() {
            continue;
        }
        match image::load_from_memory(&texture.data) {
            Ok(decoded) => {
                save(&decoded.to_rgba8())?;
                log::debug!("UV panel uses texture '{}'", texture.name);
                return Ok(UvLayoutSource::Texture {
                    name: texture.name.clone(),
                });
            }
            Err(e) => log::warn!("Texture '{}' could not be decoded: {e}", texture.name),
        }
    }

    let triangles: Vec<[Vec2; 3]> = scene
        .meshes
        .iter()
        .flat_map(|m| m.uv_triangles.iter().copied())
        .collect();
    let image = render_uv_layout(&triangles, resolution);
    save(&image)?;

    if triangles.is_empty() {
        log::debug!("UV panel is a placeholder: no textures or UVs");
        Ok(UvLayoutSource::Placeholder)
    } else {
        log::debug!("UV panel synthesized from {} triangle(s)", triangles.len());
        Ok(UvLayoutSource::Synthesized {
            triangles: triangles.len(),
        })
    }
}

/// Draws triangle edges in UV space over a checker background.
///
/// `u` maps to x and `v` to y, both scaled to the image edge. glTF places the UV
/// origin at the top-left, like image rows.
pub fn render_uv_layout(triangles: &[[Vec2; 3]], resolution: u32) -> RgbaImage {
    let size = resolution.max(1);
    let cell = (size / CHECKER_CELLS).max(1);
    let mut image = RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            CHECKER_LIGHT
        } else {
            CHECKER_DARK
        }
    });

    let scale = (size - 1) as f32;
    let in_range = |p: &Vec2| {
        (-UV_DRAW_MARGIN..=1.0 + UV_DRAW_MARGIN).contains(&p.x)
            && (-UV_DRAW_MARGIN..=1.0 + UV_DRAW_MARGIN).contains(&p.y)
    };
    let to_pixel = |p: Vec2| ((p.x * scale).round() as i64, (p.y * scale).round() as i64);

    for tri in triangles.iter().filter(|t| t.iter().all(in_range)) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            draw_line(&mut image, to_pixel(a), to_pixel(b), EDGE_COLOR);
        }
    }
    image
}

/// Bresenham line; pixels outside the image are skipped.
fn draw_line(image: &mut RgbaImage, from: (i64, i64), to: (i64, i64), color: Rgba<u8>) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (w, h) = (i64::from(image.width()), i64::from(image.height()));

    loop {
        if (0..w).contains(&x0) && (0..h).contains(&y0) {
            image.put_pixel(x0 as u32, y0 as u32, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_checker() {
        let image = render_uv_layout(&[], 64);
        assert_eq!(image.dimensions(), (64, 64));
        assert_eq!(*image.get_pixel(0, 0), CHECKER_LIGHT);
        assert_eq!(*image.get_pixel(4, 0), CHECKER_DARK);
        assert_eq!(*image.get_pixel(4, 4), CHECKER_LIGHT);
    }

    #[test]
    fn test_triangle_edges_are_drawn() {
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let image = render_uv_layout(&[tri], 101);
        // Top edge, left edge and the hypotenuse midpoint.
        assert_eq!(*image.get_pixel(50, 0), EDGE_COLOR);
        assert_eq!(*image.get_pixel(0, 50), EDGE_COLOR);
        assert_eq!(*image.get_pixel(50, 50), EDGE_COLOR);
        // Interior stays background.
        assert_ne!(*image.get_pixel(20, 20), EDGE_COLOR);
    }

    #[test]
    fn test_far_out_of_range_triangles_are_skipped() {
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(500.0, 0.0), Vec2::new(0.0, 1.0)];
        let image = render_uv_layout(&[tri], 32);
        assert!(image.pixels().all(|p| *p != EDGE_COLOR));
    }

    #[test]
    fn test_partially_outside_line_is_clipped() {
        let mut image = RgbaImage::new(10, 10);
        draw_line(&mut image, (-5, 5), (15, 5), EDGE_COLOR);
        assert!((0..10).all(|x| *image.get_pixel(x, 5) == EDGE_COLOR));
    }
}
