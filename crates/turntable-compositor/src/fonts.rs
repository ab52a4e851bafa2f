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

//! Text faces and the ordered strategy that picks one.
//!
//! The strategy walks a list of font files and takes the first that parses. When none
//! do, it falls back to [`BitmapFace`], which is compiled in and cannot fail, so
//! drawing text never fails a sheet.

use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};

/// Fonts tried in order before the built-in face: CJK-capable faces first.
pub const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\simhei.ttf",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/Library/Fonts/Arial Unicode.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

/// Something that can measure and draw a line of text.
pub trait TextFace: Send + Sync {
    /// A name for logs.
    fn name(&self) -> &str;

    /// Returns `true` if every non-whitespace character of `text` has a glyph.
    fn supports(&self, text: &str) -> bool;

    /// Width and height of `text` at `px`.
    fn measure(&self, text: &str, px: f32) -> (u32, u32);

    /// Draws `text` with its top-left corner at `(x, y)`. Pixels off the canvas are skipped.
    fn draw(&self, canvas: &mut RgbImage, text: &str, px: f32, x: i64, y: i64, color: Rgb<u8>);
}

/// A TrueType or OpenType face.
pub struct OutlineFace {
    name: String,
    font: FontVec,
}

impl OutlineFace {
    /// Parses the first face of a font file or collection.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Option<Self> {
        FontVec::try_from_vec_and_index(data, 0)
            .ok()
            .map(|font| Self {
                name: name.into(),
                font,
            })
    }

    /// Loads and parses a font file.
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read(path).ok()?;
        Self::from_bytes(path.display().to_string(), data)
    }
}

impl TextFace for OutlineFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, text: &str) -> bool {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .all(|c| self.font.glyph_id(c).0 != 0)
    }

    fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let mut width = 0.0f32;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        let height = scaled.ascent() - scaled.descent();
        (width.ceil().max(0.0) as u32, height.ceil().max(0.0) as u32)
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, px: f32, x: i64, y: i64, color: Rgb<u8>) {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let baseline = y as f32 + scaled.ascent();
        let mut caret = x as f32;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(px, point(caret, baseline));
            caret += scaled.h_advance(id);
            previous = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px_x = bounds.min.x as i64 + i64::from(gx);
                let px_y = bounds.min.y as i64 + i64::from(gy);
                blend(canvas, px_x, px_y, color, coverage);
            });
        }
    }
}

/// The compiled-in 8×8 ASCII face, scaled by whole pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFace;

impl BitmapFace {
    const CELL: u32 = 8;

    fn scale(px: f32) -> u32 {
        ((px / Self::CELL as f32).round() as u32).max(1)
    }

    fn glyph(c: char) -> [u8; 8] {
        let code = if c.is_ascii() { c as usize } else { '?' as usize };
        font8x8::legacy::BASIC_LEGACY[code]
    }
}

impl TextFace for BitmapFace {
    fn name(&self) -> &str {
        "built-in 8x8"
    }

    fn supports(&self, text: &str) -> bool {
        text.is_ascii()
    }

    fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        let cell = Self::CELL * Self::scale(px);
        (text.chars().count() as u32 * cell, cell)
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, px: f32, x: i64, y: i64, color: Rgb<u8>) {
        let scale = i64::from(Self::scale(px));
        let advance = i64::from(Self::CELL) * scale;
        for (i, c) in text.chars().enumerate() {
            let origin_x = x + i as i64 * advance;
            for (row, bits) in Self::glyph(c).iter().enumerate() {
                for col in 0..8 {
                    if bits >> col & 1 == 0 {
                        continue;
                    }
                    let cell_x = origin_x + col as i64 * scale;
                    let cell_y = y + row as i64 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            blend(canvas, cell_x + dx, cell_y + dy, color, 1.0);
                        }
                    }
                }
            }
        }
    }
}

fn blend(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    let a = coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in pixel.0.iter_mut().zip(color.0) {
        *dst = (f32::from(src) * a + f32::from(*dst) * (1.0 - a)).round() as u8;
    }
}

/// An ordered list of font files ending in the built-in face.
#[derive(Debug, Clone)]
pub struct FontStrategy {
    candidates: Vec<PathBuf>,
}

impl FontStrategy {
    /// Tries exactly `candidates`, then the built-in face.
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Tries `preferred` first, then [`DEFAULT_FONT_CANDIDATES`].
    pub fn with_preferred(preferred: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut candidates: Vec<PathBuf> = preferred.into_iter().collect();
        candidates.extend(DEFAULT_FONT_CANDIDATES.iter().map(PathBuf::from));
        Self { candidates }
    }

    /// Only the built-in face.
    pub fn builtin_only() -> Self {
        Self::new(Vec::new())
    }

    /// The files that will be tried, in order.
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Returns the first face that loads.
    pub fn resolve(&self) -> Box<dyn TextFace> {
        for path in &self.candidates {
            if let Some(face) = OutlineFace::load(path) {
                log::debug!("Using font '{}'", path.display());
                return Box::new(face);
            }
        }
        log::warn!("No system font found, using the built-in bitmap face");
        Box::new(BitmapFace)
    }
}

impl Default for FontStrategy {
    fn default() -> Self {
        Self::with_preferred(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_face_measures_whole_cells() {
        let face = BitmapFace;
        assert_eq!(face.measure("Front", 24.0), (5 * 24, 24));
        assert_eq!(face.measure("A", 3.0), (8, 8));
        assert!(face.supports("UV Layout"));
        assert!(!face.supports("正面"));
    }

    #[test]
    fn test_bitmap_face_draws_and_clips() {
        let mut canvas = RgbImage::from_pixel(16, 8, Rgb([255, 255, 255]));
        let face = BitmapFace;
        face.draw(&mut canvas, "H", 8.0, 0, 0, Rgb([0, 0, 0]));
        assert!(canvas.pixels().any(|p| p.0 == [0, 0, 0]));
        // The right half stays untouched.
        assert!((8..16).all(|x| (0..8).all(|y| canvas.get_pixel(x, y).0 == [255, 255, 255])));

        // Drawing far outside must not panic.
        face.draw(&mut canvas, "HH", 8.0, -100, 50, Rgb([0, 0, 0]));
    }

    #[test]
    fn test_strategy_falls_back_to_builtin() {
        let strategy = FontStrategy::new(vec![PathBuf::from("/nonexistent/font.ttf")]);
        assert_eq!(strategy.resolve().name(), "built-in 8x8");
        assert_eq!(FontStrategy::builtin_only().resolve().name(), "built-in 8x8");
    }

    #[test]
    fn test_preferred_fonts_come_first() {
        let strategy = FontStrategy::with_preferred([PathBuf::from("mine.ttf")]);
        assert_eq!(strategy.candidates()[0], PathBuf::from("mine.ttf"));
        assert_eq!(strategy.candidates().len(), DEFAULT_FONT_CANDIDATES.len() + 1);
    }

    #[test]
    fn test_garbage_is_not_a_font() {
        assert!(OutlineFace::from_bytes("junk", vec![1, 2, 3]).is_none());
    }
}
