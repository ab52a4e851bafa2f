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

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use turntable_core::rig::RenderedViews;
use turntable_core::ViewKind;

use crate::error::CompositeError;
use crate::fonts::{FontStrategy, TextFace};
use crate::layout::{CompositeLayout, LayoutOptions};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Assembles eight rendered panels into one labelled sheet.
pub struct Compositor {
    options: LayoutOptions,
    face: Box<dyn TextFace>,
}

impl Compositor {
    /// Creates a compositor, resolving a face from `fonts`.
    pub fn new(options: LayoutOptions, fonts: &FontStrategy) -> Self {
        Self::with_face(options, fonts.resolve())
    }

    /// Creates a compositor with an explicit face.
    pub fn with_face(options: LayoutOptions, face: Box<dyn TextFace>) -> Self {
        log::debug!("Compositor using face '{}'", face.name());
        Self { options, face }
    }

    /// The active layout options.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Loads the eight images in `views`, lays them out and writes a JPEG to `output`.
    ///
    /// Nothing is written unless every view is present and decodes. The file appears
    /// atomically: it is encoded next to `output` and then renamed over it.
    ///
    /// # Errors
    ///
    /// [`CompositeError::MissingView`] lists every view that is absent from `views` or
    /// whose file does not exist, in sheet order. Decoding,
    /// layout and write failures map to the other variants.
    pub fn compose(
        &self,
        views: &RenderedViews,
        title: &str,
        output: &Path,
    ) -> Result<PathBuf, CompositeError> {
        // A view counts as present only when its raster exists on disk.
        let missing: Vec<ViewKind> = ViewKind::COMPOSITE_ORDER
            .into_iter()
            .filter(|kind| !views.get(kind).is_some_and(|path| path.is_file()))
            .collect();
        if !missing.is_empty() {
            return Err(CompositeError::MissingView(missing));
        }

        let mut panels = BTreeMap::new();
        for kind in ViewKind::COMPOSITE_ORDER {
            let path = &views[&kind];
            let decoded = image::open(path).map_err(|source| CompositeError::Decode {
                view: kind,
                path: path.clone(),
                source,
            })?;
            panels.insert(kind, flatten_onto_white(decoded));
        }

        let sheet = self.render_sheet(&panels, title)?;
        self.write_jpeg(&sheet, output)?;
        log::info!(
            "Wrote sheet '{}' ({}x{})",
            output.display(),
            sheet.width(),
            sheet.height()
        );
        Ok(output.to_path_buf())
    }

    /// Lays out already decoded panels. Panel size comes from the front view; other
    /// panels are resized to it.
    pub fn render_sheet(
        &self,
        panels: &BTreeMap<ViewKind, RgbImage>,
        title: &str,
    ) -> Result<RgbImage, CompositeError> {
        let missing: Vec<ViewKind> = ViewKind::COMPOSITE_ORDER
            .into_iter()
            .filter(|kind| !panels.contains_key(kind))
            .collect();
        let Some(front) = panels.get(&ViewKind::Front).filter(|_| missing.is_empty()) else {
            return Err(CompositeError::MissingView(missing));
        };

        let (panel_w, panel_h) = front.dimensions();
        if panel_w == 0 || panel_h == 0 {
            return Err(CompositeError::Layout(format!(
                "front view is {panel_w}x{panel_h}"
            )));
        }
        let layout = CompositeLayout::new(panel_w, panel_h, &self.options);
        let (canvas_w, canvas_h) = layout.canvas_size().ok_or_else(|| {
            CompositeError::Layout(format!("{panel_w}x{panel_h} panels overflow the canvas"))
        })?;

        let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, BACKGROUND);

        let (title_w, _) = self.face.measure(title, self.options.title_font_px);
        let title_x = (i64::from(canvas_w) - i64::from(title_w)) / 2;
        let title_y = i64::from(self.options.padding / 2);
        self.face.draw(
            &mut canvas,
            title,
            self.options.title_font_px,
            title_x,
            title_y,
            INK,
        );

        for (slot, kind) in ViewKind::COMPOSITE_ORDER.into_iter().enumerate() {
            let panel = &panels[&kind];
            let (x, y) = layout.panel_origin(slot);
            self.draw_label(&mut canvas, kind, &layout, x, y);

            let (img_x, img_y) = layout.image_origin(slot);
            if panel.dimensions() == (panel_w, panel_h) {
                imageops::replace(&mut canvas, panel, i64::from(img_x), i64::from(img_y));
            } else {
                log::debug!(
                    "Resizing {} panel from {:?} to {panel_w}x{panel_h}",
                    kind,
                    panel.dimensions()
                );
                let resized = imageops::resize(panel, panel_w, panel_h, FilterType::Triangle);
                imageops::replace(&mut canvas, &resized, i64::from(img_x), i64::from(img_y));
            }
        }

        Ok(canvas)
    }

    fn draw_label(
        &self,
        canvas: &mut RgbImage,
        kind: ViewKind,
        layout: &CompositeLayout,
        x: u32,
        y: u32,
    ) {
        let px = self.options.label_font_px;
        let text = if self.face.supports(kind.label()) {
            kind.label()
        } else {
            kind.caption()
        };
        let (text_w, text_h) = self.face.measure(text, px);
        let text_x = i64::from(x) + (i64::from(layout.panel_width) - i64::from(text_w)) / 2;
        let text_y = i64::from(y) + (i64::from(layout.label_height) - i64::from(text_h)) / 2;
        self.face.draw(canvas, text, px, text_x, text_y, INK);
    }

    fn write_jpeg(&self, sheet: &RgbImage, output: &Path) -> Result<(), CompositeError> {
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let temp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let file: &File = temp.as_file();
            let mut writer = BufWriter::new(file);
            let quality = self.options.jpeg_quality.clamp(1, 100);
            JpegEncoder::new_with_quality(&mut writer, quality)
                .encode_image(sheet)
                .map_err(CompositeError::Encode)?;
            std::io::Write::flush(&mut writer)?;
        }
        temp.persist(output).map_err(|e| CompositeError::Io(e.error))?;
        Ok(())
    }
}

/// Converts any decoded image to RGB, blending transparent pixels onto white.
pub fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let a = f32::from(src.0[3]) / 255.0;
        for c in 0..3 {
            let value = f32::from(src.0[c]) * a + 255.0 * (1.0 - a);
            dst.0[c] = value.round() as u8;
        }
    }
    out
}
