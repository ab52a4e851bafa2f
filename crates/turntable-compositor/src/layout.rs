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

//! Grid geometry of the sheet.
//!
//! ```text
//! +--------------------------- title band (t) ----------------------------+
//! | p | label (l) | p | label | p | label | p | label | p |
//! |   | image (h) |   | image |   | image |   | image |   |
//! | p                                                      |
//! |   | label     |   | label |   | label |   | label |   |
//! |   | image     |   | image |   | image |   | image |   |
//! | p                                                      |
//! +--------------------------------------------------------+
//! ```

use serde::{Deserialize, Serialize};

/// Spacing, typography and encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Gap between panels and around the grid, in pixels.
    pub padding: u32,
    /// Height of the title band.
    pub title_height: u32,
    /// Height of the label band above each image.
    pub label_height: u32,
    /// Title size in pixels.
    pub title_font_px: f32,
    /// Label size in pixels.
    pub label_font_px: f32,
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            padding: 10,
            title_height: 40,
            label_height: 30,
            title_font_px: 36.0,
            label_font_px: 24.0,
            jpeg_quality: 95,
        }
    }
}

/// Pixel geometry for one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayout {
    /// Width of every panel image.
    pub panel_width: u32,
    /// Height of every panel image.
    pub panel_height: u32,
    /// `p`.
    pub padding: u32,
    /// `t`.
    pub title_height: u32,
    /// `l`.
    pub label_height: u32,
}

impl CompositeLayout {
    /// Panels per row.
    pub const COLUMNS: u32 = 4;
    /// Rows of panels.
    pub const ROWS: u32 = 2;

    /// Layout for panels of `panel_width` × `panel_height`.
    pub fn new(panel_width: u32, panel_height: u32, options: &LayoutOptions) -> Self {
        Self {
            panel_width,
            panel_height,
            padding: options.padding,
            title_height: options.title_height,
            label_height: options.label_height,
        }
    }

    /// `(4w + 5p, 2(h + l) + 3p + t)`, or `None` on overflow.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        let width = self
            .panel_width
            .checked_mul(Self::COLUMNS)?
            .checked_add(self.padding.checked_mul(Self::COLUMNS + 1)?)?;
        let height = self
            .panel_height
            .checked_add(self.label_height)?
            .checked_mul(Self::ROWS)?
            .checked_add(self.padding.checked_mul(Self::ROWS + 1)?)?
            .checked_add(self.title_height)?;
        Some((width, height))
    }

    /// Top-left of the label band of grid slot `slot` (row-major).
    pub fn panel_origin(&self, slot: usize) -> (u32, u32) {
        let slot = slot as u32;
        let col = slot % Self::COLUMNS;
        let row = slot / Self::COLUMNS;
        (
            self.padding + col * (self.panel_width + self.padding),
            self.title_height
                + self.padding
                + row * (self.panel_height + self.label_height + self.padding),
        )
    }

    /// Top-left of the image of grid slot `slot`.
    pub fn image_origin(&self, slot: usize) -> (u32, u32) {
        let (x, y) = self.panel_origin(slot);
        (x, y + self.label_height)
    }
}
