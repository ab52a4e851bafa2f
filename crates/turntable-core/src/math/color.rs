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

//! Defines the `LinearRgba` color type used for material base colors.

use serde::{Deserialize, Serialize};

/// Represents a color in a **linear RGBA** color space using `f32` components.
///
/// glTF base color factors are already linear, so imported materials carry them
/// through unchanged. Conversion to 8-bit sRGB happens only when a color is painted
/// into a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRgba {
    /// The red component in linear space.
    pub r: f32,
    /// The green component in linear space.
    pub g: f32,
    /// The blue component in linear space.
    pub b: f32,
    /// The alpha (opacity) component.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white (`[1.0, 1.0, 1.0, 1.0]`).
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black (`[0.0, 0.0, 0.0, 1.0]`).
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// The flat gray used for solid display overrides (`[0.8, 0.8, 0.8, 1.0]`).
    pub const NEUTRAL_GRAY: Self = Self::rgb(0.8, 0.8, 0.8);

    /// Creates a new `LinearRgba` with explicit RGBA values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a new opaque `LinearRgba` (alpha = 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a `LinearRgba` from a `[r, g, b, a]` array, as found in glTF material factors.
    #[inline]
    pub const fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    /// Converts to 8-bit sRGB with straight alpha.
    pub fn to_srgba8(&self) -> [u8; 4] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            quantize(linear_to_srgb(self.r)),
            quantize(linear_to_srgb(self.g)),
            quantize(linear_to_srgb(self.b)),
            quantize(self.a),
        ]
    }
}

impl Default for LinearRgba {
    /// Returns opaque white, the glTF default base color.
    fn default() -> Self {
        Self::WHITE
    }
}

/// Converts a linear component to sRGB space.
#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgba8_extremes() {
        assert_eq!(LinearRgba::WHITE.to_srgba8(), [255, 255, 255, 255]);
        assert_eq!(LinearRgba::BLACK.to_srgba8(), [0, 0, 0, 255]);
        assert_eq!(LinearRgba::new(2.0, -1.0, 0.0, 0.0).to_srgba8(), [255, 0, 0, 0]);
    }

    #[test]
    fn test_neutral_gray_is_brightened_by_gamma() {
        let [r, g, b, _] = LinearRgba::NEUTRAL_GRAY.to_srgba8();
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!(r > 204);
    }
}
