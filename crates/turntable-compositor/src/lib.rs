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

//! # Turntable Compositor
//!
//! Turns eight per-view rasters into a single 4×2 labelled sheet and encodes it as
//! JPEG. Layout is pure arithmetic over the front panel's size, so the output is
//! deterministic for a given set of inputs and font.

#![warn(missing_docs)]

mod compose;
pub mod error;
pub mod fonts;
pub mod layout;

pub use compose::{flatten_onto_white, Compositor};
pub use error::CompositeError;
pub use fonts::{BitmapFace, FontStrategy, OutlineFace, TextFace, DEFAULT_FONT_CANDIDATES};
pub use layout::{CompositeLayout, LayoutOptions};
