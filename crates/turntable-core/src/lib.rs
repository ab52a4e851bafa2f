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

//! # Turntable Core
//!
//! Foundational crate containing the math primitives, the scene model, the view rig
//! geometry and the renderer contract shared by every other turntable crate.

#![warn(missing_docs)]

pub mod bounds;
pub mod display_mode;
pub mod math;
pub mod renderer;
pub mod rig;
pub mod scene;

pub use bounds::{compute_bounds, scene_bounds, BoundsError};
pub use display_mode::{DisplayModeController, DisplayModeError, DisplayModeSnapshot};
pub use renderer::{RenderBackend, RenderError, RenderJob, RenderPass, RenderSettings};
pub use rig::{ViewKind, ViewRig, ViewSpec};
pub use scene::Scene;

/// File name of the assembled sheet for `model_name`: `{model}_eight_views.jpg`.
pub fn composite_file_name(model_name: &str) -> String {
    format!("{model_name}_eight_views.jpg")
}
