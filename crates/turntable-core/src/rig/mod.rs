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

//! Derives cameras and lights from a bounding box.
//!
//! Everything here is a pure function of an [`Aabb`]: the same box always yields the
//! same rig, and a new box requires a new rig.

mod light;
mod view;

pub use self::light::*;
pub use self::view::*;

use serde::{Deserialize, Serialize};

use crate::math::Aabb;

/// The complete rig for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRig {
    /// The box the rig was derived from.
    pub bounds: Aabb,
    /// One spec per view, in [`ViewKind::ALL`] order.
    pub views: [ViewSpec; 8],
    /// Key, fill, back and top lights.
    pub lights: [LightSpec; 4],
}

impl ViewRig {
    /// Derives views and lights for `bounds`.
    pub fn from_bounds(bounds: Aabb) -> Self {
        Self {
            bounds,
            views: derive_views(&bounds),
            lights: derive_lights(&bounds),
        }
    }

    /// Returns the spec for `kind`.
    pub fn view(&self, kind: ViewKind) -> &ViewSpec {
        // `ViewKind::ALL` follows declaration order.
        &self.views[kind as usize]
    }
}
