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

//! Defines the four-light studio rig and the world environment.
//!
//! Every light is a sun: only its direction matters to the renderer, but the position is
//! kept so the rig can be inspected and placed as a visible object.

use serde::{Deserialize, Serialize};

use crate::math::{Aabb, LinearRgba, Vec3};

/// The part a light plays in the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightRole {
    /// The main light, front right and above.
    Key,
    /// Softer light from the left that lifts the shadows.
    Fill,
    /// Rim light from behind.
    Back,
    /// Overhead light.
    Top,
}

/// A sun light aimed at the box center.
///
/// # Examples
///
/// ```
/// use turntable_core::math::{Aabb, Vec3};
/// use turntable_core::rig::{derive_lights, LightRole};
///
/// let bounds = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(2.0));
/// let key = derive_lights(&bounds)[0];
/// assert_eq!(key.role, LightRole::Key);
/// assert!(key.direction.z < 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSpec {
    /// The role of the light.
    pub role: LightRole,
    /// World-space position.
    pub position: Vec3,
    /// Normalized direction from the light towards the box center.
    pub direction: Vec3,
    /// Sun strength.
    pub intensity: f32,
    /// Angular diameter of the sun in radians. Larger values soften shadows.
    pub angular_softness: f32,
    /// Light color.
    pub color: LinearRgba,
}

struct LightPreset {
    role: LightRole,
    offset: Vec3,
    intensity: f32,
    angular_softness: f32,
}

const PRESETS: [LightPreset; 4] = [
    LightPreset {
        role: LightRole::Key,
        offset: Vec3::new(1.0, -1.0, 1.5),
        intensity: 2.0,
        angular_softness: 0.1,
    },
    LightPreset {
        role: LightRole::Fill,
        offset: Vec3::new(-1.5, 0.0, 0.8),
        intensity: 1.5,
        angular_softness: 0.2,
    },
    LightPreset {
        role: LightRole::Back,
        offset: Vec3::new(0.0, 1.5, 1.0),
        intensity: 1.8,
        angular_softness: 0.15,
    },
    LightPreset {
        role: LightRole::Top,
        offset: Vec3::new(0.0, 0.0, 2.0),
        intensity: 1.0,
        angular_softness: 0.3,
    },
];

/// Builds the key, fill, back and top lights for `bounds`, in that order.
pub fn derive_lights(bounds: &Aabb) -> [LightSpec; 4] {
    let center = bounds.center();
    let d = bounds.framing_extent();
    PRESETS.map(|preset| {
        let position = center + preset.offset * d;
        LightSpec {
            role: preset.role,
            position,
            direction: (center - position).normalize(),
            intensity: preset.intensity,
            angular_softness: preset.angular_softness,
            color: LinearRgba::WHITE,
        }
    })
}

/// The world background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Background color.
    pub color: LinearRgba,
    /// Background emission strength.
    pub strength: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            strength: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rig_scales_with_bounds() {
        let bounds = Aabb::from_min_max(Vec3::new(-5.0, -5.0, 0.0), Vec3::new(5.0, 5.0, 4.0));
        let lights = derive_lights(&bounds);
        let center = bounds.center();

        let roles: Vec<LightRole> = lights.iter().map(|l| l.role).collect();
        assert_eq!(roles, [LightRole::Key, LightRole::Fill, LightRole::Back, LightRole::Top]);

        let key = lights[0];
        assert_relative_eq!(key.position.x, center.x + 10.0);
        assert_relative_eq!(key.position.y, center.y - 10.0);
        assert_relative_eq!(key.position.z, center.z + 15.0);
        assert_relative_eq!(key.intensity, 2.0);

        let top = lights[3];
        assert_relative_eq!(top.direction.z, -1.0);
    }

    #[test]
    fn test_every_light_points_at_center() {
        let bounds = Aabb::from_min_max(Vec3::splat(1.0), Vec3::new(2.0, 4.0, 8.0));
        for light in derive_lights(&bounds) {
            let expected = (bounds.center() - light.position).normalize();
            assert_relative_eq!(light.direction.x, expected.x);
            assert_relative_eq!(light.direction.y, expected.y);
            assert_relative_eq!(light.direction.z, expected.z);
            assert_relative_eq!(light.direction.length(), 1.0, epsilon = 1e-6);
        }
    }
}
