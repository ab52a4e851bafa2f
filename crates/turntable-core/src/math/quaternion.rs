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

//! Provides a Quaternion type for representing camera orientations.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

use super::{Mat4, Vec3, EPSILON};

/// Represents a unit quaternion rotation stored as `(x, y, z, w)`.
///
/// The external renderer consumes orientations as XYZ Euler angles, so this type
/// converts both ways with [`Quaternion::from_euler_xyz`] and [`Quaternion::to_euler_xyz`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// The x component of the vector part.
    pub x: f32,
    /// The y component of the vector part.
    pub y: f32,
    /// The z component of the vector part.
    pub z: f32,
    /// The scalar (real) part.
    pub w: f32,
}

impl Quaternion {
    /// The identity quaternion, representing no rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a new quaternion from its raw components.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis`. The axis need not be normalized.
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        let v = axis.normalize() * sin;
        Self::new(v.x, v.y, v.z, cos)
    }

    /// Creates a rotation from XYZ Euler angles in radians.
    ///
    /// The X rotation is applied first, then Y, then Z (`R = Rz * Ry * Rx`).
    pub fn from_euler_xyz(x: f32, y: f32, z: f32) -> Self {
        let qx = Self::from_axis_angle(Vec3::X, x);
        let qy = Self::from_axis_angle(Vec3::Y, y);
        let qz = Self::from_axis_angle(Vec3::Z, z);
        (qz * qy * qx).normalize()
    }

    /// Decomposes the rotation into XYZ Euler angles in radians.
    ///
    /// Inverse of [`Quaternion::from_euler_xyz`]. At the gimbal-lock pole the Z angle is
    /// pinned to zero.
    pub fn to_euler_xyz(&self) -> Vec3 {
        let m = Mat4::from_quat(self.normalize());
        let m20 = m.cols[0].z;
        let y = (-m20).clamp(-1.0, 1.0).asin();
        if m20.abs() < 1.0 - EPSILON {
            let x = m.cols[1].z.atan2(m.cols[2].z);
            let z = m.cols[0].y.atan2(m.cols[0].x);
            Vec3::new(x, y, z)
        } else {
            let x = (-m.cols[2].y).atan2(m.cols[1].y);
            Vec3::new(x, y, 0.0)
        }
    }

    /// Extracts the rotation held in the upper 3x3 block of `m`.
    ///
    /// Picks the largest of `w, x, y, z` as the pivot to keep the square root well
    /// conditioned.
    pub fn from_rotation_matrix(m: &Mat4) -> Self {
        let [c0, c1, c2] = [m.cols[0], m.cols[1], m.cols[2]];
        // r[row][col]
        let r = [
            [c0.x, c1.x, c2.x],
            [c0.y, c1.y, c2.y],
            [c0.z, c1.z, c2.z],
        ];
        let diagonal = [r[0][0], r[1][1], r[2][2]];
        let trace = diagonal.iter().sum::<f32>();

        let q = if trace > 0.0 {
            let k = 0.5 / (trace + 1.0).sqrt();
            Self::new(
                (r[2][1] - r[1][2]) * k,
                (r[0][2] - r[2][0]) * k,
                (r[1][0] - r[0][1]) * k,
                0.25 / k,
            )
        } else {
            // Cyclic index of the dominant diagonal entry.
            let i = if diagonal[0] >= diagonal[1] && diagonal[0] >= diagonal[2] {
                0
            } else if diagonal[1] >= diagonal[2] {
                1
            } else {
                2
            };
            let (j, k) = ((i + 1) % 3, (i + 2) % 3);
            let root = (1.0 + r[i][i] - r[j][j] - r[k][k]).sqrt();
            let half = 0.5 / root;
            let mut v = [0.0f32; 3];
            v[i] = 0.5 * root;
            v[j] = (r[j][i] + r[i][j]) * half;
            v[k] = (r[k][i] + r[i][k]) * half;
            Self::new(v[0], v[1], v[2], (r[k][j] - r[j][k]) * half)
        };
        q.normalize()
    }

    /// Euclidean norm over all four components.
    #[inline]
    pub fn magnitude(&self) -> f32 {
        (self.vector().length_squared() + self.w * self.w).sqrt()
    }

    #[inline]
    fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Returns a unit-length copy. A zero quaternion normalizes to the identity.
    #[inline]
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > EPSILON {
            let inv = 1.0 / mag;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Applies the rotation to `v`. Assumes a unit quaternion.
    #[inline]
    pub fn rotate_vec3(&self, v: Vec3) -> Vec3 {
        let u = self.vector();
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Quaternion> for Quaternion {
    type Output = Self;
    /// Hamilton product. `a * b` applies `b` first.
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        let (a, b) = (self.vector(), rhs.vector());
        let v = b * self.w + a * rhs.w + a.cross(b);
        Self::new(v.x, v.y, v.z, self.w * rhs.w - a.dot(b))
    }
}

impl Mul<Vec3> for Quaternion {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: Vec3) -> Self::Output {
        self.rotate_vec3(rhs)
    }
}
