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

//! Defines the `Mat4` type used for node world transforms and camera bases.

use super::{Quaternion, Vec3, Vec4};
use std::ops::Mul;

/// A 4x4 column-major matrix, used for 3D affine transformations.
///
/// The column-major layout matches glTF's `node.matrix`, so imported transforms can be
/// copied in without transposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a matrix from a column-major `[[f32; 4]; 4]`, as returned by
    /// `gltf::scene::Transform::matrix`.
    #[inline]
    pub fn from_cols_array_2d(m: &[[f32; 4]; 4]) -> Self {
        let col = |c: &[f32; 4]| Vec4::new(c[0], c[1], c[2], c[3]);
        Self::from_cols(col(&m[0]), col(&m[1]), col(&m[2]), col(&m[3]))
    }

    /// Creates a rotation matrix whose columns are the given orthonormal basis vectors.
    #[inline]
    pub fn from_basis(x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        Self::from_cols(
            Vec4::from_vec3(x_axis, 0.0),
            Vec4::from_vec3(y_axis, 0.0),
            Vec4::from_vec3(z_axis, 0.0),
            Vec4::W,
        )
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::from_vec3(v, 1.0))
    }

    /// Non-uniform scale along the world axes.
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_basis(Vec3::X * scale.x, Vec3::Y * scale.y, Vec3::Z * scale.z)
    }

    /// Rotation of `angle` radians about world up (+Z).
    pub fn from_rotation_z(angle: f32) -> Self {
        Self::from_quat(Quaternion::from_axis_angle(Vec3::Z, angle))
    }

    /// Rotation matrix for `q`: its columns are the rotated unit axes.
    pub fn from_quat(q: Quaternion) -> Self {
        let q = q.normalize();
        Self::from_basis(q * Vec3::X, q * Vec3::Y, q * Vec3::Z)
    }

    /// Transforms a point (`w = 1`), applying translation.
    #[inline]
    pub fn transform_point3(&self, p: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(p, 1.0)).truncate()
    }

    /// Transforms a direction (`w = 0`), ignoring translation.
    #[inline]
    pub fn transform_vector3(&self, v: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(v, 0.0)).truncate()
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Composes two transforms. `a * b` applies `b` first.
    fn mul(self, rhs: Mat4) -> Self::Output {
        Self {
            cols: rhs.cols.map(|col| self * col),
        }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        let [x, y, z, w] = self.cols;
        x * rhs.x + y * rhs.y + z * rhs.z + w * rhs.w
    }
}
