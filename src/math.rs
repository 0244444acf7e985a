//! Quaternion algebra and nalgebra extensions shared by the fusion filters.

use nalgebra::{Quaternion, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Norm below which a vector or quaternion is treated as degenerate.
pub const NORM_EPSILON: f32 = 1e-6;

/// Above this dot-product magnitude slerp switches to linear interpolation,
/// since the spherical denominator approaches zero.
const SLERP_LERP_THRESHOLD: f32 = 0.9995;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Calculate the magnitude of the vector
    fn magnitude(&self) -> f32;

    /// Normalize the vector, returning zero vector if magnitude is near zero
    fn safe_normalize(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = self.magnitude();
        if mag < NORM_EPSILON {
            Vector3::zeros()
        } else {
            *self / mag
        }
    }
}

/// Extension trait providing the quaternion operations the fusion filters
/// are built from.
///
/// All operations are pure: they return new values and never mutate their
/// arguments. Unit norm is a convention, not an enforced invariant; callers
/// normalize explicitly where the filter state requires it.
pub trait QuaternionExt {
    /// Scale to unit norm, leaving the value unchanged if the norm is
    /// below [`NORM_EPSILON`].
    fn normalized_or_self(&self) -> Quaternion<f32>;

    /// Spherical linear interpolation from `self` toward `target`.
    ///
    /// When the dot product is negative a local copy of `target` is negated
    /// so interpolation takes the shorter arc; the caller's value is never
    /// touched. Near-parallel inputs fall back to linear interpolation plus
    /// renormalization.
    fn slerp_toward(&self, target: &Quaternion<f32>, t: f32) -> Quaternion<f32>;

    /// Gravity direction in the body frame predicted by this orientation.
    fn predicted_gravity(&self) -> Vector3<f32>;

    /// Write a column-major 4x4 homogeneous rotation matrix suitable for an
    /// OpenGL model transform.
    fn write_gl_matrix(&self, out: &mut [f32; 16]);

    /// Build a rotation of `angle_degrees` about `axis`.
    ///
    /// A degenerate axis (norm below [`NORM_EPSILON`]) yields the identity
    /// quaternion rather than an error.
    fn from_axis_angle_degrees(axis: Vector3<f32>, angle_degrees: f32) -> Quaternion<f32>;

    /// Build a quaternion from pitch/roll/yaw in radians using the half-angle
    /// combination (roll about X, pitch about Y, yaw about Z).
    fn from_attitude(pitch: f32, roll: f32, yaw: f32) -> Quaternion<f32>;

    /// [`QuaternionExt::from_attitude`] with arguments in degrees.
    fn from_attitude_degrees(pitch: f32, roll: f32, yaw: f32) -> Quaternion<f32>;

    /// Rotation about the vertical (Z) axis, in degrees.
    fn from_yaw_degrees(yaw_degrees: f32) -> Quaternion<f32>;
}

impl QuaternionExt for Quaternion<f32> {
    fn normalized_or_self(&self) -> Quaternion<f32> {
        let n = self.norm();
        if n < NORM_EPSILON {
            *self
        } else {
            *self * (1.0 / n)
        }
    }

    fn slerp_toward(&self, target: &Quaternion<f32>, t: f32) -> Quaternion<f32> {
        let mut end = *target;
        let mut dot = self.dot(&end);

        // Shortest-path correction on a local copy.
        if dot < 0.0 {
            end = -end;
            dot = -dot;
        }

        if dot > SLERP_LERP_THRESHOLD {
            let lerped = *self + (end - *self) * t;
            return lerped.normalized_or_self();
        }

        let theta = dot.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let scale_start = ((1.0 - t) * theta).sin() / sin_theta;
        let scale_end = (t * theta).sin() / sin_theta;

        *self * scale_start + end * scale_end
    }

    fn predicted_gravity(&self) -> Vector3<f32> {
        Vector3::new(
            2.0 * (self.i * self.k - self.w * self.j),
            2.0 * (self.w * self.i + self.j * self.k),
            self.w * self.w - self.i * self.i - self.j * self.j + self.k * self.k,
        )
    }

    fn write_gl_matrix(&self, out: &mut [f32; 16]) {
        let (w, x, y, z) = (self.w, self.i, self.j, self.k);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        out[0] = 1.0 - 2.0 * (yy + zz);
        out[1] = 2.0 * (xy + wz);
        out[2] = 2.0 * (xz - wy);
        out[3] = 0.0;

        out[4] = 2.0 * (xy - wz);
        out[5] = 1.0 - 2.0 * (xx + zz);
        out[6] = 2.0 * (yz + wx);
        out[7] = 0.0;

        out[8] = 2.0 * (xz + wy);
        out[9] = 2.0 * (yz - wx);
        out[10] = 1.0 - 2.0 * (xx + yy);
        out[11] = 0.0;

        out[12] = 0.0;
        out[13] = 0.0;
        out[14] = 0.0;
        out[15] = 1.0;
    }

    fn from_axis_angle_degrees(axis: Vector3<f32>, angle_degrees: f32) -> Quaternion<f32> {
        let norm = axis.magnitude();
        if norm < NORM_EPSILON {
            return Quaternion::identity();
        }

        let half = angle_degrees * DEG_TO_RAD * 0.5;
        let (sin_half, cos_half) = half.sin_cos();
        let unit = axis / norm;

        Quaternion::new(
            cos_half,
            unit.x * sin_half,
            unit.y * sin_half,
            unit.z * sin_half,
        )
    }

    fn from_attitude(pitch: f32, roll: f32, yaw: f32) -> Quaternion<f32> {
        let (sy, cy) = (yaw * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sr, cr) = (roll * 0.5).sin_cos();

        Quaternion::new(
            cr * cp * cy + sr * sp * sy,
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
        )
    }

    fn from_attitude_degrees(pitch: f32, roll: f32, yaw: f32) -> Quaternion<f32> {
        Self::from_attitude(pitch * DEG_TO_RAD, roll * DEG_TO_RAD, yaw * DEG_TO_RAD)
    }

    fn from_yaw_degrees(yaw_degrees: f32) -> Quaternion<f32> {
        let half = yaw_degrees * DEG_TO_RAD * 0.5;
        Quaternion::new(half.cos(), 0.0, 0.0, half.sin())
    }
}
