//! Rotation-vector encoding of an Euler-angle orientation.

use nalgebra::Quaternion;

use crate::math::QuaternionExt;
use crate::types::EulerAngles;

/// Encode an orientation as the three-component rotation vector reported by
/// a platform rotation-vector sensor.
///
/// The attitude is first converted to a unit quaternion, then re-expanded
/// through the axis-angle form: with `θ = 2·acos(w)`, the components are the
/// quaternion vector part scaled by `sin(θ/2)`. This matches the wire format
/// consumers of the virtual sensor expect.
///
/// # Example
/// ```
/// use rotation_vector::{rotation_vector, EulerAngles};
///
/// let level = rotation_vector(EulerAngles::default());
/// assert_eq!(level, [0.0, 0.0, 0.0]);
/// ```
pub fn rotation_vector(angles: EulerAngles) -> [f32; 3] {
    let q = Quaternion::from_attitude_degrees(angles.pitch, angles.roll, angles.yaw);

    let half_theta = q.w.clamp(-1.0, 1.0).acos();
    let s = half_theta.sin();

    [q.i * s, q.j * s, q.k * s]
}
