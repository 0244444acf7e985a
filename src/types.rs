//! Core types and configuration for the rotation-vector fusion pipeline.

use nalgebra::{Quaternion, Vector3};

/// Gravity magnitude the stillness detector compares against, m/s².
pub const STANDARD_GRAVITY: f32 = 9.8;

/// Ambient temperature assumed when the platform reports none, °C.
pub const DEFAULT_TEMPERATURE_C: f32 = 25.0;

/// Fusion filter settings
///
/// Every tunable of the estimator, integrator and smoothing stage is a named
/// option here; the defaults reproduce the reference tuning.
///
/// # Example
/// ```
/// use rotation_vector::FusionSettings;
///
/// let settings = FusionSettings {
///     angle_blend_k: 0.95,             // trust the gyroscope more
///     stillness_sample_threshold: 100, // be slower to recalibrate
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FusionSettings {
    /// Low-pass coefficient for the running gravity estimate (typically 0.90)
    ///
    /// Each accelerometer sample is blended as
    /// `g = alpha * g_prev + (1 - alpha) * corrected`.
    pub gravity_low_pass_alpha: f32,
    /// Complementary blend weight favoring the gyro-integrated angle
    /// (typically 0.90)
    ///
    /// Applied when accelerometer-derived pitch/roll and magnetometer-derived
    /// yaw are folded into the held angles.
    pub angle_blend_k: f32,
    /// Consecutive qualifying accelerometer samples required before a bias
    /// nudge fires (typically 50)
    pub stillness_sample_threshold: u32,
    /// Tolerance around standard gravity for a sample to qualify as still,
    /// in m/s² (typically 0.1)
    pub stillness_tolerance: f32,
    /// Slerp factor of the per-frame smoothing stage (typically 0.1)
    pub quaternion_smooth_factor: f32,
    /// Proportional gain of the integrator's accelerometer correction
    /// (typically 0.02)
    pub accel_correction_gain: f32,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            gravity_low_pass_alpha: 0.90,
            angle_blend_k: 0.90,
            stillness_sample_threshold: 50,
            stillness_tolerance: 0.1,
            quaternion_smooth_factor: 0.1,
            accel_correction_gain: 0.02,
        }
    }
}

/// Orientation estimate in degrees.
///
/// Owned exclusively by its estimator; consumers receive it by value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

/// One timestamped reading from a sensor-event source.
///
/// Units follow the platform sensor conventions: accelerometer in m/s² with
/// an optional ambient temperature in °C, gyroscope in rad/s with a monotonic
/// nanosecond timestamp, magnetometer in µT.
#[derive(Debug, Clone, Copy)]
pub enum ImuSample {
    Accelerometer {
        acceleration: Vector3<f32>,
        temperature_c: f32,
    },
    Gyroscope {
        angular_rate: Vector3<f32>,
        timestamp_ns: u64,
    },
    Magnetometer {
        field: Vector3<f32>,
    },
}

/// Display rotation of the host device.
///
/// Keys the compensation quaternion composed in front of the fused
/// orientation before it is handed to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenRotation {
    /// Natural orientation
    #[default]
    Rot0,
    /// Rotated 90 degrees
    Rot90,
    /// Rotated 180 degrees
    Rot180,
    /// Rotated 270 degrees
    Rot270,
}

impl ScreenRotation {
    /// Compensation yaw about the vertical axis, in degrees.
    pub fn yaw_degrees(self) -> f32 {
        match self {
            ScreenRotation::Rot0 => 0.0,
            ScreenRotation::Rot90 => -90.0,
            ScreenRotation::Rot180 => -180.0,
            ScreenRotation::Rot270 => -270.0,
        }
    }
}

/// Per-frame orientation snapshot published to the rendering consumer.
///
/// Always handed out by value so the render thread never shares mutable
/// state with the sensor callbacks.
#[derive(Debug, Clone, Copy)]
pub struct OrientationFrame {
    /// Smoothed orientation quaternion
    pub quaternion: Quaternion<f32>,
    /// Column-major 4x4 model matrix derived from the quaternion
    pub model_matrix: [f32; 16],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_reference_tuning() {
        let settings = FusionSettings::default();
        assert_eq!(settings.gravity_low_pass_alpha, 0.90);
        assert_eq!(settings.angle_blend_k, 0.90);
        assert_eq!(settings.stillness_sample_threshold, 50);
        assert_eq!(settings.stillness_tolerance, 0.1);
        assert_eq!(settings.quaternion_smooth_factor, 0.1);
        assert_eq!(settings.accel_correction_gain, 0.02);
    }

    #[test]
    fn test_screen_rotation_yaw() {
        assert_eq!(ScreenRotation::Rot0.yaw_degrees(), 0.0);
        assert_eq!(ScreenRotation::Rot90.yaw_degrees(), -90.0);
        assert_eq!(ScreenRotation::Rot180.yaw_degrees(), -180.0);
        assert_eq!(ScreenRotation::Rot270.yaw_degrees(), -270.0);
    }
}
