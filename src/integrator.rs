//! Gyroscope-driven quaternion integrator with accelerometer correction.
//!
//! The higher-fidelity fusion path when a gyroscope is present: angular
//! velocity integrates directly into a quaternion, and a small proportional
//! correction steers the predicted gravity direction toward the measured
//! one. Without a gyroscope the held quaternion is instead rebuilt from each
//! accelerometer sample; smoothing is left to the downstream stage.

use nalgebra::{Quaternion, Vector3};

use crate::math::{NORM_EPSILON, QuaternionExt};
use crate::types::FusionSettings;

/// Quaternion fusion state.
///
/// The correction is a simplified Mahony-style complementary term, not a
/// Kalman filter: it trades long-term accuracy for constant-time,
/// allocation-free updates.
#[derive(Debug, Clone, Copy)]
pub struct QuaternionIntegrator {
    quaternion: Quaternion<f32>,
    /// Most recent accelerometer reading, m/s²
    last_accelerometer: Vector3<f32>,
    /// Timestamp of the previous gyroscope sample, if any
    last_timestamp_ns: Option<u64>,
    has_gyroscope: bool,
    correction_gain: f32,
}

impl QuaternionIntegrator {
    /// Integrator for a device with a gyroscope.
    pub fn new(settings: &FusionSettings) -> Self {
        Self {
            quaternion: Quaternion::identity(),
            last_accelerometer: Vector3::zeros(),
            last_timestamp_ns: None,
            has_gyroscope: true,
            correction_gain: settings.accel_correction_gain,
        }
    }

    /// Accelerometer-only integrator for a device without a gyroscope.
    pub fn without_gyroscope(settings: &FusionSettings) -> Self {
        Self {
            has_gyroscope: false,
            ..Self::new(settings)
        }
    }

    /// Attitude implied by a single gravity measurement, yaw fixed at zero.
    ///
    /// A zero-norm reading carries no direction and yields identity.
    pub fn attitude_from_accelerometer(acceleration: Vector3<f32>) -> Quaternion<f32> {
        let norm = acceleration.magnitude();
        if norm < NORM_EPSILON {
            return Quaternion::identity();
        }
        let unit = acceleration / norm;

        let pitch = (-unit.x).atan2((unit.y * unit.y + unit.z * unit.z).sqrt());
        let roll = unit.y.atan2(unit.z);

        Quaternion::from_attitude(pitch, roll, 0.0)
    }

    /// Process one accelerometer sample in m/s².
    ///
    /// With a gyroscope the reading is only stored for the next correction
    /// step; without one it replaces the held quaternion outright.
    pub fn update_accelerometer(&mut self, acceleration: Vector3<f32>) {
        self.last_accelerometer = acceleration;
        if !self.has_gyroscope {
            self.quaternion = Self::attitude_from_accelerometer(acceleration);
        }
    }

    /// Process one gyroscope sample in rad/s with its monotonic timestamp
    /// in nanoseconds.
    ///
    /// The first sample only records the timestamp. Subsequent samples
    /// integrate over the elapsed Δt and then apply the accelerometer
    /// correction.
    pub fn update_gyroscope(&mut self, angular_rate: Vector3<f32>, timestamp_ns: u64) {
        if !self.has_gyroscope {
            return;
        }

        if let Some(last) = self.last_timestamp_ns {
            let dt = timestamp_ns.saturating_sub(last) as f32 * 1e-9;
            self.integrate(angular_rate, dt);
            self.correct_with_accelerometer();
        }
        self.last_timestamp_ns = Some(timestamp_ns);
    }

    /// First-order quaternion update `q · (1, ω·dt/2)`, renormalized.
    fn integrate(&mut self, rate: Vector3<f32>, dt: f32) {
        let half_dt = 0.5 * dt;
        let delta = Quaternion::new(1.0, rate.x * half_dt, rate.y * half_dt, rate.z * half_dt);
        self.quaternion = (self.quaternion * delta).normalized_or_self();
    }

    /// Steer the predicted gravity direction toward the measured one.
    ///
    /// The cross product of the measured and predicted directions is the
    /// error rotation axis; feeding it back through the integration step with
    /// unit dt applies a proportional correction.
    fn correct_with_accelerometer(&mut self) {
        let norm = self.last_accelerometer.magnitude();
        if norm < NORM_EPSILON {
            return;
        }
        let measured = self.last_accelerometer / norm;
        let predicted = self.quaternion.predicted_gravity();
        let error = measured.cross(&predicted);

        self.integrate(error * self.correction_gain, 1.0);
    }

    /// Current fused orientation quaternion.
    pub fn quaternion(&self) -> Quaternion<f32> {
        self.quaternion
    }

    /// Overwrite the held orientation.
    pub fn set_quaternion(&mut self, quaternion: Quaternion<f32>) {
        self.quaternion = quaternion;
    }

    pub fn has_gyroscope(&self) -> bool {
        self.has_gyroscope
    }
}

impl Default for QuaternionIntegrator {
    fn default() -> Self {
        Self::new(&FusionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::STANDARD_GRAVITY;
    use core::f32::consts::FRAC_PI_2;

    #[test]
    fn test_first_gyro_sample_records_timestamp_only() {
        let mut integrator = QuaternionIntegrator::default();
        integrator.update_gyroscope(Vector3::new(10.0, 10.0, 10.0), 5_000_000);

        let q = integrator.quaternion();
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn test_quarter_turn_about_x() {
        let mut integrator = QuaternionIntegrator::default();
        let rate = Vector3::new(FRAC_PI_2, 0.0, 0.0); // 90 deg/s

        // 100 steps of 10 ms; no accelerometer stored, so no correction.
        for i in 0..=100u64 {
            integrator.update_gyroscope(rate, i * 10_000_000);
        }

        let expected =
            Quaternion::<f32>::from_axis_angle_degrees(Vector3::new(1.0, 0.0, 0.0), 90.0);
        let q = integrator.quaternion();
        assert!((q.w - expected.w).abs() < 1e-2);
        assert!((q.i - expected.i).abs() < 1e-2);
        assert!(q.j.abs() < 1e-3 && q.k.abs() < 1e-3);
    }

    #[test]
    fn test_accel_correction_pulls_toward_gravity() {
        let mut integrator = QuaternionIntegrator::default();
        integrator.set_quaternion(Quaternion::from_attitude_degrees(0.0, 30.0, 0.0));
        integrator.update_accelerometer(Vector3::new(0.0, 0.0, STANDARD_GRAVITY));

        let error_before = (integrator.quaternion().predicted_gravity()
            - Vector3::new(0.0, 0.0, 1.0))
        .magnitude();

        // Zero angular rate; each sample applies only the correction term.
        for i in 1..=500u64 {
            integrator.update_gyroscope(Vector3::zeros(), i * 10_000_000);
        }

        let error_after = (integrator.quaternion().predicted_gravity()
            - Vector3::new(0.0, 0.0, 1.0))
        .magnitude();

        assert!(error_after < error_before * 0.1);
    }

    #[test]
    fn test_without_gyroscope_tracks_accelerometer() {
        let mut integrator =
            QuaternionIntegrator::without_gyroscope(&FusionSettings::default());

        // Rolled 90 degrees: gravity along +Y.
        integrator.update_accelerometer(Vector3::new(0.0, STANDARD_GRAVITY, 0.0));
        let expected =
            Quaternion::<f32>::from_axis_angle_degrees(Vector3::new(1.0, 0.0, 0.0), 90.0);
        let q = integrator.quaternion();
        assert!((q.w - expected.w).abs() < 1e-5);
        assert!((q.i - expected.i).abs() < 1e-5);

        // Gyroscope input is ignored on this path.
        integrator.update_gyroscope(Vector3::new(1.0, 0.0, 0.0), 1_000_000_000);
        integrator.update_gyroscope(Vector3::new(1.0, 0.0, 0.0), 2_000_000_000);
        assert!((integrator.quaternion().w - q.w).abs() < 1e-6);
    }

    #[test]
    fn test_zero_accelerometer_yields_identity_attitude() {
        let q = QuaternionIntegrator::attitude_from_accelerometer(Vector3::zeros());
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn test_zero_accelerometer_skips_correction() {
        let mut integrator = QuaternionIntegrator::default();
        let tilted = Quaternion::from_attitude_degrees(0.0, 30.0, 0.0);
        integrator.set_quaternion(tilted);

        // No accelerometer stored; corrections must leave the attitude alone.
        for i in 0..=10u64 {
            integrator.update_gyroscope(Vector3::zeros(), i * 10_000_000);
        }

        assert!((integrator.quaternion().w - tilted.w).abs() < 1e-5);
        assert!((integrator.quaternion().i - tilted.i).abs() < 1e-5);
    }
}
