//! Euler-angle complementary filter.
//!
//! Blends a low-frequency-trusted attitude reference (accelerometer for
//! pitch/roll, magnetometer for yaw) with high-frequency gyroscope
//! integration. Every update is O(1) and allocation-free; degenerate input
//! never faults, it only falls back.

use nalgebra::Vector3;

use crate::calibration::BiasCalibration;
use crate::math::{DEG_TO_RAD, NORM_EPSILON, RAD_TO_DEG};
use crate::types::{EulerAngles, FusionSettings};

/// Stateful pitch/roll/yaw estimator.
///
/// Gyroscope samples integrate directly into the held angles; accelerometer
/// and magnetometer samples pull the angles back toward their absolute
/// references with complementary weight `angle_blend_k`. Bias offsets are
/// self-calibrated during detected stillness.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use rotation_vector::EulerFilter;
///
/// let mut filter = EulerFilter::new();
///
/// filter.update_accelerometer(Vector3::new(0.0, 0.0, 9.8), 25.0);
/// filter.update_gyroscope(Vector3::new(0.01, 0.0, 0.0), 1_000_000);
/// filter.update_magnetometer(Vector3::new(30.0, 0.0, -20.0));
///
/// let orientation = filter.orientation();
/// assert!(orientation.pitch.is_finite());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EulerFilter {
    settings: FusionSettings,
    /// Low-pass filtered gravity estimate, m/s²
    gravity: Vector3<f32>,
    /// Held orientation, degrees
    angles: EulerAngles,
    /// Timestamp of the previous gyroscope sample, if any
    last_gyro_timestamp_ns: Option<u64>,
    calibration: BiasCalibration,
}

impl EulerFilter {
    pub fn new() -> Self {
        Self::with_settings(FusionSettings::default())
    }

    pub fn with_settings(settings: FusionSettings) -> Self {
        Self {
            settings,
            gravity: Vector3::zeros(),
            angles: EulerAngles::default(),
            last_gyro_timestamp_ns: None,
            calibration: BiasCalibration::new(&settings),
        }
    }

    /// Process one accelerometer sample in m/s², with the ambient
    /// temperature in °C.
    ///
    /// Applies bias and temperature compensation, folds the reading into the
    /// gravity low-pass, blends the accelerometer-derived pitch/roll into the
    /// held angles, and feeds the stillness detector.
    pub fn update_accelerometer(&mut self, raw: Vector3<f32>, temperature_c: f32) {
        let compensated = self.calibration.compensate_accelerometer(raw, temperature_c);

        let alpha = self.settings.gravity_low_pass_alpha;
        self.gravity = self.gravity * alpha + compensated * (1.0 - alpha);

        let g = self.gravity;
        let pitch_acc = (-g.x).atan2((g.y * g.y + g.z * g.z).sqrt()) * RAD_TO_DEG;
        let roll_acc = g.y.atan2(g.z) * RAD_TO_DEG;

        let k = self.settings.angle_blend_k;
        self.angles.pitch = k * self.angles.pitch + (1.0 - k) * pitch_acc;
        self.angles.roll = k * self.angles.roll + (1.0 - k) * roll_acc;

        self.calibration.observe_stillness(compensated, raw);
    }

    /// Process one gyroscope sample in rad/s with its monotonic timestamp
    /// in nanoseconds.
    ///
    /// The first sample after construction only records the timestamp; there
    /// is no Δt to integrate over yet, and inventing one would spike the
    /// angles.
    pub fn update_gyroscope(&mut self, raw: Vector3<f32>, timestamp_ns: u64) {
        let rate = self.calibration.correct_gyroscope(raw);

        if let Some(last) = self.last_gyro_timestamp_ns {
            let dt = timestamp_ns.saturating_sub(last) as f32 * 1e-9;
            self.angles.pitch += rate.x * dt * RAD_TO_DEG;
            self.angles.roll += rate.y * dt * RAD_TO_DEG;
            self.angles.yaw += rate.z * dt * RAD_TO_DEG;
        }
        self.last_gyro_timestamp_ns = Some(timestamp_ns);
    }

    /// Process one magnetometer sample in µT.
    ///
    /// Tilt-compensates the normalized field with the current pitch/roll and
    /// blends the resulting heading into the held yaw. A zero-length field is
    /// ignored.
    pub fn update_magnetometer(&mut self, field: Vector3<f32>) {
        let norm = field.magnitude();
        if norm < NORM_EPSILON {
            return;
        }
        let m = field / norm;

        let pitch = self.angles.pitch * DEG_TO_RAD;
        let roll = self.angles.roll * DEG_TO_RAD;

        let horizontal_y = m.y * pitch.cos() - m.z * pitch.sin();
        let horizontal_x = m.x * roll.cos()
            + m.y * roll.sin() * pitch.sin()
            + m.z * roll.sin() * pitch.cos();
        let yaw_mag = horizontal_y.atan2(horizontal_x) * RAD_TO_DEG;

        let k = self.settings.angle_blend_k;
        self.angles.yaw = k * self.angles.yaw + (1.0 - k) * yaw_mag;
    }

    /// Snapshot of the current orientation in degrees.
    pub fn orientation(&self) -> EulerAngles {
        self.angles
    }

    /// One-shot temperature calibration; see
    /// [`BiasCalibration::set_temperature_coefficients`].
    pub fn set_temperature_coefficients(&mut self, coefficients: Vector3<f32>, reference_c: f32) {
        self.calibration
            .set_temperature_coefficients(coefficients, reference_c);
    }

    /// Current self-calibration state.
    pub fn calibration(&self) -> &BiasCalibration {
        &self.calibration
    }

    pub fn settings(&self) -> FusionSettings {
        self.settings
    }
}

impl Default for EulerFilter {
    fn default() -> Self {
        Self::new()
    }
}
