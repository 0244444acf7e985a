//! Bias and temperature self-calibration driven by stillness detection.
//!
//! Offsets initialize to zero and are only ever nudged while the device has
//! been still for a full run of qualifying accelerometer samples, so the
//! filter needs no external ground truth to stay calibrated over long
//! sessions.

use nalgebra::Vector3;

use crate::types::{DEFAULT_TEMPERATURE_C, FusionSettings, STANDARD_GRAVITY};

/// EMA weight applied on each stillness-triggered offset nudge.
const OFFSET_NUDGE_WEIGHT: f32 = 0.01;

/// Runtime bias state shared by the fusion filters.
///
/// Tracks per-axis accelerometer and gyroscope offsets, the stillness
/// counter that gates their updates, and the temperature-drift coefficients
/// applied to accelerometer readings.
#[derive(Debug, Clone, Copy)]
pub struct BiasCalibration {
    accel_offset: Vector3<f32>,
    gyro_offset: Vector3<f32>,
    temp_coefficients: Vector3<f32>,
    temp_reference_c: f32,
    still_samples: u32,
    sample_threshold: u32,
    norm_tolerance: f32,
}

impl BiasCalibration {
    pub fn new(settings: &FusionSettings) -> Self {
        Self {
            accel_offset: Vector3::zeros(),
            gyro_offset: Vector3::zeros(),
            temp_coefficients: Vector3::zeros(),
            temp_reference_c: DEFAULT_TEMPERATURE_C,
            still_samples: 0,
            sample_threshold: settings.stillness_sample_threshold,
            norm_tolerance: settings.stillness_tolerance,
        }
    }

    /// Offset plus temperature-drift compensation for one accelerometer
    /// sample: `raw - offset - coefficient * (temperature - reference)`.
    pub fn compensate_accelerometer(
        &self,
        raw: Vector3<f32>,
        temperature_c: f32,
    ) -> Vector3<f32> {
        raw - self.accel_offset - self.temp_coefficients * (temperature_c - self.temp_reference_c)
    }

    /// Offset correction for one gyroscope sample.
    pub fn correct_gyroscope(&self, raw: Vector3<f32>) -> Vector3<f32> {
        raw - self.gyro_offset
    }

    /// Feed one compensated accelerometer sample into the stillness detector.
    ///
    /// A sample qualifies when its norm is within the tolerance band around
    /// standard gravity. A full run of qualifying samples nudges the
    /// accelerometer offsets toward the raw reading and decays the gyroscope
    /// offsets toward zero, then restarts the count. The first sample outside
    /// the band resets the count immediately; there is no partial credit.
    ///
    /// Returns true when this sample triggered an offset nudge.
    pub fn observe_stillness(&mut self, compensated: Vector3<f32>, raw: Vector3<f32>) -> bool {
        let norm = compensated.magnitude();
        if (norm - STANDARD_GRAVITY).abs() >= self.norm_tolerance {
            self.still_samples = 0;
            return false;
        }

        self.still_samples += 1;
        if self.still_samples < self.sample_threshold {
            return false;
        }

        self.accel_offset =
            self.accel_offset * (1.0 - OFFSET_NUDGE_WEIGHT) + raw * OFFSET_NUDGE_WEIGHT;
        // The device is at rest, so the true angular rate is zero and the
        // gyroscope offset decays toward it.
        self.gyro_offset *= 1.0 - OFFSET_NUDGE_WEIGHT;
        self.still_samples = 0;

        tracing::debug!(
            offset_x = self.accel_offset.x,
            offset_y = self.accel_offset.y,
            offset_z = self.accel_offset.z,
            "stillness-triggered bias update"
        );

        true
    }

    /// One-shot temperature calibration, coefficients in (m/s²)/°C.
    ///
    /// Not guarded against concurrent calls; callers serialize calibration
    /// changes themselves.
    pub fn set_temperature_coefficients(
        &mut self,
        coefficients: Vector3<f32>,
        reference_c: f32,
    ) {
        self.temp_coefficients = coefficients;
        self.temp_reference_c = reference_c;
        tracing::debug!(reference_c, "temperature coefficients set");
    }

    /// Current accelerometer offset estimate.
    pub fn accelerometer_offset(&self) -> Vector3<f32> {
        self.accel_offset
    }

    /// Current gyroscope offset estimate.
    pub fn gyroscope_offset(&self) -> Vector3<f32> {
        self.gyro_offset
    }

    /// Number of consecutive qualifying samples seen so far.
    pub fn still_samples(&self) -> u32 {
        self.still_samples
    }
}

impl Default for BiasCalibration {
    fn default() -> Self {
        Self::new(&FusionSettings::default())
    }
}
