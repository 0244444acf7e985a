//! Thread-safe virtual rotation-vector sensor.

use std::sync::{Arc, Mutex, MutexGuard};

use nalgebra::Vector3;

use crate::estimator::EulerFilter;
use crate::rotation_vector::rotation_vector;
use crate::types::{DEFAULT_TEMPERATURE_C, EulerAngles, FusionSettings, ImuSample};

/// Shared-state facade over the Euler complementary filter.
///
/// Sensor callbacks typically arrive on a platform thread while consumers
/// poll from a render or application thread; every entry point here takes a
/// single mutex for the duration of the call, so each sample is applied
/// atomically and readers always see a consistent orientation.
///
/// Cloning is cheap and clones share the same filter state.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use rotation_vector::VirtualRotationVector;
///
/// let sensor = VirtualRotationVector::new();
/// sensor.update_accelerometer(Vector3::new(0.0, 0.0, 9.8), None);
///
/// let vector = sensor.rotation_vector();
/// assert!(vector.iter().all(|c| c.is_finite()));
/// ```
#[derive(Clone)]
pub struct VirtualRotationVector {
    inner: Arc<Mutex<EulerFilter>>,
}

impl VirtualRotationVector {
    pub fn new() -> Self {
        Self::with_settings(FusionSettings::default())
    }

    pub fn with_settings(settings: FusionSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EulerFilter::with_settings(settings))),
        }
    }

    // The filter is a plain value with no invariants that a panicked holder
    // could have broken mid-update, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, EulerFilter> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Feed one accelerometer sample in m/s².
    ///
    /// Pass `None` for the temperature when the platform does not report
    /// one; [`DEFAULT_TEMPERATURE_C`] is assumed.
    pub fn update_accelerometer(&self, acceleration: Vector3<f32>, temperature_c: Option<f32>) {
        self.lock()
            .update_accelerometer(acceleration, temperature_c.unwrap_or(DEFAULT_TEMPERATURE_C));
    }

    /// Feed one gyroscope sample in rad/s with its monotonic timestamp in
    /// nanoseconds.
    pub fn update_gyroscope(&self, angular_rate: Vector3<f32>, timestamp_ns: u64) {
        self.lock().update_gyroscope(angular_rate, timestamp_ns);
    }

    /// Feed one magnetometer sample in µT.
    pub fn update_magnetometer(&self, field: Vector3<f32>) {
        self.lock().update_magnetometer(field);
    }

    /// Feed one sample of any kind.
    pub fn ingest(&self, sample: ImuSample) {
        match sample {
            ImuSample::Accelerometer {
                acceleration,
                temperature_c,
            } => self.lock().update_accelerometer(acceleration, temperature_c),
            ImuSample::Gyroscope {
                angular_rate,
                timestamp_ns,
            } => self.lock().update_gyroscope(angular_rate, timestamp_ns),
            ImuSample::Magnetometer { field } => self.lock().update_magnetometer(field),
        }
    }

    /// Snapshot of the fused orientation in degrees.
    pub fn orientation(&self) -> EulerAngles {
        self.lock().orientation()
    }

    /// Current orientation encoded as a rotation vector.
    pub fn rotation_vector(&self) -> [f32; 3] {
        rotation_vector(self.lock().orientation())
    }

    /// Install accelerometer temperature-drift coefficients, in (m/s²)/°C.
    pub fn set_temperature_coefficients(&self, coefficients: Vector3<f32>, reference_c: f32) {
        self.lock()
            .set_temperature_coefficients(coefficients, reference_c);
    }
}

impl Default for VirtualRotationVector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let sensor = VirtualRotationVector::new();
        let clone = sensor.clone();

        clone.update_gyroscope(Vector3::new(1f32.to_radians(), 0.0, 0.0), 0);
        clone.update_gyroscope(Vector3::new(1f32.to_radians(), 0.0, 0.0), 1_000_000_000);

        assert!((sensor.orientation().pitch - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_missing_temperature_uses_default() {
        let sensor = VirtualRotationVector::new();
        // Coefficients referenced at the default ambient make None and
        // Some(DEFAULT_TEMPERATURE_C) equivalent.
        sensor.set_temperature_coefficients(Vector3::new(1.0, 1.0, 1.0), DEFAULT_TEMPERATURE_C);

        let explicit = VirtualRotationVector::new();
        explicit.set_temperature_coefficients(Vector3::new(1.0, 1.0, 1.0), DEFAULT_TEMPERATURE_C);

        for _ in 0..20 {
            sensor.update_accelerometer(Vector3::new(0.0, 0.0, 9.8), None);
            explicit.update_accelerometer(
                Vector3::new(0.0, 0.0, 9.8),
                Some(DEFAULT_TEMPERATURE_C),
            );
        }

        assert_eq!(sensor.orientation(), explicit.orientation());
    }

    #[test]
    fn test_ingest_routes_by_sample_kind() {
        let sensor = VirtualRotationVector::new();

        sensor.ingest(ImuSample::Gyroscope {
            angular_rate: Vector3::new(0.0, 0.0, 10f32.to_radians()),
            timestamp_ns: 0,
        });
        sensor.ingest(ImuSample::Gyroscope {
            angular_rate: Vector3::new(0.0, 0.0, 10f32.to_radians()),
            timestamp_ns: 1_000_000_000,
        });

        assert!((sensor.orientation().yaw - 10.0).abs() < 1e-3);
    }
}
