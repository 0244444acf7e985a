//! Virtual rotation-vector sensor built on complementary-filter IMU fusion.
//!
//! Fuses accelerometer, gyroscope and magnetometer samples into a device
//! orientation, with stillness-gated bias self-calibration and optional
//! temperature-drift compensation. Two fusion paths are provided: an
//! Euler-angle complementary filter ([`EulerFilter`]) and a quaternion
//! integrator with accelerometer correction ([`QuaternionIntegrator`]).
//! [`FusionPipeline`] composes either path with per-frame smoothing,
//! screen-rotation compensation and a touch-drag yaw fallback, and
//! [`VirtualRotationVector`] exposes the complementary filter behind a
//! thread-safe facade that reports orientation in the platform
//! rotation-vector encoding.
//!
//! # Quick Start
//!
//! ```
//! use nalgebra::Vector3;
//! use rotation_vector::VirtualRotationVector;
//!
//! let sensor = VirtualRotationVector::new();
//!
//! // Sensor callbacks feed samples as they arrive, from any thread.
//! sensor.update_accelerometer(Vector3::new(0.0, 0.0, 9.8), None);
//! sensor.update_gyroscope(Vector3::new(0.01, 0.0, 0.0), 1_000_000);
//! sensor.update_magnetometer(Vector3::new(30.0, 0.0, -20.0));
//!
//! // Consumers poll the fused result whenever they need it.
//! let orientation = sensor.orientation();
//! let vector = sensor.rotation_vector();
//! assert!(orientation.pitch.is_finite());
//! assert!(vector.iter().all(|c| c.is_finite()));
//! ```

mod calibration;
mod estimator;
mod integrator;
mod math;
mod pipeline;
mod rotation_vector;
mod sensor;
mod smoothing;
mod types;

pub use calibration::BiasCalibration;
pub use estimator::EulerFilter;
pub use integrator::QuaternionIntegrator;
pub use math::{DEG_TO_RAD, NORM_EPSILON, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use pipeline::{
    ComplementaryStrategy, FusionPipeline, IntegratorStrategy, OrientationStrategy,
};
pub use rotation_vector::rotation_vector;
pub use sensor::VirtualRotationVector;
pub use smoothing::QuaternionSmoother;
pub use types::{
    DEFAULT_TEMPERATURE_C, EulerAngles, FusionSettings, ImuSample, OrientationFrame,
    STANDARD_GRAVITY, ScreenRotation,
};
