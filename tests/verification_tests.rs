use std::thread;

use nalgebra::{Quaternion, Vector3};
use rotation_vector::{
    EulerAngles, EulerFilter, FusionPipeline, FusionSettings, ImuSample, QuaternionExt,
    QuaternionIntegrator, ScreenRotation, VirtualRotationVector, rotation_vector,
};

const GRAVITY: Vector3<f32> = Vector3::new(0.0, 0.0, 9.8);
const AMBIENT_C: f32 = 25.0;

/// A still, level device sampled at 100 Hz must stay level and fire exactly
/// one bias nudge once the stillness run completes.
#[test]
fn test_still_device_stays_level_and_self_calibrates() {
    let mut filter = EulerFilter::new();

    let mut nudges = 0;
    let mut last_offset = filter.calibration().accelerometer_offset();
    for _ in 0..60 {
        filter.update_accelerometer(GRAVITY, AMBIENT_C);
        let offset = filter.calibration().accelerometer_offset();
        if offset != last_offset {
            nudges += 1;
            last_offset = offset;
        }
    }

    let orientation = filter.orientation();
    assert!(orientation.pitch.abs() < 0.5);
    assert!(orientation.roll.abs() < 0.5);
    assert_eq!(nudges, 1);
    assert!((last_offset.z - 0.098).abs() < 1e-5);
}

/// The first gyroscope sample must only record its timestamp; integration
/// starts from the second sample, so one second at 1 deg/s yields one degree.
#[test]
fn test_gyro_delta_time_gating() {
    let mut filter = EulerFilter::new();
    let rate = Vector3::new(1f32.to_radians(), 0.0, 0.0);

    filter.update_gyroscope(rate, 500_000_000);
    assert_eq!(filter.orientation(), EulerAngles::default());

    filter.update_gyroscope(rate, 1_500_000_000);
    assert!((filter.orientation().pitch - 1.0).abs() < 1e-3);
}

/// The integrator and the reference axis-angle construction must agree on a
/// pure rotation.
#[test]
fn test_integrator_matches_axis_angle_reference() {
    let mut integrator = QuaternionIntegrator::default();
    let rate = Vector3::new(0.0, 0.0, 45f32.to_radians());

    // 2 seconds of 45 deg/s about Z in 5 ms steps, no accelerometer stored.
    for i in 0..=400u64 {
        integrator.update_gyroscope(rate, i * 5_000_000);
    }

    let expected = Quaternion::<f32>::from_axis_angle_degrees(Vector3::new(0.0, 0.0, 1.0), 90.0);
    let q = integrator.quaternion();
    assert!((q.w - expected.w).abs() < 1e-2);
    assert!((q.k - expected.k).abs() < 1e-2);
}

/// A zero attitude encodes as the zero rotation vector.
#[test]
fn test_rotation_vector_of_level_device() {
    assert_eq!(rotation_vector(EulerAngles::default()), [0.0, 0.0, 0.0]);
}

/// Screen-rotation compensation composes in front of the fused orientation.
#[test]
fn test_pipeline_screen_rotation() {
    let settings = FusionSettings {
        quaternion_smooth_factor: 1.0,
        ..Default::default()
    };
    let mut pipeline = FusionPipeline::with_settings(true, settings);
    pipeline.set_screen_rotation(ScreenRotation::Rot180);

    let frame = pipeline.frame(1.0 / 60.0);
    let expected = Quaternion::<f32>::from_yaw_degrees(-180.0);
    assert!((frame.quaternion.w - expected.w).abs() < 1e-5);
    assert!((frame.quaternion.k - expected.k).abs() < 1e-5);
}

/// Cloned handles feed one shared filter from multiple threads without
/// corrupting its state.
#[test]
fn test_concurrent_updates_remain_consistent() {
    let sensor = VirtualRotationVector::new();

    let mut handles = Vec::new();
    for worker in 0..3u64 {
        let sensor = sensor.clone();
        handles.push(thread::spawn(move || {
            for i in 0..200u64 {
                match worker {
                    0 => sensor.update_accelerometer(GRAVITY, Some(AMBIENT_C)),
                    1 => sensor.update_gyroscope(
                        Vector3::new(0.001, 0.0, 0.0),
                        (worker * 1_000 + i) * 1_000_000,
                    ),
                    _ => sensor.update_magnetometer(Vector3::new(30.0, 0.0, -20.0)),
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let orientation = sensor.orientation();
    assert!(orientation.pitch.is_finite());
    assert!(orientation.roll.is_finite());
    assert!(orientation.yaw.is_finite());
    assert!(sensor.rotation_vector().iter().all(|c| c.is_finite()));
}

/// The facade accepts the sample enum and routes by kind.
#[test]
fn test_facade_ingest() {
    let sensor = VirtualRotationVector::new();

    for _ in 0..30 {
        sensor.ingest(ImuSample::Accelerometer {
            acceleration: GRAVITY,
            temperature_c: AMBIENT_C,
        });
    }

    assert!(sensor.orientation().pitch.abs() < 0.5);
}
