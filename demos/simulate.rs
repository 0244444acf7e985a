//! Synthetic-motion fusion demonstration
//!
//! Simulates a device resting still, tilting forward, then turning in place,
//! feeding the generated samples through the virtual rotation-vector sensor
//! at 100 Hz and printing the fused orientation once per simulated second.
//!
//! Run with: `cargo run --example simulate`

use nalgebra::Vector3;
use rotation_vector::{STANDARD_GRAVITY, VirtualRotationVector};

const SAMPLE_RATE_HZ: u64 = 100;
const SAMPLE_PERIOD_NS: u64 = 1_000_000_000 / SAMPLE_RATE_HZ;

/// Gravity reading of a device pitched forward by `pitch_deg`.
fn tilted_gravity(pitch_deg: f32) -> Vector3<f32> {
    let pitch = pitch_deg.to_radians();
    Vector3::new(
        -STANDARD_GRAVITY * pitch.sin(),
        0.0,
        STANDARD_GRAVITY * pitch.cos(),
    )
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Virtual rotation-vector sensor - synthetic motion demo");

    let sensor = VirtualRotationVector::new();

    // Phase 1: three seconds perfectly still. Long enough for several
    // stillness runs, so the self-calibration nudges are visible in the
    // debug log.
    // Phase 2: two seconds tilting forward to 30 degrees of pitch.
    // Phase 3: two seconds turning in place at 45 deg/s.
    let total_samples = 7 * SAMPLE_RATE_HZ;

    for i in 0..total_samples {
        let t = i as f32 / SAMPLE_RATE_HZ as f32;
        let timestamp_ns = i * SAMPLE_PERIOD_NS;

        let (acceleration, angular_rate) = if t < 3.0 {
            (tilted_gravity(0.0), Vector3::zeros())
        } else if t < 5.0 {
            let pitch = 30.0 * (t - 3.0) / 2.0;
            // 15 deg/s of pitch rate about X while tilting
            (tilted_gravity(pitch), Vector3::new(15f32.to_radians(), 0.0, 0.0))
        } else {
            (tilted_gravity(30.0), Vector3::new(0.0, 0.0, 45f32.to_radians()))
        };

        sensor.update_accelerometer(acceleration, None);
        sensor.update_gyroscope(angular_rate, timestamp_ns);
        sensor.update_magnetometer(Vector3::new(25.0, 2.0, -15.0));

        if i % SAMPLE_RATE_HZ == SAMPLE_RATE_HZ - 1 {
            let orientation = sensor.orientation();
            let vector = sensor.rotation_vector();
            println!(
                "t={:4.1}s  pitch={:7.2}  roll={:7.2}  yaw={:7.2}  rv=({:+.4}, {:+.4}, {:+.4})",
                t, orientation.pitch, orientation.roll, orientation.yaw,
                vector[0], vector[1], vector[2]
            );
        }
    }
}
