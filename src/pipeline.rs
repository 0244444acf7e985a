//! Frame-oriented fusion pipeline.
//!
//! Ties a fusion strategy, the smoothing stage, screen-rotation compensation
//! and the touch-drag yaw fallback together behind a single per-frame entry
//! point. Sensor callbacks feed [`FusionPipeline::ingest`]; the render loop
//! calls [`FusionPipeline::frame`] once per drawn frame.

use nalgebra::Quaternion;

use crate::estimator::EulerFilter;
use crate::integrator::QuaternionIntegrator;
use crate::math::QuaternionExt;
use crate::smoothing::QuaternionSmoother;
use crate::types::{FusionSettings, ImuSample, OrientationFrame, ScreenRotation};

/// Degrees of yaw accumulated per pixel of horizontal touch drag.
const DRAG_YAW_GAIN: f32 = 0.2;

/// One way of turning sensor samples into an orientation quaternion.
///
/// Strategies own all their filter state; the pipeline only routes samples
/// in and reads the fused quaternion out.
pub trait OrientationStrategy: Send {
    fn ingest(&mut self, sample: ImuSample);
    fn quaternion(&self) -> Quaternion<f32>;
}

/// Euler complementary filter adapted to the strategy interface.
pub struct ComplementaryStrategy {
    filter: EulerFilter,
}

impl ComplementaryStrategy {
    pub fn new(settings: FusionSettings) -> Self {
        Self {
            filter: EulerFilter::with_settings(settings),
        }
    }
}

impl OrientationStrategy for ComplementaryStrategy {
    fn ingest(&mut self, sample: ImuSample) {
        match sample {
            ImuSample::Accelerometer {
                acceleration,
                temperature_c,
            } => self.filter.update_accelerometer(acceleration, temperature_c),
            ImuSample::Gyroscope {
                angular_rate,
                timestamp_ns,
            } => self.filter.update_gyroscope(angular_rate, timestamp_ns),
            ImuSample::Magnetometer { field } => self.filter.update_magnetometer(field),
        }
    }

    fn quaternion(&self) -> Quaternion<f32> {
        let angles = self.filter.orientation();
        Quaternion::from_attitude_degrees(angles.pitch, angles.roll, angles.yaw)
    }
}

/// Quaternion integrator adapted to the strategy interface.
///
/// Magnetometer samples are dropped; this path has no yaw reference.
pub struct IntegratorStrategy {
    integrator: QuaternionIntegrator,
}

impl IntegratorStrategy {
    pub fn new(settings: FusionSettings) -> Self {
        Self {
            integrator: QuaternionIntegrator::new(&settings),
        }
    }

    /// Accelerometer-only variant for gyroscope-less devices.
    pub fn without_gyroscope(settings: FusionSettings) -> Self {
        Self {
            integrator: QuaternionIntegrator::without_gyroscope(&settings),
        }
    }
}

impl OrientationStrategy for IntegratorStrategy {
    fn ingest(&mut self, sample: ImuSample) {
        match sample {
            ImuSample::Accelerometer { acceleration, .. } => {
                self.integrator.update_accelerometer(acceleration)
            }
            ImuSample::Gyroscope {
                angular_rate,
                timestamp_ns,
            } => self.integrator.update_gyroscope(angular_rate, timestamp_ns),
            ImuSample::Magnetometer { .. } => {}
        }
    }

    fn quaternion(&self) -> Quaternion<f32> {
        self.integrator.quaternion()
    }
}

/// Touch-drag yaw substitute for devices without a gyroscope.
///
/// Horizontal drags accumulate into a yaw offset that decays every frame.
/// The decay multiplies by the frame interval, so at typical frame times the
/// offset collapses within a few frames of the finger lifting.
#[derive(Debug, Clone, Copy, Default)]
struct DragYaw {
    degrees: f32,
}

impl DragYaw {
    fn drag(&mut self, dx: f32) {
        self.degrees += dx * DRAG_YAW_GAIN;
    }

    fn decay(&mut self, frame_dt: f32) {
        self.degrees *= frame_dt;
    }
}

/// Sensor-to-render fusion pipeline.
///
/// ```
/// use nalgebra::Vector3;
/// use rotation_vector::{FusionPipeline, ImuSample};
///
/// let mut pipeline = FusionPipeline::for_device(true);
/// pipeline.ingest(ImuSample::Accelerometer {
///     acceleration: Vector3::new(0.0, 0.0, 9.8),
///     temperature_c: 25.0,
/// });
///
/// let frame = pipeline.frame(1.0 / 60.0);
/// assert!((frame.model_matrix[15] - 1.0).abs() < 1e-6);
/// ```
pub struct FusionPipeline {
    strategy: Box<dyn OrientationStrategy>,
    smoother: QuaternionSmoother,
    screen_rotation: ScreenRotation,
    drag_yaw: DragYaw,
    has_gyroscope: bool,
}

impl FusionPipeline {
    /// Pipeline with the default strategy for the device's sensor suite:
    /// quaternion integration when a gyroscope is present, the accelerometer
    /// complementary filter otherwise.
    pub fn for_device(has_gyroscope: bool) -> Self {
        Self::with_settings(has_gyroscope, FusionSettings::default())
    }

    pub fn with_settings(has_gyroscope: bool, settings: FusionSettings) -> Self {
        let strategy: Box<dyn OrientationStrategy> = if has_gyroscope {
            tracing::debug!("gyroscope present, using quaternion integration");
            Box::new(IntegratorStrategy::new(settings))
        } else {
            tracing::debug!("no gyroscope, using complementary filter");
            Box::new(ComplementaryStrategy::new(settings))
        };
        Self::with_strategy(has_gyroscope, settings, strategy)
    }

    /// Pipeline around an explicit strategy.
    pub fn with_strategy(
        has_gyroscope: bool,
        settings: FusionSettings,
        strategy: Box<dyn OrientationStrategy>,
    ) -> Self {
        Self {
            strategy,
            smoother: QuaternionSmoother::new(&settings),
            screen_rotation: ScreenRotation::default(),
            drag_yaw: DragYaw::default(),
            has_gyroscope,
        }
    }

    /// Route one sensor sample to the active strategy.
    pub fn ingest(&mut self, sample: ImuSample) {
        self.strategy.ingest(sample);
    }

    /// Accumulate a horizontal touch drag of `dx` pixels.
    ///
    /// Only meaningful without a gyroscope; with one the fused yaw already
    /// tracks device motion and drags are ignored.
    pub fn drag(&mut self, dx: f32) {
        if !self.has_gyroscope {
            self.drag_yaw.drag(dx);
        }
    }

    pub fn set_screen_rotation(&mut self, rotation: ScreenRotation) {
        self.screen_rotation = rotation;
    }

    pub fn screen_rotation(&self) -> ScreenRotation {
        self.screen_rotation
    }

    /// Produce the orientation for one rendered frame.
    ///
    /// `frame_dt` is the interval since the previous frame in seconds. The
    /// drag yaw decays by it, then the screen-rotation and drag compensation
    /// quaternions are composed in front of the fused orientation, the result
    /// is smoothed, and the model matrix is derived from the smoothed value.
    pub fn frame(&mut self, frame_dt: f32) -> OrientationFrame {
        self.drag_yaw.decay(frame_dt);

        let fused = self.strategy.quaternion();
        let screen = Quaternion::from_yaw_degrees(self.screen_rotation.yaw_degrees());
        let drag = Quaternion::from_yaw_degrees(self.drag_yaw.degrees);
        let composed = screen * drag * fused;

        let quaternion = self.smoother.update(&composed);
        let mut model_matrix = [0.0f32; 16];
        quaternion.write_gl_matrix(&mut model_matrix);

        OrientationFrame {
            quaternion,
            model_matrix,
        }
    }
}
