//! Per-frame slerp smoothing of the fused orientation.

use nalgebra::Quaternion;

use crate::math::QuaternionExt;
use crate::types::FusionSettings;

/// Exponential quaternion smoother.
///
/// Each frame the stable quaternion moves a fixed slerp fraction toward the
/// latest fused orientation, trading a small amount of latency for
/// jitter-free rendering. With a factor of 1.0 the smoother is transparent.
#[derive(Debug, Clone, Copy)]
pub struct QuaternionSmoother {
    stable: Quaternion<f32>,
    smooth_factor: f32,
}

impl QuaternionSmoother {
    pub fn new(settings: &FusionSettings) -> Self {
        Self {
            stable: Quaternion::identity(),
            smooth_factor: settings.quaternion_smooth_factor,
        }
    }

    /// Advance the stable quaternion toward `latest` and return it.
    pub fn update(&mut self, latest: &Quaternion<f32>) -> Quaternion<f32> {
        self.stable = self.stable.slerp_toward(latest, self.smooth_factor);
        self.stable
    }

    /// Current smoothed orientation without advancing.
    pub fn current(&self) -> Quaternion<f32> {
        self.stable
    }

    /// Snap back to identity, discarding accumulated state.
    pub fn reset(&mut self) {
        self.stable = Quaternion::identity();
    }
}

impl Default for QuaternionSmoother {
    fn default() -> Self {
        Self::new(&FusionSettings::default())
    }
}
