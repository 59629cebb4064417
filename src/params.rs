use crate::error::{FrameError, Result};

/// Apertures the smoothing and Sobel kernels can be built for.
pub const SUPPORTED_APERTURES: [u32; 3] = [3, 5, 7];

/// Sensitivity settings for the edge detector.
///
/// Thresholds are compared against the unnormalised Sobel response of 8-bit
/// samples, so the defaults of 50 and 150 are tuned for an aperture of 3.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CannyParams {
    /// Length of the smoothing kernel and of the Sobel derivative kernel.
    pub aperture: u32,
    /// Gradient magnitudes below this are never edges.
    pub low_threshold: f32,
    /// Gradient magnitudes at or above this always seed an edge.
    pub high_threshold: f32,
    /// Use the Euclidean gradient norm instead of `|gx| + |gy|`.
    pub l2_gradient: bool,
}

impl Default for CannyParams {
    fn default() -> CannyParams {
        CannyParams {
            aperture: 3,
            low_threshold: 50.0,
            high_threshold: 150.0,
            l2_gradient: false,
        }
    }
}

impl CannyParams {
    /// Builds a validated parameter set using the L1 gradient norm.
    pub fn new(low_threshold: f32, high_threshold: f32, aperture: u32) -> Result<CannyParams> {
        let params = CannyParams {
            aperture,
            low_threshold,
            high_threshold,
            l2_gradient: false,
        };
        params.validate()?;
        Ok(params)
    }

    /// Switches between the Euclidean and the L1 gradient norm.
    pub fn with_l2_gradient(self, l2_gradient: bool) -> CannyParams {
        CannyParams { l2_gradient, ..self }
    }

    /// Checks the invariants every detector run relies on.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_APERTURES.contains(&self.aperture) {
            return Err(FrameError::parameters(format!(
                "aperture {} is not one of {:?}",
                self.aperture, SUPPORTED_APERTURES
            )));
        }
        if !self.low_threshold.is_finite() || !self.high_threshold.is_finite() {
            return Err(FrameError::parameters("thresholds must be finite"));
        }
        if self.low_threshold < 0.0 {
            return Err(FrameError::parameters(format!(
                "low threshold {} is negative",
                self.low_threshold
            )));
        }
        if self.low_threshold >= self.high_threshold {
            return Err(FrameError::parameters(format!(
                "low threshold {} is not below high threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(())
    }

    /// Number of pixels the kernels reach past the centre pixel.
    pub(crate) fn radius(&self) -> usize {
        self.aperture as usize / 2
    }
}
