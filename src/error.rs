use thiserror::Error;

/// Reasons a frame is rejected before any output is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Zero-sized frame, mismatched input/output dimensions, a stride that
    /// cannot hold a row, or a frame smaller than the filter aperture.
    #[error("invalid frame geometry: {reason}")]
    InvalidGeometry {
        /// Which geometry rule the frame broke.
        reason: String,
    },

    /// The pixel buffer is absent or shorter than its declared geometry.
    #[error("invalid frame buffer: {required} bytes required, {actual} available")]
    InvalidBuffer {
        /// Bytes the declared geometry needs.
        required: usize,
        /// Bytes the buffer holds.
        actual: usize,
    },

    /// Detector parameters that cannot produce a meaningful edge map.
    #[error("invalid detector parameters: {reason}")]
    InvalidParameters {
        /// Which parameter invariant was violated.
        reason: String,
    },
}

impl FrameError {
    pub(crate) fn geometry<S: Into<String>>(reason: S) -> FrameError {
        FrameError::InvalidGeometry { reason: reason.into() }
    }

    pub(crate) fn parameters<S: Into<String>>(reason: S) -> FrameError {
        FrameError::InvalidParameters { reason: reason.into() }
    }
}

/// Shorthand used by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = FrameError::geometry("width is zero");
        assert_eq!(err.to_string(), "invalid frame geometry: width is zero");

        let err = FrameError::InvalidBuffer { required: 16, actual: 0 };
        assert_eq!(err.to_string(), "invalid frame buffer: 16 bytes required, 0 available");

        let err = FrameError::parameters("low threshold 150 is not below high threshold 50");
        assert!(err.to_string().starts_with("invalid detector parameters"));
    }
}
