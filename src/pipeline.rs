//! The per-frame entry point: edge extraction followed by display conversion.

use std::time::Instant;

use log::debug;

use crate::convert::edges_to_rgba;
use crate::edge::{check_aperture_fits, detect_edges};
use crate::error::Result;
use crate::frame::{check_same_size, GrayFrame, RgbaFrameMut};
use crate::params::CannyParams;

/// Replaces the contents of `rgba` with the edges found in `gray`.
///
/// Both frames must have the same dimensions. Every check runs before the first
/// write, so on error `rgba` still holds whatever it held before the call and
/// the caller can simply drop the frame. No reference to either buffer is kept.
pub fn process_frame(
    gray: &GrayFrame,
    rgba: &mut RgbaFrameMut,
    params: &CannyParams,
) -> Result<()> {
    if let Err(err) = validate(gray, rgba, params) {
        debug!("frame rejected: {}", err);
        return Err(err);
    }

    let start = Instant::now();
    let edges = detect_edges(gray, params)?;
    let detected_at = start.elapsed();
    edges_to_rgba(&edges, rgba)?;
    debug!(
        "frame {}x{}: {} edge pixels, detection {:?}, conversion {:?}",
        gray.width(),
        gray.height(),
        edges.edge_count(),
        detected_at,
        start.elapsed() - detected_at
    );
    Ok(())
}

fn validate(gray: &GrayFrame, rgba: &RgbaFrameMut, params: &CannyParams) -> Result<()> {
    params.validate()?;
    check_same_size(gray.dimensions(), rgba.dimensions())?;
    check_aperture_fits(gray, params)
}
