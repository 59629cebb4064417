use crate::edge::EdgeMap;
use crate::error::Result;
use crate::frame::{check_same_size, GrayFrame, RgbaFrameMut, OPAQUE, RGBA_CHANNELS};

/// Copies each intensity into red, green and blue and makes the pixel opaque.
///
/// The destination must already have the same dimensions as the source;
/// nothing is written when it does not.
pub fn gray_to_rgba(src: &GrayFrame, dst: &mut RgbaFrameMut) -> Result<()> {
    check_same_size(src.dimensions(), dst.dimensions())?;
    for y in 0..src.height() {
        broadcast_row(src.row(y), dst.row_mut(y));
    }
    Ok(())
}

/// Renders an edge map as white edges over opaque black.
pub fn edges_to_rgba(edges: &EdgeMap, dst: &mut RgbaFrameMut) -> Result<()> {
    gray_to_rgba(&edges.as_frame(), dst)
}

#[inline]
fn broadcast_row(src: &[u8], dst: &mut [u8]) {
    for (&v, px) in src.iter().zip(dst.chunks_exact_mut(RGBA_CHANNELS)) {
        px.copy_from_slice(&[v, v, v, OPAQUE]);
    }
}
