//! Borrowed, bounds-checked views over caller-owned pixel buffers.
//!
//! A view is a validated descriptor: dimensions, a row stride in bytes and the
//! backing slice. Construction fails rather than allowing a later out-of-range
//! read, so the algorithms can index rows without re-checking. Views never own
//! their storage and live no longer than the borrow they were built from.

use crate::error::{FrameError, Result};

/// Bytes per pixel of a display frame.
pub const RGBA_CHANNELS: usize = 4;

/// Alpha written to every display pixel.
pub const OPAQUE: u8 = 255;

fn check_layout(
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
    len: usize,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FrameError::geometry(format!("frame is {}x{}", width, height)));
    }
    let row_bytes = width
        .checked_mul(channels)
        .ok_or_else(|| FrameError::geometry("row size overflows"))?;
    if stride < row_bytes {
        return Err(FrameError::geometry(format!(
            "stride {} is shorter than a row of {} bytes",
            stride, row_bytes
        )));
    }
    let required = stride
        .checked_mul(height - 1)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or_else(|| FrameError::geometry("frame size overflows"))?;
    if len < required {
        return Err(FrameError::InvalidBuffer { required, actual: len });
    }
    Ok(())
}

/// Single-channel 8-bit frame, read only.
#[derive(Copy, Clone, Debug)]
pub struct GrayFrame<'a> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [u8],
}

impl<'a> GrayFrame<'a> {
    /// Wraps a tightly packed buffer.
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Result<GrayFrame<'a>> {
        GrayFrame::with_stride(data, width, height, width)
    }

    /// Wraps a buffer whose rows start every `stride` bytes.
    pub fn with_stride(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<GrayFrame<'a>> {
        check_layout(width, height, stride, 1, data.len())?;
        Ok(GrayFrame { width, height, stride, data })
    }

    /// Packed view over a buffer this crate sized itself.
    pub(crate) fn packed(data: &'a [u8], width: usize, height: usize) -> GrayFrame<'a> {
        debug_assert_eq!(data.len(), width * height);
        GrayFrame { width, height, stride: width, data }
    }

    /// Borrows the pixels of an owned `image` buffer.
    pub fn from_image(image: &'a image::GrayImage) -> Result<GrayFrame<'a>> {
        let (width, height) = image.dimensions();
        GrayFrame::new(image.as_raw(), width as usize, height as usize)
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Pixels of row `y`, without padding.
    ///
    /// # Panics
    /// Panics if `y` is outside the frame.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height, "row {} out of bounds for height {}", y, self.height);
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Intensity at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the frame.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        assert_in_bounds(x, y, self.width, self.height);
        self.data[y * self.stride + x]
    }

    /// Iterates over the rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        let frame = *self;
        (0..self.height).map(move |y| frame.row(y))
    }
}

/// Four-channel 8-bit frame the display stage writes into.
#[derive(Debug)]
pub struct RgbaFrameMut<'a> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a mut [u8],
}

impl<'a> RgbaFrameMut<'a> {
    /// Wraps a tightly packed buffer of `width * height * 4` bytes.
    pub fn new(data: &'a mut [u8], width: usize, height: usize) -> Result<RgbaFrameMut<'a>> {
        let stride = width
            .checked_mul(RGBA_CHANNELS)
            .ok_or_else(|| FrameError::geometry("row size overflows"))?;
        RgbaFrameMut::with_stride(data, width, height, stride)
    }

    /// Wraps a buffer whose rows start every `stride` bytes.
    pub fn with_stride(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<RgbaFrameMut<'a>> {
        check_layout(width, height, stride, RGBA_CHANNELS, data.len())?;
        Ok(RgbaFrameMut { width, height, stride, data })
    }

    /// Borrows the pixels of an owned `image` buffer for writing.
    pub fn from_image(image: &'a mut image::RgbaImage) -> Result<RgbaFrameMut<'a>> {
        let (width, height) = image.dimensions();
        RgbaFrameMut::new(&mut **image, width as usize, height as usize)
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Interleaved RGBA bytes of row `y`, without padding.
    ///
    /// # Panics
    /// Panics if `y` is outside the frame.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "row {} out of bounds for height {}", y, self.height);
        let start = y * self.stride;
        &self.data[start..start + self.width * RGBA_CHANNELS]
    }

    /// Mutable counterpart of [`RgbaFrameMut::row`].
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        assert!(y < self.height, "row {} out of bounds for height {}", y, self.height);
        let start = y * self.stride;
        &mut self.data[start..start + self.width * RGBA_CHANNELS]
    }

    /// RGBA value at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the frame.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        assert_in_bounds(x, y, self.width, self.height);
        let i = y * self.stride + x * RGBA_CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

#[inline]
fn assert_in_bounds(x: usize, y: usize, width: usize, height: usize) {
    assert!(
        x < width && y < height,
        "pixel ({}, {}) out of bounds for {}x{} frame",
        x,
        y,
        width,
        height
    );
}

/// Rejects an input/output pair whose pixel grids differ.
pub(crate) fn check_same_size(src: (usize, usize), dst: (usize, usize)) -> Result<()> {
    if src != dst {
        return Err(FrameError::geometry(format!(
            "input is {}x{} but output is {}x{}",
            src.0, src.1, dst.0, dst.1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_rows_skip_padding() {
        let data = [1u8, 2, 3, 99, 4, 5, 6, 99, 7, 8, 9];
        let frame = GrayFrame::with_stride(&data, 3, 3, 4).unwrap();
        assert_eq!(frame.row(0), &[1, 2, 3]);
        assert_eq!(frame.row(1), &[4, 5, 6]);
        assert_eq!(frame.row(2), &[7, 8, 9]);
        assert_eq!(frame.get(2, 1), 6);
        assert_eq!(frame.rows().count(), 3);
    }

    #[test]
    fn zero_dimensions_are_geometry_errors() {
        let data = [0u8; 4];
        assert!(matches!(GrayFrame::new(&data, 0, 4), Err(FrameError::InvalidGeometry { .. })));
        assert!(matches!(GrayFrame::new(&data, 4, 0), Err(FrameError::InvalidGeometry { .. })));
    }

    #[test]
    fn short_or_empty_buffers_are_rejected() {
        let err = GrayFrame::new(&[], 2, 2).unwrap_err();
        assert_eq!(err, FrameError::InvalidBuffer { required: 4, actual: 0 });

        let mut data = vec![0u8; 15];
        let err = RgbaFrameMut::new(&mut data, 2, 2).unwrap_err();
        assert_eq!(err, FrameError::InvalidBuffer { required: 16, actual: 15 });
    }

    #[test]
    fn stride_must_hold_a_row() {
        let mut data = vec![0u8; 64];
        let err = RgbaFrameMut::with_stride(&mut data, 4, 2, 12).unwrap_err();
        assert!(matches!(err, FrameError::InvalidGeometry { .. }));
        assert!(RgbaFrameMut::with_stride(&mut data, 4, 2, 20).is_ok());
    }

    #[test]
    fn last_row_needs_no_trailing_padding() {
        let data = [0u8; 7];
        assert!(GrayFrame::with_stride(&data, 3, 2, 4).is_ok());
    }

    #[test]
    fn views_over_image_buffers() {
        let gray = image::GrayImage::from_pixel(5, 3, image::Luma([7]));
        let frame = GrayFrame::from_image(&gray).unwrap();
        assert_eq!(frame.dimensions(), (5, 3));
        assert_eq!(frame.get(4, 2), 7);

        let mut rgba = image::RgbaImage::new(5, 3);
        let mut frame = RgbaFrameMut::from_image(&mut rgba).unwrap();
        assert_eq!(frame.dimensions(), (5, 3));
        frame.row_mut(2)[16..20].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(frame.pixel(4, 2), [1, 2, 3, 4]);
        drop(frame);
        assert_eq!(rgba.get_pixel(4, 2).0, [1, 2, 3, 4]);
    }

    #[test]
    fn oversized_width_is_a_geometry_error() {
        let mut data = [0u8; 16];
        let err = RgbaFrameMut::new(&mut data, usize::MAX / 2, 1).unwrap_err();
        assert!(matches!(err, FrameError::InvalidGeometry { .. }));
        let err = GrayFrame::with_stride(&data, usize::MAX / 2, 3, usize::MAX).unwrap_err();
        assert!(matches!(err, FrameError::InvalidGeometry { .. }));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn gray_get_past_row_end_panics() {
        let data: Vec<u8> = (1..=9).collect();
        let frame = GrayFrame::new(&data, 3, 3).unwrap();
        frame.get(4, 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn gray_get_in_padding_panics() {
        let data = [1u8, 2, 3, 99, 4, 5, 6];
        let frame = GrayFrame::with_stride(&data, 3, 2, 4).unwrap();
        frame.get(3, 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn gray_row_past_height_panics() {
        let data = [0u8; 16];
        let frame = GrayFrame::new(&data, 4, 3).unwrap();
        frame.row(3);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn rgba_pixel_past_row_end_panics() {
        let mut data = vec![0u8; 3 * 3 * 4];
        let frame = RgbaFrameMut::new(&mut data, 3, 3).unwrap();
        frame.pixel(3, 1);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn rgba_row_mut_past_height_panics() {
        let mut data = vec![0u8; 64];
        let mut frame = RgbaFrameMut::new(&mut data, 2, 2).unwrap();
        frame.row_mut(2);
    }

    #[test]
    fn size_mismatch_is_reported() {
        assert!(check_same_size((4, 4), (4, 4)).is_ok());
        let err = check_same_size((4, 4), (4, 5)).unwrap_err();
        assert!(matches!(err, FrameError::InvalidGeometry { .. }));
    }
}
