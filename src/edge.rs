use std::time::Instant;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{FrameError, Result};
use crate::frame::GrayFrame;
use crate::params::CannyParams;

/// Value of an edge pixel in an [`EdgeMap`]. Non-edges are zero.
pub const EDGE: u8 = 255;

const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

/// Binary single-channel result of the detector, same size as its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl EdgeMap {
    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Either [`EDGE`] or zero.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the map.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) out of bounds for {}x{} edge map",
            x,
            y,
            self.width,
            self.height
        );
        self.data[y * self.width + x]
    }

    /// Whether `(x, y)` is an edge pixel.
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == EDGE
    }

    /// Row-major pixels without padding.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Number of edge pixels.
    pub fn edge_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == EDGE).count()
    }

    /// Borrows the map as a single-channel frame.
    pub fn as_frame(&self) -> GrayFrame<'_> {
        GrayFrame::packed(&self.data, self.width, self.height)
    }

    /// Copies the map into an owned `image` buffer.
    pub fn to_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([self.get(x as usize, y as usize)])
        })
    }
}

/// Gradient direction, quantised to the axis or diagonal it lies closest to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Orientation {
    Horizontal,
    Vertical,
    /// Along (1, 1) in image coordinates, y pointing down.
    Falling,
    /// Along (1, -1).
    Rising,
}

impl Orientation {
    fn from_gradient(gx: f32, gy: f32) -> Orientation {
        let (ax, ay) = (gx.abs(), gy.abs());
        if ay <= ax * TAN_22_5 {
            Orientation::Horizontal
        } else if ay >= ax * TAN_67_5 {
            Orientation::Vertical
        } else if (gx < 0.0) == (gy < 0.0) {
            Orientation::Falling
        } else {
            Orientation::Rising
        }
    }

    /// Offsets of the two neighbours lying along the gradient, behind and ahead.
    fn neighbours(self) -> [(isize, isize); 2] {
        match self {
            Orientation::Horizontal => [(-1, 0), (1, 0)],
            Orientation::Vertical => [(0, -1), (0, 1)],
            Orientation::Falling => [(-1, -1), (1, 1)],
            Orientation::Rising => [(1, -1), (-1, 1)],
        }
    }
}

/// Per-pixel gradient magnitude and quantised direction. Lives only while a
/// frame is being processed.
pub(crate) struct GradientField {
    width: usize,
    height: usize,
    magnitude: Vec<f32>,
    orientation: Vec<Orientation>,
}

impl GradientField {
    /// Magnitude at `(x + dx, y + dy)`, zero outside the frame.
    fn magnitude_at(&self, x: usize, y: usize, (dx, dy): (isize, isize)) -> f32 {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx >= self.width as isize || ny >= self.height as isize {
            return 0.0;
        }
        self.magnitude[ny as usize * self.width + nx as usize]
    }
}

/// Runs `f` over every `width`-sized row of `out`, in parallel when enabled.
fn fill_rows<T, F>(out: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| f(y, row));
    #[cfg(not(feature = "parallel"))]
    out.chunks_mut(width).enumerate().for_each(|(y, row)| f(y, row));
}

/// Row `order` of Pascal's triangle: `binomial(2) == [1, 2, 1]`.
fn binomial(order: usize) -> Vec<f32> {
    let mut row = vec![1.0f32];
    for _ in 0..order {
        let mut next = vec![0.0f32; row.len() + 1];
        for (i, c) in row.iter().enumerate() {
            next[i] += c;
            next[i + 1] += c;
        }
        row = next;
    }
    row
}

/// Low-pass kernel of length `aperture` with unit sum.
fn smoothing_kernel(aperture: usize) -> Vec<f32> {
    let kernel = binomial(aperture - 1);
    let sum: f32 = kernel.iter().sum();
    kernel.iter().map(|c| c / sum).collect()
}

/// Separable Sobel kernel pair of length `aperture`: (derivative, smoothing).
///
/// The derivative part is a binomial of order `aperture - 3` convolved with
/// `[-1, 0, 1]`, giving the familiar `[-1, 0, 1]` and `[-1, -2, 0, 2, 1]`.
fn sobel_kernels(aperture: usize) -> (Vec<f32>, Vec<f32>) {
    let base = binomial(aperture - 3);
    let mut derivative = vec![0.0f32; aperture];
    for (i, c) in base.iter().enumerate() {
        derivative[i] -= c;
        derivative[i + 2] += c;
    }
    (derivative, binomial(aperture - 1))
}

/// Index `i + k - radius`, replicating the border pixel past either end.
#[inline]
fn clamped(i: usize, k: usize, radius: usize, len: usize) -> usize {
    (i + k).saturating_sub(radius).min(len - 1)
}

fn correlate_rows(src: &[f32], width: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = kernel.len() / 2;
    let mut out = vec![0.0f32; src.len()];
    fill_rows(&mut out, width, |y, row| {
        let line = &src[y * width..(y + 1) * width];
        for (x, v) in row.iter_mut().enumerate() {
            *v = kernel
                .iter()
                .enumerate()
                .map(|(k, c)| c * line[clamped(x, k, radius, width)])
                .sum();
        }
    });
    out
}

fn correlate_columns(src: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = kernel.len() / 2;
    let mut out = vec![0.0f32; src.len()];
    fill_rows(&mut out, width, |y, row| {
        for (x, v) in row.iter_mut().enumerate() {
            *v = kernel
                .iter()
                .enumerate()
                .map(|(k, c)| c * src[clamped(y, k, radius, height) * width + x])
                .sum();
        }
    });
    out
}

/// Blurs the frame with a binomial kernel of the configured aperture.
fn smooth(frame: &GrayFrame, aperture: usize) -> Vec<f32> {
    let (width, height) = frame.dimensions();
    let samples: Vec<f32> = frame.rows().flat_map(|row| row.iter().map(|&v| v as f32)).collect();
    let kernel = smoothing_kernel(aperture);
    let blurred = correlate_rows(&samples, width, &kernel);
    correlate_columns(&blurred, width, height, &kernel)
}

/// Computes Sobel derivatives of the smoothed frame and folds them into a
/// magnitude and a quantised direction per pixel.
fn gradient_field(
    smoothed: &[f32],
    width: usize,
    height: usize,
    params: &CannyParams,
) -> GradientField {
    let (derivative, smoothing) = sobel_kernels(params.aperture as usize);
    let dx_rows = correlate_rows(smoothed, width, &derivative);
    let gx = correlate_columns(&dx_rows, width, height, &smoothing);
    let sx_rows = correlate_rows(smoothed, width, &smoothing);
    let gy = correlate_columns(&sx_rows, width, height, &derivative);

    let l2 = params.l2_gradient;
    let mut magnitude = vec![0.0f32; smoothed.len()];
    fill_rows(&mut magnitude, width, |y, row| {
        for (x, m) in row.iter_mut().enumerate() {
            let (dx, dy) = (gx[y * width + x], gy[y * width + x]);
            *m = if l2 {
                (dx * dx + dy * dy).sqrt()
            } else {
                dx.abs() + dy.abs()
            };
        }
    });
    let orientation = gx
        .iter()
        .zip(gy.iter())
        .map(|(&dx, &dy)| Orientation::from_gradient(dx, dy))
        .collect();

    GradientField {
        width,
        height,
        magnitude,
        orientation,
    }
}

/// Narrows gradient ridges down to a single pixel by zeroing every magnitude
/// that is not a peak along its own gradient direction.
///
/// On a flat two-pixel ridge along an axis the pixel behind the ridge wins, so
/// a step edge still yields a line one pixel wide.
fn suppress_non_maxima(field: &GradientField) -> Vec<f32> {
    let width = field.width;
    let mut thinned = vec![0.0f32; field.magnitude.len()];
    fill_rows(&mut thinned, width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let m = field.magnitude[y * width + x];
            if m <= 0.0 {
                continue;
            }
            let orientation = field.orientation[y * width + x];
            let [behind, ahead] = orientation.neighbours();
            let behind = field.magnitude_at(x, y, behind);
            let ahead = field.magnitude_at(x, y, ahead);
            let is_peak = match orientation {
                Orientation::Horizontal | Orientation::Vertical => m > behind && m >= ahead,
                Orientation::Falling | Orientation::Rising => m > behind && m > ahead,
            };
            if is_peak {
                *out = m;
            }
        }
    });
    thinned
}

/// Keeps every thinned pixel at or above `high` plus every pixel at or above
/// `low` that is 8-connected to one of them, directly or through other such
/// pixels.
fn hysteresis(thinned: &[f32], width: usize, height: usize, low: f32, high: f32) -> Vec<u8> {
    let is_candidate = |m: f32| m > 0.0 && m >= low;
    let mut edges = vec![0u8; thinned.len()];
    let mut stack = Vec::new();
    for seed in 0..thinned.len() {
        if thinned[seed] < high || edges[seed] == EDGE {
            continue;
        }
        // Pixels are marked when pushed, so each enters the stack at most once.
        edges[seed] = EDGE;
        stack.push(seed);
        while let Some(top) = stack.pop() {
            let (x, y) = (top % width, top / width);
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let nb = ny * width + nx;
                    if edges[nb] != EDGE && is_candidate(thinned[nb]) {
                        edges[nb] = EDGE;
                        stack.push(nb);
                    }
                }
            }
        }
    }
    edges
}

/// Rejects frames the kernels would have to read past on both sides at once.
pub(crate) fn check_aperture_fits(frame: &GrayFrame, params: &CannyParams) -> Result<()> {
    let (width, height) = frame.dimensions();
    let aperture = params.aperture as usize;
    if width < aperture || height < aperture {
        return Err(FrameError::geometry(format!(
            "{}x{} frame is smaller than the {}x{} aperture",
            width, height, aperture, aperture
        )));
    }
    Ok(())
}

/// Finds the edges in a single-channel frame using the Canny method.
///
/// The frame is smoothed, differentiated with a Sobel operator, thinned by
/// non-maximum suppression and finally linked by hysteresis between
/// `params.low_threshold` and `params.high_threshold`.
pub fn detect_edges(frame: &GrayFrame, params: &CannyParams) -> Result<EdgeMap> {
    params.validate()?;
    check_aperture_fits(frame, params)?;
    let (width, height) = frame.dimensions();
    debug_assert!(params.radius() < width && params.radius() < height);

    let start = Instant::now();
    let smoothed = smooth(frame, params.aperture as usize);
    let field = gradient_field(&smoothed, width, height, params);
    let gradient_at = start.elapsed();
    let thinned = suppress_non_maxima(&field);
    let suppression_at = start.elapsed();
    let data = hysteresis(&thinned, width, height, params.low_threshold, params.high_threshold);
    debug!(
        "edges {}x{}: gradient {:?}, suppression {:?}, hysteresis {:?}",
        width,
        height,
        gradient_at,
        suppression_at - gradient_at,
        start.elapsed() - suppression_at
    );

    Ok(EdgeMap { width, height, data })
}

/// Convenience wrapper over [`detect_edges`] for owned images.
pub fn canny(image: &image::GrayImage, params: &CannyParams) -> Result<image::GrayImage> {
    let frame = GrayFrame::from_image(image)?;
    Ok(detect_edges(&frame, params)?.to_image())
}


#[cfg(all(test, feature = "unstable"))]
mod benchmarks {
    extern crate test;
    use super::*;

    fn rings(width: u32, height: u32) -> image::GrayImage {
        image::GrayImage::from_fn(width, height, |x, y| {
            let (dx, dy) = (x as f32 - width as f32 / 2.0, y as f32 - height as f32 / 2.0);
            let ring = ((dx * dx + dy * dy).sqrt() / 12.0) as u32;
            image::Luma([if ring % 2 == 0 { 40 } else { 220 }])
        })
    }

    #[bench]
    fn bench_gradient_field(b: &mut test::Bencher) {
        let image = rings(640, 480);
        let frame = GrayFrame::from_image(&image).unwrap();
        let params = CannyParams::default();
        b.iter(|| {
            let smoothed = smooth(&frame, 3);
            gradient_field(&smoothed, 640, 480, &params)
        });
    }

    #[bench]
    fn bench_suppress_non_maxima(b: &mut test::Bencher) {
        let image = rings(640, 480);
        let frame = GrayFrame::from_image(&image).unwrap();
        let field = gradient_field(&smooth(&frame, 3), 640, 480, &CannyParams::default());
        b.iter(|| suppress_non_maxima(&field));
    }

    #[bench]
    fn bench_hysteresis(b: &mut test::Bencher) {
        let image = rings(640, 480);
        let frame = GrayFrame::from_image(&image).unwrap();
        let field = gradient_field(&smooth(&frame, 3), 640, 480, &CannyParams::default());
        let thinned = suppress_non_maxima(&field);
        b.iter(|| hysteresis(&thinned, 640, 480, 50.0, 150.0));
    }

    #[bench]
    fn bench_detect_edges(b: &mut test::Bencher) {
        let image = rings(640, 480);
        let frame = GrayFrame::from_image(&image).unwrap();
        let params = CannyParams::default();
        b.iter(|| detect_edges(&frame, &params).unwrap());
    }
}
