//! Separable box and Gaussian blur over RGBA8 with clamp-to-edge sampling.
//!
//! Both kernels run a horizontal pass then a vertical pass. Every pass writes disjoint output rows
//! and reads an immutable source, so rows are fanned out across the rayon pool.
//!
//! - Box blur keeps exact `u32` window sums between passes and divides once at the end, so the
//!   separable result is bit-identical to the direct 2-D mean. The vertical pass runs on a
//!   transposed intermediate, letting both passes use the same O(1)-per-pixel sliding window.
//! - Gaussian blur keeps an `f32` intermediate and quantizes once with round-half-up.

use rayon::prelude::*;
use serde::Deserialize;

use crate::{
    foundation::{
        error::{PixformError, PixformResult},
        image::{CHANNELS, ImageBuffer, try_alloc},
    },
    kernels::Transform,
    params::{
        bind::BoundParams,
        schema::{FieldSpec, Schema},
    },
};

/// Built-in name of the box blur transform.
pub const BOX_BLUR: &str = "blur";
/// Built-in name of the Gaussian blur transform.
pub const GAUSSIAN_BLUR: &str = "gaussian_blur";

/// Largest accepted box radius. Keeps second-pass window sums inside `u32`.
pub const MAX_RADIUS: u32 = 1024;
/// Largest accepted Gaussian sigma.
pub const MAX_SIGMA: f32 = 256.0;
/// Largest accepted repeat count.
pub const MAX_ITERATIONS: u32 = 16;

/// Typed box blur configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoxBlurConfig {
    /// Window half-size; the window is `(2r+1)^2` pixels.
    pub radius: u32,
    /// How many times the blur is applied.
    pub iterations: u32,
}

/// Typed Gaussian blur configuration.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaussianBlurConfig {
    /// Standard deviation in pixels.
    pub sigma: f32,
    /// How many times the blur is applied.
    pub iterations: u32,
}

fn iterations_field() -> FieldSpec {
    FieldSpec::integer("iterations")
        .range(1, i64::from(MAX_ITERATIONS))
        .optional(1)
        .describe("number of times the blur is applied")
}

/// The `blur` transform (box filter).
#[derive(Debug)]
pub struct BoxBlurTransform {
    schema: Schema,
}

impl Default for BoxBlurTransform {
    fn default() -> Self {
        Self {
            schema: Schema::new()
                .field(
                    FieldSpec::integer("radius")
                        .range(1, i64::from(MAX_RADIUS))
                        .describe("window half-size in pixels"),
                )
                .field(iterations_field()),
        }
    }
}

impl Transform for BoxBlurTransform {
    fn name(&self) -> &str {
        BOX_BLUR
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn execute(&self, image: &ImageBuffer, params: &BoundParams) -> PixformResult<ImageBuffer> {
        let cfg: BoxBlurConfig = params.decode()?;
        repeat(image, cfg.iterations, |img| box_blur(img, cfg.radius))
    }
}

/// The `gaussian_blur` transform.
#[derive(Debug)]
pub struct GaussianBlurTransform {
    schema: Schema,
}

impl Default for GaussianBlurTransform {
    fn default() -> Self {
        Self {
            schema: Schema::new()
                .field(
                    // Exclusive bound at the smallest normal f32 so binding never yields a
                    // sigma that rounds to zero in the kernel.
                    FieldSpec::number("sigma")
                        .greater_than(f64::from(f32::MIN_POSITIVE))
                        .at_most(f64::from(MAX_SIGMA))
                        .describe("standard deviation in pixels"),
                )
                .field(iterations_field()),
        }
    }
}

impl Transform for GaussianBlurTransform {
    fn name(&self) -> &str {
        GAUSSIAN_BLUR
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn execute(&self, image: &ImageBuffer, params: &BoundParams) -> PixformResult<ImageBuffer> {
        let cfg: GaussianBlurConfig = params.decode()?;
        repeat(image, cfg.iterations, |img| gaussian_blur(img, cfg.sigma))
    }
}

fn repeat(
    src: &ImageBuffer,
    iterations: u32,
    pass: impl Fn(&ImageBuffer) -> PixformResult<ImageBuffer>,
) -> PixformResult<ImageBuffer> {
    if iterations == 0 || iterations > MAX_ITERATIONS {
        return Err(PixformError::config(format!(
            "iterations must be in 1..={MAX_ITERATIONS}, got {iterations}"
        )));
    }
    let mut out = pass(src)?;
    for _ in 1..iterations {
        out = pass(&out)?;
    }
    Ok(out)
}

/// Unweighted mean over the `(2r+1)^2` clamped window, per channel including alpha.
#[tracing::instrument(skip(src), fields(width = src.width(), height = src.height()))]
pub fn box_blur(src: &ImageBuffer, radius: u32) -> PixformResult<ImageBuffer> {
    if radius == 0 || radius > MAX_RADIUS {
        return Err(PixformError::config(format!(
            "box radius must be in 1..={MAX_RADIUS}, got {radius}"
        )));
    }
    let (width, height) = (src.width(), src.height());
    let (w, h) = (width as usize, height as usize);
    let r = radius as usize;
    let len = src.as_bytes().len();

    // Horizontal window sums, row-major (h rows of w pixels).
    let mut sums: Vec<u32> = try_alloc(len, width, height)?;
    sums.par_chunks_mut(w * CHANNELS)
        .zip(src.as_bytes().par_chunks(w * CHANNELS))
        .for_each(|(dst, row)| window_sums(row, dst, r));

    // Columns become rows (w rows of h pixels) so the vertical pass is another row sweep.
    let mut columns: Vec<u32> = try_alloc(len, width, height)?;
    transpose(&sums, &mut columns, w, h);
    sums.par_chunks_mut(h * CHANNELS)
        .zip(columns.par_chunks(h * CHANNELS))
        .for_each(|(dst, col)| window_sums(col, dst, r));

    let area = ((2 * r + 1) * (2 * r + 1)) as u32;
    let mut out = ImageBuffer::zeroed(width, height)?;
    out.as_bytes_mut()
        .par_chunks_mut(w * CHANNELS)
        .enumerate()
        .for_each(|(y, dst_row)| {
            for (x, px) in dst_row.chunks_exact_mut(CHANNELS).enumerate() {
                let base = (x * h + y) * CHANNELS;
                for (c, v) in px.iter_mut().enumerate() {
                    *v = ((sums[base + c] + area / 2) / area) as u8;
                }
            }
        });
    Ok(out)
}

/// Sliding-window sums of width `2r+1` along one line of RGBA pixels, clamping at both ends.
fn window_sums<T: Copy + Into<u32>>(src: &[T], dst: &mut [u32], r: usize) {
    let n = src.len() / CHANNELS;
    let last = n as isize - 1;
    let r = r as isize;
    let at = |i: isize, c: usize| -> u32 { src[i.clamp(0, last) as usize * CHANNELS + c].into() };

    for c in 0..CHANNELS {
        let mut acc: u32 = (-r..=r).map(|i| at(i, c)).sum();
        for x in 0..n as isize {
            dst[x as usize * CHANNELS + c] = acc;
            acc = acc + at(x + r + 1, c) - at(x - r, c);
        }
    }
}

/// `src` holds `h` rows of `w` pixels; `dst` receives `w` rows of `h` pixels.
fn transpose(src: &[u32], dst: &mut [u32], w: usize, h: usize) {
    dst.par_chunks_mut(h * CHANNELS)
        .enumerate()
        .for_each(|(x, dst_row)| {
            for (y, px) in dst_row.chunks_exact_mut(CHANNELS).enumerate() {
                let s = (y * w + x) * CHANNELS;
                px.copy_from_slice(&src[s..s + CHANNELS]);
            }
        });
}

/// Derived kernel radius: `ceil(3 * sigma)`, at least 1.
pub fn gaussian_radius(sigma: f32) -> usize {
    ((3.0 * f64::from(sigma)).ceil() as usize).max(1)
}

/// Normalized 1-D Gaussian weights at integer offsets `-r..=r`.
pub fn gaussian_kernel(sigma: f32) -> PixformResult<Vec<f32>> {
    if !sigma.is_finite() || sigma <= 0.0 || sigma > MAX_SIGMA {
        return Err(PixformError::config(format!(
            "gaussian sigma must be in (0, {MAX_SIGMA}], got {sigma}"
        )));
    }

    let r = gaussian_radius(sigma) as i64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return Err(PixformError::config("gaussian kernel sum is zero"));
    }
    Ok(weights.into_iter().map(|w| (w / sum) as f32).collect())
}

/// Separable Gaussian convolution with clamp-to-edge and round-half-up quantization.
#[tracing::instrument(skip(src), fields(width = src.width(), height = src.height()))]
pub fn gaussian_blur(src: &ImageBuffer, sigma: f32) -> PixformResult<ImageBuffer> {
    let kernel = gaussian_kernel(sigma)?;
    let (width, height) = (src.width(), src.height());
    let (w, h) = (width as isize, height as isize);
    let r = (kernel.len() / 2) as isize;
    let stride = src.stride();

    let mut tmp: Vec<f32> = try_alloc(src.as_bytes().len(), width, height)?;
    tmp.par_chunks_mut(stride)
        .zip(src.as_bytes().par_chunks(stride))
        .for_each(|(dst, row)| {
            for (x, px) in dst.chunks_exact_mut(CHANNELS).enumerate() {
                let mut acc = [0.0f32; CHANNELS];
                for (k, &kw) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - r).clamp(0, w - 1) as usize;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += kw * f32::from(row[sx * CHANNELS + c]);
                    }
                }
                px.copy_from_slice(&acc);
            }
        });

    let mut out = ImageBuffer::zeroed(width, height)?;
    out.as_bytes_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each_init(
            || vec![0.0f32; stride],
            |acc, (y, dst)| {
                acc.fill(0.0);
                for (k, &kw) in kernel.iter().enumerate() {
                    let sy = (y as isize + k as isize - r).clamp(0, h - 1) as usize;
                    let row = &tmp[sy * stride..(sy + 1) * stride];
                    for (a, &v) in acc.iter_mut().zip(row) {
                        *a += kw * v;
                    }
                }
                for (d, &a) in dst.iter_mut().zip(acc.iter()) {
                    *d = quantize(a);
                }
            },
        );
    Ok(out)
}

fn quantize(v: f32) -> u8 {
    // Inputs are non-negative, so `round` is round-half-up here.
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/blur.rs"]
mod tests;
