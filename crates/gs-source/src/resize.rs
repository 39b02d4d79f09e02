//! Rééchantillonnage bilinéaire des grilles de luminance.
//!
//! Le pas source est `(src - 1) / (dest - 1)`, corrigé quand l'arrondi
//! dépasserait le dernier échantillon. Les lignes destination sont calculées
//! en parallèle avec rayon.

use gs_core::grid::LuminanceGrid;
use gs_core::ramp::SAMPLE_MAX;
use rayon::prelude::*;

/// Position continue d'un échantillon destination sur un axe source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AxisSample {
    /// `floor` of the source coordinate.
    pub low: usize,
    /// `ceil` of the source coordinate, clamped to the last source index.
    pub high: usize,
    /// Fractional part, weight of `high`.
    pub weight: f64,
}

/// Source step per destination step: `(src - 1) / (dest - 1)`.
///
/// Reduced by one source unit when rounding would index past the last
/// sample. Zero when either axis has a single sample.
pub(crate) fn axis_ratio(src: usize, dest: usize) -> f64 {
    if src <= 1 || dest <= 1 {
        return 0.0;
    }
    let last = (src - 1) as f64;
    let span = (dest - 1) as f64;
    let ratio = last / span;
    if ratio * span > last {
        (src - 2) as f64 / span
    } else {
        ratio
    }
}

#[inline(always)]
pub(crate) fn axis_sample(index: usize, ratio: f64, src: usize) -> AxisSample {
    let pos = index as f64 * ratio;
    let last = src.saturating_sub(1);
    let low = (pos.floor() as usize).min(last);
    let high = (pos.ceil() as usize).min(last);
    AxisSample {
        low,
        high,
        weight: pos - low as f64,
    }
}

/// Linear blend of two samples. Stays within `[min(a, b), max(a, b)]`.
#[inline(always)]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Redimensionne une grille par interpolation bilinéaire.
///
/// Copie à l'identique si les dimensions sont inchangées (scale factor 1.0).
/// For each destination cell the four source corners `v1` (low, low),
/// `v2` (high x), `v3` (high y), `v4` (high, high) are blended as
/// `v1·(1-xw)(1-yw) + v2·xw(1-yw) + v3·(1-xw)yw + v4·xw·yw`, then truncated.
/// Rows are computed in parallel. No cancellation checks happen here.
///
/// # Example
/// ```
/// use gs_core::grid::LuminanceGrid;
/// use gs_source::resize::resample;
///
/// let src = LuminanceGrid::from_raw(4, 1, vec![0, 30, 60, 90]).unwrap();
/// let dst = resample(&src, 3, 1);
/// assert_eq!(dst.as_slice(), &[0, 45, 90]);
/// ```
#[must_use]
pub fn resample(src: &LuminanceGrid, dest_width: usize, dest_height: usize) -> LuminanceGrid {
    if dest_width == src.width() && dest_height == src.height() {
        return src.clone();
    }
    let mut dst = LuminanceGrid::new(dest_width, dest_height);
    if dest_width == 0 || dest_height == 0 || src.width() == 0 || src.height() == 0 {
        return dst;
    }

    let (width, height) = (src.width(), src.height());
    let xratio = axis_ratio(width, dest_width);
    let yratio = axis_ratio(height, dest_height);
    let columns: Vec<AxisSample> = (0..dest_width)
        .map(|w| axis_sample(w, xratio, width))
        .collect();

    dst.as_mut_slice()
        .par_chunks_mut(dest_width)
        .enumerate()
        .for_each(|(h, out_row)| {
            let y = axis_sample(h, yratio, height);
            let top = src.row(y.low);
            let bottom = src.row(y.high);
            for (out, x) in out_row.iter_mut().zip(&columns) {
                let v1 = f64::from(top[x.low]);
                let v2 = f64::from(top[x.high]);
                let v3 = f64::from(bottom[x.low]);
                let v4 = f64::from(bottom[x.high]);
                let upper = lerp(v1, v2, x.weight);
                let lower = lerp(v3, v4, x.weight);
                let px = lerp(upper, lower, y.weight);
                *out = (px as u8).min(SAMPLE_MAX);
            }
        });

    dst
}

/// Convenience: downscale by `scale_factor` using `floor(dim / scale_factor)`.
///
/// # Example
/// ```
/// use gs_core::grid::LuminanceGrid;
/// use gs_source::resize::resample_by;
///
/// let src = LuminanceGrid::new(9, 4);
/// let dst = resample_by(&src, 2.0);
/// assert_eq!((dst.width(), dst.height()), (4, 2));
/// ```
#[must_use]
pub fn resample_by(src: &LuminanceGrid, scale_factor: f32) -> LuminanceGrid {
    let scale = f64::from(scale_factor);
    let dest = |dim: usize| (dim as f64 / scale).floor().max(0.0) as usize;
    resample(src, dest(src.width()), dest(src.height()))
}
