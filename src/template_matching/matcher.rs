//! Template matching implementation
//!
//! Zero-mean normalized cross-correlation over every offset of the template
//! inside the screenshot. Window statistics come from summed-area tables, so
//! only the cross term walks the template per offset.
use super::types::{Bitmap, MatchResult, Threshold};
use crate::error::{LocateError, LocateResult};
use image::{ImageBuffer, Luma};
use imageproc::template_matching::find_extremes;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Correlation score for every template offset, indexed by top-left corner
pub type ScoreSurface = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Sum of squared deviations below which a patch counts as flat
const FLAT_EPSILON: f64 = 1e-3;

/// Two flat patches with means closer than this are the same colour
const FLAT_MEAN_TOLERANCE: f64 = 0.5;

/// Find the best match of `template` in `screen` at or above `threshold`.
///
/// Ties keep the first offset in row-major order.
pub fn locate(screen: &Bitmap, template: &Bitmap, threshold: Threshold) -> LocateResult<MatchResult> {
    let surface = score_surface(screen, template)?;
    let extremes = find_extremes(&surface);
    let (x, y) = extremes.max_value_location;
    let best_score = extremes.max_value;

    log::debug!(
        "best correlation {:.4} at ({},{}) over {}x{} offsets (threshold {:.3})",
        best_score,
        x,
        y,
        surface.width(),
        surface.height(),
        threshold.value()
    );

    if !threshold.accepts(best_score) {
        return Err(LocateError::NotFound {
            best_score,
            threshold: threshold.value(),
        });
    }

    Ok(MatchResult {
        x,
        y,
        width: template.width(),
        height: template.height(),
        score: best_score,
    })
}

/// Compute the correlation surface of `template` over `screen`.
pub fn score_surface(screen: &Bitmap, template: &Bitmap) -> LocateResult<ScoreSurface> {
    validate(screen, template)?;

    let stats = TemplateStats::new(template);
    let tables = SummedArea::new(screen);
    let out_w = screen.width() - template.width() + 1;
    let out_h = screen.height() - template.height() + 1;

    let report_interval = (out_h as usize / 10).max(1);
    let rows_done = AtomicUsize::new(0);

    // Rows are independent; each worker fills whole surface rows.
    let mut surface = ScoreSurface::new(out_w, out_h);
    surface
        .par_chunks_mut(out_w as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = score_at(screen, &stats, &tables, x as u32, y as u32) as f32;
            }

            let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
            if done % report_interval == 0 {
                let progress_pct = (done as f32 / out_h as f32 * 100.0) as u32;
                log::trace!("  correlation scanning: {}%", progress_pct);
            }
        });

    Ok(surface)
}

fn score_at(screen: &Bitmap, stats: &TemplateStats, tables: &SummedArea, x: u32, y: u32) -> f64 {
    let (tw, th) = (stats.width, stats.height);
    let ch = stats.channels;
    let n = stats.samples_per_channel;

    let mut window_norm = 0.0;
    let mut window_means = [0.0f64; 3];
    for (c, mean) in window_means.iter_mut().enumerate().take(ch) {
        let sum = tables.sum(c, x, y, tw, th);
        let sum_sq = tables.sum_sq(c, x, y, tw, th);
        window_norm += (sum_sq - sum * sum / n).max(0.0);
        *mean = sum / n;
    }

    let window_flat = window_norm <= FLAT_EPSILON;
    match (stats.flat, window_flat) {
        (true, true) => {
            let same_colour = stats.means[..ch]
                .iter()
                .zip(&window_means[..ch])
                .all(|(t, w)| (t - w).abs() <= FLAT_MEAN_TOLERANCE);
            if same_colour { 1.0 } else { 0.0 }
        }
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let cross = stats.cross_term(screen, x, y);
            (cross / (stats.norm * window_norm).sqrt()).clamp(-1.0, 1.0)
        }
    }
}

fn validate(screen: &Bitmap, template: &Bitmap) -> LocateResult<()> {
    if screen.is_empty() || template.is_empty() {
        return Err(LocateError::invalid_input(format!(
            "empty image (screen {}x{}, template {}x{})",
            screen.width(),
            screen.height(),
            template.width(),
            template.height()
        )));
    }
    if template.width() > screen.width() || template.height() > screen.height() {
        return Err(LocateError::invalid_input(format!(
            "template {}x{} larger than screen {}x{}",
            template.width(),
            template.height(),
            screen.width(),
            screen.height()
        )));
    }
    if template.channels() != screen.channels() {
        return Err(LocateError::invalid_input(format!(
            "channel mismatch: screen has {}, template has {}",
            screen.channels(),
            template.channels()
        )));
    }
    Ok(())
}

/// Mean-subtracted template samples and their energy
struct TemplateStats {
    width: u32,
    height: u32,
    channels: usize,
    centered: Vec<f64>,
    means: [f64; 3],
    norm: f64,
    flat: bool,
    samples_per_channel: f64,
}

impl TemplateStats {
    fn new(template: &Bitmap) -> Self {
        let ch = template.channels() as usize;
        let n = template.width() as f64 * template.height() as f64;

        let mut means = [0.0f64; 3];
        for (i, &v) in template.pixels().iter().enumerate() {
            means[i % ch] += v as f64;
        }
        for mean in means.iter_mut().take(ch) {
            *mean /= n;
        }

        let centered: Vec<f64> = template
            .pixels()
            .iter()
            .enumerate()
            .map(|(i, &v)| v as f64 - means[i % ch])
            .collect();
        let norm: f64 = centered.iter().map(|d| d * d).sum();

        Self {
            width: template.width(),
            height: template.height(),
            channels: ch,
            centered,
            means,
            norm,
            flat: norm <= FLAT_EPSILON,
            samples_per_channel: n,
        }
    }

    /// Σ T'·I over the window at (x, y). Since Σ T' = 0 per channel this
    /// equals the covariance numerator without centring the window.
    fn cross_term(&self, screen: &Bitmap, x: u32, y: u32) -> f64 {
        let row_len = self.width as usize * self.channels;
        let start = x as usize * self.channels;
        let mut acc = 0.0;
        for ty in 0..self.height {
            let screen_row = &screen.row(y + ty)[start..start + row_len];
            let template_row = &self.centered[ty as usize * row_len..(ty as usize + 1) * row_len];
            acc += template_row
                .iter()
                .zip(screen_row)
                .map(|(t, &s)| t * s as f64)
                .sum::<f64>();
        }
        acc
    }
}

/// Per-channel summed-area tables of samples and squared samples
struct SummedArea {
    stride: usize,
    channels: usize,
    sums: Vec<u64>,
    sums_sq: Vec<u64>,
}

impl SummedArea {
    fn new(image: &Bitmap) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let ch = image.channels() as usize;
        let stride = w + 1;
        let mut sums = vec![0u64; stride * (h + 1) * ch];
        let mut sums_sq = vec![0u64; stride * (h + 1) * ch];

        for y in 0..h {
            let row = image.row(y as u32);
            for c in 0..ch {
                let mut run = 0u64;
                let mut run_sq = 0u64;
                for x in 0..w {
                    let v = row[x * ch + c] as u64;
                    run += v;
                    run_sq += v * v;
                    let above = (y * stride + x + 1) * ch + c;
                    let here = ((y + 1) * stride + x + 1) * ch + c;
                    sums[here] = sums[above] + run;
                    sums_sq[here] = sums_sq[above] + run_sq;
                }
            }
        }

        Self {
            stride,
            channels: ch,
            sums,
            sums_sq,
        }
    }

    fn rect(&self, table: &[u64], c: usize, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let idx = |xx: usize, yy: usize| (yy * self.stride + xx) * self.channels + c;
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        let total = table[idx(x1, y1)] + table[idx(x0, y0)] - table[idx(x0, y1)] - table[idx(x1, y0)];
        total as f64
    }

    fn sum(&self, c: usize, x: u32, y: u32, w: u32, h: u32) -> f64 {
        self.rect(&self.sums, c, x, y, w, h)
    }

    fn sum_sq(&self, c: usize, x: u32, y: u32, w: u32, h: u32) -> f64 {
        self.rect(&self.sums_sq, c, x, y, w, h)
    }
}
