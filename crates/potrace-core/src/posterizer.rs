//! Multi-layer posterizer: chooses N thresholds and stacks N independent
//! tracings with compositing-corrected opacity to approximate continuous
//! tone (§4.J).

use crate::bitmap::Bitmap;
use crate::engine::{Potrace, Trace};
use crate::histogram::Histogram;
use crate::types::{PotraceError, PotraceOptions};

/// How many threshold levels to trace, and where they come from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Steps {
    /// Choose the count automatically (§4.J step 2).
    Auto,
    /// Use exactly this many levels, distributed per [`RangeDistribution`].
    Count(u8),
    /// Use exactly these levels (deduped, clamped, and merged with the main
    /// threshold).
    Explicit(Vec<u8>),
}

impl Default for Steps {
    fn default() -> Self {
        Self::Auto
    }
}

/// How a layer's representative intensity (and thus its fill opacity) is
/// derived from the pixels in its slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FillStrategy {
    /// Linear ramp across layers, scaled by the image's colour range.
    Spread,
    /// The most frequent luminance level in the slab.
    Dominant,
    /// The mean luminance level in the slab.
    Mean,
    /// The median luminance level in the slab.
    Median,
}

/// How automatically-chosen threshold levels are spread across the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RangeDistribution {
    /// Multilevel (Otsu-style) thresholding, merged with the main threshold.
    Auto,
    /// Evenly spaced between the image extreme and the main threshold.
    Equal,
}

/// Posterizer configuration (§4.J, §6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PosterizerOptions {
    /// Tracing parameters shared by every layer; only `threshold` varies
    /// between layers.
    pub trace: PotraceOptions,
    /// Step-count/level selection.
    pub steps: Steps,
    /// How each layer's opacity is derived.
    pub fill_strategy: FillStrategy,
    /// How automatic levels are spread across the range.
    pub range_distribution: RangeDistribution,
}

impl Default for PosterizerOptions {
    fn default() -> Self {
        Self {
            trace: PotraceOptions::default(),
            steps: Steps::default(),
            fill_strategy: FillStrategy::Spread,
            range_distribution: RangeDistribution::Auto,
        }
    }
}

/// One thresholded layer of a posterized image.
#[derive(Debug, Clone)]
pub struct PosterizerLayer {
    /// The luminance threshold this layer was traced at.
    pub threshold: u8,
    /// Compositing-corrected fill opacity for this layer.
    pub opacity: f64,
    /// The traced paths for this layer.
    pub trace: Trace,
}

/// The full set of layers produced by [`Posterizer::trace`], darkest/
/// brightest-first per §4.J's ordering rule.
#[derive(Debug, Clone)]
pub struct PosterizerResult {
    /// Source image width in pixels.
    pub width: u32,
    /// Source image height in pixels.
    pub height: u32,
    /// Layers in paint order.
    pub layers: Vec<PosterizerLayer>,
}

/// Distance from the main threshold to its polarity's extreme: the span of
/// levels actually available to posterize into, not the image's overall
/// luminance spread (§4.J steps 2-4).
fn colors_count(main_threshold: u8, black_on_white: bool) -> u8 {
    if black_on_white {
        main_threshold
    } else {
        255 - main_threshold
    }
}

/// Layered tracer built on a single, sequentially-reused [`Potrace`] engine
/// (§5).
#[derive(Debug, Clone)]
pub struct Posterizer {
    options: PosterizerOptions,
}

impl Posterizer {
    /// Build a posterizer with the given options.
    #[must_use]
    pub fn new(options: PosterizerOptions) -> Self {
        Self { options }
    }

    /// Current posterizer configuration.
    #[must_use]
    pub fn options(&self) -> &PosterizerOptions {
        &self.options
    }

    fn resolve_main_threshold(&self, hist: &mut Histogram) -> (u8, bool) {
        if let Some(t) = self.options.trace.threshold {
            return (t, false);
        }
        let levels = hist.multilevel_thresholding(2, 0, 255);
        let idx = usize::from(self.options.trace.black_on_white);
        (levels.get(idx).copied().unwrap_or(128), true)
    }

    fn resolve_step_count(&self, threshold_was_auto: bool, colors_count: u8) -> usize {
        match &self.options.steps {
            Steps::Count(n) => usize::from(*n),
            Steps::Explicit(levels) => levels.len().max(1),
            Steps::Auto => {
                if threshold_was_auto || colors_count > 200 {
                    4
                } else {
                    3
                }
            }
        }
    }

    fn build_explicit_thresholds(levels: &[u8], main: u8) -> Vec<u8> {
        let mut set: Vec<u8> = levels.to_vec();
        set.push(main);
        set.sort_unstable();
        set.dedup();
        set
    }

    fn build_auto_thresholds(hist: &mut Histogram, main: u8, step_count: usize) -> Vec<u8> {
        let k = u8::try_from(step_count.saturating_sub(1).max(1)).unwrap_or(255);
        let mut levels = hist.multilevel_thresholding(k, 0, 255);
        levels.push(main);
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    fn build_equal_thresholds(main: u8, step_count: usize, black_on_white: bool) -> Vec<u8> {
        let (lo, hi) = if black_on_white { (0u8, main) } else { (main, 255u8) };
        let mut levels: Vec<u8> = (1..=step_count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let frac = i as f64 / step_count as f64;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    (f64::from(lo) + frac * f64::from(hi - lo)).round().clamp(0.0, 255.0) as u8
                }
            })
            .collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    /// §4.J step 3: produce the sorted, deduped list of thresholds to trace.
    fn build_threshold_list(
        &self,
        hist: &mut Histogram,
        main: u8,
        threshold_was_auto: bool,
        colors_count: u8,
    ) -> Vec<u8> {
        if let Steps::Explicit(levels) = &self.options.steps {
            return Self::build_explicit_thresholds(levels, main);
        }

        let step_count = self.resolve_step_count(threshold_was_auto, colors_count);
        let available_range = usize::from(colors_count.max(2));
        let step_count = step_count.clamp(2, available_range);

        match self.options.range_distribution {
            RangeDistribution::Auto => Self::build_auto_thresholds(hist, main, step_count),
            RangeDistribution::Equal => {
                Self::build_equal_thresholds(main, step_count, self.options.trace.black_on_white)
            }
        }
    }

    /// §4.J step 4: representative intensity in `[0, 1]` for the slab
    /// `[floor, ceil)`, at position `index` of `total` in processing order.
    fn representative_intensity(
        &self,
        hist: &mut Histogram,
        floor: u8,
        ceil: u8,
        index: usize,
        total: usize,
        colors_count: u8,
    ) -> f64 {
        if self.options.fill_strategy == FillStrategy::Spread {
            #[allow(clippy::cast_precision_loss)]
            let ramp = (index + 1) as f64 / total.max(1) as f64;
            let scale = (f64::from(colors_count) / 255.0).max(0.5);
            return (ramp * scale).clamp(0.0, 1.0);
        }

        if ceil <= floor {
            return 0.0;
        }
        // Avoid the outer 10% of the slab toward the next threshold, so the
        // stat doesn't get dragged toward the boundary it's about to cross.
        let width = ceil - floor;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let margin = ((f64::from(width) * 0.1).round()) as u8;
        let inner_ceil = ceil.saturating_sub(margin).max(floor);

        let stats = hist.get_stats(floor, inner_ceil);
        if stats.pixels == 0 {
            return 0.0;
        }
        let level = if self.options.fill_strategy == FillStrategy::Dominant {
            hist.get_dominant_color(floor, inner_ceil, 4).map_or(stats.mean, f64::from)
        } else if self.options.fill_strategy == FillStrategy::Median {
            stats.median
        } else {
            stats.mean
        };
        (level / 255.0).clamp(0.0, 1.0)
    }

    /// Run the full pipeline over `bitmap`, producing one trace per
    /// threshold level with compositing-corrected opacity.
    ///
    /// # Errors
    ///
    /// Returns a [`PotraceError`] if any individual layer trace fails.
    pub fn trace(&self, bitmap: &Bitmap) -> Result<PosterizerResult, PotraceError> {
        let black_on_white = self.options.trace.black_on_white;
        let mut hist = Histogram::collect_from_bitmap(bitmap);

        let (main_threshold, threshold_was_auto) = self.resolve_main_threshold(&mut hist);
        let colors_count = colors_count(main_threshold, black_on_white);
        let mut levels = self.build_threshold_list(&mut hist, main_threshold, threshold_was_auto, colors_count);

        // Step 5: an extra deep-shadow stop for long, mostly-dark tails.
        if levels.len() >= 10 {
            if let (Some(&last), Some(&second_last)) = (levels.last(), levels.get(levels.len().wrapping_sub(2))) {
                let width = last.saturating_sub(second_last);
                let last_intensity =
                    self.representative_intensity(&mut hist, second_last, last, levels.len() - 1, levels.len(), colors_count);
                if width > 25 && last_intensity < 1.0 {
                    let stats = hist.get_stats(second_last, last);
                    if stats.pixels > 0 {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let extra = (stats.mean + stats.std_dev).round().clamp(0.0, 255.0) as u8;
                        levels.push(extra);
                        levels.sort_unstable();
                        levels.dedup();
                    }
                }
            }
        }

        // Processing order: darkest-first for black-on-white, otherwise
        // brightest-first.
        let mut order = levels.clone();
        if !black_on_white {
            order.reverse();
        }

        let total = order.len();
        let mut engine = Potrace::new();
        engine.load_bitmap(bitmap.clone());

        let mut prev = 0f64;
        let mut layers = Vec::with_capacity(total);
        let (mut width, mut height) = (bitmap.width, bitmap.height);

        for (index, &level) in order.iter().enumerate() {
            let slab_floor = levels.iter().copied().filter(|&l| l < level).max().unwrap_or(0);
            let intensity = self.representative_intensity(&mut hist, slab_floor, level, index, total, colors_count);

            let eff = if (prev - 1.0).abs() < f64::EPSILON {
                0.0
            } else {
                ((prev - intensity) / (prev - 1.0)).clamp(0.0, 1.0)
            };

            let mut layer_opts = self.options.trace.clone();
            layer_opts.threshold = Some(level);
            engine.set_parameters(layer_opts)?;
            let layer_trace = engine.process()?.clone();
            width = layer_trace.width;
            height = layer_trace.height;

            if eff <= 0.0 || layer_trace.paths.is_empty() {
                continue;
            }

            prev += (1.0 - prev) * eff;
            layers.push(PosterizerLayer {
                threshold: level,
                opacity: eff,
                trace: layer_trace,
            });
        }

        Ok(PosterizerResult { width, height, layers })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gradient_bitmap(width: u32) -> Bitmap {
        let mut bm = Bitmap::new(width, 1);
        for x in 0..width {
            #[allow(clippy::cast_possible_truncation)]
            let v = (x * 255 / width.max(1)) as u8;
            bm.data_mut()[x as usize] = v;
        }
        bm
    }

    #[test]
    fn colors_count_measures_distance_from_threshold_to_polarity_extreme() {
        assert_eq!(colors_count(200, true), 200);
        assert_eq!(colors_count(200, false), 55);
    }

    #[test]
    fn trace_gradient_produces_at_least_two_layers() {
        let bm = gradient_bitmap(256);
        let posterizer = Posterizer::new(PosterizerOptions {
            steps: Steps::Count(3),
            range_distribution: RangeDistribution::Equal,
            ..PosterizerOptions::default()
        });
        let result = posterizer.trace(&bm).unwrap();
        assert!(!result.layers.is_empty());
        assert_eq!(result.width, 256);
        assert_eq!(result.height, 1);
    }

    #[test]
    fn opacity_is_bounded_and_non_decreasing_prev() {
        let bm = gradient_bitmap(256);
        let posterizer = Posterizer::new(PosterizerOptions {
            steps: Steps::Count(4),
            ..PosterizerOptions::default()
        });
        let result = posterizer.trace(&bm).unwrap();
        for layer in &result.layers {
            assert!(layer.opacity >= 0.0 && layer.opacity <= 1.0);
        }
    }

    #[test]
    fn explicit_thresholds_include_main_threshold() {
        let levels = Posterizer::build_explicit_thresholds(&[50, 100, 100, 200], 128);
        assert!(levels.contains(&128));
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn equal_thresholds_span_toward_main_for_black_on_white() {
        let levels = Posterizer::build_equal_thresholds(120, 3, true);
        assert_eq!(levels.last().copied(), Some(120));
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
    }
}
