//! 256-bin luminance histogram: range statistics, dominant colour, and
//! Otsu-style multilevel thresholding (§4.B).

use std::collections::HashMap;

use crate::bitmap::Bitmap;

/// Number of discrete luminance levels.
pub const COLOR_DEPTH: usize = 256;

/// Statistics over a closed `[min, max]` range of luminance levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    /// Total pixel count in the range.
    pub pixels: u32,
    /// Mean luminance level, weighted by pixel count.
    pub mean: f64,
    /// Median luminance level, found by walking levels in ascending
    /// frequency order and summing until half the pixel count is reached.
    pub median: f64,
    /// Standard deviation of luminance level.
    pub std_dev: f64,
    /// Number of distinct levels with at least one pixel.
    pub unique: u32,
}

/// A 256-bin luminance histogram with lazily-built, cached derived data.
#[derive(Debug, Clone)]
pub struct Histogram {
    data: [u32; COLOR_DEPTH],
    pixels: u32,
    sorted_indices: Option<Vec<u8>>,
    stats_cache: HashMap<(u8, u8), Stats>,
    h_table: Option<Vec<f64>>,
}

impl Histogram {
    /// Collect a histogram in a single pass over a luminance bitmap (§4.B).
    #[must_use]
    pub fn collect_from_bitmap(bitmap: &Bitmap) -> Self {
        let mut data = [0u32; COLOR_DEPTH];
        for &v in bitmap.data() {
            data[usize::from(v)] += 1;
        }
        let pixels = data.iter().sum();
        Self {
            data,
            pixels,
            sorted_indices: None,
            stats_cache: HashMap::new(),
            h_table: None,
        }
    }

    /// Raw per-level counts.
    #[must_use]
    pub fn counts(&self) -> &[u32; COLOR_DEPTH] {
        &self.data
    }

    /// Total pixel count (`sum(counts) == pixels`, §8).
    #[must_use]
    pub fn pixels(&self) -> u32 {
        self.pixels
    }

    /// Levels `0..=255` sorted ascending by usage count (not by level),
    /// cached after first computation.
    fn sorted_indices(&mut self) -> &[u8] {
        self.sorted_indices.get_or_insert_with(|| {
            let mut idx: Vec<u8> = (0..=255u8).collect();
            idx.sort_by_key(|&i| self.data[usize::from(i)]);
            idx
        })
    }

    /// Statistics over `[min, max]`, cached by the `(min, max)` key.
    #[must_use]
    pub fn get_stats(&mut self, min: u8, max: u8) -> Stats {
        if let Some(stats) = self.stats_cache.get(&(min, max)) {
            return *stats;
        }

        let data = self.data;
        let sorted = self.sorted_indices().to_vec();
        let in_range = |level: u8| level >= min && level <= max;

        let mut pixels = 0u32;
        let mut sum = 0f64;
        let mut unique = 0u32;
        for &level in sorted.iter().filter(|&&l| in_range(l)) {
            let cnt = data[usize::from(level)];
            if cnt > 0 {
                unique += 1;
            }
            pixels += cnt;
            sum += f64::from(level) * f64::from(cnt);
        }

        let mean = if pixels > 0 {
            sum / f64::from(pixels)
        } else {
            f64::NAN
        };

        let half = f64::from(pixels) / 2.0;
        let mut median = f64::NAN;
        let mut cumulative = 0u32;
        for &level in sorted.iter().filter(|&&l| in_range(l)) {
            cumulative += data[usize::from(level)];
            if f64::from(cumulative) >= half {
                median = f64::from(level);
                break;
            }
        }

        let mut variance_sum = 0f64;
        for &level in sorted.iter().filter(|&&l| in_range(l)) {
            let cnt = data[usize::from(level)];
            let delta = f64::from(level) - mean;
            variance_sum += delta * delta * f64::from(cnt);
        }
        let std_dev = if pixels > 0 {
            (variance_sum / f64::from(pixels)).sqrt()
        } else {
            f64::NAN
        };

        let stats = Stats {
            pixels,
            mean,
            median,
            std_dev,
            unique,
        };
        self.stats_cache.insert((min, max), stats);
        stats
    }

    /// The level in `[min, max]` whose `[center - tolerance/2, center +
    /// tolerance - 1]` neighbourhood has the largest pixel count, ties broken
    /// toward the level with the larger count of its own. `None` if the
    /// range is empty.
    #[must_use]
    pub fn get_dominant_color(&self, min: u8, max: u8, tolerance: i32) -> Option<u8> {
        if min > max {
            return None;
        }
        let total_in_range: u32 = (min..=max).map(|v| self.data[usize::from(v)]).sum();
        if total_in_range == 0 {
            return None;
        }

        let mut best: Option<(u8, u32, u32)> = None;
        for center in min..=max {
            let lo = i32::from(center) - tolerance / 2;
            let hi = i32::from(center) + tolerance - 1;
            let window_sum: u32 = (lo..=hi)
                .filter_map(|v| u8::try_from(v).ok())
                .map(|v| self.data[usize::from(v)])
                .sum();
            let center_count = self.data[usize::from(center)];

            let better = match best {
                None => true,
                Some((_, best_window, best_center)) => {
                    window_sum > best_window
                        || (window_sum == best_window && center_count > best_center)
                }
            };
            if better {
                best = Some((center, window_sum, center_count));
            }
        }
        best.map(|(center, ..)| center)
    }

    /// Build the `P`/`S`/`H` lookup tables once, memoized.
    fn build_h_table(&mut self) {
        if self.h_table.is_some() {
            return;
        }
        let total = f64::from(self.pixels.max(1));
        let n = COLOR_DEPTH;
        let mut p = vec![0f64; n * n];
        let mut s = vec![0f64; n * n];

        // Diagonal: single-level segments.
        for i in 0..n {
            let cnt = f64::from(self.data[i]);
            #[allow(clippy::cast_precision_loss)]
            let level = i as f64;
            p[i * n + i] = cnt / total;
            s[i * n + i] = level * cnt / total;
        }

        // First row: cumulative probability/moment from level 0.
        for v in 1..n {
            let cnt = f64::from(self.data[v]);
            #[allow(clippy::cast_precision_loss)]
            let level = v as f64;
            p[v] = p[v - 1] + cnt / total;
            s[v] = s[v - 1] + level * cnt / total;
        }

        // General recurrence: P[u][v] = P[0][v] - P[0][u-1].
        for u in 1..n {
            for v in (u + 1)..n {
                p[u * n + v] = p[v] - p[u - 1];
                s[u * n + v] = s[v] - s[u - 1];
            }
        }

        let mut h = vec![0f64; n * n];
        for u in 0..n {
            for v in u..n {
                let pp = p[u * n + v];
                h[u * n + v] = if pp > 0.0 {
                    s[u * n + v] * s[u * n + v] / pp
                } else {
                    0.0
                };
            }
        }
        self.h_table = Some(h);
    }

    fn h(&self, i: u8, j: u8) -> f64 {
        self.h_table.as_ref().map_or(0.0, |table| {
            table[usize::from(i) * COLOR_DEPTH + usize::from(j)]
        })
    }

    /// Otsu-style selection of `amount` thresholds within `(min, max)`
    /// maximizing the sum of `H` over `amount + 1` consecutive segments.
    ///
    /// Implemented as an iterative dynamic program over the memoized `H`
    /// table rather than recursively (§9 redesign note). Returns a strictly
    /// increasing list of length `<= amount`; empty if `amount` segments of
    /// size `>= 1` don't fit in `[min, max]`.
    #[must_use]
    pub fn multilevel_thresholding(&mut self, amount: u8, min: u8, max: u8) -> Vec<u8> {
        if amount == 0 || min >= max {
            return Vec::new();
        }
        let amount = usize::from(amount);
        let range_len = usize::from(max - min) + 1;
        if range_len < amount + 1 {
            return Vec::new();
        }

        self.build_h_table();

        // best[s][j_idx] = max sum of H using s cuts, last segment ending at
        // level (min + j_idx). choice[s][j_idx] = the cut level chosen just
        // before this segment.
        let mut best = vec![vec![f64::NEG_INFINITY; range_len]; amount + 1];
        let mut choice = vec![vec![0u8; range_len]; amount + 1];

        for j_idx in 0..range_len {
            #[allow(clippy::cast_possible_truncation)]
            let j = min + j_idx as u8;
            best[0][j_idx] = self.h(min, j);
        }

        for s in 1..=amount {
            for j_idx in s..range_len {
                #[allow(clippy::cast_possible_truncation)]
                let j = min + j_idx as u8;
                let mut best_val = f64::NEG_INFINITY;
                let mut best_i = 0u8;
                for i_idx in (s - 1)..j_idx {
                    #[allow(clippy::cast_possible_truncation)]
                    let i = min + i_idx as u8;
                    let val = best[s - 1][i_idx] + self.h(i + 1, j);
                    if val > best_val {
                        best_val = val;
                        best_i = i;
                    }
                }
                best[s][j_idx] = best_val;
                choice[s][j_idx] = best_i;
            }
        }

        let mut thresholds = vec![0u8; amount];
        let mut j_idx = range_len - 1;
        for s in (1..=amount).rev() {
            let i = choice[s][j_idx];
            thresholds[s - 1] = i;
            j_idx = usize::from(i - min);
        }
        thresholds
    }

    /// Single-threshold auto-threshold, falling back to 128 when the image
    /// has too little range to split.
    #[must_use]
    pub fn auto_threshold(&mut self) -> u8 {
        self.multilevel_thresholding(1, 0, 255)
            .first()
            .copied()
            .unwrap_or(128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_from_values(values: &[u8], width: u32) -> Histogram {
        let height = u32::try_from(values.len()).unwrap_or(0) / width.max(1);
        let mut bitmap = Bitmap::new(width, height.max(1));
        bitmap.data_mut().copy_from_slice(values);
        Histogram::collect_from_bitmap(&bitmap)
    }

    #[test]
    fn pixels_equals_sum_of_counts() {
        let hist = histogram_from_values(&[0, 0, 128, 255, 255, 255], 6);
        assert_eq!(hist.pixels(), 6);
        assert_eq!(hist.counts().iter().sum::<u32>(), hist.pixels());
    }

    #[test]
    fn get_stats_full_range_matches_pixel_count() {
        let mut hist = histogram_from_values(&[10, 10, 20, 30], 4);
        let stats = hist.get_stats(0, 255);
        assert_eq!(stats.pixels, 4);
        assert_eq!(stats.unique, 3);
    }

    #[test]
    fn get_stats_empty_range_is_nan() {
        let mut hist = histogram_from_values(&[10, 10, 20, 30], 4);
        let stats = hist.get_stats(100, 120);
        assert_eq!(stats.pixels, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.median.is_nan());
        assert!(stats.std_dev.is_nan());
    }

    #[test]
    fn get_stats_is_cached() {
        let mut hist = histogram_from_values(&[5, 5, 5, 5], 4);
        let first = hist.get_stats(0, 255);
        let second = hist.get_stats(0, 255);
        assert_eq!(first, second);
    }

    #[test]
    fn dominant_color_picks_highest_count() {
        let mut values = vec![50u8; 1];
        values.extend(std::iter::repeat_n(200u8, 10));
        let hist = histogram_from_values(&values, 11);
        assert_eq!(hist.get_dominant_color(0, 255, 4), Some(200));
    }

    #[test]
    fn dominant_color_none_when_range_empty() {
        let hist = histogram_from_values(&[10, 10], 2);
        assert_eq!(hist.get_dominant_color(200, 255, 4), None);
    }

    #[test]
    fn multilevel_thresholding_empty_when_no_room() {
        let mut hist = histogram_from_values(&[10, 10], 2);
        assert!(hist.multilevel_thresholding(5, 0, 3).is_empty());
    }

    #[test]
    fn multilevel_thresholding_is_strictly_increasing() {
        let mut values = Vec::new();
        values.extend(std::iter::repeat_n(10u8, 20));
        values.extend(std::iter::repeat_n(100u8, 20));
        values.extend(std::iter::repeat_n(200u8, 20));
        let mut hist = histogram_from_values(&values, 60);
        let thresholds = hist.multilevel_thresholding(2, 0, 255);
        assert!(thresholds.len() <= 2);
        assert!(thresholds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn auto_threshold_separates_bimodal_distribution() {
        let mut values = Vec::new();
        values.extend(std::iter::repeat_n(0u8, 50));
        values.extend(std::iter::repeat_n(255u8, 50));
        let mut hist = histogram_from_values(&values, 100);
        let t = hist.auto_threshold();
        assert!(t > 0 && t < 255);
    }
}
