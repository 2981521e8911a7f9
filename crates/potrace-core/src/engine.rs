//! The `Potrace` engine: holds one loaded bitmap plus tracing parameters and
//! caches the resulting path list until a parameter change invalidates it
//! (§5, §6).

use crate::bitmap::Bitmap;
use crate::curve::build_curve;
use crate::histogram::Histogram;
use crate::ingest;
use crate::path::{self, Path};
use crate::types::{PotraceError, PotraceOptions};

/// The result of a successful [`Potrace::process`] call: every retained
/// contour, traced and curve-fitted, plus the source image's dimensions.
#[derive(Debug, Clone)]
pub struct Trace {
    /// Fitted contours, outer paths and holes alike.
    pub paths: Vec<Path>,
    /// Source image width in pixels.
    pub width: u32,
    /// Source image height in pixels.
    pub height: u32,
}

#[derive(Debug, Clone)]
enum LoadState {
    Empty,
    Loaded { bitmap: Bitmap, width: u32, height: u32 },
}

/// Stateful raster-to-vector tracing engine (§5, §6).
///
/// Owns at most one loaded bitmap and one cached [`Trace`]. Changing any
/// parameter other than a pure-rendering concern invalidates the cache;
/// [`Potrace::process`] rebuilds it on demand.
#[derive(Debug, Clone)]
pub struct Potrace {
    options: PotraceOptions,
    state: LoadState,
    trace: Option<Trace>,
}

impl Default for Potrace {
    fn default() -> Self {
        Self::new()
    }
}

impl Potrace {
    /// Create an engine with default parameters and nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: PotraceOptions::default(),
            state: LoadState::Empty,
            trace: None,
        }
    }

    /// Current tracing parameters.
    #[must_use]
    pub fn options(&self) -> &PotraceOptions {
        &self.options
    }

    /// Replace the tracing parameters, invalidating any cached trace.
    ///
    /// # Errors
    ///
    /// Returns [`PotraceError::InvalidParameter`] if `options.alpha_max` or
    /// `options.opt_tolerance` is negative, without mutating `self`.
    pub fn set_parameters(&mut self, options: PotraceOptions) -> Result<(), PotraceError> {
        if options.alpha_max < 0.0 {
            return Err(PotraceError::InvalidParameter("alpha_max must be >= 0".to_string()));
        }
        if options.opt_tolerance < 0.0 {
            return Err(PotraceError::InvalidParameter("opt_tolerance must be >= 0".to_string()));
        }
        self.options = options;
        self.trace = None;
        Ok(())
    }

    /// Decode `bytes` into a luminance bitmap and adopt it as the current
    /// image, invalidating any cached trace.
    ///
    /// # Errors
    ///
    /// Returns [`PotraceError::ImageLoad`] if decoding fails.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), PotraceError> {
        let (width, height, bitmap) = ingest::decode(bytes)?;
        self.state = LoadState::Loaded { bitmap, width, height };
        self.trace = None;
        Ok(())
    }

    /// Adopt an already-decoded luminance bitmap directly, invalidating any
    /// cached trace.
    pub fn load_bitmap(&mut self, bitmap: Bitmap) {
        let (width, height) = (bitmap.width, bitmap.height);
        self.state = LoadState::Loaded { bitmap, width, height };
        self.trace = None;
    }

    /// Resolve the effective threshold: the configured fixed value, or an
    /// automatically chosen one (§4.B) when `options.threshold` is `None`.
    fn resolve_threshold(&self, bitmap: &Bitmap) -> u8 {
        match self.options.threshold {
            Some(t) => t,
            None => Histogram::collect_from_bitmap(bitmap).auto_threshold(),
        }
    }

    /// Run the full pipeline (§4.A-I) on the loaded image, caching and
    /// returning the result. A no-op if a cached trace is already valid.
    ///
    /// # Errors
    ///
    /// Returns [`PotraceError::NotLoaded`] if no image has been loaded yet.
    pub fn process(&mut self) -> Result<&Trace, PotraceError> {
        if self.trace.is_some() {
            let trace = self.trace.as_ref().ok_or(PotraceError::NotLoaded)?;
            return Ok(trace);
        }

        let LoadState::Loaded { bitmap, width, height } = &self.state else {
            return Err(PotraceError::NotLoaded);
        };

        let threshold = self.resolve_threshold(bitmap);
        let mask = bitmap.threshold_mask(threshold, self.options.black_on_white);
        let width = *width;
        let height = *height;

        let mut paths = path::decompose(&mask, self.options.turn_policy, self.options.turd_size);
        for p in &mut paths {
            build_curve(p, self.options.alpha_max, self.options.opt_curve, self.options.opt_tolerance);
        }

        self.trace = Some(Trace { paths, width, height });
        self.trace.as_ref().ok_or(PotraceError::NotLoaded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled_rect(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> Bitmap {
        let mut bm = Bitmap::new(width, height);
        for y in y0..(y0 + h) {
            for x in x0..(x0 + w) {
                if let Some(idx) = bm.point_to_index(x as i32, y as i32) {
                    bm.data_mut()[idx] = 255;
                }
            }
        }
        bm
    }

    #[test]
    fn process_without_load_is_not_loaded_error() {
        let mut engine = Potrace::new();
        assert!(matches!(engine.process(), Err(PotraceError::NotLoaded)));
    }

    #[test]
    fn process_traces_a_solid_square() {
        let mut engine = Potrace::new();
        engine.load_bitmap(filled_rect(40, 40, 10, 10, 20, 20));
        let trace = engine.process().unwrap();
        assert_eq!(trace.paths.len(), 1);
        assert!(trace.paths[0].curve.is_some());
    }

    #[test]
    fn set_parameters_rejects_negative_alpha_max() {
        let mut engine = Potrace::new();
        let mut opts = PotraceOptions::default();
        opts.alpha_max = -1.0;
        assert!(engine.set_parameters(opts).is_err());
        assert!((engine.options().alpha_max - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn set_parameters_invalidates_cached_trace() {
        let mut engine = Potrace::new();
        engine.load_bitmap(filled_rect(40, 40, 10, 10, 20, 20));
        engine.process().unwrap();
        let mut opts = engine.options().clone();
        opts.turd_size = 0;
        engine.set_parameters(opts).unwrap();
        let trace = engine.process().unwrap();
        assert_eq!(trace.paths.len(), 1);
    }
}
