//! potrace-core: pure raster-to-vector tracing engine (sans-IO).
//!
//! Converts a luminance bitmap into closed, filled outlines built from
//! straight segments and cubic Béziers:
//!
//! bitmap -> threshold -> binary mask -> contour decomposition -> prefix
//! sums -> longest-straight table -> best polygon (DP) -> vertex adjustment
//! -> corner/curve smoothing -> optional curve optimization -> `Curve`.
//!
//! [`Posterizer`] drives that pipeline multiple times at different
//! thresholds and stacks the results with per-layer alpha to approximate
//! continuous tone.

pub mod bitmap;
pub mod curve;
pub mod engine;
pub mod histogram;
pub mod ingest;
pub mod path;
pub mod posterizer;
pub mod types;

pub use bitmap::Bitmap;
pub use engine::{Potrace, Trace};
pub use histogram::Histogram;
pub use path::Path;
pub use posterizer::{
    FillStrategy, Posterizer, PosterizerLayer, PosterizerOptions, PosterizerResult, RangeDistribution, Steps,
};
pub use types::{Curve, Point, PotraceError, PotraceOptions, Tag, TurnPolicy};
