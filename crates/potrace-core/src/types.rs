//! Shared types for the potrace-core tracing engine.

/// A lattice point visited by the contour walker: exact integer pixel-edge
/// coordinates. `(-1, -1)` is the well-defined out-of-grid sentinel used by
/// [`crate::bitmap::Bitmap::point_to_index`] and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatticePoint {
    /// Horizontal lattice coordinate.
    pub x: i32,
    /// Vertical lattice coordinate.
    pub y: i32,
}

impl LatticePoint {
    /// Create a new lattice point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The `(-1, -1)` sentinel returned for out-of-grid lookups.
    #[must_use]
    pub const fn out_of_bounds() -> Self {
        Self { x: -1, y: -1 }
    }
}

impl From<LatticePoint> for Point {
    fn from(p: LatticePoint) -> Self {
        Self {
            x: f64::from(p.x),
            y: f64::from(p.y),
        }
    }
}

/// A real-valued 2D point: vertices, control points, prefix sums.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Componentwise midpoint.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation: `self + t * (other - self)`.
    #[must_use]
    pub fn interval(self, other: Self, t: f64) -> Self {
        Self::new(
            t.mul_add(other.x - self.x, self.x),
            t.mul_add(other.y - self.y, self.y),
        )
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Ambiguity resolution rule used by the contour walker when the pixels
/// diagonal to the current edge disagree (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum TurnPolicy {
    /// Prefer the turn that matches the contour's own sign (foreground).
    Black,
    /// Prefer the turn that matches the contour's own sign (background).
    White,
    /// Always turn left.
    Left,
    /// Always turn right.
    Right,
    /// Expanding-ring neighbourhood vote, preferring the majority colour.
    Majority,
    /// Expanding-ring neighbourhood vote, preferring the minority colour.
    #[default]
    Minority,
}

/// Whether a polygon vertex became a sharp corner or a smooth curve (§4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Two straight segments meeting at a hard vertex.
    Corner,
    /// A cubic Bézier through this vertex.
    Curve,
}

/// Per-vertex curve data produced by smoothing and (optionally) curve
/// optimization (§3, §4.H, §4.I).
#[derive(Debug, Clone, Default)]
pub struct Curve {
    /// Classification of each vertex.
    pub tag: Vec<Tag>,
    /// Three control points per vertex, flattened: `c[3*i + 0..3]`.
    pub c: Vec<Point>,
    /// The adjusted vertex itself.
    pub vertex: Vec<Point>,
    /// Smoothing parameter per vertex.
    pub alpha: Vec<f64>,
    /// Unclamped smoothing parameter per vertex (pre-corner-test value).
    pub alpha0: Vec<f64>,
    /// Curve-optimization blend parameter per vertex, 0.5 until merged.
    pub beta: Vec<f64>,
}

impl Curve {
    /// Allocate a curve with `m` vertices, all fields zeroed / default.
    #[must_use]
    pub fn with_len(m: usize) -> Self {
        Self {
            tag: vec![Tag::Corner; m],
            c: vec![Point::default(); 3 * m],
            vertex: vec![Point::default(); m],
            alpha: vec![0.0; m],
            alpha0: vec![0.0; m],
            beta: vec![0.5; m],
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertex.len()
    }

    /// Returns `true` if the curve has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty()
    }
}

/// Recognized tracing parameters (§6), with defaults matching the spec's
/// default column.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PotraceOptions {
    /// Ambiguity-resolution rule for the contour walker.
    pub turn_policy: TurnPolicy,
    /// Discard contours with `|area| <= turd_size`.
    pub turd_size: u32,
    /// Corner threshold: `alpha >= alpha_max` forces a CORNER tag.
    pub alpha_max: f64,
    /// Whether to run curve optimization (§4.I) after smoothing.
    pub opt_curve: bool,
    /// Maximum perpendicular error tolerated by curve optimization.
    pub opt_tolerance: f64,
    /// Fixed threshold in `[0, 255]`, or `None` for auto (§4.B).
    pub threshold: Option<u8>,
    /// Trace dark-on-light (`true`) or light-on-dark (`false`).
    pub black_on_white: bool,
}

impl Default for PotraceOptions {
    fn default() -> Self {
        Self {
            turn_policy: TurnPolicy::default(),
            turd_size: 2,
            alpha_max: 1.0,
            opt_curve: true,
            opt_tolerance: 0.2,
            threshold: None,
            black_on_white: true,
        }
    }
}

/// Errors that can occur while configuring or running the tracing engine.
#[derive(Debug, thiserror::Error)]
pub enum PotraceError {
    /// A parameter value was out of range or otherwise invalid.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The input image could not be decoded.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    /// Serialization was requested before a successful `load_image`.
    #[error("no image has been loaded")]
    NotLoaded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_point_converts_to_real_point() {
        let p: Point = LatticePoint::new(3, -4).into();
        assert!((p.x - 3.0).abs() < f64::EPSILON);
        assert!((p.y - (-4.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn lattice_point_out_of_bounds_sentinel() {
        assert_eq!(LatticePoint::out_of_bounds(), LatticePoint::new(-1, -1));
    }

    #[test]
    fn point_distance_and_midpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert_eq!(a.midpoint(b), Point::new(1.5, 2.0));
    }

    #[test]
    fn point_interval_interpolates() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(a.interval(b, 0.5), Point::new(5.0, 0.0));
        assert_eq!(a.interval(b, 0.0), a);
        assert_eq!(a.interval(b, 1.0), b);
    }

    #[test]
    fn potrace_options_defaults_match_spec() {
        let opts = PotraceOptions::default();
        assert_eq!(opts.turn_policy, TurnPolicy::Minority);
        assert_eq!(opts.turd_size, 2);
        assert!((opts.alpha_max - 1.0).abs() < f64::EPSILON);
        assert!(opts.opt_curve);
        assert!((opts.opt_tolerance - 0.2).abs() < f64::EPSILON);
        assert_eq!(opts.threshold, None);
        assert!(opts.black_on_white);
    }

    #[test]
    fn curve_with_len_initializes_beta_to_half() {
        let c = Curve::with_len(3);
        assert_eq!(c.len(), 3);
        assert!(c.beta.iter().all(|&b| (b - 0.5).abs() < f64::EPSILON));
        assert_eq!(c.c.len(), 9);
    }

    #[test]
    fn error_display() {
        let err = PotraceError::InvalidParameter("turd_size".to_string());
        assert_eq!(err.to_string(), "invalid parameter: turd_size");
        assert_eq!(PotraceError::NotLoaded.to_string(), "no image has been loaded");
    }
}
