//! SVG document assembly for `potrace-core` traces (§4.L, §6).
//!
//! Path data is assembled with manual `write!` formatting rather than the
//! [`svg`] crate's path-data builder, since the exact three-decimal,
//! trailing-zero-stripped number format is part of the serialization
//! contract; the `<svg>`/`<symbol>` document shells use the [`svg`] crate.

use std::fmt::Write as _;

use potrace_core::{Curve, Point, Tag, Trace};
use svg::Document;
use svg::node::element::{Path as SvgPath, Rectangle};

/// A per-axis output scale factor; `None` means 1.0 on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    /// Horizontal multiplier.
    pub x: f64,
    /// Vertical multiplier.
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// Format `value` to three decimal places, stripping a trailing `.000`.
#[must_use]
pub fn fixed(value: f64) -> String {
    let formatted = format!("{value:.3}");
    formatted.strip_suffix(".000").map_or_else(|| formatted.clone(), str::to_string)
}

fn write_point(out: &mut String, p: Point, scale: Scale) {
    let _ = write!(out, "{} {}", fixed(p.x * scale.x), fixed(p.y * scale.y));
}

/// Render one curve's path data (the `M ... C ... L ...` body, no leading
/// command letter duplication across vertices), per §6's SVG serialization
/// contract.
#[must_use]
pub fn render_curve(curve: &Curve, scale: Scale) -> String {
    if curve.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let start = curve.c[(curve.len() - 1) * 3 + 2];
    out.push('M');
    out.push(' ');
    write_point(&mut out, start, scale);

    for (i, tag) in curve.tag.iter().enumerate() {
        let i3 = i * 3;
        let p0 = curve.c[i3];
        let p1 = curve.c[i3 + 1];
        let p2 = curve.c[i3 + 2];
        match tag {
            Tag::Curve => {
                out.push_str(" C ");
                write_point(&mut out, p0, scale);
                out.push_str(", ");
                write_point(&mut out, p1, scale);
                out.push_str(", ");
                write_point(&mut out, p2, scale);
            }
            Tag::Corner => {
                out.push_str(" L ");
                write_point(&mut out, p1, scale);
                out.push(' ');
                write_point(&mut out, p2, scale);
            }
        }
    }
    out
}

/// Concatenate every retained contour's path data into one `d` string.
#[must_use]
pub fn build_path_data(trace: &Trace, scale: Scale) -> String {
    trace
        .paths
        .iter()
        .filter_map(|p| p.curve.as_ref())
        .map(|curve| render_curve(curve, scale))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the single `<path>` element for a trace (§6 `get_path_tag`).
///
/// `fill` defaults to `"black"`; pass `""` (as [`get_symbol`] does) to omit
/// it entirely from the rendered attribute.
#[must_use]
pub fn get_path_tag(trace: &Trace, fill: Option<&str>, scale: Option<Scale>) -> String {
    let scale = scale.unwrap_or_default();
    let d = build_path_data(trace, scale);
    let fill = fill.unwrap_or("black");
    let path = SvgPath::new()
        .set("d", d)
        .set("stroke", "none")
        .set("fill", fill)
        .set("fill-rule", "evenodd");
    path.to_string()
}

/// Build a `<symbol>` wrapping the trace's path, with no fill so callers can
/// `<use>` it with their own colour (§6 `get_symbol`).
#[must_use]
pub fn get_symbol(trace: &Trace, id: &str) -> String {
    let path_tag = get_path_tag(trace, Some(""), None);
    format!(
        r#"<symbol viewBox="0 0 {} {}" id="{id}">{path_tag}</symbol>"#,
        trace.width, trace.height
    )
}

/// Build a full standalone `<svg>` document for a trace (§6 `get_svg`).
///
/// `width`/`height` override the trace's own dimensions (scaling path data
/// to match); `background` is `None` for a transparent canvas or `Some(colour)`
/// to paint an opaque background rect first.
#[must_use]
pub fn get_svg(trace: &Trace, width: Option<u32>, height: Option<u32>, background: Option<&str>, fill: Option<&str>) -> String {
    let out_width = width.unwrap_or(trace.width);
    let out_height = height.unwrap_or(trace.height);
    #[allow(clippy::cast_precision_loss)]
    let scale = Scale {
        x: if trace.width > 0 { f64::from(out_width) / f64::from(trace.width) } else { 1.0 },
        y: if trace.height > 0 { f64::from(out_height) / f64::from(trace.height) } else { 1.0 },
    };

    let mut doc = Document::new()
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set("width", out_width)
        .set("height", out_height)
        .set("viewBox", format!("0 0 {out_width} {out_height}"));

    if let Some(color) = background {
        let rect = Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", color);
        doc = doc.add(rect);
    }

    let d = build_path_data(trace, scale);
    let fill = fill.unwrap_or("black");
    let path = SvgPath::new()
        .set("d", d)
        .set("stroke", "none")
        .set("fill", fill)
        .set("fill-rule", "evenodd");
    doc = doc.add(path);

    format!("{doc}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fixed_strips_trailing_zero_decimals() {
        assert_eq!(fixed(3.0), "3");
        assert_eq!(fixed(3.5), "3.500");
        assert_eq!(fixed(3.14159), "3.142");
    }

    fn square_trace() -> Trace {
        let mut bm = potrace_core::Bitmap::new(40, 40);
        for y in 10..30 {
            for x in 10..30 {
                if let Some(idx) = bm.point_to_index(x, y) {
                    bm.data_mut()[idx] = 1;
                }
            }
        }
        let mut engine = potrace_core::Potrace::new();
        engine.load_bitmap(bm);
        engine.process().unwrap().clone()
    }

    #[test]
    fn get_path_tag_contains_move_and_line_commands() {
        let trace = square_trace();
        let tag = get_path_tag(&trace, None, None);
        assert!(tag.starts_with("<path"));
        assert!(tag.contains("fill=\"black\""));
        assert!(tag.contains("fill-rule=\"evenodd\""));
    }

    #[test]
    fn get_svg_wraps_path_in_document() {
        let trace = square_trace();
        let svg = get_svg(&trace, None, None, None, None);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("viewBox=\"0 0 40 40\""));
        assert!(svg.contains("<path"));
    }

    #[test]
    fn get_svg_with_background_emits_rect() {
        let trace = square_trace();
        let svg = get_svg(&trace, None, None, Some("white"), None);
        assert!(svg.contains("<rect"));
        assert!(svg.contains("fill=\"white\""));
    }

    #[test]
    fn get_symbol_wraps_path_with_viewbox_and_no_fill() {
        let trace = square_trace();
        let symbol = get_symbol(&trace, "my-id");
        assert!(symbol.starts_with("<symbol"));
        assert!(symbol.contains(r#"id="my-id""#));
        assert!(symbol.contains(r#"viewBox="0 0 40 40""#));
    }

    #[test]
    fn empty_trace_produces_empty_path_data() {
        let bm = potrace_core::Bitmap::new(10, 10);
        let mut engine = potrace_core::Potrace::new();
        engine.load_bitmap(bm);
        let trace = engine.process().unwrap();
        let d = build_path_data(trace, Scale::default());
        assert!(d.is_empty());
    }
}
