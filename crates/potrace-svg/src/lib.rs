//! potrace-svg: SVG document assembly for `potrace-core` traces and
//! posterized layer stacks (sans-IO).
//!
//! Converts a [`potrace_core::Trace`] or [`potrace_core::PosterizerResult`]
//! into SVG path/document strings, per the engine's `get_path_tag` /
//! `get_symbol` / `get_svg` contract (§4.L, §6).

pub mod posterize;
pub mod svg;

pub use posterize::posterizer_to_svg;
pub use svg::{Scale, build_path_data, fixed, get_path_tag, get_svg, get_symbol, render_curve};
