//! Stacks a [`PosterizerResult`]'s layers into one SVG document, each layer
//! a `<path>` with its own `fill-opacity` (§4.J step 6, §6).

use potrace_core::PosterizerResult;
use svg::Document;
use svg::node::element::Path as SvgPath;

use crate::svg::{Scale, build_path_data, fixed};

/// Build a standalone `<svg>` stacking every non-empty layer of `result` in
/// paint order, each as its own `<path fill-opacity="...">`.
#[must_use]
pub fn posterizer_to_svg(result: &PosterizerResult, background: Option<&str>, fill: Option<&str>) -> String {
    let mut doc = Document::new()
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set("width", result.width)
        .set("height", result.height)
        .set("viewBox", format!("0 0 {} {}", result.width, result.height));

    if let Some(color) = background {
        let rect = svg::node::element::Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", color);
        doc = doc.add(rect);
    }

    let fill = fill.unwrap_or("black");
    for layer in &result.layers {
        let d = build_path_data(&layer.trace, Scale::default());
        if d.is_empty() {
            continue;
        }
        let path = SvgPath::new()
            .set("d", d)
            .set("stroke", "none")
            .set("fill", fill)
            .set("fill-rule", "evenodd")
            .set("fill-opacity", fixed(layer.opacity));
        doc = doc.add(path);
    }

    format!("{doc}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use potrace_core::{Bitmap, Posterizer, PosterizerOptions, RangeDistribution, Steps};

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
    fn posterizer_svg_has_one_path_per_layer() {
        let bm = gradient_bitmap(256);
        let posterizer = Posterizer::new(PosterizerOptions {
            steps: Steps::Count(3),
            range_distribution: RangeDistribution::Equal,
            ..PosterizerOptions::default()
        });
        let result = posterizer.trace(&bm).unwrap();
        let svg = posterizer_to_svg(&result, None, None);
        let path_count = svg.matches("<path").count();
        assert_eq!(path_count, result.layers.iter().filter(|l| !l.trace.paths.is_empty()).count());
    }

    #[test]
    fn posterizer_svg_is_well_formed_viewbox() {
        let bm = gradient_bitmap(256);
        let posterizer = Posterizer::new(PosterizerOptions::default());
        let result = posterizer.trace(&bm).unwrap();
        let svg = posterizer_to_svg(&result, None, None);
        assert!(svg.contains("viewBox=\"0 0 256 1\""));
    }
}
