//! Top-level dispatch: a document element (or group) to one TikZ picture.
//!
//! Conversion never fails as a whole. Each shape renders into its own scratch
//! buffer; a shape whose geometry cannot be parsed is logged and dropped, and
//! its siblings still convert.

use std::fmt::Write;

use crate::log::{debug, warn};
use crate::model::{Element, StyleSource, parse_length};
use crate::shapes::{ShapeConverter, converter_for};
use crate::style::OptionList;
use crate::transform::fmt_num;

/// Per-shape conversion state handed to the converters.
pub struct Context<'a> {
    pub styles: &'a dyn StyleSource,
    pub out: &'a mut String,
    /// Flip baseline in document cm, `device_y = baseline - document_y`.
    pub baseline: f64,
}

/// Convert `element` (one drawing shape, or a `draw:g` group of shapes) into
/// a `tikzpicture` environment appended to `out`.
///
/// Shapes that fail to convert are skipped with a warning; unknown tags are
/// ignored.
pub fn convert(element: &Element, styles: &dyn StyleSource, out: &mut String) {
    if element.tag() == "draw:g" {
        // All children of a group flip about the same baseline, the highest
        // document-space extent over the group.
        let baseline = element
            .children()
            .iter()
            .filter_map(|c| converter_for(c.tag()).map(|conv| conv.max_y(c, styles)))
            .fold(0.0, f64::max);
        out.push_str("\\begin{tikzpicture}\n");
        for child in element.children() {
            convert_shape(child, styles, baseline, out);
        }
        out.push_str("\\end{tikzpicture}\n");
    } else if let Some(conv) = converter_for(element.tag()) {
        let baseline = conv.max_y(element, styles);
        out.push_str("\\begin{tikzpicture}\n");
        convert_shape(element, styles, baseline, out);
        out.push_str("\\end{tikzpicture}\n");
    } else {
        debug!("ignoring element '{}'", element.tag());
    }
}

fn convert_shape(shape: &Element, styles: &dyn StyleSource, baseline: f64, out: &mut String) {
    let Some(conv) = converter_for(shape.tag()) else {
        debug!("ignoring element '{}'", shape.tag());
        return;
    };
    let mut body = String::new();
    let mut ctx = Context {
        styles,
        out: &mut body,
        baseline,
    };
    match conv.convert(shape, &mut ctx) {
        Ok(()) => {
            let scope = transform_options(shape);
            if scope.is_empty() {
                out.push_str(&body);
            } else {
                let _ = writeln!(out, "\\begin{{scope}}{}", scope.format());
                out.push_str(&body);
                out.push_str("\\end{scope}\n");
            }
        }
        Err(_error) => {
            warn!("skipping shape '{}': {}", shape.tag(), _error);
        }
    }
}

/// The `draw:transform` attribute as a scope option list. TikZ applies scope
/// options left to right while the source applies its list right to left, so
/// the mapped options come out reversed.
fn transform_options(shape: &Element) -> OptionList {
    let mut options = OptionList::new();
    let Some(list) = shape.attr("draw:transform") else {
        return options;
    };
    let mut mapped = Vec::new();
    for (name, args) in parse_transform_list(list) {
        match name {
            // Source rotation is in radians, counterclockwise in a y-down
            // frame, so it comes out negated in degrees.
            "rotate" => {
                if let Some(radians) = args.first().and_then(|a| a.parse::<f64>().ok()) {
                    mapped.push(format!("rotate={}", fmt_num(-radians.to_degrees())));
                }
            }
            "translate" => {
                let dx = args.first().map(|a| parse_length(a)).unwrap_or(0.0);
                let dy = args.get(1).map(|a| parse_length(a)).unwrap_or(0.0);
                mapped.push(format!(
                    "shift={{({},{})}}",
                    fmt_num(dx),
                    fmt_num(-dy)
                ));
            }
            "skewX" => {
                if let Some(radians) = args.first().and_then(|a| a.parse::<f64>().ok()) {
                    mapped.push(format!("xslant={}", fmt_num(-radians.tan())));
                }
            }
            other => {
                debug!("unsupported transform '{other}'");
            }
        }
    }
    mapped.reverse();
    for option in mapped {
        options.push(option);
    }
    options
}

/// Split `"rotate (0.7) translate (1cm 2cm)"` into operation names and raw
/// argument tokens. Arguments keep their unit suffixes.
fn parse_transform_list(src: &str) -> Vec<(&str, Vec<&str>)> {
    let mut ops = Vec::new();
    let bytes = src.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        if !bytes[pos].is_ascii_alphabetic() {
            pos += 1;
            continue;
        }
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let name = &src[start..pos];
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut args = Vec::new();
        if pos < bytes.len() && bytes[pos] == b'(' {
            pos += 1;
            let inner_start = pos;
            while pos < bytes.len() && bytes[pos] != b')' {
                pos += 1;
            }
            args = src[inner_start..pos]
                .split([' ', '\t', ','])
                .filter(|t| !t.is_empty())
                .collect();
            if pos < bytes.len() {
                pos += 1;
            }
        }
        ops.push((name, args));
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoStyles;

    fn rect(x: &str, y: &str, w: &str, h: &str) -> Element {
        Element::new("draw:rect")
            .with_attr("svg:x", x)
            .with_attr("svg:y", y)
            .with_attr("svg:width", w)
            .with_attr("svg:height", h)
    }

    #[test]
    fn single_rect_converts_to_a_picture() {
        let mut out = String::new();
        convert(&rect("0cm", "0cm", "2cm", "1cm"), &NoStyles, &mut out);
        assert_eq!(
            out,
            "\\begin{tikzpicture}\n\
             \\path[draw={rgb,255:red,0;green,0;blue,0}] (0,0) rectangle (2,1);\n\
             \\end{tikzpicture}\n"
        );
    }

    #[test]
    fn group_children_share_the_highest_baseline() {
        let group = Element::new("draw:g")
            .with_child(rect("0cm", "0cm", "1cm", "1cm"))
            .with_child(rect("2cm", "1cm", "1cm", "2cm"));
        let mut out = String::new();
        convert(&group, &NoStyles, &mut out);
        // Baseline is 3cm: the first rect sits at the top of the picture.
        assert!(out.contains("(0,2) rectangle (1,3)"));
        assert!(out.contains("(2,0) rectangle (3,2)"));
    }

    #[test]
    fn failing_shape_is_skipped_but_siblings_survive() {
        let bad = Element::new("draw:custom-shape")
            .with_attr("svg:width", "1cm")
            .with_attr("svg:height", "1cm")
            .with_child(
                Element::new("draw:enhanced-geometry")
                    .with_attr("draw:enhanced-path", "M foo"),
            );
        let group = Element::new("draw:g")
            .with_child(bad)
            .with_child(rect("0cm", "0cm", "1cm", "1cm"));
        let mut out = String::new();
        convert(&group, &NoStyles, &mut out);
        assert!(out.contains("rectangle"));
        assert!(!out.contains("foo"));
    }

    #[test]
    fn transform_scope_reverses_option_order() {
        let shape = rect("0cm", "0cm", "1cm", "1cm")
            .with_attr("draw:transform", "rotate (1.5707963267948966) translate (2cm 1cm)");
        let mut out = String::new();
        convert(&shape, &NoStyles, &mut out);
        assert!(out.contains("\\begin{scope}[shift={(2,-1)},rotate=-90]\n"));
        assert!(out.contains("\\end{scope}\n"));
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let mut out = String::new();
        convert(&Element::new("office:annotation"), &NoStyles, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn transform_list_parsing() {
        let ops = parse_transform_list("rotate (0.5) translate (1cm, 2cm) skewX(0.2)");
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], ("rotate", vec!["0.5"]));
        assert_eq!(ops[1], ("translate", vec!["1cm", "2cm"]));
        assert_eq!(ops[2], ("skewX", vec!["0.2"]));
    }
}
