//! End-to-end conversion tests against the public API.

use std::collections::HashMap;

use odg2tikz::{Element, NoStyles, StyleSource, convert};

/// Flat in-memory style cascade.
struct Catalog {
    graphic: HashMap<(String, String), String>,
}

impl Catalog {
    fn new(entries: &[(&str, &str, &str)]) -> Catalog {
        Catalog {
            graphic: entries
                .iter()
                .map(|(s, p, v)| ((s.to_string(), p.to_string()), v.to_string()))
                .collect(),
        }
    }
}

impl StyleSource for Catalog {
    fn graphic_property(&self, style: &str, property: &str, _inherit: bool) -> Option<String> {
        self.graphic
            .get(&(style.to_string(), property.to_string()))
            .cloned()
    }
}

fn rect(x: &str, y: &str, w: &str, h: &str) -> Element {
    Element::new("draw:rect")
        .with_attr("svg:x", x)
        .with_attr("svg:y", y)
        .with_attr("svg:width", w)
        .with_attr("svg:height", h)
}

#[test]
fn filled_rect_with_caption() {
    let styles = Catalog::new(&[
        ("gr1", "draw:fill", "solid"),
        ("gr1", "draw:fill-color", "#ff0000"),
    ]);
    let shape = rect("1cm", "1cm", "4cm", "2cm")
        .with_attr("draw:style-name", "gr1")
        .with_child(Element::new("text:p").with_text("Label"));
    let mut out = String::new();
    convert(&shape, &styles, &mut out);
    assert_eq!(
        out,
        "\\begin{tikzpicture}\n\
         \\path[draw={rgb,255:red,0;green,0;blue,0},fill={rgb,255:red,255;green,0;blue,0},even odd rule] (1,0) rectangle (5,2);\n\
         \\node at (3,1) {Label};\n\
         \\end{tikzpicture}\n"
    );
}

#[test]
fn custom_shape_evaluates_modifiers_and_equations() {
    let geometry = Element::new("draw:enhanced-geometry")
        .with_attr("svg:viewBox", "0 0 21600 21600")
        .with_attr("draw:modifiers", "10800")
        .with_child(
            Element::new("draw:equation")
                .with_attr("draw:name", "f0")
                .with_attr("draw:formula", "$0"),
        )
        .with_attr(
            "draw:enhanced-path",
            "M ?f0 0 L 21600 10800 ?f0 21600 0 10800 Z N",
        );
    let shape = Element::new("draw:custom-shape")
        .with_attr("svg:width", "2cm")
        .with_attr("svg:height", "2cm")
        .with_child(geometry);
    let mut out = String::new();
    convert(&shape, &NoStyles, &mut out);
    assert!(
        out.contains("(1,2) -- (2,1) -- (1,0) -- (0,1) -- cycle;"),
        "{out}"
    );
}

#[test]
fn elbow_connector_rebuilds_placement_scope() {
    let shape = Element::new("draw:connector")
        .with_attr("svg:x1", "1cm")
        .with_attr("svg:y1", "1cm")
        .with_attr("svg:x2", "3cm")
        .with_attr("svg:y2", "2cm")
        .with_attr("svg:d", "M 0 0 L 0 1000 L 2000 1000");
    let mut out = String::new();
    convert(&shape, &NoStyles, &mut out);
    assert_eq!(
        out,
        "\\begin{tikzpicture}\n\
         \\begin{scope}[shift={(1,1)}]\n\
         \\path[draw={rgb,255:red,0;green,0;blue,0}] (0,0) -- (0,-1) -- (2,-1);\n\
         \\end{scope}\n\
         \\end{tikzpicture}\n"
    );
}

#[test]
fn horizontal_connector_degenerates_to_a_line() {
    let shape = Element::new("draw:connector")
        .with_attr("svg:x1", "0cm")
        .with_attr("svg:y1", "1cm")
        .with_attr("svg:x2", "4cm")
        .with_attr("svg:y2", "1cm")
        .with_attr("svg:d", "M 0 0 L 0 1000 L 4000 1000");
    let mut out = String::new();
    convert(&shape, &NoStyles, &mut out);
    assert!(out.contains("(0,0) -- (4,0);"), "{out}");
    assert!(!out.contains("scope"), "{out}");
}

#[test]
fn ellipse_section_closes_through_the_center() {
    let shape = Element::new("draw:circle")
        .with_attr("svg:cx", "2cm")
        .with_attr("svg:cy", "2cm")
        .with_attr("svg:r", "1cm")
        .with_attr("draw:kind", "section")
        .with_attr("draw:start-angle", "0")
        .with_attr("draw:end-angle", "90");
    let mut out = String::new();
    convert(&shape, &NoStyles, &mut out);
    assert!(
        out.contains(
            "(2,1) -- (3,1) arc[start angle=0,end angle=-90,x radius=1,y radius=1] -- cycle;"
        ),
        "{out}"
    );
}

#[test]
fn measure_draws_guides_dimension_line_and_label() {
    let shape = Element::new("draw:measure")
        .with_attr("svg:x1", "1cm")
        .with_attr("svg:y1", "1cm")
        .with_attr("svg:x2", "4cm")
        .with_attr("svg:y2", "1cm")
        .with_child(Element::new("text:p").with_text("3 cm"));
    let mut out = String::new();
    convert(&shape, &NoStyles, &mut out);
    assert!(out.contains("(1,0.9) -- (1,1.6);"), "{out}");
    assert!(out.contains("(4,0.9) -- (4,1.6);"), "{out}");
    assert!(out.contains("<->] (1,1.4) -- (4,1.4);"), "{out}");
    assert!(out.contains("\\node at (2.5,1.7) {3 cm};"), "{out}");
}

#[test]
fn polygon_closes_and_polyline_stays_open() {
    let base = |tag: &str| {
        Element::new(tag)
            .with_attr("svg:width", "1cm")
            .with_attr("svg:height", "1cm")
            .with_attr("svg:viewBox", "0 0 10 10")
            .with_attr("draw:points", "0,0 10,0 10,10")
    };
    let mut out = String::new();
    convert(&base("draw:polygon"), &NoStyles, &mut out);
    assert!(out.contains("(0,1) -- (1,1) -- (1,0) -- cycle;"), "{out}");

    let mut out = String::new();
    convert(&base("draw:polyline"), &NoStyles, &mut out);
    assert!(out.contains("(0,1) -- (1,1) -- (1,0);"), "{out}");
}

#[test]
fn broken_sibling_does_not_poison_the_group() {
    let bad = Element::new("draw:custom-shape")
        .with_attr("svg:width", "1cm")
        .with_attr("svg:height", "1cm")
        .with_child(
            Element::new("draw:enhanced-geometry").with_attr("draw:enhanced-path", "M ?loop 0"),
        )
        .with_child(Element::new("text:p").with_text("never emitted"));
    let group = Element::new("draw:g")
        .with_child(bad)
        .with_child(rect("0cm", "0cm", "1cm", "1cm"));
    let mut out = String::new();
    convert(&group, &NoStyles, &mut out);
    assert!(out.contains("rectangle"), "{out}");
    assert!(!out.contains("never emitted"), "{out}");
}

#[test]
fn frame_draws_border_and_wrapped_text() {
    let shape = Element::new("draw:frame")
        .with_attr("svg:width", "4cm")
        .with_attr("svg:height", "2cm")
        .with_child(
            Element::new("draw:text-box")
                .with_child(Element::new("text:p").with_text("Inside")),
        );
    let mut out = String::new();
    convert(&shape, &NoStyles, &mut out);
    assert!(out.contains("(0,0) rectangle (4,2);"), "{out}");
    assert!(
        out.contains("\\node[align=center,text width=4cm] at (2,1) {Inside};"),
        "{out}"
    );
}
