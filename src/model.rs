//! Read-only document model consumed by the converters.
//!
//! The document loader (external to this crate) owns the element tree; the
//! core only reads tags, attributes and children. `Element` ships a builder
//! API so hosts and tests can assemble trees without depending on any
//! particular XML library.

use std::fmt;

/// One node of the source document tree: a tag, an ordered attribute list,
/// ordered children and optional character data.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            ..Element::default()
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Builder: append a child node.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: set character data (paragraph text).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute parsed as a length, in cm. Missing or malformed lengths
    /// fall back to 0 (style-resolution policy: absences never fail).
    pub fn length_attr(&self, name: &str) -> f64 {
        self.attr(name).map(parse_length).unwrap_or(0.0)
    }

    /// Attribute parsed as a bare number.
    pub fn number_attr(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(|v| v.trim().parse::<f64>().ok())
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn find_child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Concatenated character data of this node and its descendants.
    pub fn deep_text(&self) -> String {
        let mut buf = self.text.clone();
        for child in &self.children {
            buf.push_str(&child.deep_text());
        }
        buf
    }
}

/// The style-cascade collaborator. Lookups that miss return `None`; the core
/// substitutes fixed defaults and never fails on style resolution.
pub trait StyleSource {
    /// A property of the graphic style family, following parent styles when
    /// `inherit` is set.
    fn graphic_property(&self, style: &str, property: &str, inherit: bool) -> Option<String>;

    /// A property of the document default graphic style, queried when both
    /// the direct and the inherited lookup miss.
    fn default_graphic_property(&self, property: &str) -> Option<String> {
        let _ = property;
        None
    }

    /// A property of the paragraph style family (caption alignment).
    fn paragraph_property(&self, style: &str, property: &str, inherit: bool) -> Option<String> {
        let _ = (style, property, inherit);
        None
    }
}

/// A `StyleSource` with no styles at all; every lookup falls back to the
/// converter defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStyles;

impl StyleSource for NoStyles {
    fn graphic_property(&self, _style: &str, _property: &str, _inherit: bool) -> Option<String> {
        None
    }
}

/// The shape-local coordinate system its geometry is expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Host-renderer fallback when the attribute is absent.
    pub const DEFAULT: ViewBox = ViewBox {
        min_x: 0.0,
        min_y: 0.0,
        width: 21600.0,
        height: 21600.0,
    };

    /// Parse `"min-x min-y width height"` (whitespace or comma separated).
    /// Anything malformed yields the default box.
    pub fn parse(value: Option<&str>) -> ViewBox {
        let Some(value) = value else {
            return ViewBox::DEFAULT;
        };
        let nums: Vec<f64> = value
            .split([' ', '\t', ','])
            .filter(|t| !t.is_empty())
            .filter_map(|t| t.parse::<f64>().ok())
            .collect();
        match nums.as_slice() {
            [min_x, min_y, width, height] if *width > 0.0 && *height > 0.0 => ViewBox {
                min_x: *min_x,
                min_y: *min_y,
                width: *width,
                height: *height,
            },
            _ => ViewBox::DEFAULT,
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}

/// Target-space bounding box of one shape. `translate_y` is the flip baseline
/// already reduced by the shape's own `svg:y`, so the shape's device box is
/// `x..x+width` by `translate_y-height..translate_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeFrame {
    pub x: f64,
    pub width: f64,
    pub height: f64,
    pub translate_y: f64,
}

impl ShapeFrame {
    /// Frame of a box-positioned shape (`svg:x/y/width/height`) against the
    /// group flip baseline.
    pub fn of(shape: &Element, baseline: f64) -> ShapeFrame {
        ShapeFrame {
            x: shape.length_attr("svg:x"),
            width: shape.length_attr("svg:width"),
            height: shape.length_attr("svg:height"),
            translate_y: baseline - shape.length_attr("svg:y"),
        }
    }
}

/// Parse an ODF length with unit into centimeters. Unknown units and garbage
/// parse as 0; a bare number is taken as cm.
pub fn parse_length(value: &str) -> f64 {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(value.len());
    let (num, unit) = value.split_at(split);
    let Ok(num) = num.trim().parse::<f64>() else {
        return 0.0;
    };
    match unit.trim() {
        "" | "cm" => num,
        "mm" => num / 10.0,
        "in" => num * 2.54,
        "pt" => num * 2.54 / 72.0,
        "pc" => num * 2.54 / 6.0,
        "px" => num * 2.54 / 96.0,
        _ => 0.0,
    }
}

/// Parse an ODF percentage (`"60%"`) into `0.0..=1.0`.
pub fn parse_percent(value: &str) -> Option<f64> {
    let value = value.trim().strip_suffix('%')?;
    value.trim().parse::<f64>().ok().map(|p| p / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewbox_parses_and_defaults() {
        let vb = ViewBox::parse(Some("0 0 21600 21600"));
        assert_eq!(vb, ViewBox::DEFAULT);
        let vb = ViewBox::parse(Some("10, 20, 100, 50"));
        assert_eq!(vb.min_x, 10.0);
        assert_eq!(vb.height, 50.0);
        assert_eq!(ViewBox::parse(None), ViewBox::DEFAULT);
        assert_eq!(ViewBox::parse(Some("1 2 3")), ViewBox::DEFAULT);
        assert_eq!(ViewBox::parse(Some("0 0 -5 5")), ViewBox::DEFAULT);
    }

    #[test]
    fn lengths_convert_to_cm() {
        assert_eq!(parse_length("2cm"), 2.0);
        assert_eq!(parse_length("10mm"), 1.0);
        assert_eq!(parse_length("1in"), 2.54);
        assert_eq!(parse_length("72pt"), 2.54);
        assert_eq!(parse_length("3"), 3.0);
        assert_eq!(parse_length("bogus"), 0.0);
    }

    #[test]
    fn element_builder_round_trips() {
        let el = Element::new("draw:rect")
            .with_attr("svg:width", "4cm")
            .with_child(Element::new("text:p").with_text("hi"));
        assert_eq!(el.tag(), "draw:rect");
        assert_eq!(el.length_attr("svg:width"), 4.0);
        assert_eq!(el.find_child("text:p").unwrap().deep_text(), "hi");
        assert!(el.attr("svg:height").is_none());
    }

    #[test]
    fn percent_parsing() {
        assert_eq!(parse_percent("60%"), Some(0.6));
        assert_eq!(parse_percent("60"), None);
    }
}
