//! Style resolution: graphic-style properties to TikZ option lists.
//!
//! Lookups run against the external style cascade with a second query against
//! the document default style; anything still missing falls back to fixed
//! defaults. Style resolution never fails a shape.

use crate::model::{Element, StyleSource, parse_length, parse_percent};
use crate::transform::fmt_num;

/// An ordered, duplicate-tolerant sequence of option tokens for one bracketed
/// TikZ option list.
#[derive(Debug, Clone, Default)]
pub struct OptionList {
    items: Vec<String>,
}

impl OptionList {
    pub fn new() -> OptionList {
        OptionList::default()
    }

    pub fn push(&mut self, option: impl Into<String>) {
        self.items.push(option.into());
    }

    pub fn extend(&mut self, other: &OptionList) {
        self.items.extend(other.items.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The bracketed option syntax, or an empty string when no options
    /// accumulated.
    pub fn format(&self) -> String {
        if self.items.is_empty() {
            String::new()
        } else {
            format!("[{}]", self.items.join(","))
        }
    }
}

/// An sRGB color resolved from a style property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Parse `#rrggbb`; anything else is black.
    pub fn parse(value: &str) -> Rgb {
        let hex = value.trim().strip_prefix('#').unwrap_or("");
        if hex.len() != 6 {
            return Rgb::BLACK;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        Rgb {
            r: channel(0),
            g: channel(2),
            b: channel(4),
        }
    }

    /// Mix toward white (positive percent) or black (negative percent).
    pub fn tint(self, percent: i32) -> Rgb {
        let target = if percent >= 0 { 255.0 } else { 0.0 };
        let f = (percent.abs() as f64 / 100.0).min(1.0);
        let mix = |c: u8| (c as f64 + (target - c as f64) * f).round() as u8;
        Rgb {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
        }
    }

    /// Inline xcolor specification.
    pub fn to_spec(self) -> String {
        format!("{{rgb,255:red,{};green,{};blue,{}}}", self.r, self.g, self.b)
    }
}

/// Resolves one shape's graphic style into the three option lists the
/// converters merge (stroke first, then fill or arrow - the merge order is
/// the rendering layer order).
pub struct ShapeStyle<'a> {
    styles: &'a dyn StyleSource,
    style_name: Option<String>,
}

impl<'a> ShapeStyle<'a> {
    pub fn of(shape: &Element, styles: &'a dyn StyleSource) -> ShapeStyle<'a> {
        ShapeStyle {
            styles,
            style_name: shape.attr("draw:style-name").map(str::to_string),
        }
    }

    /// Cascade lookup: the shape's own style with inheritance, then the
    /// document default graphic style.
    pub fn property(&self, name: &str) -> Option<String> {
        if let Some(style) = &self.style_name
            && let Some(value) = self.styles.graphic_property(style, name, true)
        {
            return Some(value);
        }
        self.styles.default_graphic_property(name)
    }

    pub fn has_stroke(&self) -> bool {
        self.property("draw:stroke").as_deref().unwrap_or("solid") != "none"
    }

    pub fn has_fill(&self) -> bool {
        self.property("draw:fill").as_deref().unwrap_or("none") == "solid"
    }

    pub fn fill_color(&self) -> Rgb {
        self.property("draw:fill-color")
            .map(|c| Rgb::parse(&c))
            .unwrap_or(Rgb {
                r: 153,
                g: 204,
                b: 255,
            })
    }

    /// Stroke options: draw color, dash pattern, line width, opacity.
    pub fn stroke_options(&self) -> OptionList {
        let mut options = OptionList::new();
        let stroke = self.property("draw:stroke").unwrap_or_else(|| "solid".into());
        if stroke == "none" {
            return options;
        }
        let color = self
            .property("svg:stroke-color")
            .map(|c| Rgb::parse(&c))
            .unwrap_or(Rgb::BLACK);
        options.push(format!("draw={}", color.to_spec()));
        // Only "dash" maps to a dashed stroke; every other named style is
        // rendered solid.
        if stroke == "dash" {
            options.push("dashed");
        }
        let width = self
            .property("svg:stroke-width")
            .map(|w| parse_length(&w))
            .unwrap_or(0.0);
        if width > 0.0 {
            options.push(format!("line width={}cm", fmt_num(width)));
        }
        if let Some(opacity) = self
            .property("svg:stroke-opacity")
            .and_then(|o| parse_percent(&o))
            && opacity < 1.0
        {
            options.push(format!("draw opacity={}", fmt_num(opacity)));
        }
        options
    }

    /// Fill options, optionally tinted for legacy sub-path shading.
    pub fn fill_options(&self, tint: i32) -> OptionList {
        let mut options = OptionList::new();
        if !self.has_fill() {
            return options;
        }
        let color = self.fill_color().tint(tint);
        options.push(format!("fill={}", color.to_spec()));
        // The source format always fills even-odd; TikZ defaults to nonzero.
        options.push("even odd rule");
        if let Some(opacity) = self
            .property("draw:opacity")
            .and_then(|o| parse_percent(&o))
            && opacity < 1.0
        {
            options.push(format!("fill opacity={}", fmt_num(opacity)));
        }
        options
    }

    /// Arrow-tip options from the start/end marker properties.
    pub fn arrow_options(&self) -> OptionList {
        let marker = |name: &str| {
            self.property(name)
                .filter(|v| !v.is_empty() && v != "none")
                .is_some()
        };
        let mut options = OptionList::new();
        match (marker("draw:marker-start"), marker("draw:marker-end")) {
            (true, true) => options.push("<->"),
            (true, false) => options.push("<-"),
            (false, true) => options.push("->"),
            (false, false) => {}
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoStyles;
    use std::collections::HashMap;

    /// Flat in-memory cascade for tests.
    struct Catalog(HashMap<(String, String), String>);

    impl Catalog {
        fn new(entries: &[(&str, &str, &str)]) -> Catalog {
            Catalog(
                entries
                    .iter()
                    .map(|(s, p, v)| ((s.to_string(), p.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl StyleSource for Catalog {
        fn graphic_property(&self, style: &str, property: &str, _inherit: bool) -> Option<String> {
            self.0.get(&(style.to_string(), property.to_string())).cloned()
        }
    }

    fn shape(style: &str) -> Element {
        Element::new("draw:rect").with_attr("draw:style-name", style)
    }

    #[test]
    fn default_stroke_is_solid_black() {
        let styles = NoStyles;
        let s = ShapeStyle::of(&shape("gr1"), &styles);
        assert_eq!(
            s.stroke_options().format(),
            "[draw={rgb,255:red,0;green,0;blue,0}]"
        );
        assert!(s.fill_options(0).is_empty());
    }

    #[test]
    fn dash_and_width_and_opacity() {
        let styles = Catalog::new(&[
            ("gr1", "draw:stroke", "dash"),
            ("gr1", "svg:stroke-color", "#ff0000"),
            ("gr1", "svg:stroke-width", "1mm"),
            ("gr1", "svg:stroke-opacity", "50%"),
        ]);
        let s = ShapeStyle::of(&shape("gr1"), &styles);
        assert_eq!(
            s.stroke_options().format(),
            "[draw={rgb,255:red,255;green,0;blue,0},dashed,line width=0.1cm,draw opacity=0.5]"
        );
    }

    #[test]
    fn fill_requests_even_odd_rule() {
        let styles = Catalog::new(&[
            ("gr1", "draw:fill", "solid"),
            ("gr1", "draw:fill-color", "#00ff00"),
        ]);
        let s = ShapeStyle::of(&shape("gr1"), &styles);
        assert_eq!(
            s.fill_options(0).format(),
            "[fill={rgb,255:red,0;green,255;blue,0},even odd rule]"
        );
    }

    #[test]
    fn tint_mixes_toward_white_and_black() {
        let c = Rgb::parse("#8080ff");
        assert_eq!(c.tint(0), c);
        assert_eq!(c.tint(100), Rgb { r: 255, g: 255, b: 255 });
        let darker = c.tint(-50);
        assert_eq!(darker, Rgb { r: 64, g: 64, b: 128 });
    }

    #[test]
    fn arrow_combinations() {
        let both = Catalog::new(&[
            ("gr1", "draw:marker-start", "Arrow"),
            ("gr1", "draw:marker-end", "Arrow"),
        ]);
        assert_eq!(
            ShapeStyle::of(&shape("gr1"), &both).arrow_options().format(),
            "[<->]"
        );
        let end = Catalog::new(&[("gr1", "draw:marker-end", "Arrow")]);
        assert_eq!(
            ShapeStyle::of(&shape("gr1"), &end).arrow_options().format(),
            "[->]"
        );
        assert!(ShapeStyle::of(&shape("gr1"), &NoStyles).arrow_options().is_empty());
    }

    #[test]
    fn stroke_none_yields_nothing() {
        let styles = Catalog::new(&[("gr1", "draw:stroke", "none")]);
        assert!(ShapeStyle::of(&shape("gr1"), &styles).stroke_options().is_empty());
    }
}
