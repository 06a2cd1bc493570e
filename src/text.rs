//! Caption text placement.
//!
//! Computes the anchor point and placement keywords for the text embedded in
//! a shape from the text-area alignment and padding properties, and emits one
//! `\node` command. Empty captions emit nothing.

use std::fmt::Write;

use crate::model::{Element, StyleSource, parse_length};
use crate::style::{OptionList, ShapeStyle};
use crate::transform::fmt_num;

/// Device-space text rectangle, `top > bottom`.
#[derive(Debug, Clone, Copy)]
pub struct TextRect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Emit the caption node of `shape` into `out`. `angle` rotates the node
/// about the rectangle center; `force_width` requests wrapping regardless of
/// the style (shape kinds that always wrap).
pub fn place_text(
    shape: &Element,
    styles: &dyn StyleSource,
    rect: TextRect,
    angle: f64,
    force_width: bool,
    out: &mut String,
) {
    let paragraphs: Vec<String> = shape
        .children()
        .iter()
        .filter(|c| c.tag() == "text:p")
        .map(|p| p.deep_text())
        .collect();
    if paragraphs.iter().all(|p| p.is_empty()) {
        return;
    }

    let style = ShapeStyle::of(shape, styles);
    let halign = horizontal_align(shape, &style, styles);
    let valign = match style
        .property("draw:textarea-vertical-align")
        .as_deref()
        .unwrap_or("middle")
    {
        "top" | "justify" => VAlign::Top,
        "bottom" => VAlign::Bottom,
        _ => VAlign::Middle,
    };

    let pad = |name: &str| style.property(name).map(|v| parse_length(&v)).unwrap_or(0.0);
    let (pad_left, pad_right) = (pad("fo:padding-left"), pad("fo:padding-right"));
    let (pad_top, pad_bottom) = (pad("fo:padding-top"), pad("fo:padding-bottom"));

    let x = match halign {
        HAlign::Left => rect.left + pad_left,
        HAlign::Center => (rect.left + rect.right) / 2.0,
        HAlign::Right => rect.right - pad_right,
    };
    let y = match valign {
        VAlign::Top => rect.top - pad_top,
        VAlign::Middle => (rect.top + rect.bottom) / 2.0,
        VAlign::Bottom => rect.bottom + pad_bottom,
    };

    let mut options = OptionList::new();
    let anchor = match (valign, halign) {
        (VAlign::Middle, HAlign::Center) => String::new(),
        (v, h) => {
            let vertical = match v {
                VAlign::Top => "below",
                VAlign::Bottom => "above",
                VAlign::Middle => "",
            };
            let horizontal = match h {
                HAlign::Left => "right",
                HAlign::Right => "left",
                HAlign::Center => "",
            };
            [vertical, horizontal]
                .iter()
                .filter(|k| !k.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ")
        }
    };
    if !anchor.is_empty() {
        options.push(anchor);
    }

    let wrap = force_width
        || style
            .property("fo:wrap-option")
            .as_deref()
            .map(|w| w == "wrap")
            .unwrap_or(false);
    if wrap || paragraphs.len() > 1 {
        options.push(match halign {
            HAlign::Left => "align=left",
            HAlign::Center => "align=center",
            HAlign::Right => "align=right",
        });
    }
    if wrap {
        let width = (rect.right - rect.left) - pad_left - pad_right;
        if width > 0.0 {
            options.push(format!("text width={}cm", fmt_num(width)));
        }
    }
    if angle != 0.0 {
        options.push(format!(
            "rotate around={{{}:({},{})}}",
            fmt_num(angle),
            fmt_num((rect.left + rect.right) / 2.0),
            fmt_num((rect.top + rect.bottom) / 2.0)
        ));
    }

    let text = paragraphs
        .iter()
        .map(|p| escape_latex(p))
        .collect::<Vec<_>>()
        .join("\\\\");
    let _ = writeln!(
        out,
        "\\node{} at ({},{}) {{{}}};",
        options.format(),
        fmt_num(x),
        fmt_num(y),
        text
    );
}

fn horizontal_align(shape: &Element, style: &ShapeStyle<'_>, styles: &dyn StyleSource) -> HAlign {
    if let Some(v) = style.property("draw:textarea-horizontal-align") {
        return match v.as_str() {
            "left" | "justify" => HAlign::Left,
            "right" => HAlign::Right,
            _ => HAlign::Center,
        };
    }
    // Fall back to the first paragraph's alignment.
    let first_style = shape
        .children()
        .iter()
        .find(|c| c.tag() == "text:p")
        .and_then(|p| p.attr("text:style-name"));
    if let Some(name) = first_style
        && let Some(v) = styles.paragraph_property(name, "fo:text-align", true)
    {
        return match v.as_str() {
            "left" | "start" | "justify" => HAlign::Left,
            "right" | "end" => HAlign::Right,
            _ => HAlign::Center,
        };
    }
    HAlign::Center
}

/// Escape LaTeX special characters in caption text.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '#' | '$' | '%' | '&' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoStyles;

    fn rect() -> TextRect {
        TextRect {
            left: 0.0,
            right: 4.0,
            top: 3.0,
            bottom: 0.0,
        }
    }

    #[test]
    fn empty_caption_is_a_noop() {
        let mut out = String::new();
        let shape = Element::new("draw:rect");
        place_text(&shape, &NoStyles, rect(), 0.0, false, &mut out);
        assert!(out.is_empty());

        let shape = Element::new("draw:rect").with_child(Element::new("text:p"));
        place_text(&shape, &NoStyles, rect(), 0.0, false, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn centered_by_default() {
        let mut out = String::new();
        let shape =
            Element::new("draw:rect").with_child(Element::new("text:p").with_text("Hello"));
        place_text(&shape, &NoStyles, rect(), 0.0, false, &mut out);
        assert_eq!(out, "\\node at (2,1.5) {Hello};\n");
    }

    #[test]
    fn forced_width_adds_wrapping_options() {
        let mut out = String::new();
        let shape = Element::new("draw:rect").with_child(Element::new("text:p").with_text("Hi"));
        place_text(&shape, &NoStyles, rect(), 0.0, true, &mut out);
        assert_eq!(out, "\\node[align=center,text width=4cm] at (2,1.5) {Hi};\n");
    }

    #[test]
    fn multiple_paragraphs_break_lines() {
        let mut out = String::new();
        let shape = Element::new("draw:rect")
            .with_child(Element::new("text:p").with_text("a"))
            .with_child(Element::new("text:p").with_text("b"));
        place_text(&shape, &NoStyles, rect(), 0.0, false, &mut out);
        assert_eq!(out, "\\node[align=center] at (2,1.5) {a\\\\b};\n");
    }

    #[test]
    fn rotation_spins_about_the_center() {
        let mut out = String::new();
        let shape = Element::new("draw:rect").with_child(Element::new("text:p").with_text("r"));
        place_text(&shape, &NoStyles, rect(), 30.0, false, &mut out);
        assert_eq!(out, "\\node[rotate around={30:(2,1.5)}] at (2,1.5) {r};\n");
    }

    #[test]
    fn specials_are_escaped() {
        assert_eq!(escape_latex("50% & more_x"), "50\\% \\& more\\_x");
        assert_eq!(escape_latex("a\\b"), "a\\textbackslash{}b");
        assert_eq!(escape_latex("x^2"), "x\\textasciicircum{}2");
    }
}
