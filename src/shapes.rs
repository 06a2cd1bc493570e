//! One converter per shape kind.
//!
//! Each converter knows two things: how far up the page its shape reaches
//! (`max_y`, needed because the flip baseline of a group is the maximum over
//! its children) and how to emit the shape's body. Converters write into the
//! scratch buffer of a [`Context`]; the dispatcher only appends that buffer
//! when conversion succeeded, so a failed shape never leaves partial output.

use std::fmt::Write;

use enum_dispatch::enum_dispatch;
use glam::DVec2;

use crate::convert::Context;
use crate::errors::GeometryError;
use crate::formula::{Evaluator, GeometryEnv};
use crate::model::{Element, ShapeFrame, StyleSource, ViewBox, parse_length};
use crate::path::{EnhancedPath, SvgPath, subpath_tints};
use crate::style::{OptionList, ShapeStyle};
use crate::text::{TextRect, place_text};
use crate::transform::{Transform, fmt_num, fmt_point};

const AXIS_EPS: f64 = 1e-4;

#[enum_dispatch]
pub trait ShapeConverter {
    /// Upper vertical extent of the shape in document cm; the group baseline
    /// is the maximum over all children.
    fn max_y(&self, shape: &Element, styles: &dyn StyleSource) -> f64;

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError>;
}

#[enum_dispatch(ShapeConverter)]
pub enum Converter {
    Rect(RectConverter),
    Ellipse(EllipseConverter),
    Line(LineConverter),
    Custom(CustomShapeConverter),
    Path(PathShapeConverter),
    Polygon(PolygonConverter),
    Connector(ConnectorConverter),
    Frame(FrameConverter),
    Caption(CaptionConverter),
    Measure(MeasureConverter),
}

/// Fixed element-tag dispatch table.
pub fn converter_for(tag: &str) -> Option<Converter> {
    Some(match tag {
        "draw:rect" => RectConverter.into(),
        "draw:ellipse" | "draw:circle" => EllipseConverter.into(),
        "draw:line" => LineConverter.into(),
        "draw:custom-shape" => CustomShapeConverter.into(),
        "draw:path" => PathShapeConverter.into(),
        "draw:polygon" | "draw:polyline" => PolygonConverter.into(),
        "draw:connector" => ConnectorConverter.into(),
        "draw:frame" => FrameConverter.into(),
        "draw:caption" => CaptionConverter.into(),
        "draw:measure" => MeasureConverter.into(),
        _ => return None,
    })
}

fn box_max_y(shape: &Element) -> f64 {
    shape.length_attr("svg:y") + shape.length_attr("svg:height")
}

fn line_max_y(shape: &Element) -> f64 {
    shape.length_attr("svg:y1").max(shape.length_attr("svg:y2"))
}

fn emit_path(out: &mut String, options: &OptionList, body: &str) {
    if options.is_empty() || body.is_empty() {
        return;
    }
    let _ = writeln!(out, "\\path{} {};", options.format(), body);
}

fn frame_text_rect(frame: &ShapeFrame) -> TextRect {
    TextRect {
        left: frame.x,
        right: frame.x + frame.width,
        top: frame.translate_y,
        bottom: frame.translate_y - frame.height,
    }
}

fn emit_rectangle(out: &mut String, options: &OptionList, frame: &ShapeFrame) {
    if options.is_empty() {
        return;
    }
    let _ = writeln!(
        out,
        "\\path{} ({},{}) rectangle ({},{});",
        options.format(),
        fmt_num(frame.x),
        fmt_num(frame.translate_y - frame.height),
        fmt_num(frame.x + frame.width),
        fmt_num(frame.translate_y)
    );
}

// ============================================================================
// Rectangle
// ============================================================================

pub struct RectConverter;

impl ShapeConverter for RectConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        box_max_y(shape)
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let frame = ShapeFrame::of(shape, ctx.baseline);
        let style = ShapeStyle::of(shape, ctx.styles);
        let mut options = style.stroke_options();
        options.extend(&style.fill_options(0));
        if let Some(radius) = shape.attr("draw:corner-radius") {
            let radius = parse_length(radius);
            if radius > 0.0 {
                options.push(format!("rounded corners={}cm", fmt_num(radius)));
            }
        }
        emit_rectangle(ctx.out, &options, &frame);
        place_text(shape, ctx.styles, frame_text_rect(&frame), 0.0, false, ctx.out);
        Ok(())
    }
}

// ============================================================================
// Ellipse / circle
// ============================================================================

pub struct EllipseConverter;

impl EllipseConverter {
    /// Center and radii in document cm, from either the center-based or the
    /// box-based attribute set.
    fn geometry(shape: &Element) -> (f64, f64, f64, f64) {
        if shape.attr("svg:cx").is_some() {
            let r = shape.length_attr("svg:r");
            let rx = shape.attr("svg:rx").map(parse_length).unwrap_or(r);
            let ry = shape.attr("svg:ry").map(parse_length).unwrap_or(r);
            (
                shape.length_attr("svg:cx"),
                shape.length_attr("svg:cy"),
                rx,
                ry,
            )
        } else {
            let w = shape.length_attr("svg:width");
            let h = shape.length_attr("svg:height");
            (
                shape.length_attr("svg:x") + w / 2.0,
                shape.length_attr("svg:y") + h / 2.0,
                w / 2.0,
                h / 2.0,
            )
        }
    }
}

impl ShapeConverter for EllipseConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        if shape.attr("svg:cy").is_some() {
            let (_, cy, _, ry) = Self::geometry(shape);
            cy + ry
        } else {
            box_max_y(shape)
        }
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let (cx, cy_doc, rx, ry) = Self::geometry(shape);
        let center = DVec2::new(cx, ctx.baseline - cy_doc);
        let style = ShapeStyle::of(shape, ctx.styles);
        let kind = shape.attr("draw:kind").unwrap_or("full");

        if kind == "full" {
            let mut options = style.stroke_options();
            options.extend(&style.fill_options(0));
            if !options.is_empty() {
                let _ = writeln!(
                    ctx.out,
                    "\\path{} {} ellipse [x radius={},y radius={}];",
                    options.format(),
                    fmt_point(center),
                    fmt_num(rx),
                    fmt_num(ry)
                );
            }
        } else {
            // Pie, chord or open arc between the declared angles. The axis
            // flip mirrors the winding, so the device sweep runs clockwise.
            let start = shape.number_attr("draw:start-angle").unwrap_or(0.0);
            let end = shape.number_attr("draw:end-angle").unwrap_or(360.0);
            let device_start = -start;
            let mut device_end = -end;
            if device_end > device_start {
                device_end -= 360.0;
            }
            let on_ellipse = |deg: f64| {
                let rad = deg.to_radians();
                DVec2::new(center.x + rx * rad.cos(), center.y + ry * rad.sin())
            };
            let arc = format!(
                "{} arc[start angle={},end angle={},x radius={},y radius={}]",
                fmt_point(on_ellipse(device_start)),
                fmt_num(device_start),
                fmt_num(device_end),
                fmt_num(rx),
                fmt_num(ry)
            );
            match kind {
                "section" => {
                    let mut options = style.stroke_options();
                    options.extend(&style.fill_options(0));
                    emit_path(
                        ctx.out,
                        &options,
                        &format!("{} -- {} -- cycle", fmt_point(center), arc),
                    );
                }
                "cut" => {
                    let mut options = style.stroke_options();
                    options.extend(&style.fill_options(0));
                    emit_path(ctx.out, &options, &format!("{arc} -- cycle"));
                }
                // "arc" and anything unrecognized: stroke only, open.
                _ => emit_path(ctx.out, &style.stroke_options(), &arc),
            }
        }

        let rect = TextRect {
            left: center.x - rx,
            right: center.x + rx,
            top: center.y + ry,
            bottom: center.y - ry,
        };
        place_text(shape, ctx.styles, rect, 0.0, false, ctx.out);
        Ok(())
    }
}

// ============================================================================
// Line
// ============================================================================

pub struct LineConverter;

impl ShapeConverter for LineConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        line_max_y(shape)
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let p1 = DVec2::new(
            shape.length_attr("svg:x1"),
            ctx.baseline - shape.length_attr("svg:y1"),
        );
        let p2 = DVec2::new(
            shape.length_attr("svg:x2"),
            ctx.baseline - shape.length_attr("svg:y2"),
        );
        let style = ShapeStyle::of(shape, ctx.styles);
        let mut options = style.stroke_options();
        options.extend(&style.arrow_options());
        emit_path(
            ctx.out,
            &options,
            &format!("{} -- {}", fmt_point(p1), fmt_point(p2)),
        );
        let rect = TextRect {
            left: p1.x.min(p2.x),
            right: p1.x.max(p2.x),
            top: p1.y.max(p2.y),
            bottom: p1.y.min(p2.y),
        };
        place_text(shape, ctx.styles, rect, 0.0, false, ctx.out);
        Ok(())
    }
}

// ============================================================================
// Custom shape (enhanced geometry)
// ============================================================================

pub struct CustomShapeConverter;

impl CustomShapeConverter {
    fn text_area(
        geometry: &Element,
        evaluator: &mut Evaluator,
        transform: &Transform,
    ) -> Result<Option<TextRect>, GeometryError> {
        let Some(areas) = geometry.attr("draw:text-areas") else {
            return Ok(None);
        };
        let tokens: Vec<&str> = areas.split_ascii_whitespace().collect();
        if tokens.len() < 4 {
            return Ok(None);
        }
        let mut values = [0.0; 4];
        for (slot, token) in values.iter_mut().zip(&tokens) {
            *slot = evaluator.expression(token)?;
        }
        let top_left = transform.point(values[0], values[1]);
        let bottom_right = transform.point(values[2], values[3]);
        Ok(Some(TextRect {
            left: top_left.x,
            right: bottom_right.x,
            top: top_left.y,
            bottom: bottom_right.y,
        }))
    }
}

impl ShapeConverter for CustomShapeConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        box_max_y(shape)
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let frame = ShapeFrame::of(shape, ctx.baseline);
        let style = ShapeStyle::of(shape, ctx.styles);

        let Some(geometry) = shape.find_child("draw:enhanced-geometry") else {
            // No geometry: draw the bounding frame so the shape stays visible.
            let mut options = style.stroke_options();
            options.extend(&style.fill_options(0));
            emit_rectangle(ctx.out, &options, &frame);
            place_text(shape, ctx.styles, frame_text_rect(&frame), 0.0, false, ctx.out);
            return Ok(());
        };

        let viewbox = ViewBox::parse(geometry.attr("svg:viewBox"));
        let stretch_x = geometry.number_attr("draw:path-stretchpoint-x");
        let stretch_y = geometry.number_attr("draw:path-stretchpoint-y");
        let transform = Transform::new(viewbox, frame).with_stretch(stretch_x, stretch_y);

        let mut env = GeometryEnv::new(viewbox);
        // Logical units of the source schema are 1/100 mm.
        env.logwidth = frame.width * 1000.0;
        env.logheight = frame.height * 1000.0;
        env.stretch_x = stretch_x.unwrap_or(0.0);
        env.stretch_y = stretch_y.unwrap_or(0.0);
        env.has_stroke = style.has_stroke();
        env.has_fill = style.has_fill();

        let mut evaluator = Evaluator::new(env);
        evaluator.set_modifiers(geometry.attr("draw:modifiers"));
        for equation in geometry.children().iter().filter(|c| c.tag() == "draw:equation") {
            if let (Some(name), Some(formula)) =
                (equation.attr("draw:name"), equation.attr("draw:formula"))
            {
                evaluator.add_equation(name, formula);
            }
        }

        let kind = geometry.attr("draw:type").unwrap_or("non-primitive");
        let tints = subpath_tints(kind);
        let path = geometry.attr("draw:enhanced-path").unwrap_or("");
        let subpaths = EnhancedPath::parse(path, &mut evaluator, &transform)?;
        for (index, sub) in subpaths.iter().enumerate() {
            let mut options = OptionList::new();
            if !sub.no_stroke {
                options.extend(&style.stroke_options());
            }
            if !sub.no_fill {
                let tint = tints.and_then(|t| t.get(index)).copied().unwrap_or(0);
                options.extend(&style.fill_options(tint));
            }
            emit_path(ctx.out, &options, &sub.body);
        }

        let rect = Self::text_area(geometry, &mut evaluator, &transform)?
            .unwrap_or_else(|| frame_text_rect(&frame));
        place_text(shape, ctx.styles, rect, 0.0, false, ctx.out);
        Ok(())
    }
}

// ============================================================================
// Generic path
// ============================================================================

pub struct PathShapeConverter;

impl ShapeConverter for PathShapeConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        box_max_y(shape)
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let frame = ShapeFrame::of(shape, ctx.baseline);
        let viewbox = ViewBox::parse(shape.attr("svg:viewBox"));
        let transform = Transform::new(viewbox, frame);
        let style = ShapeStyle::of(shape, ctx.styles);

        let data = shape.attr("svg:d").unwrap_or("");
        let path = SvgPath::parse(data, &transform)?;
        let mut options = style.stroke_options();
        if path.has_closed {
            options.extend(&style.fill_options(0));
        } else {
            options.extend(&style.arrow_options());
        }
        emit_path(ctx.out, &options, &path.body);
        place_text(shape, ctx.styles, frame_text_rect(&frame), 0.0, false, ctx.out);
        Ok(())
    }
}

// ============================================================================
// Polygon / polyline
// ============================================================================

pub struct PolygonConverter;

impl ShapeConverter for PolygonConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        box_max_y(shape)
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let frame = ShapeFrame::of(shape, ctx.baseline);
        let viewbox = ViewBox::parse(shape.attr("svg:viewBox"));
        let transform = Transform::new(viewbox, frame);
        let style = ShapeStyle::of(shape, ctx.styles);
        let closed = shape.tag() == "draw:polygon";

        let points = shape.attr("draw:points").unwrap_or("");
        let mut body = String::new();
        for token in points.split_ascii_whitespace() {
            let Some((x, y)) = token.split_once(',') else {
                return Err(GeometryError::syntax(points, 0, "expected x,y pair"));
            };
            let (Ok(x), Ok(y)) = (x.parse::<f64>(), y.parse::<f64>()) else {
                return Err(GeometryError::syntax(points, 0, "invalid point coordinate"));
            };
            if !body.is_empty() {
                body.push_str(" -- ");
            }
            body.push_str(&fmt_point(transform.point(x, y)));
        }
        if body.is_empty() {
            return Ok(());
        }
        let mut options = style.stroke_options();
        if closed {
            body.push_str(" -- cycle");
            options.extend(&style.fill_options(0));
        } else {
            options.extend(&style.arrow_options());
        }
        emit_path(ctx.out, &options, &body);
        place_text(shape, ctx.styles, frame_text_rect(&frame), 0.0, false, ctx.out);
        Ok(())
    }
}

// ============================================================================
// Connector
// ============================================================================

pub struct ConnectorConverter;

impl ConnectorConverter {
    fn endpoints(shape: &Element) -> (DVec2, DVec2) {
        (
            DVec2::new(shape.length_attr("svg:x1"), shape.length_attr("svg:y1")),
            DVec2::new(shape.length_attr("svg:x2"), shape.length_attr("svg:y2")),
        )
    }
}

impl ShapeConverter for ConnectorConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        line_max_y(shape)
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let (doc1, doc2) = Self::endpoints(shape);
        let p1 = DVec2::new(doc1.x, ctx.baseline - doc1.y);
        let p2 = DVec2::new(doc2.x, ctx.baseline - doc2.y);
        let style = ShapeStyle::of(shape, ctx.styles);
        let mut options = style.stroke_options();
        options.extend(&style.arrow_options());

        let degenerate = (doc1.x - doc2.x).abs() < AXIS_EPS || (doc1.y - doc2.y).abs() < AXIS_EPS;
        let data = shape.attr("svg:d");

        if degenerate || data.is_none() {
            // Straight connector plus an axis-appropriate text box.
            emit_path(
                ctx.out,
                &options,
                &format!("{} -- {}", fmt_point(p1), fmt_point(p2)),
            );
            let rect = if (doc1.y - doc2.y).abs() < AXIS_EPS {
                TextRect {
                    left: p1.x.min(p2.x),
                    right: p1.x.max(p2.x),
                    top: p1.y + 0.5,
                    bottom: p1.y - 0.5,
                }
            } else {
                TextRect {
                    left: p1.x - 0.5,
                    right: p1.x + 0.5,
                    top: p1.y.max(p2.y),
                    bottom: p1.y.min(p2.y),
                }
            };
            place_text(shape, ctx.styles, rect, 0.0, false, ctx.out);
            return Ok(());
        }

        let data = data.unwrap_or("");
        // First pass against a unit view box: learn the path's own first and
        // last point so the declared endpoints can be mapped onto them.
        let unit = Transform::new(
            ViewBox {
                min_x: 0.0,
                min_y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            ShapeFrame {
                x: 0.0,
                width: 1.0,
                height: 1.0,
                translate_y: 0.0,
            },
        );
        let probe = SvgPath::parse(data, &unit)?;
        let span = probe.last - probe.first;
        if span.x.abs() < AXIS_EPS || span.y.abs() < AXIS_EPS {
            emit_path(
                ctx.out,
                &options,
                &format!("{} -- {}", fmt_point(p1), fmt_point(p2)),
            );
            return Ok(());
        }

        // Second pass with the derived scale, emitted inside a scope shifted
        // to the declared start point.
        let scoped = Transform::new(
            ViewBox {
                min_x: probe.first.x,
                min_y: probe.first.y,
                width: span.x,
                height: span.y,
            },
            ShapeFrame {
                x: 0.0,
                width: doc2.x - doc1.x,
                height: doc2.y - doc1.y,
                translate_y: 0.0,
            },
        );
        let path = SvgPath::parse(data, &scoped)?;
        let _ = writeln!(ctx.out, "\\begin{{scope}}[shift={{{}}}]", fmt_point(p1));
        emit_path(ctx.out, &options, &path.body);
        ctx.out.push_str("\\end{scope}\n");

        let mid = (p1 + p2) / 2.0;
        let rect = TextRect {
            left: mid.x,
            right: mid.x,
            top: mid.y,
            bottom: mid.y,
        };
        place_text(shape, ctx.styles, rect, 0.0, false, ctx.out);
        Ok(())
    }
}

// ============================================================================
// Frame
// ============================================================================

pub struct FrameConverter;

impl ShapeConverter for FrameConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        box_max_y(shape)
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let frame = ShapeFrame::of(shape, ctx.baseline);
        let style = ShapeStyle::of(shape, ctx.styles);
        // Embedded objects and images are out of scope; only their bounding
        // frame is drawn.
        emit_rectangle(ctx.out, &style.stroke_options(), &frame);
        if let Some(text_box) = shape.find_child("draw:text-box") {
            place_text(text_box, ctx.styles, frame_text_rect(&frame), 0.0, true, ctx.out);
        }
        Ok(())
    }
}

// ============================================================================
// Caption
// ============================================================================

pub struct CaptionConverter;

impl ShapeConverter for CaptionConverter {
    fn max_y(&self, shape: &Element, _styles: &dyn StyleSource) -> f64 {
        let point_y = shape.length_attr("svg:y") + shape.length_attr("draw:caption-point-y");
        box_max_y(shape).max(point_y)
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let frame = ShapeFrame::of(shape, ctx.baseline);
        let style = ShapeStyle::of(shape, ctx.styles);
        let mut options = style.stroke_options();
        options.extend(&style.fill_options(0));
        if let Some(radius) = shape.attr("draw:corner-radius") {
            let radius = parse_length(radius);
            if radius > 0.0 {
                options.push(format!("rounded corners={}cm", fmt_num(radius)));
            }
        }
        emit_rectangle(ctx.out, &options, &frame);

        // Leader line from the caption border toward the caption point.
        let target = DVec2::new(
            frame.x + shape.length_attr("draw:caption-point-x"),
            frame.translate_y - shape.length_attr("draw:caption-point-y"),
        );
        let center = DVec2::new(
            frame.x + frame.width / 2.0,
            frame.translate_y - frame.height / 2.0,
        );
        let dir = target - center;
        if dir.x.abs() > AXIS_EPS || dir.y.abs() > AXIS_EPS {
            let tx = if dir.x.abs() > AXIS_EPS {
                frame.width / 2.0 / dir.x.abs()
            } else {
                f64::INFINITY
            };
            let ty = if dir.y.abs() > AXIS_EPS {
                frame.height / 2.0 / dir.y.abs()
            } else {
                f64::INFINITY
            };
            let exit = tx.min(ty);
            if exit < 1.0 {
                let start = center + dir * exit;
                emit_path(
                    ctx.out,
                    &style.stroke_options(),
                    &format!("{} -- {}", fmt_point(start), fmt_point(target)),
                );
            }
        }

        place_text(shape, ctx.styles, frame_text_rect(&frame), 0.0, true, ctx.out);
        Ok(())
    }
}

// ============================================================================
// Measure / dimension line
// ============================================================================

pub struct MeasureConverter;

impl MeasureConverter {
    fn distances(style: &ShapeStyle<'_>) -> (f64, f64, f64) {
        let prop = |name: &str, default: f64| {
            style
                .property(name)
                .map(|v| parse_length(&v))
                .filter(|v| *v != 0.0)
                .unwrap_or(default)
        };
        (
            prop("draw:line-distance", 0.6),
            prop("draw:guide-overhang", 0.2),
            prop("draw:guide-distance", 0.1),
        )
    }
}

impl ShapeConverter for MeasureConverter {
    fn max_y(&self, shape: &Element, styles: &dyn StyleSource) -> f64 {
        let style = ShapeStyle::of(shape, styles);
        let (distance, overhang, _) = Self::distances(&style);
        line_max_y(shape) + distance.abs() + overhang.abs()
    }

    fn convert(&self, shape: &Element, ctx: &mut Context<'_>) -> Result<(), GeometryError> {
        let p1 = DVec2::new(
            shape.length_attr("svg:x1"),
            ctx.baseline - shape.length_attr("svg:y1"),
        );
        let p2 = DVec2::new(
            shape.length_attr("svg:x2"),
            ctx.baseline - shape.length_attr("svg:y2"),
        );
        let style = ShapeStyle::of(shape, ctx.styles);
        let (distance, overhang, gap) = Self::distances(&style);

        let delta = p2 - p1;
        if delta.length() < AXIS_EPS {
            return Ok(());
        }
        let dir = delta.normalize();
        let normal = DVec2::new(-dir.y, dir.x);

        let stroke = style.stroke_options();
        let q1 = p1 + normal * distance;
        let q2 = p2 + normal * distance;
        // Guide lines from just off the measured points past the dimension line.
        for (from, to) in [(p1, q1), (p2, q2)] {
            emit_path(
                ctx.out,
                &stroke,
                &format!(
                    "{} -- {}",
                    fmt_point(from + normal * gap),
                    fmt_point(to + normal * overhang)
                ),
            );
        }
        let mut dim_options = stroke.clone();
        dim_options.push("<->");
        emit_path(
            ctx.out,
            &dim_options,
            &format!("{} -- {}", fmt_point(q1), fmt_point(q2)),
        );

        // Label above the dimension line, rotated along it.
        let anchor = (q1 + q2) / 2.0 + normal * 0.3;
        let angle = dir.y.atan2(dir.x).to_degrees();
        let rect = TextRect {
            left: anchor.x,
            right: anchor.x,
            top: anchor.y,
            bottom: anchor.y,
        };
        place_text(shape, ctx.styles, rect, angle, false, ctx.out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_table_covers_shape_kinds() {
        for tag in [
            "draw:rect",
            "draw:ellipse",
            "draw:circle",
            "draw:line",
            "draw:custom-shape",
            "draw:path",
            "draw:polygon",
            "draw:polyline",
            "draw:connector",
            "draw:frame",
            "draw:caption",
            "draw:measure",
        ] {
            assert!(converter_for(tag).is_some(), "no converter for {tag}");
        }
        assert!(converter_for("draw:g").is_none());
        assert!(converter_for("office:body").is_none());
    }

    #[test]
    fn max_y_uses_the_right_attributes() {
        let styles = crate::model::NoStyles;
        let rect = Element::new("draw:rect")
            .with_attr("svg:y", "1cm")
            .with_attr("svg:height", "2cm");
        assert_eq!(
            converter_for("draw:rect").unwrap().max_y(&rect, &styles),
            3.0
        );
        let line = Element::new("draw:line")
            .with_attr("svg:y1", "4cm")
            .with_attr("svg:y2", "1cm");
        assert_eq!(
            converter_for("draw:line").unwrap().max_y(&line, &styles),
            4.0
        );
    }
}
