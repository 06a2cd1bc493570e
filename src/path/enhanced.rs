//! Interpreter for the enhanced-path grammar of custom shapes.
//!
//! A path is a run of single upper-case command letters, each followed by
//! parameters that may be literals, equation references (`?name`) or modifier
//! references (`$index`); every parameter is routed through the formula
//! evaluator. `N` terminates a sub-path; `F`/`S` suppress fill/stroke for the
//! sub-path being built.

use std::fmt::Write;

use glam::DVec2;

use crate::errors::GeometryError;
use crate::formula::Evaluator;
use crate::transform::{Transform, fmt_num, fmt_point};

use super::{PathCursor, SubPath};

const EPS: f64 = 1e-9;

/// Signed tint percentages applied to the fill color of successive sub-paths
/// of specific legacy shape kinds (positive lightens, negative darkens).
///
/// This reproduces the host renderer's observed output; the written schema
/// says nothing about it. Pure data, keep it a table.
pub fn subpath_tints(kind: &str) -> Option<&'static [i32]> {
    match kind {
        "can" => Some(&[20, 0]),
        "cube" => Some(&[0, 20, -20]),
        "paper" => Some(&[0, -20]),
        _ => None,
    }
}

/// One-shot parser; feeds every parameter through the shape's evaluator and
/// emits device-space TikZ path text per sub-path.
pub struct EnhancedPath<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    evaluator: &'a mut Evaluator,
    transform: &'a Transform,
}

impl<'a> EnhancedPath<'a> {
    pub fn parse(
        src: &'a str,
        evaluator: &'a mut Evaluator,
        transform: &'a Transform,
    ) -> Result<Vec<SubPath>, GeometryError> {
        let mut parser = EnhancedPath {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            evaluator,
            transform,
        };
        parser.run()
    }

    fn run(&mut self) -> Result<Vec<SubPath>, GeometryError> {
        let mut subpaths = Vec::new();
        let mut sub = SubPath::default();
        let mut cursor = PathCursor::default();

        while let Some(cmd) = self.next_command()? {
            match cmd {
                'M' => {
                    let p = self.pair()?;
                    self.moveto(&mut sub, &mut cursor, p);
                    // Trailing pairs are linetos.
                    while self.at_param() {
                        let p = self.pair()?;
                        self.lineto(&mut sub, &mut cursor, p);
                    }
                }
                'L' => {
                    while self.at_param() {
                        let p = self.pair()?;
                        self.lineto(&mut sub, &mut cursor, p);
                    }
                }
                'C' => {
                    while self.at_param() {
                        let c1 = self.pair()?;
                        let c2 = self.pair()?;
                        let p = self.pair()?;
                        let _ = write!(
                            sub.body,
                            " .. controls {} and {} .. {}",
                            self.dev(c1),
                            self.dev(c2),
                            self.dev(p)
                        );
                        cursor.current = p;
                        cursor.break_curve();
                    }
                }
                'Q' => {
                    while self.at_param() {
                        let c = self.pair()?;
                        let p = self.pair()?;
                        let _ =
                            write!(sub.body, " .. controls {} .. {}", self.dev(c), self.dev(p));
                        cursor.current = p;
                        cursor.break_curve();
                    }
                }
                'A' => self.arcs(&mut sub, &mut cursor, false, false)?,
                'B' => self.arcs(&mut sub, &mut cursor, false, true)?,
                'W' => self.arcs(&mut sub, &mut cursor, true, false)?,
                'V' => self.arcs(&mut sub, &mut cursor, true, true)?,
                'T' => self.angle_ellipses(&mut sub, &mut cursor, false)?,
                'U' => self.angle_ellipses(&mut sub, &mut cursor, true)?,
                'X' => self.quadrants(&mut sub, &mut cursor, true)?,
                'Y' => self.quadrants(&mut sub, &mut cursor, false)?,
                'Z' => {
                    if cursor.started {
                        sub.body.push_str(" -- cycle");
                        cursor.current = cursor.first;
                        cursor.closed = true;
                        cursor.break_curve();
                    }
                }
                'F' => sub.no_fill = true,
                'S' => sub.no_stroke = true,
                'N' => {
                    if !sub.is_empty() {
                        subpaths.push(std::mem::take(&mut sub));
                    } else {
                        sub = SubPath::default();
                    }
                    cursor = PathCursor::default();
                }
                other => {
                    return Err(GeometryError::syntax(
                        self.src,
                        self.pos.saturating_sub(1),
                        format!("unknown path command '{other}'"),
                    ));
                }
            }
        }
        if !sub.is_empty() {
            subpaths.push(sub);
        }
        Ok(subpaths)
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    fn dev(&self, p: DVec2) -> String {
        fmt_point(self.transform.point(p.x, p.y))
    }

    fn moveto(&self, sub: &mut SubPath, cursor: &mut PathCursor, p: DVec2) {
        if !sub.body.is_empty() {
            sub.body.push(' ');
        }
        sub.body.push_str(&self.dev(p));
        cursor.current = p;
        cursor.first = p;
        cursor.started = true;
        cursor.break_curve();
    }

    fn lineto(&self, sub: &mut SubPath, cursor: &mut PathCursor, p: DVec2) {
        if !cursor.started {
            self.moveto(sub, cursor, p);
            return;
        }
        let _ = write!(sub.body, " -- {}", self.dev(p));
        cursor.current = p;
        cursor.break_curve();
    }

    /// Arc commands parameterized by two bounding-box corners and two
    /// direction points. The device emission flips orientation because the
    /// axis flip mirrors the angle convention.
    fn arcs(
        &mut self,
        sub: &mut SubPath,
        cursor: &mut PathCursor,
        clockwise: bool,
        with_move: bool,
    ) -> Result<(), GeometryError> {
        while self.at_param() {
            let c1 = self.pair()?;
            let c2 = self.pair()?;
            let s = self.pair()?;
            let e = self.pair()?;
            let center = (c1 + c2) / 2.0;
            let rx = (c2.x - c1.x).abs() / 2.0;
            let ry = (c2.y - c1.y).abs() / 2.0;
            if rx < EPS || ry < EPS {
                self.lineto(sub, cursor, e);
                continue;
            }
            let start = ((s.y - center.y) / ry)
                .atan2((s.x - center.x) / rx)
                .to_degrees();
            let end = ((e.y - center.y) / ry)
                .atan2((e.x - center.x) / rx)
                .to_degrees();
            self.emit_arc(sub, cursor, center, rx, ry, start, end, clockwise, with_move);
        }
        Ok(())
    }

    /// Arcs given directly as center, radii and start/end angle.
    fn angle_ellipses(
        &mut self,
        sub: &mut SubPath,
        cursor: &mut PathCursor,
        with_move: bool,
    ) -> Result<(), GeometryError> {
        while self.at_param() {
            let center = self.pair()?;
            let radii = self.pair()?;
            let angles = self.pair()?;
            let rx = radii.x.abs();
            let ry = radii.y.abs();
            if rx < EPS || ry < EPS {
                continue;
            }
            self.emit_arc(
                sub, cursor, center, rx, ry, angles.x, angles.y, false, with_move,
            );
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_arc(
        &self,
        sub: &mut SubPath,
        cursor: &mut PathCursor,
        center: DVec2,
        rx: f64,
        ry: f64,
        start_deg: f64,
        end_deg: f64,
        clockwise: bool,
        with_move: bool,
    ) {
        let on_ellipse = |deg: f64| {
            let rad = deg.to_radians();
            DVec2::new(center.x + rx * rad.cos(), center.y + ry * rad.sin())
        };
        let start_point = on_ellipse(start_deg);
        let end_point = on_ellipse(end_deg);
        if with_move || !cursor.started {
            self.moveto(sub, cursor, start_point);
        } else {
            self.lineto(sub, cursor, start_point);
        }
        let device_start = self.transform.angle(start_deg);
        let mut device_end = self.transform.angle(end_deg);
        // Counter-clockwise source arcs run clockwise after the flip.
        if clockwise {
            if device_end < device_start {
                device_end += 360.0;
            }
        } else if device_end > device_start {
            device_end -= 360.0;
        }
        let _ = write!(
            sub.body,
            " arc[start angle={},end angle={},x radius={},y radius={}]",
            fmt_num(device_start),
            fmt_num(device_end),
            fmt_num(rx * self.transform.scale_x()),
            fmt_num(ry * self.transform.scale_y())
        );
        cursor.current = end_point;
        cursor.break_curve();
    }

    /// Elliptical quadrants tangent to the x (`X`) or y (`Y`) axis, the
    /// tangency axis alternating across consecutive parameters. The quadrant
    /// sweep follows from the sign of the delta to the new point.
    fn quadrants(
        &mut self,
        sub: &mut SubPath,
        cursor: &mut PathCursor,
        mut x_axis: bool,
    ) -> Result<(), GeometryError> {
        while self.at_param() {
            let p = self.pair()?;
            if !cursor.started {
                self.moveto(sub, cursor, p);
                x_axis = !x_axis;
                continue;
            }
            let from = self.transform.point(cursor.current.x, cursor.current.y);
            let to = self.transform.point(p.x, p.y);
            let rx = (to.x - from.x).abs();
            let ry = (to.y - from.y).abs();
            if rx < EPS || ry < EPS {
                self.lineto(sub, cursor, p);
                x_axis = !x_axis;
                continue;
            }
            let (start, mut end) = if x_axis {
                // Horizontal tangent at the start: the start point sits on the
                // ellipse's vertical extreme, the end on the horizontal one.
                let center = DVec2::new(from.x, to.y);
                (
                    if from.y > center.y { 90.0 } else { 270.0 },
                    if to.x > center.x { 0.0 } else { 180.0 },
                )
            } else {
                let center = DVec2::new(to.x, from.y);
                (
                    if from.x > center.x { 0.0 } else { 180.0 },
                    if to.y > center.y { 90.0 } else { 270.0 },
                )
            };
            if end - start > 90.0 {
                end -= 360.0;
            } else if end - start < -90.0 {
                end += 360.0;
            }
            let _ = write!(
                sub.body,
                " arc[start angle={},end angle={},x radius={},y radius={}]",
                fmt_num(start),
                fmt_num(end),
                fmt_num(rx),
                fmt_num(ry)
            );
            cursor.current = p;
            cursor.break_curve();
            x_axis = !x_axis;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------

    fn skip_separators(&mut self) {
        while let Some(b) = self.bytes.get(self.pos) {
            if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b',') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_command(&mut self) -> Result<Option<char>, GeometryError> {
        self.skip_separators();
        match self.bytes.get(self.pos) {
            None => Ok(None),
            Some(b) if b.is_ascii_alphabetic() => {
                self.pos += 1;
                Ok(Some(*b as char))
            }
            Some(b) => Err(GeometryError::syntax(
                self.src,
                self.pos,
                format!("expected path command, found '{}'", *b as char),
            )),
        }
    }

    fn at_param(&mut self) -> bool {
        self.skip_separators();
        matches!(
            self.bytes.get(self.pos),
            Some(b'0'..=b'9' | b'.' | b'-' | b'$' | b'?')
        )
    }

    /// One parameter token, evaluated through the formula engine.
    fn value(&mut self) -> Result<f64, GeometryError> {
        self.skip_separators();
        let start = self.pos;
        match self.bytes.get(self.pos) {
            Some(b'?') => {
                self.pos += 1;
                while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_alphanumeric() || *b == b'_')
                {
                    self.pos += 1;
                }
            }
            Some(b'$') => {
                self.pos += 1;
                while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            Some(b'-' | b'.' | b'0'..=b'9') => {
                if self.bytes.get(self.pos) == Some(&b'-') {
                    self.pos += 1;
                }
                while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit() || *b == b'.')
                {
                    self.pos += 1;
                }
            }
            _ => {
                return Err(GeometryError::syntax(
                    self.src,
                    self.pos,
                    "expected path parameter",
                ));
            }
        }
        let token = &self.src[start..self.pos];
        self.evaluator.expression(token).map_err(|e| match e {
            GeometryError::Syntax { message, .. } => GeometryError::syntax(self.src, start, message),
            GeometryError::Reference { name, .. } => GeometryError::reference(self.src, start, name),
        })
    }

    fn pair(&mut self) -> Result<DVec2, GeometryError> {
        Ok(DVec2::new(self.value()?, self.value()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::GeometryEnv;
    use crate::model::{ShapeFrame, ViewBox};

    fn setup() -> (Evaluator, Transform) {
        let vb = ViewBox::DEFAULT;
        let frame = ShapeFrame {
            x: 0.0,
            width: 2.0,
            height: 2.0,
            translate_y: 2.0,
        };
        (
            Evaluator::new(GeometryEnv::new(vb)),
            Transform::new(vb, frame),
        )
    }

    #[test]
    fn square_with_close() {
        let (mut ev, t) = setup();
        let subs =
            EnhancedPath::parse("M 0 0 L 21600 0 21600 21600 0 21600 Z N", &mut ev, &t).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(
            subs[0].body,
            "(0,2) -- (2,2) -- (2,0) -- (0,0) -- cycle"
        );
        assert!(!subs[0].no_fill && !subs[0].no_stroke);
    }

    #[test]
    fn subpath_flags_reset_per_subpath() {
        let (mut ev, t) = setup();
        let subs = EnhancedPath::parse(
            "F M 0 0 L 21600 0 N S M 0 21600 L 21600 21600 N",
            &mut ev,
            &t,
        )
        .unwrap();
        assert_eq!(subs.len(), 2);
        assert!(subs[0].no_fill && !subs[0].no_stroke);
        assert!(subs[1].no_stroke && !subs[1].no_fill);
    }

    #[test]
    fn parameters_resolve_references() {
        let (mut ev, t) = setup();
        ev.set_modifiers(Some("10800"));
        ev.add_equation("h", "height/2");
        let subs = EnhancedPath::parse("M $0 ?h L 21600 21600", &mut ev, &t).unwrap();
        assert_eq!(subs[0].body, "(1,1) -- (2,0)");
    }

    #[test]
    fn curves_emit_controls() {
        let (mut ev, t) = setup();
        let subs =
            EnhancedPath::parse("M 0 0 C 0 21600 21600 21600 21600 0 N", &mut ev, &t).unwrap();
        assert_eq!(
            subs[0].body,
            "(0,2) .. controls (0,0) and (2,0) .. (2,2)"
        );
    }

    #[test]
    fn quadrant_arcs() {
        let (mut ev, t) = setup();
        let subs = EnhancedPath::parse("M 0 10800 Y 10800 0 N", &mut ev, &t).unwrap();
        // Quarter sweep with a vertical tangent at the start.
        assert!(subs[0].body.contains("arc[start angle=180,end angle=90"), "{}", subs[0].body);
    }

    #[test]
    fn arc_commands_flip_orientation() {
        let (mut ev, t) = setup();
        // Full-box arc from east to north, counter-clockwise in the source.
        let subs = EnhancedPath::parse(
            "B 0 0 21600 21600 21600 10800 10800 0 N",
            &mut ev,
            &t,
        )
        .unwrap();
        let body = &subs[0].body;
        assert!(body.starts_with("(2,1) arc[start angle=0,end angle=-270"), "{body}");
    }

    #[test]
    fn unknown_command_is_syntax_error() {
        let (mut ev, t) = setup();
        let err = EnhancedPath::parse("G 5 5", &mut ev, &t).unwrap_err();
        assert!(matches!(err, GeometryError::Syntax { .. }));
    }

    #[test]
    fn malformed_parameter_fails() {
        let (mut ev, t) = setup();
        assert!(EnhancedPath::parse("Mfoo", &mut ev, &t).is_err());
        assert!(EnhancedPath::parse("M 0 0 L $7 0", &mut ev, &t).is_err());
    }

    #[test]
    fn tint_table_is_fixed_data() {
        assert_eq!(subpath_tints("can"), Some(&[20, 0][..]));
        assert!(subpath_tints("rectangle").is_none());
    }
}
