//! Interpreter for standard SVG path data (`svg:d`).
//!
//! Whitespace/comma tolerant; absolute commands emit plain device points,
//! relative (lower-case) commands emit `++`-relative points so the TikZ
//! current point tracks the SVG one. Elliptical arcs are consumed and
//! degraded to a straight line to the endpoint, a trade-off carried over
//! from the existing renderer.

use std::fmt::Write;

use glam::DVec2;

use crate::errors::GeometryError;
use crate::transform::{Transform, fmt_num, fmt_point};

use super::PathCursor;

/// Result of one path parse: the emitted TikZ body plus the facts callers
/// need for fill decisions and connector placement.
#[derive(Debug, Clone)]
pub struct SvgPath {
    pub body: String,
    /// At least one sub-path was closed; an open path is stroke-only.
    pub has_closed: bool,
    /// First point of the path, in source coordinates.
    pub first: DVec2,
    /// Final current point, in source coordinates.
    pub last: DVec2,
}

impl SvgPath {
    pub fn parse(src: &str, transform: &Transform) -> Result<SvgPath, GeometryError> {
        Parser {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            transform,
        }
        .run()
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    transform: &'a Transform,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> Result<SvgPath, GeometryError> {
        let mut cursor = PathCursor::default();
        let mut body = String::new();
        let mut path_first: Option<DVec2> = None;
        let mut last_family: char = ' ';
        // Implicit repetition: bare parameters repeat the previous command,
        // with M/m degrading to L/l per the grammar.
        let mut pending: Option<char> = None;

        loop {
            self.skip_separators();
            if self.pos >= self.bytes.len() {
                break;
            }
            let cmd = match self.take_command() {
                Some(c) => {
                    pending = Some(match c {
                        'M' => 'L',
                        'm' => 'l',
                        'Z' | 'z' => ' ',
                        other => other,
                    });
                    c
                }
                None => match pending {
                    Some(c) if c != ' ' => c,
                    _ => {
                        return Err(GeometryError::syntax(
                            self.src,
                            self.pos,
                            "expected path command",
                        ));
                    }
                },
            };
            let relative = cmd.is_ascii_lowercase();
            match cmd.to_ascii_uppercase() {
                'M' => {
                    let p = self.point()?;
                    let target = self.resolve(&cursor, p, relative);
                    if !body.is_empty() {
                        body.push(' ');
                    }
                    if relative && cursor.started {
                        body.push_str(&self.rel(p));
                    } else {
                        body.push_str(&self.abs(target));
                    }
                    cursor.current = target;
                    cursor.first = target;
                    cursor.started = true;
                    cursor.break_curve();
                    path_first.get_or_insert(target);
                }
                'L' => {
                    let p = self.point()?;
                    let target = self.resolve(&cursor, p, relative);
                    if relative && cursor.started {
                        let _ = write!(body, " -- {}", self.rel(p));
                    } else {
                        let _ = write!(body, " -- {}", self.abs(target));
                    }
                    cursor.current = target;
                    cursor.break_curve();
                }
                'H' => {
                    let x = self.number()?;
                    if relative {
                        let _ = write!(body, " -- {}", self.rel(DVec2::new(x, 0.0)));
                        cursor.current.x += x;
                    } else {
                        cursor.current.x = x;
                        let _ = write!(body, " -- {}", self.abs(cursor.current));
                    }
                    cursor.break_curve();
                }
                'V' => {
                    let y = self.number()?;
                    if relative {
                        let _ = write!(body, " -- {}", self.rel(DVec2::new(0.0, y)));
                        cursor.current.y += y;
                    } else {
                        cursor.current.y = y;
                        let _ = write!(body, " -- {}", self.abs(cursor.current));
                    }
                    cursor.break_curve();
                }
                'C' => {
                    let c1 = self.point()?;
                    let c2 = self.point()?;
                    let p = self.point()?;
                    self.cubic(&mut body, &mut cursor, c1, c2, p, relative);
                }
                'S' => {
                    // Reflect the previous cubic control point, or reuse the
                    // current point when the previous command was unrelated.
                    let reflected = match (last_family, cursor.cubic_control) {
                        ('C', Some(ctrl)) => 2.0 * cursor.current - ctrl,
                        _ => cursor.current,
                    };
                    let c1 = if relative {
                        reflected - cursor.current
                    } else {
                        reflected
                    };
                    let c2 = self.point()?;
                    let p = self.point()?;
                    self.cubic(&mut body, &mut cursor, c1, c2, p, relative);
                }
                'Q' => {
                    let c = self.point()?;
                    let p = self.point()?;
                    self.quadratic(&mut body, &mut cursor, c, p, relative);
                }
                'T' => {
                    let reflected = match (last_family, cursor.quad_control) {
                        ('Q', Some(ctrl)) => 2.0 * cursor.current - ctrl,
                        _ => cursor.current,
                    };
                    let c = if relative {
                        reflected - cursor.current
                    } else {
                        reflected
                    };
                    let p = self.point()?;
                    self.quadratic(&mut body, &mut cursor, c, p, relative);
                }
                'A' => {
                    // rx ry x-rotation large-arc sweep x y: approximated by a
                    // straight line to the endpoint.
                    for _ in 0..5 {
                        self.number()?;
                    }
                    let p = self.point()?;
                    let target = self.resolve(&cursor, p, relative);
                    if relative && cursor.started {
                        let _ = write!(body, " -- {}", self.rel(p));
                    } else {
                        let _ = write!(body, " -- {}", self.abs(target));
                    }
                    cursor.current = target;
                    cursor.break_curve();
                }
                'Z' => {
                    if cursor.started {
                        body.push_str(" -- cycle");
                        cursor.current = cursor.first;
                        cursor.closed = true;
                        cursor.break_curve();
                    }
                }
                other => {
                    return Err(GeometryError::syntax(
                        self.src,
                        self.pos.saturating_sub(1),
                        format!("unknown path command '{other}'"),
                    ));
                }
            }
            last_family = match cmd.to_ascii_uppercase() {
                'C' | 'S' => 'C',
                'Q' | 'T' => 'Q',
                _ => ' ',
            };
        }

        Ok(SvgPath {
            body,
            has_closed: cursor.closed,
            first: path_first.unwrap_or_default(),
            last: cursor.current,
        })
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    fn resolve(&self, cursor: &PathCursor, p: DVec2, relative: bool) -> DVec2 {
        if relative && cursor.started {
            cursor.current + p
        } else {
            p
        }
    }

    fn abs(&self, p: DVec2) -> String {
        fmt_point(self.transform.point(p.x, p.y))
    }

    /// A source-space delta as a `++`-relative device point.
    fn rel(&self, d: DVec2) -> String {
        format!(
            "++({},{})",
            fmt_num(d.x * self.transform.scale_x()),
            fmt_num(-d.y * self.transform.scale_y())
        )
    }

    /// A source-space delta as a `+`-relative (non-advancing) device point.
    fn rel_control(&self, d: DVec2) -> String {
        format!(
            "+({},{})",
            fmt_num(d.x * self.transform.scale_x()),
            fmt_num(-d.y * self.transform.scale_y())
        )
    }

    fn cubic(
        &self,
        body: &mut String,
        cursor: &mut PathCursor,
        c1: DVec2,
        c2: DVec2,
        p: DVec2,
        relative: bool,
    ) {
        let start = cursor.current;
        let (c1_abs, c2_abs, target) = if relative && cursor.started {
            (start + c1, start + c2, start + p)
        } else {
            (c1, c2, p)
        };
        if relative && cursor.started {
            let _ = write!(
                body,
                " .. controls {} and {} .. {}",
                self.rel_control(c1),
                self.rel_control(c2),
                self.rel(p)
            );
        } else {
            let _ = write!(
                body,
                " .. controls {} and {} .. {}",
                self.abs(c1_abs),
                self.abs(c2_abs),
                self.abs(target)
            );
        }
        cursor.current = target;
        cursor.cubic_control = Some(c2_abs);
        cursor.quad_control = None;
        cursor.control_relative = relative;
    }

    fn quadratic(
        &self,
        body: &mut String,
        cursor: &mut PathCursor,
        c: DVec2,
        p: DVec2,
        relative: bool,
    ) {
        let start = cursor.current;
        let (c_abs, target) = if relative && cursor.started {
            (start + c, start + p)
        } else {
            (c, p)
        };
        if relative && cursor.started {
            let _ = write!(
                body,
                " .. controls {} .. {}",
                self.rel_control(c),
                self.rel(p)
            );
        } else {
            let _ = write!(body, " .. controls {} .. {}", self.abs(c_abs), self.abs(target));
        }
        cursor.current = target;
        cursor.quad_control = Some(c_abs);
        cursor.cubic_control = None;
        cursor.control_relative = relative;
    }

    // ------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------

    fn skip_separators(&mut self) {
        while let Some(b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || *b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn take_command(&mut self) -> Option<char> {
        let b = *self.bytes.get(self.pos)?;
        if b"MmLlHhVvCcSsQqTtAaZz".contains(&b) {
            self.pos += 1;
            Some(b as char)
        } else {
            None
        }
    }

    fn number(&mut self) -> Result<f64, GeometryError> {
        self.skip_separators();
        let start = self.pos;
        if matches!(self.bytes.get(self.pos), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let mut digits = false;
        while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
            digits = true;
        }
        if self.bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
                digits = true;
            }
        }
        if digits && matches!(self.bytes.get(self.pos), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.bytes.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit()) {
                while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = mark;
            }
        }
        if !digits {
            return Err(GeometryError::syntax(self.src, start, "expected number"));
        }
        self.src[start..self.pos]
            .parse::<f64>()
            .map_err(|_| GeometryError::syntax(self.src, start, "invalid number"))
    }

    fn point(&mut self) -> Result<DVec2, GeometryError> {
        Ok(DVec2::new(self.number()?, self.number()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShapeFrame, ViewBox};

    fn unit_transform(ty: f64) -> Transform {
        Transform::new(
            ViewBox {
                min_x: 0.0,
                min_y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            ShapeFrame {
                x: 0.0,
                width: 10.0,
                height: 10.0,
                translate_y: ty,
            },
        )
    }

    #[test]
    fn closed_rectangle_emission() {
        let t = unit_transform(12.0);
        let path = SvgPath::parse("M0,0 L10,0 L10,10 L0,10 Z", &t).unwrap();
        assert_eq!(path.body, "(0,12) -- (10,12) -- (10,2) -- (0,2) -- cycle");
        assert!(path.has_closed);
        assert_eq!(path.first, DVec2::new(0.0, 0.0));
        assert_eq!(path.last, DVec2::new(0.0, 0.0));
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        let t = unit_transform(10.0);
        let path = SvgPath::parse("M0 0 5 0 5 5", &t).unwrap();
        assert_eq!(path.body, "(0,10) -- (5,10) -- (5,5)");
        assert!(!path.has_closed);
    }

    #[test]
    fn relative_commands_use_plus_plus() {
        let t = unit_transform(10.0);
        let path = SvgPath::parse("m 1 1 l 2 0 v 3 h -2", &t).unwrap();
        assert_eq!(path.body, "(1,9) -- ++(2,0) -- ++(0,-3) -- ++(-2,0)");
        assert_eq!(path.last, DVec2::new(1.0, 4.0));
    }

    #[test]
    fn smooth_cubic_reflects_control() {
        let t = unit_transform(0.0);
        let path = SvgPath::parse("M0 0 C 0 2 4 2 4 0 S 8 -2 8 0", &t).unwrap();
        // Reflection of (4,2) about (4,0) is (4,-2).
        assert!(path.body.contains(".. controls (4,2) and (8,2) .. (8,0)"), "{}", path.body);
    }

    #[test]
    fn smooth_without_previous_curve_uses_current_point() {
        let t = unit_transform(0.0);
        let path = SvgPath::parse("M1 1 S 3 3 5 1", &t).unwrap();
        assert!(path.body.contains(".. controls (1,-1) and (3,-3) .. (5,-1)"), "{}", path.body);
    }

    #[test]
    fn arcs_degrade_to_lines() {
        let t = unit_transform(10.0);
        let path = SvgPath::parse("M0 0 A 5 5 0 0 1 10 10", &t).unwrap();
        assert_eq!(path.body, "(0,10) -- (10,0)");
    }

    #[test]
    fn malformed_token_is_syntax_error() {
        let t = unit_transform(10.0);
        assert!(SvgPath::parse("Mfoo", &t).is_err());
        assert!(SvgPath::parse("10 10 L 0 0", &t).is_err());
        assert!(SvgPath::parse("M 5", &t).is_err());
    }
}
