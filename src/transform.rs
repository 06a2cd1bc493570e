//! View-box to device-box mapping.
//!
//! The source schema's y axis grows downward; TikZ's grows upward. Every
//! y coordinate is flipped against the running `translate_y` baseline so a
//! group of shapes shares one picture-wide coordinate system. Anisotropic
//! scaling is not angle-preserving, so angles are re-derived from scaled
//! unit-circle components instead of being scaled directly.

use glam::DVec2;

use crate::model::{ShapeFrame, ViewBox};

/// Stretched axis of a custom shape's two-piece coordinate remap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Two-piece remap state: coordinates up to `at` (view-box units, relative to
/// the view-box origin) map through the unstretched scale, coordinates past it
/// get the leftover device size added on top.
#[derive(Debug, Clone, Copy)]
struct Stretch {
    axis: Axis,
    at: f64,
    /// Device size the stretched axis would have at the view-box aspect ratio.
    unstretched: f64,
}

/// Maps one shape's view-box coordinates into device (TikZ) coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    frame: ShapeFrame,
    viewbox: ViewBox,
    stretch: Option<Stretch>,
}

impl Transform {
    pub fn new(viewbox: ViewBox, frame: ShapeFrame) -> Transform {
        Transform {
            frame,
            viewbox,
            stretch: None,
        }
    }

    pub fn frame(&self) -> &ShapeFrame {
        &self.frame
    }

    pub fn viewbox(&self) -> &ViewBox {
        &self.viewbox
    }

    /// Install the stretch-point remap for custom shapes that declare stretch
    /// coordinates. At most one axis stretches; when the geometry claims both,
    /// x wins (documented limitation of the remap).
    ///
    /// An axis only stretches when its declared point sits beyond 10% of the
    /// view box and the shape is oversized on that axis relative to the
    /// view-box aspect ratio.
    pub fn with_stretch(mut self, stretch_x: Option<f64>, stretch_y: Option<f64>) -> Transform {
        let vb = self.viewbox;
        let frame = self.frame;
        if vb.width <= 0.0 || vb.height <= 0.0 || frame.width <= 0.0 || frame.height <= 0.0 {
            return self;
        }
        let shape_aspect = frame.width / frame.height;
        let box_aspect = vb.width / vb.height;

        if let Some(sx) = stretch_x {
            let at = sx - vb.min_x;
            if at / vb.width > 0.1 && shape_aspect > box_aspect {
                self.stretch = Some(Stretch {
                    axis: Axis::X,
                    at,
                    unstretched: frame.height * box_aspect,
                });
                return self;
            }
        }
        if let Some(sy) = stretch_y {
            let at = sy - vb.min_y;
            if at / vb.height > 0.1 && shape_aspect < box_aspect {
                self.stretch = Some(Stretch {
                    axis: Axis::Y,
                    at,
                    unstretched: frame.width / box_aspect,
                });
            }
        }
        self
    }

    /// Uniform x scale, used for arc radii.
    pub fn scale_x(&self) -> f64 {
        self.frame.width / self.viewbox.width
    }

    /// Uniform y scale, used for arc radii.
    pub fn scale_y(&self) -> f64 {
        self.frame.height / self.viewbox.height
    }

    fn stretched_x(&self, rel: f64) -> f64 {
        match self.stretch {
            Some(Stretch {
                axis: Axis::X,
                at,
                unstretched,
            }) => {
                let scaled = rel * unstretched / self.viewbox.width;
                if rel > at {
                    scaled + (self.frame.width - unstretched)
                } else {
                    scaled
                }
            }
            _ => rel * self.scale_x(),
        }
    }

    fn stretched_y(&self, rel: f64) -> f64 {
        match self.stretch {
            Some(Stretch {
                axis: Axis::Y,
                at,
                unstretched,
            }) => {
                let scaled = rel * unstretched / self.viewbox.height;
                if rel > at {
                    scaled + (self.frame.height - unstretched)
                } else {
                    scaled
                }
            }
            _ => rel * self.scale_y(),
        }
    }

    /// Map a view-box point to device coordinates (cm), flipping the y axis
    /// against the baseline.
    pub fn point(&self, x: f64, y: f64) -> DVec2 {
        DVec2::new(
            self.frame.x + self.stretched_x(x - self.viewbox.min_x),
            self.frame.translate_y - self.stretched_y(y - self.viewbox.min_y),
        )
    }

    /// Recompute an angle (degrees) under the anisotropic scale and the axis
    /// flip. The result stays on the source angle's winding branch so angles
    /// outside (-180, 180] keep their side after transform.
    pub fn angle(&self, degrees: f64) -> f64 {
        let rad = degrees.to_radians();
        let mut out = -(rad.sin() * self.scale_y())
            .atan2(rad.cos() * self.scale_x())
            .to_degrees();
        while out + degrees > 180.0 {
            out -= 360.0;
        }
        while out + degrees < -180.0 {
            out += 360.0;
        }
        out
    }
}

/// Canonical number format: rounded to 3 decimals, integers without a
/// decimal point.
pub fn fmt_num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

/// A device point in TikZ coordinate syntax.
pub fn fmt_point(p: DVec2) -> String {
    format!("({},{})", fmt_num(p.x), fmt_num(p.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(x: f64, w: f64, h: f64, ty: f64) -> ShapeFrame {
        ShapeFrame {
            x,
            width: w,
            height: h,
            translate_y: ty,
        }
    }

    #[test]
    fn corners_map_to_device_box() {
        let vb = ViewBox {
            min_x: 5.0,
            min_y: 10.0,
            width: 100.0,
            height: 50.0,
        };
        let t = Transform::new(vb, frame(1.0, 10.0, 5.0, 7.0));
        let close = |p: DVec2, x: f64, y: f64| {
            assert!((p.x - x).abs() < 1e-3 && (p.y - y).abs() < 1e-3, "{p:?}")
        };
        close(t.point(5.0, 10.0), 1.0, 7.0);
        close(t.point(105.0, 10.0), 11.0, 7.0);
        close(t.point(5.0, 60.0), 1.0, 2.0);
        close(t.point(105.0, 60.0), 11.0, 2.0);
    }

    #[test]
    fn square_scale_angle_is_sign_flip() {
        let vb = ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: 100.0,
            height: 100.0,
        };
        let t = Transform::new(vb, frame(0.0, 4.0, 4.0, 4.0));
        for a in [-350.0, -90.0, 0.0, 30.0, 90.0, 180.0, 270.0, 359.0] {
            assert!((t.angle(a) + a).abs() < 1e-9, "angle {a} -> {}", t.angle(a));
        }
    }

    #[test]
    fn anisotropic_angle_is_rederived() {
        let vb = ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: 100.0,
            height: 100.0,
        };
        // Twice as wide as tall: 45 degrees flattens out.
        let t = Transform::new(vb, frame(0.0, 8.0, 4.0, 4.0));
        let a = t.angle(45.0);
        assert!((a - (-26.565)).abs() < 1e-3, "{a}");
    }

    #[test]
    fn stretch_is_noop_at_matching_aspect() {
        let vb = ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: 21600.0,
            height: 21600.0,
        };
        let plain = Transform::new(vb, frame(0.0, 4.0, 4.0, 4.0));
        let stretched = plain.with_stretch(Some(10800.0), None);
        let p = stretched.point(5400.0, 16200.0);
        let q = plain.point(5400.0, 16200.0);
        assert_eq!(p, q);
    }

    #[test]
    fn stretch_remaps_past_threshold() {
        let vb = ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: 21600.0,
            height: 21600.0,
        };
        // 8cm x 4cm shape: x stretches, unstretched width is 4cm.
        let t = Transform::new(vb, frame(0.0, 8.0, 4.0, 4.0)).with_stretch(Some(10800.0), None);
        let left = t.point(5400.0, 0.0);
        assert!((left.x - 1.0).abs() < 1e-9);
        let right = t.point(16200.0, 0.0);
        assert!((right.x - 7.0).abs() < 1e-9, "{right:?}");
        // y is untouched
        assert!((t.point(0.0, 10800.0).y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn fmt_num_canonical_form() {
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(1.2342), "1.234");
        assert_eq!(fmt_num(1.9996), "2");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(0.1), "0.1");
        assert_eq!(fmt_point(DVec2::new(1.0, -2.5)), "(1,-2.5)");
    }
}
