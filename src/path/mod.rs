//! The two path-grammar interpreters.
//!
//! Both parse a single attribute string into TikZ path text. Parse state
//! lives in an explicit [`PathCursor`] whose lifetime is exactly one parse
//! call; nothing about a path survives the shape it belongs to.

pub mod enhanced;
pub mod svg;

pub use enhanced::{EnhancedPath, subpath_tints};
pub use svg::SvgPath;

use glam::DVec2;

/// Mutable per-path scan state threaded through the command handlers.
///
/// Coordinates are kept in source (view-box) units; they only become device
/// coordinates at emission time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCursor {
    /// Current point, valid when `started` is set.
    pub current: DVec2,
    /// First point of the current sub-path, target of close commands.
    pub first: DVec2,
    pub started: bool,
    /// Last cubic control point, for smooth-curve reflection.
    pub cubic_control: Option<DVec2>,
    /// Last quadratic control point, for smooth-curve reflection.
    pub quad_control: Option<DVec2>,
    /// Whether the last control point came from a relative command.
    pub control_relative: bool,
    /// At least one sub-path was closed.
    pub closed: bool,
}

impl PathCursor {
    /// Forget curve continuation state; called by every non-curve command.
    pub fn break_curve(&mut self) {
        self.cubic_control = None;
        self.quad_control = None;
        self.control_relative = false;
    }
}

/// One stroke/fill unit of an enhanced path. Sub-paths carry their own
/// in-band visibility flags (`F`/`S` commands).
#[derive(Debug, Clone, Default)]
pub struct SubPath {
    pub body: String,
    pub no_fill: bool,
    pub no_stroke: bool,
}

impl SubPath {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
