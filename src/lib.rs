//! Converts ODF drawing shapes into TikZ picture code.
//!
//! The host application parses the document and resolves the style cascade;
//! this crate takes one shape element (or a `draw:g` group) plus a
//! [`StyleSource`] and appends a self-contained `tikzpicture` environment to
//! an output buffer:
//!
//! ```
//! use odg2tikz::{Element, NoStyles, convert};
//!
//! let shape = Element::new("draw:rect")
//!     .with_attr("svg:width", "2cm")
//!     .with_attr("svg:height", "1cm");
//! let mut out = String::new();
//! convert(&shape, &NoStyles, &mut out);
//! assert!(out.starts_with("\\begin{tikzpicture}"));
//! ```
//!
//! Coordinates flow through three spaces: the shape-local view box, the
//! document's cm-based page space, and the emitted TikZ device space (cm,
//! y up). Custom shapes carry their own formula language for parametric
//! geometry; it is evaluated per shape with the modifier and equation
//! bindings from the `draw:enhanced-geometry` element.

pub mod convert;
pub mod errors;
pub mod formula;
pub mod log;
pub mod model;
pub mod path;
pub mod shapes;
pub mod style;
pub mod text;
pub mod transform;

pub use convert::convert;
pub use errors::GeometryError;
pub use model::{Element, NoStyles, ShapeFrame, StyleSource, ViewBox};
pub use style::{OptionList, Rgb, ShapeStyle};
pub use transform::Transform;
