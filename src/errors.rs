//! Geometry error types with rich diagnostics using miette
//!
//! Both variants carry the offending attribute text and a character offset so
//! the logging collaborator can point at the broken token. Style lookups never
//! produce errors; a missing property is an absence, not a failure.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors raised while interpreting path or formula attribute strings.
///
/// Either kind aborts conversion of the single shape whose geometry was being
/// interpreted; sibling shapes keep converting.
#[derive(Error, Diagnostic, Debug)]
pub enum GeometryError {
    /// Malformed token stream: unexpected character, unmatched parenthesis,
    /// unknown command letter.
    #[error("geometry syntax error: {message}")]
    #[diagnostic(code(odg2tikz::geometry::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    /// Unknown equation name, out-of-range modifier index, or an equation
    /// cycle discovered during lazy evaluation.
    #[error("unknown reference: {name}")]
    #[diagnostic(code(odg2tikz::geometry::reference))]
    Reference {
        name: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("referenced here")]
        span: SourceSpan,
    },
}

impl GeometryError {
    /// Syntax error at a byte offset of `source`.
    pub fn syntax(source: &str, offset: usize, message: impl Into<String>) -> Self {
        GeometryError::Syntax {
            message: message.into(),
            src: NamedSource::new("<geometry>", source.to_string()),
            span: clamp_span(source, offset),
        }
    }

    /// Reference error (equation / modifier) at a byte offset of `source`.
    pub fn reference(source: &str, offset: usize, name: impl Into<String>) -> Self {
        GeometryError::Reference {
            name: name.into(),
            src: NamedSource::new("<geometry>", source.to_string()),
            span: clamp_span(source, offset),
        }
    }

    /// True for the reference variant; used by tests.
    pub fn is_reference(&self) -> bool {
        matches!(self, GeometryError::Reference { .. })
    }
}

fn clamp_span(source: &str, offset: usize) -> SourceSpan {
    let at = offset.min(source.len());
    SourceSpan::from((at, source.len().saturating_sub(at).min(1)))
}
