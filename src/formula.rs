//! Recursive-descent evaluator for the custom-shape formula sub-language.
//!
//! The grammar lives in `formula.pest`; evaluation folds over the parse pairs
//! directly, so a formula never builds an intermediate AST. Equations are
//! evaluated lazily and at most once: the tri-state memo turns a reference
//! cycle into a clean [`GeometryError::Reference`] instead of unbounded
//! recursion (the host renderer overflows its stack on such documents).
//!
//! Two schema quirks are reproduced on purpose and must not be "fixed":
//! trigonometric functions operate in degrees, and `atan2(x, y)` takes the
//! x component first. Existing documents depend on both.

use std::collections::HashMap;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::errors::GeometryError;
use crate::model::ViewBox;

#[derive(Parser)]
#[grammar = "formula.pest"]
struct FormulaParser;

/// The fixed geometry constants visible to formulas.
#[derive(Debug, Clone, Copy)]
pub struct GeometryEnv {
    pub viewbox: ViewBox,
    /// Shape width in log units (1/100 mm).
    pub logwidth: f64,
    /// Shape height in log units (1/100 mm).
    pub logheight: f64,
    pub stretch_x: f64,
    pub stretch_y: f64,
    pub has_stroke: bool,
    pub has_fill: bool,
}

impl GeometryEnv {
    pub fn new(viewbox: ViewBox) -> GeometryEnv {
        GeometryEnv {
            viewbox,
            logwidth: 0.0,
            logheight: 0.0,
            stretch_x: 0.0,
            stretch_y: 0.0,
            has_stroke: true,
            has_fill: true,
        }
    }

    fn lookup(&self, name: &str) -> Option<f64> {
        let vb = self.viewbox;
        Some(match name {
            "pi" => std::f64::consts::PI,
            "left" => vb.min_x,
            "top" => vb.min_y,
            "right" => vb.min_x + vb.width,
            "bottom" => vb.min_y + vb.height,
            "width" => vb.width,
            "height" => vb.height,
            "logwidth" => self.logwidth,
            "logheight" => self.logheight,
            "xstretch" => self.stretch_x,
            "ystretch" => self.stretch_y,
            "hasstroke" => {
                if self.has_stroke {
                    1.0
                } else {
                    0.0
                }
            }
            "hasfill" => {
                if self.has_fill {
                    1.0
                } else {
                    0.0
                }
            }
            _ => return None,
        })
    }
}

/// Lazy evaluation state of one named equation.
#[derive(Debug, Clone, Copy, PartialEq)]
enum EqState {
    Pending,
    Evaluating,
    Done(f64),
}

#[derive(Debug, Clone)]
struct Equation {
    formula: String,
    state: EqState,
}

/// Evaluates formula strings against one shape's geometry environment,
/// modifier list and equation table. Fresh per shape.
#[derive(Debug, Clone)]
pub struct Evaluator {
    env: GeometryEnv,
    modifiers: Vec<f64>,
    equations: HashMap<String, Equation>,
}

impl Evaluator {
    pub fn new(env: GeometryEnv) -> Evaluator {
        Evaluator {
            env,
            modifiers: Vec::new(),
            equations: HashMap::new(),
        }
    }

    /// Parse the whitespace-separated modifier attribute. Non-numeric tokens
    /// are skipped (style-resolution policy: tolerate, don't fail).
    pub fn set_modifiers(&mut self, attr: Option<&str>) {
        self.modifiers = attr
            .unwrap_or("")
            .split_ascii_whitespace()
            .filter_map(|t| t.parse::<f64>().ok())
            .collect();
    }

    pub fn modifiers(&self) -> &[f64] {
        &self.modifiers
    }

    /// Register a named equation. Evaluation is deferred until referenced.
    pub fn add_equation(&mut self, name: impl Into<String>, formula: impl Into<String>) {
        self.equations.insert(
            name.into(),
            Equation {
                formula: formula.into(),
                state: EqState::Pending,
            },
        );
    }

    /// Evaluate a complete formula string to a scalar.
    pub fn expression(&mut self, src: &str) -> Result<f64, GeometryError> {
        let mut pairs = FormulaParser::parse(Rule::formula, src).map_err(|e| {
            let offset = match e.location {
                pest::error::InputLocation::Pos(p) => p,
                pest::error::InputLocation::Span((start, _)) => start,
            };
            GeometryError::syntax(src, offset, e.variant.message().to_string())
        })?;
        let formula = pairs.next().expect("grammar: formula has one match");
        let expr = formula
            .into_inner()
            .next()
            .expect("grammar: formula contains expr");
        self.eval_expr(src, expr)
    }

    /// Evaluate an equation by name (memoized).
    pub fn equation(&mut self, name: &str) -> Result<f64, GeometryError> {
        self.equation_at(name, name, 0)
    }

    fn equation_at(&mut self, src: &str, name: &str, offset: usize) -> Result<f64, GeometryError> {
        let formula = match self.equations.get_mut(name) {
            None => return Err(GeometryError::reference(src, offset, format!("?{name}"))),
            Some(eq) => match eq.state {
                EqState::Done(v) => return Ok(v),
                // Re-entry while evaluating means the equations reference
                // each other in a cycle.
                EqState::Evaluating => {
                    return Err(GeometryError::reference(src, offset, format!("?{name}")));
                }
                EqState::Pending => {
                    eq.state = EqState::Evaluating;
                    eq.formula.clone()
                }
            },
        };
        let value = self.expression(&formula)?;
        if let Some(eq) = self.equations.get_mut(name) {
            eq.state = EqState::Done(value);
        }
        Ok(value)
    }

    fn modifier_at(&self, src: &str, index: usize, offset: usize) -> Result<f64, GeometryError> {
        self.modifiers
            .get(index)
            .copied()
            .ok_or_else(|| GeometryError::reference(src, offset, format!("${index}")))
    }

    fn eval_expr(&mut self, src: &str, pair: Pair<'_, Rule>) -> Result<f64, GeometryError> {
        // expr = term ~ (add_op ~ term)*
        let mut inner = pair.into_inner();
        let mut value = self.eval_term(src, inner.next().expect("grammar: expr has a term"))?;
        while let Some(op) = inner.next() {
            let rhs = self.eval_term(src, inner.next().expect("grammar: op has a rhs"))?;
            match op.as_str() {
                "+" => value += rhs,
                _ => value -= rhs,
            }
        }
        Ok(value)
    }

    fn eval_term(&mut self, src: &str, pair: Pair<'_, Rule>) -> Result<f64, GeometryError> {
        // term = factor ~ (mul_op ~ factor)*
        let mut inner = pair.into_inner();
        let mut value = self.eval_factor(src, inner.next().expect("grammar: term has a factor"))?;
        while let Some(op) = inner.next() {
            let offset = op.as_span().start();
            let rhs = self.eval_factor(src, inner.next().expect("grammar: op has a rhs"))?;
            match op.as_str() {
                "*" => value *= rhs,
                _ => {
                    if rhs == 0.0 {
                        return Err(GeometryError::syntax(src, offset, "division by zero"));
                    }
                    value /= rhs;
                }
            }
        }
        Ok(value)
    }

    fn eval_factor(&mut self, src: &str, pair: Pair<'_, Rule>) -> Result<f64, GeometryError> {
        // factor = neg ~ factor | primary
        let mut inner = pair.into_inner();
        let first = inner.next().expect("grammar: factor is not empty");
        match first.as_rule() {
            Rule::neg => {
                let operand = inner.next().expect("grammar: neg has an operand");
                Ok(-self.eval_factor(src, operand)?)
            }
            _ => self.eval_primary(src, first),
        }
    }

    fn eval_primary(&mut self, src: &str, pair: Pair<'_, Rule>) -> Result<f64, GeometryError> {
        let inner = pair
            .into_inner()
            .next()
            .expect("grammar: primary has one alternative");
        let offset = inner.as_span().start();
        match inner.as_rule() {
            Rule::number => inner
                .as_str()
                .parse::<f64>()
                .map_err(|_| GeometryError::syntax(src, offset, "invalid number")),
            Rule::paren => {
                let expr = inner
                    .into_inner()
                    .next()
                    .expect("grammar: paren wraps an expr");
                self.eval_expr(src, expr)
            }
            Rule::equation_ref => {
                let name = inner.as_str()[1..].to_string();
                self.equation_at(src, &name, offset)
            }
            Rule::modifier_ref => {
                let index: usize = inner.as_str()[1..]
                    .parse()
                    .map_err(|_| GeometryError::syntax(src, offset, "invalid modifier index"))?;
                self.modifier_at(src, index, offset)
            }
            Rule::ident => {
                let name = inner.as_str();
                self.env
                    .lookup(name)
                    .ok_or_else(|| GeometryError::reference(src, offset, name.to_string()))
            }
            Rule::function => self.eval_function(src, inner),
            rule => Err(GeometryError::syntax(
                src,
                offset,
                format!("unexpected {rule:?}"),
            )),
        }
    }

    fn eval_function(&mut self, src: &str, pair: Pair<'_, Rule>) -> Result<f64, GeometryError> {
        let offset = pair.as_span().start();
        let mut inner = pair.into_inner();
        let name = inner.next().expect("grammar: function has a name");
        let name_str = name.as_str();
        let mut args = Vec::new();
        for arg in inner {
            args.push(self.eval_expr(src, arg)?);
        }
        let arity_err =
            || GeometryError::syntax(src, offset, format!("wrong argument count for {name_str}"));
        // Trigonometry is in degrees throughout (schema quirk, kept).
        match (name_str, args.as_slice()) {
            ("abs", [a]) => Ok(a.abs()),
            ("sqrt", [a]) => Ok(a.abs().sqrt()),
            ("sin", [a]) => Ok(a.to_radians().sin()),
            ("cos", [a]) => Ok(a.to_radians().cos()),
            ("tan", [a]) => Ok(a.to_radians().tan()),
            ("atan", [a]) => Ok(a.atan().to_degrees()),
            ("min", [a, b]) => Ok(a.min(*b)),
            ("max", [a, b]) => Ok(a.max(*b)),
            // Observed argument order: x first, then y.
            ("atan2", [x, y]) => Ok(y.atan2(*x).to_degrees()),
            ("if", [cond, then, alt]) => Ok(if *cond > 0.0 { *then } else { *alt }),
            ("abs" | "sqrt" | "sin" | "cos" | "tan" | "atan" | "min" | "max" | "atan2" | "if", _) => {
                Err(arity_err())
            }
            _ => Err(GeometryError::reference(src, offset, name_str.to_string())),
        }
    }
}
