use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod evaluator;
pub mod functions;
pub mod syntax;

pub use evaluator::{evaluate, Bindings, Formula, ScalarField};
pub use functions::calculus::{differentiate, simplify, symbolic_partial};
pub use functions::derivative::{
  gradient, gradient_field, partial_derivative, try_partial_derivative, Axis,
  GradientArrow, GradientVector, Point, DEFAULT_STEP,
};
pub use functions::domain::{analyze_domain, restrictions, Restriction};
pub use functions::format::{format_number, DEFAULT_DECIMALS};
pub use functions::integral::{double_integral, DEFAULT_INTERVALS};
pub use functions::mesh::SurfaceMesh;
pub use functions::plot3d::{render_svg, PlotOptions};
pub use functions::surface::{
  sample_field, sample_surface, Rectangle, SurfaceGrid, DEFAULT_RESOLUTION,
};

#[derive(Parser)]
#[grammar = "formula.pest"]
pub struct FormulaParser;

#[derive(Error, Debug)]
pub enum FieldError {
  #[error("Parse error: {0}")]
  ParseError(#[from] Box<pest::error::Error<Rule>>),
  #[error("Empty input")]
  EmptyInput,
  #[error("Invalid number literal: {0}")]
  InvalidNumber(String),
  #[error("Undefined variable: {0}")]
  UndefinedVariable(String),
  #[error("Unknown function: {0}")]
  UnknownFunction(String),
  #[error("{name} expects {expected} argument(s), got {got}")]
  ArgumentCount {
    name: String,
    expected: &'static str,
    got: usize,
  },
  #[error("Cannot differentiate {0}")]
  NotDifferentiable(String),
  #[error("Unknown axis {0:?}, expected x or y")]
  InvalidAxis(String),
  #[error("Resolution must be at least 1, got {0}")]
  InvalidResolution(usize),
  #[error("Invalid {axis} range [{min}, {max}]")]
  InvalidDomain { axis: char, min: f64, max: f64 },
  #[error(
    "Simpson's rule needs an even number of intervals of at least 2, got {0}"
  )]
  InvalidIntervals(usize),
  #[error("Step size must be finite and positive, got {0}")]
  InvalidStep(f64),
  #[error("Render error: {0}")]
  RenderError(String),
}

impl FormulaParser {
  pub fn parse_formula(
    input: &str,
  ) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
  {
    Self::parse(Rule::Formula, input).map_err(Box::new)
  }
}

pub fn parse(
  input: &str,
) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>> {
  FormulaParser::parse_formula(input)
}
