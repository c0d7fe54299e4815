use std::fmt;

use serde::{Serialize, Serializer};

use crate::evaluator::{constant_value, Formula};
use crate::syntax::{BinaryOperator, Expr};
use crate::FieldError;

/// A condition the inputs must meet for a formula to be real-valued.
#[derive(Debug, Clone, PartialEq)]
pub enum Restriction {
  NonNegative(Expr),
  Positive(Expr),
  NonZero(Expr),
  CosineNonZero(Expr),
  SineNonZero(Expr),
  /// `-1 <= e <= 1`
  UnitInterval(Expr),
  AtLeastOne(Expr),
  /// `-1 < e < 1`
  OpenUnitInterval(Expr),
}

impl fmt::Display for Restriction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Restriction::NonNegative(e) => write!(f, "{e} must be non-negative"),
      Restriction::Positive(e) => write!(f, "{e} must be positive"),
      Restriction::NonZero(e) => write!(f, "{e} must not be zero"),
      Restriction::CosineNonZero(e) => write!(f, "cos({e}) must not be zero"),
      Restriction::SineNonZero(e) => write!(f, "sin({e}) must not be zero"),
      Restriction::UnitInterval(e) => write!(f, "{e} must lie in [-1, 1]"),
      Restriction::AtLeastOne(e) => write!(f, "{e} must be at least 1"),
      Restriction::OpenUnitInterval(e) => {
        write!(f, "{e} must lie in (-1, 1)")
      }
    }
  }
}

/// True when `expr` mentions no variables, only numbers and named constants.
fn is_constant(expr: &Expr) -> bool {
  expr
    .identifiers()
    .iter()
    .all(|name| constant_value(name).is_some())
}

/// `n` or `-n` for a literal number `n`.
fn literal_value(expr: &Expr) -> Option<f64> {
  match expr {
    Expr::Number(n) => Some(*n),
    Expr::UnaryOp { operand, .. } => literal_value(operand).map(|n| -n),
    _ => None,
  }
}

/// Conditions under which `expr` is defined, in order of first occurrence
/// and without duplicates. Arguments without variables are not reported.
pub fn restrictions(expr: &Expr) -> Vec<Restriction> {
  let mut found = Vec::new();
  collect(expr, &mut found);
  found
}

fn push(found: &mut Vec<Restriction>, restriction: Restriction) {
  if !found.contains(&restriction) {
    found.push(restriction);
  }
}

fn collect(expr: &Expr, found: &mut Vec<Restriction>) {
  match expr {
    Expr::Number(_) | Expr::Identifier(_) => {}
    Expr::UnaryOp { operand, .. } => collect(operand, found),
    Expr::BinaryOp { op, left, right } => {
      match op {
        BinaryOperator::Divide if !is_constant(right) => {
          push(found, Restriction::NonZero((**right).clone()));
        }
        BinaryOperator::Power if !is_constant(left) => {
          if let Some(n) = literal_value(right) {
            let base = (**left).clone();
            match (n < 0.0, n.fract() != 0.0) {
              (true, true) => push(found, Restriction::Positive(base)),
              (true, false) => push(found, Restriction::NonZero(base)),
              (false, true) => push(found, Restriction::NonNegative(base)),
              (false, false) => {}
            }
          }
        }
        _ => {}
      }
      collect(left, found);
      collect(right, found);
    }
    Expr::FunctionCall { name, args } => {
      for (position, arg) in args.iter().enumerate() {
        if is_constant(arg) {
          continue;
        }
        let restriction = argument_restriction(name, position, args, arg);
        if let Some(restriction) = restriction {
          push(found, restriction);
        }
      }
      for arg in args {
        collect(arg, found);
      }
    }
  }
}

fn argument_restriction(
  name: &str,
  position: usize,
  args: &[Expr],
  arg: &Expr,
) -> Option<Restriction> {
  let arg = arg.clone();
  match (name, position) {
    ("sqrt", 0) => Some(Restriction::NonNegative(arg)),
    ("nthRoot", 0) => match args.get(1).and_then(literal_value) {
      Some(n) if n.fract() == 0.0 && (n as i64) % 2 == 0 => {
        Some(Restriction::NonNegative(arg))
      }
      _ => None,
    },
    ("ln" | "log" | "log10" | "log2", _) => Some(Restriction::Positive(arg)),
    ("tan" | "sec", 0) => Some(Restriction::CosineNonZero(arg)),
    ("csc" | "cot", 0) => Some(Restriction::SineNonZero(arg)),
    ("asin" | "acos" | "arcsin" | "arccos", 0) => {
      Some(Restriction::UnitInterval(arg))
    }
    ("acosh", 0) => Some(Restriction::AtLeastOne(arg)),
    ("atanh", 0) => Some(Restriction::OpenUnitInterval(arg)),
    _ => None,
  }
}

impl Serialize for Restriction {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// Parse `formula` and list its domain restrictions.
pub fn analyze_domain(formula: &str) -> Result<Vec<Restriction>, FieldError> {
  Ok(restrictions(Formula::parse(formula)?.expr()))
}
