use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::syntax::{string_to_expr, BinaryOperator, Expr, UnaryOperator};
use crate::FieldError;

/// Variable name to value. Names are case-sensitive.
pub type Bindings = HashMap<String, f64>;

/// Parse `formula` and evaluate it under `bindings`.
///
/// Domain violations such as `sqrt(-1)` or `1/0` are not errors: they yield
/// `NaN` or an infinity and the caller decides what to do with it.
pub fn evaluate(formula: &str, bindings: &Bindings) -> Result<f64, FieldError> {
  Formula::parse(formula)?.eval(bindings)
}

/// Evaluate an AST under `bindings`.
pub fn evaluate_expr(
  expr: &Expr,
  bindings: &Bindings,
) -> Result<f64, FieldError> {
  eval_with(expr, &|name| bindings.get(name).copied())
}

/// Evaluate an AST, resolving variables through `lookup` before falling
/// back to the named constants.
pub fn eval_with(
  expr: &Expr,
  lookup: &dyn Fn(&str) -> Option<f64>,
) -> Result<f64, FieldError> {
  match expr {
    Expr::Number(n) => Ok(*n),
    Expr::Identifier(name) => lookup(name)
      .or_else(|| constant_value(name))
      .ok_or_else(|| FieldError::UndefinedVariable(name.clone())),
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => Ok(-eval_with(operand, lookup)?),
    Expr::BinaryOp { op, left, right } => {
      let l = eval_with(left, lookup)?;
      let r = eval_with(right, lookup)?;
      Ok(match op {
        BinaryOperator::Plus => l + r,
        BinaryOperator::Minus => l - r,
        BinaryOperator::Times => l * r,
        BinaryOperator::Divide => l / r,
        BinaryOperator::Power => l.powf(r),
      })
    }
    Expr::FunctionCall { name, args } => {
      let values = args
        .iter()
        .map(|arg| eval_with(arg, lookup))
        .collect::<Result<Vec<_>, _>>()?;
      call_builtin(name, &values)
    }
  }
}

/// Value of a named constant, if `name` is one.
pub fn constant_value(name: &str) -> Option<f64> {
  match name {
    "pi" | "PI" => Some(std::f64::consts::PI),
    "e" | "E" => Some(std::f64::consts::E),
    "tau" => Some(std::f64::consts::TAU),
    "phi" => Some(1.618_033_988_749_895),
    "Infinity" => Some(f64::INFINITY),
    "NaN" => Some(f64::NAN),
    _ => None,
  }
}

/// True for every function name `call_builtin` understands.
pub fn is_builtin(name: &str) -> bool {
  matches!(
    name,
    "sin"
      | "cos"
      | "tan"
      | "sec"
      | "csc"
      | "cot"
      | "asin"
      | "acos"
      | "atan"
      | "arcsin"
      | "arccos"
      | "arctan"
      | "sinh"
      | "cosh"
      | "tanh"
      | "asinh"
      | "acosh"
      | "atanh"
      | "sqrt"
      | "cbrt"
      | "exp"
      | "ln"
      | "log"
      | "log10"
      | "log2"
      | "abs"
      | "sign"
      | "floor"
      | "ceil"
      | "round"
      | "atan2"
      | "pow"
      | "mod"
      | "hypot"
      | "nthRoot"
      | "min"
      | "max"
  )
}

fn arity_error(name: &str, expected: &'static str, got: usize) -> FieldError {
  FieldError::ArgumentCount {
    name: name.to_string(),
    expected,
    got,
  }
}

fn unary(
  name: &str,
  args: &[f64],
  f: fn(f64) -> f64,
) -> Result<f64, FieldError> {
  match args {
    [x] => Ok(f(*x)),
    _ => Err(arity_error(name, "1", args.len())),
  }
}

fn binary(
  name: &str,
  args: &[f64],
  f: fn(f64, f64) -> f64,
) -> Result<f64, FieldError> {
  match args {
    [a, b] => Ok(f(*a, *b)),
    _ => Err(arity_error(name, "2", args.len())),
  }
}

/// Apply a builtin function to already evaluated arguments.
pub fn call_builtin(name: &str, args: &[f64]) -> Result<f64, FieldError> {
  match name {
    "sin" => unary(name, args, f64::sin),
    "cos" => unary(name, args, f64::cos),
    "tan" => unary(name, args, f64::tan),
    "sec" => unary(name, args, |x| 1.0 / x.cos()),
    "csc" => unary(name, args, |x| 1.0 / x.sin()),
    "cot" => unary(name, args, |x| 1.0 / x.tan()),
    "asin" | "arcsin" => unary(name, args, f64::asin),
    "acos" | "arccos" => unary(name, args, f64::acos),
    "atan" | "arctan" => unary(name, args, f64::atan),
    "sinh" => unary(name, args, f64::sinh),
    "cosh" => unary(name, args, f64::cosh),
    "tanh" => unary(name, args, f64::tanh),
    "asinh" => unary(name, args, f64::asinh),
    "acosh" => unary(name, args, f64::acosh),
    "atanh" => unary(name, args, f64::atanh),
    "sqrt" => unary(name, args, f64::sqrt),
    "cbrt" => unary(name, args, f64::cbrt),
    "exp" => unary(name, args, f64::exp),
    "ln" => unary(name, args, f64::ln),
    "log10" => unary(name, args, f64::log10),
    "log2" => unary(name, args, f64::log2),
    "abs" => unary(name, args, f64::abs),
    "sign" => unary(name, args, sign),
    "floor" => unary(name, args, f64::floor),
    "ceil" => unary(name, args, f64::ceil),
    "round" => unary(name, args, f64::round),
    // log(x) is the natural logarithm, log(x, b) takes an explicit base
    "log" => match args {
      [x] => Ok(x.ln()),
      [x, base] => Ok(x.ln() / base.ln()),
      _ => Err(arity_error(name, "1 or 2", args.len())),
    },
    "atan2" => binary(name, args, f64::atan2),
    "pow" => binary(name, args, f64::powf),
    "mod" => binary(name, args, modulo),
    "hypot" => binary(name, args, f64::hypot),
    "nthRoot" => binary(name, args, nth_root),
    "min" | "max" => {
      if args.is_empty() {
        return Err(arity_error(name, "at least 1", 0));
      }
      let pick: fn(f64, f64) -> f64 =
        if name == "min" { f64::min } else { f64::max };
      Ok(args[1..].iter().fold(args[0], |acc, &v| pick(acc, v)))
    }
    _ => Err(FieldError::UnknownFunction(name.to_string())),
  }
}

/// Sign that keeps zero (and NaN) as is, unlike `f64::signum`.
fn sign(x: f64) -> f64 {
  if x > 0.0 {
    1.0
  } else if x < 0.0 {
    -1.0
  } else {
    x
  }
}

/// Modulo with the sign of the divisor: `mod(-1, 3) = 2`.
fn modulo(x: f64, y: f64) -> f64 {
  if y == 0.0 {
    x
  } else {
    x - y * (x / y).floor()
  }
}

/// Real n-th root; odd roots of negative numbers stay real.
fn nth_root(x: f64, n: f64) -> f64 {
  if n == 0.0 {
    return f64::NAN;
  }
  if x < 0.0 {
    let is_odd_integer = n.fract() == 0.0 && (n as i64) % 2 != 0;
    if is_odd_integer {
      -(-x).powf(1.0 / n)
    } else {
      f64::NAN
    }
  } else {
    x.powf(1.0 / n)
  }
}

/// A parsed formula. Parsing happens once; evaluation is cheap and can be
/// repeated with different bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
  source: String,
  expr: Expr,
}

impl Formula {
  pub fn parse(source: &str) -> Result<Self, FieldError> {
    let expr = string_to_expr(source)?;
    Ok(Formula {
      source: source.trim().to_string(),
      expr,
    })
  }

  pub fn from_expr(expr: Expr) -> Self {
    Formula {
      source: expr.to_string(),
      expr,
    }
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn expr(&self) -> &Expr {
    &self.expr
  }

  pub fn eval(&self, bindings: &Bindings) -> Result<f64, FieldError> {
    evaluate_expr(&self.expr, bindings)
  }

  /// Free variables, sorted, without the named constants.
  pub fn variables(&self) -> Vec<String> {
    self
      .expr
      .identifiers()
      .into_iter()
      .filter(|name| constant_value(name).is_none())
      .collect()
  }
}

impl FromStr for Formula {
  type Err = FieldError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Formula::parse(s)
  }
}

impl fmt::Display for Formula {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.source)
  }
}

/// A real-valued function of `x` and `y`.
pub trait ScalarField {
  fn value_at(&self, x: f64, y: f64) -> Result<f64, FieldError>;
}

impl ScalarField for Formula {
  fn value_at(&self, x: f64, y: f64) -> Result<f64, FieldError> {
    eval_with(&self.expr, &|name| match name {
      "x" => Some(x),
      "y" => Some(y),
      _ => None,
    })
  }
}
