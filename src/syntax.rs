use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use crate::{FieldError, Rule};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Number(f64),
  Identifier(String),
  UnaryOp {
    op: UnaryOperator,
    operand: Box<Expr>,
  },
  BinaryOp {
    op: BinaryOperator,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  FunctionCall {
    name: String,
    args: Vec<Expr>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
  Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
  Plus,
  Minus,
  Times,
  Divide,
  Power,
}

/// Lowest to highest binding power. Implicit multiplication binds tighter
/// than `*` and `/` so `1/2x` reads as `1/(2x)`; unary sign sits below `^`
/// so `-x^2` reads as `-(x^2)`.
static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
  PrattParser::new()
    .op(
      Op::infix(Rule::Add, Assoc::Left)
        | Op::infix(Rule::Subtract, Assoc::Left),
    )
    .op(
      Op::infix(Rule::Multiply, Assoc::Left)
        | Op::infix(Rule::Divide, Assoc::Left),
    )
    .op(Op::infix(Rule::ImplicitMul, Assoc::Left))
    .op(Op::prefix(Rule::Negate) | Op::prefix(Rule::Positive))
    .op(Op::infix(Rule::Power, Assoc::Right))
});

/// Parse formula text into an AST.
pub fn string_to_expr(input: &str) -> Result<Expr, FieldError> {
  if input.trim().is_empty() {
    return Err(FieldError::EmptyInput);
  }
  let mut pairs = crate::parse(input)?;
  // Formula = { SOI ~ Expr ~ EOI }
  let expr_pair = pairs
    .next()
    .and_then(|formula| formula.into_inner().next())
    .ok_or(FieldError::EmptyInput)?;
  pair_to_expr(expr_pair)
}

/// Build an AST from an `Expr` pair.
pub fn pair_to_expr(pair: Pair<Rule>) -> Result<Expr, FieldError> {
  build_expr(pair.into_inner())
}

fn build_expr(pairs: Pairs<Rule>) -> Result<Expr, FieldError> {
  PRATT
    .map_primary(|primary| match primary.as_rule() {
      Rule::Number => primary
        .as_str()
        .parse::<f64>()
        .map(Expr::Number)
        .map_err(|_| FieldError::InvalidNumber(primary.as_str().to_string())),
      Rule::Identifier => Ok(Expr::Identifier(primary.as_str().to_string())),
      Rule::Call => {
        let mut inner = primary.into_inner();
        // CallHead = ${ Identifier ~ "(" }
        let name = inner
          .next()
          .and_then(|head| head.into_inner().next())
          .map(|ident| ident.as_str().to_string())
          .ok_or(FieldError::EmptyInput)?;
        let args = inner.map(pair_to_expr).collect::<Result<Vec<_>, _>>()?;
        Ok(Expr::FunctionCall { name, args })
      }
      Rule::Expr => pair_to_expr(primary),
      rule => unreachable!("unexpected primary {rule:?}"),
    })
    .map_prefix(|op, rhs| match op.as_rule() {
      Rule::Negate => Ok(Expr::UnaryOp {
        op: UnaryOperator::Minus,
        operand: Box::new(rhs?),
      }),
      Rule::Positive => rhs,
      rule => unreachable!("unexpected prefix {rule:?}"),
    })
    .map_infix(|lhs, op, rhs| {
      let op = match op.as_rule() {
        Rule::Add => BinaryOperator::Plus,
        Rule::Subtract => BinaryOperator::Minus,
        Rule::Multiply | Rule::ImplicitMul => BinaryOperator::Times,
        Rule::Divide => BinaryOperator::Divide,
        Rule::Power => BinaryOperator::Power,
        rule => unreachable!("unexpected infix {rule:?}"),
      };
      Ok(Expr::BinaryOp {
        op,
        left: Box::new(lhs?),
        right: Box::new(rhs?),
      })
    })
    .parse(pairs)
}

impl Expr {
  /// Every identifier used as a value (function names excluded), sorted.
  pub fn identifiers(&self) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    self.collect_identifiers(&mut names);
    names
  }

  fn collect_identifiers(&self, names: &mut BTreeSet<String>) {
    match self {
      Expr::Number(_) => {}
      Expr::Identifier(name) => {
        names.insert(name.clone());
      }
      Expr::UnaryOp { operand, .. } => operand.collect_identifiers(names),
      Expr::BinaryOp { left, right, .. } => {
        left.collect_identifiers(names);
        right.collect_identifiers(names);
      }
      Expr::FunctionCall { args, .. } => {
        for arg in args {
          arg.collect_identifiers(names);
        }
      }
    }
  }

  /// True when `var` does not occur anywhere in the expression.
  pub fn is_constant_wrt(&self, var: &str) -> bool {
    match self {
      Expr::Number(_) => true,
      Expr::Identifier(name) => name != var,
      Expr::UnaryOp { operand, .. } => operand.is_constant_wrt(var),
      Expr::BinaryOp { left, right, .. } => {
        left.is_constant_wrt(var) && right.is_constant_wrt(var)
      }
      Expr::FunctionCall { args, .. } => {
        args.iter().all(|arg| arg.is_constant_wrt(var))
      }
    }
  }

  fn precedence(&self) -> u8 {
    match self {
      Expr::BinaryOp { op, .. } => op.precedence(),
      Expr::UnaryOp { .. } => 3,
      Expr::Number(n) if *n < 0.0 => 3,
      _ => 5,
    }
  }
}

impl BinaryOperator {
  fn precedence(self) -> u8 {
    match self {
      BinaryOperator::Plus | BinaryOperator::Minus => 1,
      BinaryOperator::Times | BinaryOperator::Divide => 2,
      BinaryOperator::Power => 4,
    }
  }

  fn symbol(self) -> &'static str {
    match self {
      BinaryOperator::Plus => " + ",
      BinaryOperator::Minus => " - ",
      BinaryOperator::Times => "*",
      BinaryOperator::Divide => "/",
      BinaryOperator::Power => "^",
    }
  }
}

/// Format a number so that the parser reads it back unchanged.
pub fn format_real(n: f64) -> String {
  if n.is_nan() {
    "NaN".to_string()
  } else if n == f64::INFINITY {
    "Infinity".to_string()
  } else if n == f64::NEG_INFINITY {
    "-Infinity".to_string()
  } else if n.fract() == 0.0 && n.abs() < 1e15 {
    format!("{}", n as i64)
  } else {
    format!("{}", n)
  }
}

fn write_operand(
  f: &mut fmt::Formatter<'_>,
  expr: &Expr,
  parenthesize: bool,
) -> fmt::Result {
  if parenthesize {
    write!(f, "({expr})")
  } else {
    write!(f, "{expr}")
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Number(n) => write!(f, "{}", format_real(*n)),
      Expr::Identifier(name) => write!(f, "{name}"),
      Expr::UnaryOp {
        op: UnaryOperator::Minus,
        operand,
      } => {
        write!(f, "-")?;
        write_operand(f, operand, operand.precedence() <= 3)
      }
      Expr::BinaryOp { op, left, right } => {
        let prec = op.precedence();
        // `^` groups to the right, everything else to the left
        let (left_parens, right_parens) = if *op == BinaryOperator::Power {
          (left.precedence() <= prec, right.precedence() < prec)
        } else {
          (left.precedence() < prec, right.precedence() <= prec)
        };
        write_operand(f, left, left_parens)?;
        write!(f, "{}", op.symbol())?;
        write_operand(f, right, right_parens)
      }
      Expr::FunctionCall { name, args } => {
        write!(f, "{name}(")?;
        for (i, arg) in args.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{arg}")?;
        }
        write!(f, ")")
      }
    }
  }
}
