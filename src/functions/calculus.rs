//! Symbolic differentiation and simplification on `Expr` trees.

use crate::evaluator::{is_builtin, Formula};
use crate::syntax::{BinaryOperator, Expr, UnaryOperator};
use crate::FieldError;

fn num(n: f64) -> Expr {
  // -0 would print as "0" but compare unequal in folded output
  Expr::Number(if n == 0.0 { 0.0 } else { n })
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
  Expr::BinaryOp {
    op,
    left: Box::new(left),
    right: Box::new(right),
  }
}

fn add(left: Expr, right: Expr) -> Expr {
  binary(BinaryOperator::Plus, left, right)
}

fn sub(left: Expr, right: Expr) -> Expr {
  binary(BinaryOperator::Minus, left, right)
}

fn mul(left: Expr, right: Expr) -> Expr {
  binary(BinaryOperator::Times, left, right)
}

fn div(left: Expr, right: Expr) -> Expr {
  binary(BinaryOperator::Divide, left, right)
}

fn pow(left: Expr, right: Expr) -> Expr {
  binary(BinaryOperator::Power, left, right)
}

fn neg(operand: Expr) -> Expr {
  Expr::UnaryOp {
    op: UnaryOperator::Minus,
    operand: Box::new(operand),
  }
}

fn call(name: &str, arg: Expr) -> Expr {
  Expr::FunctionCall {
    name: name.to_string(),
    args: vec![arg],
  }
}

fn is_number(expr: &Expr, value: f64) -> bool {
  matches!(expr, Expr::Number(n) if *n == value)
}

fn is_euler(expr: &Expr) -> bool {
  matches!(expr, Expr::Identifier(name) if name == "e" || name == "E")
}

fn single<'a>(name: &str, args: &'a [Expr]) -> Result<&'a Expr, FieldError> {
  match args {
    [u] => Ok(u),
    _ => Err(FieldError::ArgumentCount {
      name: name.to_string(),
      expected: "1",
      got: args.len(),
    }),
  }
}

fn pair<'a>(
  name: &str,
  args: &'a [Expr],
) -> Result<(&'a Expr, &'a Expr), FieldError> {
  match args {
    [a, b] => Ok((a, b)),
    _ => Err(FieldError::ArgumentCount {
      name: name.to_string(),
      expected: "2",
      got: args.len(),
    }),
  }
}

/// d/d`var` of `expr`, simplified.
///
/// Identifiers other than `var` are treated as constants.
pub fn differentiate(expr: &Expr, var: &str) -> Result<Expr, FieldError> {
  Ok(simplify(derive(expr, var)?))
}

/// Parse `formula` and print its partial derivative with respect to `var`.
pub fn symbolic_partial(
  formula: &str,
  var: &str,
) -> Result<String, FieldError> {
  let formula = Formula::parse(formula)?;
  Ok(differentiate(formula.expr(), var)?.to_string())
}

fn derive(expr: &Expr, var: &str) -> Result<Expr, FieldError> {
  match expr {
    Expr::Number(_) => Ok(num(0.0)),
    Expr::Identifier(name) => Ok(num(if name == var { 1.0 } else { 0.0 })),
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => Ok(neg(derive(operand, var)?)),
    Expr::BinaryOp { op, left, right } => {
      derive_binary(*op, left, right, expr, var)
    }
    Expr::FunctionCall { name, args } => derive_call(name, args, var),
  }
}

fn derive_binary(
  op: BinaryOperator,
  left: &Expr,
  right: &Expr,
  whole: &Expr,
  var: &str,
) -> Result<Expr, FieldError> {
  use BinaryOperator::*;

  let da = derive(left, var)?;
  let db = derive(right, var)?;
  Ok(match op {
    Plus => add(da, db),
    Minus => sub(da, db),
    // (ab)' = a'b + ab'
    Times => add(mul(da, right.clone()), mul(left.clone(), db)),
    Divide if right.is_constant_wrt(var) => div(da, right.clone()),
    // (a/b)' = (a'b - ab') / b^2
    Divide => div(
      sub(mul(da, right.clone()), mul(left.clone(), db)),
      pow(right.clone(), num(2.0)),
    ),
    // (f^n)' = n f^(n-1) f'
    Power if right.is_constant_wrt(var) => mul(
      mul(right.clone(), pow(left.clone(), sub(right.clone(), num(1.0)))),
      da,
    ),
    Power if is_euler(left) && left.is_constant_wrt(var) => {
      mul(whole.clone(), db)
    }
    // (a^g)' = a^g ln(a) g'
    Power if left.is_constant_wrt(var) => {
      mul(mul(whole.clone(), call("ln", left.clone())), db)
    }
    // (f^g)' = f^g (g' ln(f) + g f'/f)
    Power => mul(
      whole.clone(),
      add(
        mul(db, call("ln", left.clone())),
        div(mul(right.clone(), da), left.clone()),
      ),
    ),
  })
}

fn derive_call(
  name: &str,
  args: &[Expr],
  var: &str,
) -> Result<Expr, FieldError> {
  match name {
    "log" if args.len() == 2 => {
      let (u, base) = (args[0].clone(), args[1].clone());
      derive(&div(call("ln", u), call("ln", base)), var)
    }
    "pow" => {
      let (base, exponent) = pair(name, args)?;
      derive(&pow(base.clone(), exponent.clone()), var)
    }
    "hypot" => {
      let (a, b) = pair(name, args)?;
      let sum = add(pow(a.clone(), num(2.0)), pow(b.clone(), num(2.0)));
      derive(&call("sqrt", sum), var)
    }
    "nthRoot" => {
      let (u, n) = pair(name, args)?;
      if !n.is_constant_wrt(var) {
        return Err(FieldError::NotDifferentiable(format!(
          "nthRoot with a degree depending on {var}"
        )));
      }
      derive(&pow(u.clone(), div(num(1.0), n.clone())), var)
    }
    // atan2(a, b)' = (b a' - a b') / (a^2 + b^2)
    "atan2" => {
      let (a, b) = pair(name, args)?;
      let da = derive(a, var)?;
      let db = derive(b, var)?;
      Ok(div(
        sub(mul(b.clone(), da), mul(a.clone(), db)),
        add(pow(a.clone(), num(2.0)), pow(b.clone(), num(2.0))),
      ))
    }
    "floor" | "ceil" | "round" | "sign" | "mod" | "min" | "max" => {
      if args.iter().all(|arg| arg.is_constant_wrt(var)) {
        Ok(num(0.0))
      } else {
        Err(FieldError::NotDifferentiable(name.to_string()))
      }
    }
    _ if is_builtin(name) => {
      let u = single(name, args)?;
      if u.is_constant_wrt(var) {
        return Ok(num(0.0));
      }
      let outer = outer_derivative(name, u)?;
      Ok(mul(outer, derive(u, var)?))
    }
    _ => Err(FieldError::UnknownFunction(name.to_string())),
  }
}

/// f'(u) for the single-argument builtins.
fn outer_derivative(name: &str, u: &Expr) -> Result<Expr, FieldError> {
  let u = u.clone();
  let one = || num(1.0);
  let squared = |e: Expr| pow(e, num(2.0));
  Ok(match name {
    "sin" => call("cos", u),
    "cos" => neg(call("sin", u)),
    "tan" => squared(call("sec", u)),
    "sec" => mul(call("sec", u.clone()), call("tan", u)),
    "csc" => neg(mul(call("csc", u.clone()), call("cot", u))),
    "cot" => neg(squared(call("csc", u))),
    "asin" | "arcsin" => div(one(), call("sqrt", sub(one(), squared(u)))),
    "acos" | "arccos" => {
      neg(div(one(), call("sqrt", sub(one(), squared(u)))))
    }
    "atan" | "arctan" => div(one(), add(one(), squared(u))),
    "sinh" => call("cosh", u),
    "cosh" => call("sinh", u),
    "tanh" => div(one(), squared(call("cosh", u))),
    "asinh" => div(one(), call("sqrt", add(squared(u), one()))),
    "acosh" => div(one(), call("sqrt", sub(squared(u), one()))),
    "atanh" => div(one(), sub(one(), squared(u))),
    "sqrt" => div(one(), mul(num(2.0), call("sqrt", u))),
    "cbrt" => div(one(), mul(num(3.0), squared(call("cbrt", u)))),
    "exp" => call("exp", u),
    "ln" | "log" => div(one(), u),
    "log10" => div(one(), mul(u, call("ln", num(10.0)))),
    "log2" => div(one(), mul(u, call("ln", num(2.0)))),
    "abs" => call("sign", u),
    _ => return Err(FieldError::UnknownFunction(name.to_string())),
  })
}

/// Bottom-up algebraic cleanup: constant folding and the identities of
/// `0`, `1` and negation. Division and powers fold only to whole numbers
/// so `1/3` stays exact.
pub fn simplify(expr: Expr) -> Expr {
  match expr {
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => negate(simplify(*operand)),
    Expr::BinaryOp { op, left, right } => {
      simplify_binary(op, simplify(*left), simplify(*right))
    }
    Expr::FunctionCall { name, args } => Expr::FunctionCall {
      name,
      args: args.into_iter().map(simplify).collect(),
    },
    other => other,
  }
}

fn negate(operand: Expr) -> Expr {
  match operand {
    Expr::Number(n) => num(-n),
    // --a = a
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => *operand,
    // -(n*a) = (-n)*a
    Expr::BinaryOp {
      op: BinaryOperator::Times,
      left,
      right,
    } if has_leading_number(&left) => {
      simplify_binary(BinaryOperator::Times, negate(*left), *right)
    }
    other => neg(other),
  }
}

fn has_leading_number(expr: &Expr) -> bool {
  match expr {
    Expr::Number(_) => true,
    Expr::BinaryOp {
      op: BinaryOperator::Times,
      left,
      ..
    } => has_leading_number(left),
    _ => false,
  }
}

fn fold(op: BinaryOperator, a: f64, b: f64) -> Option<f64> {
  let whole = |v: f64| (v.is_finite() && v.fract() == 0.0).then_some(v);
  match op {
    BinaryOperator::Plus => Some(a + b),
    BinaryOperator::Minus => Some(a - b),
    BinaryOperator::Times => Some(a * b),
    BinaryOperator::Divide => whole(a / b),
    BinaryOperator::Power => whole(a.powf(b)),
  }
}

fn simplify_binary(op: BinaryOperator, l: Expr, r: Expr) -> Expr {
  use BinaryOperator::*;

  if let (Expr::Number(a), Expr::Number(b)) = (&l, &r) {
    if let Some(v) = fold(op, *a, *b) {
      return num(v);
    }
  }

  match op {
    Plus => {
      if is_number(&l, 0.0) {
        return r;
      }
      if is_number(&r, 0.0) {
        return l;
      }
      match r {
        // a + (-n) = a - n
        Expr::Number(n) if n < 0.0 => simplify_binary(Minus, l, num(-n)),
        Expr::UnaryOp {
          op: UnaryOperator::Minus,
          operand,
        } => simplify_binary(Minus, l, *operand),
        r => add(l, r),
      }
    }
    Minus => {
      if is_number(&r, 0.0) {
        return l;
      }
      if is_number(&l, 0.0) {
        return negate(r);
      }
      if l == r {
        return num(0.0);
      }
      match r {
        Expr::Number(n) if n < 0.0 => simplify_binary(Plus, l, num(-n)),
        Expr::UnaryOp {
          op: UnaryOperator::Minus,
          operand,
        } => simplify_binary(Plus, l, *operand),
        r => sub(l, r),
      }
    }
    Times => {
      if is_number(&l, 0.0) || is_number(&r, 0.0) {
        return num(0.0);
      }
      if is_number(&l, 1.0) {
        return r;
      }
      if is_number(&r, 1.0) {
        return l;
      }
      if is_number(&l, -1.0) {
        return negate(r);
      }
      if is_number(&r, -1.0) {
        return negate(l);
      }
      // Numeric factors go first
      if matches!(r, Expr::Number(_)) && !matches!(l, Expr::Number(_)) {
        return simplify_binary(Times, r, l);
      }
      // a * (b * c) = (a * b) * c, which also multiplies leading numbers
      if let Expr::BinaryOp {
        op: Times,
        left,
        right,
      } = r
      {
        return simplify_binary(Times, simplify_binary(Times, l, *left), *right);
      }
      mul(l, r)
    }
    Divide => {
      if is_number(&r, 1.0) {
        return l;
      }
      if is_number(&l, 0.0) && !is_number(&r, 0.0) {
        return num(0.0);
      }
      div(l, r)
    }
    Power => {
      if is_number(&r, 0.0) || is_number(&l, 1.0) {
        return num(1.0);
      }
      if is_number(&r, 1.0) {
        return l;
      }
      if is_number(&l, 0.0) && matches!(r, Expr::Number(n) if n > 0.0) {
        return num(0.0);
      }
      pow(l, r)
    }
  }
}
