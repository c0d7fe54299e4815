use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::evaluator::{Formula, ScalarField};
use crate::functions::surface::{axis_samples, sample_or_zero, Rectangle};
use crate::FieldError;

/// Default central-difference step. Smaller steps lose more to cancellation
/// than they gain in truncation error at double precision.
pub const DEFAULT_STEP: f64 = 1e-4;
/// Length of a rendered gradient arrow.
const ARROW_LENGTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
  X,
  Y,
}

impl FromStr for Axis {
  type Err = FieldError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "x" | "X" => Ok(Axis::X),
      "y" | "Y" => Ok(Axis::Y),
      _ => Err(FieldError::InvalidAxis(s.to_string())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub fn new(x: f64, y: f64) -> Self {
    Point { x, y }
  }

  fn offset(self, axis: Axis, h: f64) -> Self {
    match axis {
      Axis::X => Point::new(self.x + h, self.y),
      Axis::Y => Point::new(self.x, self.y + h),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientVector {
  pub dx: f64,
  pub dy: f64,
  pub magnitude: f64,
}

impl GradientVector {
  pub fn new(dx: f64, dy: f64) -> Self {
    GradientVector {
      dx,
      dy,
      magnitude: (dx * dx + dy * dy).sqrt(),
    }
  }
}

/// Gradient arrow for the vector-field overlay, in renderer coordinates
/// (`[x, height, y]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientArrow {
  pub position: [f64; 3],
  pub direction: [f64; 3],
}

/// Evaluation failures count as undefined here: unlike surface sampling,
/// nothing is coerced to zero on the derivative path.
fn value_or_nan<F: ScalarField + ?Sized>(field: &F, p: Point) -> f64 {
  field.value_at(p.x, p.y).unwrap_or(f64::NAN)
}

fn check_step(h: f64) -> Result<(), FieldError> {
  if h.is_finite() && h > 0.0 {
    Ok(())
  } else {
    Err(FieldError::InvalidStep(h))
  }
}

/// Central difference `(f(p + h·e) - f(p - h·e)) / 2h` along `axis`.
pub fn field_partial<F: ScalarField + ?Sized>(
  field: &F,
  axis: Axis,
  point: Point,
  h: f64,
) -> Result<f64, FieldError> {
  check_step(h)?;
  let forward = value_or_nan(field, point.offset(axis, h));
  let backward = value_or_nan(field, point.offset(axis, -h));
  Ok((forward - backward) / (2.0 * h))
}

pub fn field_gradient<F: ScalarField + ?Sized>(
  field: &F,
  point: Point,
  h: f64,
) -> Result<GradientVector, FieldError> {
  let dx = field_partial(field, Axis::X, point, h)?;
  let dy = field_partial(field, Axis::Y, point, h)?;
  Ok(GradientVector::new(dx, dy))
}

/// Like `partial_derivative`, but reports a bad step or an unparsable
/// formula instead of answering `NaN`.
pub fn try_partial_derivative(
  formula: &str,
  axis: Axis,
  point: Point,
  h: f64,
) -> Result<f64, FieldError> {
  let parsed = Formula::parse(formula)?;
  field_partial(&parsed, axis, point, h)
}

/// Numerical partial derivative of `formula` at `point`.
///
/// Anything that goes wrong (parse error, failed evaluation, bad step)
/// yields `NaN`; non-finite values propagate arithmetically.
pub fn partial_derivative(
  formula: &str,
  axis: Axis,
  point: Point,
  h: f64,
) -> f64 {
  try_partial_derivative(formula, axis, point, h).unwrap_or_else(|err| {
    debug!("partial derivative of {formula:?} is undefined: {err}");
    f64::NAN
  })
}

/// Numerical gradient of `formula` at `point` with the default step.
pub fn gradient(formula: &str, point: Point) -> GradientVector {
  let dx = partial_derivative(formula, Axis::X, point, DEFAULT_STEP);
  let dy = partial_derivative(formula, Axis::Y, point, DEFAULT_STEP);
  GradientVector::new(dx, dy)
}

/// Gradient arrows on every `stride`-th node of the sampling grid.
///
/// Nodes where the gradient vanishes or is not finite get no arrow. The
/// arrow starts on the best-effort sampled surface and points along
/// `(dx, 0, dy)` with a fixed length.
pub fn gradient_field(
  formula: &str,
  domain: &Rectangle,
  resolution: usize,
  stride: usize,
) -> Result<Vec<GradientArrow>, FieldError> {
  if resolution == 0 {
    return Err(FieldError::InvalidResolution(resolution));
  }
  domain.validate()?;
  let parsed = Formula::parse(formula)?;
  let stride = stride.max(1);

  let xs = axis_samples(domain.x_min, domain.x_max, resolution);
  let ys = axis_samples(domain.y_min, domain.y_max, resolution);

  let mut arrows = Vec::new();
  for &y in ys.iter().step_by(stride) {
    for &x in xs.iter().step_by(stride) {
      let grad = field_gradient(&parsed, Point::new(x, y), DEFAULT_STEP)?;
      if !grad.magnitude.is_finite() || grad.magnitude == 0.0 {
        continue;
      }
      let scale = ARROW_LENGTH / grad.magnitude;
      arrows.push(GradientArrow {
        position: [x, sample_or_zero(&parsed, x, y), y],
        direction: [grad.dx * scale, 0.0, grad.dy * scale],
      });
    }
  }
  debug!("{} gradient arrows for {formula:?}", arrows.len());
  Ok(arrows)
}
