use log::{debug, trace, warn};
use serde::Serialize;

use crate::evaluator::{Formula, ScalarField};
use crate::FieldError;

pub const DEFAULT_RESOLUTION: usize = 50;
/// Half width of the default plotting square `[-5, 5] × [-5, 5]`.
pub const DEFAULT_RANGE: f64 = 5.0;

/// Closed rectangle `[x_min, x_max] × [y_min, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rectangle {
  pub x_min: f64,
  pub x_max: f64,
  pub y_min: f64,
  pub y_max: f64,
}

impl Rectangle {
  pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
    Rectangle {
      x_min: x.0,
      x_max: x.1,
      y_min: y.0,
      y_max: y.1,
    }
  }

  /// `[-half_width, half_width]` on both axes.
  pub fn square(half_width: f64) -> Self {
    Rectangle::new((-half_width, half_width), (-half_width, half_width))
  }

  /// Bounds must be finite and ordered.
  pub fn validate(&self) -> Result<(), FieldError> {
    check_range('x', self.x_min, self.x_max)?;
    check_range('y', self.y_min, self.y_max)
  }
}

impl Default for Rectangle {
  fn default() -> Self {
    Rectangle::square(DEFAULT_RANGE)
  }
}

fn check_range(axis: char, min: f64, max: f64) -> Result<(), FieldError> {
  if min.is_finite() && max.is_finite() && min <= max {
    Ok(())
  } else {
    Err(FieldError::InvalidDomain { axis, min, max })
  }
}

/// Sampled height field. Row `i` belongs to `y[i]`, column `j` to `x[j]`,
/// so `z[i][j] = f(x[j], y[i])`. Every value is finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceGrid {
  pub x: Vec<f64>,
  pub y: Vec<f64>,
  pub z: Vec<Vec<f64>>,
}

impl SurfaceGrid {
  /// Number of intervals per axis.
  pub fn resolution(&self) -> usize {
    self.x.len().saturating_sub(1)
  }

  /// Smallest and largest height.
  pub fn z_range(&self) -> (f64, f64) {
    self
      .z
      .iter()
      .flatten()
      .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| {
        (lo.min(z), hi.max(z))
      })
  }
}

/// `resolution + 1` evenly spaced samples, the last one pinned to `max`.
pub(crate) fn axis_samples(min: f64, max: f64, resolution: usize) -> Vec<f64> {
  let step = (max - min) / resolution as f64;
  (0..=resolution)
    .map(|k| {
      if k == resolution {
        max
      } else {
        min + k as f64 * step
      }
    })
    .collect()
}

/// Best-effort sampling: a failed or non-finite evaluation becomes `0`.
pub(crate) fn sample_or_zero<F: ScalarField + ?Sized>(
  field: &F,
  x: f64,
  y: f64,
) -> f64 {
  match field.value_at(x, y) {
    Ok(z) if z.is_finite() => z,
    Ok(z) => {
      trace!("f({x}, {y}) = {z}, using 0");
      0.0
    }
    Err(err) => {
      trace!("f({x}, {y}) failed: {err}, using 0");
      0.0
    }
  }
}

/// Sample `formula` over `domain` on a `(resolution + 1)²` grid.
///
/// A formula that does not parse samples as all zeros, like any other
/// evaluation failure. Only shape errors are reported.
pub fn sample_surface(
  formula: &str,
  domain: &Rectangle,
  resolution: usize,
) -> Result<SurfaceGrid, FieldError> {
  match Formula::parse(formula) {
    Ok(parsed) => sample_field(&parsed, domain, resolution),
    Err(err) => {
      warn!("cannot parse {formula:?} ({err}), sampling it as zero");
      sample_field(&Zero, domain, resolution)
    }
  }
}

/// Stand-in for a formula that failed to parse.
pub(crate) struct Zero;

impl ScalarField for Zero {
  fn value_at(&self, _x: f64, _y: f64) -> Result<f64, FieldError> {
    Ok(0.0)
  }
}

/// Sample any scalar field over `domain`.
pub fn sample_field<F: ScalarField + ?Sized>(
  field: &F,
  domain: &Rectangle,
  resolution: usize,
) -> Result<SurfaceGrid, FieldError> {
  if resolution == 0 {
    return Err(FieldError::InvalidResolution(resolution));
  }
  domain.validate()?;
  debug!(
    "sampling {}x{} grid over {:?}",
    resolution + 1,
    resolution + 1,
    domain
  );

  let x = axis_samples(domain.x_min, domain.x_max, resolution);
  let y = axis_samples(domain.y_min, domain.y_max, resolution);
  let z = y
    .iter()
    .map(|&yv| x.iter().map(|&xv| sample_or_zero(field, xv, yv)).collect())
    .collect();

  Ok(SurfaceGrid { x, y, z })
}
