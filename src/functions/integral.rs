use log::{debug, warn};

use crate::evaluator::{Formula, ScalarField};
use crate::functions::surface::{axis_samples, sample_or_zero, Zero};
use crate::FieldError;

pub const DEFAULT_INTERVALS: usize = 100;

/// Composite Simpson weight of sample `index` out of `0..=n`: 1-4-2-4-…-4-1.
fn simpson_weight(index: usize, n: usize) -> f64 {
  if index == 0 || index == n {
    1.0
  } else if index % 2 == 0 {
    2.0
  } else {
    4.0
  }
}

fn check_bounds(axis: char, range: (f64, f64)) -> Result<(), FieldError> {
  if range.0.is_finite() && range.1.is_finite() {
    Ok(())
  } else {
    Err(FieldError::InvalidDomain {
      axis,
      min: range.0,
      max: range.1,
    })
  }
}

/// ∫∫ f dx dy over `x_range × y_range` by composite Simpson's rule on an
/// `(n + 1)²` grid.
///
/// `n` must be even and at least 2. Reversed ranges give the signed
/// integral. Failed or non-finite samples contribute `0`.
pub fn integrate_field<F: ScalarField + ?Sized>(
  field: &F,
  x_range: (f64, f64),
  y_range: (f64, f64),
  n: usize,
) -> Result<f64, FieldError> {
  if n < 2 || n % 2 != 0 {
    return Err(FieldError::InvalidIntervals(n));
  }
  check_bounds('x', x_range)?;
  check_bounds('y', y_range)?;

  let dx = (x_range.1 - x_range.0) / n as f64;
  let dy = (y_range.1 - y_range.0) / n as f64;
  let xs = axis_samples(x_range.0, x_range.1, n);
  let ys = axis_samples(y_range.0, y_range.1, n);

  let mut sum = 0.0;
  for (i, &x) in xs.iter().enumerate() {
    let wx = simpson_weight(i, n);
    for (j, &y) in ys.iter().enumerate() {
      sum += wx * simpson_weight(j, n) * sample_or_zero(field, x, y);
    }
  }
  debug!("simpson sum {sum} over {}x{} samples", n + 1, n + 1);

  Ok(sum * dx * dy / 9.0)
}

/// Double integral of `formula`; see `integrate_field`.
///
/// An unparsable formula integrates to `0`, the same as a formula whose
/// every sample fails.
pub fn double_integral(
  formula: &str,
  x_range: (f64, f64),
  y_range: (f64, f64),
  n: usize,
) -> Result<f64, FieldError> {
  match Formula::parse(formula) {
    Ok(parsed) => integrate_field(&parsed, x_range, y_range, n),
    Err(err) => {
      warn!("cannot parse {formula:?} ({err}), integrating it as zero");
      integrate_field(&Zero, x_range, y_range, n)
    }
  }
}
