use fieldcalc::functions::integral::integrate_field;
use fieldcalc::ScalarField;

use super::*;

const UNIT: (f64, f64) = (0.0, 1.0);

mod simpson {
  use super::*;

  #[test]
  fn constant_gives_the_area() {
    assert_approx(double_integral("1", UNIT, UNIT, 10).unwrap(), 1.0, 1e-6);
    assert_approx(
      double_integral("3", (0.0, 2.0), (-1.0, 1.0), 4).unwrap(),
      12.0,
      1e-12,
    );
  }

  #[test]
  fn bilinear() {
    assert_approx(double_integral("x*y", UNIT, UNIT, 50).unwrap(), 0.25, 1e-3);
  }

  #[test]
  fn exact_for_quadratics() {
    assert_approx(
      double_integral("x^2 + y^2", UNIT, UNIT, 2).unwrap(),
      2.0 / 3.0,
      1e-12,
    );
  }

  #[test]
  fn converges_for_smooth_fields() {
    // ∫∫ sin(x)cos(y) over [0, π/2]² = 1
    let quarter = (0.0, std::f64::consts::FRAC_PI_2);
    assert_approx(
      double_integral("sin(x)*cos(y)", quarter, quarter, 20).unwrap(),
      1.0,
      1e-5,
    );
  }

  #[test]
  fn reversed_range_flips_the_sign() {
    assert_approx(
      double_integral("1", (1.0, 0.0), UNIT, 2).unwrap(),
      -1.0,
      1e-12,
    );
  }

  #[test]
  fn empty_range_is_zero() {
    assert_eq!(double_integral("x", (2.0, 2.0), UNIT, 4).unwrap(), 0.0);
  }
}

mod interval_counts {
  use super::*;

  #[test]
  fn odd_count_is_rejected() {
    assert!(matches!(
      double_integral("1", UNIT, UNIT, 3),
      Err(FieldError::InvalidIntervals(3))
    ));
  }

  #[test]
  fn too_few_intervals() {
    assert!(matches!(
      double_integral("1", UNIT, UNIT, 0),
      Err(FieldError::InvalidIntervals(0))
    ));
  }

  #[test]
  fn infinite_bound() {
    assert!(matches!(
      double_integral("1", (0.0, f64::INFINITY), UNIT, 2),
      Err(FieldError::InvalidDomain { axis: 'x', .. })
    ));
  }
}

mod best_effort {
  use super::*;

  #[test]
  fn unparsable_formula_integrates_to_zero() {
    assert_eq!(double_integral("1 +* 2", UNIT, UNIT, 4).unwrap(), 0.0);
  }

  #[test]
  fn pole_contributes_zero() {
    // 1/x is odd in x, and the sample at x = 0 is dropped
    assert_approx(
      double_integral("1/x", (-1.0, 1.0), UNIT, 2).unwrap(),
      0.0,
      1e-12,
    );
  }

  #[test]
  fn failing_samples_contribute_zero() {
    assert_eq!(double_integral("sqrt(-1 - x^2)", UNIT, UNIT, 4).unwrap(), 0.0);
  }
}

struct Plane {
  a: f64,
  b: f64,
}

impl ScalarField for Plane {
  fn value_at(&self, x: f64, y: f64) -> Result<f64, FieldError> {
    Ok(self.a * x + self.b * y)
  }
}

#[test]
fn any_scalar_field_can_be_integrated() {
  // ∫∫ (2x + 4y) over [0, 1]² = 1 + 2
  let plane = Plane { a: 2.0, b: 4.0 };
  assert_approx(integrate_field(&plane, UNIT, UNIT, 6).unwrap(), 3.0, 1e-12);
}
