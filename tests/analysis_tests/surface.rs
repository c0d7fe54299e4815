use super::*;

mod shape {
  use super::*;

  #[test]
  fn axes_and_table_have_resolution_plus_one_entries() {
    let domain = Rectangle::new((-1.0, 1.0), (0.0, 2.0));
    let grid = sample_surface("x + y", &domain, 4).unwrap();
    assert_eq!(grid.x.len(), 5);
    assert_eq!(grid.y.len(), 5);
    assert_eq!(grid.z.len(), 5);
    assert!(grid.z.iter().all(|row| row.len() == 5));
    assert_eq!(grid.resolution(), 4);
  }

  #[test]
  fn axes_end_exactly_on_the_bounds() {
    let domain = Rectangle::new((-1.3, 2.9), (0.1, 0.7));
    let grid = sample_surface("0", &domain, 7).unwrap();
    assert_eq!(grid.x[0], -1.3);
    assert_eq!(grid.x[7], 2.9);
    assert_eq!(grid.y[0], 0.1);
    assert_eq!(grid.y[7], 0.7);
  }

  #[test]
  fn rows_follow_y_and_columns_follow_x() {
    let domain = Rectangle::new((0.0, 4.0), (0.0, 4.0));
    let grid = sample_surface("x + 10*y", &domain, 4).unwrap();
    for i in 0..=4 {
      for j in 0..=4 {
        assert_eq!(grid.z[i][j], grid.x[j] + 10.0 * grid.y[i]);
      }
    }
  }

  #[test]
  fn default_domain() {
    assert_eq!(Rectangle::default(), Rectangle::new((-5.0, 5.0), (-5.0, 5.0)));
  }

  #[test]
  fn single_point_domain() {
    let domain = Rectangle::new((2.0, 2.0), (3.0, 3.0));
    let grid = sample_surface("x*y", &domain, 2).unwrap();
    assert!(grid.z.iter().flatten().all(|&z| z == 6.0));
  }
}

mod best_effort {
  use super::*;

  fn all_finite(formula: &str) -> bool {
    let grid = sample_surface(formula, &Rectangle::square(1.0), 10).unwrap();
    grid.z.iter().flatten().all(|z| z.is_finite())
  }

  #[test]
  fn every_cell_is_finite() {
    assert!(all_finite("1/x"));
    assert!(all_finite("ln(x*y)"));
    assert!(all_finite("tan(pi/2*x)"));
    assert!(all_finite("sqrt(-x^2 - 1)"));
  }

  #[test]
  fn pole_becomes_zero() {
    let grid = sample_surface("1/x", &Rectangle::square(1.0), 10).unwrap();
    assert_eq!(grid.x[5], 0.0);
    for row in &grid.z {
      assert_eq!(row[5], 0.0);
    }
    assert_eq!(grid.z[0][0], -1.0);
  }

  #[test]
  fn evaluation_errors_become_zero() {
    let grid = sample_surface("x + t", &unit_square(), 3).unwrap();
    assert!(grid.z.iter().flatten().all(|&z| z == 0.0));
  }

  #[test]
  fn unparsable_formula_samples_as_zero() {
    let grid = sample_surface("sin(", &unit_square(), 3).unwrap();
    assert_eq!(grid.z.len(), 4);
    assert!(grid.z.iter().flatten().all(|&z| z == 0.0));
  }

  #[test]
  fn sampling_is_deterministic() {
    let domain = Rectangle::new((-2.0, 3.0), (-1.0, 1.5));
    let first = sample_surface("sin(x)*cos(y) + 1/x", &domain, 17).unwrap();
    let second = sample_surface("sin(x)*cos(y) + 1/x", &domain, 17).unwrap();
    assert_eq!(first, second);
  }
}

mod shape_errors {
  use super::*;

  #[test]
  fn zero_resolution() {
    assert!(matches!(
      sample_surface("x", &unit_square(), 0),
      Err(FieldError::InvalidResolution(0))
    ));
  }

  #[test]
  fn inverted_domain() {
    let domain = Rectangle::new((1.0, -1.0), (0.0, 1.0));
    assert!(matches!(
      sample_surface("x", &domain, 4),
      Err(FieldError::InvalidDomain { axis: 'x', .. })
    ));
  }

  #[test]
  fn infinite_domain() {
    let domain = Rectangle::new((0.0, 1.0), (0.0, f64::INFINITY));
    assert!(matches!(
      sample_surface("x", &domain, 4),
      Err(FieldError::InvalidDomain { axis: 'y', .. })
    ));
  }
}

#[test]
fn z_range_spans_the_samples() {
  let grid = sample_surface("x", &Rectangle::square(1.0), 4).unwrap();
  assert_eq!(grid.z_range(), (-1.0, 1.0));
}
