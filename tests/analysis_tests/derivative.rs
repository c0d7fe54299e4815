use super::*;

mod partials {
  use super::*;

  #[test]
  fn product_rule_at_a_point() {
    let p = Point::new(2.0, 3.0);
    let dx = partial_derivative("x*y", Axis::X, p, DEFAULT_STEP);
    let dy = partial_derivative("x*y", Axis::Y, p, DEFAULT_STEP);
    assert_approx(dx, 3.0, 1e-8);
    assert_approx(dy, 2.0, 1e-8);
  }

  #[test]
  fn transcendental() {
    let origin = Point::new(0.0, 0.0);
    assert_approx(
      partial_derivative("sin(x)", Axis::X, origin, DEFAULT_STEP),
      1.0,
      1e-6,
    );
    assert_approx(
      partial_derivative("exp(x + y)", Axis::Y, origin, DEFAULT_STEP),
      1.0,
      1e-6,
    );
  }

  #[test]
  fn constant_in_the_other_variable() {
    let p = Point::new(0.5, -2.0);
    assert_eq!(partial_derivative("y^3", Axis::X, p, DEFAULT_STEP), 0.0);
  }

  #[test]
  fn undefined_neighbourhood_is_nan() {
    let origin = Point::new(0.0, 0.0);
    let d = |f| partial_derivative(f, Axis::X, origin, DEFAULT_STEP);
    assert!(d("sqrt(x)").is_nan());
    assert!(d("x + t").is_nan());
  }

  #[test]
  fn unparsable_formula_is_nan() {
    let origin = Point::new(0.0, 0.0);
    assert!(partial_derivative("x +", Axis::X, origin, DEFAULT_STEP).is_nan());
    assert!(matches!(
      try_partial_derivative("x +", Axis::X, origin, DEFAULT_STEP),
      Err(FieldError::ParseError(_))
    ));
  }

  #[test]
  fn step_must_be_positive() {
    let origin = Point::new(0.0, 0.0);
    assert!(matches!(
      try_partial_derivative("x", Axis::X, origin, 0.0),
      Err(FieldError::InvalidStep(_))
    ));
    assert!(partial_derivative("x", Axis::X, origin, -1e-4).is_nan());
  }

  #[test]
  fn axis_names() {
    assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
    assert_eq!("Y".parse::<Axis>().unwrap(), Axis::Y);
    assert!(matches!(
      "z".parse::<Axis>(),
      Err(FieldError::InvalidAxis(name)) if name == "z"
    ));
  }
}

mod gradients {
  use super::*;

  #[test]
  fn paraboloid_at_one_one() {
    let g = gradient("x^2 + y^2", Point::new(1.0, 1.0));
    assert_approx(g.dx, 2.0, 1e-3);
    assert_approx(g.dy, 2.0, 1e-3);
    assert_approx(g.magnitude, 2.0 * 2f64.sqrt(), 1e-3);
  }

  #[test]
  fn saddle() {
    let g = gradient("x^2 - y^2", Point::new(1.0, 2.0));
    assert_approx(g.dx, 2.0, 1e-6);
    assert_approx(g.dy, -4.0, 1e-6);
  }

  #[test]
  fn nan_propagates_to_magnitude() {
    let g = gradient("ln(x)", Point::new(0.0, 1.0));
    assert!(g.dx.is_nan());
    assert!(g.magnitude.is_nan());
  }
}

mod arrows {
  use super::*;

  #[test]
  fn one_arrow_per_kept_node() {
    let arrows = gradient_field("x", &Rectangle::square(1.0), 4, 2).unwrap();
    assert_eq!(arrows.len(), 9);
  }

  #[test]
  fn arrows_have_fixed_length_along_the_gradient() {
    let arrows = gradient_field("x", &Rectangle::square(1.0), 4, 2).unwrap();
    for arrow in arrows {
      assert_approx(arrow.direction[0], 0.5, 1e-6);
      assert_eq!(arrow.direction[1], 0.0);
      assert_approx(arrow.direction[2], 0.0, 1e-6);
    }
  }

  #[test]
  fn arrows_start_on_the_surface() {
    let arrows =
      gradient_field("x + 2*y", &Rectangle::square(1.0), 2, 1).unwrap();
    for arrow in arrows {
      let [x, height, y] = arrow.position;
      assert_eq!(height, x + 2.0 * y);
    }
  }

  #[test]
  fn flat_field_has_no_arrows() {
    let arrows = gradient_field("1", &Rectangle::square(1.0), 4, 1).unwrap();
    assert!(arrows.is_empty());
  }

  #[test]
  fn zero_stride_keeps_every_node() {
    let arrows = gradient_field("x", &Rectangle::square(1.0), 2, 0).unwrap();
    assert_eq!(arrows.len(), 9);
  }

  #[test]
  fn unparsable_formula_is_an_error() {
    assert!(gradient_field("*", &Rectangle::square(1.0), 2, 1).is_err());
  }
}
