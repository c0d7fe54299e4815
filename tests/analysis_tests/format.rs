use super::*;

#[test]
fn fixed_decimals() {
  assert_eq!(format_number(3.14159, 2), "3.14");
  assert_eq!(format_number(2.0, 4), "2.0000");
  assert_eq!(format_number(-1.23456, 3), "-1.235");
  assert_eq!(format_number(1234.4, 0), "1234");
}

#[test]
fn non_finite_values_print_as_zero() {
  assert_eq!(format_number(f64::NAN, 4), "0");
  assert_eq!(format_number(f64::INFINITY, 4), "0");
  assert_eq!(format_number(f64::NEG_INFINITY, 2), "0");
}

#[test]
fn negative_zero_is_unsigned() {
  assert_eq!(format_number(-0.0, 4), "0.0000");
}

#[test]
fn small_negatives_keep_their_sign() {
  assert_eq!(format_number(-0.00001, 4), "-0.0000");
}

#[test]
fn exact_ties_round_away_from_zero() {
  assert_eq!(format_number(2.5, 0), "3");
  assert_eq!(format_number(0.125, 2), "0.13");
  assert_eq!(format_number(0.25, 1), "0.3");
  assert_eq!(format_number(-2.5, 0), "-3");
  assert_eq!(format_number(1234.5, 0), "1235");
}

#[test]
fn values_stored_below_a_tie_round_down() {
  // The nearest double to 1.005 sits just below it
  assert_eq!(format_number(1.005, 2), "1.00");
}

#[test]
fn bilinear_integral_prints_rounded_up() {
  let value = double_integral("x*y", (0.0, 1.0), (0.0, 1.0), 2).unwrap();
  assert_eq!(value, 0.25);
  assert_eq!(format_number(value, 1), "0.3");
}
