pub const DEFAULT_DECIMALS: usize = 4;

/// Render `value` with a fixed number of decimals, or `"0"` when it is not
/// finite so that `NaN` and `Infinity` never reach the user.
///
/// Exact ties round away from zero: `2.5` at 0 decimals is `"3"`.
pub fn format_number(value: f64, decimals: usize) -> String {
  if !value.is_finite() {
    return "0".to_string();
  }
  // Negative zero prints unsigned
  let value = if value == 0.0 { 0.0 } else { value };
  if !is_tie(value.abs(), decimals) {
    return format!("{value:.decimals$}");
  }
  let sign = if value < 0.0 { "-" } else { "" };
  format!("{sign}{}", round_tie_up(value.abs(), decimals))
}

/// True when `magnitude` lies exactly halfway between two multiples of
/// `10^-decimals`, i.e. `2 · magnitude · 10^decimals` is an odd integer.
fn is_tie(magnitude: f64, decimals: usize) -> bool {
  let bits = magnitude.to_bits();
  let biased = ((bits >> 52) & 0x7ff) as i64;
  let fraction = bits & ((1u64 << 52) - 1);
  let (mantissa, exponent) = if biased == 0 {
    (fraction, -1074)
  } else {
    (fraction | (1u64 << 52), biased - 1075)
  };
  if mantissa == 0 {
    return false;
  }
  // magnitude = odd · 2^lowest, and 5^decimals is odd
  let lowest = exponent + i64::from(mantissa.trailing_zeros());
  lowest == -(decimals as i64) - 1
}

/// Round a tie upwards. At a tie the exact expansion has `decimals + 1`
/// fractional digits ending in `5`, so dropping that digit and carrying one
/// into the rest is exact.
fn round_tie_up(magnitude: f64, decimals: usize) -> String {
  let exact = format!("{magnitude:.prec$}", prec = decimals + 1);
  let mut digits: Vec<char> = exact.chars().collect();
  digits.pop();
  if decimals == 0 {
    digits.pop();
  }

  let mut carry = true;
  for digit in digits.iter_mut().rev() {
    match *digit {
      '.' => continue,
      '9' => *digit = '0',
      d => {
        *digit = char::from(d as u8 + 1);
        carry = false;
        break;
      }
    }
  }

  let rounded: String = digits.into_iter().collect();
  if carry {
    format!("1{rounded}")
  } else {
    rounded
  }
}
