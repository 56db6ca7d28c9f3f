//! # Coordinate Precision Reduction
//!
//! Rounds a coordinate to a fixed number of decimal digits, half away
//! from zero.
//!
//! Rounding is done on the shortest round-trip decimal representation
//! of the f64 (what a contributor sees in the file), not on the binary
//! value. `(x * 1e5).round() / 1e5` would turn `0.123455` into `0.12345`
//! because the product lands just below the midpoint; the decimal route
//! gives `0.12346`.

use serde_json::Number;

use crate::error::CanonicalizationError;

/// Largest supported number of decimal digits.
pub const MAX_PRECISION: u32 = 15;

/// Round `value` to `digits` decimal places, half away from zero.
///
/// Non-finite input is returned unchanged. Negative zero results are
/// normalized to `0.0`.
pub fn round_half_away(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let digits = digits.min(MAX_PRECISION) as usize;
    // f64 Display is the shortest round-trip form and never uses an exponent.
    let text = format!("{value}");
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let (int_part, frac_part) = magnitude.split_once('.').unwrap_or((magnitude, ""));
    if frac_part.len() <= digits {
        return normalize_zero(value);
    }

    let round_up = frac_part.as_bytes()[digits] >= b'5';
    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .collect();
    if round_up {
        increment_decimal(&mut kept);
    }

    let split = kept.len() - digits;
    let mut rounded = String::with_capacity(kept.len() + 2);
    if negative {
        rounded.push('-');
    }
    rounded.extend(kept[..split].iter().map(|b| *b as char));
    if digits > 0 {
        rounded.push('.');
        rounded.extend(kept[split..].iter().map(|b| *b as char));
    }
    // The string is built from ASCII digits only.
    normalize_zero(rounded.parse().unwrap_or(value))
}

/// Add one unit in the last place to a string of ASCII digits.
fn increment_decimal(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Reduce the precision of a JSON number.
///
/// Integers pass through untouched so that `12` stays `12` rather than
/// becoming `12.0`.
///
/// # Errors
///
/// Returns `CanonicalizationError::PrecisionOutOfRange` when `digits`
/// exceeds [`MAX_PRECISION`].
pub fn reduce_number(number: &Number, digits: u32) -> Result<Number, CanonicalizationError> {
    if digits > MAX_PRECISION {
        return Err(CanonicalizationError::PrecisionOutOfRange(digits));
    }
    if number.is_i64() || number.is_u64() {
        return Ok(number.clone());
    }
    match number.as_f64().and_then(|f| Number::from_f64(round_half_away(f, digits))) {
        Some(rounded) => Ok(rounded),
        None => Ok(number.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_five_digits() {
        assert_eq!(round_half_away(12.123456789, 5), 12.12346);
        assert_eq!(round_half_away(45.987654321, 5), 45.98765);
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        assert_eq!(round_half_away(0.123455, 5), 0.12346);
        assert_eq!(round_half_away(-0.123455, 5), -0.12346);
        assert_eq!(round_half_away(2.5, 0), 3.0);
        assert_eq!(round_half_away(-2.5, 0), -3.0);
    }

    #[test]
    fn carries_into_integer_part() {
        assert_eq!(round_half_away(9.999996, 5), 10.0);
        assert_eq!(round_half_away(-179.999999, 5), -180.0);
    }

    #[test]
    fn short_values_are_untouched() {
        assert_eq!(round_half_away(1.5, 5), 1.5);
        assert_eq!(round_half_away(-33.12, 5), -33.12);
        assert_eq!(round_half_away(7.0, 5), 7.0);
    }

    #[test]
    fn tiny_values_become_positive_zero() {
        let r = round_half_away(-0.000001, 5);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
    }

    #[test]
    fn rounding_is_idempotent() {
        for v in [12.123456789, -0.000005, 179.999995, 3.14159265] {
            let once = round_half_away(v, 5);
            assert_eq!(round_half_away(once, 5), once);
        }
    }

    #[test]
    fn integers_stay_integers() {
        let n = Number::from(12);
        let reduced = reduce_number(&n, 5).unwrap();
        assert!(reduced.is_i64());
        assert_eq!(reduced.to_string(), "12");
    }

    #[test]
    fn floats_are_reduced() {
        let n = Number::from_f64(12.123456789).unwrap();
        assert_eq!(reduce_number(&n, 5).unwrap().to_string(), "12.12346");
    }

    #[test]
    fn precision_out_of_range() {
        let n = Number::from_f64(1.5).unwrap();
        assert!(matches!(
            reduce_number(&n, 16),
            Err(CanonicalizationError::PrecisionOutOfRange(16))
        ));
    }
}
