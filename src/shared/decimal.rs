//! Canonical decimal strings for prices and sizes.
//!
//! The venue hashes prices and sizes as strings, so `"100.5"` and `"100.50"`
//! produce different action hashes. Everything that lands in a price/size
//! field goes through [`normalize_decimal_str`] first.

use rust_decimal::Decimal;

use crate::error::SdkError;

/// Maximum absolute error tolerated when rendering an `f64` with 8 decimals.
const WIRE_TOLERANCE: f64 = 1e-12;

/// Maximum absolute error tolerated when scaling an `f64` to an integer.
const INT_TOLERANCE: f64 = 1e-3;

/// Strip trailing fractional zeros and collapse negative zero.
///
/// `"100.50000" → "100.5"`, `"0.00000000" → "0"`, `"-0" → "0"`. Integers keep
/// their digits. Idempotent. Rejects anything that is not a plain decimal
/// literal (exponents, `NaN`, stray characters).
pub fn normalize_decimal_str(input: &str) -> Result<String, SdkError> {
    let s = input.trim();
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (unsigned, ""),
    };

    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return Err(SdkError::validation(format!(
            "`{}` is not a decimal number",
            input
        )));
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    };

    let is_zero = out.chars().all(|c| c == '0' || c == '.');
    if is_zero {
        return Ok("0".to_string());
    }
    if negative {
        out.insert(0, '-');
    }
    Ok(out)
}

/// Render an `f64` price/size as a wire string.
///
/// Fails when the value is not finite or cannot be represented with 8
/// decimals without losing precision.
pub fn float_to_wire(x: f64) -> Result<String, SdkError> {
    if !x.is_finite() {
        return Err(SdkError::validation(format!("non-finite number: {}", x)));
    }
    let rounded = format!("{:.8}", x);
    let back: f64 = rounded
        .parse()
        .map_err(|e| SdkError::validation(format!("cannot parse `{}`: {}", rounded, e)))?;
    if (back - x).abs() >= WIRE_TOLERANCE {
        return Err(SdkError::validation(format!(
            "float_to_wire causes rounding: {}",
            x
        )));
    }
    normalize_decimal_str(&rounded)
}

/// Render a `Decimal` price/size as a wire string.
pub fn decimal_to_wire(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.is_zero() {
        return "0".to_string();
    }
    normalized.to_string()
}

/// Scale `x` by `10^decimals` and round, rejecting values that are not
/// (nearly) integral after scaling. Used for integer USD/wei amounts.
pub fn float_to_int(x: f64, decimals: u32) -> Result<u64, SdkError> {
    if !x.is_finite() || x < 0.0 {
        return Err(SdkError::validation(format!(
            "cannot convert {} to an unsigned integer amount",
            x
        )));
    }
    let scaled = x * 10f64.powi(decimals as i32);
    let rounded = scaled.round();
    if (rounded - scaled).abs() >= INT_TOLERANCE {
        return Err(SdkError::validation(format!(
            "float_to_int causes rounding: {}",
            x
        )));
    }
    if rounded > u64::MAX as f64 {
        return Err(SdkError::validation(format!("{} overflows u64", x)));
    }
    Ok(rounded as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_normalize_strips_trailing_zeros() {
        assert_eq!(normalize_decimal_str("100.50000").unwrap(), "100.5");
        assert_eq!(normalize_decimal_str("0.00000000").unwrap(), "0");
        assert_eq!(normalize_decimal_str("1.").unwrap(), "1");
        assert_eq!(normalize_decimal_str("2500").unwrap(), "2500");
        assert_eq!(normalize_decimal_str(".250").unwrap(), "0.25");
    }

    #[test]
    fn test_normalize_negative_zero() {
        assert_eq!(normalize_decimal_str("-0").unwrap(), "0");
        assert_eq!(normalize_decimal_str("-0.000").unwrap(), "0");
        assert_eq!(normalize_decimal_str("-1.50").unwrap(), "-1.5");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["100.50000", "0.00000000", "-0", "-12.3400", "42", "0.000001"] {
            let once = normalize_decimal_str(input).unwrap();
            let twice = normalize_decimal_str(&once).unwrap();
            assert_eq!(once, twice, "input {}", input);
        }
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        for input in ["", "-", ".", "abc", "1e5", "NaN", "1.2.3", "+1", "0x10"] {
            assert!(normalize_decimal_str(input).is_err(), "input {:?}", input);
        }
    }

    #[test]
    fn test_float_to_wire() {
        assert_eq!(float_to_wire(100.5).unwrap(), "100.5");
        assert_eq!(float_to_wire(0.0).unwrap(), "0");
        assert_eq!(float_to_wire(-0.0).unwrap(), "0");
        assert_eq!(float_to_wire(1670.1).unwrap(), "1670.1");
        assert_eq!(float_to_wire(0.0147).unwrap(), "0.0147");
    }

    #[test]
    fn test_float_to_wire_rejects_precision_loss() {
        assert!(float_to_wire(0.123456789).is_err());
        assert!(float_to_wire(f64::NAN).is_err());
        assert!(float_to_wire(f64::INFINITY).is_err());
    }

    #[test]
    fn test_decimal_to_wire() {
        let d = Decimal::from_str("100.50000").unwrap();
        assert_eq!(decimal_to_wire(d), "100.5");
        let neg_zero = Decimal::from_str("-0.00").unwrap();
        assert_eq!(decimal_to_wire(neg_zero), "0");
    }

    #[test]
    fn test_float_to_int() {
        assert_eq!(float_to_int(1.5, 6).unwrap(), 1_500_000);
        assert_eq!(float_to_int(0.000001, 6).unwrap(), 1);
        assert!(float_to_int(0.0000001, 6).is_err());
        assert!(float_to_int(-1.0, 6).is_err());
    }
}
