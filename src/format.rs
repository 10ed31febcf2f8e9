//! Text rendering helpers shared by [`DynVar`](crate::DynVar), [`DynArray`](crate::DynArray)
//! and [`DynList`](crate::DynList).

/// Significant digits used for `Float` payloads.
pub(crate) const FLOAT_DIGITS: usize = 6;
/// Significant digits used for `Double` and `LDouble` payloads, the most a 64-bit
/// float reproduces exactly.
pub(crate) const DOUBLE_DIGITS: usize = 15;

/// Formats `value` the way C's `%.{precision}g` does: shortest of fixed or
/// scientific notation for the given number of significant digits, trailing
/// zeros removed.
pub(crate) fn general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return if value.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    // precision is a digit count and never approaches i32::MAX
    let digits = i32::try_from(precision).unwrap_or(i32::MAX);
    if exponent < -4 || exponent >= digits {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = usize::try_from(digits - 1 - exponent).unwrap_or(0);
        strip_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_notation() {
        assert_eq!(general(1.5, 6), "1.5");
        assert_eq!(general(100.0, 6), "100");
        assert_eq!(general(-42.25, 15), "-42.25");
        assert_eq!(general(f64::from(1.23456f32), FLOAT_DIGITS), "1.23456");
        assert_eq!(general(9.87654321, DOUBLE_DIGITS), "9.87654321");
        assert_eq!(general(0.0001, 6), "0.0001");
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(general(1234567.0, 6), "1.23457e+06");
        assert_eq!(general(0.00001, 6), "1e-05");
        assert_eq!(general(-2.5e-10, 6), "-2.5e-10");
        assert_eq!(general(1e100, 15), "1e+100");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(general(0.0, 6), "0");
        assert_eq!(general(-0.0, 6), "-0");
        assert_eq!(general(f64::INFINITY, 6), "inf");
        assert_eq!(general(f64::NEG_INFINITY, 6), "-inf");
        assert_eq!(general(f64::NAN, 6), "nan");
    }

    #[test]
    fn test_rounding_moves_exponent() {
        assert_eq!(general(999999.7, 6), "1e+06");
        assert_eq!(general(99999.95, 6), "99999.9");
    }
}
