use super::error::RecordError;
use super::Decimal;
use serde::Serializer;

/// Monetary fields carry two decimal places.
const MAX_SCALE: u32 = 2;
/// Twelve digits in total, two of them fractional.
const MAX_DIGITS: u32 = 12;

/// Serialize Decimal with exactly 2 decimal places
pub(crate) fn serialize_decimal_2dp<S: Serializer>(
    value: &Decimal,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}"))
}

/// Check that an imported amount fits a `(12, 2)` decimal column.
pub(crate) fn validate_amount(field: &'static str, value: Decimal) -> Result<Decimal, RecordError> {
    let limit = Decimal::from(10_i64.pow(MAX_DIGITS - MAX_SCALE));
    if value.scale() > MAX_SCALE || value.abs() >= limit {
        return Err(RecordError::InvalidAmount { field, value });
    }
    Ok(value.normalize())
}

/// Integer part of `value` (truncated toward zero) with `.` as thousands separator.
///
/// `format_integer(dec!(1234567.89))` yields `"1.234.567"`.
pub fn format_integer(value: Decimal) -> String {
    group_thousands(value.trunc().normalize())
}

/// Like [`format_integer`] but rounds to the nearest unit first (ties to even).
pub fn format_currency(value: Decimal) -> String {
    group_thousands(value.round().normalize())
}

/// Local-currency rendering used in reports, e.g. `"1.500.000 Gs."`.
pub fn format_guaranies(value: Decimal) -> String {
    format!("{} Gs.", format_integer(value))
}

fn group_thousands(integral: Decimal) -> String {
    let digits = integral.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if integral.is_sign_negative() && !integral.is_zero() {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_integer_groups_thousands() {
        assert_eq!(format_integer(dec!(1234567.89)), "1.234.567");
        assert_eq!(format_integer(dec!(999)), "999");
        assert_eq!(format_integer(dec!(1000)), "1.000");
        assert_eq!(format_integer(Decimal::ZERO), "0");
    }

    #[test]
    fn test_format_integer_truncates_toward_zero() {
        assert_eq!(format_integer(dec!(-1500.99)), "-1.500");
        assert_eq!(format_integer(dec!(-0.5)), "0");
    }

    #[test]
    fn test_format_currency_rounds() {
        assert_eq!(format_currency(dec!(1234.6)), "1.235");
        assert_eq!(format_currency(dec!(2.5)), "2");
        assert_eq!(format_currency(dec!(-65)), "-65");
    }

    #[test]
    fn test_format_guaranies_suffix() {
        assert_eq!(format_guaranies(dec!(1500000)), "1.500.000 Gs.");
    }

    #[test]
    fn test_validate_amount_accepts_two_decimals() {
        assert_eq!(validate_amount("amount", dec!(100.50)).unwrap(), dec!(100.5));
        assert_eq!(validate_amount("amount", dec!(9999999999.99)).unwrap(), dec!(9999999999.99));
    }

    #[test]
    fn test_validate_amount_rejects_three_decimals() {
        assert!(validate_amount("amount", dec!(1.234)).is_err());
    }

    #[test]
    fn test_validate_amount_rejects_too_many_digits() {
        assert!(validate_amount("amount", dec!(10000000000)).is_err());
    }
}
