//! Boundary coercion for numeric form fields.
//!
//! Anything typed into the quotation form goes through here before it is
//! stored: blanks and garbage become 0, negatives clamp to 0. The corrected
//! value is what the form shows back to the user.

/// Parses a user-typed amount. Accepts `.` or `,` as the decimal separator and
/// ignores spaces and `_` used as thousands grouping ("1 200,50" -> 1200.5).
/// Commas followed by 3-digit groups are grouping too ("1,200" -> 1200).
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }

    // "1,200.50" and "1,200" group thousands; "1200,50" uses the comma as decimal.
    let normalized = if cleaned.contains('.') || is_comma_grouped(&cleaned) {
        cleaned.replace(',', "")
    } else {
        cleaned.replace(',', ".")
    };

    normalized.parse::<f64>().map(clamp_non_negative).unwrap_or(0.0)
}

/// `1,200` or `12,345,678`: a 1-3 digit head followed by 3-digit groups.
fn is_comma_grouped(s: &str) -> bool {
    let mut parts = s.split(',');
    let head = parts.next().unwrap_or_default();
    let head = head.strip_prefix('-').unwrap_or(head);
    let head_ok = (1..=3).contains(&head.len())
        && !head.starts_with('0')
        && head.bytes().all(|b| b.is_ascii_digit());

    let mut groups = 0;
    for part in parts {
        if part.len() != 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        groups += 1;
    }
    head_ok && groups > 0
}

pub fn clamp_non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

pub fn clamp_percentage(v: f64) -> f64 {
    clamp_non_negative(v).min(100.0)
}

/// Rounds to the nearest whole currency unit, halves away from zero.
pub fn round_amount(v: f64) -> f64 {
    v.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_parses_to_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("   "), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("12abc"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        assert_eq!(parse_amount("-5"), 0.0);
        assert_eq!(clamp_non_negative(-0.01), 0.0);
        assert_eq!(clamp_non_negative(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn accepts_both_decimal_separators() {
        assert_eq!(parse_amount("2.5"), 2.5);
        assert_eq!(parse_amount("2,5"), 2.5);
        assert_eq!(parse_amount("1,200.50"), 1200.5);
        assert_eq!(parse_amount("1 200,50"), 1200.5);
        assert_eq!(parse_amount("75_000"), 75000.0);
        assert_eq!(parse_amount("1,200"), 1200.0);
        assert_eq!(parse_amount("1,200,000"), 1_200_000.0);
        assert_eq!(parse_amount("1200,50"), 1200.5);
        assert_eq!(parse_amount("12,5"), 12.5);
        assert_eq!(parse_amount("0,500"), 0.5);
    }

    #[test]
    fn percentage_is_bounded() {
        assert_eq!(clamp_percentage(18.0), 18.0);
        assert_eq!(clamp_percentage(140.0), 100.0);
        assert_eq!(clamp_percentage(-3.0), 0.0);
    }
}
