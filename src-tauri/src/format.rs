use time::{Date, OffsetDateTime};

/// `1234567.5` -> `1,234,567.50`
pub fn format_money(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int_part, dec_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut out = String::new();
    let chars: Vec<char> = int_part.chars().collect();
    let mut cnt = 0;
    for i in (0..chars.len()).rev() {
        if cnt == 3 {
            out.push(',');
            cnt = 0;
        }
        out.push(chars[i]);
        cnt += 1;
    }
    let int_with_sep: String = out.chars().rev().collect();
    let sign = if v < 0.0 && s != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, int_with_sep, dec_part)
}

/// Quantities without trailing zeros: `5` -> "5", `2.50` -> "2.5".
pub fn format_quantity(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

pub fn format_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn unix_ms_now() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// Lowercase ASCII slug for file names; falls back to `client`.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "client".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn money_has_grouping_and_two_decimals() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(999.0), "999.00");
        assert_eq!(format_money(118_000.0), "118,000.00");
        assert_eq!(format_money(1_234_567.5), "1,234,567.50");
        assert_eq!(format_money(-2500.0), "-2,500.00");
    }

    #[test]
    fn quantities_drop_trailing_zeros() {
        assert_eq!(format_quantity(5.0), "5");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(0.125), "0.125");
        assert_eq!(format_quantity(0.0), "0");
    }

    #[test]
    fn dates_are_iso() {
        let d = Date::from_calendar_date(2026, Month::March, 7).unwrap();
        assert_eq!(format_date(d), "2026-03-07");
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Amina  Mwakyusa"), "amina-mwakyusa");
        assert_eq!(slugify("  J. O'Neil & Sons "), "j-o-neil-sons");
        assert_eq!(slugify("Zoë"), "zo");
        assert_eq!(slugify("***"), "client");
    }
}
