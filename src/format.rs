//! Currency and date rendering for report text.

use chrono::{Datelike, NaiveDate};

/// `1234.5` with code `PKR` → `PKR 1,234.50`. Negative amounts keep the
/// sign after the code.
pub fn format_currency(amount: f64, code: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    let number = format!("{}{}.{:02}", sign, whole, cents % 100);
    if code.is_empty() {
        number
    } else {
        format!("{} {}", code, number)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `01-Jan-2025`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// `1st January 2025`
pub fn format_ordinal_date(date: NaiveDate) -> String {
    let day = date.day();
    format!("{}{} {}", day, ordinal_suffix(day), date.format("%B %Y"))
}

/// `January 2025`
pub fn format_month(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(50000.0, "PKR"), "PKR 50,000.00");
        assert_eq!(format_currency(1234.56, "PKR"), "PKR 1,234.56");
        assert_eq!(format_currency(999.0, "PKR"), "PKR 999.00");
        assert_eq!(format_currency(1_234_567.891, "USD"), "USD 1,234,567.89");
        assert_eq!(format_currency(0.0, "PKR"), "PKR 0.00");
    }

    #[test]
    fn currency_negative_and_bare() {
        assert_eq!(format_currency(-1500.0, "PKR"), "PKR -1,500.00");
        assert_eq!(format_currency(-0.001, "PKR"), "PKR 0.00");
        assert_eq!(format_currency(12.5, ""), "12.50");
    }

    #[test]
    fn short_date() {
        assert_eq!(format_date(date(2025, 1, 1)), "01-Jan-2025");
        assert_eq!(format_date(date(2024, 12, 31)), "31-Dec-2024");
    }

    #[test]
    fn ordinal_dates() {
        assert_eq!(format_ordinal_date(date(2025, 1, 1)), "1st January 2025");
        assert_eq!(format_ordinal_date(date(2025, 3, 2)), "2nd March 2025");
        assert_eq!(format_ordinal_date(date(2025, 3, 3)), "3rd March 2025");
        assert_eq!(format_ordinal_date(date(2025, 3, 11)), "11th March 2025");
        assert_eq!(format_ordinal_date(date(2025, 3, 12)), "12th March 2025");
        assert_eq!(format_ordinal_date(date(2025, 3, 13)), "13th March 2025");
        assert_eq!(format_ordinal_date(date(2025, 3, 22)), "22nd March 2025");
        assert_eq!(format_ordinal_date(date(2025, 3, 31)), "31st March 2025");
    }

    #[test]
    fn month_heading() {
        assert_eq!(format_month(date(2025, 6, 15)), "June 2025");
    }
}
