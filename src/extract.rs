//! Price and field extractors
//!
//! Small pure functions that coerce noisy scraped text (currency strings,
//! salary ranges) into normalized numbers. Unparseable prices map to
//! `f64::INFINITY` so they sort last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel for a price or salary that could not be parsed
pub const UNPARSEABLE: f64 = f64::INFINITY;

static PRICE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid price regex"));

static SALARY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kl])?\b").expect("valid salary regex"));

/// Extract the first numeric amount from a price string such as `"₹1,299"`,
/// `"Rs. 45,999.00"` or `"MRP: 799"`.
pub fn extract_price(text: &str) -> f64 {
    PRICE_TOKEN
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .unwrap_or(UNPARSEABLE)
}

/// Render a rupee amount with western thousands grouping: `1500000 → "₹1,500,000"`.
///
/// Fractions are truncated. Non-finite values render as `"Price not available"`.
pub fn format_rupees(value: f64) -> String {
    if !value.is_finite() {
        return "Price not available".to_string();
    }
    let whole = value.trunc().abs() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 {
        format!("-₹{}", grouped)
    } else {
        format!("₹{}", grouped)
    }
}

/// Parse a salary or stipend text into an annual amount (the highest figure
/// mentioned). Returns `None` for undisclosed salaries.
///
/// Understands the notations Indian job boards use: `"₹5,00,000 - ₹8,00,000 a year"`,
/// `"3.5-6 Lacs PA"`, `"12 LPA"`, `"₹30L - ₹45L"`, `"₹25,000 /month"`, `"1.2 Cr"`.
pub fn parse_salary(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    if lower.trim().is_empty() || lower.contains("not disclosed") || lower.contains("unpaid") {
        return None;
    }

    let unit = if lower.contains("lakh") || lower.contains("lac") || lower.contains("lpa") {
        100_000.0
    } else if lower.contains("crore") || lower.split_whitespace().any(|w| w == "cr") {
        10_000_000.0
    } else {
        1.0
    };
    let per_month = lower.contains("month")
        || lower.contains("/mo")
        || lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == "pm");

    let max = SALARY_TOKEN
        .captures_iter(&lower)
        .filter_map(|caps| {
            let number = caps.get(1)?.as_str().replace(',', "").parse::<f64>().ok()?;
            let suffix = match caps.get(2).map(|m| m.as_str()) {
                Some("k") => 1_000.0,
                Some("l") => 100_000.0,
                _ => 1.0,
            };
            Some(number * suffix)
        })
        .fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |a| a.max(n))))?;

    let annual = max * unit * if per_month { 12.0 } else { 1.0 };
    Some(annual)
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_price_currency_strings() {
        assert_eq!(extract_price("₹1,299"), 1299.0);
        assert_eq!(extract_price("Rs. 45,999.00"), 45999.0);
        assert_eq!(extract_price("₹ 15,00,000"), 1_500_000.0);
        assert_eq!(extract_price("MRP: 799 onwards"), 799.0);
        assert_eq!(extract_price("  12345 "), 12345.0);
    }

    #[test]
    fn test_extract_price_without_digits_is_sentinel() {
        assert_eq!(extract_price(""), UNPARSEABLE);
        assert_eq!(extract_price("Currently unavailable"), UNPARSEABLE);
        assert_eq!(extract_price("₹,"), UNPARSEABLE);
        assert!(extract_price("Rs.").is_infinite());
    }

    #[test]
    fn test_format_rupees_grouping() {
        assert_eq!(format_rupees(0.0), "₹0");
        assert_eq!(format_rupees(999.0), "₹999");
        assert_eq!(format_rupees(1000.0), "₹1,000");
        assert_eq!(format_rupees(45999.9), "₹45,999");
        assert_eq!(format_rupees(1_500_000.0), "₹1,500,000");
        assert_eq!(format_rupees(UNPARSEABLE), "Price not available");
    }

    #[test]
    fn test_format_rupees_round_trips_through_extractor() {
        for price in [1.0, 499.0, 1299.0, 45_999.0, 120_000.0, 1_500_000.0, 23_456_789.0] {
            let rendered = format_rupees(price);
            assert_eq!(extract_price(&rendered), price);
            assert_eq!(format_rupees(extract_price(&rendered)), rendered);
        }
    }

    #[test]
    fn test_parse_salary_notations() {
        assert_eq!(parse_salary("₹5,00,000 - ₹8,00,000 a year"), Some(800_000.0));
        assert_eq!(parse_salary("3.5-6 Lacs PA"), Some(600_000.0));
        assert_eq!(parse_salary("12 LPA"), Some(1_200_000.0));
        assert_eq!(parse_salary("₹25,000 a month"), Some(300_000.0));
        assert_eq!(parse_salary("₹40k - ₹60k /month"), Some(720_000.0));
        assert_eq!(parse_salary("₹22,00,000 a year"), Some(2_200_000.0));
        assert_eq!(parse_salary("₹30L - ₹45L"), Some(4_500_000.0));
    }

    #[test]
    fn test_parse_salary_undisclosed() {
        assert_eq!(parse_salary("Not disclosed"), None);
        assert_eq!(parse_salary(""), None);
        assert_eq!(parse_salary("Competitive"), None);
        assert_eq!(parse_salary("Unpaid"), None);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("₹₹₹₹", 2), "₹₹");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_squash_whitespace() {
        assert_eq!(squash_whitespace("  a \n\t b   c "), "a b c");
    }
}
