// src/utils/price.rs
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static DECIMAL_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+").expect("valid regex"));
static WHOLE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Rewrites the rupee sign as "Rs." and drops thousands separators.
pub fn clean_price_text(text: &str) -> String {
    let mut cleaned = text.replace('\u{20b9}', "Rs.");
    while cleaned.contains("Rs.Rs.") {
        cleaned = cleaned.replace("Rs.Rs.", "Rs.");
    }
    cleaned.replace(',', "").trim().to_string()
}

/// Pulls the first number out of a price string ("₹1,299.00", "Rs. 57.95",
/// "EUR 12"). Anything without digits yields `None`.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let cleaned = clean_price_text(text);
    if cleaned.is_empty() {
        return None;
    }
    let number = DECIMAL_NUMBER
        .find(&cleaned)
        .or_else(|| WHOLE_NUMBER.find(&cleaned))?;
    Decimal::from_str(number.as_str()).ok()
}

/// Keeps only digits and dots, the way the product master's price columns are cleaned.
pub fn strip_to_number(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("₹1,299"), Some(Decimal::new(1299, 0)));
        assert_eq!(parse_price("Rs. 57.95"), Some(Decimal::new(5795, 2)));
        assert_eq!(parse_price("₹ 2,499.50 onwards"), Some(Decimal::new(249950, 2)));
        assert_eq!(parse_price("57"), Some(Decimal::new(57, 0)));
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("   "), None);
        assert_eq!(parse_price("Currently unavailable"), None);
        assert_eq!(parse_price("Rs."), None);
    }

    #[test]
    fn test_clean_price_text() {
        assert_eq!(clean_price_text("₹1,299"), "Rs.1299");
        assert_eq!(clean_price_text("Rs.₹1,299"), "Rs.1299");
    }

    #[test]
    fn test_strip_to_number() {
        assert_eq!(strip_to_number("€ 57,95"), "5795");
        assert_eq!(strip_to_number("EUR 12.50"), "12.50");
        assert_eq!(strip_to_number("n/a"), "");
    }
}
