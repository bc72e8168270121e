//! Price parsing for receipts
//!
//! Handles the formats receipts and models actually produce: currency
//! symbols or ISO codes on either side, US and European separators,
//! negative amounts written with a minus sign or parentheses.
//!
//! Separator rule: when both `,` and `.` occur, the last one is the decimal
//! separator. A lone separator followed by exactly three digits groups
//! thousands (unless the integer part is `0`); any other lone separator is
//! decimal. Repeated identical separators always group thousands.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Currency, Money};

fn amount_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[0-9][0-9.,']*").expect("Valid amount regex"));
    &PATTERN
}

fn iso_code_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b([A-Za-z]{3})\b").expect("Valid currency code regex"));
    &PATTERN
}

/// Parse a price string into minor units
///
/// Returns `None` when the text contains no digits, or when the amount is
/// too large for an `i64` count of minor units.
pub fn parse_price(text: &str) -> Option<Money> {
    let text = text.trim();
    let number = amount_pattern().find(text)?;
    let digits = number.as_str().trim_end_matches(['.', ',', '\'']);

    let Some(minor) = normalize_amount(digits) else {
        debug!("Price amount {:?} does not fit in minor units", digits);
        return None;
    };
    let negative = is_negative(text, number.start());
    let amount_minor = if negative { -minor } else { minor };

    Some(Money::new(amount_minor, detect_currency(text)))
}

/// Minor units for a bare digit string with separators
fn normalize_amount(raw: &str) -> Option<i64> {
    let raw: String = raw.chars().filter(|c| *c != '\'').collect();
    let last_comma = raw.rfind(',');
    let last_dot = raw.rfind('.');

    let decimal_at = match (last_comma, last_dot) {
        (Some(c), Some(d)) => Some(c.max(d)),
        (Some(i), None) | (None, Some(i)) => {
            let sep = raw.as_bytes()[i] as char;
            let occurrences = raw.matches(sep).count();
            let fraction_len = raw.len() - i - 1;
            let integer_is_zero = raw[..i].chars().all(|c| c == '0');
            if occurrences > 1 || (fraction_len == 3 && !integer_is_zero) {
                None
            } else {
                Some(i)
            }
        }
        (None, None) => None,
    };

    let (integer, fraction) = match decimal_at {
        Some(i) => (&raw[..i], &raw[i + 1..]),
        None => (raw.as_str(), ""),
    };

    let integer: String = integer.chars().filter(char::is_ascii_digit).collect();
    let integer: i64 = if integer.is_empty() { 0 } else { integer.parse().ok()? };

    let cents = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        2 => fraction.parse::<i64>().ok()?,
        _ => {
            // Round sub-cent precision half up
            let head: i64 = fraction[..2].parse().ok()?;
            let next = fraction.as_bytes()[2];
            if next >= b'5' {
                head + 1
            } else {
                head
            }
        }
    };

    integer.checked_mul(100)?.checked_add(cents)
}

fn is_negative(text: &str, number_start: usize) -> bool {
    // The sign must sit right before the number, currency markers aside
    let prefix = text[..number_start].trim_end_matches(|c: char| {
        c.is_whitespace() || c.is_ascii_uppercase() || Currency::from_symbol(c).is_some()
    });
    let trimmed = text.trim();
    prefix.ends_with('-')
        || prefix.ends_with('\u{2212}')
        || (trimmed.starts_with('(') && trimmed.ends_with(')'))
}

fn detect_currency(text: &str) -> Option<Currency> {
    let upper = text.to_uppercase();
    if upper.contains("CA$") || upper.contains("C$") {
        return Some(Currency::Cad);
    }
    if upper.contains("AU$") || upper.contains("A$") {
        return Some(Currency::Aud);
    }
    if let Some(currency) = text.chars().find_map(Currency::from_symbol) {
        return Some(currency);
    }
    iso_code_pattern()
        .captures_iter(text)
        .find_map(|caps| Currency::from_code(&caps[1]))
}

/// A `name ... price` line recovered from receipt text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLine {
    pub name: String,
    pub price: Money,
}

/// Line items and totals recovered from receipt text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScannedReceipt {
    pub items: Vec<PriceLine>,
    pub subtotal: Option<Money>,
    pub tax: Option<Money>,
    pub total: Option<Money>,
}

fn price_line_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"^(?P<name>.+?)\s*[:.]*\s+(?P<price>\(?[-\x{2212}]?\s?[A-Z]{0,2}[$€£¥]?\s?[0-9][0-9.,']*\)?(?:\s?[A-Za-z]{3})?)$",
        )
        .expect("Valid price line regex")
    });
    &PATTERN
}

/// Scan free-form receipt text for priced lines
///
/// Lines labelled subtotal, tax or total are reported separately. Payment
/// and change lines are skipped.
pub fn scan_receipt_lines(text: &str) -> ScannedReceipt {
    let mut scanned = ScannedReceipt::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(caps) = price_line_pattern().captures(line) else {
            continue;
        };
        let name = caps["name"].trim().trim_end_matches([':', '.', '-']).trim().to_string();
        let Some(price) = parse_price(&caps["price"]) else {
            continue;
        };
        if name.chars().all(|c| !c.is_alphabetic()) {
            continue;
        }

        let label = name.to_lowercase();
        if label.contains("subtotal") || label.contains("sub total") {
            scanned.subtotal = Some(price);
        } else if label.contains("tax") || label.contains("vat") {
            scanned.tax = Some(price);
        } else if label.contains("total") || label.contains("amount due") {
            scanned.total = Some(price);
        } else if ["change", "cash", "visa", "mastercard", "amex", "card", "tender", "paid"]
            .iter()
            .any(|w| label.split(|c: char| !c.is_alphanumeric()).any(|tok| tok == *w))
        {
            continue;
        } else {
            scanned.items.push(PriceLine { name, price });
        }
    }

    scanned
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn minor(text: &str) -> i64 {
        parse_price(text).unwrap().amount_minor
    }

    #[test]
    fn test_us_format_with_symbol() {
        let money = parse_price("$1,234.56").unwrap();
        assert_eq!(money.amount_minor, 123456);
        assert_eq!(money.currency, Some(Currency::Usd));
    }

    #[test]
    fn test_trailing_iso_code() {
        let money = parse_price("1234.56 USD").unwrap();
        assert_eq!(money.amount_minor, 123456);
        assert_eq!(money.currency, Some(Currency::Usd));
    }

    #[test]
    fn test_european_format() {
        let money = parse_price("€1.234,56").unwrap();
        assert_eq!(money.amount_minor, 123456);
        assert_eq!(money.currency, Some(Currency::Eur));
        assert!((money.major() - 1234.56).abs() < 1e-9);
    }

    #[test]
    fn test_separator_rules() {
        assert_eq!(minor("1.234"), 123400);
        assert_eq!(minor("1,234"), 123400);
        assert_eq!(minor("12,5"), 1250);
        assert_eq!(minor("0.999"), 100);
        assert_eq!(minor("1.234.567"), 123456700);
        assert_eq!(minor("CHF 1'234.50"), 123450);
        assert_eq!(minor("£12"), 1200);
        assert_eq!(minor("19.99."), 1999);
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(minor("-$5.00"), -500);
        assert_eq!(minor("(5.00)"), -500);
        assert_eq!(minor("$5.00"), 500);
    }

    #[test]
    fn test_currency_detection() {
        assert_eq!(parse_price("CA$20").unwrap().currency, Some(Currency::Cad));
        assert_eq!(parse_price("¥1,200").unwrap().currency, Some(Currency::Jpy));
        assert_eq!(parse_price("49.00 gbp").unwrap().currency, Some(Currency::Gbp));
        assert_eq!(parse_price("49.00").unwrap().currency, None);
    }

    #[test]
    fn test_no_number() {
        assert!(parse_price("free").is_none());
        assert!(parse_price("").is_none());
    }

    #[test]
    fn test_amount_too_large_for_minor_units() {
        assert!(parse_price("$99999999999999999999").is_none());
        assert!(parse_price("$92233720368547758.08").is_none());
        assert_eq!(minor("$92233720368547758.07"), i64::MAX);
    }

    #[test]
    fn test_scan_receipt_lines() {
        let text = "ZARA STORE #123\n\
                    Linen Blazer        $89.90\n\
                    Silk Scarf          $25.00\n\
                    Subtotal           $114.90\n\
                    Tax                  $9.19\n\
                    TOTAL              $124.09\n\
                    VISA ****1234      $124.09\n\
                    Thank you!";
        let scanned = scan_receipt_lines(text);

        assert_eq!(scanned.items.len(), 2);
        assert_eq!(scanned.items[0].name, "Linen Blazer");
        assert_eq!(scanned.items[0].price.amount_minor, 8990);
        assert_eq!(scanned.items[1].name, "Silk Scarf");
        assert_eq!(scanned.subtotal.unwrap().amount_minor, 11490);
        assert_eq!(scanned.tax.unwrap().amount_minor, 919);
        assert_eq!(scanned.total.unwrap().amount_minor, 12409);
    }

    proptest! {
        #[test]
        fn prop_us_and_eu_formats_agree(whole in 1_000i64..1_000_000, cents in 0i64..100) {
            let thousands = whole / 1000;
            let rest = whole % 1000;
            let us = format!("${},{:03}.{:02}", thousands, rest, cents);
            let eu = format!("€{}.{:03},{:02}", thousands, rest, cents);
            let expected = whole * 100 + cents;
            prop_assert_eq!(parse_price(&us).unwrap().amount_minor, expected);
            prop_assert_eq!(parse_price(&eu).unwrap().amount_minor, expected);
        }
    }
}
