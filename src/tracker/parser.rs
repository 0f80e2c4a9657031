use std::sync::LazyLock;

use regex::Regex;

/// Currency marker followed by a grouped-thousands amount,
/// e.g. "₹1,29,999", "Rs. 2,499" or "$1,299.00".
static ANCHORED_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:₹|Rs\.?|INR|\$|USD|€|EUR|£|GBP)\s*([\d,]+(?:\.\d{2})?)").unwrap()
});

/// Bare amount inside text already stripped down to digits and separators.
static BARE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d,]+(?:\.\d{2})?").unwrap());

/// Values outside this band are noise: quantities, ratings, years, ids.
const MIN_PLAUSIBLE: f64 = 10.0;
const MAX_PLAUSIBLE: f64 = 100_000_000.0;

/// Pulls a single price out of noisy text.
///
/// A currency-anchored amount is trusted outright. Without one, every
/// numeric substring is considered and the largest plausible value wins;
/// in a price-labeled fragment the price tends to be the most prominent
/// number, while smaller ones are discounts, ratings or quantities.
/// Malformed input yields `None`, never an error.
pub fn parse_price(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ANCHORED_PRICE.captures(text) {
        if let Ok(price) = caps[1].replace(',', "").parse::<f64>() {
            if price > 0.0 {
                return Some(price);
            }
        }
    }

    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_digit() || c == '.' || c == ',' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut best: Option<f64> = None;
    for m in BARE_AMOUNT.find_iter(&cleaned) {
        let Ok(price) = m.as_str().replace(',', "").parse::<f64>() else {
            continue;
        };
        if !(MIN_PLAUSIBLE..=MAX_PLAUSIBLE).contains(&price) {
            continue;
        }
        if best.map_or(true, |b| price > b) {
            best = Some(price);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_anchored_amounts() {
        assert_eq!(parse_price("₹1,29,999"), Some(129_999.0));
        assert_eq!(parse_price("Rs. 2,499"), Some(2499.0));
        assert_eq!(parse_price("INR 999"), Some(999.0));
        assert_eq!(parse_price("$1,299.00"), Some(1299.0));
        assert_eq!(parse_price("now only €549"), Some(549.0));
        assert_eq!(parse_price("£ 89.99 incl. VAT"), Some(89.99));
    }

    #[test]
    fn anchored_amount_wins_over_larger_noise() {
        // 2024 is in the plausible band but carries no currency cue.
        assert_eq!(parse_price("2024 edition, yours for ₹799"), Some(799.0));
    }

    #[test]
    fn unanchored_text_takes_largest_plausible() {
        assert_eq!(parse_price("was 2,499 now 1,999"), Some(2499.0));
        assert_eq!(parse_price("save 500 on 12,999"), Some(12_999.0));
    }

    #[test]
    fn implausible_values_are_discarded() {
        // Below the band: quantities and ratings.
        assert_eq!(parse_price("pack of 2"), None);
        assert_eq!(parse_price("rated 4"), None);
        // Above the band: ids and the like.
        assert_eq!(parse_price("order 9876543210123"), None);
    }

    #[test]
    fn band_bounds_are_inclusive() {
        assert_eq!(parse_price("just 10"), Some(10.0));
        assert_eq!(parse_price("lot price 100000000"), Some(100_000_000.0));
    }

    #[test]
    fn separators_are_stripped() {
        assert_eq!(parse_price("1,23,456"), Some(123_456.0));
        assert_eq!(parse_price("$12,345.67"), Some(12_345.67));
    }

    #[test]
    fn no_candidate_yields_none() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("out of stock"), None);
        assert_eq!(parse_price("₹"), None);
        assert_eq!(parse_price("..,,.."), None);
    }

    #[test]
    fn anchored_zero_falls_through() {
        assert_eq!(parse_price("₹0"), None);
        assert_eq!(parse_price("₹0 deposit, pay 4,999 later"), Some(4999.0));
    }
}
