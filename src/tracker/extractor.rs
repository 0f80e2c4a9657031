use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::tracker::parser::parse_price;

/// Generic selector cascade, most specific first. Structured marketplace
/// markup (Amazon price blocks, Flipkart class hashes) is tried before the
/// generic `price`-family selectors so that ratings and review counts in
/// loosely-named elements cannot shadow the real price.
const PRICE_SELECTORS: &[&str] = &[
    // Amazon
    "#priceblock_dealprice",
    "#priceblock_ourprice",
    "#priceblock_saleprice",
    ".a-price-whole",
    ".a-price .a-offscreen",
    "[data-asin-price]",
    "span.a-price-whole",
    "span#priceblock_dealprice",
    // Flipkart
    "._30jeq3",
    "._16Jk6d",
    ".dyC4hf",
    "[class*='_30jeq3']",
    "div._30jeq3",
    "span._30jeq3",
    // Generic storefronts
    "[data-price]",
    "[itemprop='price']",
    ".price",
    "#price",
    ".product-price",
    ".current-price",
    "[class*='price']",
    "span[class*='Price']",
    "div[class*='price']",
    "[class*='selling-price']",
    "[class*='offer-price']",
    "[id*='price']",
    "[id*='Price']",
    ".price-current",
    ".price-now",
    ".final-price",
    "span.price",
    "div.price",
    "p.price",
    "[data-testid*='price']",
    "[data-testid*='Price']",
];

static CASCADE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    PRICE_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

static META_PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property='product:price:amount']").unwrap());

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Extracts a price from a fetched product page.
///
/// Stages, first positive result wins: the item's own selector, the generic
/// cascade, the product metadata tag, then the whole visible text. A broken
/// custom selector is skipped, never fatal.
pub fn extract_price(html: &str, custom_selector: Option<&str>) -> Option<f64> {
    let doc = Html::parse_document(html);

    if let Some(sel) = custom_selector.filter(|s| !s.is_empty()) {
        match Selector::parse(sel) {
            Ok(selector) => {
                if let Some(el) = doc.select(&selector).next() {
                    let text = element_text(&el);
                    if let Some(price) = positive(parse_price(&text)) {
                        debug!(selector = sel, price, "price from custom selector");
                        return Some(price);
                    }
                }
            }
            Err(e) => debug!(selector = sel, error = %e, "custom selector did not parse"),
        }
    }

    for selector in CASCADE.iter() {
        let Some(el) = doc.select(selector).next() else {
            continue;
        };
        let Some(text) = candidate_text(&el) else {
            continue;
        };
        if let Some(price) = positive(parse_price(&text)) {
            debug!(price, "price from selector cascade");
            return Some(price);
        }
    }

    if let Some(meta) = doc.select(&META_PRICE).next() {
        if let Some(content) = meta.value().attr("content") {
            if let Some(price) = positive(parse_price(content)) {
                debug!(price, "price from metadata tag");
                return Some(price);
            }
        }
    }

    let body_text = doc
        .select(&BODY)
        .next()
        .map(|body| {
            body.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    if let Some(price) = positive(parse_price(&body_text)) {
        debug!(price, "price from full-text fallback");
        return Some(price);
    }

    None
}

/// The machine-readable `content` attribute is preferred over visible text,
/// with `data-price` as a last resort.
fn candidate_text(el: &ElementRef) -> Option<String> {
    if let Some(content) = el.value().attr("content").filter(|c| !c.trim().is_empty()) {
        return Some(content.to_string());
    }
    let text = element_text(el);
    if !text.is_empty() {
        return Some(text);
    }
    el.value()
        .attr("data-price")
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn positive(price: Option<f64>) -> Option<f64> {
    price.filter(|p| *p > 0.0)
}
