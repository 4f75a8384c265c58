// src/models/product.rs
// Inbound data: what we are looking for, and what the platforms returned.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::MatchError;
use crate::utils::price::parse_price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Amazon,
    Flipkart,
    Myntra,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Amazon, Platform::Flipkart, Platform::Myntra];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Flipkart => "flipkart",
            Platform::Myntra => "myntra",
        }
    }

    /// Storefront origin, used to resolve relative listing links.
    pub fn base_url(&self) -> &'static str {
        match self {
            Platform::Amazon => "https://www.amazon.in",
            Platform::Flipkart => "https://www.flipkart.com",
            Platform::Myntra => "https://www.myntra.com",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amazon" => Ok(Platform::Amazon),
            "flipkart" => Ok(Platform::Flipkart),
            "myntra" => Ok(Platform::Myntra),
            other => Err(MatchError::Configuration(format!("unknown platform '{}'", other))),
        }
    }
}

/// The catalog product a matching run is looking for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub name: String,
    pub sku: Option<String>,
    pub catalog_price: Option<Decimal>,
    pub catalog_cost: Option<Decimal>,
    /// Category name to use instead of classifying `name`.
    pub category_hint: Option<String>,
}

impl ProductQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_catalog_price(mut self, price: Decimal) -> Self {
        self.catalog_price = Some(price);
        self
    }

    pub fn with_catalog_cost(mut self, cost: Decimal) -> Self {
        self.catalog_cost = Some(cost);
        self
    }

    pub fn with_category_hint(mut self, hint: impl Into<String>) -> Self {
        self.category_hint = Some(hint.into());
        self
    }
}

/// One search-result listing, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub platform: Platform,
    pub title: String,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub discount: Option<String>,
    pub stock_status: Option<String>,
    pub url: Option<String>,
}

impl Candidate {
    pub fn new(platform: Platform, title: impl Into<String>) -> Self {
        Self {
            platform,
            title: title.into(),
            price: None,
            original_price: None,
            discount: None,
            stock_status: None,
            url: None,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Normalize a scraped listing. Never fails: unparseable prices and
    /// links become `None`, blank strings become `None`.
    pub fn from_raw(raw: RawListing) -> Self {
        let platform = raw.platform;
        Self {
            platform,
            title: raw.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            price: raw.price.as_deref().and_then(parse_price),
            original_price: raw.original_price.as_deref().and_then(parse_price),
            discount: non_blank(raw.discount),
            stock_status: non_blank(raw.stock_status),
            url: non_blank(raw.url).and_then(|u| resolve_listing_url(platform, &u)),
        }
    }
}

/// A listing exactly as the browsing collaborator extracted it. Prices are
/// page text ("₹1,299", "Rs. 57.95") or bare JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub platform: Platform,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "price_text")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "price_text")]
    pub original_price: Option<String>,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub stock_status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawListing {
    pub fn new(platform: Platform, title: impl Into<String>) -> Self {
        Self {
            platform,
            title: Some(title.into()),
            price: None,
            original_price: None,
            discount: None,
            stock_status: None,
            url: None,
        }
    }
}

fn price_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Absolute links are kept as-is, relative ones (e.g. Myntra's "/sunglasses/...")
/// are joined onto the platform origin.
fn resolve_listing_url(platform: Platform, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(platform.base_url())
            .and_then(|base| base.join(href))
            .map(|url| url.to_string())
            .ok(),
        Err(e) => {
            log::debug!("Dropping unparseable {} listing url '{}': {}", platform, href, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_platform_parsing() {
        assert_eq!("Amazon".parse::<Platform>().unwrap(), Platform::Amazon);
        assert_eq!(" flipkart ".parse::<Platform>().unwrap(), Platform::Flipkart);
        assert!("ebay".parse::<Platform>().is_err());
    }

    #[test]
    fn test_from_raw_parses_prices_defensively() {
        let mut raw = RawListing::new(Platform::Flipkart, "  Wooden Sunglasses  ");
        raw.price = Some("₹1,299".to_string());
        raw.original_price = Some("not a price".to_string());
        raw.discount = Some("   ".to_string());

        let candidate = Candidate::from_raw(raw);
        assert_eq!(candidate.title, "Wooden Sunglasses");
        assert_eq!(candidate.price, Some(Decimal::new(1299, 0)));
        assert_eq!(candidate.original_price, None);
        assert_eq!(candidate.discount, None);
    }

    #[test]
    fn test_from_raw_resolves_relative_urls() {
        let mut raw = RawListing::new(Platform::Myntra, "Silk Stole");
        raw.url = Some("/stoles/dzukou/silk-stole/123/buy".to_string());
        let candidate = Candidate::from_raw(raw);
        assert_eq!(
            candidate.url.as_deref(),
            Some("https://www.myntra.com/stoles/dzukou/silk-stole/123/buy")
        );

        let mut raw = RawListing::new(Platform::Amazon, "Thermos");
        raw.url = Some("https://www.amazon.in/dp/B000".to_string());
        assert_eq!(
            Candidate::from_raw(raw).url.as_deref(),
            Some("https://www.amazon.in/dp/B000")
        );
    }

    #[test]
    fn test_raw_listing_accepts_numeric_prices() {
        let raw: RawListing = serde_json::from_str(
            r#"{"platform": "amazon", "title": "Mug", "price": 57.95, "original_price": "Rs. 80"}"#,
        )
        .unwrap();
        let candidate = Candidate::from_raw(raw);
        assert_eq!(candidate.price, Some(Decimal::new(5795, 2)));
        assert_eq!(candidate.original_price, Some(Decimal::new(80, 0)));
    }
}
