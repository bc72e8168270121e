//! Receipt reading
//!
//! The model is asked for JSON, but receipts are the reply most likely to
//! come back as prose or a plain list. When no JSON can be recovered, a
//! line scanner pulls `name ... price` lines out of the reply, then out of
//! the raw receipt text.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::agents::prompts;
use crate::analysis::json::{extract_object, fields};
use crate::analysis::price::{parse_price, scan_receipt_lines};
use crate::error::{Result, WardrobeError};
use crate::services::{ImageInput, VisionModel};
use crate::types::{Category, Currency, Money};

/// One purchased line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLineItem {
    pub name: String,
    pub price: Option<Money>,
    pub quantity: u32,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptAnalysis {
    pub store: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub currency: Option<Currency>,
    pub items: Vec<ReceiptLineItem>,
    pub subtotal: Option<Money>,
    pub tax: Option<Money>,
    pub total: Option<Money>,
    /// Items came from the line scanner rather than model JSON
    pub used_fallback: bool,
}

impl ReceiptAnalysis {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let currency = fields::string(map, "currency").and_then(|c| {
            Currency::from_code(&c).or_else(|| c.chars().find_map(Currency::from_symbol))
        });

        let items = match map.get("items").or_else(|| map.get("line_items")) {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|entry| line_item(entry, currency))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            store: fields::string(map, "store").or_else(|| fields::string(map, "store_name")),
            purchase_date: fields::string(map, "purchase_date")
                .or_else(|| fields::string(map, "date"))
                .and_then(|d| parse_date(&d)),
            currency,
            items,
            subtotal: money_field(map, "subtotal", currency),
            tax: money_field(map, "tax", currency),
            total: money_field(map, "total", currency),
            used_fallback: false,
        }
    }

    /// Build from line-scanned text
    pub fn from_scanned_text(text: &str) -> Self {
        let scanned = scan_receipt_lines(text);
        let currency = scanned
            .items
            .iter()
            .filter_map(|line| line.price.currency)
            .next()
            .or_else(|| scanned.total.and_then(|t| t.currency));

        Self {
            currency,
            items: scanned
                .items
                .into_iter()
                .map(|line| ReceiptLineItem {
                    category: crate::vocabulary::category_from_text(&line.name),
                    name: line.name,
                    price: Some(line.price),
                    quantity: 1,
                })
                .collect(),
            subtotal: scanned.subtotal,
            tax: scanned.tax,
            total: scanned.total,
            used_fallback: true,
            ..Default::default()
        }
    }
}

fn line_item(entry: &Map<String, Value>, currency: Option<Currency>) -> Option<ReceiptLineItem> {
    let name = fields::string(entry, "name").or_else(|| fields::string(entry, "description"))?;
    let quantity = fields::number(entry, "quantity")
        .filter(|q| q.is_finite() && *q >= 1.0)
        .map(|q| q.round() as u32)
        .unwrap_or(1);
    let category = fields::string(entry, "category")
        .map(|c| Category::parse_lenient(&c))
        .filter(|c| *c != Category::Other)
        .or_else(|| crate::vocabulary::category_from_text(&name));

    Some(ReceiptLineItem {
        price: money_field(entry, "price", currency),
        name,
        quantity,
        category,
    })
}

/// A price that may arrive as a JSON number or a printed string
fn money_field(map: &Map<String, Value>, key: &str, currency: Option<Currency>) -> Option<Money> {
    let money = match map.get(key)? {
        Value::Number(n) => Money::from_major(n.as_f64()?, currency),
        Value::String(s) => parse_price(s),
        _ => None,
    }?;
    Some(Money {
        currency: money.currency.or(currency),
        ..money
    })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
}

pub struct ReceiptAnalyzer {
    model: Arc<dyn VisionModel>,
}

impl ReceiptAnalyzer {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    pub async fn analyze_image(&self, image: &ImageInput) -> Result<ReceiptAnalysis> {
        debug!("Reading receipt image with {}", self.model.model_name());
        let reply = self
            .model
            .complete(&prompts::receipt_image_prompt(), Some(image))
            .await?;
        Self::interpret(&reply, None)
    }

    pub async fn analyze_text(&self, text: &str) -> Result<ReceiptAnalysis> {
        if text.trim().is_empty() {
            return Err(WardrobeError::Validation("receipt text is empty".to_string()));
        }
        debug!("Reading receipt text ({} chars)", text.len());
        let reply = self
            .model
            .complete(&prompts::receipt_text_prompt(text), None)
            .await?;
        Self::interpret(&reply, Some(text))
    }

    fn interpret(reply: &str, raw_text: Option<&str>) -> Result<ReceiptAnalysis> {
        let err = match extract_object(reply) {
            Ok(map) => return Ok(ReceiptAnalysis::from_map(&map)),
            Err(e) => e,
        };

        warn!("Receipt reply had no JSON, scanning lines instead: {}", err);
        let from_reply = ReceiptAnalysis::from_scanned_text(reply);
        if !from_reply.items.is_empty() {
            return Ok(from_reply);
        }
        if let Some(text) = raw_text {
            let from_text = ReceiptAnalysis::from_scanned_text(text);
            if !from_text.items.is_empty() {
                return Ok(from_text);
            }
        }
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{sample_image, ScriptedVision};
    use serde_json::json;

    #[test]
    fn test_from_map_mixed_price_shapes() {
        let value = json!({
            "store": "Uniqlo",
            "purchase_date": "2024-03-09",
            "currency": "EUR",
            "items": [
                {"name": "Merino Crew Sweater", "price": 39.9, "quantity": 1},
                {"name": "Wide Leg Trousers", "price": "€1.049,00"},
                {"price": 5}
            ],
            "total": "1.088,90"
        });
        let receipt = ReceiptAnalysis::from_map(value.as_object().unwrap());

        assert_eq!(receipt.store.as_deref(), Some("Uniqlo"));
        assert_eq!(receipt.purchase_date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[0].price, Some(Money::new(3990, Some(Currency::Eur))));
        assert_eq!(receipt.items[0].category, Some(Category::Tops));
        assert_eq!(receipt.items[1].price.unwrap().amount_minor, 104900);
        assert_eq!(receipt.items[1].category, Some(Category::Bottoms));
        assert_eq!(receipt.total, Some(Money::new(108890, Some(Currency::Eur))));
        assert!(!receipt.used_fallback);
    }

    #[tokio::test]
    async fn test_prose_reply_falls_back_to_line_scan() {
        let model = ScriptedVision::replying(&["I found these items:\nLinen Shirt $45.00\nCanvas Tote $18.50\nTotal $63.50"]);
        let analyzer = ReceiptAnalyzer::new(model);
        let receipt = analyzer.analyze_image(&sample_image()).await.unwrap();

        assert!(receipt.used_fallback);
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[1].name, "Canvas Tote");
        assert_eq!(receipt.items[1].category, Some(Category::Bags));
        assert_eq!(receipt.total.unwrap().amount_minor, 6350);
        assert_eq!(receipt.currency, Some(Currency::Usd));
    }

    #[tokio::test]
    async fn test_text_fallback_uses_raw_receipt() {
        let model = ScriptedVision::replying(&["Sorry, I can't read that."]);
        let analyzer = ReceiptAnalyzer::new(model);
        let receipt = analyzer
            .analyze_text("Denim Jacket    £60.00\nTOTAL    £60.00")
            .await
            .unwrap();

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].price.unwrap().currency, Some(Currency::Gbp));
    }

    #[tokio::test]
    async fn test_unreadable_reply_is_model_output_error() {
        let model = ScriptedVision::replying(&["no idea"]);
        let analyzer = ReceiptAnalyzer::new(model);
        let err = analyzer.analyze_image(&sample_image()).await.unwrap_err();
        assert!(matches!(err, WardrobeError::ModelOutput(_)));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let analyzer = ReceiptAnalyzer::new(ScriptedVision::replying(&[]));
        assert!(matches!(
            analyzer.analyze_text("  ").await,
            Err(WardrobeError::Validation(_))
        ));
    }
}
