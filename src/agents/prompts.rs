//! Prompt templates for the analysis agents
//!
//! Every prompt asks for a single JSON object and nothing else; the reply
//! parsers still tolerate fences and prose around it.

use crate::vocabulary::{COLORS, EMBELLISHMENTS, FABRICS, PATTERNS, STYLES};

const CATEGORIES: &str = "tops, bottoms, dresses, outerwear, shoes, bags, accessories, jewelry, \
activewear, swimwear, loungewear, underwear, other";

/// Identification pass: what is this garment
pub fn garment_prompt() -> String {
    format!(
        r#"You are a fashion cataloguing assistant. Identify the single main garment in this photo.

Prefer these terms where they fit.
Colors: {colors}
Fabrics: {fabrics}
Patterns: {patterns}
Styles: {styles}

Respond with ONLY a JSON object:
{{
  "name": "short descriptive item name",
  "category": "one of: {categories}",
  "subcategory": "e.g. blazer, midi skirt, ankle boots",
  "brand": "brand if a logo or label is visible, otherwise null",
  "colors": ["..."],
  "fabrics": ["..."],
  "patterns": ["..."],
  "styles": ["..."],
  "description": "two sentences describing the garment",
  "confidence": 0.0
}}"#,
        colors = COLORS.term_list(),
        fabrics = FABRICS.term_list(),
        patterns = PATTERNS.term_list(),
        styles = STYLES.term_list(),
        categories = CATEGORIES,
    )
}

/// Detail pass: construction and decoration
pub fn detail_prompt(context: Option<&str>) -> String {
    let context = context
        .map(|c| format!("\nThe garment was identified as: {}\n", c))
        .unwrap_or_default();
    format!(
        r#"Examine the construction details of the garment in this photo.{context}
Look closely for embellishments such as: {embellishments}

Respond with ONLY a JSON object:
{{
  "construction_details": ["seams, darts, pleats, lining, hems ..."],
  "embellishments": ["..."],
  "closures": ["buttons, zipper, hook and eye ..."],
  "fabrics": ["..."],
  "fit": "e.g. slim, relaxed, oversized",
  "condition": "new, excellent, good, worn",
  "description": "what a close inspection shows"
}}"#,
        context = context,
        embellishments = EMBELLISHMENTS.term_list(),
    )
}

/// Style pass: how the garment is worn
pub fn style_prompt(context: Option<&str>) -> String {
    let context = context
        .map(|c| format!("\nThe garment was identified as: {}\n", c))
        .unwrap_or_default();
    format!(
        r#"You are a personal stylist. Assess the style of the garment in this photo.{context}
Style vocabulary: {styles}

Respond with ONLY a JSON object:
{{
  "styles": ["..."],
  "occasions": ["work, evening, weekend ..."],
  "seasons": ["spring, summer, autumn, winter"],
  "pairing_suggestions": ["..."],
  "description": "one or two sentences of styling notes"
}}"#,
        context = context,
        styles = STYLES.term_list(),
    )
}

/// Multi-item detection over an outfit or flat-lay photo
pub fn multi_item_prompt() -> String {
    format!(
        r#"Identify every separate clothing item, shoe, bag and accessory visible in this photo.

Respond with ONLY a JSON object:
{{
  "items": [
    {{
      "name": "short descriptive item name",
      "category": "one of: {categories}",
      "colors": ["..."],
      "position": "where it is in the image, e.g. upper body, left",
      "description": "one sentence",
      "confidence": 0.0
    }}
  ]
}}
Return an empty items array if no garments are visible."#,
        categories = CATEGORIES,
    )
}

const RECEIPT_SCHEMA: &str = r#"Respond with ONLY a JSON object:
{
  "store": "store name",
  "purchase_date": "YYYY-MM-DD",
  "currency": "ISO 4217 code, e.g. USD",
  "items": [
    { "name": "item name as printed", "price": "price as printed", "quantity": 1, "category": "garment category if clear" }
  ],
  "subtotal": "...",
  "tax": "...",
  "total": "..."
}
Use null for anything that is not on the receipt."#;

/// Receipt reading from a photo
pub fn receipt_image_prompt() -> String {
    format!(
        "Read this shopping receipt and list the clothing items purchased.\n\n{}",
        RECEIPT_SCHEMA
    )
}

/// Receipt reading from pasted or OCR'd text
pub fn receipt_text_prompt(text: &str) -> String {
    format!(
        "Read this shopping receipt text and list the clothing items purchased.\n\n\
         Receipt:\n\"\"\"\n{}\n\"\"\"\n\n{}",
        text, RECEIPT_SCHEMA
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_include_vocabulary_and_context() {
        assert!(!garment_prompt().contains("sequins"));
        assert!(garment_prompt().contains("navy"));
        assert!(detail_prompt(None).contains("sequins"));
        assert!(detail_prompt(Some("black wool coat")).contains("black wool coat"));
        assert!(receipt_text_prompt("Blazer 89.90").contains("Blazer 89.90"));
    }
}
