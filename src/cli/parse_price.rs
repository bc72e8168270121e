//! Price parsing command

use wardrobe_core::{
    analysis::price::parse_price,
    error::{Result, WardrobeError},
};

/// Handle the parse-price command
pub async fn handle(text: String, json: bool) -> Result<()> {
    let money = parse_price(&text)
        .ok_or_else(|| WardrobeError::Validation(format!("no price found in {:?}", text)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&money)?);
    } else {
        let code = money.currency.map(|c| c.code()).unwrap_or("???");
        println!("{:.2} {}", money.major(), code);
    }
    Ok(())
}
