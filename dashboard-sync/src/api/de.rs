use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de::Error};
use std::str::FromStr;

/// A JSON scalar that may hold a number either natively or as text (HTML form inputs post
/// strings).
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(serde_json::Number),
    Text(String),
}

impl Numeric {
    fn into_text(self) -> String {
        match self {
            Numeric::Number(number) => number.to_string(),
            Numeric::Text(text) => text.trim().to_string(),
        }
    }
}

/// A JSON scalar standing in for a checkbox value.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Deserialize an `f64` from a JSON number or numeric string.
pub fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Numeric::deserialize(deserializer)?.into_text();
    text.parse::<f64>()
        .map_err(|error| D::Error::custom(format!("invalid number {text:?}: {error}")))
}

/// Deserialize an optional [`Decimal`], treating `null` and blank strings as absent.
pub fn de_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(numeric) = Option::<Numeric>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let text = numeric.into_text();
    if text.is_empty() {
        return Ok(None);
    }

    parse_decimal(&text)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("invalid decimal {text:?}")))
}

/// Deserialize an optional string, treating blank strings as absent.
pub fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|text| !text.trim().is_empty()))
}

/// Deserialize an optional `bool` from a JSON bool, `0`/`1`, or a `"true"`/`"false"`/`"on"`/`"off"`
/// string, treating `null` and blank strings as absent.
pub fn de_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = match Option::<Flag>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Flag::Bool(flag)) => return Ok(Some(flag)),
        Some(Flag::Number(number)) => number.to_string(),
        Some(Flag::Text(text)) => text.trim().to_ascii_lowercase(),
    };

    match flag.as_str() {
        "" => Ok(None),
        "true" | "on" | "1" => Ok(Some(true)),
        "false" | "off" | "0" => Ok(Some(false)),
        other => Err(D::Error::custom(format!("invalid flag {other:?}"))),
    }
}
