//! Lenient decoders for values the events server sends in more than one shape.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    #[allow(clippy::cast_possible_truncation)]
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Int(n) => Ok(n),
            Self::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            Self::Float(f) => Err(E::custom(format!("expected a finite number, got {f}"))),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a number, got {text:?}"))),
        }
    }
}

/// Epoch milliseconds sent either as a JSON number or a numeric string.
pub fn epoch_ms<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrText::deserialize(deserializer)?.into_i64()
}

/// Optional epoch milliseconds; `null`, absent and `""` all mean "not set".
pub fn opt_epoch_ms<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => value.into_i64().map(Some),
    }
}

/// Optional non-negative count; `0`, `""`, `null` and absent all mean "not set".
pub fn opt_positive_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => {
            let n = value.into_i64()?;
            if n <= 0 {
                Ok(None)
            } else {
                u32::try_from(n)
                    .map(Some)
                    .map_err(|_| serde::de::Error::custom(format!("value out of range: {n}")))
            }
        }
    }
}

/// Boolean flag sent either as `true`/`false` or `"true"`/`"false"`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrText {
        Bool(bool),
        Text(String),
    }

    match Option::<BoolOrText>::deserialize(deserializer)? {
        Some(BoolOrText::Bool(b)) => Ok(b),
        Some(BoolOrText::Text(text)) => Ok(text.trim().eq_ignore_ascii_case("true")),
        None => Ok(false),
    }
}
