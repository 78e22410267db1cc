//! Serde helpers for 256-bit quantities (wei values, token amounts).
//!
//! Quantities are written as decimal strings so audit records stay readable
//! and lossless. On input a quantity may be a decimal string, a `0x`-prefixed
//! hex string, or a non-negative integer.

use std::fmt;

use alloy_primitives::U256;
use serde::{de, Deserialize, Deserializer, Serializer};

/// Parse a decimal or `0x`-prefixed hex quantity.
pub fn parse_quantity(raw: &str) -> Result<U256, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("quantity cannot be empty".to_string());
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() {
            return Ok(U256::ZERO);
        }
        if !hex.as_bytes().iter().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(format!("'{trimmed}' is not a valid hex quantity"));
        }
        return U256::from_str_radix(hex, 16)
            .map_err(|error| format!("failed to parse hex quantity '{trimmed}': {error}"));
    }
    if !trimmed.as_bytes().iter().all(|byte| byte.is_ascii_digit()) {
        return Err(format!(
            "'{trimmed}' must be a decimal string or 0x-prefixed hex quantity"
        ));
    }
    U256::from_str_radix(trimmed, 10)
        .map_err(|error| format!("failed to parse quantity '{trimmed}': {error}"))
}

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    deserializer.deserialize_any(QuantityVisitor)
}

struct QuantityVisitor;

impl<'de> de::Visitor<'de> for QuantityVisitor {
    type Value = U256;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string, 0x-prefixed hex string, or non-negative integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
        u64::try_from(v)
            .map(U256::from)
            .map_err(|_| E::custom(format!("quantity must be non-negative, got {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
        parse_quantity(v).map_err(E::custom)
    }
}

/// Same encoding for optional quantities. Pair with `#[serde(default)]`.
pub mod option {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper(#[serde(with = "super")] U256);

    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<U256>, D::Error> {
        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(v)| v))
    }
}
