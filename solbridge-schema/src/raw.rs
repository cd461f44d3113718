// solbridge-schema - Uninterpreted JSON passthrough
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Opaque JSON values.
//!
//! [`RawJson`] holds a JSON subtree exactly as the compiler wrote it.
//! It is used for the parts of the response whose shape belongs to the
//! compiler rather than to this crate: ASTs, ABI entries, NatSpec docs,
//! legacy assembly and storage layouts.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

/// A JSON value kept as its original text.
#[derive(Clone)]
pub struct RawJson(Box<RawValue>);

impl RawJson {
    /// Wrap a JSON document, validating that it is well formed.
    pub fn from_string(json: String) -> serde_json::Result<Self> {
        RawValue::from_string(json).map(RawJson)
    }

    /// Encode any serializable value as raw JSON.
    pub fn from_value<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::value::to_raw_value(value).map(RawJson)
    }

    /// The JSON text, byte for byte as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// Decode the held text into a typed value.
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(self.0.get())
    }

    /// Decode into a generic [`serde_json::Value`].
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        self.parse()
    }

    #[must_use]
    pub fn into_inner(self) -> Box<RawValue> {
        self.0
    }
}

impl From<Box<RawValue>> for RawJson {
    fn from(raw: Box<RawValue>) -> Self {
        RawJson(raw)
    }
}

// Textual equality: two raw values are equal when the compiler wrote
// the same bytes.
impl PartialEq for RawJson {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RawJson {}

impl fmt::Debug for RawJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawJson").field(&self.as_str()).finish()
    }
}

impl fmt::Display for RawJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RawJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(RawJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_original_text() {
        let text = r#"{ "b" : 1,"a":[1 ,2] }"#;
        let raw = RawJson::from_string(text.to_string()).unwrap();
        assert_eq!(raw.as_str(), text);
        assert_eq!(raw.to_string(), text);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(RawJson::from_string("{".to_string()).is_err());
    }

    #[test]
    fn equality_is_textual() {
        let a = RawJson::from_string("[1,2]".to_string()).unwrap();
        let b = RawJson::from_string("[1,2]".to_string()).unwrap();
        let c = RawJson::from_string("[1, 2]".to_string()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn parse_into_typed_value() {
        let raw = RawJson::from_value(&vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = raw.parse().unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
