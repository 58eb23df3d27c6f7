//! 64-bit integers on the wire.
//!
//! The engine sends every 64-bit integer as a JSON string of base-10 digits so
//! that JSON decoders which parse numbers as doubles do not lose precision.
//! Decoding is strict: a bare JSON number in a wide field is an encoder bug and
//! is rejected, as is anything that is not an optional sign followed by digits.

use std::fmt;

use ::serde::de::{self, Deserializer, Visitor};
use ::serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::DecodeError;

/// A 64-bit integer field using the string wire convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Int64(pub i64);

impl Int64 {
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for Int64 {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Int64> for i64 {
    fn from(value: Int64) -> Self {
        value.0
    }
}

impl PartialEq<i64> for Int64 {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Int64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Int64> for JsonValue {
    fn from(value: Int64) -> Self {
        encode(value.0)
    }
}

/// Wire form of a wide integer.
pub fn encode(value: i64) -> JsonValue {
    JsonValue::String(value.to_string())
}

/// Parses the wire form of a wide integer.
pub fn decode(value: &JsonValue) -> Result<i64, DecodeError> {
    match value {
        JsonValue::String(text) => parse(text),
        JsonValue::Number(_) => {
            Err(DecodeError::wide_integer("must be a quoted string, found a bare number"))
        }
        other => Err(DecodeError::type_mismatch("wide integer string", other)),
    }
}

pub(crate) fn parse(text: &str) -> Result<i64, DecodeError> {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() {
        return Err(DecodeError::wide_integer("has no digits"));
    }
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(DecodeError::wide_integer("contains non-digit characters"));
    }
    text.parse::<i64>().map_err(|_| DecodeError::wide_integer("overflows 64 bits"))
}

impl Serialize for Int64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Int64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WideVisitor).map(Self)
    }
}

struct WideVisitor;

impl<'de> Visitor<'de> for WideVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 64-bit integer encoded as a decimal string")
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<i64, E> {
        parse(text).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, _value: i64) -> Result<i64, E> {
        Err(E::custom("wide integer must be a quoted string, found a bare number"))
    }

    fn visit_u64<E: de::Error>(self, _value: u64) -> Result<i64, E> {
        Err(E::custom("wide integer must be a quoted string, found a bare number"))
    }

    fn visit_f64<E: de::Error>(self, _value: f64) -> Result<i64, E> {
        Err(E::custom("wide integer must be a quoted string, found a bare number"))
    }
}

/// `#[serde(with = "parley_schema::wide::serde")]` for plain `i64` fields of
/// serde-derived shapes.
pub mod serde {
    use ::serde::{Deserialize, Deserializer, Serializer};

    use super::Int64;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Int64::deserialize(deserializer).map(Int64::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use serde_json::json;

    #[test]
    fn round_trips_extremes() {
        for value in [0, 1, -1, 42, i64::MAX, i64::MIN, 9_007_199_254_740_993] {
            assert_eq!(decode(&encode(value)), Ok(value));
        }
    }

    #[test]
    fn accepts_explicit_plus_sign() {
        assert_eq!(decode(&json!("+17")), Ok(17));
    }

    #[test]
    fn rejects_bare_numbers() {
        let err = decode(&json!(7)).expect_err("bare number must be rejected");
        assert!(matches!(err.kind(), DecodeErrorKind::WideInteger { .. }));
    }

    #[test]
    fn rejects_non_numeric_content() {
        for text in ["", "-", "12a", " 12", "1.5", "0x10", "99999999999999999999"] {
            let err = decode(&json!(text)).expect_err(text);
            assert!(matches!(err.kind(), DecodeErrorKind::WideInteger { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn rejects_other_json_types() {
        let err = decode(&json!(null)).expect_err("null");
        assert!(matches!(err.kind(), DecodeErrorKind::TypeMismatch { found: "null", .. }));
    }

    #[derive(Debug, ::serde::Serialize, ::serde::Deserialize, PartialEq)]
    struct Derived {
        #[serde(with = "crate::wide::serde")]
        chat_id: i64,
        user_id: Int64,
    }

    #[test]
    fn serde_integration_uses_string_convention() {
        let value = Derived { chat_id: -1_001_234_567_890, user_id: Int64(5) };
        let encoded = serde_json::to_value(&value).expect("encode");
        assert_eq!(encoded, json!({ "chat_id": "-1001234567890", "user_id": "5" }));
        let decoded: Derived = serde_json::from_value(encoded).expect("decode");
        assert_eq!(decoded, value);

        let bare = serde_json::from_value::<Derived>(json!({ "chat_id": 1, "user_id": "5" }));
        assert!(bare.is_err());
    }
}
