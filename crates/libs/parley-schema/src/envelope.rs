//! Reserved envelope keys and the outbound request document.
//!
//! Every document crossing the boundary is a JSON object. Two keys are
//! reserved: [`TYPE_KEY`] names the shape of the object and [`TOKEN_KEY`]
//! carries the caller-assigned correlation token. The two share the wire
//! object but are separate concerns here: a discriminant says *what* a
//! document is, a token says *which request* it answers.

use std::fmt;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{json_kind, DecodeError, DecodeErrorKind};
use crate::wide;

pub const TYPE_KEY: &str = "@type";
pub const TOKEN_KEY: &str = "@token";

/// Discriminant of the engine's error shape.
pub const ERROR_TYPE: &str = "error";

/// Opaque token matching a reply to the request that caused it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationToken {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// The reserved parts of an inbound document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub discriminant: Option<&'a str>,
    pub token: Option<CorrelationToken>,
}

impl<'a> Envelope<'a> {
    /// Reads the reserved keys without looking at any other field.
    ///
    /// A token that is present but not a JSON string is treated as absent.
    pub fn inspect(document: &'a JsonValue) -> Self {
        let Some(object) = document.as_object() else {
            return Self::default();
        };
        let discriminant = object.get(TYPE_KEY).and_then(JsonValue::as_str);
        let token = match object.get(TOKEN_KEY) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(raw)) => Some(CorrelationToken::new(raw.as_str())),
            Some(other) => {
                log::warn!(
                    "envelope: ignoring non-string {TOKEN_KEY} ({}) on {:?}",
                    json_kind(other),
                    discriminant
                );
                None
            }
        };
        Self { discriminant, token }
    }

    pub fn is_error(&self) -> bool {
        self.discriminant == Some(ERROR_TYPE)
    }
}

/// An untyped outbound request: a discriminant plus shape-specific fields.
///
/// The correlation token is not part of the request; the client attaches it
/// when the request is written.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    discriminant: String,
    fields: JsonMap<String, JsonValue>,
}

impl Request {
    pub fn new(discriminant: impl Into<String>) -> Self {
        Self { discriminant: discriminant.into(), fields: JsonMap::new() }
    }

    /// Builds a request from a complete JSON document.
    ///
    /// The document must be an object with a string `@type`. A stale `@token`
    /// is dropped.
    pub fn from_document(document: JsonValue) -> Result<Self, DecodeError> {
        let mut fields = match document {
            JsonValue::Object(fields) => fields,
            other => {
                return Err(DecodeErrorKind::NotAnObject { found: json_kind(&other) }.into())
            }
        };
        let discriminant = match fields.remove(TYPE_KEY) {
            Some(JsonValue::String(discriminant)) => discriminant,
            Some(other) => {
                return Err(DecodeError::type_mismatch("string", &other).at_field(TYPE_KEY))
            }
            None => {
                return Err(DecodeErrorKind::MissingDiscriminant { category: "Request" }.into())
            }
        };
        fields.remove(TOKEN_KEY);
        Ok(Self { discriminant, fields })
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        let key = key.into();
        if key == TYPE_KEY || key == TOKEN_KEY {
            log::warn!(
                "envelope: refusing to overwrite reserved key {key} on {}",
                self.discriminant
            );
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    /// Adds a 64-bit integer field in its string wire form.
    #[must_use]
    pub fn with_wide(self, key: impl Into<String>, value: i64) -> Self {
        self.with(key, wide::encode(value))
    }

    pub fn discriminant(&self) -> &str {
        &self.discriminant
    }

    pub fn field(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    /// Produces the wire document, attaching `token` when given.
    pub fn into_document(self, token: Option<&CorrelationToken>) -> JsonValue {
        let mut object = JsonMap::with_capacity(self.fields.len() + 2);
        object.insert(TYPE_KEY.to_owned(), JsonValue::String(self.discriminant));
        if let Some(token) = token {
            object.insert(TOKEN_KEY.to_owned(), JsonValue::String(token.as_str().to_owned()));
        }
        object.extend(self.fields);
        JsonValue::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inspect_separates_discriminant_and_token() {
        let document = json!({ "@type": "example.echoResult", "@token": "t1", "value": "42" });
        let envelope = Envelope::inspect(&document);
        assert_eq!(envelope.discriminant, Some("example.echoResult"));
        assert_eq!(envelope.token, Some(CorrelationToken::from("t1")));
        assert!(!envelope.is_error());
    }

    #[test]
    fn inspect_treats_non_string_token_as_absent() {
        let document = json!({ "@type": "example.event.tick", "@token": 12 });
        assert_eq!(Envelope::inspect(&document).token, None);
        assert_eq!(Envelope::inspect(&json!([1, 2])), Envelope::default());
    }

    #[test]
    fn request_document_carries_token_and_fields() {
        let token = CorrelationToken::from("t1");
        let document = Request::new("example.echo")
            .with("value", "42")
            .with_wide("chat_id", -100)
            .into_document(Some(&token));
        assert_eq!(
            document,
            json!({ "@type": "example.echo", "@token": "t1", "value": "42", "chat_id": "-100" })
        );
    }

    #[test]
    fn request_refuses_reserved_keys() {
        let request = Request::new("getMe").with("@type", "other").with("@token", "forged");
        assert_eq!(request.discriminant(), "getMe");
        assert_eq!(request.into_document(None), json!({ "@type": "getMe" }));
    }

    #[test]
    fn from_document_strips_stale_token() {
        let request =
            Request::from_document(json!({ "@type": "getChat", "@token": "old", "chat_id": "5" }))
                .expect("valid request");
        assert_eq!(request.discriminant(), "getChat");
        assert_eq!(request.field("chat_id"), Some(&json!("5")));
        assert_eq!(request.into_document(None), json!({ "@type": "getChat", "chat_id": "5" }));
    }

    #[test]
    fn from_document_requires_discriminant() {
        let err = Request::from_document(json!({ "chat_id": "5" })).expect_err("no @type");
        assert!(matches!(err.kind(), DecodeErrorKind::MissingDiscriminant { .. }));
        assert!(Request::from_document(json!("getMe")).is_err());
    }
}
