//! Wire schema for the parley messaging engine.
//!
//! The engine speaks JSON objects tagged with an `@type` discriminant. Many
//! fields are polymorphic: "the content of a message" may be any one of a
//! closed set of variant shapes. This crate provides:
//!
//! - **Envelope**: reserved keys, correlation tokens and the outbound
//!   [`Request`] document
//! - **Wide integers**: the quoted-decimal convention for 64-bit fields
//! - **Decoding**: the [`Decode`] trait, two-pass [`Fields`] binding and the
//!   [`shape!`] macro for flat shapes
//! - **Registry**: per-category discriminant tables and the [`category!`]
//!   macro
//! - **Catalogue**: a representative set of shapes and categories in
//!   [`types`], including the [`Update`] push-event category
//!
//! Decoding is pure: no I/O, no allocation beyond the decoded value.

pub mod decode;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod types;
pub mod wide;

pub use decode::{Decode, Fields, Polymorphic, Tagged};
pub use envelope::{CorrelationToken, Envelope, Request, ERROR_TYPE, TOKEN_KEY, TYPE_KEY};
pub use error::{DecodeError, DecodeErrorKind, PathSegment};
pub use registry::{Category, Registry};
pub use serde_json::Value as JsonValue;
pub use types::*;
pub use wide::Int64;

/// Decodes `document` as shape `T`, flat or polymorphic.
pub fn decode<T: Decode>(document: &JsonValue) -> Result<T, DecodeError> {
    T::decode(document)
}

/// Parses and decodes one JSON text.
pub fn decode_str<T: Decode>(text: &str) -> Result<T, DecodeError> {
    let document: JsonValue = serde_json::from_str(text)?;
    T::decode(&document)
}
