use std::fmt;

use serde_json::Value as JsonValue;

/// What went wrong while decoding a document, independent of where.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    #[error("malformed JSON: {message}")]
    Malformed { message: String },

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("{category}: document carries no `@type` discriminant")]
    MissingDiscriminant { category: &'static str },

    #[error("{category}: unknown variant `{discriminant}`")]
    UnknownVariant { category: &'static str, discriminant: String },

    #[error("expected `{expected}`, document is `{found}`")]
    UnexpectedVariant { expected: &'static str, found: String },

    #[error("missing required field")]
    MissingField,

    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("{value} does not fit in {expected}")]
    OutOfRange { expected: &'static str, value: String },

    #[error("wide integer {reason}")]
    WideInteger { reason: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// A decode failure together with the field path that produced it.
///
/// The path is built innermost-first as the error bubbles out of nested
/// decodes, so `messages[2].content.text` points at the smallest enclosing
/// field rather than at the whole document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    path: Vec<PathSegment>,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind) -> Self {
        Self { kind, path: Vec::new() }
    }

    pub fn type_mismatch(expected: &'static str, found: &JsonValue) -> Self {
        Self::new(DecodeErrorKind::TypeMismatch { expected, found: json_kind(found) })
    }

    pub fn missing_field(key: &str) -> Self {
        Self::new(DecodeErrorKind::MissingField).at_field(key)
    }

    pub fn wide_integer(reason: &'static str) -> Self {
        Self::new(DecodeErrorKind::WideInteger { reason })
    }

    /// Prefixes the path with an object key.
    #[must_use]
    pub fn at_field(mut self, key: &str) -> Self {
        self.path.insert(0, PathSegment::Field(key.to_owned()));
        self
    }

    /// Prefixes the path with a sequence index.
    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.path.insert(0, PathSegment::Index(index));
        self
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.path
    }

    /// Dotted rendering of the path, empty for a top-level failure.
    pub fn path(&self) -> String {
        let mut rendered = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Field(key) => {
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str(key);
                }
                PathSegment::Index(index) => {
                    rendered.push('[');
                    rendered.push_str(&index.to_string());
                    rendered.push(']');
                }
            }
        }
        rendered
    }

    pub fn is_unknown_variant(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::UnknownVariant { .. })
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.path(), self.kind)
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(DecodeErrorKind::Malformed { message: err.to_string() })
    }
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
