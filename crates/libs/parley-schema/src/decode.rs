//! Generic decoding from untyped JSON into typed shapes.
//!
//! Flat shapes decode in two passes over the same object. The first pass binds
//! plain fields directly ([`Fields::field`]); the second resolves fields typed
//! as a polymorphic category through that category's registry
//! ([`Fields::variant`]). The second pass only accepts [`Polymorphic`] types,
//! so a category-typed field can never be bound without its discriminant being
//! looked up.

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::envelope::TYPE_KEY;
use crate::error::{json_kind, DecodeError, DecodeErrorKind};
use crate::wide::{self, Int64};

/// A shape that can be built from a JSON value.
pub trait Decode: Sized {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError>;

    /// The value a field takes when its key is missing from the document.
    ///
    /// `None` marks the type as required, which is the default. Only
    /// `Option<T>` overrides this.
    fn absent() -> Option<Self> {
        None
    }
}

/// Marker for types resolved through a variant registry: categories, and
/// optional or sequenced categories.
pub trait Polymorphic: Decode {}

impl<T: Polymorphic> Polymorphic for Option<T> {}
impl<T: Polymorphic> Polymorphic for Vec<T> {}

/// A flat shape carrying its own discriminant.
pub trait Tagged {
    const TYPE: &'static str;
}

/// Field access over one JSON object.
#[derive(Clone, Copy, Debug)]
pub struct Fields<'a> {
    object: &'a JsonMap<String, JsonValue>,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a JsonValue) -> Result<Self, DecodeError> {
        match value {
            JsonValue::Object(object) => Ok(Self { object }),
            other => Err(DecodeErrorKind::NotAnObject { found: json_kind(other) }.into()),
        }
    }

    /// Like [`Fields::new`], but rejects a document whose `@type` names a
    /// different shape. A document without `@type` is accepted.
    pub fn tagged<T: Tagged>(value: &'a JsonValue) -> Result<Self, DecodeError> {
        let fields = Self::new(value)?;
        match fields.object.get(TYPE_KEY) {
            None => Ok(fields),
            Some(JsonValue::String(found)) if found == T::TYPE => Ok(fields),
            Some(JsonValue::String(found)) => {
                Err(DecodeErrorKind::UnexpectedVariant { expected: T::TYPE, found: found.clone() }
                    .into())
            }
            Some(other) => Err(DecodeError::type_mismatch("string", other).at_field(TYPE_KEY)),
        }
    }

    /// First pass: binds a primitive, wide integer or flat shape.
    pub fn field<T: Decode>(&self, key: &str) -> Result<T, DecodeError> {
        self.bind(key)
    }

    /// Second pass: resolves a category-typed field through its registry.
    pub fn variant<T: Polymorphic>(&self, key: &str) -> Result<T, DecodeError> {
        self.bind(key)
    }

    pub fn raw(&self, key: &str) -> Option<&'a JsonValue> {
        self.object.get(key)
    }

    fn bind<T: Decode>(&self, key: &str) -> Result<T, DecodeError> {
        match self.object.get(key) {
            None => T::absent().ok_or_else(|| DecodeError::missing_field(key)),
            Some(value) => T::decode(value).map_err(|err| err.at_field(key)),
        }
    }
}

impl Decode for String {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        value.as_str().map(str::to_owned).ok_or_else(|| DecodeError::type_mismatch("string", value))
    }
}

impl Decode for bool {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        value.as_bool().ok_or_else(|| DecodeError::type_mismatch("boolean", value))
    }
}

impl Decode for i32 {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        let wide = value.as_i64().ok_or_else(|| DecodeError::type_mismatch("integer", value))?;
        i32::try_from(wide).map_err(|_| {
            DecodeErrorKind::OutOfRange { expected: "i32", value: wide.to_string() }.into()
        })
    }
}

impl Decode for f64 {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        value.as_f64().ok_or_else(|| DecodeError::type_mismatch("number", value))
    }
}

impl Decode for Int64 {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        wide::decode(value).map(Int64)
    }
}

impl Decode for JsonValue {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        match value {
            JsonValue::Null => Ok(None),
            present => T::decode(present).map(Some),
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        let items = value.as_array().ok_or_else(|| DecodeError::type_mismatch("array", value))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| T::decode(item).map_err(|err| err.at_index(index)))
            .collect()
    }
}

/// Declares a flat shape and its two-pass [`Decode`] implementation.
///
/// Plain fields go in the struct body; fields typed as a polymorphic category
/// go in the trailing `variants` block. A field whose wire key differs from
/// its Rust name is written `name as "key": Type`.
///
/// ```ignore
/// shape! {
///     pub struct Call = "call" {
///         id: i32,
///         user_id: Int64,
///     }
///     variants {
///         state: CallState,
///     }
/// }
/// ```
#[macro_export]
macro_rules! shape {
    (@open $value:ident) => {
        $crate::decode::Fields::new($value)
    };
    (@open $value:ident $tag:literal) => {
        $crate::decode::Fields::tagged::<Self>($value)
    };
    (@key $field:ident) => {
        stringify!($field)
    };
    (@key $field:ident $key:literal) => {
        $key
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(= $tag:literal)? {
            $(
                $(#[$fmeta:meta])*
                $field:ident $(as $key:literal)? : $fty:ty
            ),* $(,)?
        }
        $(
            variants {
                $(
                    $(#[$vmeta:meta])*
                    $vfield:ident $(as $vkey:literal)? : $vty:ty
                ),* $(,)?
            }
        )?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $fty,
            )*
            $($(
                $(#[$vmeta])*
                pub $vfield: $vty,
            )*)?
        }

        $(
            impl $crate::decode::Tagged for $name {
                const TYPE: &'static str = $tag;
            }
        )?

        impl $crate::decode::Decode for $name {
            fn decode(
                value: &$crate::JsonValue,
            ) -> ::std::result::Result<Self, $crate::DecodeError> {
                let fields = $crate::shape!(@open value $($tag)?)?;
                let _ = &fields;
                $(
                    let $field: $fty = fields.field($crate::shape!(@key $field $($key)?))?;
                )*
                $($(
                    let $vfield: $vty = fields.variant($crate::shape!(@key $vfield $($vkey)?))?;
                )*)?
                Ok(Self {
                    $($field,)*
                    $($($vfield,)*)?
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    crate::shape! {
        struct Sample = "sample" {
            title: String,
            count: i32,
            id: Int64,
            note: Option<String>,
            scores: Vec<f64>,
            kind as "type": Option<bool>,
        }
    }

    #[test]
    fn binds_plain_fields() {
        let sample = Sample::decode(&json!({
            "@type": "sample",
            "title": "hello",
            "count": 3,
            "id": "9007199254740993",
            "scores": [1.5, 2],
            "type": true,
        }))
        .expect("decode");
        assert_eq!(sample.title, "hello");
        assert_eq!(sample.count, 3);
        assert_eq!(sample.id, Int64(9_007_199_254_740_993));
        assert_eq!(sample.note, None);
        assert_eq!(sample.scores, vec![1.5, 2.0]);
        assert_eq!(sample.kind, Some(true));
    }

    #[test]
    fn optional_field_distinguishes_absent_from_empty() {
        let base = json!({ "title": "", "count": 0, "id": "0", "scores": [] });
        let absent = Sample::decode(&base).expect("absent note");
        assert_eq!(absent.note, None);

        let mut with_empty = base.clone();
        with_empty["note"] = json!("");
        assert_eq!(Sample::decode(&with_empty).expect("empty note").note, Some(String::new()));

        let mut with_null = base;
        with_null["note"] = JsonValue::Null;
        assert_eq!(Sample::decode(&with_null).expect("null note").note, None);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let err = Sample::decode(&json!({ "title": "x", "id": "1", "scores": [] }))
            .expect_err("count is required");
        assert_eq!(err.kind(), &DecodeErrorKind::MissingField);
        assert_eq!(err.path(), "count");
    }

    #[test]
    fn sequence_errors_carry_the_index() {
        let err = Sample::decode(&json!({ "title": "x", "count": 1, "id": "1", "scores": [1, "two"] }))
            .expect_err("bad element");
        assert_eq!(err.path(), "scores[1]");
    }

    #[test]
    fn mismatched_discriminant_is_rejected() {
        let err = Sample::decode(&json!({ "@type": "other", "title": "x" })).expect_err("wrong tag");
        assert_eq!(
            err.kind(),
            &DecodeErrorKind::UnexpectedVariant { expected: "sample", found: "other".into() }
        );
    }

    #[test]
    fn integers_are_range_checked() {
        let err = i32::decode(&json!(4_294_967_296_i64)).expect_err("out of range");
        assert!(matches!(err.kind(), DecodeErrorKind::OutOfRange { .. }));
        assert!(i32::decode(&json!(1.5)).is_err());
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let err = Sample::decode(&json!([1])).expect_err("array");
        assert_eq!(err.kind(), &DecodeErrorKind::NotAnObject { found: "array" });
    }
}
