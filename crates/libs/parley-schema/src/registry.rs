//! Variant registries for polymorphic categories.
//!
//! A category is a closed set of variant shapes sharing one logical field
//! ("the state of a call"). Each category owns one [`Registry`], a table from
//! discriminant to constructor, built once on first use and never mutated
//! afterwards. Unknown discriminants fail with the category and tag named;
//! there is no fallback variant.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::envelope::TYPE_KEY;
use crate::error::{json_kind, DecodeError, DecodeErrorKind};

pub type Constructor<C> = fn(&JsonValue) -> Result<C, DecodeError>;

/// A polymorphic category: an enum with one variant per registered shape.
pub trait Category: Sized + 'static {
    const NAME: &'static str;

    fn registry() -> &'static Registry<Self>;

    /// Discriminant of the variant this value holds.
    fn discriminant(&self) -> &'static str;
}

pub struct Registry<C> {
    category: &'static str,
    constructors: HashMap<&'static str, Constructor<C>>,
}

impl<C> Registry<C> {
    pub fn builder(category: &'static str) -> RegistryBuilder<C> {
        RegistryBuilder { category, constructors: HashMap::new() }
    }

    pub fn category(&self) -> &'static str {
        self.category
    }

    pub fn contains(&self, discriminant: &str) -> bool {
        self.constructors.contains_key(discriminant)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered discriminants in sorted order.
    pub fn discriminants(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.constructors.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Reads the discriminant of `value` and runs the matching constructor.
    pub fn resolve(&self, value: &JsonValue) -> Result<C, DecodeError> {
        let object = value
            .as_object()
            .ok_or(DecodeErrorKind::NotAnObject { found: json_kind(value) })?;
        let Some(JsonValue::String(discriminant)) = object.get(TYPE_KEY) else {
            return Err(DecodeErrorKind::MissingDiscriminant { category: self.category }.into());
        };
        let constructor = self.constructors.get(discriminant.as_str()).ok_or_else(|| {
            DecodeErrorKind::UnknownVariant {
                category: self.category,
                discriminant: discriminant.clone(),
            }
        })?;
        constructor(value)
    }
}

impl<C> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("category", &self.category)
            .field("discriminants", &self.discriminants())
            .finish()
    }
}

pub struct RegistryBuilder<C> {
    category: &'static str,
    constructors: HashMap<&'static str, Constructor<C>>,
}

impl<C> RegistryBuilder<C> {
    /// Adds one variant. A discriminant registered twice keeps its first
    /// constructor.
    #[must_use]
    pub fn register(mut self, discriminant: &'static str, constructor: Constructor<C>) -> Self {
        if self.constructors.contains_key(discriminant) {
            log::error!(
                "registry: {} registers `{discriminant}` twice; keeping the first constructor",
                self.category
            );
            return self;
        }
        self.constructors.insert(discriminant, constructor);
        self
    }

    pub fn build(self) -> Registry<C> {
        Registry { category: self.category, constructors: self.constructors }
    }
}

/// Declares a polymorphic category, one line per variant.
///
/// Each variant wraps a flat shape declared with [`shape!`](crate::shape) and a
/// discriminant. The macro emits the enum, its [`Category`] registry, the
/// registry-backed [`Decode`](crate::decode::Decode) implementation and a
/// `From` conversion per variant.
#[macro_export]
macro_rules! category {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident = $category:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($shape:ty)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($shape),
            )+
        }

        impl $crate::registry::Category for $name {
            const NAME: &'static str = $category;

            fn registry() -> &'static $crate::registry::Registry<Self> {
                static REGISTRY: ::std::sync::OnceLock<$crate::registry::Registry<$name>> =
                    ::std::sync::OnceLock::new();
                REGISTRY.get_or_init(|| {
                    $crate::registry::Registry::<$name>::builder($category)
                        $(
                            .register(<$shape as $crate::decode::Tagged>::TYPE, |value| {
                                <$shape as $crate::decode::Decode>::decode(value)
                                    .map($name::$variant)
                            })
                        )+
                        .build()
                })
            }

            fn discriminant(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => <$shape as $crate::decode::Tagged>::TYPE,)+
                }
            }
        }

        impl $crate::decode::Decode for $name {
            fn decode(
                value: &$crate::JsonValue,
            ) -> ::std::result::Result<Self, $crate::DecodeError> {
                <Self as $crate::registry::Category>::registry().resolve(value)
            }
        }

        impl $crate::decode::Polymorphic for $name {}

        $(
            impl ::std::convert::From<$shape> for $name {
                fn from(variant: $shape) -> Self {
                    Self::$variant(variant)
                }
            }
        )+
    };
}
