//! Bidirectional mapping between application records and [`Document`]s.
//!
//! A record opts in with the [`record!`](crate::record) macro, which lists the
//! struct fields to map and the attribute name each one is stored under:
//!
//! ```
//! use elms_dynamo::dynamodb::codec::{from_document, to_document};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Lesson {
//!     lesson_id: String,
//!     minutes: u32,
//! }
//!
//! elms_dynamo::record!(Lesson {
//!     lesson_id: "LessonId",
//!     minutes: "Minutes",
//! });
//!
//! let lesson = Lesson { lesson_id: "l1".into(), minutes: 45 };
//! let document = to_document(&lesson);
//! assert_eq!(from_document::<Lesson>(&document), lesson);
//! ```
//!
//! Per-field behaviour is chosen by the field's declared type through
//! [`AttributeCodec`]:
//!
//! | Rust type | Attribute | Elided when |
//! |---|---|---|
//! | `String` | `S` | never |
//! | `bool` | `BOOL` | never |
//! | `char` | `S` (one character) | never |
//! | integers, `f32`, `f64` | `N` | zero and `omit_zeros` |
//! | enums declared with [`attribute_enum!`](crate::attribute_enum) | `N` | zero and `omit_zeros` |
//! | `DateTime<Utc>` | `S` (RFC 3339) | never |
//! | `Vec<String>`, `Vec<i32>`, `Vec<i64>` | `L` | never |
//! | another record | `M` | never |
//! | `Vec<record>` | `L` of `M` | never |
//! | `Option<T>` | as `T` | `None` and `omit_nulls` |
//!
//! Fields left out of the `record!` invocation are not mapped at all: they are
//! skipped on encode and keep their `Default` value on decode. This is how a
//! field of a type with no attribute encoding is handled, and it is silent.
//! Attributes with no matching field, or whose value does not fit the field's
//! type, are ignored on decode. Neither direction ever fails.
//!
//! Lists decode all-or-nothing: if any element of an `L` (or `SS`/`NS`) attribute
//! does not fit the element type, the whole field keeps its default.
//!
//! Zero and null elision make the mapping lossy for default values: a field set
//! to `0` decodes back to `0` only because `0` is also its default.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

pub use aws_sdk_dynamodb::types::AttributeValue;

use crate::dynamodb::Document;

/// Elision flags applied while encoding. Both default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Skip `None` fields instead of writing an explicit `NULL`.
    pub omit_nulls: bool,
    /// Skip numeric fields equal to zero.
    pub omit_zeros: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            omit_nulls: true,
            omit_zeros: true,
        }
    }
}

impl EncodeOptions {
    /// Writes every mapped field, including nulls and zeros.
    pub fn keep_all() -> Self {
        Self {
            omit_nulls: false,
            omit_zeros: false,
        }
    }
}

/// A struct stored as a document. Implemented by the [`record!`](crate::record) macro.
pub trait Record: Default {
    /// Writes every mapped field that survives elision into `document`.
    fn write_fields(&self, document: &mut Document, options: EncodeOptions);

    /// Assigns `value` to the field mapped to attribute `name`, if any.
    fn read_field(&mut self, name: &str, value: &AttributeValue);
}

/// Encoding of a single field type.
pub trait AttributeCodec: Sized {
    /// `None` means the attribute is not written.
    fn encode(&self, options: EncodeOptions) -> Option<AttributeValue>;

    /// `None` means the value does not fit this type and the field keeps its current value.
    fn decode(value: &AttributeValue) -> Option<Self>;
}

/// Types that can appear as elements of a list attribute.
pub trait ListElement: Sized {
    fn encode_element(&self, options: EncodeOptions) -> AttributeValue;

    fn decode_element(value: &AttributeValue) -> Option<Self>;

    /// Decodes the matching DynamoDB set type (`SS`, `NS`), when there is one.
    fn decode_set(_value: &AttributeValue) -> Option<Vec<Self>> {
        None
    }
}

/// Encodes `record` with the default elision flags.
pub fn to_document<R: Record>(record: &R) -> Document {
    to_document_with(record, EncodeOptions::default())
}

pub fn to_document_with<R: Record>(record: &R, options: EncodeOptions) -> Document {
    let mut document = Document::new();
    record.write_fields(&mut document, options);
    document
}

/// Decodes a fresh `R` from `document`.
pub fn from_document<R: Record>(document: &Document) -> R {
    let mut record = R::default();
    for (name, value) in document.iter() {
        record.read_field(name, value);
    }
    record
}

/// Decodes a fresh `R` from a nested map attribute.
pub fn from_map<R: Record>(map: &HashMap<String, AttributeValue>) -> R {
    let mut record = R::default();
    for (name, value) in map {
        record.read_field(name, value);
    }
    record
}

#[doc(hidden)]
pub fn write_field<T: AttributeCodec>(
    document: &mut Document,
    name: &str,
    value: &T,
    options: EncodeOptions,
) {
    if let Some(encoded) = value.encode(options) {
        document.insert(name, encoded);
    }
}

#[doc(hidden)]
pub fn read_field<T: AttributeCodec>(slot: &mut T, value: &AttributeValue) {
    if let Some(decoded) = T::decode(value) {
        *slot = decoded;
    }
}

#[doc(hidden)]
pub fn encode_nested<R: Record>(record: &R, options: EncodeOptions) -> AttributeValue {
    AttributeValue::M(to_document_with(record, options).into_item())
}

#[doc(hidden)]
pub fn decode_nested<R: Record>(value: &AttributeValue) -> Option<R> {
    value.as_m().ok().map(from_map)
}

/// Maps a struct to a document, one `field: "AttributeName"` pair per mapped field.
///
/// Also makes the struct usable as a nested field and as a list element of
/// other records.
#[macro_export]
macro_rules! record {
    ($ty:ident { $($field:ident : $name:literal),* $(,)? }) => {
        impl $crate::dynamodb::codec::Record for $ty {
            fn write_fields(
                &self,
                document: &mut $crate::dynamodb::Document,
                options: $crate::dynamodb::codec::EncodeOptions,
            ) {
                $( $crate::dynamodb::codec::write_field(document, $name, &self.$field, options); )*
            }

            fn read_field(&mut self, name: &str, value: &$crate::dynamodb::codec::AttributeValue) {
                match name {
                    $( $name => $crate::dynamodb::codec::read_field(&mut self.$field, value), )*
                    _ => {}
                }
            }
        }

        impl $crate::dynamodb::codec::AttributeCodec for $ty {
            fn encode(
                &self,
                options: $crate::dynamodb::codec::EncodeOptions,
            ) -> Option<$crate::dynamodb::codec::AttributeValue> {
                Some($crate::dynamodb::codec::encode_nested(self, options))
            }

            fn decode(value: &$crate::dynamodb::codec::AttributeValue) -> Option<Self> {
                $crate::dynamodb::codec::decode_nested(value)
            }
        }

        impl $crate::dynamodb::codec::ListElement for $ty {
            fn encode_element(
                &self,
                options: $crate::dynamodb::codec::EncodeOptions,
            ) -> $crate::dynamodb::codec::AttributeValue {
                $crate::dynamodb::codec::encode_nested(self, options)
            }

            fn decode_element(value: &$crate::dynamodb::codec::AttributeValue) -> Option<Self> {
                $crate::dynamodb::codec::decode_nested(value)
            }
        }
    };
}

/// Stores a fieldless enum as its integer discriminant.
///
/// ```
/// #[derive(Debug, Default, Clone, Copy, PartialEq)]
/// enum Level {
///     #[default]
///     Beginner,
///     Expert,
/// }
///
/// elms_dynamo::attribute_enum!(Level { Beginner = 0, Expert = 1 });
/// ```
#[macro_export]
macro_rules! attribute_enum {
    ($ty:ident { $($variant:ident = $value:literal),* $(,)? }) => {
        impl $crate::dynamodb::codec::AttributeCodec for $ty {
            fn encode(
                &self,
                options: $crate::dynamodb::codec::EncodeOptions,
            ) -> Option<$crate::dynamodb::codec::AttributeValue> {
                let raw: i32 = match self {
                    $( $ty::$variant => $value, )*
                };
                $crate::dynamodb::codec::AttributeCodec::encode(&raw, options)
            }

            fn decode(value: &$crate::dynamodb::codec::AttributeValue) -> Option<Self> {
                let raw = <i32 as $crate::dynamodb::codec::AttributeCodec>::decode(value)?;
                match raw {
                    $( $value => Some($ty::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

macro_rules! numeric_codec {
    ($($ty:ty),*) => {
        $(
            impl AttributeCodec for $ty {
                fn encode(&self, options: EncodeOptions) -> Option<AttributeValue> {
                    if options.omit_zeros && *self == (0 as $ty) {
                        None
                    } else {
                        Some(AttributeValue::N(self.to_string()))
                    }
                }

                fn decode(value: &AttributeValue) -> Option<Self> {
                    value.as_n().ok()?.trim().parse().ok()
                }
            }
        )*
    };
}

numeric_codec!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl AttributeCodec for String {
    fn encode(&self, _options: EncodeOptions) -> Option<AttributeValue> {
        Some(AttributeValue::S(self.clone()))
    }

    fn decode(value: &AttributeValue) -> Option<Self> {
        value.as_s().ok().cloned()
    }
}

impl AttributeCodec for bool {
    fn encode(&self, _options: EncodeOptions) -> Option<AttributeValue> {
        Some(AttributeValue::Bool(*self))
    }

    fn decode(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::N(n) => match n.trim() {
                "0" => Some(false),
                "1" => Some(true),
                _ => None,
            },
            _ => None,
        }
    }
}

impl AttributeCodec for char {
    fn encode(&self, _options: EncodeOptions) -> Option<AttributeValue> {
        Some(AttributeValue::S(self.to_string()))
    }

    fn decode(value: &AttributeValue) -> Option<Self> {
        let s = value.as_s().ok()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl AttributeCodec for DateTime<Utc> {
    fn encode(&self, _options: EncodeOptions) -> Option<AttributeValue> {
        Some(AttributeValue::S(self.to_rfc3339()))
    }

    fn decode(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::S(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            // epoch seconds, as written by TTL-style attributes
            AttributeValue::N(n) => n
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            _ => None,
        }
    }
}

impl<T: AttributeCodec> AttributeCodec for Option<T> {
    fn encode(&self, options: EncodeOptions) -> Option<AttributeValue> {
        match self {
            Some(value) => value.encode(options),
            None if options.omit_nulls => None,
            None => Some(AttributeValue::Null(true)),
        }
    }

    fn decode(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Null(_) => Some(None),
            other => T::decode(other).map(Some),
        }
    }
}

impl<T: ListElement> AttributeCodec for Vec<T> {
    fn encode(&self, options: EncodeOptions) -> Option<AttributeValue> {
        Some(AttributeValue::L(
            self.iter()
                .map(|element| element.encode_element(options))
                .collect(),
        ))
    }

    fn decode(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::L(list) => list.iter().map(T::decode_element).collect(),
            other => T::decode_set(other),
        }
    }
}

impl ListElement for String {
    fn encode_element(&self, _options: EncodeOptions) -> AttributeValue {
        AttributeValue::S(self.clone())
    }

    fn decode_element(value: &AttributeValue) -> Option<Self> {
        value.as_s().ok().cloned()
    }

    fn decode_set(value: &AttributeValue) -> Option<Vec<Self>> {
        value.as_ss().ok().cloned()
    }
}

macro_rules! numeric_list_element {
    ($($ty:ty),*) => {
        $(
            impl ListElement for $ty {
                fn encode_element(&self, _options: EncodeOptions) -> AttributeValue {
                    AttributeValue::N(self.to_string())
                }

                fn decode_element(value: &AttributeValue) -> Option<Self> {
                    value.as_n().ok()?.trim().parse().ok()
                }

                fn decode_set(value: &AttributeValue) -> Option<Vec<Self>> {
                    value
                        .as_ns()
                        .ok()?
                        .iter()
                        .map(|n| n.trim().parse().ok())
                        .collect()
                }
            }
        )*
    };
}

numeric_list_element!(i32, i64);
