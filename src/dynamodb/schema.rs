use aws_sdk_dynamodb::types::{AttributeValue, ScalarAttributeType};

/// Wire type of a key attribute.
///
/// DynamoDB keys are scalar: the repository only ever distinguishes strings
/// from everything else. Any key that is not a string is written as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Written as an `S` attribute.
    String,
    /// Written as an `N` attribute.
    Numeric,
}

impl KeyKind {
    /// Builds the native attribute for a key whose textual form is `text`.
    pub fn attribute(self, text: impl Into<String>) -> AttributeValue {
        match self {
            KeyKind::String => AttributeValue::S(text.into()),
            KeyKind::Numeric => AttributeValue::N(text.into()),
        }
    }

    /// Re-types a scalar key attribute as this kind. Other attribute types are
    /// returned unchanged.
    pub fn coerce(self, value: AttributeValue) -> AttributeValue {
        match value {
            AttributeValue::S(text) | AttributeValue::N(text) => self.attribute(text),
            other => other,
        }
    }

    /// Scalar type used in attribute definitions when creating a table.
    pub fn scalar_type(self) -> ScalarAttributeType {
        match self {
            KeyKind::String => ScalarAttributeType::S,
            KeyKind::Numeric => ScalarAttributeType::N,
        }
    }
}

/// A Rust type usable as a partition or sort key.
pub trait KeyValue: Send + Sync {
    const KIND: KeyKind;

    /// Textual form sent on the wire.
    fn key_text(&self) -> String;

    fn to_attribute(&self) -> AttributeValue {
        Self::KIND.attribute(self.key_text())
    }
}

impl KeyValue for String {
    const KIND: KeyKind = KeyKind::String;

    fn key_text(&self) -> String {
        self.clone()
    }
}

impl KeyValue for &str {
    const KIND: KeyKind = KeyKind::String;

    fn key_text(&self) -> String {
        (*self).to_string()
    }
}

macro_rules! numeric_key {
    ($($ty:ty),*) => {
        $(
            impl KeyValue for $ty {
                const KIND: KeyKind = KeyKind::Numeric;

                fn key_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

numeric_key!(i32, i64, u32, u64);

/// Sort-key parameter of a repository bound to a partition-key-only table.
///
/// Has no values, so a sort key can never be passed to such a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSortKey {}

impl KeyValue for NoSortKey {
    const KIND: KeyKind = KeyKind::String;

    fn key_text(&self) -> String {
        match *self {}
    }
}
