use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::{BTreeMap, HashMap};

/// An ordered map of attribute names to DynamoDB attribute values.
///
/// A `Document` is the in-memory form exchanged with the store: records are
/// encoded into one right before a write and decoded from one right after a read.
///
/// # Absent vs null
///
/// - A key that is not present means "no value written". The codec never writes a
///   key for a value it chose to elide.
/// - An explicit null is `AttributeValue::Null(true)` and is only written when the
///   encoder runs with `omit_nulls` disabled.
///
/// # Example
///
/// ```
/// use elms_dynamo::dynamodb::Document;
///
/// let doc = Document::new()
///     .set_string("UserId", "u1")
///     .set_number("PointOfContact", 3);
/// assert_eq!(doc.get_string("UserId"), Some("u1"));
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) attributes: BTreeMap<String, AttributeValue>,
}

impl Document {
    /// Creates a new empty `Document`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a string attribute.
    pub fn set_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::S(value.into()));
        self
    }

    /// Sets a number attribute. DynamoDB numbers travel as decimal strings.
    pub fn set_number(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::N(value.to_string()));
        self
    }

    /// Sets a raw attribute value, replacing any previous value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        self.attributes.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Gets the value of an attribute as a string.
    ///
    /// Returns `None` if the attribute doesn't exist or is not a string.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_s().ok())
            .map(String::as_str)
    }

    /// Gets the value of an attribute as a number (f64).
    ///
    /// Returns `None` if the attribute doesn't exist, is not a number, or can't be parsed as f64.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    /// Attribute names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Renders the document as plain JSON, dropping the DynamoDB type tags.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_dynamo::Error> {
        serde_dynamo::from_item(self.clone().into_item())
    }

    /// Converts into the map shape the SDK request builders expect.
    pub fn into_item(self) -> HashMap<String, AttributeValue> {
        self.attributes.into_iter().collect()
    }
}

impl From<HashMap<String, AttributeValue>> for Document {
    fn from(item: HashMap<String, AttributeValue>) -> Self {
        Self {
            attributes: item.into_iter().collect(),
        }
    }
}

impl From<Document> for HashMap<String, AttributeValue> {
    fn from(document: Document) -> Self {
        document.into_item()
    }
}

impl FromIterator<(String, AttributeValue)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}
