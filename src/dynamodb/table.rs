use crate::dynamodb::{Document, KeyKind};

/// Key attribute name and wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub kind: KeyKind,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A global or local secondary index that scans and queries should target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
}

/// Provisioned throughput used when the table is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// Binding of a repository to one DynamoDB table.
///
/// A `TableConfig` is immutable once built. Each repository owns its own
/// instance, so two repositories can never disturb each other's key encoding.
///
/// # Example
///
/// ```
/// use elms_dynamo::dynamodb::{KeyKind, TableConfig};
///
/// let config = TableConfig::builder("UserCourses", "UserCourseId", KeyKind::String)
///     .sort_key("CourseId", KeyKind::String)
///     .build();
///
/// assert_eq!(config.table_name(), "UserCourses");
/// assert_eq!(config.sort_key().map(|k| k.name.as_str()), Some("CourseId"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    table_name: String,
    partition_key: KeyAttribute,
    sort_key: Option<KeyAttribute>,
    index: Option<SecondaryIndex>,
    throughput: Option<Throughput>,
}

impl TableConfig {
    pub fn builder(
        table_name: impl Into<String>,
        key_name: impl Into<String>,
        key_kind: KeyKind,
    ) -> TableConfigBuilder {
        TableConfigBuilder {
            config: TableConfig {
                table_name: table_name.into(),
                partition_key: KeyAttribute::new(key_name, key_kind),
                sort_key: None,
                index: None,
                throughput: None,
            },
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn partition_key(&self) -> &KeyAttribute {
        &self.partition_key
    }

    pub fn sort_key(&self) -> Option<&KeyAttribute> {
        self.sort_key.as_ref()
    }

    pub fn index(&self) -> Option<&SecondaryIndex> {
        self.index.as_ref()
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index.as_ref().map(|index| index.name.as_str())
    }

    pub fn throughput(&self) -> Option<Throughput> {
        self.throughput
    }

    /// Key attributes of whatever scans and queries read from: the secondary
    /// index when one is bound, the table otherwise.
    pub fn query_keys(&self) -> (&KeyAttribute, Option<&KeyAttribute>) {
        match &self.index {
            Some(index) => (&index.partition_key, index.sort_key.as_ref()),
            None => (&self.partition_key, self.sort_key.as_ref()),
        }
    }

    /// The partition key followed by the sort key, if any.
    pub fn key_attributes(&self) -> impl Iterator<Item = &KeyAttribute> {
        std::iter::once(&self.partition_key).chain(self.sort_key.as_ref())
    }

    /// Re-types the table's key attributes in `document` to their declared kinds.
    pub fn coerce_keys(&self, document: &mut Document) {
        for key in self.key_attributes() {
            if let Some(value) = document.remove(&key.name) {
                document.insert(key.name.clone(), key.kind.coerce(value));
            }
        }
    }
}

pub struct TableConfigBuilder {
    config: TableConfig,
}

impl TableConfigBuilder {
    pub fn sort_key(mut self, name: impl Into<String>, kind: KeyKind) -> Self {
        self.config.sort_key = Some(KeyAttribute::new(name, kind));
        self
    }

    /// Targets `index` for scans and queries.
    pub fn index(mut self, index: SecondaryIndex) -> Self {
        self.config.index = Some(index);
        self
    }

    pub fn throughput(mut self, read_capacity_units: i64, write_capacity_units: i64) -> Self {
        self.config.throughput = Some(Throughput {
            read_capacity_units,
            write_capacity_units,
        });
        self
    }

    pub fn build(self) -> TableConfig {
        self.config
    }
}
