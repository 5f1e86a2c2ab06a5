use aws_sdk_dynamodb::types::ReturnValue;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::dynamodb::codec::{from_document, to_document_with, EncodeOptions, Record};
use crate::dynamodb::store::{QueryRequest, ScanRequest, UpdateRequest, WriteRequest};
use crate::dynamodb::{
    Document, Filter, FilterCondition, KeyAttribute, KeyValue, NoSortKey, TableClient, TableConfig,
};
use crate::error::{RepositoryError, RepositoryResult};

/// Read settings shared by get, batch get, scan and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Defaults to `true`.
    pub consistent_read: bool,
    /// Projection. `None` reads every attribute.
    pub attributes_to_get: Option<Vec<String>>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            consistent_read: true,
            attributes_to_get: None,
        }
    }
}

impl ReadOptions {
    pub fn eventually_consistent() -> Self {
        Self {
            consistent_read: false,
            ..Self::default()
        }
    }

    /// Restricts reads to the named attributes.
    pub fn attributes<N: Into<String>>(mut self, names: impl IntoIterator<Item = N>) -> Self {
        self.attributes_to_get = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Typed access to one table.
///
/// `K` is the partition key type, `I` the stored record and `S` the sort key
/// type ([`NoSortKey`] for partition-key-only tables). The wire type of each key
/// comes from the repository's [`TableConfig`], not from `K` or `S`: a key
/// declared [`KeyKind::Numeric`](crate::dynamodb::KeyKind::Numeric) is sent as
/// a number even if `K` is `String`.
///
/// Every operation logs its start and outcome with the table name. Failures are
/// returned, never retried.
pub struct Repository<K, I, S = NoSortKey> {
    client: Arc<TableClient>,
    config: Arc<TableConfig>,
    encode_options: EncodeOptions,
    _marker: PhantomData<fn() -> (K, I, S)>,
}

impl<K, I, S> Clone for Repository<K, I, S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: Arc::clone(&self.config),
            encode_options: self.encode_options,
            _marker: PhantomData,
        }
    }
}

impl<K, I, S> Repository<K, I, S>
where
    K: KeyValue,
    I: Record + Send + Sync,
    S: KeyValue,
{
    pub fn new(client: Arc<TableClient>, config: TableConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
            encode_options: EncodeOptions::default(),
            _marker: PhantomData,
        }
    }

    /// Replaces the elision flags used when items are written.
    pub fn with_encode_options(mut self, options: EncodeOptions) -> Self {
        self.encode_options = options;
        self
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn table_name(&self) -> &str {
        self.config.table_name()
    }

    /// Encodes `item` with this repository's elision flags. Key attributes are
    /// written with the kinds declared in the table config.
    pub fn encode(&self, item: &I) -> Document {
        let mut document = to_document_with(item, self.encode_options);
        self.config.coerce_keys(&mut document);
        document
    }

    /// Builds the native primary key for `key` and `sort_key`.
    pub fn key(&self, key: &K, sort_key: Option<&S>) -> RepositoryResult<Document> {
        let mut document = Document::new();
        let partition = self.config.partition_key();
        document.insert(partition.name.clone(), partition.kind.attribute(key.key_text()));

        match (self.config.sort_key(), sort_key) {
            (Some(attribute), Some(value)) => {
                document.insert(attribute.name.clone(), attribute.kind.attribute(value.key_text()));
            }
            (None, None) => {}
            (Some(attribute), None) => {
                return Err(RepositoryError::argument(format!(
                    "table {} requires a value for sort key {}",
                    self.table_name(),
                    attribute.name
                )));
            }
            (None, Some(_)) => {
                return Err(RepositoryError::argument(format!(
                    "table {} has no sort key",
                    self.table_name()
                )));
            }
        }
        Ok(document)
    }

    fn keys(&self, keys: &[K], sort_keys: Option<&[S]>) -> RepositoryResult<Vec<Document>> {
        match sort_keys {
            Some(sort_keys) if sort_keys.len() != keys.len() => Err(RepositoryError::argument(
                "sortKeyList not same length as idList",
            )),
            Some(sort_keys) => keys
                .iter()
                .zip(sort_keys)
                .map(|(key, sort_key)| self.key(key, Some(sort_key)))
                .collect(),
            None => keys.iter().map(|key| self.key(key, None)).collect(),
        }
    }

    async fn logged<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = RepositoryResult<T>>,
    ) -> RepositoryResult<T> {
        let table = self.table_name();
        info!(table, "Executing {} operation", operation);
        match call.await {
            Ok(value) => {
                info!(table, "{} operation executed successfully", operation);
                Ok(value)
            }
            Err(err) => {
                error!(
                    "An error occurred while executing the {} operation on the table - {} with the message - {}",
                    operation,
                    table,
                    err
                );
                Err(err)
            }
        }
    }

    #[instrument(skip_all, fields(table = %self.config.table_name()))]
    pub async fn insert(&self, item: &I) -> RepositoryResult<()> {
        let document = self.encode(item);
        self.logged("PutItem", self.client.put_item(self.table_name(), document))
            .await
    }

    /// Strongly consistent read of every attribute.
    pub async fn get(&self, key: &K, sort_key: Option<&S>) -> RepositoryResult<Option<I>> {
        self.get_with(key, sort_key, &ReadOptions::default()).await
    }

    /// Returns `None` when no item has this key.
    pub async fn get_with(
        &self,
        key: &K,
        sort_key: Option<&S>,
        options: &ReadOptions,
    ) -> RepositoryResult<Option<I>> {
        let document = self.get_document(key, sort_key, options).await?;
        Ok(document.as_ref().map(from_document))
    }

    /// Like [`get_with`](Self::get_with) but returns the raw document.
    #[instrument(skip_all, fields(table = %self.config.table_name()))]
    pub async fn get_document(
        &self,
        key: &K,
        sort_key: Option<&S>,
        options: &ReadOptions,
    ) -> RepositoryResult<Option<Document>> {
        self.logged("GetItem", async {
            let key = self.key(key, sort_key)?;
            self.client
                .get_item(
                    self.table_name(),
                    key,
                    options.consistent_read,
                    options.attributes_to_get.clone(),
                )
                .await
        })
        .await
    }

    #[instrument(skip_all, fields(table = %self.config.table_name()))]
    pub async fn delete(&self, key: &K, sort_key: Option<&S>) -> RepositoryResult<()> {
        self.logged("DeleteItem", async {
            let key = self.key(key, sort_key)?;
            self.client.delete_item(self.table_name(), key).await
        })
        .await
    }

    /// Writes every encoded attribute of `item` onto the stored item with the
    /// same key, leaving other attributes untouched.
    ///
    /// Zero and `None` fields are elided by default and therefore not updated.
    /// Returns the attributes selected by `return_values`, decoded; `None` for
    /// [`ReturnValue::None`].
    #[instrument(skip_all, fields(table = %self.config.table_name()))]
    pub async fn partial_update(
        &self,
        item: &I,
        return_values: ReturnValue,
    ) -> RepositoryResult<Option<I>> {
        let document = self.encode(item);
        let updated = self
            .logged(
                "UpdateItem",
                self.client
                    .update_document(&self.config, document, return_values),
            )
            .await?;
        Ok(updated.as_ref().map(from_document))
    }

    /// Submits all puts as one batch write. Not atomic across items.
    #[instrument(skip_all, fields(table = %self.config.table_name(), count = items.len()))]
    pub async fn batch_insert(&self, items: &[I]) -> RepositoryResult<()> {
        let requests = items
            .iter()
            .map(|item| WriteRequest::Put(self.encode(item)))
            .collect();
        self.logged(
            "BatchInsert",
            self.client.batch_write(self.table_name(), requests),
        )
        .await
    }

    /// Deletes by key. `sort_keys`, when given, must pair up with `keys`.
    #[instrument(skip_all, fields(table = %self.config.table_name(), count = keys.len()))]
    pub async fn batch_delete(&self, keys: &[K], sort_keys: Option<&[S]>) -> RepositoryResult<()> {
        self.logged("BatchDelete", async {
            let requests = self
                .keys(keys, sort_keys)?
                .into_iter()
                .map(WriteRequest::Delete)
                .collect();
            self.client.batch_write(self.table_name(), requests).await
        })
        .await
    }

    /// Items come back in the store's order, not necessarily the order of `keys`.
    #[instrument(skip_all, fields(table = %self.config.table_name(), count = keys.len()))]
    pub async fn batch_get(
        &self,
        keys: &[K],
        sort_keys: Option<&[S]>,
        options: &ReadOptions,
    ) -> RepositoryResult<Vec<I>> {
        let documents = self
            .logged("BatchGet", async {
                let keys = self.keys(keys, sort_keys)?;
                self.client
                    .batch_get(
                        self.table_name(),
                        keys,
                        options.consistent_read,
                        options.attributes_to_get.clone(),
                    )
                    .await
            })
            .await?;
        Ok(documents.iter().map(from_document).collect())
    }

    /// Every item matching all `conditions`. An empty slice returns the whole table.
    #[instrument(skip_all, fields(table = %self.config.table_name()))]
    pub async fn scan(
        &self,
        conditions: &[FilterCondition],
        options: &ReadOptions,
    ) -> RepositoryResult<Vec<I>> {
        let request = ScanRequest {
            table: self.table_name().to_string(),
            index_name: self.config.index_name().map(str::to_owned),
            filter: Filter::from_conditions(conditions),
            consistent_read: options.consistent_read,
            attributes_to_get: options.attributes_to_get.clone(),
            exclusive_start_key: None,
        };
        self.logged("Scan", self.client.scan(request)).await
    }

    /// Like [`scan`](Self::scan) but through the index.
    ///
    /// Conditions on the key attributes of the queried index (or the table when
    /// no index is bound) become key conditions; the rest filter the results.
    /// There must be a condition on the partition key.
    #[instrument(skip_all, fields(table = %self.config.table_name()))]
    pub async fn query(
        &self,
        conditions: &[FilterCondition],
        options: &ReadOptions,
    ) -> RepositoryResult<Vec<I>> {
        self.logged("Query", async {
            let (partition, sort) = self.config.query_keys();
            let (key_conditions, filter) = Filter::from_conditions(conditions)
                .split_keys(&partition.name, sort.map(|key: &KeyAttribute| key.name.as_str()));

            if key_conditions.get(&partition.name).is_none() {
                return Err(RepositoryError::argument(format!(
                    "query on {} needs a condition on partition key {}",
                    self.table_name(),
                    partition.name
                )));
            }

            let request = QueryRequest {
                table: self.table_name().to_string(),
                index_name: self.config.index_name().map(str::to_owned),
                key_conditions,
                filter,
                consistent_read: options.consistent_read,
                attributes_to_get: options.attributes_to_get.clone(),
                exclusive_start_key: None,
            };
            self.client.query(request).await
        })
        .await
    }

    /// Sets one string attribute on the item at `key`.
    #[instrument(skip_all, fields(table = %self.config.table_name(), attribute = %attribute))]
    pub async fn update_attribute(
        &self,
        key: &K,
        sort_key: Option<&S>,
        attribute: &str,
        value: &str,
    ) -> RepositoryResult<()> {
        self.logged("UpdateItem", async {
            let request = UpdateRequest {
                table: self.table_name().to_string(),
                key: self.key(key, sort_key)?,
                updates: Document::new().set_string(attribute, value),
                return_values: ReturnValue::None,
            };
            self.client.update_item(request).await.map(|_| ())
        })
        .await
    }
}
