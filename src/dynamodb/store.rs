use async_trait::async_trait;
use aws_sdk_dynamodb::types::{ReturnValue, TableStatus};

use crate::dynamodb::{Document, Filter, TableConfig};
use crate::error::StoreFailure;

/// One page of a scan or query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Document>,
    /// Continuation token. `None` means the read is complete.
    pub last_evaluated_key: Option<Document>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub table: String,
    pub index_name: Option<String>,
    pub filter: Filter,
    pub consistent_read: bool,
    pub attributes_to_get: Option<Vec<String>>,
    pub exclusive_start_key: Option<Document>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub index_name: Option<String>,
    pub key_conditions: Filter,
    pub filter: Filter,
    pub consistent_read: bool,
    pub attributes_to_get: Option<Vec<String>>,
    pub exclusive_start_key: Option<Document>,
}

/// Attribute-level update: every entry of `updates` is PUT onto the item at `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub table: String,
    pub key: Document,
    pub updates: Document,
    pub return_values: ReturnValue,
}

/// One member of a batch write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Document),
    Delete(Document),
}

/// The native calls the repository layer needs from the store.
///
/// Implementations report raw failures; translation into
/// [`RepositoryError`](crate::error::RepositoryError) happens in
/// [`TableClient`](crate::dynamodb::TableClient).
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Status of `table`, or `None` when it does not exist.
    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, StoreFailure>;

    async fn list_tables(&self) -> Result<Vec<String>, StoreFailure>;

    async fn create_table(&self, config: &TableConfig) -> Result<(), StoreFailure>;

    async fn put_item(&self, table: &str, item: Document) -> Result<(), StoreFailure>;

    async fn get_item(
        &self,
        table: &str,
        key: Document,
        consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> Result<Option<Document>, StoreFailure>;

    async fn delete_item(&self, table: &str, key: Document) -> Result<(), StoreFailure>;

    /// Returns the attributes selected by the request's return-value policy.
    async fn update_item(&self, request: UpdateRequest) -> Result<Option<Document>, StoreFailure>;

    async fn batch_write(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<(), StoreFailure>;

    async fn batch_get(
        &self,
        table: &str,
        keys: Vec<Document>,
        consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> Result<Vec<Document>, StoreFailure>;

    async fn scan_page(&self, request: ScanRequest) -> Result<Page, StoreFailure>;

    async fn query_page(&self, request: QueryRequest) -> Result<Page, StoreFailure>;
}
