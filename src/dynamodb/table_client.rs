use aws_sdk_dynamodb::types::{ReturnValue, TableStatus};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::dynamodb::codec::{from_document, Record};
use crate::dynamodb::store::{Page, QueryRequest, ScanRequest, TableStore, UpdateRequest, WriteRequest};
use crate::dynamodb::{Document, TableConfig};
use crate::error::{RepositoryError, RepositoryResult, StoreFailure};

/// Narrow per-table facade over a [`TableStore`].
///
/// Every item-level call first makes sure the table is ready. Readiness is
/// probed with `DescribeTable` the first time a table is used and remembered
/// for the lifetime of the facade once the table was seen `ACTIVE`. A table
/// that is missing or not active fails the call with
/// [`RepositoryError::TableUnavailable`] before any item call is made, and is
/// probed again next time.
///
/// The cache is never invalidated. A table that becomes unavailable later is
/// reported by the store call itself.
///
/// Store failures are translated into [`RepositoryError`] here, once per call.
pub struct TableClient {
    store: Arc<dyn TableStore>,
    ready_tables: RwLock<HashSet<String>>,
}

impl TableClient {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            ready_tables: RwLock::new(HashSet::new()),
        }
    }

    /// Verifies the credentials by listing tables.
    pub async fn check_auth(&self) -> RepositoryResult<()> {
        match self.store.list_tables().await {
            Ok(_) => {
                info!("Authentication successful");
                Ok(())
            }
            Err(failure) => {
                error!("Authentication failed: {}", failure);
                Err(translate(failure, "ListTables", "*"))
            }
        }
    }

    /// Creates the table described by `config` unless it already exists.
    ///
    /// Returns `true` when a table was created.
    #[instrument(skip(self, config), fields(table = config.table_name()))]
    pub async fn create_table_if_not_exists(&self, config: &TableConfig) -> RepositoryResult<bool> {
        let table = config.table_name();
        let status = self
            .store
            .describe_table(table)
            .await
            .map_err(|failure| translate(failure, "DescribeTable", table))?;

        if status.is_some() {
            info!("Table '{}' exists", table);
            return Ok(false);
        }

        self.store
            .create_table(config)
            .await
            .map_err(|failure| translate(failure, "CreateTable", table))?;
        info!("Table '{}' created", table);
        Ok(true)
    }

    /// Fails with `TableUnavailable` unless `table` exists and is active.
    pub async fn ensure_ready(&self, table: &str) -> RepositoryResult<()> {
        if self.ready_tables.read().await.contains(table) {
            return Ok(());
        }

        debug!("Verifying whether table '{}' exists", table);
        match self.store.describe_table(table).await {
            Ok(Some(TableStatus::Active)) => {
                self.ready_tables.write().await.insert(table.to_string());
                Ok(())
            }
            Ok(status) => {
                warn!(?status, "Table '{}' does not exist or is not active", table);
                Err(RepositoryError::TableUnavailable {
                    table: table.to_string(),
                })
            }
            Err(failure) => Err(translate(failure, "DescribeTable", table)),
        }
    }

    pub async fn put_item(&self, table: &str, item: Document) -> RepositoryResult<()> {
        self.ensure_ready(table).await?;
        self.store
            .put_item(table, item)
            .await
            .map_err(|failure| translate(failure, "PutItem", table))
    }

    pub async fn get_item(
        &self,
        table: &str,
        key: Document,
        consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> RepositoryResult<Option<Document>> {
        self.ensure_ready(table).await?;
        self.store
            .get_item(table, key, consistent_read, attributes_to_get)
            .await
            .map_err(|failure| translate(failure, "GetItem", table))
    }

    pub async fn delete_item(&self, table: &str, key: Document) -> RepositoryResult<()> {
        self.ensure_ready(table).await?;
        self.store
            .delete_item(table, key)
            .await
            .map_err(|failure| translate(failure, "DeleteItem", table))
    }

    /// Attribute-level update by name and value.
    pub async fn update_item(&self, request: UpdateRequest) -> RepositoryResult<Option<Document>> {
        let table = request.table.clone();
        self.ensure_ready(&table).await?;
        self.store
            .update_item(request)
            .await
            .map_err(|failure| translate(failure, "UpdateItem", &table))
    }

    /// Updates the item identified by the key attributes inside `document`.
    ///
    /// The key attributes named by `config` are taken out of `document` and
    /// re-typed to their declared kinds; every remaining attribute is written.
    /// A missing key attribute is an argument error and no call is made.
    pub async fn update_document(
        &self,
        config: &TableConfig,
        mut document: Document,
        return_values: ReturnValue,
    ) -> RepositoryResult<Option<Document>> {
        let mut key = Document::new();
        for key_attribute in config.key_attributes() {
            let value = document.remove(&key_attribute.name).ok_or_else(|| {
                RepositoryError::argument(format!(
                    "key attribute {} is missing from the item",
                    key_attribute.name
                ))
            })?;
            key.insert(key_attribute.name.clone(), key_attribute.kind.coerce(value));
        }

        self.update_item(UpdateRequest {
            table: config.table_name().to_string(),
            key,
            updates: document,
            return_values,
        })
        .await
    }

    pub async fn batch_write(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> RepositoryResult<()> {
        self.ensure_ready(table).await?;
        self.store
            .batch_write(table, requests)
            .await
            .map_err(|failure| translate(failure, "BatchWriteItem", table))
    }

    pub async fn batch_get(
        &self,
        table: &str,
        keys: Vec<Document>,
        consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> RepositoryResult<Vec<Document>> {
        self.ensure_ready(table).await?;
        self.store
            .batch_get(table, keys, consistent_read, attributes_to_get)
            .await
            .map_err(|failure| translate(failure, "BatchGetItem", table))
    }

    /// Scans every page and returns all documents.
    ///
    /// A failure on any page fails the whole call; earlier pages are dropped.
    pub async fn scan_documents(&self, request: ScanRequest) -> RepositoryResult<Vec<Document>> {
        let table = request.table.clone();
        self.drain_pages("Scan", &table, |exclusive_start_key| {
            let store = Arc::clone(&self.store);
            let request = ScanRequest {
                exclusive_start_key,
                ..request.clone()
            };
            async move { store.scan_page(request).await }
        })
        .await
    }

    /// Queries every page and returns all documents.
    pub async fn query_documents(&self, request: QueryRequest) -> RepositoryResult<Vec<Document>> {
        let table = request.table.clone();
        self.drain_pages("Query", &table, |exclusive_start_key| {
            let store = Arc::clone(&self.store);
            let request = QueryRequest {
                exclusive_start_key,
                ..request.clone()
            };
            async move { store.query_page(request).await }
        })
        .await
    }

    /// Calls `fetch` with each page's continuation key until a page comes back
    /// without one.
    async fn drain_pages<F, Fut>(
        &self,
        operation: &'static str,
        table: &str,
        mut fetch: F,
    ) -> RepositoryResult<Vec<Document>>
    where
        F: FnMut(Option<Document>) -> Fut,
        Fut: Future<Output = Result<Page, StoreFailure>>,
    {
        self.ensure_ready(table).await?;

        let mut items = Vec::new();
        let mut pages = 0usize;
        let mut start_key = None;
        loop {
            let page = fetch(start_key.take())
                .await
                .map_err(|failure| translate(failure, operation, table))?;
            pages += 1;
            items.extend(page.items);

            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        debug!(pages, count = items.len(), "{} of '{}' drained", operation, table);
        Ok(items)
    }

    /// [`scan_documents`](Self::scan_documents), decoded into `R`.
    pub async fn scan<R: Record>(&self, request: ScanRequest) -> RepositoryResult<Vec<R>> {
        let documents = self.scan_documents(request).await?;
        Ok(documents.iter().map(from_document).collect())
    }

    /// [`query_documents`](Self::query_documents), decoded into `R`.
    pub async fn query<R: Record>(&self, request: QueryRequest) -> RepositoryResult<Vec<R>> {
        let documents = self.query_documents(request).await?;
        Ok(documents.iter().map(from_document).collect())
    }
}

fn translate(failure: StoreFailure, operation: &str, table: &str) -> RepositoryError {
    debug!(operation, table, code = ?failure.code, "Store call failed");
    RepositoryError::from_store(failure, operation, table)
}
