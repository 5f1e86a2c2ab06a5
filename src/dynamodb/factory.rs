use std::sync::Arc;

use crate::dynamodb::codec::Record;
use crate::dynamodb::{DynamoStore, KeyValue, NoSortKey, Repository, TableClient, TableConfig, TableStore};

/// Hands out repositories that share one store connection and one [`TableClient`].
///
/// Every repository gets its own freshly built [`TableConfig`].
#[derive(Clone)]
pub struct RepositoryFactory {
    client: Arc<TableClient>,
}

impl RepositoryFactory {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_store(Arc::new(DynamoStore::new(sdk_config)))
    }

    pub fn from_store(store: Arc<dyn TableStore>) -> Self {
        Self {
            client: Arc::new(TableClient::new(store)),
        }
    }

    pub fn client(&self) -> &Arc<TableClient> {
        &self.client
    }

    /// Repository for a table keyed by `key_name` only.
    pub fn get<K, I>(&self, table_name: &str, key_name: &str) -> Repository<K, I>
    where
        K: KeyValue,
        I: Record + Send + Sync,
    {
        self.get_with_config(TableConfig::builder(table_name, key_name, K::KIND).build())
    }

    /// Repository for a table keyed by `key_name` and `sort_key_name`.
    pub fn get_with_sort_key<K, S, I>(
        &self,
        table_name: &str,
        key_name: &str,
        sort_key_name: &str,
    ) -> Repository<K, I, S>
    where
        K: KeyValue,
        S: KeyValue,
        I: Record + Send + Sync,
    {
        self.get_with_config(
            TableConfig::builder(table_name, key_name, K::KIND)
                .sort_key(sort_key_name, S::KIND)
                .build(),
        )
    }

    /// Repository bound to a prepared config, e.g. one naming a secondary index.
    pub fn get_with_config<K, I, S>(&self, config: TableConfig) -> Repository<K, I, S>
    where
        K: KeyValue,
        S: KeyValue,
        I: Record + Send + Sync,
    {
        Repository::new(Arc::clone(&self.client), config)
    }
}

/// Shorthand for a partition-key-only repository type.
pub type SimpleRepository<K, I> = Repository<K, I, NoSortKey>;
