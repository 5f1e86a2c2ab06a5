use async_trait::async_trait;
use aws_sdk_dynamodb::{
    types::{
        AttributeAction, AttributeDefinition, AttributeValue, AttributeValueUpdate, BillingMode,
        Condition, DeleteRequest, GlobalSecondaryIndex, KeySchemaElement, KeyType,
        KeysAndAttributes, Projection, ProjectionType, ProvisionedThroughput, PutRequest,
        TableStatus, WriteRequest as NativeWriteRequest,
    },
    Client,
};
use std::collections::HashMap;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::dynamodb::store::{Page, QueryRequest, ScanRequest, TableStore, UpdateRequest, WriteRequest};
use crate::dynamodb::{Document, Filter, KeyAttribute, TableConfig};
use crate::error::StoreFailure;
use crate::utils::drain_with_backoff;

/// Maximum number of requests in one `BatchWriteItem` call.
pub const BATCH_WRITE_LIMIT: usize = 25;
/// Maximum number of keys in one `BatchGetItem` call.
pub const BATCH_GET_LIMIT: usize = 100;

const BATCH_RETRY_DELAY: Duration = Duration::from_millis(50);
const BATCH_MAX_RETRIES: usize = 5;

type Item = HashMap<String, AttributeValue>;

/// [`TableStore`] backed by the AWS SDK.
///
/// Each method is a single native call, except:
///
/// - batch writes are split into groups of [`BATCH_WRITE_LIMIT`] and batch gets
///   into groups of [`BATCH_GET_LIMIT`];
/// - unprocessed items or keys returned by a batch call are resubmitted with a
///   Fibonacci backoff. Anything still unprocessed after that is a failure.
///
/// Scans and queries return one page. Draining pages is the caller's job.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    /// Creates a new `DynamoStore` instance.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    async fn send_batch_write(
        &self,
        table: &str,
        batch: Vec<NativeWriteRequest>,
    ) -> Result<(Vec<()>, Vec<NativeWriteRequest>), StoreFailure> {
        let output = self
            .client
            .batch_write_item()
            .request_items(table, batch)
            .send()
            .await?;

        let leftover = output
            .unprocessed_items
            .and_then(|mut unprocessed| unprocessed.remove(table))
            .unwrap_or_default();
        Ok((Vec::new(), leftover))
    }

    async fn send_batch_get(
        &self,
        table: &str,
        keys: Vec<Item>,
        consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> Result<(Vec<Item>, Vec<Item>), StoreFailure> {
        let request = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .consistent_read(consistent_read)
            .set_attributes_to_get(attributes_to_get)
            .build()?;

        let output = self
            .client
            .batch_get_item()
            .request_items(table, request)
            .send()
            .await?;

        let items = output
            .responses
            .and_then(|mut responses| responses.remove(table))
            .unwrap_or_default();
        let leftover = output
            .unprocessed_keys
            .and_then(|mut unprocessed| unprocessed.remove(table))
            .map(|keys| keys.keys().to_vec())
            .unwrap_or_default();
        Ok((items, leftover))
    }
}

#[async_trait]
impl TableStore for DynamoStore {
    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, StoreFailure> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(output) => Ok(output
                .table()
                .and_then(|description| description.table_status())
                .cloned()),
            Err(err) => {
                let failure = StoreFailure::from(err);
                if failure.is_resource_not_found() {
                    Ok(None)
                } else {
                    Err(failure)
                }
            }
        }
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreFailure> {
        let mut names = Vec::new();
        let mut start = None;

        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start)
                .send()
                .await?;
            names.extend(output.table_names().iter().cloned());

            start = output.last_evaluated_table_name().map(str::to_owned);
            if start.is_none() {
                break;
            }
        }

        Ok(names)
    }

    async fn create_table(&self, config: &TableConfig) -> Result<(), StoreFailure> {
        let mut definitions: Vec<&KeyAttribute> = vec![config.partition_key()];
        definitions.extend(config.sort_key());
        if let Some(index) = config.index() {
            definitions.push(&index.partition_key);
            definitions.extend(index.sort_key.as_ref());
        }
        let mut attribute_definitions: Vec<AttributeDefinition> = Vec::new();
        for key in definitions {
            if attribute_definitions
                .iter()
                .any(|definition| definition.attribute_name() == key.name)
            {
                continue;
            }
            attribute_definitions.push(
                AttributeDefinition::builder()
                    .attribute_name(&key.name)
                    .attribute_type(key.kind.scalar_type())
                    .build()?,
            );
        }

        let throughput = match config.throughput() {
            Some(hint) => Some(
                ProvisionedThroughput::builder()
                    .read_capacity_units(hint.read_capacity_units)
                    .write_capacity_units(hint.write_capacity_units)
                    .build()?,
            ),
            None => None,
        };

        let mut create = self
            .client
            .create_table()
            .table_name(config.table_name())
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema(
                config.partition_key(),
                config.sort_key(),
            )?))
            .billing_mode(if throughput.is_some() {
                BillingMode::Provisioned
            } else {
                BillingMode::PayPerRequest
            })
            .set_provisioned_throughput(throughput.clone());

        if let Some(index) = config.index() {
            create = create.global_secondary_indexes(
                GlobalSecondaryIndex::builder()
                    .index_name(&index.name)
                    .set_key_schema(Some(key_schema(
                        &index.partition_key,
                        index.sort_key.as_ref(),
                    )?))
                    .projection(
                        Projection::builder()
                            .projection_type(ProjectionType::All)
                            .build(),
                    )
                    .set_provisioned_throughput(throughput)
                    .build()?,
            );
        }

        create.send().await?;
        info!("Table '{}' created", config.table_name());
        Ok(())
    }

    async fn put_item(&self, table: &str, item: Document) -> Result<(), StoreFailure> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item.into_item()))
            .send()
            .await?;

        debug!("Item added to '{table}'");
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: Document,
        consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> Result<Option<Document>, StoreFailure> {
        let response = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key.into_item()))
            .consistent_read(consistent_read)
            .set_attributes_to_get(attributes_to_get)
            .send()
            .await?;

        Ok(response.item.map(Document::from))
    }

    async fn delete_item(&self, table: &str, key: Document) -> Result<(), StoreFailure> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key.into_item()))
            .send()
            .await?;

        debug!("Item deleted from '{table}'");
        Ok(())
    }

    async fn update_item(&self, request: UpdateRequest) -> Result<Option<Document>, StoreFailure> {
        let updates: HashMap<String, AttributeValueUpdate> = request
            .updates
            .into_item()
            .into_iter()
            .map(|(name, value)| {
                // an explicit null removes the attribute
                let update = match value {
                    AttributeValue::Null(_) => AttributeValueUpdate::builder()
                        .action(AttributeAction::Delete)
                        .build(),
                    value => AttributeValueUpdate::builder()
                        .value(value)
                        .action(AttributeAction::Put)
                        .build(),
                };
                (name, update)
            })
            .collect();

        let response = self
            .client
            .update_item()
            .table_name(&request.table)
            .set_key(Some(request.key.into_item()))
            .set_attribute_updates(Some(updates))
            .return_values(request.return_values)
            .send()
            .await?;

        debug!("Item updated in '{}'", request.table);
        Ok(response.attributes.map(Document::from))
    }

    async fn batch_write(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<(), StoreFailure> {
        for chunk in requests.chunks(BATCH_WRITE_LIMIT) {
            let writes = chunk
                .iter()
                .map(native_write)
                .collect::<Result<Vec<_>, _>>()?;

            let drained = drain_with_backoff(
                writes,
                move |batch| self.send_batch_write(table, batch),
                BATCH_RETRY_DELAY,
                BATCH_MAX_RETRIES,
            )
            .await?;

            if !drained.leftover.is_empty() {
                return Err(StoreFailure::new(
                    None,
                    format!(
                        "{} write requests were left unprocessed after {} retries",
                        drained.leftover.len(),
                        BATCH_MAX_RETRIES
                    ),
                ));
            }
        }

        debug!("Batch of {} writes applied to '{table}'", requests.len());
        Ok(())
    }

    async fn batch_get(
        &self,
        table: &str,
        keys: Vec<Document>,
        consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> Result<Vec<Document>, StoreFailure> {
        let mut items = Vec::with_capacity(keys.len());
        let keys: Vec<Item> = keys.into_iter().map(Document::into_item).collect();

        for chunk in keys.chunks(BATCH_GET_LIMIT) {
            let projection = attributes_to_get.clone();
            let drained = drain_with_backoff(
                chunk.to_vec(),
                move |pending| {
                    self.send_batch_get(table, pending, consistent_read, projection.clone())
                },
                BATCH_RETRY_DELAY,
                BATCH_MAX_RETRIES,
            )
            .await?;

            if !drained.leftover.is_empty() {
                return Err(StoreFailure::new(
                    None,
                    format!(
                        "{} keys were left unprocessed after {} retries",
                        drained.leftover.len(),
                        BATCH_MAX_RETRIES
                    ),
                ));
            }
            items.extend(drained.produced.into_iter().map(Document::from));
        }

        Ok(items)
    }

    async fn scan_page(&self, request: ScanRequest) -> Result<Page, StoreFailure> {
        let mut scan = self
            .client
            .scan()
            .table_name(&request.table)
            .set_index_name(request.index_name)
            .consistent_read(request.consistent_read)
            .set_attributes_to_get(request.attributes_to_get)
            .set_exclusive_start_key(request.exclusive_start_key.map(Document::into_item));

        if !request.filter.is_empty() {
            scan = scan.set_scan_filter(Some(native_conditions(&request.filter)?));
        }

        let response = scan.send().await?;

        Ok(Page {
            items: response
                .items
                .unwrap_or_default()
                .into_iter()
                .map(Document::from)
                .collect(),
            last_evaluated_key: response.last_evaluated_key.map(Document::from),
        })
    }

    async fn query_page(&self, request: QueryRequest) -> Result<Page, StoreFailure> {
        let mut query = self
            .client
            .query()
            .table_name(&request.table)
            .set_index_name(request.index_name)
            .consistent_read(request.consistent_read)
            .set_attributes_to_get(request.attributes_to_get)
            .set_key_conditions(Some(native_conditions(&request.key_conditions)?))
            .set_exclusive_start_key(request.exclusive_start_key.map(Document::into_item));

        if !request.filter.is_empty() {
            query = query.set_query_filter(Some(native_conditions(&request.filter)?));
        }

        let response = query.send().await?;

        Ok(Page {
            items: response
                .items
                .unwrap_or_default()
                .into_iter()
                .map(Document::from)
                .collect(),
            last_evaluated_key: response.last_evaluated_key.map(Document::from),
        })
    }
}

fn key_schema(
    partition_key: &KeyAttribute,
    sort_key: Option<&KeyAttribute>,
) -> Result<Vec<KeySchemaElement>, StoreFailure> {
    let mut schema = vec![KeySchemaElement::builder()
        .attribute_name(&partition_key.name)
        .key_type(KeyType::Hash)
        .build()?];

    if let Some(sort_key) = sort_key {
        schema.push(
            KeySchemaElement::builder()
                .attribute_name(&sort_key.name)
                .key_type(KeyType::Range)
                .build()?,
        );
    }
    Ok(schema)
}

fn native_write(request: &WriteRequest) -> Result<NativeWriteRequest, StoreFailure> {
    let write = match request {
        WriteRequest::Put(item) => NativeWriteRequest::builder()
            .put_request(
                PutRequest::builder()
                    .set_item(Some(item.clone().into_item()))
                    .build()?,
            )
            .build(),
        WriteRequest::Delete(key) => NativeWriteRequest::builder()
            .delete_request(
                DeleteRequest::builder()
                    .set_key(Some(key.clone().into_item()))
                    .build()?,
            )
            .build(),
    };
    Ok(write)
}

/// Converts a filter into the legacy `Condition` map used by scan and query filters.
fn native_conditions(filter: &Filter) -> Result<HashMap<String, Condition>, StoreFailure> {
    filter
        .iter()
        .map(|(name, clause)| -> Result<(String, Condition), StoreFailure> {
            let values = (!clause.values.is_empty()).then(|| clause.values.clone());
            let condition = Condition::builder()
                .comparison_operator(clause.operator.clone())
                .set_attribute_value_list(values)
                .build()?;
            Ok((name.to_string(), condition))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::{FilterCondition, FilterValue};
    use aws_sdk_dynamodb::types::ComparisonOperator;

    #[test]
    fn test_native_conditions_keep_operands() {
        let filter = Filter::from_conditions(&[
            FilterCondition::equal("UserId", "u1"),
            FilterCondition::entries(
                "Link",
                ComparisonOperator::NotNull,
                Vec::<FilterValue>::new(),
            ),
        ]);
        let conditions = native_conditions(&filter).unwrap();

        let user = &conditions["UserId"];
        assert_eq!(user.comparison_operator(), &ComparisonOperator::Eq);
        assert_eq!(user.attribute_value_list(), &[AttributeValue::S("u1".into())]);

        let link = &conditions["Link"];
        assert_eq!(link.comparison_operator(), &ComparisonOperator::NotNull);
        assert!(link.attribute_value_list().is_empty());
    }

    #[test]
    fn test_key_schema_types() {
        let partition = KeyAttribute::new("UserCourseId", crate::dynamodb::KeyKind::String);
        let sort = KeyAttribute::new("Version", crate::dynamodb::KeyKind::Numeric);
        let schema = key_schema(&partition, Some(&sort)).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].key_type(), &KeyType::Hash);
        assert_eq!(schema[1].attribute_name(), "Version");
    }

    #[test]
    fn test_native_write_shapes() {
        let put = native_write(&WriteRequest::Put(Document::new().set_string("UserId", "u1"))).unwrap();
        assert!(put.put_request().is_some());
        let delete =
            native_write(&WriteRequest::Delete(Document::new().set_string("UserId", "u1"))).unwrap();
        assert!(delete.delete_request().is_some());
    }
}
