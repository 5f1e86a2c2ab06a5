//! In-memory [`TableStore`] and a `mockall` mock for unit tests.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ComparisonOperator, ReturnValue, TableStatus};
use mockall::mock;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::dynamodb::store::{Page, QueryRequest, ScanRequest, UpdateRequest, WriteRequest};
use crate::dynamodb::{Document, Filter, FilterClause, TableConfig, TableStore};
use crate::error::{StoreFailure, INVALID_SECURITY_TOKEN};

const OFFSET_ATTRIBUTE: &str = "Offset";

mock! {
    pub Store {}

    #[async_trait]
    impl TableStore for Store {
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
        async fn update_item(&self, request: UpdateRequest) -> Result<Option<Document>, StoreFailure>;
        async fn batch_write(&self, table: &str, requests: Vec<WriteRequest>) -> Result<(), StoreFailure>;
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
}

/// The failure DynamoDB reports for a bad or expired key.
pub fn invalid_token() -> StoreFailure {
    StoreFailure::new(Some("UnrecognizedClientException"), INVALID_SECURITY_TOKEN)
}

struct MemoryTable {
    status: TableStatus,
    partition_key: String,
    sort_key: Option<String>,
    items: Vec<Document>,
}

impl MemoryTable {
    fn key_of(&self, document: &Document) -> Vec<Option<AttributeValue>> {
        std::iter::once(&self.partition_key)
            .chain(self.sort_key.as_ref())
            .map(|name| document.get(name).cloned())
            .collect()
    }

    fn position(&self, key: &Document) -> Option<usize> {
        let wanted = self.key_of(key);
        self.items.iter().position(|item| self.key_of(item) == wanted)
    }

    fn put(&mut self, item: Document) {
        match self.position(&item) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    fn delete(&mut self, key: &Document) {
        if let Some(index) = self.position(key) {
            self.items.remove(index);
        }
    }
}

/// A store that keeps tables in memory.
///
/// Every call is recorded by its DynamoDB operation name. Scans and queries
/// return at most `page_size` items per page, counted before filtering, and
/// continue with an offset token.
pub struct MemoryStore {
    tables: Mutex<BTreeMap<String, MemoryTable>>,
    failures: Mutex<BTreeMap<&'static str, StoreFailure>>,
    calls: Mutex<Vec<&'static str>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            page_size: usize::MAX,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Adds an active table.
    pub fn add_table(self, table: &str, partition_key: &str, sort_key: Option<&str>) -> Self {
        self.add_table_with_status(table, partition_key, sort_key, TableStatus::Active)
    }

    pub fn add_table_with_status(
        self,
        table: &str,
        partition_key: &str,
        sort_key: Option<&str>,
        status: TableStatus,
    ) -> Self {
        self.tables.lock().unwrap().insert(
            table.to_string(),
            MemoryTable {
                status,
                partition_key: partition_key.to_string(),
                sort_key: sort_key.map(str::to_owned),
                items: Vec::new(),
            },
        );
        self
    }

    /// Makes every call of `operation` fail with `failure`.
    pub fn fail_on(self, operation: &'static str, failure: StoreFailure) -> Self {
        self.failures.lock().unwrap().insert(operation, failure);
        self
    }

    pub fn items(&self, table: &str) -> Vec<Document> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|table| table.items.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == operation)
            .count()
    }

    fn record(&self, operation: &'static str) -> Result<(), StoreFailure> {
        self.calls.lock().unwrap().push(operation);
        match self.failures.lock().unwrap().get(operation) {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn with_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut MemoryTable) -> T,
    ) -> Result<T, StoreFailure> {
        let mut tables = self.tables.lock().unwrap();
        match tables.get_mut(table) {
            Some(table) => Ok(f(table)),
            None => Err(StoreFailure::new(
                Some(crate::error::RESOURCE_NOT_FOUND),
                "Requested resource not found",
            )),
        }
    }

    fn page(
        &self,
        table: &str,
        start: Option<&Document>,
        accept: impl Fn(&Document) -> bool,
        attributes_to_get: Option<&[String]>,
    ) -> Result<Page, StoreFailure> {
        let offset = start
            .and_then(|key| key.get_number(OFFSET_ATTRIBUTE))
            .map(|n| n as usize)
            .unwrap_or(0);
        let page_size = self.page_size;

        self.with_table(table, |table| {
            let end = offset.saturating_add(page_size).min(table.items.len());
            let items = table.items[offset.min(end)..end]
                .iter()
                .filter(|item| accept(*item))
                .map(|item| project(item, attributes_to_get))
                .collect();
            let last_evaluated_key =
                (end < table.items.len()).then(|| Document::new().set_number(OFFSET_ATTRIBUTE, end));
            Page {
                items,
                last_evaluated_key,
            }
        })
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, StoreFailure> {
        self.record("DescribeTable")?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .map(|table| table.status.clone()))
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreFailure> {
        self.record("ListTables")?;
        Ok(self.tables.lock().unwrap().keys().cloned().collect())
    }

    async fn create_table(&self, config: &TableConfig) -> Result<(), StoreFailure> {
        self.record("CreateTable")?;
        self.tables.lock().unwrap().insert(
            config.table_name().to_string(),
            MemoryTable {
                status: TableStatus::Active,
                partition_key: config.partition_key().name.clone(),
                sort_key: config.sort_key().map(|key| key.name.clone()),
                items: Vec::new(),
            },
        );
        Ok(())
    }

    async fn put_item(&self, table: &str, item: Document) -> Result<(), StoreFailure> {
        self.record("PutItem")?;
        self.with_table(table, |table| table.put(item))
    }

    async fn get_item(
        &self,
        table: &str,
        key: Document,
        _consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> Result<Option<Document>, StoreFailure> {
        self.record("GetItem")?;
        self.with_table(table, |table| {
            table
                .position(&key)
                .map(|index| project(&table.items[index], attributes_to_get.as_deref()))
        })
    }

    async fn delete_item(&self, table: &str, key: Document) -> Result<(), StoreFailure> {
        self.record("DeleteItem")?;
        self.with_table(table, |table| table.delete(&key))
    }

    async fn update_item(&self, request: UpdateRequest) -> Result<Option<Document>, StoreFailure> {
        self.record("UpdateItem")?;
        self.with_table(&request.table, |table| {
            let old = table.position(&request.key).map(|index| table.items[index].clone());
            let mut item = old.clone().unwrap_or_else(|| request.key.clone());
            for (name, value) in request.updates.iter() {
                match value {
                    AttributeValue::Null(_) => item.remove(name),
                    other => item.insert(name, other.clone()),
                };
            }
            table.put(item.clone());

            match request.return_values {
                ReturnValue::AllNew => Some(item),
                ReturnValue::AllOld => old,
                ReturnValue::UpdatedNew => Some(request.updates.clone()),
                _ => None,
            }
        })
    }

    async fn batch_write(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<(), StoreFailure> {
        self.record("BatchWriteItem")?;
        self.with_table(table, |table| {
            for request in requests {
                match request {
                    WriteRequest::Put(item) => table.put(item),
                    WriteRequest::Delete(key) => table.delete(&key),
                }
            }
        })
    }

    async fn batch_get(
        &self,
        table: &str,
        keys: Vec<Document>,
        _consistent_read: bool,
        attributes_to_get: Option<Vec<String>>,
    ) -> Result<Vec<Document>, StoreFailure> {
        self.record("BatchGetItem")?;
        self.with_table(table, |table| {
            keys.iter()
                .filter_map(|key| table.position(key))
                .map(|index| project(&table.items[index], attributes_to_get.as_deref()))
                .collect()
        })
    }

    async fn scan_page(&self, request: ScanRequest) -> Result<Page, StoreFailure> {
        self.record("Scan")?;
        self.page(
            &request.table,
            request.exclusive_start_key.as_ref(),
            |item| matches(item, &request.filter),
            request.attributes_to_get.as_deref(),
        )
    }

    async fn query_page(&self, request: QueryRequest) -> Result<Page, StoreFailure> {
        self.record("Query")?;
        self.page(
            &request.table,
            request.exclusive_start_key.as_ref(),
            |item| matches(item, &request.key_conditions) && matches(item, &request.filter),
            request.attributes_to_get.as_deref(),
        )
    }
}

fn project(item: &Document, attributes_to_get: Option<&[String]>) -> Document {
    match attributes_to_get {
        Some(names) => item
            .iter()
            .filter(|(name, _)| names.iter().any(|wanted| wanted.as_str() == *name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
        None => item.clone(),
    }
}

/// True when `item` satisfies every clause of `filter`.
pub fn matches(item: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(name, clause)| clause_matches(item.get(name), clause))
}

fn clause_matches(value: Option<&AttributeValue>, clause: &FilterClause) -> bool {
    let operands = &clause.values;
    let compare_first = |value: &AttributeValue| operands.first().and_then(|o| compare(value, o));

    match (&clause.operator, value) {
        (ComparisonOperator::Null, value) => value.is_none(),
        (ComparisonOperator::NotNull, value) => value.is_some(),
        (_, None) => false,
        (ComparisonOperator::Eq, Some(v)) => compare_first(v) == Some(Ordering::Equal),
        (ComparisonOperator::Ne, Some(v)) => compare_first(v) != Some(Ordering::Equal),
        (ComparisonOperator::Lt, Some(v)) => compare_first(v) == Some(Ordering::Less),
        (ComparisonOperator::Le, Some(v)) => {
            matches!(compare_first(v), Some(Ordering::Less | Ordering::Equal))
        }
        (ComparisonOperator::Gt, Some(v)) => compare_first(v) == Some(Ordering::Greater),
        (ComparisonOperator::Ge, Some(v)) => {
            matches!(compare_first(v), Some(Ordering::Greater | Ordering::Equal))
        }
        (ComparisonOperator::Between, Some(v)) => match operands.as_slice() {
            [low, high] => {
                matches!(compare(v, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(v, high), Some(Ordering::Less | Ordering::Equal))
            }
            _ => false,
        },
        (ComparisonOperator::In, Some(v)) => operands
            .iter()
            .any(|o| compare(v, o) == Some(Ordering::Equal)),
        (ComparisonOperator::BeginsWith, Some(AttributeValue::S(s))) => {
            matches!(operands.first(), Some(AttributeValue::S(prefix)) if s.starts_with(prefix.as_str()))
        }
        (ComparisonOperator::Contains, Some(v)) => operands.first().is_some_and(|o| contains(v, o)),
        (ComparisonOperator::NotContains, Some(v)) => {
            operands.first().is_some_and(|o| !contains(v, o))
        }
        _ => false,
    }
}

fn compare(value: &AttributeValue, operand: &AttributeValue) -> Option<Ordering> {
    match (value, operand) {
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            let a: f64 = a.parse().ok()?;
            let b: f64 = b.parse().ok()?;
            a.partial_cmp(&b)
        }
        (AttributeValue::Bool(a), AttributeValue::Bool(b)) => (a == b).then_some(Ordering::Equal),
        _ => None,
    }
}

fn contains(value: &AttributeValue, operand: &AttributeValue) -> bool {
    match (value, operand) {
        (AttributeValue::S(s), AttributeValue::S(part)) => s.contains(part.as_str()),
        (AttributeValue::Ss(set), AttributeValue::S(member)) => set.contains(member),
        (AttributeValue::L(list), member) => list
            .iter()
            .any(|element| compare(element, member) == Some(Ordering::Equal)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::FilterCondition;

    fn item(id: &str, credits: i32) -> Document {
        Document::new()
            .set_string("UserCourseId", id)
            .set_number("Credits", credits)
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let filter = Filter::from_conditions(&[FilterCondition::entries(
            "Credits",
            ComparisonOperator::Gt,
            vec![9.into()],
        )]);
        assert!(matches(&item("a", 10), &filter));
        assert!(!matches(&item("b", 9), &filter));
    }

    #[test]
    fn test_null_and_between() {
        let missing = Filter::from_conditions(&[FilterCondition::values(
            "Status",
            ComparisonOperator::Null,
            vec![],
        )]);
        assert!(matches(&item("a", 1), &missing));

        let between = Filter::from_conditions(&[FilterCondition::entries(
            "Credits",
            ComparisonOperator::Between,
            vec![2.into(), 4.into()],
        )]);
        assert!(matches(&item("a", 4), &between));
        assert!(!matches(&item("b", 5), &between));
    }
}
