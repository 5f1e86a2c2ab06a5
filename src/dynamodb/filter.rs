//! Scan and query selection built from a small condition algebra.
//!
//! Conditions are AND-combined and keyed by attribute name, the same way the
//! native `ScanFilter` / `QueryFilter` maps are. A later condition on an
//! attribute replaces an earlier one.

use aws_sdk_dynamodb::types::{AttributeValue, ComparisonOperator, Condition};
use std::collections::BTreeMap;

/// A typed operand for [`FilterCondition::Entries`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    /// Decimal text, as DynamoDB numbers travel.
    Number(String),
    Bool(bool),
}

impl FilterValue {
    pub fn to_attribute(&self) -> AttributeValue {
        match self {
            FilterValue::String(s) => AttributeValue::S(s.clone()),
            FilterValue::Number(n) => AttributeValue::N(n.clone()),
            FilterValue::Bool(b) => AttributeValue::Bool(*b),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

macro_rules! number_filter_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Number(value.to_string())
                }
            }
        )*
    };
}

number_filter_value!(i32, i64, u32, u64, f64);

/// One selection predicate on a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// A prebuilt native condition.
    Native {
        attribute: String,
        condition: Condition,
    },
    /// An operator with native attribute values as operands.
    Values {
        attribute: String,
        operator: ComparisonOperator,
        values: Vec<AttributeValue>,
    },
    /// An operator with typed entries as operands.
    Entries {
        attribute: String,
        operator: ComparisonOperator,
        entries: Vec<FilterValue>,
    },
}

impl FilterCondition {
    pub fn native(attribute: impl Into<String>, condition: Condition) -> Self {
        FilterCondition::Native {
            attribute: attribute.into(),
            condition,
        }
    }

    pub fn values(
        attribute: impl Into<String>,
        operator: ComparisonOperator,
        values: Vec<AttributeValue>,
    ) -> Self {
        FilterCondition::Values {
            attribute: attribute.into(),
            operator,
            values,
        }
    }

    pub fn entries(
        attribute: impl Into<String>,
        operator: ComparisonOperator,
        entries: Vec<FilterValue>,
    ) -> Self {
        FilterCondition::Entries {
            attribute: attribute.into(),
            operator,
            entries,
        }
    }

    /// `attribute = value`
    pub fn equal(attribute: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::entries(attribute, ComparisonOperator::Eq, vec![value.into()])
    }

    pub fn attribute(&self) -> &str {
        match self {
            FilterCondition::Native { attribute, .. }
            | FilterCondition::Values { attribute, .. }
            | FilterCondition::Entries { attribute, .. } => attribute,
        }
    }
}

/// Operator and operands for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub operator: ComparisonOperator,
    pub values: Vec<AttributeValue>,
}

/// AND-combination of clauses, at most one per attribute. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: BTreeMap<String, FilterClause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the filter in one pass over `conditions`.
    pub fn from_conditions(conditions: &[FilterCondition]) -> Self {
        let mut filter = Filter::new();
        for condition in conditions {
            let clause = match condition {
                FilterCondition::Native { condition, .. } => FilterClause {
                    operator: condition.comparison_operator().clone(),
                    values: condition.attribute_value_list().to_vec(),
                },
                FilterCondition::Values {
                    operator, values, ..
                } => FilterClause {
                    operator: operator.clone(),
                    values: values.clone(),
                },
                FilterCondition::Entries {
                    operator, entries, ..
                } => FilterClause {
                    operator: operator.clone(),
                    values: entries.iter().map(FilterValue::to_attribute).collect(),
                },
            };
            filter.add(condition.attribute(), clause);
        }
        filter
    }

    pub fn add(&mut self, attribute: impl Into<String>, clause: FilterClause) {
        self.clauses.insert(attribute.into(), clause);
    }

    pub fn get(&self, attribute: &str) -> Option<&FilterClause> {
        self.clauses.get(attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterClause)> {
        self.clauses.iter().map(|(name, clause)| (name.as_str(), clause))
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Splits off the clauses on `partition_key` and `sort_key`.
    ///
    /// Returns `(key_conditions, remaining_filter)`.
    pub fn split_keys(self, partition_key: &str, sort_key: Option<&str>) -> (Filter, Filter) {
        let (keys, rest): (BTreeMap<_, _>, BTreeMap<_, _>) =
            self.clauses.into_iter().partition(|(name, _)| {
                name == partition_key || sort_key.is_some_and(|sort| name == sort)
            });
        (Filter { clauses: keys }, Filter { clauses: rest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_conditions_build_empty_filter() {
        assert!(Filter::from_conditions(&[]).is_empty());
    }

    #[test]
    fn test_each_variant_dispatches() {
        let native = Condition::builder()
            .comparison_operator(ComparisonOperator::Gt)
            .attribute_value_list(AttributeValue::N("3".into()))
            .build()
            .unwrap();
        let filter = Filter::from_conditions(&[
            FilterCondition::native("Credits", native),
            FilterCondition::values(
                "Status",
                ComparisonOperator::Eq,
                vec![AttributeValue::S("Active".into())],
            ),
            FilterCondition::entries(
                "Progress",
                ComparisonOperator::Between,
                vec![10.into(), 90.into()],
            ),
        ]);

        assert_eq!(filter.len(), 3);
        let credits = filter.get("Credits").unwrap();
        assert_eq!(credits.operator, ComparisonOperator::Gt);
        assert_eq!(credits.values, vec![AttributeValue::N("3".into())]);
        let progress = filter.get("Progress").unwrap();
        assert_eq!(
            progress.values,
            vec![AttributeValue::N("10".into()), AttributeValue::N("90".into())]
        );
    }

    #[test]
    fn test_order_does_not_change_result() {
        let a = FilterCondition::equal("UserId", "u1");
        let b = FilterCondition::equal("CourseId", "c1");
        assert_eq!(
            Filter::from_conditions(&[a.clone(), b.clone()]),
            Filter::from_conditions(&[b, a])
        );
    }

    #[test]
    fn test_later_condition_on_same_attribute_wins() {
        let filter = Filter::from_conditions(&[
            FilterCondition::equal("Status", "Active"),
            FilterCondition::equal("Status", "Completed"),
        ]);
        assert_eq!(filter.len(), 1);
        assert_eq!(
            filter.get("Status").unwrap().values,
            vec![AttributeValue::S("Completed".into())]
        );
    }

    #[test]
    fn test_split_keys() {
        let filter = Filter::from_conditions(&[
            FilterCondition::equal("UserId", "u1"),
            FilterCondition::equal("DueDate", "2024-01-01"),
            FilterCondition::equal("Status", "Active"),
        ]);
        let (keys, rest) = filter.split_keys("UserId", Some("DueDate"));
        assert_eq!(keys.len(), 2);
        assert!(keys.get("UserId").is_some());
        assert_eq!(rest.len(), 1);
        assert!(rest.get("Status").is_some());
    }
}
