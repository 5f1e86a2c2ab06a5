//! # DynamoDB Module
//!
//! Typed repositories over Amazon DynamoDB tables.
//!
//! ## Components
//!
//! - [`codec`]: maps application records to and from [`Document`]s.
//! - [`Filter`] / [`FilterCondition`]: scan and query selection.
//! - [`TableStore`]: the native calls the layer needs. [`DynamoStore`] implements
//!   it over the AWS SDK.
//! - [`TableClient`]: per-table readiness check, pagination and error translation.
//! - [`Repository`]: typed CRUD, batch, scan and query for one table.
//! - [`RepositoryFactory`]: hands out repositories sharing one connection.
//!
//! ## Example
//!
//! ```no_run
//! use elms_dynamo::dynamodb::{FilterCondition, ReadOptions, RepositoryFactory};
//!
//! #[derive(Debug, Default)]
//! struct Course {
//!     course_id: String,
//!     course_name: String,
//!     student_count: i32,
//! }
//!
//! elms_dynamo::record!(Course {
//!     course_id: "CourseId",
//!     course_name: "CourseName",
//!     student_count: "StudentCount",
//! });
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sdk_config = aws_config::load_from_env().await;
//!     let factory = RepositoryFactory::new(&sdk_config);
//!     let courses = factory.get::<String, Course>("Courses", "CourseId");
//!
//!     courses
//!         .insert(&Course {
//!             course_id: "c1".into(),
//!             course_name: "Rust".into(),
//!             student_count: 3,
//!         })
//!         .await?;
//!
//!     let popular = courses
//!         .scan(
//!             &[FilterCondition::entries(
//!                 "StudentCount",
//!                 aws_sdk_dynamodb::types::ComparisonOperator::Gt,
//!                 vec![2.into()],
//!             )],
//!             &ReadOptions::default(),
//!         )
//!         .await?;
//!     println!("{} popular courses", popular.len());
//!     Ok(())
//! }
//! ```

mod client;
pub mod codec;
mod document;
mod factory;
mod filter;
mod repository;
mod schema;
pub mod store;
mod table;
mod table_client;

pub use client::{DynamoStore, BATCH_GET_LIMIT, BATCH_WRITE_LIMIT};
pub use document::Document;
pub use factory::{RepositoryFactory, SimpleRepository};
pub use filter::{Filter, FilterClause, FilterCondition, FilterValue};
pub use repository::{ReadOptions, Repository};
pub use schema::{KeyKind, KeyValue, NoSortKey};
pub use store::TableStore;
pub use table::{KeyAttribute, SecondaryIndex, TableConfig, TableConfigBuilder, Throughput};
pub use table_client::TableClient;
