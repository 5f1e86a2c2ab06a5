//! Typed DynamoDB repositories and the learning-management services built on them.
//!
//! - [`dynamodb`]: record codec, filters, table facade and the generic repository.
//! - [`models`]: `User`, `Course` and `UserCourse` records.
//! - [`services`]: user, course and enrollment operations.
//! - [`config`]: `LMS_*` environment configuration.

pub mod config;
pub mod dynamodb;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
mod utils;

#[cfg(test)]
mod testing;
