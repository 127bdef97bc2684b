//! Shared building blocks for the Braidery dispatch service: configuration,
//! database pool construction, common error types, and the job domain model.

pub mod config;
pub mod db;
pub mod error;
pub mod types;
