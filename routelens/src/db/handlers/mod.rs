//! Repository implementations for database access.
//!
//! Repositories wrap a SQLx connection or transaction, handle query
//! construction and parameter binding, and return domain models from
//! [`crate::db::models`]. Aggregation queries for the dashboard live in
//! [`dashboard`] and operate on the pool directly since they are read-only.

pub mod call_records;
pub mod dashboard;

pub use call_records::CallRecords;
