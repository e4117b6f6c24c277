//! Database record models matching table schemas.
//!
//! These structs correspond directly to rows in the SQLite schema and derive
//! `sqlx::FromRow` for query results. They are kept distinct from the API
//! models in [`crate::api::models`] so storage and API representations can
//! evolve independently.

pub mod call_records;
