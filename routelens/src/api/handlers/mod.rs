//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for request deserialization, business logic
//! via the routing gateway and database repositories, and response
//! serialization. Errors are returned as [`crate::errors::Error`], which
//! converts to the appropriate HTTP status code.
//!
//! # Handler Modules
//!
//! - [`prompts`]: Prompt routing, batch processing, and historical seeding
//! - [`dashboard`]: Aggregated dashboard summary retrieval

pub mod dashboard;
pub mod prompts;
