//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Prompt routing** (`/process_prompt`, `/process_50_questions`): route
//!   prompts through the configured RouteLLM router and record per-call
//!   metrics
//! - **Historical seeding** (`/populate_historical_data`): seed the store
//!   with a fixed sample workload for dashboard demos
//! - **Dashboard** (`/dashboard_data`): aggregated cost and savings summary
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI/Swagger annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
