//! Database repository for call records.

use chrono::Datelike;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::db::{
    errors::Result,
    models::call_records::{CallRecord, CallRecordCreateDBRequest},
};

pub struct CallRecords<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> CallRecords<'c> {
    /// Create a new CallRecords repository instance
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Insert one call record. The denormalized `month`/`year` columns are
    /// derived from the request timestamp here so callers cannot desync them.
    #[instrument(skip(self, request), fields(selected_model = %request.selected_model), err)]
    pub async fn create(&mut self, request: &CallRecordCreateDBRequest) -> Result<CallRecord> {
        let month = request.timestamp.month() as i64;
        let year = request.timestamp.year() as i64;

        let record = sqlx::query_as::<_, CallRecord>(
            r#"
            INSERT INTO call_records (
                question, selected_model, latency, cost, input_tokens,
                output_tokens, cost_gpt4, timestamp, month, year, is_reference
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, question, selected_model, latency, cost, input_tokens,
                      output_tokens, cost_gpt4, timestamp, month, year, is_reference
            "#,
        )
        .bind(&request.question)
        .bind(&request.selected_model)
        .bind(request.latency)
        .bind(request.cost)
        .bind(request.input_tokens)
        .bind(request.output_tokens)
        .bind(request.cost_gpt4)
        .bind(request.timestamp)
        .bind(month)
        .bind(year)
        .bind(request.is_reference)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record)
    }

    /// Total number of stored call records
    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM call_records")
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }

    /// List the most recently inserted records, newest first
    #[instrument(skip(self), err)]
    pub async fn list_recent(&mut self, limit: i64) -> Result<Vec<CallRecord>> {
        let records = sqlx::query_as::<_, CallRecord>(
            r#"
            SELECT id, question, selected_model, latency, cost, input_tokens,
                   output_tokens, cost_gpt4, timestamp, month, year, is_reference
            FROM call_records
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(records)
    }
}
