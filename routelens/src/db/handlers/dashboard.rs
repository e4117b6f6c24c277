//! Read-only aggregation queries backing the dashboard summary.
//!
//! Each aggregate runs as its own query against the pool. The windowed
//! series (monthly and daily) come back sparse from SQL and are gap-filled
//! here so the response always carries a fixed-length, newest-first list.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

use crate::{
    api::models::{DailyCallEntry, DailyCostEntry, DashboardResponse, MonthlyImpact},
    db::errors::{DbError, Result},
};

/// Number of calendar months in the cost-optimization window.
const MONTHLY_WINDOW: usize = 5;
/// Number of calendar days, including today, in the daily windows.
const DAILY_WINDOW: i64 = 15;

#[derive(Debug, FromRow)]
struct TotalsRow {
    total_calls: i64,
    total_cost: f64,
    total_cost_gpt4: f64,
    total_tokens: i64,
}

#[derive(Debug, FromRow)]
struct ProviderSplitRow {
    is_reference: bool,
    calls: i64,
    cost: f64,
    tokens: i64,
}

#[derive(Debug, FromRow)]
struct MonthlyRow {
    month: i64,
    year: i64,
    potential_cost: f64,
    actual_cost: f64,
}

#[derive(Debug, FromRow)]
struct DailyCostRow {
    day: String,
    is_reference: bool,
    cost: f64,
}

#[derive(Debug, FromRow)]
struct DailyCallRow {
    day: String,
    is_reference: bool,
    calls: i64,
}

/// Percentage of `part` in `total`, exactly 0 when `total` is 0 so an empty
/// table never produces NaN.
fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

fn parse_day(day: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| DbError::Other(anyhow::anyhow!("unparseable day key {day:?}: {e}")))
}

async fn totals(db: &SqlitePool) -> Result<TotalsRow> {
    let row = sqlx::query_as::<_, TotalsRow>(
        r#"
        SELECT COUNT(*)                                    AS total_calls,
               COALESCE(SUM(cost), 0.0)                      AS total_cost,
               COALESCE(SUM(cost_gpt4), 0.0)                 AS total_cost_gpt4,
               COALESCE(SUM(input_tokens + output_tokens), 0) AS total_tokens
        FROM call_records
        "#,
    )
    .fetch_one(db)
    .await?;

    Ok(row)
}

async fn provider_split(db: &SqlitePool) -> Result<Vec<ProviderSplitRow>> {
    let rows = sqlx::query_as::<_, ProviderSplitRow>(
        r#"
        SELECT is_reference,
               COUNT(*)                                    AS calls,
               COALESCE(SUM(cost), 0.0)                      AS cost,
               COALESCE(SUM(input_tokens + output_tokens), 0) AS tokens
        FROM call_records
        GROUP BY is_reference
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Actual vs counterfactual cost for the [`MONTHLY_WINDOW`] most recent
/// calendar months, most recent first. Months without records appear as
/// zero entries.
async fn monthly_impact(db: &SqlitePool, now: DateTime<Utc>) -> Result<Vec<MonthlyImpact>> {
    let rows = sqlx::query_as::<_, MonthlyRow>(
        r#"
        SELECT month,
               year,
               COALESCE(SUM(cost_gpt4), 0.0) AS potential_cost,
               COALESCE(SUM(cost), 0.0)      AS actual_cost
        FROM call_records
        GROUP BY year, month
        "#,
    )
    .fetch_all(db)
    .await?;

    let by_month: HashMap<(i64, i64), (f64, f64)> = rows
        .into_iter()
        .map(|r| ((r.year, r.month), (r.potential_cost, r.actual_cost)))
        .collect();

    let mut entries = Vec::with_capacity(MONTHLY_WINDOW);
    let mut month = now.month() as i64;
    let mut year = now.year() as i64;
    for _ in 0..MONTHLY_WINDOW {
        let (potential_cost, actual_cost) =
            by_month.get(&(year, month)).copied().unwrap_or((0.0, 0.0));
        entries.push(MonthlyImpact {
            month: month as u32,
            year: year as i32,
            potential_cost,
            actual_cost,
        });
        month -= 1;
        if month == 0 {
            month = 12;
            year -= 1;
        }
    }

    Ok(entries)
}

/// Per-day reference/alternate cost split over the [`DAILY_WINDOW`] most
/// recent days including `today`, most recent first. Days without records
/// appear as zero entries.
async fn daily_cost_breakdown(db: &SqlitePool, today: NaiveDate) -> Result<Vec<DailyCostEntry>> {
    let cutoff = today - Duration::days(DAILY_WINDOW - 1);
    let rows = sqlx::query_as::<_, DailyCostRow>(
        r#"
        SELECT substr(timestamp, 1, 10) AS day,
               is_reference,
               COALESCE(SUM(cost), 0.0)   AS cost
        FROM call_records
        WHERE substr(timestamp, 1, 10) >= ?
        GROUP BY day, is_reference
        "#,
    )
    .bind(cutoff.format("%Y-%m-%d").to_string())
    .fetch_all(db)
    .await?;

    let mut by_day: HashMap<(NaiveDate, bool), f64> = HashMap::new();
    for row in rows {
        by_day.insert((parse_day(&row.day)?, row.is_reference), row.cost);
    }

    let entries = (0..DAILY_WINDOW)
        .map(|offset| {
            let date = today - Duration::days(offset);
            DailyCostEntry {
                date,
                reference_cost: by_day.get(&(date, true)).copied().unwrap_or(0.0),
                alternate_cost: by_day.get(&(date, false)).copied().unwrap_or(0.0),
            }
        })
        .collect();

    Ok(entries)
}

/// Per-day reference/alternate call counts over the same window as
/// [`daily_cost_breakdown`].
async fn daily_call_comparison(db: &SqlitePool, today: NaiveDate) -> Result<Vec<DailyCallEntry>> {
    let cutoff = today - Duration::days(DAILY_WINDOW - 1);
    let rows = sqlx::query_as::<_, DailyCallRow>(
        r#"
        SELECT substr(timestamp, 1, 10) AS day,
               is_reference,
               COUNT(*)                 AS calls
        FROM call_records
        WHERE substr(timestamp, 1, 10) >= ?
        GROUP BY day, is_reference
        "#,
    )
    .bind(cutoff.format("%Y-%m-%d").to_string())
    .fetch_all(db)
    .await?;

    let mut by_day: HashMap<(NaiveDate, bool), i64> = HashMap::new();
    for row in rows {
        by_day.insert((parse_day(&row.day)?, row.is_reference), row.calls);
    }

    let entries = (0..DAILY_WINDOW)
        .map(|offset| {
            let date = today - Duration::days(offset);
            DailyCallEntry {
                date,
                reference_calls: by_day.get(&(date, true)).copied().unwrap_or(0),
                alternate_calls: by_day.get(&(date, false)).copied().unwrap_or(0),
            }
        })
        .collect();

    Ok(entries)
}

/// Compute the full dashboard summary as of `now`.
///
/// Every field is recomputed from the call-record table; nothing is cached
/// or persisted between requests.
#[instrument(skip(db), err)]
pub async fn get_dashboard_summary(
    db: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<DashboardResponse> {
    let today = now.date_naive();

    let totals = totals(db).await?;
    let split = provider_split(db).await?;
    let cost_optimization_impact = monthly_impact(db, now).await?;
    let daily_cost_breakdown = daily_cost_breakdown(db, today).await?;
    let daily_call_comparison = daily_call_comparison(db, today).await?;

    let mut reference_api_calls = 0;
    let mut alternate_api_calls = 0;
    let mut reference_cost = 0.0;
    let mut alternate_cost = 0.0;
    let mut reference_tokens = 0;
    let mut alternate_tokens = 0;
    for row in split {
        if row.is_reference {
            reference_api_calls = row.calls;
            reference_cost = row.cost;
            reference_tokens = row.tokens;
        } else {
            alternate_api_calls = row.calls;
            alternate_cost = row.cost;
            alternate_tokens = row.tokens;
        }
    }

    let total_calls_f = totals.total_calls as f64;

    Ok(DashboardResponse {
        total_savings: totals.total_cost_gpt4 - totals.total_cost,
        total_api_calls: totals.total_calls,
        reference_api_calls,
        alternate_api_calls,
        total_cost: totals.total_cost,
        reference_cost,
        alternate_cost,
        total_cost_gpt4: totals.total_cost_gpt4,
        cost_optimization_impact,
        daily_cost_breakdown,
        daily_call_comparison,
        call_percentage_reference: percentage(reference_api_calls as f64, total_calls_f),
        call_percentage_alternate: percentage(alternate_api_calls as f64, total_calls_f),
        cost_percentage_reference: percentage(reference_cost, totals.total_cost),
        cost_percentage_alternate: percentage(alternate_cost, totals.total_cost),
        total_tokens: totals.total_tokens,
        reference_tokens,
        alternate_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        handlers::CallRecords,
        models::call_records::CallRecordCreateDBRequest,
    };
    use chrono::TimeZone;

    fn record(
        timestamp: DateTime<Utc>,
        is_reference: bool,
        cost: f64,
        cost_gpt4: f64,
    ) -> CallRecordCreateDBRequest {
        CallRecordCreateDBRequest {
            question: "q".to_string(),
            selected_model: if is_reference { "GPT-4" } else { "RouteLens" }.to_string(),
            latency: 0.1,
            cost,
            input_tokens: 10,
            output_tokens: 5,
            cost_gpt4,
            timestamp,
            is_reference,
        }
    }

    #[sqlx::test]
    async fn empty_table_yields_zeroed_but_fully_shaped_summary(pool: SqlitePool) {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let summary = get_dashboard_summary(&pool, now).await.unwrap();

        assert_eq!(summary.total_api_calls, 0);
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.total_savings, 0.0);
        assert_eq!(summary.call_percentage_reference, 0.0);
        assert_eq!(summary.call_percentage_alternate, 0.0);
        assert_eq!(summary.cost_percentage_reference, 0.0);
        assert_eq!(summary.cost_percentage_alternate, 0.0);

        // Window shapes hold even with no data.
        assert_eq!(summary.cost_optimization_impact.len(), 5);
        assert_eq!(summary.daily_cost_breakdown.len(), 15);
        assert_eq!(summary.daily_call_comparison.len(), 15);

        // Months wrap across the year boundary, most recent first.
        let months: Vec<(u32, i32)> = summary
            .cost_optimization_impact
            .iter()
            .map(|e| (e.month, e.year))
            .collect();
        assert_eq!(months, vec![(3, 2025), (2, 2025), (1, 2025), (12, 2024), (11, 2024)]);

        assert_eq!(summary.daily_cost_breakdown[0].date, now.date_naive());
        assert_eq!(
            summary.daily_cost_breakdown[14].date,
            now.date_naive() - Duration::days(14)
        );
    }

    #[sqlx::test]
    async fn summary_splits_by_provider_and_computes_savings(pool: SqlitePool) {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = CallRecords::new(&mut conn);

        repo.create(&record(now, true, 0.02, 0.02)).await.unwrap();
        repo.create(&record(now - Duration::days(1), false, 0.005, 0.02))
            .await
            .unwrap();
        repo.create(&record(now - Duration::days(1), false, 0.005, 0.02))
            .await
            .unwrap();
        drop(repo);
        drop(conn);

        let summary = get_dashboard_summary(&pool, now).await.unwrap();

        assert_eq!(summary.total_api_calls, 3);
        assert_eq!(summary.reference_api_calls, 1);
        assert_eq!(summary.alternate_api_calls, 2);
        assert!((summary.total_cost - 0.03).abs() < 1e-12);
        assert!((summary.total_cost_gpt4 - 0.06).abs() < 1e-12);
        assert!((summary.total_savings - 0.03).abs() < 1e-12);
        assert!((summary.reference_cost - 0.02).abs() < 1e-12);
        assert!((summary.alternate_cost - 0.01).abs() < 1e-12);

        assert!((summary.call_percentage_reference - 100.0 / 3.0).abs() < 1e-9);
        assert!((summary.call_percentage_alternate - 200.0 / 3.0).abs() < 1e-9);
        assert!((summary.cost_percentage_reference - 2.0 / 3.0 * 100.0).abs() < 1e-9);

        assert_eq!(summary.total_tokens, 45);
        assert_eq!(summary.reference_tokens, 15);
        assert_eq!(summary.alternate_tokens, 30);

        // Today's entry carries the reference call, yesterday's the two
        // alternate calls.
        let today = &summary.daily_call_comparison[0];
        assert_eq!(today.reference_calls, 1);
        assert_eq!(today.alternate_calls, 0);
        let yesterday = &summary.daily_call_comparison[1];
        assert_eq!(yesterday.reference_calls, 0);
        assert_eq!(yesterday.alternate_calls, 2);

        let today_cost = &summary.daily_cost_breakdown[0];
        assert!((today_cost.reference_cost - 0.02).abs() < 1e-12);
        assert_eq!(today_cost.alternate_cost, 0.0);

        // This month's impact entry reflects both actual and counterfactual
        // spend.
        let this_month = &summary.cost_optimization_impact[0];
        assert_eq!((this_month.month, this_month.year), (3, 2025));
        assert!((this_month.potential_cost - 0.06).abs() < 1e-12);
        assert!((this_month.actual_cost - 0.03).abs() < 1e-12);
    }

    #[sqlx::test]
    async fn old_records_count_in_totals_but_not_in_windows(pool: SqlitePool) {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap();
        let mut conn = pool.acquire().await.unwrap();
        CallRecords::new(&mut conn)
            .create(&record(old, false, 0.004, 0.01))
            .await
            .unwrap();
        drop(conn);

        let summary = get_dashboard_summary(&pool, now).await.unwrap();

        assert_eq!(summary.total_api_calls, 1);
        assert!((summary.total_savings - 0.006).abs() < 1e-12);

        // August 2024 is outside the 5-month window; every entry stays zero.
        assert!(summary
            .cost_optimization_impact
            .iter()
            .all(|e| e.actual_cost == 0.0 && e.potential_cost == 0.0));
        assert!(summary
            .daily_call_comparison
            .iter()
            .all(|e| e.reference_calls == 0 && e.alternate_calls == 0));
    }
}
