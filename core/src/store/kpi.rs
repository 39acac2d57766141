//! Read-only KPI queries over the written tables.
//!
//! Day boundaries are the first ten characters of the UTC timestamps, so
//! these queries see exactly what downstream dashboards see.

use super::SimStore;
use crate::error::SimResult;
use rusqlite::params;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCount {
    pub period: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRevenue {
    pub period: String,
    pub revenue_eur_cents: i64,
    pub purchases: i64,
}

/// D1/D7/D30 retention for one cohort key (first day or variant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionRow {
    pub cohort: String,
    pub cohort_size: i64,
    pub day1_active: i64,
    pub day7_active: i64,
    pub day30_active: i64,
}

impl RetentionRow {
    pub fn d1(&self) -> f64 {
        ratio(self.day1_active, self.cohort_size)
    }

    pub fn d7(&self) -> f64 {
        ratio(self.day7_active, self.cohort_size)
    }

    pub fn d30(&self) -> f64 {
        ratio(self.day30_active, self.cohort_size)
    }
}

/// Retention for one experiment arm within one first-session day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCohortRetention {
    pub variant: String,
    /// `cohort` holds the first-session day.
    pub retention: RetentionRow,
}

fn ratio(n: i64, d: i64) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

const RETENTION_CTE: &str = "
    WITH first_session AS (
        SELECT player_id, MIN(substr(session_start_utc, 1, 10)) AS first_day
        FROM sessions
        GROUP BY player_id
    ),
    activity AS (
        SELECT DISTINCT player_id, substr(session_start_utc, 1, 10) AS day
        FROM sessions
    ),
    cohort AS (
        SELECT
            fs.player_id,
            fs.first_day,
            EXISTS (SELECT 1 FROM activity a
                    WHERE a.player_id = fs.player_id AND a.day = date(fs.first_day, '+1 day'))  AS d1,
            EXISTS (SELECT 1 FROM activity a
                    WHERE a.player_id = fs.player_id AND a.day = date(fs.first_day, '+7 day'))  AS d7,
            EXISTS (SELECT 1 FROM activity a
                    WHERE a.player_id = fs.player_id AND a.day = date(fs.first_day, '+30 day')) AS d30
        FROM first_session fs
    )";

impl SimStore {
    /// Distinct players with a session starting on each UTC day.
    pub fn daily_active_users(&self) -> SimResult<Vec<PeriodCount>> {
        self.period_counts(
            "SELECT substr(session_start_utc, 1, 10) AS day, COUNT(DISTINCT player_id)
             FROM sessions GROUP BY day ORDER BY day",
        )
    }

    /// Distinct players per calendar week (`YYYY-WW`, Monday-based).
    pub fn weekly_active_users(&self) -> SimResult<Vec<PeriodCount>> {
        self.period_counts(
            "SELECT strftime('%Y-%W', session_start_utc) AS week, COUNT(DISTINCT player_id)
             FROM sessions GROUP BY week ORDER BY week",
        )
    }

    pub fn monthly_active_users(&self) -> SimResult<Vec<PeriodCount>> {
        self.period_counts(
            "SELECT substr(session_start_utc, 1, 7) AS month, COUNT(DISTINCT player_id)
             FROM sessions GROUP BY month ORDER BY month",
        )
    }

    fn period_counts(&self, sql: &str) -> SimResult<Vec<PeriodCount>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(PeriodCount {
                period: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn daily_revenue(&self) -> SimResult<Vec<PeriodRevenue>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(purchase_time_utc, 1, 10) AS day, SUM(price_eur), COUNT(*)
             FROM purchases GROUP BY day ORDER BY day",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PeriodRevenue {
                period: row.get(0)?,
                revenue_eur_cents: row.get(1)?,
                purchases: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Retention by first-session day.
    pub fn cohort_retention(&self) -> SimResult<Vec<RetentionRow>> {
        let sql = format!(
            "{RETENTION_CTE}
             SELECT first_day, COUNT(*), SUM(d1), SUM(d7), SUM(d30)
             FROM cohort GROUP BY first_day ORDER BY first_day"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], retention_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Retention per experiment arm, pooled over every first-session
    /// day. Players who never played are not part of any cohort.
    pub fn variant_retention(&self, experiment_name: &str) -> SimResult<Vec<RetentionRow>> {
        let sql = format!(
            "{RETENTION_CTE}
             SELECT ea.variant, COUNT(*), SUM(c.d1), SUM(c.d7), SUM(c.d30)
             FROM experiment_assignments ea
             JOIN cohort c ON c.player_id = ea.player_id
             WHERE ea.experiment_name = ?1
             GROUP BY ea.variant ORDER BY ea.variant"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![experiment_name], retention_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Retention per experiment arm and first-session day, ordered by
    /// variant then day.
    pub fn variant_cohort_retention(&self, experiment_name: &str) -> SimResult<Vec<VariantCohortRetention>> {
        let sql = format!(
            "{RETENTION_CTE}
             SELECT ea.variant, c.first_day, COUNT(*), SUM(c.d1), SUM(c.d7), SUM(c.d30)
             FROM experiment_assignments ea
             JOIN cohort c ON c.player_id = ea.player_id
             WHERE ea.experiment_name = ?1
             GROUP BY ea.variant, c.first_day ORDER BY ea.variant, c.first_day"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![experiment_name], |row| {
            Ok(VariantCohortRetention {
                variant: row.get(0)?,
                retention: RetentionRow {
                    cohort: row.get(1)?,
                    cohort_size: row.get(2)?,
                    day1_active: row.get(3)?,
                    day7_active: row.get(4)?,
                    day30_active: row.get(5)?,
                },
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn retention_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RetentionRow> {
    Ok(RetentionRow {
        cohort: row.get(0)?,
        cohort_size: row.get(1)?,
        day1_active: row.get(2)?,
        day7_active: row.get(3)?,
        day30_active: row.get(4)?,
    })
}
