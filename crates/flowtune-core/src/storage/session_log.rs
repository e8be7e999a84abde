//! SQLite-based append-only session outcome log.
//!
//! One row per finished session. The engine appends on the write path and
//! reads daily aggregates (today's focused minutes, recency of the last
//! session) for guardrail adjustments.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{ContextKey, EnergyLevel};
use crate::error::StorageError;
use crate::reward::SkipReason;

use super::data_dir;

/// A finished session as recorded in the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub id: Uuid,
    pub task_type: String,
    pub energy: EnergyLevel,
    pub selected_min: u32,
    pub recommended_min: u32,
    pub actual_focus_min: u32,
    pub completed: bool,
    pub accepted: bool,
    pub skip_reason: Option<SkipReason>,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregates consumed by guardrail adjustments.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DailyAggregates {
    /// Total focused minutes recorded today
    pub today_focus_min: u32,
    /// Minutes since the most recent session, if any exists
    pub minutes_since_last: Option<i64>,
    /// Whole days since the most recent session, if any exists
    pub days_since_last: Option<i64>,
}

/// SQLite log of session outcomes.
pub struct SessionLog {
    conn: Connection,
}

impl SessionLog {
    /// Open the log at `~/.config/flowtune/sessions.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?
            .join("sessions.db");
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path,
            source,
        })?;
        let log = Self { conn };
        log.migrate()?;
        Ok(log)
    }

    /// Open an in-memory log (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let log = Self { conn };
        log.migrate()?;
        Ok(log)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS outcomes (
                    id              TEXT PRIMARY KEY,
                    task_type       TEXT NOT NULL,
                    energy          TEXT NOT NULL,
                    selected_min    INTEGER NOT NULL,
                    recommended_min INTEGER NOT NULL,
                    actual_focus_min INTEGER NOT NULL,
                    completed       INTEGER NOT NULL,
                    accepted        INTEGER NOT NULL,
                    skip_reason     TEXT,
                    recorded_at     TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_outcomes_recorded_at ON outcomes(recorded_at);
                CREATE INDEX IF NOT EXISTS idx_outcomes_task_type ON outcomes(task_type);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Append one outcome. The log is append-only; callers guarantee each
    /// finished session is recorded exactly once.
    pub fn append(&self, record: &OutcomeRecord) -> Result<(), StorageError> {
        let skip = record.skip_reason.map(|r| match r {
            SkipReason::SkippedFocus => "skipped_focus",
            SkipReason::SkippedBreak => "skipped_break",
        });
        self.conn.execute(
            "INSERT INTO outcomes (id, task_type, energy, selected_min, recommended_min,
                                   actual_focus_min, completed, accepted, skip_reason, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id.to_string(),
                record.task_type,
                record.energy.as_str(),
                record.selected_min,
                record.recommended_min,
                record.actual_focus_min,
                record.completed,
                record.accepted,
                skip,
                record.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent outcomes for a context, newest first.
    pub fn recent_for_context(
        &self,
        ctx: &ContextKey,
        limit: usize,
    ) -> Result<Vec<OutcomeRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_type, energy, selected_min, recommended_min, actual_focus_min,
                    completed, accepted, skip_reason, recorded_at
             FROM outcomes
             WHERE task_type = ?1 AND energy = ?2
             ORDER BY recorded_at DESC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(
            params![ctx.task_type, ctx.energy.as_str(), limit as i64],
            Self::row_to_record,
        )?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Aggregates for guardrail consumers, relative to `now`.
    pub fn daily_aggregates(&self, now: DateTime<Utc>) -> Result<DailyAggregates, StorageError> {
        let midnight = format!("{}T00:00:00+00:00", now.format("%Y-%m-%d"));
        let today_focus_min: u32 = self.conn.query_row(
            "SELECT COALESCE(SUM(actual_focus_min), 0) FROM outcomes WHERE recorded_at >= ?1",
            params![midnight],
            |row| row.get(0),
        )?;

        let last: Option<String> = self
            .conn
            .query_row(
                "SELECT MAX(recorded_at) FROM outcomes",
                [],
                |row| row.get(0),
            )
            .unwrap_or(None);

        let (minutes_since_last, days_since_last) = match last
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc))
        {
            Some(t) => {
                let delta = now.signed_duration_since(t);
                (Some(delta.num_minutes()), Some(delta.num_days()))
            }
            None => (None, None),
        };

        Ok(DailyAggregates {
            today_focus_min,
            minutes_since_last,
            days_since_last,
        })
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutcomeRecord> {
        let id: String = row.get(0)?;
        let energy: String = row.get(2)?;
        let skip: Option<String> = row.get(8)?;
        let recorded_at: String = row.get(9)?;
        Ok(OutcomeRecord {
            id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
            task_type: row.get(1)?,
            energy: match energy.as_str() {
                "low" => EnergyLevel::Low,
                "mid" => EnergyLevel::Mid,
                "high" => EnergyLevel::High,
                _ => EnergyLevel::Unset,
            },
            selected_min: row.get(3)?,
            recommended_min: row.get(4)?,
            actual_focus_min: row.get(5)?,
            completed: row.get(6)?,
            accepted: row.get(7)?,
            skip_reason: skip.as_deref().and_then(|s| match s {
                "skipped_focus" => Some(SkipReason::SkippedFocus),
                "skipped_break" => Some(SkipReason::SkippedBreak),
                _ => None,
            }),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
