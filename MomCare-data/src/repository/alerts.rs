use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::debug;

use super::RepositoryError;
use crate::database::DatabasePool;
use crate::models::AlertRecord;

const ALERT_COLUMNS: &str = "id, patient_id, provider_id, alert_type, title, message, vital_id,
     is_read, read_at, created_at";

/// Criteria for listing alerts, newest first
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub patient_id: Option<String>,
    pub provider_id: Option<String>,
    pub alert_type: Option<String>,
    pub unread_only: bool,
    pub limit: Option<usize>,
}

/// Who may mark an alert read. With neither set, any alert matches.
#[derive(Debug, Clone, Default)]
pub struct AlertScope {
    pub patient_id: Option<String>,
    pub provider_id: Option<String>,
}

/// Repository trait for alerts
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn create(&self, alert: AlertRecord) -> Result<AlertRecord, RepositoryError>;

    async fn list(&self, query: AlertQuery) -> Result<Vec<AlertRecord>, RepositoryError>;

    /// Unread alerts, optionally only those routed to one provider
    async fn count_unread(&self, provider_id: Option<&str>) -> Result<i64, RepositoryError>;

    /// Set `is_read` and `read_at`; `None` when no alert in scope has this id
    async fn mark_read(
        &self,
        id: &str,
        scope: AlertScope,
        read_at: &str,
    ) -> Result<Option<AlertRecord>, RepositoryError>;
}

/// SQLite implementation of [`AlertRepository`]
#[derive(Debug, Clone)]
pub struct SqliteAlertRepository {
    pool: DatabasePool,
}

impl SqliteAlertRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_alert(row: &Row<'_>) -> rusqlite::Result<AlertRecord> {
    Ok(AlertRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        provider_id: row.get(2)?,
        alert_type: row.get(3)?,
        title: row.get(4)?,
        message: row.get(5)?,
        vital_id: row.get(6)?,
        is_read: row.get(7)?,
        read_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[async_trait]
impl AlertRepository for SqliteAlertRepository {
    async fn create(&self, alert: AlertRecord) -> Result<AlertRecord, RepositoryError> {
        debug!("Storing alert in database: id={}, patient={}", alert.id, alert.patient_id);

        self.pool.with_connection(move |conn| {
            conn.execute(
                &format!("INSERT INTO alerts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    ALERT_COLUMNS),
                params![
                    alert.id,
                    alert.patient_id,
                    alert.provider_id,
                    alert.alert_type,
                    alert.title,
                    alert.message,
                    alert.vital_id,
                    alert.is_read,
                    alert.read_at,
                    alert.created_at,
                ],
            )?;
            Ok(alert)
        }).await
    }

    async fn list(&self, query: AlertQuery) -> Result<Vec<AlertRecord>, RepositoryError> {
        debug!("Listing alerts: {:?}", query);

        self.pool.with_connection(move |conn| {
            let mut sql = format!("SELECT {} FROM alerts WHERE 1 = 1", ALERT_COLUMNS);
            let mut args: Vec<Value> = Vec::new();

            if let Some(patient_id) = query.patient_id {
                args.push(Value::Text(patient_id));
                sql.push_str(&format!(" AND patient_id = ?{}", args.len()));
            }
            if let Some(provider_id) = query.provider_id {
                args.push(Value::Text(provider_id));
                sql.push_str(&format!(" AND provider_id = ?{}", args.len()));
            }
            if let Some(alert_type) = query.alert_type {
                args.push(Value::Text(alert_type));
                sql.push_str(&format!(" AND alert_type = ?{}", args.len()));
            }
            if query.unread_only {
                sql.push_str(" AND is_read = 0");
            }
            sql.push_str(" ORDER BY created_at DESC, rowid DESC");
            if let Some(limit) = query.limit {
                args.push(Value::Integer(limit as i64));
                sql.push_str(&format!(" LIMIT ?{}", args.len()));
            }

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), map_alert)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        }).await
    }

    async fn count_unread(&self, provider_id: Option<&str>) -> Result<i64, RepositoryError> {
        let provider_id = provider_id.map(str::to_string);
        self.pool.with_connection(move |conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM alerts WHERE is_read = 0 AND (?1 IS NULL OR provider_id = ?1)",
                params![provider_id],
                |row| row.get(0),
            )?)
        }).await
    }

    async fn mark_read(
        &self,
        id: &str,
        scope: AlertScope,
        read_at: &str,
    ) -> Result<Option<AlertRecord>, RepositoryError> {
        debug!("Marking alert read: id={}, scope={:?}", id, scope);
        let (id, read_at) = (id.to_string(), read_at.to_string());

        self.pool.with_connection(move |conn| {
            let changed = conn.execute(
                "UPDATE alerts SET is_read = 1, read_at = ?2
                 WHERE id = ?1
                   AND (?3 IS NULL OR patient_id = ?3)
                   AND (?4 IS NULL OR provider_id = ?4)",
                params![id, read_at, scope.patient_id, scope.provider_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }

            let sql = format!("SELECT {} FROM alerts WHERE id = ?1", ALERT_COLUMNS);
            Ok(conn.query_row(&sql, params![id], map_alert).optional()?)
        }).await
    }
}
