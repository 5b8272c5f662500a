use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use rusqlite::types::Value;
use tracing::debug;

use super::RepositoryError;
use crate::database::DatabasePool;
use crate::models::VitalRecord;

const VITAL_COLUMNS: &str = "id, user_id, vital_type, value, secondary_value, unit, notes, recorded_at";

/// Criteria for listing a user's vitals
#[derive(Debug, Clone)]
pub struct VitalQuery {
    pub user_id: String,
    pub vital_type: Option<String>,
    /// Inclusive lower bound on `recorded_at`
    pub since: Option<String>,
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl VitalQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            vital_type: None,
            since: None,
            newest_first: true,
            limit: None,
        }
    }
}

/// Repository trait for vital readings
#[async_trait]
pub trait VitalRepository: Send + Sync {
    async fn create(&self, vital: VitalRecord) -> Result<VitalRecord, RepositoryError>;

    /// Most recent reading of one type
    async fn latest(&self, user_id: &str, vital_type: &str) -> Result<Option<VitalRecord>, RepositoryError>;

    async fn list(&self, query: VitalQuery) -> Result<Vec<VitalRecord>, RepositoryError>;

    /// Readings of one type recorded at or after `since`
    async fn count(&self, user_id: &str, vital_type: &str, since: &str) -> Result<i64, RepositoryError>;
}

/// SQLite implementation of [`VitalRepository`]
#[derive(Debug, Clone)]
pub struct SqliteVitalRepository {
    pool: DatabasePool,
}

impl SqliteVitalRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_vital(row: &Row<'_>) -> rusqlite::Result<VitalRecord> {
    Ok(VitalRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        vital_type: row.get(2)?,
        value: row.get(3)?,
        secondary_value: row.get(4)?,
        unit: row.get(5)?,
        notes: row.get(6)?,
        recorded_at: row.get(7)?,
    })
}

#[async_trait]
impl VitalRepository for SqliteVitalRepository {
    async fn create(&self, vital: VitalRecord) -> Result<VitalRecord, RepositoryError> {
        debug!("Storing vital in database: id={}, type={}", vital.id, vital.vital_type);

        self.pool.with_connection(move |conn| {
            conn.execute(
                &format!("INSERT INTO vitals ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", VITAL_COLUMNS),
                params![
                    vital.id,
                    vital.user_id,
                    vital.vital_type,
                    vital.value,
                    vital.secondary_value,
                    vital.unit,
                    vital.notes,
                    vital.recorded_at,
                ],
            )?;
            Ok(vital)
        }).await
    }

    async fn latest(&self, user_id: &str, vital_type: &str) -> Result<Option<VitalRecord>, RepositoryError> {
        let user_id = user_id.to_string();
        let vital_type = vital_type.to_string();
        self.pool.with_connection(move |conn| {
            let sql = format!(
                "SELECT {} FROM vitals WHERE user_id = ?1 AND vital_type = ?2
                 ORDER BY recorded_at DESC, rowid DESC LIMIT 1",
                VITAL_COLUMNS,
            );
            Ok(conn.query_row(&sql, params![user_id, vital_type], map_vital).optional()?)
        }).await
    }

    async fn list(&self, query: VitalQuery) -> Result<Vec<VitalRecord>, RepositoryError> {
        debug!("Listing vitals: {:?}", query);

        self.pool.with_connection(move |conn| {
            let mut sql = format!("SELECT {} FROM vitals WHERE user_id = ?1", VITAL_COLUMNS);
            let mut args: Vec<Value> = vec![Value::Text(query.user_id)];

            if let Some(vital_type) = query.vital_type {
                args.push(Value::Text(vital_type));
                sql.push_str(&format!(" AND vital_type = ?{}", args.len()));
            }
            if let Some(since) = query.since {
                args.push(Value::Text(since));
                sql.push_str(&format!(" AND recorded_at >= ?{}", args.len()));
            }

            let direction = if query.newest_first { "DESC" } else { "ASC" };
            sql.push_str(&format!(" ORDER BY recorded_at {0}, rowid {0}", direction));

            if let Some(limit) = query.limit {
                args.push(Value::Integer(limit as i64));
                sql.push_str(&format!(" LIMIT ?{}", args.len()));
            }

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), map_vital)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        }).await
    }

    async fn count(&self, user_id: &str, vital_type: &str, since: &str) -> Result<i64, RepositoryError> {
        let (user_id, vital_type, since) = (user_id.to_string(), vital_type.to_string(), since.to_string());
        self.pool.with_connection(move |conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM vitals WHERE user_id = ?1 AND vital_type = ?2 AND recorded_at >= ?3",
                params![user_id, vital_type, since],
                |row| row.get(0),
            )?)
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;

    const DAY1: &str = "2024-05-01T08:00:00.000000Z";
    const DAY2: &str = "2024-05-02T08:00:00.000000Z";
    const DAY3: &str = "2024-05-03T08:00:00.000000Z";

    async fn seeded() -> SqliteVitalRepository {
        let repo = SqliteVitalRepository::new(DatabasePool::in_memory().unwrap());
        repo.create(fixtures::vital("u1", "bp", 118.0, DAY1)).await.unwrap();
        repo.create(fixtures::vital("u1", "bp", 142.0, DAY3)).await.unwrap();
        repo.create(fixtures::vital("u1", "weight", 64.0, DAY2)).await.unwrap();
        repo.create(fixtures::vital("u2", "bp", 180.0, DAY3)).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_latest_picks_newest_of_type() {
        let repo = seeded().await;

        let latest = repo.latest("u1", "bp").await.unwrap().unwrap();
        assert_eq!(latest.value, 142.0);

        assert!(repo.latest("u1", "bloodSugar").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_breaks_ties_by_insertion() {
        let repo = SqliteVitalRepository::new(DatabasePool::in_memory().unwrap());
        repo.create(fixtures::vital("u1", "bp", 120.0, DAY1)).await.unwrap();
        repo.create(fixtures::vital("u1", "bp", 130.0, DAY1)).await.unwrap();

        assert_eq!(repo.latest("u1", "bp").await.unwrap().unwrap().value, 130.0);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let repo = seeded().await;

        let all = repo.list(VitalQuery::for_user("u1")).await.unwrap();
        assert_eq!(all.iter().map(|v| v.value).collect::<Vec<_>>(), vec![142.0, 64.0, 118.0]);

        let bp_oldest_first = repo.list(VitalQuery {
            vital_type: Some("bp".to_string()),
            newest_first: false,
            ..VitalQuery::for_user("u1")
        }).await.unwrap();
        assert_eq!(bp_oldest_first.iter().map(|v| v.value).collect::<Vec<_>>(), vec![118.0, 142.0]);

        let recent = repo.list(VitalQuery {
            since: Some(DAY2.to_string()),
            limit: Some(1),
            ..VitalQuery::for_user("u1")
        }).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].value, 142.0);
    }

    #[tokio::test]
    async fn test_count_since() {
        let repo = seeded().await;
        assert_eq!(repo.count("u1", "bp", DAY1).await.unwrap(), 2);
        assert_eq!(repo.count("u1", "bp", DAY2).await.unwrap(), 1);
        assert_eq!(repo.count("u1", "weight", DAY3).await.unwrap(), 0);
    }
}
