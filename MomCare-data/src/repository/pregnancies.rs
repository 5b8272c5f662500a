use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{json_column, to_json, RepositoryError};
use crate::database::DatabasePool;
use crate::models::PregnancyRecord;

const PREGNANCY_COLUMNS: &str = "id, user_id, last_menstrual_period, due_date, risk_score, risk_level,
     risk_factors, is_active, created_at";

/// Repository trait for pregnancy records
#[async_trait]
pub trait PregnancyRepository: Send + Sync {
    async fn create(&self, pregnancy: PregnancyRecord) -> Result<PregnancyRecord, RepositoryError>;

    /// The user's active pregnancy, if any
    async fn find_active(&self, user_id: &str) -> Result<Option<PregnancyRecord>, RepositoryError>;

    /// Mark every pregnancy of the user inactive; returns how many changed
    async fn deactivate_for_user(&self, user_id: &str) -> Result<usize, RepositoryError>;

    /// Persist risk score, level, factors and the active flag
    async fn update(&self, pregnancy: PregnancyRecord) -> Result<PregnancyRecord, RepositoryError>;

    /// Active pregnancies at a risk level, optionally limited to one provider's patients
    async fn count_active_by_level(
        &self,
        risk_level: &str,
        provider_id: Option<&str>,
    ) -> Result<i64, RepositoryError>;
}

/// SQLite implementation of [`PregnancyRepository`]
#[derive(Debug, Clone)]
pub struct SqlitePregnancyRepository {
    pool: DatabasePool,
}

impl SqlitePregnancyRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_pregnancy(row: &Row<'_>) -> rusqlite::Result<PregnancyRecord> {
    Ok(PregnancyRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        last_menstrual_period: row.get(2)?,
        due_date: row.get(3)?,
        risk_score: row.get(4)?,
        risk_level: row.get(5)?,
        risk_factors: json_column(row, 6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[async_trait]
impl PregnancyRepository for SqlitePregnancyRepository {
    async fn create(&self, pregnancy: PregnancyRecord) -> Result<PregnancyRecord, RepositoryError> {
        debug!("Storing pregnancy in database: id={}, user={}", pregnancy.id, pregnancy.user_id);

        self.pool.with_connection(move |conn| {
            conn.execute(
                &format!("INSERT INTO pregnancies ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    PREGNANCY_COLUMNS),
                params![
                    pregnancy.id,
                    pregnancy.user_id,
                    pregnancy.last_menstrual_period,
                    pregnancy.due_date,
                    pregnancy.risk_score,
                    pregnancy.risk_level,
                    to_json(&pregnancy.risk_factors)?,
                    pregnancy.is_active,
                    pregnancy.created_at,
                ],
            )?;
            Ok(pregnancy)
        }).await
    }

    async fn find_active(&self, user_id: &str) -> Result<Option<PregnancyRecord>, RepositoryError> {
        let user_id = user_id.to_string();
        self.pool.with_connection(move |conn| {
            let sql = format!(
                "SELECT {} FROM pregnancies WHERE user_id = ?1 AND is_active = 1
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                PREGNANCY_COLUMNS,
            );
            Ok(conn.query_row(&sql, params![user_id], map_pregnancy).optional()?)
        }).await
    }

    async fn deactivate_for_user(&self, user_id: &str) -> Result<usize, RepositoryError> {
        debug!("Deactivating pregnancies for user: {}", user_id);
        let user_id = user_id.to_string();
        self.pool.with_connection(move |conn| {
            Ok(conn.execute(
                "UPDATE pregnancies SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
                params![user_id],
            )?)
        }).await
    }

    async fn update(&self, pregnancy: PregnancyRecord) -> Result<PregnancyRecord, RepositoryError> {
        debug!("Updating pregnancy: id={}, score={}", pregnancy.id, pregnancy.risk_score);

        self.pool.with_connection(move |conn| {
            let changed = conn.execute(
                "UPDATE pregnancies SET risk_score = ?2, risk_level = ?3, risk_factors = ?4, is_active = ?5
                 WHERE id = ?1",
                params![
                    pregnancy.id,
                    pregnancy.risk_score,
                    pregnancy.risk_level,
                    to_json(&pregnancy.risk_factors)?,
                    pregnancy.is_active,
                ],
            )?;

            if changed == 0 {
                return Err(RepositoryError::NotFound(format!("pregnancy {}", pregnancy.id)));
            }
            Ok(pregnancy)
        }).await
    }

    async fn count_active_by_level(
        &self,
        risk_level: &str,
        provider_id: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        let risk_level = risk_level.to_string();
        let provider_id = provider_id.map(str::to_string);

        self.pool.with_connection(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM pregnancies p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.is_active = 1 AND p.risk_level = ?1 AND u.role = 'patient'
                   AND (?2 IS NULL OR u.provider_id = ?2)",
                params![risk_level, provider_id],
                |row| row.get(0),
            )?;
            Ok(count)
        }).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::{format_timestamp, new_id, RiskFactorRecord};
    use crate::repository::{fixtures, SqliteUserRepository, UserRepository};

    fn pregnancy(user_id: &str, risk_level: &str) -> PregnancyRecord {
        let lmp = Utc::now() - Duration::days(70);
        PregnancyRecord {
            id: new_id(),
            user_id: user_id.to_string(),
            last_menstrual_period: format_timestamp(lmp),
            due_date: format_timestamp(lmp + Duration::days(280)),
            risk_score: 10,
            risk_level: risk_level.to_string(),
            risk_factors: vec![],
            is_active: true,
            created_at: format_timestamp(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_create_find_and_deactivate() {
        let repo = SqlitePregnancyRepository::new(DatabasePool::in_memory().unwrap());

        let first = repo.create(pregnancy("u1", "low")).await.unwrap();
        assert_eq!(repo.find_active("u1").await.unwrap().unwrap().id, first.id);

        assert_eq!(repo.deactivate_for_user("u1").await.unwrap(), 1);
        assert!(repo.find_active("u1").await.unwrap().is_none());

        let second = repo.create(pregnancy("u1", "low")).await.unwrap();
        assert_eq!(repo.find_active("u1").await.unwrap().unwrap().id, second.id);
    }

    #[tokio::test]
    async fn test_update_persists_risk_factors() {
        let repo = SqlitePregnancyRepository::new(DatabasePool::in_memory().unwrap());
        let mut record = repo.create(pregnancy("u1", "low")).await.unwrap();

        record.risk_score = 55;
        record.risk_level = "medium".to_string();
        record.risk_factors = vec![RiskFactorRecord {
            factor: "Elevated blood pressure".to_string(),
            severity: "high".to_string(),
            added_at: format_timestamp(Utc::now()),
        }];
        repo.update(record.clone()).await.unwrap();

        let stored = repo.find_active("u1").await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_count_active_by_level_scopes_to_provider() {
        let pool = DatabasePool::in_memory().unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let repo = SqlitePregnancyRepository::new(pool);

        let mine = users.create(fixtures::user("mine@example.com", "patient", Some("doc-1"))).await.unwrap();
        let theirs = users.create(fixtures::user("theirs@example.com", "patient", Some("doc-2"))).await.unwrap();

        repo.create(pregnancy(&mine.id, "high")).await.unwrap();
        repo.create(pregnancy(&theirs.id, "high")).await.unwrap();

        let mut inactive = pregnancy(&mine.id, "high");
        inactive.is_active = false;
        repo.create(inactive).await.unwrap();

        assert_eq!(repo.count_active_by_level("high", Some("doc-1")).await.unwrap(), 1);
        assert_eq!(repo.count_active_by_level("high", None).await.unwrap(), 2);
        assert_eq!(repo.count_active_by_level("low", None).await.unwrap(), 0);
    }
}
