use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::debug;

use super::{json_column, like_pattern, to_json, RepositoryError};
use crate::database::DatabasePool;
use crate::models::UserRecord;

const USER_COLUMNS: &str = "id, email, password_hash, role, name, phone, age, height_cm, weight_kg,
     blood_type, current_mode, provider_id, last_menstrual_period, average_cycle_length,
     average_period_length, medical_conditions, allergies, medications, notifications_enabled,
     fcm_token, created_at";

/// Narrows a patient listing
#[derive(Debug, Clone, Default)]
pub struct PatientFilter {
    /// Only patients assigned to this provider; `None` lists the whole clinic
    pub provider_id: Option<String>,
    /// Case-insensitive substring of the patient's name
    pub name_contains: Option<String>,
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a duplicate email is a `Conflict`
    async fn create(&self, user: UserRecord) -> Result<UserRecord, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// Lookup by email, ignoring case
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// Overwrite every mutable column of an existing user
    async fn update(&self, user: UserRecord) -> Result<UserRecord, RepositoryError>;

    /// Patients matching the filter, ordered by name
    async fn list_patients(&self, filter: PatientFilter) -> Result<Vec<UserRecord>, RepositoryError>;

    async fn count_patients(&self, provider_id: Option<&str>) -> Result<i64, RepositoryError>;
}

/// SQLite implementation of [`UserRepository`]
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        name: row.get(4)?,
        phone: row.get(5)?,
        age: row.get(6)?,
        height_cm: row.get(7)?,
        weight_kg: row.get(8)?,
        blood_type: row.get(9)?,
        current_mode: row.get(10)?,
        provider_id: row.get(11)?,
        last_menstrual_period: row.get(12)?,
        average_cycle_length: row.get(13)?,
        average_period_length: row.get(14)?,
        medical_conditions: json_column(row, 15)?,
        allergies: json_column(row, 16)?,
        medications: json_column(row, 17)?,
        notifications_enabled: row.get(18)?,
        fcm_token: row.get(19)?,
        created_at: row.get(20)?,
    })
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, mut user: UserRecord) -> Result<UserRecord, RepositoryError> {
        user.email = user.email.trim().to_lowercase();
        debug!("Storing user in database: id={}", user.id);

        self.pool.with_connection(move |conn| {
            conn.execute(
                &format!("INSERT INTO users ({}) VALUES
                    (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
                    USER_COLUMNS),
                params![
                    user.id,
                    user.email,
                    user.password_hash,
                    user.role,
                    user.name,
                    user.phone,
                    user.age,
                    user.height_cm,
                    user.weight_kg,
                    user.blood_type,
                    user.current_mode,
                    user.provider_id,
                    user.last_menstrual_period,
                    user.average_cycle_length,
                    user.average_period_length,
                    to_json(&user.medical_conditions)?,
                    to_json(&user.allergies)?,
                    to_json(&user.medications)?,
                    user.notifications_enabled,
                    user.fcm_token,
                    user.created_at,
                ],
            ).map_err(|e| RepositoryError::from_insert(e, "Email already registered"))?;
            Ok(user)
        }).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let id = id.to_string();
        self.pool.with_connection(move |conn| {
            let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
            Ok(conn.query_row(&sql, params![id], map_user).optional()?)
        }).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let email = email.trim().to_lowercase();
        self.pool.with_connection(move |conn| {
            let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
            Ok(conn.query_row(&sql, params![email], map_user).optional()?)
        }).await
    }

    async fn update(&self, user: UserRecord) -> Result<UserRecord, RepositoryError> {
        debug!("Updating user in database: id={}", user.id);

        self.pool.with_connection(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET name = ?2, phone = ?3, age = ?4, height_cm = ?5, weight_kg = ?6,
                    blood_type = ?7, current_mode = ?8, provider_id = ?9, last_menstrual_period = ?10,
                    average_cycle_length = ?11, average_period_length = ?12, medical_conditions = ?13,
                    allergies = ?14, medications = ?15, notifications_enabled = ?16, fcm_token = ?17,
                    role = ?18, password_hash = ?19
                 WHERE id = ?1",
                params![
                    user.id,
                    user.name,
                    user.phone,
                    user.age,
                    user.height_cm,
                    user.weight_kg,
                    user.blood_type,
                    user.current_mode,
                    user.provider_id,
                    user.last_menstrual_period,
                    user.average_cycle_length,
                    user.average_period_length,
                    to_json(&user.medical_conditions)?,
                    to_json(&user.allergies)?,
                    to_json(&user.medications)?,
                    user.notifications_enabled,
                    user.fcm_token,
                    user.role,
                    user.password_hash,
                ],
            )?;

            if changed == 0 {
                return Err(RepositoryError::NotFound(format!("user {}", user.id)));
            }
            Ok(user)
        }).await
    }

    async fn list_patients(&self, filter: PatientFilter) -> Result<Vec<UserRecord>, RepositoryError> {
        debug!("Listing patients: provider={:?}, search={:?}", filter.provider_id, filter.name_contains);

        self.pool.with_connection(move |conn| {
            let mut sql = format!("SELECT {} FROM users WHERE role = 'patient'", USER_COLUMNS);
            let mut args: Vec<String> = Vec::new();

            if let Some(provider_id) = filter.provider_id {
                args.push(provider_id);
                sql.push_str(&format!(" AND provider_id = ?{}", args.len()));
            }
            if let Some(fragment) = filter.name_contains.filter(|s| !s.trim().is_empty()) {
                args.push(like_pattern(fragment.trim()));
                sql.push_str(&format!(" AND name LIKE ?{} ESCAPE '\\'", args.len()));
            }
            sql.push_str(" ORDER BY name, rowid");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), map_user)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        }).await
    }

    async fn count_patients(&self, provider_id: Option<&str>) -> Result<i64, RepositoryError> {
        let provider_id = provider_id.map(str::to_string);
        self.pool.with_connection(move |conn| {
            let count = match provider_id {
                Some(provider_id) => conn.query_row(
                    "SELECT COUNT(*) FROM users WHERE role = 'patient' AND provider_id = ?1",
                    params![provider_id],
                    |row| row.get(0),
                )?,
                None => conn.query_row(
                    "SELECT COUNT(*) FROM users WHERE role = 'patient'",
                    [],
                    |row| row.get(0),
                )?,
            };
            Ok(count)
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;

    async fn repo() -> SqliteUserRepository {
        SqliteUserRepository::new(DatabasePool::in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_create_and_find_by_email_ignores_case() {
        let repo = repo().await;
        let user = fixtures::user("Mia@Example.com", "patient", None);

        let created = repo.create(user.clone()).await.unwrap();
        assert_eq!(created.email, "mia@example.com");

        let found = repo.find_by_email("MIA@example.COM").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.allergies, vec!["penicillin".to_string()]);
        assert!(found.notifications_enabled);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = repo().await;
        repo.create(fixtures::user("dup@example.com", "patient", None)).await.unwrap();

        let result = repo.create(fixtures::user("DUP@example.com", "patient", None)).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_overwrites_profile() {
        let repo = repo().await;
        let mut user = repo.create(fixtures::user("ana@example.com", "patient", None)).await.unwrap();

        user.current_mode = "pregnancy".to_string();
        user.medications = vec!["folic acid".to_string()];
        user.fcm_token = Some("token-1".to_string());
        repo.update(user.clone()).await.unwrap();

        let found = repo.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(found.current_mode, "pregnancy");
        assert_eq!(found.medications, vec!["folic acid".to_string()]);
        assert_eq!(found.fcm_token.as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let repo = repo().await;
        let result = repo.update(fixtures::user("ghost@example.com", "patient", None)).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_patients_filters_by_provider_and_name() {
        let repo = repo().await;
        let provider = repo.create(fixtures::user("doc@example.com", "provider", None)).await.unwrap();
        let pid = provider.id.as_str();

        repo.create(fixtures::user("priya@example.com", "patient", Some(pid))).await.unwrap();
        repo.create(fixtures::user("anjali@example.com", "patient", Some(pid))).await.unwrap();
        repo.create(fixtures::user("other@example.com", "patient", None)).await.unwrap();

        let mine = repo.list_patients(PatientFilter {
            provider_id: Some(pid.to_string()),
            name_contains: None,
        }).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].name, "anjali");

        let searched = repo.list_patients(PatientFilter {
            provider_id: Some(pid.to_string()),
            name_contains: Some("PRI".to_string()),
        }).await.unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].name, "priya");

        let clinic = repo.list_patients(PatientFilter::default()).await.unwrap();
        assert_eq!(clinic.len(), 3);

        assert_eq!(repo.count_patients(Some(pid)).await.unwrap(), 2);
        assert_eq!(repo.count_patients(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = repo().await;
        repo.create(fixtures::user("plain@example.com", "patient", None)).await.unwrap();

        let result = repo.list_patients(PatientFilter {
            provider_id: None,
            name_contains: Some("%".to_string()),
        }).await.unwrap();
        assert!(result.is_empty());
    }
}
