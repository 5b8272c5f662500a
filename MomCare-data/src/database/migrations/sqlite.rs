use rusqlite::Connection;
use tracing::info;

use crate::database::DatabaseError;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Running SQLite migrations");

    create_users_table(conn)?;
    create_pregnancies_table(conn)?;
    create_vitals_table(conn)?;
    create_alerts_table(conn)?;
    create_messages_table(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Delete every row while keeping the schema
pub fn clear_all_tables(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Clearing all tables");

    conn.execute_batch(
        "DELETE FROM messages;
         DELETE FROM alerts;
         DELETE FROM vitals;
         DELETE FROM pregnancies;
         DELETE FROM users;",
    ).map_err(|e| DatabaseError::Migration(format!("Failed to clear tables: {}", e)))?;

    Ok(())
}

fn create_users_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating users table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'patient',
            name TEXT NOT NULL,
            phone TEXT,
            age INTEGER,
            height_cm REAL,
            weight_kg REAL,
            blood_type TEXT,
            current_mode TEXT NOT NULL DEFAULT 'fertility',
            provider_id TEXT,
            last_menstrual_period TEXT,
            average_cycle_length INTEGER NOT NULL DEFAULT 28,
            average_period_length INTEGER NOT NULL DEFAULT 5,
            medical_conditions TEXT NOT NULL DEFAULT '[]',
            allergies TEXT NOT NULL DEFAULT '[]',
            medications TEXT NOT NULL DEFAULT '[]',
            notifications_enabled INTEGER NOT NULL DEFAULT 1,
            fcm_token TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_provider ON users (provider_id, role);",
    ).map_err(|e| DatabaseError::Migration(format!("Failed to create users table: {}", e)))?;

    Ok(())
}

fn create_pregnancies_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating pregnancies table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS pregnancies (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            last_menstrual_period TEXT NOT NULL,
            due_date TEXT NOT NULL,
            risk_score INTEGER NOT NULL DEFAULT 10,
            risk_level TEXT NOT NULL DEFAULT 'low',
            risk_factors TEXT NOT NULL DEFAULT '[]',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pregnancies_user_active ON pregnancies (user_id, is_active);",
    ).map_err(|e| DatabaseError::Migration(format!("Failed to create pregnancies table: {}", e)))?;

    Ok(())
}

fn create_vitals_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating vitals table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS vitals (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            vital_type TEXT NOT NULL,
            value REAL NOT NULL,
            secondary_value REAL,
            unit TEXT NOT NULL,
            notes TEXT,
            recorded_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_vitals_user_type_date ON vitals (user_id, vital_type, recorded_at DESC);",
    ).map_err(|e| DatabaseError::Migration(format!("Failed to create vitals table: {}", e)))?;

    Ok(())
}

fn create_alerts_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating alerts table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            provider_id TEXT,
            alert_type TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            vital_id TEXT,
            is_read INTEGER NOT NULL DEFAULT 0,
            read_at TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_alerts_patient ON alerts (patient_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_alerts_provider ON alerts (provider_id, is_read, created_at DESC);",
    ).map_err(|e| DatabaseError::Migration(format!("Failed to create alerts table: {}", e)))?;

    Ok(())
}

fn create_messages_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating messages table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            sender_id TEXT NOT NULL,
            receiver_id TEXT NOT NULL,
            content TEXT NOT NULL,
            is_ai INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages (sender_id, receiver_id, created_at);",
    ).map_err(|e| DatabaseError::Migration(format!("Failed to create messages table: {}", e)))?;

    Ok(())
}
