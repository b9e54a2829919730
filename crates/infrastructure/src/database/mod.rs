//! 数据库连接与迁移

pub mod sqlite;

use std::str::FromStr;

use campaign_config::DatabaseConfig;
use campaign_domain::{SchedulerError, SchedulerResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

pub(crate) fn db_err(err: sqlx::Error) -> SchedulerError {
    SchedulerError::DatabaseOperation(err.to_string())
}

/// 根据配置创建SQLite连接池并执行迁移
pub async fn create_pool(config: &DatabaseConfig) -> SchedulerResult<SqlitePool> {
    let connect_options = SqliteConnectOptions::from_str(&config.url)
        .map_err(db_err)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.connection_timeout_seconds,
        ))
        .connect_with(connect_options)
        .await
        .map_err(db_err)?;

    run_migrations(&pool).await?;
    info!("数据库连接成功: {}", config.url);
    Ok(pool)
}

/// 建表迁移，幂等
pub async fn run_migrations(pool: &SqlitePool) -> SchedulerResult<()> {
    debug!("执行数据库迁移");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            schedule_type TEXT NOT NULL,
            content TEXT NOT NULL,
            scheduled_at DATETIME,
            recurring_pattern TEXT,
            next_execution_at DATETIME,
            last_executed_at DATETIME,
            is_active INTEGER NOT NULL DEFAULT 1,
            recipients TEXT NOT NULL DEFAULT '[]',
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(db_err)?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_schedules_due
         ON schedules (is_active, next_execution_at)",
    )
    .execute(pool)
    .await
    .map_err(db_err)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            birth_month INTEGER,
            birth_day INTEGER
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(db_err)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(db_err)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_members (
            group_id INTEGER NOT NULL,
            contact_id INTEGER NOT NULL,
            PRIMARY KEY (group_id, contact_id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(db_err)?;

    Ok(())
}
