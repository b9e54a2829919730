use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqlitePool};
use tracing::debug;

use campaign_domain::{
    DispatchStateUpdate, RecipientRef, Schedule, ScheduleRepository, SchedulerError,
    SchedulerResult,
};

use crate::database::db_err;

pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &SqliteRow) -> SchedulerResult<Schedule> {
        let schedule_type: String = row.try_get("schedule_type").map_err(db_err)?;
        let recipients_json: String = row.try_get("recipients").map_err(db_err)?;
        let recipients: Vec<RecipientRef> = serde_json::from_str(&recipients_json)?;

        Ok(Schedule {
            id: row.try_get("id").map_err(db_err)?,
            company_id: row.try_get("company_id").map_err(db_err)?,
            user_id: row.try_get("user_id").map_err(db_err)?,
            schedule_type: schedule_type
                .parse()
                .map_err(SchedulerError::DatabaseOperation)?,
            content: row.try_get("content").map_err(db_err)?,
            scheduled_at: row.try_get("scheduled_at").map_err(db_err)?,
            recurring_pattern: row.try_get("recurring_pattern").map_err(db_err)?,
            next_execution_at: row.try_get("next_execution_at").map_err(db_err)?,
            last_executed_at: row.try_get("last_executed_at").map_err(db_err)?,
            is_active: row.try_get("is_active").map_err(db_err)?,
            recipients,
            created_at: row.try_get("created_at").map_err(db_err)?,
            updated_at: row.try_get("updated_at").map_err(db_err)?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, company_id, user_id, schedule_type, content, scheduled_at, \
     recurring_pattern, next_execution_at, last_executed_at, is_active, recipients, \
     created_at, updated_at";

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepository {
    async fn create(&self, schedule: &Schedule) -> SchedulerResult<Schedule> {
        let recipients_json = serde_json::to_string(&schedule.recipients)?;
        let result = sqlx::query(
            r#"
            INSERT INTO schedules
                (company_id, user_id, schedule_type, content, scheduled_at,
                 recurring_pattern, next_execution_at, last_executed_at, is_active,
                 recipients, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(schedule.company_id)
        .bind(schedule.user_id)
        .bind(schedule.schedule_type.as_str())
        .bind(&schedule.content)
        .bind(schedule.scheduled_at)
        .bind(&schedule.recurring_pattern)
        .bind(schedule.next_execution_at)
        .bind(schedule.last_executed_at)
        .bind(schedule.is_active)
        .bind(recipients_json)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let mut created = schedule.clone();
        created.id = result.last_insert_rowid();
        debug!("创建{}", created.entity_description());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> SchedulerResult<Option<Schedule>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM schedules WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list_by_company(&self, company_id: i64) -> SchedulerResult<Vec<Schedule>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM schedules WHERE company_id = ? ORDER BY id"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(Self::map_row).collect()
    }

    /// 到期选择的双重条件：next_execution_at已到，或尚未计算next的
    /// 新建ONE_TIME计划其scheduled_at已到且从未执行
    async fn find_due(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<Schedule>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM schedules
            WHERE is_active = 1
              AND (
                (next_execution_at IS NOT NULL AND next_execution_at <= ?)
                OR (next_execution_at IS NULL
                    AND schedule_type = 'ONE_TIME'
                    AND last_executed_at IS NULL
                    AND scheduled_at IS NOT NULL
                    AND scheduled_at <= ?)
              )
            ORDER BY id
            "#
        ))
        .bind(now)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn update(&self, schedule: &Schedule) -> SchedulerResult<()> {
        let recipients_json = serde_json::to_string(&schedule.recipients)?;
        let result = sqlx::query(
            r#"
            UPDATE schedules SET
                schedule_type = ?, content = ?, scheduled_at = ?, recurring_pattern = ?,
                next_execution_at = ?, last_executed_at = ?, is_active = ?, recipients = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(schedule.schedule_type.as_str())
        .bind(&schedule.content)
        .bind(schedule.scheduled_at)
        .bind(&schedule.recurring_pattern)
        .bind(schedule.next_execution_at)
        .bind(schedule.last_executed_at)
        .bind(schedule.is_active)
        .bind(recipients_json)
        .bind(Utc::now())
        .bind(schedule.id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(SchedulerError::schedule_not_found(schedule.id));
        }
        Ok(())
    }

    async fn update_dispatch_state(
        &self,
        id: i64,
        update: &DispatchStateUpdate,
    ) -> SchedulerResult<()> {
        let mut builder = QueryBuilder::new("UPDATE schedules SET updated_at = ");
        builder.push_bind(Utc::now());
        if let Some(active) = update.is_active {
            builder.push(", is_active = ").push_bind(active);
        }
        if let Some(next) = update.next_execution_at {
            builder.push(", next_execution_at = ").push_bind(next);
        }
        if let Some(executed_at) = update.last_executed_at {
            builder.push(", last_executed_at = ").push_bind(executed_at);
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(SchedulerError::schedule_not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> SchedulerResult<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
