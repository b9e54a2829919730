use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqlitePool};

use campaign_domain::{Contact, ContactRepository, SchedulerResult};

use crate::database::db_err;

pub struct SqliteContactRepository {
    pool: SqlitePool,
}

impl SqliteContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &SqliteRow) -> SchedulerResult<Contact> {
        let birth_month: Option<i64> = row.try_get("birth_month").map_err(db_err)?;
        let birth_day: Option<i64> = row.try_get("birth_day").map_err(db_err)?;
        Ok(Contact {
            id: row.try_get("id").map_err(db_err)?,
            company_id: row.try_get("company_id").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            phone_number: row.try_get("phone_number").map_err(db_err)?,
            birth_month: birth_month.map(|m| m as u32),
            birth_day: birth_day.map(|d| d as u32),
        })
    }

    pub async fn create_contact(&self, contact: &Contact) -> SchedulerResult<Contact> {
        let result = sqlx::query(
            "INSERT INTO contacts (company_id, name, phone_number, birth_month, birth_day)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(contact.company_id)
        .bind(&contact.name)
        .bind(&contact.phone_number)
        .bind(contact.birth_month.map(|m| m as i64))
        .bind(contact.birth_day.map(|d| d as i64))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let mut created = contact.clone();
        created.id = result.last_insert_rowid();
        Ok(created)
    }

    pub async fn create_group(&self, company_id: i64, name: &str) -> SchedulerResult<i64> {
        let result = sqlx::query("INSERT INTO contact_groups (company_id, name) VALUES (?, ?)")
            .bind(company_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    pub async fn add_group_member(&self, group_id: i64, contact_id: i64) -> SchedulerResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO group_members (group_id, contact_id) VALUES (?, ?)",
        )
        .bind(group_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for SqliteContactRepository {
    async fn get_contacts_by_ids(&self, ids: &[i64]) -> SchedulerResult<Vec<Contact>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::new(
            "SELECT id, company_id, name, phone_number, birth_month, birth_day
             FROM contacts WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        builder.push(") ORDER BY id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn get_group_members(&self, group_id: i64) -> SchedulerResult<Vec<Contact>> {
        let rows = sqlx::query(
            "SELECT c.id, c.company_id, c.name, c.phone_number, c.birth_month, c.birth_day
             FROM contacts c
             INNER JOIN group_members gm ON gm.contact_id = c.id
             WHERE gm.group_id = ?
             ORDER BY c.id",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(Self::map_row).collect()
    }
}
