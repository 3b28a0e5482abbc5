use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgExecutor, Row};

use super::{Store, StoreError};
use crate::models::{AlertRecord, AlertSource, AttendanceRecord};

/// Postgres-backed store. Alert documents live in a JSONB column.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Create or upgrade the schema.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

async fn insert_alert_row<'e, E>(executor: E, alert: &AlertRecord) -> Result<(), StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO buscativa.alert_records (id, source, document, recorded_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(alert.id)
    .bind(alert.source.as_str())
    .bind(Json(&alert.document))
    .bind(alert.recorded_at)
    .execute(executor)
    .await?;
    Ok(())
}

fn alert_from_row(row: &PgRow) -> Result<AlertRecord, StoreError> {
    let source: String = row.try_get("source")?;
    let Json(document): Json<Map<String, Value>> = row.try_get("document")?;

    Ok(AlertRecord {
        id: row.try_get("id")?,
        document,
        source: source.parse().map_err(StoreError::Corrupt)?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn insert_attendance(
        &self,
        record: &AttendanceRecord,
        alert: Option<&AlertRecord>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO buscativa.attendance_records
            (id, student, grade, attended_lessons, total_lessons, attendance_percent, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(&record.student)
        .bind(&record.grade)
        .bind(record.attended_lessons)
        .bind(record.total_lessons)
        .bind(record.attendance_percent)
        .bind(record.recorded_at)
        .execute(&mut *tx)
        .await?;

        if let Some(alert) = alert {
            insert_alert_row(&mut *tx, alert).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, student, grade, attended_lessons, total_lessons, attendance_percent, \
             recorded_at \
             FROM buscativa.attendance_records \
             ORDER BY recorded_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(AttendanceRecord {
                id: row.try_get("id")?,
                student: row.try_get("student")?,
                grade: row.try_get("grade")?,
                attended_lessons: row.try_get("attended_lessons")?,
                total_lessons: row.try_get("total_lessons")?,
                attendance_percent: row.try_get("attendance_percent")?,
                recorded_at: row.try_get("recorded_at")?,
            });
        }

        Ok(records)
    }

    async fn insert_alert(&self, alert: &AlertRecord) -> Result<(), StoreError> {
        insert_alert_row(&self.pool, alert).await
    }

    async fn list_alerts(&self) -> Result<Vec<AlertRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, source, document, recorded_at \
             FROM buscativa.alert_records \
             ORDER BY recorded_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(alert_from_row).collect()
    }

    async fn delete_system_alerts(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM buscativa.alert_records WHERE source = $1")
            .bind(AlertSource::System.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
