use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use fitroom_common::models::Tryon;
use fitroom_common::traits::repository_traits::TryonRepository;

use crate::Error;
use super::status_from_row;

const TRYON_COLUMNS: &str = r#"
    tryon_id, user_id, avatar_id, tryon_key, status, image_key,
    error_code, error_message, generation_started_at, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PostgresTryonRepository {
    pool: Pool<Postgres>,
}

impl PostgresTryonRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn tryon_from_row(r: &PgRow) -> Result<Tryon, Error> {
    Ok(Tryon {
        tryon_id: r.try_get("tryon_id")?,
        user_id: r.try_get("user_id")?,
        avatar_id: r.try_get("avatar_id")?,
        tryon_key: r.try_get("tryon_key")?,
        status: status_from_row(r)?,
        image_key: r.try_get("image_key")?,
        error_code: r.try_get("error_code")?,
        error_message: r.try_get("error_message")?,
        generation_started_at: r.try_get("generation_started_at")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl TryonRepository for PostgresTryonRepository {
    async fn insert_if_absent(&self, tryon: &Tryon) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO tryon (
                tryon_id, user_id, avatar_id, tryon_key, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (avatar_id, tryon_key) DO NOTHING
            "#,
        )
            .bind(&tryon.tryon_id)
            .bind(&tryon.user_id)
            .bind(&tryon.avatar_id)
            .bind(&tryon.tryon_key)
            .bind(tryon.status.as_str())
            .bind(tryon.created_at)
            .bind(tryon.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_tryon(&self, tryon_id: &str) -> Result<Option<Tryon>, Error> {
        let row = sqlx::query(&format!("SELECT {TRYON_COLUMNS} FROM tryon WHERE tryon_id = $1"))
            .bind(tryon_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(tryon_from_row).transpose()
    }

    async fn get_by_key(&self, avatar_id: &str, tryon_key: &str) -> Result<Option<Tryon>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {TRYON_COLUMNS} FROM tryon WHERE avatar_id = $1 AND tryon_key = $2"
        ))
            .bind(avatar_id)
            .bind(tryon_key)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(tryon_from_row).transpose()
    }

    async fn list_for_avatars(&self, avatar_ids: &[String]) -> Result<Vec<Tryon>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {TRYON_COLUMNS} FROM tryon WHERE avatar_id = ANY($1)"
        ))
            .bind(avatar_ids)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(tryon_from_row).collect()
    }

    async fn complete_tryon(
        &self,
        tryon_id: &str,
        lease_started_at: DateTime<Utc>,
        image_key: &str,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE tryon
               SET status = 'succeeded',
                   image_key = $3,
                   error_code = NULL,
                   error_message = NULL,
                   updated_at = now()
             WHERE tryon_id = $1
               AND status = 'running'
               AND generation_started_at = $2
            "#,
        )
            .bind(tryon_id)
            .bind(lease_started_at)
            .bind(image_key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn fail_tryon(
        &self,
        tryon_id: &str,
        lease_started_at: DateTime<Utc>,
        error_code: &str,
        error_message: &str,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE tryon
               SET status = 'failed',
                   error_code = $3,
                   error_message = $4,
                   updated_at = now()
             WHERE tryon_id = $1
               AND status = 'running'
               AND generation_started_at = $2
            "#,
        )
            .bind(tryon_id)
            .bind(lease_started_at)
            .bind(error_code)
            .bind(error_message)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
