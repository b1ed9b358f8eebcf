use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use fitroom_common::models::{Outfit, OutfitScore};
use fitroom_common::traits::repository_traits::OutfitRepository;

use crate::Error;
use super::status_from_row;

const OUTFIT_COLUMNS: &str = r#"
    outfit_id, user_id, avatar_id, occasion, outfit_key, tryon_key, status, score,
    error_code, error_message, generation_started_at, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PostgresOutfitRepository {
    pool: Pool<Postgres>,
}

impl PostgresOutfitRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn outfit_from_row(r: &PgRow) -> Result<Outfit, Error> {
    let score: Option<Json<OutfitScore>> = r.try_get("score")?;
    Ok(Outfit {
        outfit_id: r.try_get("outfit_id")?,
        user_id: r.try_get("user_id")?,
        avatar_id: r.try_get("avatar_id")?,
        occasion: r.try_get("occasion")?,
        outfit_key: r.try_get("outfit_key")?,
        tryon_key: r.try_get("tryon_key")?,
        status: status_from_row(r)?,
        score: score.map(|Json(s)| s),
        error_code: r.try_get("error_code")?,
        error_message: r.try_get("error_message")?,
        generation_started_at: r.try_get("generation_started_at")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl OutfitRepository for PostgresOutfitRepository {
    async fn insert_if_absent(&self, outfit: &Outfit) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO outfit (
                outfit_id, user_id, avatar_id, occasion, outfit_key, tryon_key,
                status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (avatar_id, outfit_key) DO NOTHING
            "#,
        )
            .bind(&outfit.outfit_id)
            .bind(&outfit.user_id)
            .bind(&outfit.avatar_id)
            .bind(&outfit.occasion)
            .bind(&outfit.outfit_key)
            .bind(&outfit.tryon_key)
            .bind(outfit.status.as_str())
            .bind(outfit.created_at)
            .bind(outfit.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_outfit(&self, outfit_id: &str) -> Result<Option<Outfit>, Error> {
        let row = sqlx::query(&format!("SELECT {OUTFIT_COLUMNS} FROM outfit WHERE outfit_id = $1"))
            .bind(outfit_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(outfit_from_row).transpose()
    }

    async fn get_by_key(&self, avatar_id: &str, outfit_key: &str) -> Result<Option<Outfit>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {OUTFIT_COLUMNS} FROM outfit WHERE avatar_id = $1 AND outfit_key = $2"
        ))
            .bind(avatar_id)
            .bind(outfit_key)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(outfit_from_row).transpose()
    }

    async fn list_for_avatars(&self, user_id: &str, avatar_ids: &[String]) -> Result<Vec<Outfit>, Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {OUTFIT_COLUMNS}
            FROM outfit
            WHERE user_id = $1
              AND avatar_id = ANY($2)
            ORDER BY created_at DESC
            "#
        ))
            .bind(user_id)
            .bind(avatar_ids)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(outfit_from_row).collect()
    }

    async fn add_item(&self, outfit_id: &str, garment_id: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO outfit_item (outfit_id, garment_id)
            VALUES ($1, $2)
            ON CONFLICT (outfit_id, garment_id) DO NOTHING
            "#,
        )
            .bind(outfit_id)
            .bind(garment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_garment_ids(&self, outfit_id: &str) -> Result<Vec<String>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT garment_id
            FROM outfit_item
            WHERE outfit_id = $1
            ORDER BY created_at, garment_id
            "#,
        )
            .bind(outfit_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("garment_id").map_err(Error::from))
            .collect()
    }

    async fn complete_score(
        &self,
        outfit_id: &str,
        lease_started_at: DateTime<Utc>,
        score: &OutfitScore,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE outfit
               SET status = 'succeeded',
                   score = $3,
                   error_code = NULL,
                   error_message = NULL,
                   updated_at = now()
             WHERE outfit_id = $1
               AND status = 'running'
               AND generation_started_at = $2
            "#,
        )
            .bind(outfit_id)
            .bind(lease_started_at)
            .bind(Json(score))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn fail_score(
        &self,
        outfit_id: &str,
        lease_started_at: DateTime<Utc>,
        error_code: &str,
        error_message: &str,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE outfit
               SET status = 'failed',
                   error_code = $3,
                   error_message = $4,
                   updated_at = now()
             WHERE outfit_id = $1
               AND status = 'running'
               AND generation_started_at = $2
            "#,
        )
            .bind(outfit_id)
            .bind(lease_started_at)
            .bind(error_code)
            .bind(error_message)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
