use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use fitroom_common::traits::repository_traits::ObjectOwnershipRepository;

use crate::Error;

#[derive(Clone)]
pub struct PostgresObjectRepository {
    pool: Pool<Postgres>,
}

impl PostgresObjectRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ObjectOwnershipRepository for PostgresObjectRepository {
    async fn owns_object(&self, user_id: &str, key: &str) -> Result<bool, Error> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM avatar WHERE user_id = $1 AND source_photo_key = $2
                UNION ALL
                SELECT 1 FROM garment WHERE user_id = $1 AND (image_key = $2 OR source_photo_key = $2)
                UNION ALL
                SELECT 1 FROM tryon WHERE user_id = $1 AND image_key = $2
            ) AS owned
            "#,
        )
            .bind(user_id)
            .bind(key)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("owned")?)
    }
}
