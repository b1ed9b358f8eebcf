use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use fitroom_common::models::{BoundingBox, Garment};
use fitroom_common::traits::repository_traits::GarmentRepository;

use crate::Error;

/// Read-only access to the garment catalog.
#[derive(Clone)]
pub struct PostgresGarmentRepository {
    pool: Pool<Postgres>,
}

impl PostgresGarmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GarmentRepository for PostgresGarmentRepository {
    async fn get_garments(&self, user_id: &str, garment_ids: &[String]) -> Result<Vec<Garment>, Error> {
        if garment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT garment_id, user_id, name, category, profile, image_key, source_photo_key,
                   bbox_x, bbox_y, bbox_w, bbox_h, created_at
            FROM garment
            WHERE user_id = $1
              AND garment_id = ANY($2)
            "#,
        )
            .bind(user_id)
            .bind(garment_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut garments = Vec::with_capacity(rows.len());
        for r in rows {
            let bbox = match (
                r.try_get::<Option<f64>, _>("bbox_x")?,
                r.try_get::<Option<f64>, _>("bbox_y")?,
                r.try_get::<Option<f64>, _>("bbox_w")?,
                r.try_get::<Option<f64>, _>("bbox_h")?,
            ) {
                (Some(x), Some(y), Some(w), Some(h)) => Some(BoundingBox { x, y, w, h }),
                _ => None,
            };

            garments.push(Garment {
                garment_id: r.try_get("garment_id")?,
                user_id: r.try_get("user_id")?,
                name: r.try_get("name")?,
                category: r.try_get("category")?,
                profile: r.try_get("profile")?,
                image_key: r.try_get("image_key")?,
                source_photo_key: r.try_get("source_photo_key")?,
                bbox,
                created_at: r.try_get("created_at")?,
            });
        }
        Ok(garments)
    }
}
