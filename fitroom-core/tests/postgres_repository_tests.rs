// File: fitroom-core/tests/postgres_repository_tests.rs
//
// Runs against TEST_DATABASE_URL: `cargo test -p fitroom-core -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::{Pool, Postgres, Row};

use fitroom_ai::{GenerationGateway, RetryPolicy};
use fitroom_common::models::{GenerationStatus, LeaseKind, Outfit};
use fitroom_common::traits::repository_traits::{ObjectOwnershipRepository, OutfitRepository};
use fitroom_core::repositories::postgres::{
    PostgresLeaseRepository, PostgresObjectRepository, PostgresOutfitRepository,
};
use fitroom_core::services::outfit_service::{OutfitService, OutfitStores};
use fitroom_core::test_utils::fixtures::{body_profile, sample_png, score_json, OTHER_USER, USER};
use fitroom_core::test_utils::helpers::setup_test_database;
use fitroom_core::test_utils::memory::InMemoryBlobStore;
use fitroom_core::test_utils::transport::ScriptedTransport;
use fitroom_core::{Error, GenerationSettings, LeaseManager};

async fn seed_wardrobe(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO avatar (avatar_id, user_id, name, source_photo_key, body_profile, height_cm)
        VALUES ('A1', $1, 'Me', 'avatars/A1.png', $2, 170)
        "#,
    )
        .bind(USER)
        .bind(body_profile())
        .execute(pool)
        .await?;

    for (id, name, category) in [("G1", "White Shirt", "top"), ("G2", "Navy Trousers", "pants")] {
        sqlx::query(
            r#"
            INSERT INTO garment (garment_id, user_id, name, category, image_key)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(id)
            .bind(USER)
            .bind(name)
            .bind(category)
            .bind(format!("garments/{id}.png"))
            .execute(pool)
            .await?;
    }
    Ok(())
}

fn postgres_service(pool: Pool<Postgres>) -> (Arc<ScriptedTransport>, Arc<InMemoryBlobStore>, OutfitService) {
    let blobs = Arc::new(InMemoryBlobStore::new());
    blobs.insert("avatars/A1.png", sample_png(64, 128), "image/png");
    blobs.insert("garments/G1.png", sample_png(32, 32), "image/png");
    blobs.insert("garments/G2.png", sample_png(32, 32), "image/png");

    let transport = Arc::new(ScriptedTransport::new());
    let gateway = GenerationGateway::new(transport.clone()).with_retry_policy(RetryPolicy {
        max_retries: 0,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
    });
    let service = OutfitService::new(
        OutfitStores::postgres(pool, blobs.clone()),
        Arc::new(gateway),
        GenerationSettings::default(),
    );
    (transport, blobs, service)
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_outfit_creation_is_idempotent_in_postgres() -> Result<(), Error> {
    let db = setup_test_database().await?;
    seed_wardrobe(db.pool()).await?;
    let (_, _, service) = postgres_service(db.pool().clone());

    let first = service.create_outfit(USER, "A1", &["G1".into(), "G2".into()], "work").await?;
    let second = service.create_outfit(USER, "A1", &["G2".into(), "G1".into()], " Work").await?;
    assert_eq!(first.outfit_id, second.outfit_id);
    assert!(second.cached);

    let counts = sqlx::query(
        r#"
        SELECT (SELECT COUNT(*) FROM outfit) AS outfits,
               (SELECT COUNT(*) FROM outfit_item) AS items,
               (SELECT COUNT(*) FROM tryon) AS tryons
        "#,
    )
        .fetch_one(db.pool())
        .await?;
    assert_eq!(counts.try_get::<i64, _>("outfits")?, 1);
    assert_eq!(counts.try_get::<i64, _>("items")?, 2);
    assert_eq!(counts.try_get::<i64, _>("tryons")?, 1);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_lease_claims_are_exclusive_until_stale() -> Result<(), Error> {
    let db = setup_test_database().await?;
    seed_wardrobe(db.pool()).await?;

    let outfits = PostgresOutfitRepository::new(db.pool().clone());
    let outfit = Outfit::new_pending(USER, "A1", "work", "key-1", "tryon-1");
    assert!(outfits.insert_if_absent(&outfit).await?);
    assert!(!outfits.insert_if_absent(&Outfit::new_pending(USER, "A1", "work", "key-1", "tryon-1")).await?);

    let leases = LeaseManager::new(
        Arc::new(PostgresLeaseRepository::new(db.pool().clone())),
        Duration::from_secs(300),
    );
    let started = Utc::now() - ChronoDuration::minutes(10);
    let first = leases.try_claim_at(LeaseKind::Outfit, &outfit.outfit_id, started).await?;
    let first = first.expect("pending row is claimable");

    // A fresh claimant loses while the lease is live...
    let contender = leases
        .try_claim_at(LeaseKind::Outfit, &outfit.outfit_id, started + ChronoDuration::minutes(1))
        .await?;
    assert!(contender.is_none());

    // ...and wins once it is older than the stale threshold.
    let takeover = leases.try_claim(LeaseKind::Outfit, &outfit.outfit_id).await?.expect("stale lease reclaimed");
    assert!(takeover.started_at > first.started_at);

    let score = serde_json::from_str(&score_json(71))?;
    assert!(!outfits.complete_score(&outfit.outfit_id, first.started_at, &score).await?);
    assert!(outfits.complete_score(&outfit.outfit_id, takeover.started_at, &score).await?);

    let stored = outfits.get_outfit(&outfit.outfit_id).await?.expect("outfit");
    assert_eq!(stored.status, GenerationStatus::Succeeded);
    assert_eq!(stored.generation_started_at, Some(takeover.started_at));
    assert_eq!(stored.score.map(|s| s.scores.overall), Some(71));

    assert!(leases.try_claim(LeaseKind::Outfit, &outfit.outfit_id).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_score_and_tryon_round_trip_through_postgres() -> Result<(), Error> {
    let db = setup_test_database().await?;
    seed_wardrobe(db.pool()).await?;
    let (transport, blobs, service) = postgres_service(db.pool().clone());

    let created = service.create_outfit(USER, "A1", &["G1".into(), "G2".into()], "work").await?;

    transport.push_text(score_json(80));
    let score = service.generate_score(USER, &created.outfit_id).await?;
    assert_eq!(score.status, GenerationStatus::Succeeded);

    transport.push_text("no image today");
    let failed = service.generate_tryon(USER, &created.outfit_id).await?;
    assert_eq!(failed.error_code.as_deref(), Some("AI_PARSE_ERROR"));

    transport.push_image(sample_png(20, 40), "image/png");
    let tryon = service.generate_tryon(USER, &created.outfit_id).await?;
    assert_eq!(tryon.status, GenerationStatus::Succeeded);
    assert!(tryon.error_code.is_none());
    let key = tryon.image_key.expect("image key");
    assert_eq!(blobs.mime_type(&key).as_deref(), Some("image/jpeg"));

    let groups = service.list_outfits_by_avatars(USER, &["A1".into()]).await?;
    assert_eq!(groups[0].outfits.len(), 1);
    assert_eq!(groups[0].outfits[0].overall_score, Some(80));
    assert_eq!(groups[0].outfits[0].tryon_image_key.as_deref(), Some(key.as_str()));
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_object_ownership_follows_referencing_rows() -> Result<(), Error> {
    let db = setup_test_database().await?;
    seed_wardrobe(db.pool()).await?;
    let objects = PostgresObjectRepository::new(db.pool().clone());

    assert!(objects.owns_object(USER, "avatars/A1.png").await?);
    assert!(objects.owns_object(USER, "garments/G2.png").await?);
    assert!(!objects.owns_object(OTHER_USER, "avatars/A1.png").await?);
    assert!(!objects.owns_object(USER, "tryons/unknown.jpg").await?);
    Ok(())
}
