// File: fitroom-core/tests/tryon_generation_tests.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use fitroom_ai::ContentPart;
use fitroom_common::models::{BoundingBox, GenerationStatus, LeaseKind};
use fitroom_core::test_utils::fixtures::{
    avatar, body_profile, garment_in_photo, sample_png, TestHarness, OTHER_USER, USER,
};
use fitroom_core::Error;

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_tryon_success_stores_jpeg() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G2", "G1"]), "work").await?.outfit_id;
    h.transport.push_image(sample_png(48, 96), "image/png");

    let state = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(state.status, GenerationStatus::Succeeded);
    let image_key = state.image_key.expect("image stored");
    assert!(image_key.starts_with("tryons/"));
    assert!(image_key.ends_with(".jpg"));
    assert_eq!(h.blobs.mime_type(&image_key).as_deref(), Some("image/jpeg"));

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "gemini-2.5-flash-image");
    assert_eq!(request.image_count(), 3);
    match &request.parts[0] {
        ContentPart::Text(prompt) => {
            assert!(prompt.contains("Image 0: the PERSON"));
            assert!(prompt.ends_with("Image 1: White Shirt (top)\nImage 2: Navy Trousers (pants)"));
        }
        other => panic!("expected prompt text first, got {other:?}"),
    }
    match &request.parts[1] {
        ContentPart::Image(person) => assert_eq!(person.mime_type, "image/png"),
        other => panic!("expected person photo second, got {other:?}"),
    }

    let again = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(again.image_key.as_deref(), Some(image_key.as_str()));
    assert_eq!(h.transport.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_avatar_without_photo_fails_fast() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    h.store.insert_avatar(avatar(USER, "A1", None, Some(body_profile())));
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G1"]), "work").await?.outfit_id;

    let state = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(state.status, GenerationStatus::Failed);
    assert_eq!(state.error_code.as_deref(), Some("AVATAR_NO_PHOTO"));
    assert!(state.image_key.is_none());
    assert_eq!(h.transport.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_outfit_whose_garments_were_deleted() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G1", "G2"]), "work").await?.outfit_id;
    h.store.remove_garment("G1");
    h.store.remove_garment("G2");

    let state = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(state.error_code.as_deref(), Some("OUTFIT_NO_GARMENTS"));
    assert_eq!(h.transport.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_detected_garment_is_cropped_from_source_photo() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    h.blobs.insert("photos/closet.png", sample_png(200, 100), "image/png");
    h.store.insert_garment(garment_in_photo(
        USER,
        "G3",
        "photos/closet.png",
        BoundingBox { x: 0.2, y: 0.2, w: 0.4, h: 0.4 },
    ));
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G3"]), "work").await?.outfit_id;
    h.transport.push_image(sample_png(16, 16), "image/png");

    let state = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(state.status, GenerationStatus::Succeeded);

    let request = &h.transport.requests()[0];
    assert!(request.prompt_text().ends_with("Image 1: Detected garment (outerwear)"));
    let ContentPart::Image(crop) = &request.parts[2] else {
        panic!("expected garment crop as third part");
    };
    assert_eq!(crop.mime_type, "image/jpeg");
    let decoded = image::load_from_memory(&crop.data).expect("crop decodes");
    assert_eq!((decoded.width(), decoded.height()), (104, 52));
    Ok(())
}

#[tokio::test]
async fn test_text_only_response_is_a_parse_failure() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G1"]), "work").await?.outfit_id;
    h.transport.push_text("I cannot render this image.");

    let state = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(state.status, GenerationStatus::Failed);
    assert_eq!(state.error_code.as_deref(), Some("AI_PARSE_ERROR"));
    assert_eq!(h.store.tryon_count(), 1);
    assert!(h.blobs.keys().iter().all(|k| !k.starts_with("tryons/")));

    h.transport.push_image(sample_png(8, 8), "image/png");
    let retried = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(retried.status, GenerationStatus::Succeeded);
    assert_eq!(retried.id, state.id);
    assert!(retried.error_code.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_photo_object_is_a_storage_failure() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    h.store.insert_avatar(avatar(USER, "A1", Some("avatars/gone.png"), Some(body_profile())));
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G1"]), "work").await?.outfit_id;

    let state = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(state.status, GenerationStatus::Failed);
    assert_eq!(state.error_code.as_deref(), Some("STORAGE_ERROR"));
    assert_eq!(h.transport.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_slow_image_model_times_out() -> Result<(), Error> {
    let h = TestHarness::with_settings(fitroom_core::GenerationSettings {
        tryon_timeout: Duration::from_millis(20),
        ..Default::default()
    });
    h.seed_wardrobe();
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G1"]), "work").await?.outfit_id;
    h.transport.set_delay(Duration::from_millis(200));
    h.transport.push_image(sample_png(8, 8), "image/png");

    let state = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(state.error_code.as_deref(), Some("AI_TIMEOUT"));
    Ok(())
}

#[tokio::test]
async fn test_tryon_row_is_created_on_demand() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let outfit_id = h.store.seed_outfit(USER, "A1", "work");
    assert_eq!(h.store.tryon_count(), 0);

    let state = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(h.store.tryon_count(), 1);
    assert_eq!(state.error_code.as_deref(), Some("OUTFIT_NO_GARMENTS"));
    Ok(())
}

async fn tryon_id(h: &TestHarness, outfit_id: &str) -> Result<String, Error> {
    let detail = h.service.get_outfit(USER, outfit_id).await?;
    Ok(detail.tryon.expect("try-on ensured at creation").id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tryons_across_occasions_share_one_call() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let work = h.service.create_outfit(USER, "A1", &ids(&["G1", "G2"]), "work").await?.outfit_id;
    let date = h.service.create_outfit(USER, "A1", &ids(&["G2", "G1"]), "date").await?.outfit_id;
    h.transport.set_delay(Duration::from_millis(50));
    h.transport.push_image(sample_png(48, 96), "image/png");

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&h.service);
        let id = if i % 2 == 0 { work.clone() } else { date.clone() };
        handles.push(tokio::spawn(async move { service.generate_tryon(USER, &id).await }));
    }

    let shared = tryon_id(&h, &work).await?;
    let mut succeeded = 0;
    for handle in handles {
        let state = handle.await.expect("task panicked")?;
        assert_eq!(state.id, shared);
        match state.status {
            GenerationStatus::Succeeded => succeeded += 1,
            GenerationStatus::Running => assert!(state.image_key.is_none()),
            other => panic!("unexpected status {other}"),
        }
    }

    assert!(succeeded >= 1);
    assert_eq!(h.transport.calls(), 1);
    assert_eq!(h.store.tryon_count(), 1);
    let stored = h.store.tryon(&shared).expect("try-on");
    assert_eq!(stored.status, GenerationStatus::Succeeded);
    Ok(())
}

#[tokio::test]
async fn test_stale_tryon_lease_is_reclaimed_but_fresh_one_is_not() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G1"]), "work").await?.outfit_id;
    let id = tryon_id(&h, &outfit_id).await?;

    h.store.force_running(LeaseKind::Tryon, &id, Utc::now() - ChronoDuration::minutes(1));
    let busy = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(busy.status, GenerationStatus::Running);
    assert!(busy.image_key.is_none());
    assert_eq!(h.transport.calls(), 0);

    h.store.force_running(LeaseKind::Tryon, &id, Utc::now() - ChronoDuration::minutes(10));
    h.transport.push_image(sample_png(48, 96), "image/png");
    let reclaimed = h.service.generate_tryon(USER, &outfit_id).await?;
    assert_eq!(reclaimed.status, GenerationStatus::Succeeded);
    assert!(reclaimed.image_key.is_some());
    assert_eq!(h.transport.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_tryon_image_is_deleted_when_lease_is_lost() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G1"]), "work").await?.outfit_id;
    let id = tryon_id(&h, &outfit_id).await?;
    h.transport.set_delay(Duration::from_millis(150));
    h.transport.push_image(sample_png(48, 96), "image/png");

    let service = Arc::clone(&h.service);
    let outfit = outfit_id.clone();
    let task = tokio::spawn(async move { service.generate_tryon(USER, &outfit).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let takeover = Utc::now() + ChronoDuration::seconds(1);
    h.store.force_running(LeaseKind::Tryon, &id, takeover);

    let state = task.await.expect("task panicked")?;
    assert_eq!(state.status, GenerationStatus::Running);
    assert!(state.image_key.is_none());
    assert_eq!(h.transport.calls(), 1);
    let stored = h.store.tryon(&id).expect("try-on");
    assert_eq!(stored.generation_started_at, Some(takeover));
    assert!(h.blobs.keys().iter().all(|k| !k.starts_with("tryons/")));
    Ok(())
}

#[tokio::test]
async fn test_tryon_image_is_readable_only_by_owner() -> Result<(), Error> {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let outfit_id = h.service.create_outfit(USER, "A1", &ids(&["G1"]), "work").await?.outfit_id;
    h.transport.push_image(sample_png(48, 96), "image/png");
    let image_key = h.service.generate_tryon(USER, &outfit_id).await?.image_key.expect("image stored");

    let bytes = h.service.read_object(USER, &image_key).await?;
    assert!(!bytes.is_empty());
    assert!(matches!(h.service.read_object(OTHER_USER, &image_key).await, Err(Error::NotFound(_))));
    assert!(matches!(h.service.read_object(OTHER_USER, "avatars/A1.png").await, Err(Error::NotFound(_))));
    assert!(matches!(h.service.read_object(USER, "tryons/unknown.jpg").await, Err(Error::NotFound(_))));
    Ok(())
}
