//! Integration tests for `TrackRepo` against an in-memory SQLite database.

use aria_db::models::TrackListQuery;
use aria_db::repositories::{NewTrack, TrackRepo};
use aria_db::DbPool;

async fn test_pool() -> DbPool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    aria_db::run_migrations(&pool).await.expect("migrations");
    pool
}

fn track(id: &str, title: &str) -> NewTrack {
    NewTrack {
        id: id.to_string(),
        title: title.to_string(),
        lyrics: "verse one".into(),
        tags: "lofi, piano".into(),
        audio_path: format!("/data/audio/{id}.wav"),
        duration_ms: 120_000,
        max_audio_length_ms: 120_000,
        temperature: 1.0,
        topk: 50,
        cfg_scale: 1.5,
        owner: None,
        created_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn insert_and_find_round_trip() {
    let pool = test_pool().await;
    TrackRepo::insert(&pool, &track("a1", "First")).await.unwrap();

    let found = TrackRepo::find_by_id(&pool, "a1").await.unwrap().unwrap();
    assert_eq!(found.title, "First");
    assert_eq!(found.duration_ms, 120_000);
    assert!(found.thumbnail_path.is_none());

    assert!(TrackRepo::find_by_id(&pool, "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn list_searches_and_paginates() {
    let pool = test_pool().await;
    TrackRepo::insert(&pool, &track("a1", "Morning Rain")).await.unwrap();
    TrackRepo::insert(&pool, &track("a2", "Night Drive")).await.unwrap();
    TrackRepo::insert(&pool, &track("a3", "Rainy Mood")).await.unwrap();

    let all = TrackRepo::list(
        &pool,
        &TrackListQuery {
            search: None,
            page: None,
            page_size: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.items.len(), 3);

    let rain = TrackRepo::list(
        &pool,
        &TrackListQuery {
            search: Some("Rain".into()),
            page: None,
            page_size: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(rain.total, 2);

    let page2 = TrackRepo::list(
        &pool,
        &TrackListQuery {
            search: None,
            page: Some(2),
            page_size: Some(2),
        },
    )
    .await
    .unwrap();
    assert_eq!(page2.total, 3);
    assert_eq!(page2.items.len(), 1);
}

#[tokio::test]
async fn delete_reports_whether_a_row_existed() {
    let pool = test_pool().await;
    TrackRepo::insert(&pool, &track("a1", "First")).await.unwrap();

    assert!(TrackRepo::delete(&pool, "a1").await.unwrap());
    assert!(!TrackRepo::delete(&pool, "a1").await.unwrap());
}

#[tokio::test]
async fn set_thumbnail_updates_existing_rows_only() {
    let pool = test_pool().await;
    TrackRepo::insert(&pool, &track("a1", "First")).await.unwrap();

    assert!(
        TrackRepo::set_thumbnail(&pool, "a1", "/data/audio/a1.png", "album art")
            .await
            .unwrap()
    );
    let found = TrackRepo::find_by_id(&pool, "a1").await.unwrap().unwrap();
    assert_eq!(found.thumbnail_path.as_deref(), Some("/data/audio/a1.png"));
    assert_eq!(found.thumbnail_description.as_deref(), Some("album art"));

    assert!(
        !TrackRepo::set_thumbnail(&pool, "missing", "/p.png", "x")
            .await
            .unwrap()
    );
}
