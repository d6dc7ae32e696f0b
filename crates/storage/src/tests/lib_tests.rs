use super::*;

async fn seeded() -> (Storage, CastId) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let root = storage
        .store_cast(&NewCast::root("sunset", "alice", "roots/sunset.png"))
        .await
        .expect("root");
    (storage, root)
}

fn derivative(parent: CastId, branch_num: u32, root: Option<CastId>, prompt: &str) -> NewCast {
    NewCast {
        name: "sunset".to_string(),
        farcaster_id: "artcast".to_string(),
        image_path: None,
        parent_id: Some(parent),
        branch_num,
        prompt_input: Some(prompt.to_string()),
        layer_1_cast_id: root,
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn fetches_root_cast() {
    let (storage, root) = seeded().await;
    let cast = storage.fetch_cast(root).await.expect("fetch").expect("cast");
    assert_eq!(cast.id, root);
    assert_eq!(cast.name, "sunset");
    assert_eq!(cast.farcaster_id, "alice");
    assert_eq!(cast.image_path.as_deref(), Some("roots/sunset.png"));
    assert_eq!(cast.branch_num, 0);
    assert!(cast.is_root());
    assert!(!cast.locked);
    assert!(cast.latest_prompts.is_empty());
    assert!(cast.version_history.is_empty());
}

#[tokio::test]
async fn missing_cast_is_none() {
    let (storage, _) = seeded().await;
    assert!(storage.fetch_cast(CastId(404)).await.expect("fetch").is_none());
}

#[tokio::test]
async fn storing_derivatives_updates_ancestor_counters() {
    let (storage, root) = seeded().await;
    let first = storage
        .store_cast(&derivative(root, 1, None, "purple"))
        .await
        .expect("first");
    let second = storage
        .store_cast(&derivative(first, 2, Some(first), "neon"))
        .await
        .expect("second");
    storage
        .store_cast(&derivative(root, 1, None, "winter"))
        .await
        .expect("sibling");

    let root_cast = storage.fetch_cast(root).await.expect("fetch").expect("root");
    assert_eq!(root_cast.num_derivatives, 2);
    assert_eq!(root_cast.num_total_derivatives, 3);

    let first_cast = storage.fetch_cast(first).await.expect("fetch").expect("first");
    assert_eq!(first_cast.num_derivatives, 1);
    assert_eq!(first_cast.num_total_derivatives, 1);

    let second_cast = storage.fetch_cast(second).await.expect("fetch").expect("second");
    assert_eq!(second_cast.num_total_derivatives, 0);
    assert_eq!(second_cast.parent_id, Some(first));
    assert_eq!(second_cast.layer_1_cast_id, Some(first));
    assert_eq!(second_cast.image_path, None);
}

#[tokio::test]
async fn panels_list_newest_first() {
    let (storage, root) = seeded().await;
    for prompt in ["one", "two", "three", "four", "five", "six"] {
        storage
            .store_cast(&derivative(root, 1, None, prompt))
            .await
            .expect("derivative");
    }

    let cast = storage.fetch_cast(root).await.expect("fetch").expect("root");
    assert_eq!(cast.latest_prompts.len(), PANEL_LIMIT as usize);
    assert_eq!(cast.latest_prompt(), Some("six"));
    assert_eq!(cast.version_history.len(), PANEL_LIMIT as usize);
    assert!(cast
        .version_history
        .windows(2)
        .all(|pair| pair[0].cast_id.0 > pair[1].cast_id.0));
}

#[tokio::test]
async fn locking_root_locks_its_chain() {
    let (storage, root) = seeded().await;
    let first = storage
        .store_cast(&derivative(root, 1, None, "purple"))
        .await
        .expect("first");
    let second = storage
        .store_cast(&derivative(first, 2, Some(first), "neon"))
        .await
        .expect("second");

    storage.lock_layer(first).await.expect("lock");

    assert!(storage.fetch_cast(first).await.expect("fetch").expect("first").locked);
    assert!(storage.fetch_cast(second).await.expect("fetch").expect("second").locked);
    assert!(!storage.fetch_cast(root).await.expect("fetch").expect("root").locked);
}

#[tokio::test]
async fn set_image_path_reports_missing_cast() {
    let (storage, root) = seeded().await;
    let pending = storage
        .store_cast(&derivative(root, 1, None, "purple"))
        .await
        .expect("pending");

    assert!(storage
        .set_image_path(pending, "generated/2.png")
        .await
        .expect("update"));
    assert!(!storage
        .set_image_path(CastId(999), "generated/999.png")
        .await
        .expect("update"));

    let cast = storage.fetch_cast(pending).await.expect("fetch").expect("cast");
    assert_eq!(cast.image_path.as_deref(), Some("generated/2.png"));
}

#[test]
fn memory_urls_have_no_parent_dir() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/artcast.db?mode=rwc"),
        Some(PathBuf::from("./data/artcast.db"))
    );
}
