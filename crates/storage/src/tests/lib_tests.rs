use super::*;

fn order_id(n: u128) -> OrderId {
    OrderId(Uuid::from_u128(n))
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn empty_scope_loads_an_empty_set() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let ids = storage.load_archived_orders("viewer-1").await.expect("load");
    assert!(ids.is_empty());
}

#[tokio::test]
async fn archive_set_round_trips() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let ids: HashSet<OrderId> = [order_id(1), order_id(2), order_id(3)].into_iter().collect();

    storage
        .save_archived_orders("viewer-1", &ids)
        .await
        .expect("save");
    let loaded = storage.load_archived_orders("viewer-1").await.expect("load");
    assert_eq!(loaded, ids);
}

#[tokio::test]
async fn save_replaces_the_previous_set() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let first: HashSet<OrderId> = [order_id(1), order_id(2)].into_iter().collect();
    storage
        .save_archived_orders("viewer-1", &first)
        .await
        .expect("save first");

    // Toggle order 2 off, order 7 on: the stored content must equal the new
    // set, not the union of writes.
    let second: HashSet<OrderId> = [order_id(1), order_id(7)].into_iter().collect();
    storage
        .save_archived_orders("viewer-1", &second)
        .await
        .expect("save second");

    let loaded = storage.load_archived_orders("viewer-1").await.expect("load");
    assert_eq!(loaded, second);
}

#[tokio::test]
async fn toggling_on_then_off_restores_the_original_content() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let original: HashSet<OrderId> = [order_id(5)].into_iter().collect();
    storage
        .save_archived_orders("viewer-1", &original)
        .await
        .expect("save original");

    let mut toggled = original.clone();
    toggled.insert(order_id(9));
    storage
        .save_archived_orders("viewer-1", &toggled)
        .await
        .expect("save toggled");

    toggled.remove(&order_id(9));
    storage
        .save_archived_orders("viewer-1", &toggled)
        .await
        .expect("save untoggled");

    let loaded = storage.load_archived_orders("viewer-1").await.expect("load");
    assert_eq!(loaded, original);
}

#[tokio::test]
async fn scopes_are_isolated() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let viewer_a: HashSet<OrderId> = [order_id(1)].into_iter().collect();
    let viewer_b: HashSet<OrderId> = [order_id(2), order_id(3)].into_iter().collect();
    storage
        .save_archived_orders("viewer-a", &viewer_a)
        .await
        .expect("save a");
    storage
        .save_archived_orders("viewer-b", &viewer_b)
        .await
        .expect("save b");

    assert_eq!(
        storage.load_archived_orders("viewer-a").await.expect("a"),
        viewer_a
    );
    assert_eq!(
        storage.load_archived_orders("viewer-b").await.expect("b"),
        viewer_b
    );

    storage
        .save_archived_orders("viewer-a", &HashSet::new())
        .await
        .expect("clear a");
    assert!(storage
        .load_archived_orders("viewer-a")
        .await
        .expect("a cleared")
        .is_empty());
    assert_eq!(
        storage.load_archived_orders("viewer-b").await.expect("b"),
        viewer_b
    );
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("temp dir");
    let db_path = temp_root.path().join("nested").join("archive.db");
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
async fn archive_survives_reopening_the_database() {
    let temp_root = tempfile::tempdir().expect("temp dir");
    let db_path = temp_root.path().join("archive.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let ids: HashSet<OrderId> = [order_id(11), order_id(12)].into_iter().collect();
    {
        let storage = Storage::new(&database_url).await.expect("db");
        storage
            .save_archived_orders("viewer-1", &ids)
            .await
            .expect("save");
    }

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let loaded = reopened
        .load_archived_orders("viewer-1")
        .await
        .expect("load");
    assert_eq!(loaded, ids);
}
