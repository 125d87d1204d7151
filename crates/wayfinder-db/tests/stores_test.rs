//! Integration tests for the shared cache and rate-limit store primitives.

use wayfinder_db::queries::stores;

use wayfinder_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn cache_roundtrip_and_overwrite() {
    let (pool, db_name) = create_test_db().await;

    assert!(stores::cache_get(&pool, "cache:test:a").await.unwrap().is_none());

    stores::cache_put(&pool, "cache:test:a", "v1", 60).await.unwrap();
    assert_eq!(
        stores::cache_get(&pool, "cache:test:a").await.unwrap().as_deref(),
        Some("v1")
    );

    stores::cache_put(&pool, "cache:test:a", "v2", 60).await.unwrap();
    assert_eq!(
        stores::cache_get(&pool, "cache:test:a").await.unwrap().as_deref(),
        Some("v2")
    );

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn expired_cache_entry_reads_as_absent() {
    let (pool, db_name) = create_test_db().await;

    stores::cache_put(&pool, "cache:test:ttl", "v", 0).await.unwrap();
    assert!(stores::cache_get(&pool, "cache:test:ttl").await.unwrap().is_none());

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn counter_increments_serially() {
    let (pool, db_name) = create_test_db().await;

    for expected in 1..=5 {
        let count = stores::counter_increment(&pool, "rl:u1:plan:1", 75).await.unwrap();
        assert_eq!(count, expected);
    }

    // A different key counts independently.
    assert_eq!(stores::counter_increment(&pool, "rl:u2:plan:1", 75).await.unwrap(), 1);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn concurrent_increments_never_lose_updates() {
    let (pool, db_name) = create_test_db().await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            stores::counter_increment(&pool, "rl:u1:burst:1", 75).await.unwrap()
        }));
    }

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await.unwrap());
    }
    counts.sort_unstable();
    assert_eq!(counts, (1..=10).collect::<Vec<i64>>());

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn expired_counter_resets_to_one() {
    let (pool, db_name) = create_test_db().await;

    assert_eq!(stores::counter_increment(&pool, "rl:u1:plan:2", 0).await.unwrap(), 1);
    // The previous row is already expired, so the count starts over.
    assert_eq!(stores::counter_increment(&pool, "rl:u1:plan:2", 75).await.unwrap(), 1);
    assert_eq!(stores::counter_increment(&pool, "rl:u1:plan:2", 75).await.unwrap(), 2);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn purge_removes_only_expired_rows() {
    let (pool, db_name) = create_test_db().await;

    stores::cache_put(&pool, "cache:test:dead", "v", 0).await.unwrap();
    stores::cache_put(&pool, "cache:test:live", "v", 60).await.unwrap();
    stores::counter_increment(&pool, "rl:dead:1", 0).await.unwrap();

    let purged = stores::purge_expired(&pool).await.unwrap();
    assert_eq!(purged, 2);

    assert_eq!(
        stores::cache_get(&pool, "cache:test:live").await.unwrap().as_deref(),
        Some("v")
    );

    drop_test_db(&db_name).await;
}
