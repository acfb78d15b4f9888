//! Tests for BlockerService over the sqlx store (SQLite in memory)

use std::collections::HashSet;

use rstest::rstest;
use sqlx::AnyConnection;

use blockerctl::application::services::BlockerService;
use blockerctl::application::BlockerDocument;
use blockerctl::domain::Blocker;
use blockerctl::infrastructure::db::SqlBlockerStore;
use blockerctl::util::testing::{init_test_setup, memory_db};

fn blocker(id: i64, blocker_type: &str, capacity: i64) -> Blocker {
    Blocker::new(id, blocker_type, capacity)
        .with_parameter("nextHop", format!("10.0.{id}.1"))
        .with_parameter("host", format!("10.0.{id}.2"))
        .with_parameter("port", "8080")
}

/// Create `batch` in its own committed transaction.
async fn seed(conn: &mut AnyConnection, batch: &[Blocker]) {
    let mut service = BlockerService::new(SqlBlockerStore::begin(conn).await.unwrap());
    service.create_batch(batch).await.unwrap();
    service.into_store().commit().await.unwrap();
}

async fn fetch_all(conn: &mut AnyConnection) -> Vec<Blocker> {
    let mut service = BlockerService::new(SqlBlockerStore::begin(conn).await.unwrap());
    service.fetch_all().await.unwrap()
}

#[tokio::test]
async fn given_created_blocker_when_fetch_then_returns_supplied_fields() {
    init_test_setup();
    let mut conn = memory_db().await.unwrap();
    let expected = Blocker::new(5, "rate", 100)
        .with_parameter("nextHop", "10.0.0.1")
        .with_parameter("host", "10.0.0.2")
        .with_parameter("port", "8080");
    seed(&mut conn, &[expected.clone()]).await;

    let mut service = BlockerService::new(SqlBlockerStore::begin(&mut conn).await.unwrap());
    let fetched = service.fetch(5).await.unwrap();

    assert_eq!(fetched, Some(expected));
}

#[tokio::test]
async fn given_existing_id_when_create_again_then_original_kept_and_duplicate_reported() {
    init_test_setup();
    let mut conn = memory_db().await.unwrap();
    seed(&mut conn, &[blocker(1, "rate", 100)]).await;
    let clash = blocker(1, "shaper", 999);

    let mut service = BlockerService::new(SqlBlockerStore::begin(&mut conn).await.unwrap());
    let report = service
        .create_batch(&[clash.clone(), blocker(2, "rate", 50)])
        .await
        .unwrap();
    service.into_store().commit().await.unwrap();

    assert_eq!(report.created, vec![2]);
    assert_eq!(report.duplicates, vec![clash]);
    let all = fetch_all(&mut conn).await;
    assert_eq!(all, vec![blocker(1, "rate", 100), blocker(2, "rate", 50)]);
}

#[tokio::test]
async fn given_existing_blocker_when_delete_then_fetch_is_none_and_second_delete_noop() {
    init_test_setup();
    let mut conn = memory_db().await.unwrap();
    seed(&mut conn, &[blocker(5, "rate", 100), blocker(6, "rate", 10)]).await;

    let mut service = BlockerService::new(SqlBlockerStore::begin(&mut conn).await.unwrap());
    let removed = service.delete(5).await.unwrap();
    let again = service.delete(5).await.unwrap();
    let fetched = service.fetch(5).await.unwrap();
    service.into_store().commit().await.unwrap();

    assert_eq!(removed, Some(blocker(5, "rate", 100)));
    assert_eq!(again, None);
    assert_eq!(fetched, None);

    let orphans: Vec<(String,)> =
        sqlx::query_as("SELECT `key` FROM blocker_parameter WHERE blocker_id = 5")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert!(orphans.is_empty(), "parameter rows must be removed too");
    assert_eq!(fetch_all(&mut conn).await, vec![blocker(6, "rate", 10)]);
}

#[rstest]
#[case::empty(0)]
#[case::one(1)]
#[case::several(7)]
#[tokio::test]
async fn given_n_blockers_when_fetch_all_then_returns_n_consistent_records(#[case] n: i64) {
    init_test_setup();
    let mut conn = memory_db().await.unwrap();
    let batch: Vec<Blocker> = (1..=n).map(|id| blocker(id, "rate", id * 10)).collect();
    seed(&mut conn, &batch).await;

    let all = fetch_all(&mut conn).await;

    assert_eq!(all.len() as i64, n);
    for b in &all {
        assert_eq!(b.capacity, b.id * 10);
        assert_eq!(b.parameter("nextHop"), Some(format!("10.0.{}.1", b.id).as_str()));
        assert_eq!(b.parameters.len(), 3);
    }
}

#[tokio::test]
async fn given_fetch_all_dump_when_loaded_into_empty_db_then_same_set() {
    init_test_setup();
    let mut source = memory_db().await.unwrap();
    seed(
        &mut source,
        &[blocker(3, "rate", 30), blocker(1, "shaper", 10), blocker(2, "rate", 20)],
    )
    .await;
    let original = fetch_all(&mut source).await;
    let yaml = BlockerDocument::new(original.clone()).to_yaml().unwrap();

    let reloaded = BlockerDocument::parse(&yaml, "dump.yml".as_ref()).unwrap();
    let mut target = memory_db().await.unwrap();
    seed(&mut target, &reloaded.blocker).await;
    let copied = fetch_all(&mut target).await;

    let as_set = |v: &[Blocker]| v.iter().map(|b| format!("{b:?}")).collect::<HashSet<_>>();
    assert_eq!(as_set(&copied), as_set(&original));
}

#[tokio::test]
async fn given_uncommitted_create_when_store_dropped_then_rolled_back() {
    init_test_setup();
    let mut conn = memory_db().await.unwrap();

    {
        let mut service = BlockerService::new(SqlBlockerStore::begin(&mut conn).await.unwrap());
        service.create_batch(&[blocker(9, "rate", 1)]).await.unwrap();
    }

    assert!(fetch_all(&mut conn).await.is_empty());
}

#[tokio::test]
async fn given_known_id_when_get_then_single_else_all() {
    init_test_setup();
    let mut conn = memory_db().await.unwrap();
    seed(&mut conn, &[blocker(1, "rate", 1), blocker(2, "rate", 2)]).await;

    let mut service = BlockerService::new(SqlBlockerStore::begin(&mut conn).await.unwrap());

    assert_eq!(service.get(2).await.unwrap(), vec![blocker(2, "rate", 2)]);
    assert_eq!(service.get(0).await.unwrap().len(), 2);
    assert_eq!(service.get(42).await.unwrap().len(), 2);
}
