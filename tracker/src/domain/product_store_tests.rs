//! Tests for the product store.

use std::sync::Arc;

use futures_util::StreamExt;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockProductRepository;
use crate::domain::{ListMembership, ProductDetails};
use crate::outbound::memory::InMemoryProductRepository;

fn details(name: &str, expiry: Option<&str>, in_cart: bool) -> ProductDetails {
    ProductDetails::parse(name, 1, expiry, in_cart).expect("valid details")
}

fn id(value: i64) -> ProductId {
    ProductId::new(value).expect("valid id")
}

#[fixture]
fn store() -> ProductStore {
    ProductStore::new(Arc::new(InMemoryProductRepository::new()))
}

#[rstest]
#[tokio::test]
async fn inserted_product_round_trips_with_assigned_id(store: ProductStore) {
    let details = details("Soda", Some("2025-06-30"), false);

    let outcome = store
        .insert(&ProductDraft::new(details.clone()))
        .await
        .expect("insert");
    let id = outcome.id().expect("inserted");
    let fetched = store.get_by_id(id).await.expect("lookup").expect("row");

    assert_eq!(fetched, Product::new(id, details));
}

#[rstest]
#[tokio::test]
async fn colliding_insert_is_ignored_by_default(store: ProductStore) {
    let draft = ProductDraft::with_id(id(4), details("Sauce", None, false));
    store.insert(&draft).await.expect("first insert");

    let outcome = store.insert(&draft).await.expect("second insert");

    assert_eq!(outcome, InsertOutcome::Ignored);
}

#[rstest]
#[tokio::test]
async fn colliding_insert_fails_under_fail_policy() {
    let store = ProductStore::with_conflict_policy(
        Arc::new(InMemoryProductRepository::new()),
        ConflictPolicy::Fail,
    );
    let draft = ProductDraft::with_id(id(4), details("Sauce", None, false));
    store.insert(&draft).await.expect("first insert");

    let error = store.insert(&draft).await.expect_err("conflict");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn update_of_unknown_id_is_not_found(store: ProductStore) {
    let ghost = Product::new(id(42), details("Ghost", None, false));

    let error = store.update(&ghost).await.expect_err("missing row");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn listings_partition_by_membership(store: ProductStore) {
    for (name, expiry, in_cart) in [
        ("Soda", Some("2025-06-30"), false),
        ("Yogurt", Some("2024-05-22"), true),
        ("Salad", None, true),
        ("Sauce", Some("2025-08-05"), false),
    ] {
        store
            .insert(&ProductDraft::new(details(name, expiry, in_cart)))
            .await
            .expect("insert");
    }

    let home = store.list_at_home().await.expect("home");
    let cart = store.list_in_cart().await.expect("cart");
    let all = store.list_all().await.expect("all");

    assert!(home.iter().all(|p| p.membership() == ListMembership::AtHome));
    assert!(cart.iter().all(|p| p.membership() == ListMembership::InCart));
    assert_eq!(home.len() + cart.len(), all.len());
    let cart_names: Vec<&str> = cart.iter().map(|p| p.name().as_str()).collect();
    assert_eq!(cart_names, vec!["Salad", "Yogurt"]);
}

#[rstest]
#[tokio::test]
async fn connection_errors_map_to_service_unavailable() {
    let mut repo = MockProductRepository::new();
    repo.expect_list()
        .times(1)
        .return_once(|_| Err(ProductRepositoryError::connection("refused")));
    let store = ProductStore::new(Arc::new(repo));

    let error = store.list_all().await.expect_err("unavailable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn query_errors_map_to_internal() {
    let mut repo = MockProductRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Err(ProductRepositoryError::query("syntax")));
    let store = ProductStore::new(Arc::new(repo));

    let error = store.get_by_id(id(1)).await.expect_err("query error");

    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn observe_emits_snapshot_then_after_each_mutation(store: ProductStore) {
    let mut cart = store.observe(ProductQuery::InCart);

    let initial = cart.next().await.expect("initial").expect("snapshot");
    assert!(initial.is_empty());

    let inserted = store
        .insert(&ProductDraft::new(details("Salad", None, true)))
        .await
        .expect("insert")
        .id()
        .expect("inserted");

    let after_insert = cart.next().await.expect("emission").expect("snapshot");
    assert_eq!(after_insert.len(), 1);
    assert_eq!(after_insert[0].id(), inserted);
}

#[rstest]
#[tokio::test]
async fn observe_product_tracks_removal(store: ProductStore) {
    let inserted = store
        .insert(&ProductDraft::new(details("Soda", None, false)))
        .await
        .expect("insert")
        .id()
        .expect("inserted");
    let mut watched = store.observe_product(inserted);

    let current = watched
        .next()
        .await
        .expect("initial")
        .expect("snapshot")
        .expect("row present");
    assert!(store.remove(&current).await.expect("remove"));

    let after = watched.next().await.expect("emission").expect("snapshot");
    assert!(after.is_none());
}

#[rstest]
#[tokio::test]
async fn unmatched_remove_does_not_notify(store: ProductStore) {
    let mut all = store.observe(ProductQuery::All);
    all.next().await.expect("initial").expect("snapshot");

    let ghost = Product::new(id(7), details("Ghost", None, false));
    assert!(!store.remove(&ghost).await.expect("remove"));

    let pending = tokio::time::timeout(std::time::Duration::from_millis(20), all.next()).await;
    assert!(pending.is_err(), "no emission expected for a no-op remove");
}

#[rstest]
#[case("ignore", ConflictPolicy::Ignore)]
#[case(" FAIL ", ConflictPolicy::Fail)]
fn conflict_policy_parses_configuration_spelling(
    #[case] raw: &str,
    #[case] expected: ConflictPolicy,
) {
    assert_eq!(raw.parse::<ConflictPolicy>(), Ok(expected));
}

#[rstest]
fn unknown_conflict_policy_is_rejected() {
    let err = "replace".parse::<ConflictPolicy>().expect_err("unknown policy");
    assert!(err.contains("replace"));
}
