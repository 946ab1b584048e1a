//! Purchase and restock behaviour against the in-memory store.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use proptest::prelude::*;
use std::sync::Arc;
use sweet_shop_core::{Catalog, CatalogError, Quantity, SweetId};
use sweet_shop_testing::{InMemoryCatalogStore, fixtures, mocks::test_clock};

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::new(
        Arc::new(InMemoryCatalogStore::new()),
        Arc::new(test_clock()),
    ))
}

async fn stocked(catalog: &Catalog, quantity: i64) -> SweetId {
    catalog
        .create(&fixtures::admin(), fixtures::draft("Fudge", quantity))
        .await
        .unwrap()
        .id
}

fn qty(n: i64) -> Quantity {
    Quantity::new(n).unwrap()
}

#[tokio::test]
async fn test_purchase_defaults_to_one_unit() {
    let catalog = catalog();
    let id = stocked(&catalog, 100).await;

    let sweet = catalog.purchase(&fixtures::shopper(), id, None).await.unwrap();
    assert_eq!(sweet.quantity, 99);
}

#[tokio::test]
async fn test_purchase_insufficient_stock_changes_nothing() {
    let catalog = catalog();
    let id = stocked(&catalog, 3).await;

    let err = catalog
        .purchase(&fixtures::shopper(), id, Some(qty(4)))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InsufficientStockOrNotFound));
    assert_eq!(catalog.get(id).await.unwrap().quantity, 3);
}

#[tokio::test]
async fn test_purchase_unknown_item_uses_combined_error() {
    let catalog = catalog();
    let err = catalog
        .purchase(&fixtures::shopper(), SweetId::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "insufficient stock or sweet not found");
}

#[tokio::test]
async fn test_purchase_of_out_of_stock_item_fails() {
    let catalog = catalog();
    let id = stocked(&catalog, 0).await;
    let err = catalog.purchase(&fixtures::shopper(), id, None).await.unwrap_err();
    assert!(matches!(err, CatalogError::InsufficientStockOrNotFound));
}

#[tokio::test]
async fn test_restock_requires_admin() {
    let catalog = catalog();
    let id = stocked(&catalog, 1).await;

    let err = catalog
        .restock(&fixtures::shopper(), id, qty(5))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden));
    assert_eq!(catalog.get(id).await.unwrap().quantity, 1);
}

#[tokio::test]
async fn test_restock_unknown_item_is_not_found() {
    let catalog = catalog();
    let missing = SweetId::new();
    let err = catalog
        .restock(&fixtures::admin(), missing, qty(5))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(id) if id == missing));
}

#[tokio::test]
async fn test_restock_overflow_is_validation_error() {
    let catalog = catalog();
    let id = stocked(&catalog, i64::from(i32::MAX) - 10).await;

    let err = catalog
        .restock(&fixtures::admin(), id, qty(11))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
    assert_eq!(catalog.get(id).await.unwrap().quantity, i32::MAX.unsigned_abs() - 10);
}

#[tokio::test]
async fn test_end_to_end_stock_scenario() {
    let catalog = catalog();
    let admin = fixtures::admin();
    let shopper = fixtures::shopper();
    let id = stocked(&catalog, 100).await;

    let sweet = catalog.purchase(&shopper, id, Some(qty(10))).await.unwrap();
    assert_eq!(sweet.quantity, 90);

    let sweet = catalog.restock(&admin, id, qty(25)).await.unwrap();
    assert_eq!(sweet.quantity, 115);

    let err = catalog.purchase(&shopper, id, Some(qty(200))).await.unwrap_err();
    assert_eq!(err.to_string(), "insufficient stock or sweet not found");
    assert_eq!(catalog.get(id).await.unwrap().quantity, 115);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_cannot_both_succeed() {
    let catalog = catalog();
    let id = stocked(&catalog, 100).await;

    let a = tokio::spawn({
        let catalog = Arc::clone(&catalog);
        async move { catalog.purchase(&fixtures::shopper(), id, Some(qty(60))).await }
    });
    let b = tokio::spawn({
        let catalog = Arc::clone(&catalog);
        async move { catalog.purchase(&fixtures::shopper(), id, Some(qty(60))).await }
    });

    let outcomes = [a.await.unwrap(), b.await.unwrap()];
    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    let rejections = outcomes
        .iter()
        .filter(|o| matches!(o, Err(CatalogError::InsufficientStockOrNotFound)))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(rejections, 1);
    assert_eq!(catalog.get(id).await.unwrap().quantity, 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_unit_purchases_never_overdraw() {
    let catalog = catalog();
    let id = stocked(&catalog, 50).await;

    let handles: Vec<_> = (0..200)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.purchase(&fixtures::shopper(), id, None).await })
        })
        .collect();

    let mut sold = 0;
    for outcome in futures::future::join_all(handles).await {
        if outcome.unwrap().is_ok() {
            sold += 1;
        }
    }

    assert_eq!(sold, 50);
    assert_eq!(catalog.get(id).await.unwrap().quantity, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_restocks_are_additive() {
    let catalog = catalog();
    let id = stocked(&catalog, 75).await;
    let admin = fixtures::admin();

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.restock(&admin, id, qty(1)).await })
        })
        .collect();
    for outcome in futures::future::join_all(handles).await {
        outcome.unwrap().unwrap();
    }

    assert_eq!(catalog.get(id).await.unwrap().quantity, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_restocks_stay_additive_under_interleaved_purchases() {
    const INITIAL: u32 = 75;
    let catalog = catalog();
    let id = stocked(&catalog, i64::from(INITIAL)).await;

    // 25 restocks of 1 and 75 purchases of 3, interleaved on one record
    let handles: Vec<_> = (0..100)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move {
                if i % 4 == 0 {
                    catalog.restock(&fixtures::admin(), id, qty(1)).await.unwrap();
                    1i64
                } else {
                    let outcome = catalog.purchase(&fixtures::shopper(), id, Some(qty(3))).await;
                    match outcome {
                        Ok(_) => -3,
                        Err(err) => {
                            assert!(matches!(err, CatalogError::InsufficientStockOrNotFound));
                            0
                        }
                    }
                }
            })
        })
        .collect();

    let deltas: Vec<i64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let purchases_ok = deltas.iter().filter(|d| **d < 0).count();
    let net: i64 = deltas.iter().sum();

    let remaining = catalog.get(id).await.unwrap().quantity;
    assert_eq!(i64::from(remaining), i64::from(INITIAL) + net);
    assert!(purchases_ok > 0);
    // 100 units in total can never cover more than 33 purchases of 3
    assert!(purchases_ok <= 33);
}

#[derive(Debug, Clone)]
enum Op {
    Purchase(u32),
    Restock(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..40).prop_map(Op::Purchase),
        (1u32..40).prop_map(Op::Restock),
    ]
}

proptest! {
    #[test]
    fn prop_stock_matches_serial_model(initial in 0u32..50, ops in prop::collection::vec(op(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let catalog = catalog();
            let admin = fixtures::admin();
            let shopper = fixtures::shopper();
            let id = stocked(&catalog, i64::from(initial)).await;
            let mut model = initial;

            for op in ops {
                match op {
                    Op::Purchase(n) => {
                        let outcome = catalog.purchase(&shopper, id, Some(qty(i64::from(n)))).await;
                        if model >= n {
                            model -= n;
                            assert_eq!(outcome.unwrap().quantity, model);
                        } else {
                            assert!(matches!(outcome, Err(CatalogError::InsufficientStockOrNotFound)));
                        }
                    }
                    Op::Restock(n) => {
                        model += n;
                        assert_eq!(catalog.restock(&admin, id, qty(i64::from(n))).await.unwrap().quantity, model);
                    }
                }
            }

            assert_eq!(catalog.get(id).await.unwrap().quantity, model);
        });
    }
}
