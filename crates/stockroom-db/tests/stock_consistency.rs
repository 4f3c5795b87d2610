//! Concurrent stock mutations against a file-backed database.
//!
//! `:memory:` pools are pinned to one connection, so these run on a temp
//! file with several pooled connections to get real write contention.

use std::path::PathBuf;

use stockroom_core::{
    CategoryInput, CustomerInfo, MovementRequest, NewProduct, Product, SaleLineRequest,
    SaleRequest,
};
use stockroom_db::{Database, DbConfig, StockError};
use uuid::Uuid;

struct TestStore {
    db: Database,
    path: PathBuf,
}

impl TestStore {
    async fn open() -> Self {
        let path = std::env::temp_dir().join(format!("stockroom-test-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(8))
            .await
            .expect("failed to open test database");
        Self { db, path }
    }

    async fn product(&self, barcode: &str, initial_quantity: i64) -> Product {
        let category = match self.db.catalog().list_categories().await.unwrap().pop() {
            Some(category) => category,
            None => self
                .db
                .catalog()
                .create_category(&CategoryInput {
                    name: "General".to_string(),
                    description: None,
                })
                .await
                .unwrap(),
        };

        self.db
            .catalog()
            .create_product(&NewProduct {
                name: format!("Product {}", barcode),
                barcode: Some(barcode.to_string()),
                category_id: category.id,
                cost_price_cents: 400,
                selling_price_cents: 700,
                initial_quantity,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    async fn quantity(&self, product_id: &str) -> i64 {
        self.db
            .products()
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }
}

impl Drop for TestStore {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

fn single_line_sale(sale_id: String, product_id: &str, quantity: i64) -> SaleRequest {
    SaleRequest {
        sale_id,
        customer: CustomerInfo::default(),
        lines: vec![SaleLineRequest {
            product_id: product_id.to_string(),
            quantity,
            selling_price_cents: 700,
        }],
        subtotal_cents: quantity * 700,
        tax_cents: 0,
        total_cents: quantity * 700,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_outs_never_oversell() {
    let store = TestStore::open().await;
    let product = store.product("2000001", 10).await;

    // 16 requests for 1 unit each against 10 on hand
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let db = store.db.clone();
            let id = product.id.clone();
            tokio::spawn(async move {
                db.stock()
                    .record_movement(&MovementRequest::stock_out(&id, 1))
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(StockError::InsufficientStock { available, .. }) => {
                assert_eq!(available, 0);
                refused += 1;
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(refused, 6);
    assert_eq!(store.quantity(&product.id).await, 0);

    let audit = store.db.reports().audit_ledger(&product.id).await.unwrap();
    assert!(audit.is_consistent());
    assert_eq!(audit.movement_count, 11);

    store.db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_share_stock_exactly() {
    let store = TestStore::open().await;
    let product = store.product("2000002", 9).await;

    // 6 sales of 2 units against 9: at most 4 fit
    let handles: Vec<_> = (0..6)
        .map(|n| {
            let db = store.db.clone();
            let request = single_line_sale(format!("C-{}", n), &product.id, 2);
            tokio::spawn(async move { db.checkout().complete_sale(&request).await })
        })
        .collect();

    let mut committed = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(sale) => committed.push(sale.sale_id),
            Err(StockError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(committed.len(), 4);
    assert_eq!(store.quantity(&product.id).await, 1);

    // Every committed sale has its OUT movement, and only those do
    for sale_id in &committed {
        let notes = format!("Sale {}", sale_id);
        let movements = store.db.movements().with_notes(&notes).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, 2);
    }
    let sales = store.db.checkout().list_sales(None).await.unwrap();
    assert_eq!(sales.len(), 4);

    assert!(store
        .db
        .reports()
        .audit_ledger(&product.id)
        .await
        .unwrap()
        .is_consistent());

    store.db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_sale_ids_commit_once() {
    let store = TestStore::open().await;
    let product = store.product("2000003", 50).await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let db = store.db.clone();
            let request = single_line_sale("DUP-1".to_string(), &product.id, 3);
            tokio::spawn(async move { db.checkout().complete_sale(&request).await })
        })
        .collect();

    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(StockError::DuplicateIdentifier { field, .. }) => assert_eq!(field, "sale_id"),
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(committed, 1);
    assert_eq!(store.quantity(&product.id).await, 47);
    assert!(store.db.reports().audit_all().await.unwrap().iter().all(|a| a.is_consistent()));

    store.db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_traffic_keeps_ledger_consistent() {
    let store = TestStore::open().await;
    let first = store.product("2000004", 30).await;
    let second = store.product("2000005", 5).await;

    let mut handles = Vec::new();
    for n in 0..24 {
        let db = store.db.clone();
        let (a, b) = (first.id.clone(), second.id.clone());
        handles.push(tokio::spawn(async move {
            match n % 4 {
                0 => db
                    .stock()
                    .record_movement(&MovementRequest::stock_in(&a, 2, 400))
                    .await
                    .map(|_| ()),
                1 => db
                    .stock()
                    .record_movement(&MovementRequest::stock_out(&b, 1))
                    .await
                    .map(|_| ()),
                2 => {
                    let mut request = single_line_sale(format!("M-{}", n), &a, 3);
                    request.lines.push(SaleLineRequest {
                        product_id: b.clone(),
                        quantity: 1,
                        selling_price_cents: 700,
                    });
                    db.checkout().complete_sale(&request).await.map(|_| ())
                }
                _ => db
                    .stock()
                    .record_movement(&MovementRequest::stock_return(&b, 1))
                    .await
                    .map(|_| ()),
            }
        }));
    }

    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) | Err(StockError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    for product in [&first, &second] {
        let audit = store.db.reports().audit_ledger(&product.id).await.unwrap();
        assert!(audit.is_consistent(), "drift on {}: {:?}", product.id, audit);
        assert!(audit.stored_quantity >= 0);
    }

    store.db.close().await;
}
