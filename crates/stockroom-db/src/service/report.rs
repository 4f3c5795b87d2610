//! # Report Service
//!
//! Read-only views over sales and stock.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales_report(period, now)   period → DateRange → sales + totals       │
//! │  stock_report()              all products → low / out of stock, value  │
//! │  dashboard_stats(now)        counts + all-time totals + today          │
//! │  audit_ledger(id)            stored quantity vs. signed ledger sum     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here writes. Totals are derived from committed rows only, so a
//! report never shows a sale whose stock was not taken.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{StockError, StockResult};
use crate::pool::Database;
use stockroom_core::report::{
    DashboardStats, DateRange, LedgerAudit, ReportPeriod, SalesSummary, StockReport,
};
use stockroom_core::{ProductFilter, DEFAULT_LOW_STOCK_THRESHOLD};

/// Sales, stock and ledger reports.
#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
    low_stock_threshold: i64,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService {
            db,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    /// Products below `threshold` count as low stock.
    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    /// Sales inside `period`, newest first, with their totals.
    pub async fn sales_report(
        &self,
        period: ReportPeriod,
        now: DateTime<Utc>,
    ) -> StockResult<SalesSummary> {
        let range = match period.range(now) {
            Some(range) => Some(DateRange::new(range.from, range.to)?),
            None => None,
        };

        let sales = self.db.sales().list(range.as_ref()).await?;
        debug!(period = period.label(), count = sales.len(), "Sales report");

        Ok(SalesSummary::from_sales(period, range, sales))
    }

    pub async fn stock_report(&self) -> StockResult<StockReport> {
        let products = self.db.products().list(&ProductFilter::default()).await?;
        Ok(StockReport::build(&products, self.low_stock_threshold))
    }

    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> StockResult<DashboardStats> {
        let stock = self.stock_report().await?;
        let today = self.sales_report(ReportPeriod::Daily, now).await?;
        let totals = self.db.sales().totals(None).await?;
        let total_categories = self.db.categories().count().await?;

        Ok(DashboardStats {
            total_categories,
            total_sales: totals.count,
            total_revenue_cents: totals.revenue_cents,
            total_profit_cents: totals.profit_cents,
            ..DashboardStats::default()
        }
        .with_stock(&stock)
        .with_today(&today))
    }

    /// Compares one product's stored quantity with its ledger.
    pub async fn audit_ledger(&self, product_id: &str) -> StockResult<LedgerAudit> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| StockError::ProductNotFound(product_id.to_string()))?;

        let movements = self.db.movements();
        let audit = LedgerAudit {
            product_id: product.id,
            stored_quantity: product.stock_quantity,
            ledger_quantity: movements.net_quantity(product_id).await?,
            movement_count: movements.count_for_product(product_id).await?,
        };

        if !audit.is_consistent() {
            warn!(
                product_id = %audit.product_id,
                drift = audit.drift(),
                "Stock quantity disagrees with ledger"
            );
        }
        Ok(audit)
    }

    /// Audits every product in one pass.
    pub async fn audit_all(&self) -> StockResult<Vec<LedgerAudit>> {
        let audits = sqlx::query_as::<_, LedgerAudit>(
            r#"
            SELECT
                p.id AS product_id,
                p.stock_quantity AS stored_quantity,
                COALESCE(SUM(CASE m.movement_type
                    WHEN 'OUT' THEN -m.quantity
                    ELSE m.quantity
                END), 0) AS ledger_quantity,
                COUNT(m.id) AS movement_count
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            GROUP BY p.id, p.stock_quantity
            ORDER BY p.rowid
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        let drifting = audits.iter().filter(|a| !a.is_consistent()).count();
        if drifting > 0 {
            warn!(drifting, "Ledger audit found inconsistent products");
        }
        Ok(audits)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use chrono::Duration;
    use stockroom_core::{
        CategoryInput, CustomerInfo, MovementRequest, NewProduct, Product, SaleLineRequest,
        SaleRequest, MAX_MOVEMENT_QUANTITY, MAX_PRICE_CENTS,
    };

    async fn setup() -> (Database, Product, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db
            .catalog()
            .create_category(&CategoryInput {
                name: "Drinks".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let mut products = Vec::new();
        for (barcode, qty) in [("1000001", 20), ("1000002", 3)] {
            products.push(
                db.catalog()
                    .create_product(&NewProduct {
                        name: format!("Item {}", barcode),
                        barcode: Some(barcode.to_string()),
                        category_id: category.id.clone(),
                        cost_price_cents: 500,
                        selling_price_cents: 800,
                        initial_quantity: qty,
                        ..Default::default()
                    })
                    .await
                    .unwrap(),
            );
        }
        let second = products.pop().unwrap();
        let first = products.pop().unwrap();
        (db, first, second)
    }

    fn sale(sale_id: &str, product_id: &str, quantity: i64) -> SaleRequest {
        let subtotal: i64 = quantity * 800;
        SaleRequest {
            sale_id: sale_id.to_string(),
            customer: CustomerInfo::default(),
            lines: vec![SaleLineRequest {
                product_id: product_id.to_string(),
                quantity,
                selling_price_cents: 800,
            }],
            subtotal_cents: subtotal,
            tax_cents: 0,
            total_cents: subtotal,
        }
    }

    #[tokio::test]
    async fn test_sales_report_totals() {
        let (db, first, _) = setup().await;
        db.checkout().complete_sale(&sale("S-1", &first.id, 2)).await.unwrap();
        db.checkout().complete_sale(&sale("S-2", &first.id, 1)).await.unwrap();

        let report = db
            .reports()
            .sales_report(ReportPeriod::Daily, Utc::now())
            .await
            .unwrap();
        assert_eq!(report.total_sales, 2);
        assert_eq!(report.total_revenue_cents, 2_400);
        assert_eq!(report.total_profit_cents, 900);
        assert_eq!(report.sales[0].sale_id, "S-2");

        let all = db.reports().sales_report(ReportPeriod::All, Utc::now()).await.unwrap();
        assert_eq!(all.total_sales, 2);
        assert!(all.range.is_none());

        let past = Utc::now() - Duration::days(30);
        let empty = db
            .reports()
            .sales_report(
                ReportPeriod::Custom {
                    from: past - Duration::days(1),
                    to: past,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(empty.total_sales, 0);
    }

    #[tokio::test]
    async fn test_inverted_custom_range_is_rejected() {
        let (db, _, _) = setup().await;
        let now = Utc::now();

        let err = db
            .reports()
            .sales_report(
                ReportPeriod::Custom {
                    from: now,
                    to: now - Duration::days(1),
                },
                now,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_stock_report_and_threshold() {
        let (db, first, second) = setup().await;
        db.stock()
            .record_movement(&MovementRequest::stock_out(&second.id, 3))
            .await
            .unwrap();

        let report = db.reports().stock_report().await.unwrap();
        assert_eq!(report.total_products, 2);
        assert_eq!(report.out_of_stock_count, 1);
        assert_eq!(report.low_stock_count, 1);
        assert_eq!(report.total_stock_value_cents, 20 * 500);

        let strict = db.reports().with_threshold(25).stock_report().await.unwrap();
        assert_eq!(strict.low_stock_count, 2);
        assert!(strict.low_stock.iter().any(|p| p.id == first.id));
    }

    #[tokio::test]
    async fn test_stock_report_with_ceiling_priced_holdings() {
        let (db, first, _) = setup().await;
        let big = db
            .catalog()
            .create_product(&NewProduct {
                name: "Ingot".to_string(),
                category_id: first.category_id.clone(),
                cost_price_cents: MAX_PRICE_CENTS,
                selling_price_cents: MAX_PRICE_CENTS,
                initial_quantity: MAX_MOVEMENT_QUANTITY,
                ..Default::default()
            })
            .await
            .unwrap();
        db.stock()
            .record_movement(&MovementRequest::stock_in(
                &big.id,
                MAX_MOVEMENT_QUANTITY,
                MAX_PRICE_CENTS,
            ))
            .await
            .unwrap();

        let report = db.reports().stock_report().await.unwrap();
        assert_eq!(
            report.total_stock_value_cents,
            2 * MAX_MOVEMENT_QUANTITY * MAX_PRICE_CENTS + 20 * 500 + 3 * 500
        );

        let stats = db.reports().dashboard_stats(Utc::now()).await.unwrap();
        assert_eq!(stats.total_stock_value_cents, report.total_stock_value_cents);
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let (db, first, _) = setup().await;
        db.checkout().complete_sale(&sale("S-1", &first.id, 5)).await.unwrap();

        let stats = db.reports().dashboard_stats(Utc::now()).await.unwrap();
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_categories, 1);
        assert_eq!(stats.total_sales, 1);
        assert_eq!(stats.total_revenue_cents, 4_000);
        assert_eq!(stats.total_profit_cents, 1_500);
        assert_eq!(stats.today_sales_count, 1);
        assert_eq!(stats.today_revenue_cents, 4_000);
        assert_eq!(stats.total_stock_value_cents, (15 + 3) * 500);
    }

    #[tokio::test]
    async fn test_ledger_audit_matches_after_activity() {
        let (db, first, second) = setup().await;
        db.checkout().complete_sale(&sale("S-1", &first.id, 7)).await.unwrap();
        db.stock()
            .record_movement(&MovementRequest::stock_in(&second.id, 4, 450))
            .await
            .unwrap();
        db.stock()
            .record_movement(&MovementRequest::stock_return(&first.id, 1))
            .await
            .unwrap();

        let audit = db.reports().audit_ledger(&first.id).await.unwrap();
        assert!(audit.is_consistent());
        assert_eq!(audit.stored_quantity, 14);
        assert_eq!(audit.movement_count, 3);

        let all = db.reports().audit_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(LedgerAudit::is_consistent));
        assert_eq!(all[1].ledger_quantity, 7);

        assert!(matches!(
            db.reports().audit_ledger("missing").await,
            Err(StockError::ProductNotFound(_))
        ));
    }
}
