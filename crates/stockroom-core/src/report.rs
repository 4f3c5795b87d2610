//! # Reports
//!
//! Period arithmetic and read-only aggregations over sales and products.
//!
//! ## Periods
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  period    from                          to                             │
//! │  ───────   ───────────────────────────   ─────────────────────────────  │
//! │  daily     today 00:00:00.000            today 23:59:59.999             │
//! │  weekly    last Sunday 00:00             now                            │
//! │  monthly   1st of this month 00:00       now                            │
//! │  yearly    Jan 1st 00:00                 now                            │
//! │  custom    caller supplied               caller supplied (inclusive)    │
//! │  all       (unbounded)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All boundaries are computed in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Product, Sale};

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Builds a range, rejecting `from > to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: "start must not be after end".to_string(),
            });
        }
        Ok(DateRange { from, to })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Report Period
// =============================================================================

/// Window selector for the sales report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ReportPeriod {
    Daily,
    /// Week starts on Sunday.
    Weekly,
    Monthly,
    Yearly,
    Custom {
        #[ts(as = "String")]
        from: DateTime<Utc>,
        #[ts(as = "String")]
        to: DateTime<Utc>,
    },
    All,
}

impl ReportPeriod {
    /// Resolves the period against `now`. `None` means unbounded.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use stockroom_core::report::ReportPeriod;
    ///
    /// // Wednesday 2024-05-15
    /// let now = Utc.with_ymd_and_hms(2024, 5, 15, 13, 30, 0).unwrap();
    /// let week = ReportPeriod::Weekly.range(now).unwrap();
    /// assert_eq!(week.from, Utc.with_ymd_and_hms(2024, 5, 12, 0, 0, 0).unwrap());
    /// assert_eq!(week.to, now);
    /// ```
    pub fn range(&self, now: DateTime<Utc>) -> Option<DateRange> {
        let today = start_of_day(now);

        match *self {
            ReportPeriod::Daily => Some(DateRange {
                from: today,
                to: today + Duration::days(1) - Duration::milliseconds(1),
            }),
            ReportPeriod::Weekly => {
                let back = i64::from(now.weekday().num_days_from_sunday());
                Some(DateRange {
                    from: today - Duration::days(back),
                    to: now,
                })
            }
            ReportPeriod::Monthly => Some(DateRange {
                from: today - Duration::days(i64::from(now.day0())),
                to: now,
            }),
            ReportPeriod::Yearly => Some(DateRange {
                from: today - Duration::days(i64::from(now.ordinal0())),
                to: now,
            }),
            ReportPeriod::Custom { from, to } => Some(DateRange { from, to }),
            ReportPeriod::All => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Yearly => "yearly",
            ReportPeriod::Custom { .. } => "custom",
            ReportPeriod::All => "all",
        }
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = ValidationError;

    /// Parses the named periods. Custom ranges are built directly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(ReportPeriod::Daily),
            "weekly" => Ok(ReportPeriod::Weekly),
            "monthly" => Ok(ReportPeriod::Monthly),
            "yearly" => Ok(ReportPeriod::Yearly),
            "" | "all" => Ok(ReportPeriod::All),
            other => Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: format!("unknown period '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Sales Summary
// =============================================================================

/// Totals over a set of sales, plus the sales themselves (newest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub period: ReportPeriod,
    pub range: Option<DateRange>,
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_profit_cents: i64,
    pub sales: Vec<Sale>,
}

impl SalesSummary {
    pub fn from_sales(period: ReportPeriod, range: Option<DateRange>, sales: Vec<Sale>) -> Self {
        let total_revenue: Money = sales.iter().map(Sale::total).sum();
        let total_profit: Money = sales.iter().map(Sale::total_profit).sum();

        SalesSummary {
            period,
            range,
            total_sales: sales.len() as i64,
            total_revenue_cents: total_revenue.cents(),
            total_profit_cents: total_profit.cents(),
            sales,
        }
    }

    pub fn total_revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }

    pub fn total_profit(&self) -> Money {
        Money::from_cents(self.total_profit_cents)
    }
}

// =============================================================================
// Stock Report
// =============================================================================

/// Inventory health snapshot.
///
/// Low stock is `quantity < threshold`, so out-of-stock products are counted
/// in both lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockReport {
    pub threshold: i64,
    pub total_products: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    /// Σ cost_price × quantity
    pub total_stock_value_cents: i64,
    pub low_stock: Vec<Product>,
    pub out_of_stock: Vec<Product>,
}

impl StockReport {
    pub fn build(products: &[Product], threshold: i64) -> Self {
        let low_stock: Vec<Product> = products
            .iter()
            .filter(|p| p.stock_quantity < threshold)
            .cloned()
            .collect();
        let out_of_stock: Vec<Product> = products
            .iter()
            .filter(|p| p.stock_quantity == 0)
            .cloned()
            .collect();
        let value: Money = products.iter().map(Product::stock_value).sum();

        StockReport {
            threshold,
            total_products: products.len() as i64,
            low_stock_count: low_stock.len() as i64,
            out_of_stock_count: out_of_stock.len() as i64,
            total_stock_value_cents: value.cents(),
            low_stock,
            out_of_stock,
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_categories: i64,
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_profit_cents: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub total_stock_value_cents: i64,
    pub today_revenue_cents: i64,
    pub today_profit_cents: i64,
    pub today_sales_count: i64,
}

impl DashboardStats {
    /// Folds the stock half of the dashboard from a stock report.
    pub fn with_stock(mut self, report: &StockReport) -> Self {
        self.total_products = report.total_products;
        self.low_stock_count = report.low_stock_count;
        self.out_of_stock_count = report.out_of_stock_count;
        self.total_stock_value_cents = report.total_stock_value_cents;
        self
    }

    /// Folds today's sales into the dashboard.
    pub fn with_today(mut self, today: &SalesSummary) -> Self {
        self.today_revenue_cents = today.total_revenue_cents;
        self.today_profit_cents = today.total_profit_cents;
        self.today_sales_count = today.total_sales;
        self
    }
}

// =============================================================================
// Ledger Audit
// =============================================================================

/// Stored quantity versus the quantity the ledger implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerAudit {
    pub product_id: String,
    pub stored_quantity: i64,
    pub ledger_quantity: i64,
    pub movement_count: i64,
}

impl LedgerAudit {
    pub fn is_consistent(&self) -> bool {
        self.stored_quantity == self.ledger_quantity && self.stored_quantity >= 0
    }

    /// `stored - ledger`; zero when consistent.
    pub fn drift(&self) -> i64 {
        self.stored_quantity - self.ledger_quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn product(id: &str, quantity: i64, cost: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: id.to_string(),
            barcode: format!("{}-bc", id),
            category_id: "c".to_string(),
            cost_price_cents: cost,
            selling_price_cents: cost * 2,
            stock_quantity: quantity,
            stock_status_override: None,
            description: None,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale(id: &str, total: i64, profit: i64) -> Sale {
        Sale {
            sale_id: id.to_string(),
            customer_name: String::new(),
            customer_phone: String::new(),
            customer_address: String::new(),
            items: Vec::new(),
            subtotal_cents: total,
            tax_cents: 0,
            total_cents: total,
            total_profit_cents: profit,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_daily_range() {
        let now = at(2024, 5, 15, 13, 30);
        let range = ReportPeriod::Daily.range(now).unwrap();
        assert_eq!(range.from, at(2024, 5, 15, 0, 0));
        assert!(range.contains(at(2024, 5, 15, 23, 59)));
        assert!(!range.contains(at(2024, 5, 16, 0, 0)));
    }

    #[test]
    fn test_weekly_range_starts_on_sunday() {
        // A Sunday resolves to itself
        let sunday = at(2024, 5, 12, 9, 0);
        assert_eq!(ReportPeriod::Weekly.range(sunday).unwrap().from, at(2024, 5, 12, 0, 0));

        // Saturday goes back six days
        let saturday = at(2024, 5, 18, 9, 0);
        assert_eq!(ReportPeriod::Weekly.range(saturday).unwrap().from, at(2024, 5, 12, 0, 0));
    }

    #[test]
    fn test_monthly_and_yearly_ranges() {
        let now = at(2024, 3, 31, 18, 0);
        assert_eq!(ReportPeriod::Monthly.range(now).unwrap().from, at(2024, 3, 1, 0, 0));
        assert_eq!(ReportPeriod::Yearly.range(now).unwrap().from, at(2024, 1, 1, 0, 0));
        assert_eq!(ReportPeriod::Yearly.range(now).unwrap().to, now);
        assert!(ReportPeriod::All.range(now).is_none());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("Weekly".parse::<ReportPeriod>().unwrap(), ReportPeriod::Weekly);
        assert_eq!("".parse::<ReportPeriod>().unwrap(), ReportPeriod::All);
        assert!("hourly".parse::<ReportPeriod>().is_err());
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        assert!(DateRange::new(at(2024, 1, 2, 0, 0), at(2024, 1, 1, 0, 0)).is_err());
        assert!(DateRange::new(at(2024, 1, 1, 0, 0), at(2024, 1, 1, 0, 0)).is_ok());
    }

    #[test]
    fn test_sales_summary_totals() {
        let summary = SalesSummary::from_sales(
            ReportPeriod::All,
            None,
            vec![sale("a", 3200, 1200), sale("b", 1000, -100)],
        );
        assert_eq!(summary.total_sales, 2);
        assert_eq!(summary.total_revenue().cents(), 4200);
        assert_eq!(summary.total_profit().cents(), 1100);
    }

    #[test]
    fn test_stock_report() {
        let products = vec![product("a", 0, 500), product("b", 6, 500), product("c", 40, 100)];
        let report = StockReport::build(&products, 10);

        assert_eq!(report.total_products, 3);
        assert_eq!(report.low_stock_count, 2);
        assert_eq!(report.out_of_stock_count, 1);
        assert_eq!(report.total_stock_value_cents, 6 * 500 + 40 * 100);
        assert_eq!(report.out_of_stock[0].id, "a");
    }

    #[test]
    fn test_stock_report_value_saturates_on_huge_holdings() {
        let huge = i64::MAX / crate::MAX_PRICE_CENTS + 1;
        let products = vec![
            product("a", huge, crate::MAX_PRICE_CENTS),
            product("b", huge, crate::MAX_PRICE_CENTS),
        ];
        let report = StockReport::build(&products, 10);

        assert_eq!(report.total_stock_value_cents, i64::MAX);
        assert_eq!(report.low_stock_count, 0);
    }

    #[test]
    fn test_dashboard_folds() {
        let report = StockReport::build(&[product("a", 6, 500)], 10);
        let today = SalesSummary::from_sales(ReportPeriod::Daily, None, vec![sale("s", 3200, 1200)]);
        let stats = DashboardStats::default().with_stock(&report).with_today(&today);

        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.low_stock_count, 1);
        assert_eq!(stats.total_stock_value_cents, 3000);
        assert_eq!(stats.today_sales_count, 1);
        assert_eq!(stats.today_profit_cents, 1200);
    }

    #[test]
    fn test_ledger_audit() {
        let ok = LedgerAudit {
            product_id: "p".to_string(),
            stored_quantity: 26,
            ledger_quantity: 26,
            movement_count: 3,
        };
        assert!(ok.is_consistent());

        let drifted = LedgerAudit {
            stored_quantity: 30,
            ..ok
        };
        assert!(!drifted.is_consistent());
        assert_eq!(drifted.drift(), 4);
    }
}
