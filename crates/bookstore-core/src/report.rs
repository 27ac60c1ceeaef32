//! # Report Aggregation
//!
//! Reduces raw sales, stock and customer rows into the datasets shown on the
//! reporting dashboard and written to exported workbooks.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  bookstore-db::ReportRepository                                        │
//! │    SaleLine rows (order_date >= since)                                 │
//! │    BookStock rows (all books, units sold all time)                     │
//! │    CustomerOrder rows (order_date >= since)                            │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  build_report(range, type, now, &data, &options)  ← THIS MODULE        │
//! │              │                                                          │
//! │   ┌──────────┼──────────┬─────────────┬──────────────┬─────────────┐   │
//! │   ▼          ▼          ▼             ▼              ▼             ▼   │
//! │ summary   periods   categories    top_books      inventory    customers│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Range Windows
//!
//! | Range       | Bucket label | Window            |
//! |-------------|--------------|-------------------|
//! | `daily`     | `2024-03-07` | last 30 days      |
//! | `monthly`   | `2024-03`    | last 12 months    |
//! | `quarterly` | `2024-Q1`    | last 24 months    |
//! | `yearly`    | `2024`       | all time          |

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TOP_N, UNCATEGORIZED};

// =============================================================================
// Selectors
// =============================================================================

/// Period granularity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Daily,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl DateRange {
    /// Start of the reporting window, or `None` for all time.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateRange::Daily => Some(now - Duration::days(30)),
            DateRange::Monthly => now.checked_sub_months(Months::new(12)),
            DateRange::Quarterly => now.checked_sub_months(Months::new(24)),
            DateRange::Yearly => None,
        }
    }

    /// Bucket label for a timestamp. Labels sort chronologically as strings.
    ///
    /// ## Example
    /// ```rust
    /// use bookstore_core::report::DateRange;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 8, 5, 10, 0, 0).unwrap();
    /// assert_eq!(DateRange::Daily.bucket(at), "2024-08-05");
    /// assert_eq!(DateRange::Monthly.bucket(at), "2024-08");
    /// assert_eq!(DateRange::Quarterly.bucket(at), "2024-Q3");
    /// assert_eq!(DateRange::Yearly.bucket(at), "2024");
    /// ```
    pub fn bucket(&self, at: DateTime<Utc>) -> String {
        match self {
            DateRange::Daily => at.format("%Y-%m-%d").to_string(),
            DateRange::Monthly => at.format("%Y-%m").to_string(),
            DateRange::Quarterly => format!("{}-Q{}", at.year(), (at.month() - 1) / 3 + 1),
            DateRange::Yearly => at.year().to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Daily => "daily",
            DateRange::Monthly => "monthly",
            DateRange::Quarterly => "quarterly",
            DateRange::Yearly => "yearly",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(DateRange::Daily),
            "monthly" => Ok(DateRange::Monthly),
            "quarterly" => Ok(DateRange::Quarterly),
            "yearly" => Ok(DateRange::Yearly),
            _ => Err(ValidationError::NotAllowed {
                field: "range".to_string(),
                allowed: ["daily", "monthly", "quarterly", "yearly"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

/// Which datasets a report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    Overview,
    Sales,
    Inventory,
    Customers,
    Categories,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Overview => "overview",
            ReportType::Sales => "sales",
            ReportType::Inventory => "inventory",
            ReportType::Customers => "customers",
            ReportType::Categories => "categories",
        }
    }

    fn includes_summary(&self) -> bool {
        matches!(self, ReportType::Overview | ReportType::Sales)
    }

    fn includes_sales(&self) -> bool {
        matches!(self, ReportType::Overview | ReportType::Sales)
    }

    fn includes_categories(&self) -> bool {
        matches!(self, ReportType::Overview | ReportType::Categories)
    }

    fn includes_inventory(&self) -> bool {
        matches!(self, ReportType::Overview | ReportType::Inventory)
    }

    fn includes_customers(&self) -> bool {
        matches!(self, ReportType::Overview | ReportType::Customers)
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overview" => Ok(ReportType::Overview),
            "sales" => Ok(ReportType::Sales),
            "inventory" => Ok(ReportType::Inventory),
            "customers" => Ok(ReportType::Customers),
            "categories" => Ok(ReportType::Categories),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: ["overview", "sales", "inventory", "customers", "categories"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Source Rows
// =============================================================================

/// One order line with everything the sales datasets need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub order_id: i64,
    pub order_date: DateTime<Utc>,
    pub customer_id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub quantity: i64,
    /// Unit price charged.
    pub price_cents: i64,
}

impl SaleLine {
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }
}

/// A book's shelf count and its units sold across all orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookStock {
    pub book_id: i64,
    pub title: String,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub stock_quantity: i64,
    pub units_sold: i64,
}

/// An order header attributed to its customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerOrder {
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub order_id: i64,
    pub order_date: DateTime<Utc>,
    pub total_amount_cents: i64,
}

/// Everything `build_report` reduces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportData {
    pub sales: Vec<SaleLine>,
    pub books: Vec<BookStock>,
    pub customer_orders: Vec<CustomerOrder>,
}

/// Knobs read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub low_stock_threshold: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            top_n: DEFAULT_TOP_N,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

// =============================================================================
// Datasets
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodSummary {
    pub period: String,
    pub revenue_cents: i64,
    pub orders: i64,
    pub customers: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategorySummary {
    pub name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopBook {
    pub book_id: i64,
    pub title: String,
    pub author: Option<String>,
    pub sold: i64,
    pub revenue_cents: i64,
    pub orders: i64,
}

/// Inventory health bucket.
///
/// ```text
/// sold == 0              → No Sales
/// stock == 0             → Out of Stock
/// sold / stock > 2       → High Turnover
/// sold / stock > 1       → Good Turnover
/// otherwise              → Low Turnover
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TurnoverStatus {
    #[serde(rename = "No Sales")]
    NoSales,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    #[serde(rename = "High Turnover")]
    HighTurnover,
    #[serde(rename = "Good Turnover")]
    GoodTurnover,
    #[serde(rename = "Low Turnover")]
    LowTurnover,
}

impl TurnoverStatus {
    /// Classifies a book from its units sold and current stock.
    ///
    /// ## Example
    /// ```rust
    /// use bookstore_core::report::TurnoverStatus;
    ///
    /// assert_eq!(TurnoverStatus::classify(0, 0), TurnoverStatus::NoSales);
    /// assert_eq!(TurnoverStatus::classify(4, 0), TurnoverStatus::OutOfStock);
    /// assert_eq!(TurnoverStatus::classify(5, 2), TurnoverStatus::HighTurnover);
    /// ```
    pub fn classify(sold: i64, stock: i64) -> Self {
        if sold == 0 {
            return TurnoverStatus::NoSales;
        }
        if stock <= 0 {
            return TurnoverStatus::OutOfStock;
        }

        // sold / stock > k  ⇔  sold > k * stock  (stock > 0)
        if sold > 2 * stock {
            TurnoverStatus::HighTurnover
        } else if sold > stock {
            TurnoverStatus::GoodTurnover
        } else {
            TurnoverStatus::LowTurnover
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TurnoverStatus::NoSales => "No Sales",
            TurnoverStatus::OutOfStock => "Out of Stock",
            TurnoverStatus::HighTurnover => "High Turnover",
            TurnoverStatus::GoodTurnover => "Good Turnover",
            TurnoverStatus::LowTurnover => "Low Turnover",
        }
    }
}

impl fmt::Display for TurnoverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    pub book_id: i64,
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub stock_quantity: i64,
    pub units_sold: i64,
    /// `units_sold / stock_quantity`; `None` when the shelf is empty.
    pub turnover_ratio: Option<f64>,
    pub status: TurnoverStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerRanking {
    pub customer_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub orders: i64,
    pub total_spent_cents: i64,
    #[ts(as = "String")]
    pub last_order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverviewSummary {
    pub total_revenue_cents: i64,
    pub orders: i64,
    pub customers: i64,
    pub average_order_value_cents: i64,
    pub units_sold: i64,
    pub books: i64,
    pub units_in_stock: i64,
    pub low_stock: i64,
}

/// A fully reduced report. Datasets not covered by `report_type` are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Report {
    pub range: DateRange,
    pub report_type: ReportType,
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub since: Option<DateTime<Utc>>,
    pub summary: Option<OverviewSummary>,
    pub periods: Vec<PeriodSummary>,
    pub categories: Vec<CategorySummary>,
    pub top_books: Vec<TopBook>,
    pub inventory: Vec<InventoryItem>,
    pub customers: Vec<CustomerRanking>,
}

// =============================================================================
// Reduction
// =============================================================================

/// Builds a report from source rows.
///
/// Sales and customer rows outside the range window are ignored even if the
/// caller passed them in. Inventory is not windowed.
pub fn build_report(
    range: DateRange,
    report_type: ReportType,
    now: DateTime<Utc>,
    data: &ReportData,
    options: &ReportOptions,
) -> Report {
    let since = range.since(now);
    let in_window = |at: &DateTime<Utc>| since.map_or(true, |s| *at >= s);

    let sales: Vec<&SaleLine> = data.sales.iter().filter(|l| in_window(&l.order_date)).collect();
    let customer_orders: Vec<&CustomerOrder> = data
        .customer_orders
        .iter()
        .filter(|o| in_window(&o.order_date))
        .collect();

    let mut report = Report {
        range,
        report_type,
        generated_at: now,
        since,
        summary: None,
        periods: Vec::new(),
        categories: Vec::new(),
        top_books: Vec::new(),
        inventory: Vec::new(),
        customers: Vec::new(),
    };

    if report_type.includes_summary() {
        report.summary = Some(overview_summary(&sales, &data.books, options.low_stock_threshold));
    }
    if report_type.includes_sales() {
        report.periods = period_summaries(range, &sales);
        report.top_books = top_books(&sales, options.top_n);
    }
    if report_type.includes_categories() {
        report.categories = category_summaries(&sales);
    }
    if report_type.includes_inventory() {
        report.inventory = inventory_items(&data.books);
    }
    if report_type.includes_customers() {
        report.customers = customer_rankings(&customer_orders);
    }

    report
}

/// Revenue, distinct orders and distinct customers per period bucket.
pub fn period_summaries(range: DateRange, sales: &[&SaleLine]) -> Vec<PeriodSummary> {
    struct Bucket {
        revenue: Money,
        orders: HashSet<i64>,
        customers: HashSet<i64>,
    }

    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    for line in sales {
        let bucket = buckets.entry(range.bucket(line.order_date)).or_insert_with(|| Bucket {
            revenue: Money::zero(),
            orders: HashSet::new(),
            customers: HashSet::new(),
        });
        bucket.revenue += line.revenue();
        bucket.orders.insert(line.order_id);
        bucket.customers.insert(line.customer_id);
    }

    buckets
        .into_iter()
        .map(|(period, b)| PeriodSummary {
            period,
            revenue_cents: b.revenue.cents(),
            orders: b.orders.len() as i64,
            customers: b.customers.len() as i64,
        })
        .collect()
}

/// Units and revenue per category, highest revenue first.
pub fn category_summaries(sales: &[&SaleLine]) -> Vec<CategorySummary> {
    let mut totals: HashMap<&str, (i64, Money)> = HashMap::new();
    for line in sales {
        let name = line.category_name.as_deref().unwrap_or(UNCATEGORIZED);
        let entry = totals.entry(name).or_insert((0, Money::zero()));
        entry.0 += line.quantity;
        entry.1 += line.revenue();
    }

    let mut out: Vec<CategorySummary> = totals
        .into_iter()
        .map(|(name, (units, revenue))| CategorySummary {
            name: name.to_string(),
            units_sold: units,
            revenue_cents: revenue.cents(),
        })
        .collect();

    out.sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents).then_with(|| a.name.cmp(&b.name)));
    out
}

/// Best sellers by copies sold, then revenue.
pub fn top_books(sales: &[&SaleLine], top_n: usize) -> Vec<TopBook> {
    let mut per_book: HashMap<i64, (TopBook, HashSet<i64>)> = HashMap::new();
    for line in sales {
        let (book, orders) = per_book.entry(line.book_id).or_insert_with(|| {
            (
                TopBook {
                    book_id: line.book_id,
                    title: line.book_title.clone(),
                    author: line.author_name.clone(),
                    sold: 0,
                    revenue_cents: 0,
                    orders: 0,
                },
                HashSet::new(),
            )
        });
        book.sold += line.quantity;
        book.revenue_cents += line.revenue().cents();
        orders.insert(line.order_id);
    }

    let mut out: Vec<TopBook> = per_book
        .into_values()
        .map(|(mut book, orders)| {
            book.orders = orders.len() as i64;
            book
        })
        .collect();

    out.sort_by(|a, b| {
        b.sold
            .cmp(&a.sold)
            .then_with(|| b.revenue_cents.cmp(&a.revenue_cents))
            .then_with(|| a.title.cmp(&b.title))
    });
    out.truncate(top_n);
    out
}

/// Turnover classification for every book, in input order.
pub fn inventory_items(books: &[BookStock]) -> Vec<InventoryItem> {
    books
        .iter()
        .map(|b| InventoryItem {
            book_id: b.book_id,
            title: b.title.clone(),
            author: b.author_name.clone(),
            category: b.category_name.clone(),
            stock_quantity: b.stock_quantity,
            units_sold: b.units_sold,
            turnover_ratio: (b.stock_quantity > 0)
                .then(|| b.units_sold as f64 / b.stock_quantity as f64),
            status: TurnoverStatus::classify(b.units_sold, b.stock_quantity),
        })
        .collect()
}

/// Customers by total spent, highest first.
pub fn customer_rankings(orders: &[&CustomerOrder]) -> Vec<CustomerRanking> {
    let mut per_customer: HashMap<i64, CustomerRanking> = HashMap::new();
    for order in orders {
        let entry = per_customer
            .entry(order.customer_id)
            .or_insert_with(|| CustomerRanking {
                customer_id: order.customer_id,
                name: order.customer_name.clone(),
                email: order.customer_email.clone(),
                orders: 0,
                total_spent_cents: 0,
                last_order_date: order.order_date,
            });
        entry.orders += 1;
        entry.total_spent_cents += order.total_amount_cents;
        if order.order_date > entry.last_order_date {
            entry.last_order_date = order.order_date;
        }
    }

    let mut out: Vec<CustomerRanking> = per_customer.into_values().collect();
    out.sort_by(|a, b| {
        b.total_spent_cents
            .cmp(&a.total_spent_cents)
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

/// Headline figures for the overview tiles.
pub fn overview_summary(
    sales: &[&SaleLine],
    books: &[BookStock],
    low_stock_threshold: i64,
) -> OverviewSummary {
    let revenue: Money = sales.iter().map(|l| l.revenue()).sum();
    let orders: HashSet<i64> = sales.iter().map(|l| l.order_id).collect();
    let customers: HashSet<i64> = sales.iter().map(|l| l.customer_id).collect();
    let order_count = orders.len() as i64;

    OverviewSummary {
        total_revenue_cents: revenue.cents(),
        orders: order_count,
        customers: customers.len() as i64,
        average_order_value_cents: revenue.average_over(order_count).cents(),
        units_sold: sales.iter().map(|l| l.quantity).sum(),
        books: books.len() as i64,
        units_in_stock: books.iter().map(|b| b.stock_quantity).sum(),
        low_stock: books
            .iter()
            .filter(|b| b.stock_quantity <= low_stock_threshold)
            .count() as i64,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn sale(order_id: i64, date: DateTime<Utc>, customer_id: i64, book_id: i64, qty: i64, price: i64) -> SaleLine {
        SaleLine {
            order_id,
            order_date: date,
            customer_id,
            book_id,
            book_title: format!("Book {}", book_id),
            author_name: Some("Author".to_string()),
            category_name: if book_id == 3 { None } else { Some(format!("Cat {}", book_id % 2)) },
            quantity: qty,
            price_cents: price,
        }
    }

    fn stock(book_id: i64, stock_quantity: i64, units_sold: i64) -> BookStock {
        BookStock {
            book_id,
            title: format!("Book {}", book_id),
            author_name: None,
            category_name: None,
            stock_quantity,
            units_sold,
        }
    }

    #[test]
    fn test_turnover_classification() {
        assert_eq!(TurnoverStatus::classify(0, 10), TurnoverStatus::NoSales);
        assert_eq!(TurnoverStatus::classify(0, 0), TurnoverStatus::NoSales);
        assert_eq!(TurnoverStatus::classify(1, 0), TurnoverStatus::OutOfStock);
        assert_eq!(TurnoverStatus::classify(7, 3), TurnoverStatus::HighTurnover);
        assert_eq!(TurnoverStatus::classify(6, 3), TurnoverStatus::GoodTurnover);
        assert_eq!(TurnoverStatus::classify(4, 3), TurnoverStatus::GoodTurnover);
        assert_eq!(TurnoverStatus::classify(3, 3), TurnoverStatus::LowTurnover);
        assert_eq!(TurnoverStatus::classify(1, 9), TurnoverStatus::LowTurnover);
    }

    #[test]
    fn test_turnover_serializes_as_label() {
        let json = serde_json::to_string(&TurnoverStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"Out of Stock\"");
    }

    #[test]
    fn test_range_windows() {
        let now = at(2024, 6, 15);
        assert_eq!(DateRange::Daily.since(now), Some(at(2024, 5, 16)));
        assert_eq!(DateRange::Monthly.since(now), Some(at(2023, 6, 15)));
        assert_eq!(DateRange::Quarterly.since(now), Some(at(2022, 6, 15)));
        assert_eq!(DateRange::Yearly.since(now), None);
    }

    #[test]
    fn test_range_parse() {
        assert_eq!("Quarterly".parse::<DateRange>().unwrap(), DateRange::Quarterly);
        assert!("weekly".parse::<DateRange>().is_err());
        assert_eq!("inventory".parse::<ReportType>().unwrap(), ReportType::Inventory);
    }

    #[test]
    fn test_period_buckets_sorted_with_distinct_counts() {
        let lines = vec![
            sale(2, at(2024, 5, 2), 1, 1, 1, 1000),
            sale(1, at(2024, 4, 20), 1, 1, 2, 1000),
            sale(3, at(2024, 5, 9), 2, 2, 1, 500),
            sale(3, at(2024, 5, 9), 2, 2, 1, 500),
        ];
        let refs: Vec<&SaleLine> = lines.iter().collect();

        let periods = period_summaries(DateRange::Monthly, &refs);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].period, "2024-04");
        assert_eq!(periods[0].revenue_cents, 2000);
        assert_eq!(periods[1].period, "2024-05");
        assert_eq!(periods[1].revenue_cents, 2000);
        assert_eq!(periods[1].orders, 2);
        assert_eq!(periods[1].customers, 2);
    }

    #[test]
    fn test_categories_group_uncategorized() {
        let lines = vec![
            sale(1, at(2024, 5, 1), 1, 3, 2, 700),
            sale(2, at(2024, 5, 1), 1, 2, 1, 300),
        ];
        let refs: Vec<&SaleLine> = lines.iter().collect();

        let cats = category_summaries(&refs);
        assert_eq!(cats[0].name, UNCATEGORIZED);
        assert_eq!(cats[0].revenue_cents, 1400);
        assert_eq!(cats[1].name, "Cat 0");
    }

    #[test]
    fn test_top_books_ordering_and_limit() {
        let lines = vec![
            sale(1, at(2024, 5, 1), 1, 1, 3, 100),
            sale(2, at(2024, 5, 1), 1, 2, 3, 200),
            sale(3, at(2024, 5, 1), 2, 4, 1, 9999),
            sale(4, at(2024, 5, 2), 2, 1, 1, 100),
        ];
        let refs: Vec<&SaleLine> = lines.iter().collect();

        let top = top_books(&refs, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].book_id, 1);
        assert_eq!(top[0].sold, 4);
        assert_eq!(top[0].orders, 2);
        assert_eq!(top[1].book_id, 2);
    }

    #[test]
    fn test_customer_rankings() {
        let orders = vec![
            CustomerOrder {
                customer_id: 1,
                customer_name: "Amina".to_string(),
                customer_email: None,
                order_id: 1,
                order_date: at(2024, 1, 1),
                total_amount_cents: 500,
            },
            CustomerOrder {
                customer_id: 2,
                customer_name: "Brian".to_string(),
                customer_email: None,
                order_id: 2,
                order_date: at(2024, 1, 2),
                total_amount_cents: 800,
            },
            CustomerOrder {
                customer_id: 1,
                customer_name: "Amina".to_string(),
                customer_email: None,
                order_id: 3,
                order_date: at(2024, 2, 1),
                total_amount_cents: 600,
            },
        ];
        let refs: Vec<&CustomerOrder> = orders.iter().collect();

        let ranking = customer_rankings(&refs);
        assert_eq!(ranking[0].name, "Amina");
        assert_eq!(ranking[0].orders, 2);
        assert_eq!(ranking[0].total_spent_cents, 1100);
        assert_eq!(ranking[0].last_order_date, at(2024, 2, 1));
        assert_eq!(ranking[1].name, "Brian");
    }

    #[test]
    fn test_build_report_windows_and_selects_datasets() {
        let now = at(2024, 6, 15);
        let data = ReportData {
            sales: vec![
                sale(1, at(2024, 6, 1), 1, 1, 2, 1000),
                sale(2, at(2022, 1, 1), 1, 1, 5, 1000),
            ],
            books: vec![stock(1, 3, 7), stock(2, 10, 0)],
            customer_orders: Vec::new(),
        };

        let report = build_report(
            DateRange::Monthly,
            ReportType::Overview,
            now,
            &data,
            &ReportOptions::default(),
        );
        let summary = report.summary.unwrap();
        assert_eq!(summary.total_revenue_cents, 2000);
        assert_eq!(summary.orders, 1);
        assert_eq!(summary.average_order_value_cents, 2000);
        assert_eq!(summary.units_in_stock, 13);
        assert_eq!(summary.low_stock, 1);
        assert_eq!(report.inventory.len(), 2);
        assert_eq!(report.inventory[0].status, TurnoverStatus::HighTurnover);

        let inventory_only = build_report(
            DateRange::Monthly,
            ReportType::Inventory,
            now,
            &data,
            &ReportOptions::default(),
        );
        assert!(inventory_only.summary.is_none());
        assert!(inventory_only.periods.is_empty());
        assert_eq!(inventory_only.inventory.len(), 2);
    }
}
