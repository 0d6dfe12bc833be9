//! Read-only reporting views, reconstructed by replaying the invoice log.
//!
//! Nothing here holds state: every function derives its output from the
//! store's log and current customer/product records, so repeated calls over
//! the same data yield identical results.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use super::query::DateRange;
use super::store::Store;
use super::{InvoiceStatus, InvoiceType};

/// Document search returns at most this many matches.
pub const SEARCH_LIMIT: usize = 50;

/// What a debt-ledger row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtLabel {
    Purchase,
    Payment,
    Return,
}

impl std::fmt::Display for DebtLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DebtLabel::Purchase => "purchase",
            DebtLabel::Payment => "payment",
            DebtLabel::Return => "return",
        };
        f.pad(s)
    }
}

/// One balance-affecting event in a customer's debt statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtEntry {
    pub created_at: DateTime<Utc>,
    pub invoice_id: Uuid,
    pub label: DebtLabel,
    pub increase: i64,
    pub decrease: i64,
}

/// Reconstructs one customer's debt statement from the log, newest first.
/// Ties on the timestamp keep their original log order.
pub fn debt_ledger(store: &Store, customer_id: Uuid, range: &DateRange) -> Vec<DebtEntry> {
    let mut entries: Vec<DebtEntry> = store
        .invoices()
        .iter()
        .filter(|inv| {
            inv.customer_id == customer_id
                && inv.status != InvoiceStatus::Cancelled
                && range.matches(&inv.created_at)
        })
        .filter_map(|inv| {
            let (label, increase, decrease) = match inv.kind {
                InvoiceType::Sale => (
                    DebtLabel::Purchase,
                    inv.total_amount - inv.paid_amount,
                    0,
                ),
                InvoiceType::Payment => (DebtLabel::Payment, 0, inv.paid_amount),
                InvoiceType::Return => (
                    DebtLabel::Return,
                    0,
                    inv.total_amount - inv.paid_amount,
                ),
                InvoiceType::Quote | InvoiceType::Order => return None,
            };
            Some(DebtEntry {
                created_at: inv.created_at,
                invoice_id: inv.id,
                label,
                increase,
                decrease,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
}

/// One past sale line for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistoryEntry {
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub kind: InvoiceType,
    pub invoice_id: Uuid,
}

/// Every line across non-cancelled documents that sold, quoted or took back
/// the product, newest first.
pub fn product_price_history(
    store: &Store,
    product_id: Uuid,
    range: &DateRange,
) -> Vec<PriceHistoryEntry> {
    let mut entries = Vec::new();
    for inv in store.invoices() {
        if inv.status == InvoiceStatus::Cancelled || !range.matches(&inv.created_at) {
            continue;
        }
        for item in &inv.items {
            if item.product_id == product_id {
                entries.push(PriceHistoryEntry {
                    created_at: inv.created_at,
                    customer_name: inv.customer_name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    kind: inv.kind,
                    invoice_id: inv.id,
                });
            }
        }
    }
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
}

/// Case-insensitive substring search over invoice id, document code and
/// customer name, capped at [`SEARCH_LIMIT`] matches in log order.
pub fn search_invoices<'a>(
    store: &'a Store,
    text: &str,
    range: &DateRange,
) -> Vec<&'a super::Invoice> {
    let needle = text.to_lowercase();
    store
        .invoices()
        .iter()
        .filter(|inv| {
            range.matches(&inv.created_at)
                && (inv.id.to_string().to_lowercase().contains(&needle)
                    || inv
                        .code
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
                    || inv.customer_name.to_lowercase().contains(&needle))
        })
        .take(SEARCH_LIMIT)
        .collect()
}

/// Headline figures for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    /// Outstanding debt across all customers.
    pub total_debt: i64,
    /// Total of all non-cancelled sales.
    pub total_revenue: i64,
    /// Orders still marked pending.
    pub pending_orders: usize,
}

impl Summary {
    pub fn compute(store: &Store) -> Self {
        let total_debt = store.customers().iter().map(|c| c.total_debt).sum();
        let total_revenue = store
            .invoices()
            .iter()
            .filter(|inv| inv.kind == InvoiceType::Sale && inv.status != InvoiceStatus::Cancelled)
            .map(|inv| inv.total_amount)
            .sum();
        let pending_orders = store
            .invoices()
            .iter()
            .filter(|inv| {
                inv.kind == InvoiceType::Order && inv.status == InvoiceStatus::Pending
            })
            .count();
        Summary {
            total_debt,
            total_revenue,
            pending_orders,
        }
    }
}

/// Sales total for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub total: i64,
}

/// Buckets non-cancelled sale totals by calendar day over the trailing
/// `days` days ending at `today`, oldest day first. `today` is passed in so
/// the series is a pure function of its inputs.
pub fn revenue_by_day(store: &Store, today: NaiveDate, days: u32) -> Vec<DailyRevenue> {
    (0..i64::from(days))
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let total = store
                .invoices()
                .iter()
                .filter(|inv| {
                    inv.kind == InvoiceType::Sale
                        && inv.status != InvoiceStatus::Cancelled
                        && inv.created_at.date_naive() == date
                })
                .map(|inv| inv.total_amount)
                .sum();
            DailyRevenue { date, total }
        })
        .collect()
}
