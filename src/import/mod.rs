//! Spreadsheet import collaborator.
//!
//! Parses bulk CSV sheets into the pre-shaped records the core accepts:
//! customer rows, product rows, and sale drafts grouped by document code.
//! Drafts enter the ledger through the same [`Store::post`] entry point
//! used by interactive entry.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::core::{InvoiceDraft, InvoiceType, LineItem, PostingError, Store};

pub mod csv;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Parse(String),
    Posting(PostingError),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(e) => write!(f, "io error: {e}"),
            ImportError::Parse(e) => write!(f, "parse error: {e}"),
            ImportError::Posting(e) => write!(f, "posting error: {e}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(e) => Some(e),
            ImportError::Posting(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Io(e)
    }
}

impl From<PostingError> for ImportError {
    fn from(e: PostingError) -> Self {
        ImportError::Posting(e)
    }
}

/// A customer row as it arrives from the sheet: name, phone, address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRow {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// A product row as it arrives from the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub name: String,
    pub unit: String,
    pub default_price: i64,
    pub stock: i64,
}

/// One line of a grouped sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
}

/// All sheet rows sharing one document code, accumulated into a single
/// sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleGroup {
    pub code: String,
    pub customer_name: String,
    pub items: Vec<SaleLine>,
    pub paid_amount: i64,
    /// Sheet date, if the row carried a parseable one.
    pub created_at: Option<DateTime<Utc>>,
}

/// Adds imported customer rows to the store. Returns how many were added.
pub fn add_customers(store: &mut Store, rows: Vec<CustomerRow>) -> usize {
    let count = rows.len();
    for row in rows {
        store.add_customer(row.name, row.phone, row.address);
    }
    info!(count, "Imported customers");
    count
}

/// Adds imported product rows to the store. Returns how many were added.
pub fn add_products(store: &mut Store, rows: Vec<ProductRow>) -> usize {
    let count = rows.len();
    for row in rows {
        store.add_product(row.name, row.unit, row.default_price, row.stock);
    }
    info!(count, "Imported products");
    count
}

/// Posts one sale per group through the ordinary posting path.
///
/// The customer is matched by exact name; with no match the walk-in
/// placeholder takes the document. Imported lines reference no catalog
/// product, so they follow the lenient unknown-product path and leave
/// stock untouched.
pub fn post_sales(store: &mut Store, groups: Vec<SaleGroup>) -> Result<usize, ImportError> {
    let count = groups.len();
    for group in groups {
        let customer_id = match store.find_customer_by_name(&group.customer_name) {
            Some(customer) => customer.id,
            None => store.ensure_walk_in(),
        };
        let mut draft = InvoiceDraft::new(InvoiceType::Sale, customer_id);
        draft.customer_name = group.customer_name;
        draft.code = Some(group.code);
        draft.paid_amount = group.paid_amount;
        draft.created_at = group.created_at;
        draft.items = group
            .items
            .into_iter()
            .map(|line| LineItem {
                product_id: Uuid::nil(),
                name: line.name,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        store.post(draft)?;
    }
    info!(count, "Imported sales");
    Ok(count)
}
