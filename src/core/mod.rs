//! Core logic for the append-only invoice log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod posting;
pub mod prices;
pub mod query;
pub mod report;
pub mod store;

pub use posting::{PostingEffect, StockPolicy};
pub use prices::PriceBook;
pub use query::DateRange;
pub use store::Store;

/// Errors that can occur when validating or posting an [`InvoiceDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingError {
    /// The draft names no customer.
    MissingCustomer,
    /// The draft carries no line items but its type requires them.
    EmptyItems,
    /// A payment must collect a positive amount.
    NonPositivePayment,
    /// A payment must not carry line items.
    PaymentWithItems,
    /// The referenced customer is not present in the store.
    UnknownCustomer(Uuid),
    /// A sale would drive a product's stock below zero.
    InsufficientStock {
        product: Uuid,
        available: i64,
        requested: i64,
    },
    /// The source document type cannot be transferred into the target type.
    InvalidTransfer(InvoiceType, InvoiceType),
    /// No invoice with the given id exists in the log.
    UnknownInvoice(Uuid),
}

impl std::fmt::Display for PostingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostingError::MissingCustomer => write!(f, "a customer must be selected"),
            PostingError::EmptyItems => write!(f, "at least one line item is required"),
            PostingError::NonPositivePayment => write!(f, "payment amount must be positive"),
            PostingError::PaymentWithItems => write!(f, "a payment cannot carry line items"),
            PostingError::UnknownCustomer(id) => write!(f, "unknown customer: {id}"),
            PostingError::InsufficientStock {
                product,
                available,
                requested,
            } => write!(
                f,
                "insufficient stock for product {product}: {available} available, {requested} requested"
            ),
            PostingError::InvalidTransfer(from, to) => {
                write!(f, "cannot transfer a {from} into a {to}")
            }
            PostingError::UnknownInvoice(id) => write!(f, "unknown invoice: {id}"),
        }
    }
}

impl std::error::Error for PostingError {}

/// The commercial document types a draft may be posted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceType {
    Quote,
    Order,
    Sale,
    Return,
    Payment,
}

impl std::fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvoiceType::Quote => "quote",
            InvoiceType::Order => "order",
            InvoiceType::Sale => "sale",
            InvoiceType::Return => "return",
            InvoiceType::Payment => "payment",
        };
        f.pad(s)
    }
}

impl std::str::FromStr for InvoiceType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quote" => Ok(InvoiceType::Quote),
            "order" => Ok(InvoiceType::Order),
            "sale" => Ok(InvoiceType::Sale),
            "return" => Ok(InvoiceType::Return),
            "payment" => Ok(InvoiceType::Payment),
            other => Err(ParseTypeError(other.to_string())),
        }
    }
}

/// Error returned when a string names no known document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTypeError(pub String);

impl std::fmt::Display for ParseTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown document type: {}", self.0)
    }
}

impl std::error::Error for ParseTypeError {}

/// Lifecycle status of a posted invoice. Only the status may change after
/// posting; monetary fields never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Active,
    Open,
    Pending,
    Cancelled,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvoiceStatus::Active => "active",
            InvoiceStatus::Open => "open",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Cancelled => "cancelled",
        };
        f.pad(s)
    }
}

/// A customer known to the shop, with a denormalized running debt balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    /// Running balance kept in step with the invoice log; mutated only by
    /// posting.
    pub total_debt: i64,
    #[serde(with = "timestamp_pair")]
    pub created_at: DateTime<Utc>,
}

/// A catalog product. Stock is an integer count and may go negative under
/// the default stock policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Unit label shown on documents, e.g. "box" or "kg".
    pub unit: String,
    pub default_price: i64,
    pub stock: i64,
    #[serde(with = "timestamp_pair")]
    pub created_at: DateTime<Utc>,
}

/// One line of a commercial document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "productId")]
    pub product_id: Uuid,
    pub name: String,
    #[serde(rename = "qty")]
    pub quantity: i64,
    #[serde(rename = "price")]
    pub unit_price: i64,
}

impl LineItem {
    pub fn line_total(&self) -> i64 {
        self.quantity * self.unit_price
    }
}

/// A posted commercial document. Part of the append-only log; monetary
/// fields are never mutated after posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    /// External document code, carried over from spreadsheet imports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub kind: InvoiceType,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub status: InvoiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(with = "timestamp_pair")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Builds a new unposted draft from this document, targeted at
    /// `target`. The draft copies the customer and line items and resets
    /// the paid amount; the source document is neither mutated nor linked.
    ///
    /// Allowed transfers are quote -> order and order -> sale.
    pub fn transfer(&self, target: InvoiceType) -> Result<InvoiceDraft, PostingError> {
        match (self.kind, target) {
            (InvoiceType::Quote, InvoiceType::Order) | (InvoiceType::Order, InvoiceType::Sale) => {
                Ok(InvoiceDraft {
                    kind: target,
                    customer_id: Some(self.customer_id),
                    customer_name: self.customer_name.clone(),
                    items: self.items.clone(),
                    paid_amount: 0,
                    note: None,
                    code: None,
                    created_at: None,
                })
            }
            (from, to) => Err(PostingError::InvalidTransfer(from, to)),
        }
    }
}

/// An unposted document under composition. Turned into an [`Invoice`] by
/// [`Store::post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub kind: InvoiceType,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub paid_amount: i64,
    pub note: Option<String>,
    pub code: Option<String>,
    /// Timestamp override used by spreadsheet imports; `None` means "now".
    pub created_at: Option<DateTime<Utc>>,
}

impl InvoiceDraft {
    pub fn new(kind: InvoiceType, customer_id: Uuid) -> Self {
        Self {
            kind,
            customer_id: Some(customer_id),
            customer_name: String::new(),
            items: Vec::new(),
            paid_amount: 0,
            note: None,
            code: None,
            created_at: None,
        }
    }

    /// Checks the draft before any state is touched and returns the
    /// customer id it references.
    pub fn validate(&self) -> Result<Uuid, PostingError> {
        let customer_id = self.customer_id.ok_or(PostingError::MissingCustomer)?;
        match self.kind {
            InvoiceType::Payment => {
                if !self.items.is_empty() {
                    return Err(PostingError::PaymentWithItems);
                }
                if self.paid_amount <= 0 {
                    return Err(PostingError::NonPositivePayment);
                }
            }
            _ => {
                if self.items.is_empty() {
                    return Err(PostingError::EmptyItems);
                }
            }
        }
        Ok(customer_id)
    }

    /// Sum of quantity times unit price over the line items. Zero for a
    /// payment, which carries none.
    pub fn total_amount(&self) -> i64 {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

/// Serializes a [`DateTime<Utc>`] as the persisted `{seconds, nanoseconds}`
/// pair. The native type is used everywhere inside the crate; the pair only
/// appears at the storage boundary.
pub(crate) mod timestamp_pair {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as DeError};

    #[derive(Serialize, Deserialize)]
    struct Pair {
        seconds: i64,
        nanoseconds: u32,
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Pair {
            seconds: ts.timestamp(),
            nanoseconds: ts.timestamp_subsec_nanos(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pair = Pair::deserialize(deserializer)?;
        DateTime::from_timestamp(pair.seconds, pair.nanoseconds)
            .ok_or_else(|| DeError::custom("timestamp out of range"))
    }
}
