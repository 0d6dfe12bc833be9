//! Persistence of the application snapshot.
//!
//! The whole data set travels as one [`Snapshot`]: customers, products, the
//! invoice log and the pricing memory. Adapters only move snapshots around
//! and take no part in posting atomicity; persistence after a state change
//! is fire-and-forget.

pub mod file;
pub mod memory;

pub use file::{FileStore, export_backup, import_snapshot};
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::core::{Customer, Invoice, PriceBook, Product, StockPolicy, Store};

/// Errors raised by snapshot adapters.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    /// The persisted data could not be parsed; the caller keeps its prior
    /// state.
    Malformed(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "io error: {e}"),
            StorageError::Malformed(e) => write!(f, "malformed snapshot: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Malformed(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// The persisted form of the whole data set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub custom_prices: PriceBook,
}

impl Snapshot {
    /// Captures the store's current state.
    pub fn of(store: &Store) -> Self {
        Self {
            customers: store.customers().to_vec(),
            products: store.products().to_vec(),
            invoices: store.invoices().to_vec(),
            custom_prices: store.prices().clone(),
        }
    }

    /// Rebuilds a live store from this snapshot. The stock policy is a
    /// runtime setting and is not part of the persisted data.
    pub fn into_store(self, stock_policy: StockPolicy) -> Store {
        Store::from_parts(
            self.customers,
            self.products,
            self.invoices,
            self.custom_prices,
            stock_policy,
        )
    }
}

/// Abstraction over snapshot backends.
pub trait SnapshotStore {
    /// Persists the snapshot, replacing whatever was stored before.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError>;
    /// Loads the stored snapshot; an empty backend yields an empty
    /// snapshot.
    fn load(&self) -> Result<Snapshot, StorageError>;
}
