//! The application snapshot and the atomic posting operation.
//!
//! A [`Store`] owns the customer and product records, the append-only
//! invoice log and the pricing memory. All ledger mutations flow through
//! [`Store::post`]; everything else reads.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::posting::{self, PostingEffect, StockPolicy};
use super::prices::PriceBook;
use super::{Customer, Invoice, InvoiceDraft, InvoiceStatus, InvoiceType, PostingError, Product};

/// Name of the placeholder customer used when an imported document matches
/// nobody on file.
pub const WALK_IN_NAME: &str = "Walk-in";

#[derive(Debug, Clone, Default)]
pub struct Store {
    customers: Vec<Customer>,
    products: Vec<Product>,
    invoices: Vec<Invoice>,
    prices: PriceBook,
    stock_policy: StockPolicy,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock_policy(policy: StockPolicy) -> Self {
        Self {
            stock_policy: policy,
            ..Self::default()
        }
    }

    /// Rebuilds a store from previously persisted parts.
    pub fn from_parts(
        customers: Vec<Customer>,
        products: Vec<Product>,
        invoices: Vec<Invoice>,
        prices: PriceBook,
        stock_policy: StockPolicy,
    ) -> Self {
        Self {
            customers,
            products,
            invoices,
            prices,
            stock_policy,
        }
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// The append-only document log, oldest first.
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn prices(&self) -> &PriceBook {
        &self.prices
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    pub fn add_customer(
        &mut self,
        name: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> &Customer {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: phone.into(),
            address: address.into(),
            total_debt: 0,
            created_at: Utc::now(),
        };
        debug!(customer_id = %customer.id, name = %customer.name, "Adding customer");
        let idx = self.customers.len();
        self.customers.push(customer);
        &self.customers[idx]
    }

    pub fn add_product(
        &mut self,
        name: impl Into<String>,
        unit: impl Into<String>,
        default_price: i64,
        stock: i64,
    ) -> &Product {
        let product = Product {
            id: Uuid::new_v4(),
            name: name.into(),
            unit: unit.into(),
            default_price,
            stock,
            created_at: Utc::now(),
        };
        debug!(product_id = %product.id, name = %product.name, "Adding product");
        let idx = self.products.len();
        self.products.push(product);
        &self.products[idx]
    }

    pub fn find_customer(&self, id: Uuid) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn find_customer_by_name(&self, name: &str) -> Option<&Customer> {
        self.customers
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn find_product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn find_product_by_name(&self, name: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn find_invoice(&self, id: Uuid) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    /// Returns the walk-in placeholder customer, creating it on first use.
    pub fn ensure_walk_in(&mut self) -> Uuid {
        if let Some(customer) = self.find_customer_by_name(WALK_IN_NAME) {
            return customer.id;
        }
        self.add_customer(WALK_IN_NAME, "", "").id
    }

    /// Validates the draft, applies its ledger effect and appends the
    /// resulting invoice to the log as one atomic unit. On any error no
    /// document is appended and no balance moves.
    pub fn post(&mut self, draft: InvoiceDraft) -> Result<&Invoice, PostingError> {
        let customer_id = draft.validate()?;
        let total_amount = draft.total_amount();
        let effect = posting::effect_of(
            draft.kind,
            customer_id,
            &draft.items,
            total_amount,
            draft.paid_amount,
            &self.customers,
            &self.products,
            self.stock_policy,
        )?;

        let InvoiceDraft {
            kind,
            customer_name,
            items,
            paid_amount,
            note,
            code,
            created_at,
            ..
        } = draft;
        let customer_name = if customer_name.is_empty() {
            self.find_customer(customer_id)
                .map(|c| c.name.clone())
                .unwrap_or_default()
        } else {
            customer_name
        };

        self.apply(&effect);

        let invoice = Invoice {
            id: Uuid::new_v4(),
            code,
            kind,
            customer_id,
            customer_name,
            items,
            total_amount,
            paid_amount,
            status: InvoiceStatus::Active,
            note,
            created_at: created_at.unwrap_or_else(Utc::now),
        };
        info!(
            invoice_id = %invoice.id,
            kind = %invoice.kind,
            total = invoice.total_amount,
            paid = invoice.paid_amount,
            "Posted invoice"
        );
        let idx = self.invoices.len();
        self.invoices.push(invoice);
        Ok(&self.invoices[idx])
    }

    /// Builds an unposted draft from a logged document. See
    /// [`Invoice::transfer`] for the allowed target types.
    pub fn transfer(
        &self,
        invoice_id: Uuid,
        target: InvoiceType,
    ) -> Result<InvoiceDraft, PostingError> {
        let invoice = self
            .find_invoice(invoice_id)
            .ok_or(PostingError::UnknownInvoice(invoice_id))?;
        invoice.transfer(target)
    }

    /// Changes a logged document's status. Nothing else about the document
    /// changes, and no ledger effect is rolled back or replayed.
    pub fn set_status(
        &mut self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<(), PostingError> {
        let invoice = self
            .invoices
            .iter_mut()
            .find(|i| i.id == invoice_id)
            .ok_or(PostingError::UnknownInvoice(invoice_id))?;
        info!(invoice_id = %invoice_id, status = %status, "Changing invoice status");
        invoice.status = status;
        Ok(())
    }

    fn apply(&mut self, effect: &PostingEffect) {
        if let Some((customer_id, total_debt)) = effect.debt {
            if let Some(customer) = self.customers.iter_mut().find(|c| c.id == customer_id) {
                debug!(customer_id = %customer_id, total_debt, "Updating customer debt");
                customer.total_debt = total_debt;
            }
        }
        for (product_id, delta) in &effect.stock {
            if let Some(product) = self.products.iter_mut().find(|p| p.id == *product_id) {
                product.stock += delta;
            }
        }
        for (customer_id, product_id, unit_price) in &effect.prices {
            self.prices.remember(*customer_id, *product_id, *unit_price);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LineItem;

    fn seeded() -> (Store, Uuid, Uuid) {
        let mut store = Store::new();
        let customer_id = store.add_customer("Mrs Lan", "0901", "12 Market St").id;
        let product_id = store.add_product("rice 5kg", "bag", 120_000, 10).id;
        (store, customer_id, product_id)
    }

    fn sale_draft(customer_id: Uuid, product_id: Uuid, quantity: i64, unit_price: i64) -> InvoiceDraft {
        let mut draft = InvoiceDraft::new(InvoiceType::Sale, customer_id);
        draft.items.push(LineItem {
            product_id,
            name: "rice 5kg".into(),
            quantity,
            unit_price,
        });
        draft
    }

    #[test]
    fn posting_assigns_identity_status_and_total() {
        let (mut store, customer_id, product_id) = seeded();
        let invoice = store
            .post(sale_draft(customer_id, product_id, 2, 100_000))
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Active);
        assert_eq!(invoice.total_amount, 200_000);
        assert_eq!(invoice.customer_name, "Mrs Lan");
        assert!(invoice.created_at <= Utc::now());
    }

    #[test]
    fn rejected_posting_leaves_no_trace() {
        let (mut store, _, product_id) = seeded();
        let err = store
            .post(sale_draft(Uuid::new_v4(), product_id, 2, 100_000))
            .unwrap_err();
        assert!(matches!(err, PostingError::UnknownCustomer(_)));
        assert!(store.invoices().is_empty());
        assert_eq!(store.products()[0].stock, 10);
        assert_eq!(store.customers()[0].total_debt, 0);
        assert!(store.prices().is_empty());
    }

    #[test]
    fn quote_posts_even_for_an_unknown_customer() {
        let (mut store, _, product_id) = seeded();
        let mut draft = sale_draft(Uuid::new_v4(), product_id, 1, 100_000);
        draft.kind = InvoiceType::Quote;
        draft.customer_name = "passer-by".into();
        assert!(store.post(draft).is_ok());
        assert_eq!(store.invoices().len(), 1);
    }

    #[test]
    fn set_status_touches_nothing_else() {
        let (mut store, customer_id, product_id) = seeded();
        let id = store
            .post(sale_draft(customer_id, product_id, 2, 100_000))
            .unwrap()
            .id;
        let before = store.find_invoice(id).unwrap().clone();
        let debt_before = store.customers()[0].total_debt;

        store.set_status(id, InvoiceStatus::Cancelled).unwrap();

        let after = store.find_invoice(id).unwrap();
        assert_eq!(after.status, InvoiceStatus::Cancelled);
        assert_eq!(after.total_amount, before.total_amount);
        assert_eq!(after.items, before.items);
        assert_eq!(store.customers()[0].total_debt, debt_before);

        assert!(matches!(
            store.set_status(Uuid::new_v4(), InvoiceStatus::Open),
            Err(PostingError::UnknownInvoice(_))
        ));
    }

    #[test]
    fn ensure_walk_in_is_idempotent() {
        let mut store = Store::new();
        let first = store.ensure_walk_in();
        let second = store.ensure_walk_in();
        assert_eq!(first, second);
        assert_eq!(store.customers().len(), 1);
    }
}
