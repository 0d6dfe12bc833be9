//! Per-type ledger mutation rules.
//!
//! Posting an invoice affects customer debt, product stock and the pricing
//! memory. The effect is computed here as a pure value against read-only
//! snapshots; [`Store::post`](super::Store::post) applies it atomically.

use tracing::warn;
use uuid::Uuid;

use super::{Customer, InvoiceType, LineItem, PostingError, Product};

/// Whether a sale may drive product stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Stock is never clamped; a sale may leave it negative.
    #[default]
    AllowNegative,
    /// A sale that would leave any product's stock negative is rejected.
    RejectNegative,
}

/// The complete ledger effect of posting one document. Computed before any
/// state changes; applying it cannot fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingEffect {
    /// New debt balance for the customer, if the document type touches debt.
    pub debt: Option<(Uuid, i64)>,
    /// Stock delta per product, one entry per product, lines merged.
    pub stock: Vec<(Uuid, i64)>,
    /// Pricing-memory writes: (customer, product, unit price).
    pub prices: Vec<(Uuid, Uuid, i64)>,
}

/// Computes the ledger effect for a document of `kind`.
///
/// Debt is clamped to zero only on the decreasing paths (return, payment).
/// Line items referencing a product absent from the snapshot contribute no
/// stock or pricing effect but do not fail the posting.
pub fn effect_of(
    kind: InvoiceType,
    customer_id: Uuid,
    items: &[LineItem],
    total_amount: i64,
    paid_amount: i64,
    customers: &[Customer],
    products: &[Product],
    policy: StockPolicy,
) -> Result<PostingEffect, PostingError> {
    let mut effect = PostingEffect::default();

    match kind {
        InvoiceType::Quote | InvoiceType::Order => {}
        InvoiceType::Sale => {
            let debt = debt_of(customers, customer_id)?;
            effect.debt = Some((customer_id, debt + (total_amount - paid_amount)));
            for item in items {
                if product_exists(products, item.product_id) {
                    bump(&mut effect.stock, item.product_id, -item.quantity);
                    effect
                        .prices
                        .push((customer_id, item.product_id, item.unit_price));
                } else {
                    warn!(product_id = %item.product_id, name = %item.name, "Skipping stock effect for unknown product");
                }
            }
            if policy == StockPolicy::RejectNegative {
                check_stock(products, &effect.stock)?;
            }
        }
        InvoiceType::Return => {
            let debt = debt_of(customers, customer_id)?;
            effect.debt = Some((customer_id, (debt - (total_amount - paid_amount)).max(0)));
            for item in items {
                if product_exists(products, item.product_id) {
                    bump(&mut effect.stock, item.product_id, item.quantity);
                } else {
                    warn!(product_id = %item.product_id, name = %item.name, "Skipping stock effect for unknown product");
                }
            }
        }
        InvoiceType::Payment => {
            let debt = debt_of(customers, customer_id)?;
            effect.debt = Some((customer_id, (debt - paid_amount).max(0)));
        }
    }

    Ok(effect)
}

fn debt_of(customers: &[Customer], id: Uuid) -> Result<i64, PostingError> {
    customers
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.total_debt)
        .ok_or(PostingError::UnknownCustomer(id))
}

fn product_exists(products: &[Product], id: Uuid) -> bool {
    products.iter().any(|p| p.id == id)
}

fn bump(deltas: &mut Vec<(Uuid, i64)>, id: Uuid, delta: i64) {
    if let Some(idx) = deltas.iter().position(|(existing, _)| *existing == id) {
        deltas[idx].1 += delta;
    } else {
        deltas.push((id, delta));
    }
}

fn check_stock(products: &[Product], deltas: &[(Uuid, i64)]) -> Result<(), PostingError> {
    for (id, delta) in deltas {
        if let Some(product) = products.iter().find(|p| p.id == *id) {
            if product.stock + delta < 0 {
                return Err(PostingError::InsufficientStock {
                    product: *id,
                    available: product.stock,
                    requested: -delta,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(debt: i64) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Mrs Lan".into(),
            phone: "0901".into(),
            address: String::new(),
            total_debt: debt,
            created_at: Utc::now(),
        }
    }

    fn product(stock: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "rice 5kg".into(),
            unit: "bag".into(),
            default_price: 120_000,
            stock,
            created_at: Utc::now(),
        }
    }

    fn line(product_id: Uuid, quantity: i64, unit_price: i64) -> LineItem {
        LineItem {
            product_id,
            name: "rice 5kg".into(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn quote_and_order_touch_nothing() {
        let customers = vec![customer(10_000)];
        let products = vec![product(5)];
        let items = vec![line(products[0].id, 2, 100_000)];
        for kind in [InvoiceType::Quote, InvoiceType::Order] {
            let effect = effect_of(
                kind,
                customers[0].id,
                &items,
                200_000,
                0,
                &customers,
                &products,
                StockPolicy::default(),
            )
            .unwrap();
            assert_eq!(effect, PostingEffect::default());
        }
    }

    #[test]
    fn sale_adds_unpaid_remainder_to_debt() {
        let customers = vec![customer(50_000)];
        let products = vec![product(10)];
        let items = vec![line(products[0].id, 3, 100_000)];
        let effect = effect_of(
            InvoiceType::Sale,
            customers[0].id,
            &items,
            300_000,
            120_000,
            &customers,
            &products,
            StockPolicy::default(),
        )
        .unwrap();
        assert_eq!(effect.debt, Some((customers[0].id, 230_000)));
        assert_eq!(effect.stock, vec![(products[0].id, -3)]);
        assert_eq!(
            effect.prices,
            vec![(customers[0].id, products[0].id, 100_000)]
        );
    }

    #[test]
    fn overpaid_sale_may_drive_debt_negative() {
        let customers = vec![customer(0)];
        let products = vec![product(10)];
        let items = vec![line(products[0].id, 1, 100_000)];
        let effect = effect_of(
            InvoiceType::Sale,
            customers[0].id,
            &items,
            100_000,
            150_000,
            &customers,
            &products,
            StockPolicy::default(),
        )
        .unwrap();
        assert_eq!(effect.debt, Some((customers[0].id, -50_000)));
    }

    #[test]
    fn return_clamps_debt_at_zero() {
        let customers = vec![customer(30_000)];
        let products = vec![product(2)];
        let items = vec![line(products[0].id, 5, 20_000)];
        let effect = effect_of(
            InvoiceType::Return,
            customers[0].id,
            &items,
            100_000,
            0,
            &customers,
            &products,
            StockPolicy::default(),
        )
        .unwrap();
        assert_eq!(effect.debt, Some((customers[0].id, 0)));
        assert_eq!(effect.stock, vec![(products[0].id, 5)]);
        assert!(effect.prices.is_empty());
    }

    #[test]
    fn payment_clamps_debt_at_zero() {
        let customers = vec![customer(40_000)];
        let effect = effect_of(
            InvoiceType::Payment,
            customers[0].id,
            &[],
            0,
            60_000,
            &customers,
            &[],
            StockPolicy::default(),
        )
        .unwrap();
        assert_eq!(effect.debt, Some((customers[0].id, 0)));
        assert!(effect.stock.is_empty());
    }

    #[test]
    fn unknown_customer_rejects_the_posting() {
        let err = effect_of(
            InvoiceType::Payment,
            Uuid::new_v4(),
            &[],
            0,
            10_000,
            &[],
            &[],
            StockPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PostingError::UnknownCustomer(_)));
    }

    #[test]
    fn unknown_product_line_is_skipped() {
        let customers = vec![customer(0)];
        let products = vec![product(10)];
        let items = vec![
            line(products[0].id, 2, 100_000),
            line(Uuid::new_v4(), 7, 5_000),
        ];
        let effect = effect_of(
            InvoiceType::Sale,
            customers[0].id,
            &items,
            235_000,
            0,
            &customers,
            &products,
            StockPolicy::default(),
        )
        .unwrap();
        assert_eq!(effect.stock, vec![(products[0].id, -2)]);
        assert_eq!(effect.prices.len(), 1);
    }

    #[test]
    fn repeated_lines_accumulate_per_product() {
        let customers = vec![customer(0)];
        let products = vec![product(10)];
        let items = vec![line(products[0].id, 2, 100_000), line(products[0].id, 3, 90_000)];
        let effect = effect_of(
            InvoiceType::Sale,
            customers[0].id,
            &items,
            470_000,
            0,
            &customers,
            &products,
            StockPolicy::default(),
        )
        .unwrap();
        assert_eq!(effect.stock, vec![(products[0].id, -5)]);
        // last line wins in the pricing memory
        assert_eq!(effect.prices.last(), Some(&(customers[0].id, products[0].id, 90_000)));
    }

    #[test]
    fn reject_negative_policy_blocks_oversell() {
        let customers = vec![customer(0)];
        let products = vec![product(2)];
        let items = vec![line(products[0].id, 3, 100_000)];
        let err = effect_of(
            InvoiceType::Sale,
            customers[0].id,
            &items,
            300_000,
            0,
            &customers,
            &products,
            StockPolicy::RejectNegative,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PostingError::InsufficientStock {
                product: products[0].id,
                available: 2,
                requested: 3,
            }
        );

        // the same sale is fine under the default policy
        assert!(
            effect_of(
                InvoiceType::Sale,
                customers[0].id,
                &items,
                300_000,
                0,
                &customers,
                &products,
                StockPolicy::AllowNegative,
            )
            .is_ok()
        );
    }
}
