//! Debtbook
//!
//! This crate provides an offline, single-user point-of-sale and customer
//! debt ledger for a small retailer. Posted invoices form an append-only
//! log from which debt statements, price histories and sales figures are
//! reconstructed.

pub mod core;
pub mod import;
pub mod storage;
