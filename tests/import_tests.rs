use std::fs::write;
use std::path::PathBuf;

use chrono::NaiveDate;
use debtbook::core::{InvoiceType, Store};
use debtbook::import::{self, ImportError, csv};

fn write_temp(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    write(&path, content).unwrap();
    path
}

#[test]
fn customer_sheet_parsing() {
    let data = "name,phone,address\nMrs Lan,0901234567,12 Market St\n,skipped,row\nMr Minh,0907,\n";
    let path = write_temp("debtbook_customers.csv", data);
    let rows = csv::parse_customers(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "Mrs Lan");
    assert_eq!(rows[0].phone, "0901234567");
    assert_eq!(rows[1].address, "");
    let _ = std::fs::remove_file(path);
}

#[test]
fn product_sheet_applies_defaults() {
    let data = "name,unit,price,stock\nrice 5kg,bag,45000,10\nfish sauce,,,\n";
    let path = write_temp("debtbook_products.csv", data);
    let rows = csv::parse_products(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].unit, "bag");
    assert_eq!(rows[0].default_price, 45_000);
    assert_eq!(rows[1].unit, csv::DEFAULT_UNIT);
    assert_eq!(rows[1].default_price, 0);
    assert_eq!(rows[1].stock, 0);
    let _ = std::fs::remove_file(path);
}

#[test]
fn sale_rows_group_by_document_code() {
    let data = "code,date,customer,item,qty,price,paid\n\
        INV-7,2024-05-01,Mrs Lan,rice 5kg,2,45000,40000\n\
        INV-7,2024-05-01,Mrs Lan,fish sauce,1,30000,\n\
        INV-8,,Mr Minh,rice 5kg,1,45000,45000\n";
    let path = write_temp("debtbook_sales_group.csv", data);
    let groups = csv::parse_sales(&path).unwrap();
    assert_eq!(groups.len(), 2);

    let first = &groups[0];
    assert_eq!(first.code, "INV-7");
    assert_eq!(first.customer_name, "Mrs Lan");
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.paid_amount, 40_000);
    assert_eq!(
        first.created_at.unwrap().date_naive(),
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    );

    // blank date leaves the draft stamped at posting time
    assert!(groups[1].created_at.is_none());
    let _ = std::fs::remove_file(path);
}

#[test]
fn imported_sales_post_through_the_ordinary_ledger_path() {
    let mut store = Store::new();
    store.add_customer("Mrs Lan", "0901", "");
    store.add_product("rice 5kg", "bag", 45_000, 10);

    let data = "code,date,customer,item,qty,price,paid\n\
        INV-7,2024-05-01,Mrs Lan,rice 5kg,2,45000,40000\n\
        INV-9,2024-05-02,Stranger,rice 5kg,1,45000,0\n";
    let path = write_temp("debtbook_sales_post.csv", data);
    let count = import::post_sales(&mut store, csv::parse_sales(&path).unwrap()).unwrap();
    assert_eq!(count, 2);

    // matched by name: the 50000 remainder lands on Mrs Lan's balance
    let lan = store.find_customer_by_name("Mrs Lan").unwrap();
    assert_eq!(lan.total_debt, 50_000);

    // no match: the walk-in placeholder takes the document
    let walk_in = store.find_customer_by_name("Walk-in").unwrap();
    assert_eq!(walk_in.total_debt, 45_000);

    // imported lines reference no catalog product, so stock is untouched
    assert_eq!(store.products()[0].stock, 10);

    let invoice = &store.invoices()[0];
    assert_eq!(invoice.kind, InvoiceType::Sale);
    assert_eq!(invoice.code.as_deref(), Some("INV-7"));
    assert_eq!(invoice.total_amount, 90_000);
    assert_eq!(
        invoice.created_at.date_naive(),
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    );
    let _ = std::fs::remove_file(path);
}

#[test]
fn malformed_numbers_are_rejected() {
    let data = "name,unit,price,stock\nrice 5kg,bag,lots,10\n";
    let path = write_temp("debtbook_products_bad.csv", data);
    let err = csv::parse_products(&path).unwrap_err();
    assert!(matches!(err, ImportError::Parse(_)));
    let _ = std::fs::remove_file(path);
}
