//! Positional CSV parsing for the three sheet layouts.
//!
//! Columns are taken by position, matching the spreadsheet templates the
//! shop fills in; the first row is a header and its text is ignored. Rows
//! with an empty first column are skipped.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use csv::{ReaderBuilder, StringRecord};

use super::{CustomerRow, ImportError, ProductRow, SaleGroup, SaleLine};

/// Fallback unit label for product rows that leave the column blank.
pub const DEFAULT_UNIT: &str = "unit";

/// Customer sheet: `name, phone, address`.
pub fn parse_customers(path: &Path) -> Result<Vec<CustomerRow>, ImportError> {
    let mut rows = Vec::new();
    for record in records(path)? {
        let name = field(&record, 0);
        if name.is_empty() {
            continue;
        }
        rows.push(CustomerRow {
            name,
            phone: field(&record, 1),
            address: field(&record, 2),
        });
    }
    Ok(rows)
}

/// Product sheet: `name, unit, default price, opening stock`.
pub fn parse_products(path: &Path) -> Result<Vec<ProductRow>, ImportError> {
    let mut rows = Vec::new();
    for record in records(path)? {
        let name = field(&record, 0);
        if name.is_empty() {
            continue;
        }
        let unit = field(&record, 1);
        rows.push(ProductRow {
            name,
            unit: if unit.is_empty() {
                DEFAULT_UNIT.to_string()
            } else {
                unit
            },
            default_price: number(&record, 2, 0)?,
            stock: number(&record, 3, 0)?,
        });
    }
    Ok(rows)
}

/// Invoice sheet: `code, date, customer, item, quantity, unit price, paid`.
///
/// Rows sharing a code accumulate into one sale; the paid amount is taken
/// from the group's first row, as is the customer and date.
pub fn parse_sales(path: &Path) -> Result<Vec<SaleGroup>, ImportError> {
    let mut groups: Vec<SaleGroup> = Vec::new();
    for record in records(path)? {
        let code = field(&record, 0);
        if code.is_empty() {
            continue;
        }
        let line = SaleLine {
            name: field(&record, 3),
            quantity: number(&record, 4, 1)?,
            unit_price: number(&record, 5, 0)?,
        };
        if let Some(idx) = groups.iter().position(|g| g.code == code) {
            groups[idx].items.push(line);
        } else {
            groups.push(SaleGroup {
                code,
                customer_name: field(&record, 2),
                items: vec![line],
                paid_amount: number(&record, 6, 0)?,
                created_at: date(&record, 1),
            });
        }
    }
    Ok(groups)
}

fn records(path: &Path) -> Result<Vec<StringRecord>, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ImportError::Parse(e.to_string()))?;
    let mut out = Vec::new();
    for result in rdr.records() {
        out.push(result.map_err(|e| ImportError::Parse(e.to_string()))?);
    }
    Ok(out)
}

fn field(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").trim().to_string()
}

fn number(record: &StringRecord, index: usize, default: i64) -> Result<i64, ImportError> {
    let raw = field(record, index);
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse()
        .map_err(|_| ImportError::Parse(format!("not a number: {raw}")))
}

// A blank or unrecognised date leaves the draft stamped at posting time.
fn date(record: &StringRecord, index: usize) -> Option<DateTime<Utc>> {
    let raw = field(record, index);
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}
