use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use uuid::Uuid;

use debtbook::core::report::{self, Summary};
use debtbook::core::{
    DateRange, InvoiceDraft, InvoiceStatus, InvoiceType, LineItem, StockPolicy, Store,
};
use debtbook::import::{self, csv as sheet};
use debtbook::storage::{FileStore, Snapshot, SnapshotStore, export_backup, import_snapshot};

#[derive(Deserialize, Default)]
struct Config {
    data_file: Option<PathBuf>,
    allow_negative_stock: Option<bool>,
}

#[derive(Parser)]
#[command(name = "debtbook", about = "Offline point-of-sale and customer debt ledger")]
struct Cli {
    /// Snapshot file to operate on (overrides debtbook.toml)
    #[arg(long)]
    file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new customer
    AddCustomer {
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    /// Register a new catalog product
    AddProduct {
        name: String,
        #[arg(long, default_value = sheet::DEFAULT_UNIT)]
        unit: String,
        #[arg(long)]
        price: i64,
        #[arg(long, default_value_t = 0)]
        stock: i64,
    },
    /// Post a quote, order, sale or return composed of product lines
    Post {
        /// quote, order, sale or return
        kind: String,
        /// Customer name
        customer: String,
        /// Line item as NAME:QTY or NAME:QTY:PRICE; repeatable
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        #[arg(long, default_value_t = 0)]
        paid: i64,
        #[arg(long)]
        note: Option<String>,
    },
    /// Record a standalone debt payment
    Payment {
        customer: String,
        #[arg(long)]
        amount: i64,
        #[arg(long)]
        note: Option<String>,
    },
    /// Build and post a follow-up document from an existing one
    Transfer {
        id: Uuid,
        /// Target type: order or sale
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = 0)]
        paid: i64,
    },
    /// Cancel a posted document
    Cancel { id: Uuid },
    /// Print a customer's debt statement
    Ledger {
        customer: String,
        /// Inclusive date range, e.g. 2024-01-01..2024-01-31
        #[arg(long, default_value = "")]
        range: String,
    },
    /// Print a product's sale price history
    History {
        product: String,
        #[arg(long, default_value = "")]
        range: String,
    },
    /// Search documents by id, code or customer name
    Search {
        text: String,
        #[arg(long, default_value = "")]
        range: String,
    },
    /// Print headline figures and the trailing 7-day revenue series
    Summary,
    /// Import a CSV sheet of customers, products or sales
    Import {
        #[arg(value_enum)]
        kind: SheetKind,
        path: PathBuf,
    },
    /// Write a date-stamped backup of the whole data set
    Export {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Replace the whole data set from a backup file
    Restore { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum SheetKind {
    Customers,
    Products,
    Sales,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(Path::new("debtbook.toml"))?;
    let data_file = cli
        .file
        .or(config.data_file)
        .unwrap_or_else(|| PathBuf::from("debtbook.json"));
    let policy = if config.allow_negative_stock.unwrap_or(true) {
        StockPolicy::AllowNegative
    } else {
        StockPolicy::RejectNegative
    };

    let mut backend = FileStore::new(data_file);
    let mut store = backend.load()?.into_store(policy);

    match cli.command {
        Commands::AddCustomer {
            name,
            phone,
            address,
        } => {
            let customer = store.add_customer(name, phone, address);
            println!("added customer {} ({})", customer.name, customer.id);
            backend.save(&Snapshot::of(&store))?;
        }
        Commands::AddProduct {
            name,
            unit,
            price,
            stock,
        } => {
            let product = store.add_product(name, unit, price, stock);
            println!("added product {} ({})", product.name, product.id);
            backend.save(&Snapshot::of(&store))?;
        }
        Commands::Post {
            kind,
            customer,
            items,
            paid,
            note,
        } => {
            let kind: InvoiceType = kind.parse()?;
            let customer_id = customer_id_by_name(&store, &customer)?;
            let mut draft = InvoiceDraft::new(kind, customer_id);
            for spec in &items {
                draft.items.push(parse_item(&store, customer_id, spec)?);
            }
            draft.paid_amount = paid;
            draft.note = note;
            let invoice = store.post(draft)?;
            println!(
                "posted {} {} total {} paid {}",
                invoice.kind, invoice.id, invoice.total_amount, invoice.paid_amount
            );
            backend.save(&Snapshot::of(&store))?;
        }
        Commands::Payment {
            customer,
            amount,
            note,
        } => {
            let customer_id = customer_id_by_name(&store, &customer)?;
            let mut draft = InvoiceDraft::new(InvoiceType::Payment, customer_id);
            draft.paid_amount = amount;
            draft.note = note;
            let invoice = store.post(draft)?;
            println!("recorded payment {} of {}", invoice.id, invoice.paid_amount);
            backend.save(&Snapshot::of(&store))?;
        }
        Commands::Transfer { id, to, paid } => {
            let target: InvoiceType = to.parse()?;
            let mut draft = store.transfer(id, target)?;
            draft.paid_amount = paid;
            let invoice = store.post(draft)?;
            println!("posted {} {} from {}", invoice.kind, invoice.id, id);
            backend.save(&Snapshot::of(&store))?;
        }
        Commands::Cancel { id } => {
            store.set_status(id, InvoiceStatus::Cancelled)?;
            println!("cancelled {id}");
            backend.save(&Snapshot::of(&store))?;
        }
        Commands::Ledger { customer, range } => {
            let range: DateRange = range.parse()?;
            let customer = store
                .find_customer_by_name(&customer)
                .ok_or_else(|| format!("unknown customer: {customer}"))?;
            println!("{}, outstanding debt {}", customer.name, customer.total_debt);
            for row in report::debt_ledger(&store, customer.id, &range) {
                println!(
                    "{}  {:<8}  +{:<12} -{:<12} {}",
                    row.created_at.format("%Y-%m-%d %H:%M"),
                    row.label,
                    row.increase,
                    row.decrease,
                    row.invoice_id
                );
            }
        }
        Commands::History { product, range } => {
            let range: DateRange = range.parse()?;
            let product = store
                .find_product_by_name(&product)
                .ok_or_else(|| format!("unknown product: {product}"))?;
            println!("{}, catalog price {}", product.name, product.default_price);
            for row in report::product_price_history(&store, product.id, &range) {
                println!(
                    "{}  {:<20} x{:<6} @ {:<12} {} {}",
                    row.created_at.format("%Y-%m-%d %H:%M"),
                    row.customer_name,
                    row.quantity,
                    row.unit_price,
                    row.kind,
                    row.invoice_id
                );
            }
        }
        Commands::Search { text, range } => {
            let range: DateRange = range.parse()?;
            for invoice in report::search_invoices(&store, &text, &range) {
                println!(
                    "{}  {:<8} {:<20} total {:<12} {} {}",
                    invoice.created_at.format("%Y-%m-%d %H:%M"),
                    invoice.kind,
                    invoice.customer_name,
                    invoice.total_amount,
                    invoice.status,
                    invoice.id
                );
            }
        }
        Commands::Summary => {
            let summary = Summary::compute(&store);
            println!("total revenue : {}", summary.total_revenue);
            println!("total debt    : {}", summary.total_debt);
            println!("pending orders: {}", summary.pending_orders);
            for day in report::revenue_by_day(&store, Utc::now().date_naive(), 7) {
                println!("{}  {}", day.date, day.total);
            }
        }
        Commands::Import { kind, path } => {
            let count = match kind {
                SheetKind::Customers => {
                    import::add_customers(&mut store, sheet::parse_customers(&path)?)
                }
                SheetKind::Products => {
                    import::add_products(&mut store, sheet::parse_products(&path)?)
                }
                SheetKind::Sales => import::post_sales(&mut store, sheet::parse_sales(&path)?)?,
            };
            println!("imported {count} records");
            backend.save(&Snapshot::of(&store))?;
        }
        Commands::Export { dir } => {
            let path = export_backup(&Snapshot::of(&store), &dir, Utc::now().date_naive())?;
            println!("exported {}", path.display());
        }
        Commands::Restore { path } => {
            let snapshot = import_snapshot(&path)?;
            store = snapshot.into_store(policy);
            backend.save(&Snapshot::of(&store))?;
            println!("restored {}", path.display());
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(toml::from_str(&data)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

fn customer_id_by_name(store: &Store, name: &str) -> Result<Uuid, String> {
    store
        .find_customer_by_name(name)
        .map(|c| c.id)
        .ok_or_else(|| format!("unknown customer: {name}"))
}

/// Parses a NAME:QTY or NAME:QTY:PRICE line spec. Without an explicit
/// price the pair's memorized price applies, falling back to the catalog
/// price.
fn parse_item(store: &Store, customer_id: Uuid, spec: &str) -> Result<LineItem, String> {
    let err = || format!("invalid item spec: {spec}");
    let mut parts = spec.rsplitn(3, ':');
    let last = parts.next().unwrap_or("");
    let middle = parts.next();
    let first = parts.next();

    let (name, quantity, price): (&str, i64, Option<i64>) = match (first, middle) {
        (Some(name), Some(qty)) => (
            name,
            qty.parse().map_err(|_| err())?,
            Some(last.parse().map_err(|_| err())?),
        ),
        (None, Some(name)) => (name, last.parse().map_err(|_| err())?, None),
        _ => return Err(err()),
    };

    let product = store
        .find_product_by_name(name)
        .ok_or_else(|| format!("unknown product: {name}"))?;
    let unit_price = price.unwrap_or_else(|| {
        store
            .prices()
            .resolve(customer_id, product.id, product.default_price)
    });
    Ok(LineItem {
        product_id: product.id,
        name: product.name.clone(),
        quantity,
        unit_price,
    })
}
