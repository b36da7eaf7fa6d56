use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use care_store::{CustomerOrderSummary, DateRange, SqliteRecordStore};
use clap::Parser;
use time::OffsetDateTime;

const HEADER: [&str; 6] = [
    "customerId",
    "firstName",
    "lastName",
    "phone",
    "totalOrders",
    "totalPairs",
];

#[derive(Parser, Debug)]
#[command(about = "Export per-customer order and pair totals for a calendar year as CSV")]
struct Cli {
    /// SQLite database holding the `orders` and `customers` collections
    #[arg(long, env = "DATABASE_PATH", default_value = "care.db")]
    database: PathBuf,
    /// Calendar year to aggregate (defaults to last year, UTC)
    #[arg(long)]
    year: Option<i32>,
    #[arg(long, default_value = "customer_orders_last_year.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let year = cli
        .year
        .unwrap_or_else(|| OffsetDateTime::now_utc().year() - 1);
    let range = DateRange::calendar_year(year)
        .with_context(|| format!("invalid year {year}"))?;

    let store = SqliteRecordStore::open(&cli.database)
        .with_context(|| format!("failed to open {}", cli.database.display()))?;
    let rows = store
        .customer_order_totals(range)
        .await
        .context("order aggregation failed")?;

    fs::write(&cli.output, render_csv(&rows))
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    println!(
        "Exported {} customers for {year} to {}",
        rows.len(),
        cli.output.display()
    );
    Ok(())
}

fn render_csv(rows: &[CustomerOrderSummary]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        HEADER
            .iter()
            .map(|h| quote(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(format!(
            "{},{},{},{},{},{}",
            quote(&row.customer_id),
            quote(&row.first_name),
            quote(&row.last_name),
            quote(&row.phone),
            row.total_orders,
            row.total_pairs
        ));
    }
    lines.join("\n")
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, first: &str, orders: i64, pairs: i64) -> CustomerOrderSummary {
        CustomerOrderSummary {
            customer_id: id.into(),
            first_name: first.into(),
            last_name: "Doe".into(),
            phone: "+254700000000".into(),
            total_orders: orders,
            total_pairs: pairs,
        }
    }

    #[test]
    fn header_only_when_empty() {
        assert_eq!(
            render_csv(&[]),
            "\"customerId\",\"firstName\",\"lastName\",\"phone\",\"totalOrders\",\"totalPairs\""
        );
    }

    #[test]
    fn strings_quoted_numbers_bare() {
        let csv = render_csv(&[row("c1", "Ann", 3, 7), row("c2", "Bo", 1, 0)]);
        let lines: Vec<_> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "\"c1\",\"Ann\",\"Doe\",\"+254700000000\",3,7");
        assert_eq!(lines[2], "\"c2\",\"Bo\",\"Doe\",\"+254700000000\",1,0");
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let csv = render_csv(&[row("c1", "Jo \"JJ\", Jr", 1, 2)]);
        assert!(csv.ends_with("\"c1\",\"Jo \"\"JJ\"\", Jr\",\"Doe\",\"+254700000000\",1,2"));
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["export_orders"]).unwrap();
        assert_eq!(cli.year, None);
        assert_eq!(cli.output, PathBuf::from("customer_orders_last_year.csv"));
    }

    #[tokio::test]
    async fn exports_from_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::open(dir.path().join("care.db")).unwrap();
        let rows = store
            .customer_order_totals(DateRange::calendar_year(2024).unwrap())
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(render_csv(&rows).lines().count(), 1);
    }
}
