//! Order aggregation used by the yearly customer export.

use rusqlite::params;
use time::{Date, Month, OffsetDateTime, format_description::well_known::Rfc3339};

use crate::StoreError;
use crate::sqlite::{SqliteRecordStore, classify};

/// Inclusive `createdAt` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DateRange {
    /// `YYYY-01-01T00:00:00Z` through `YYYY-12-31T23:59:59Z`.
    pub fn calendar_year(year: i32) -> Result<Self, time::error::ComponentRange> {
        let start = Date::from_calendar_date(year, Month::January, 1)?
            .midnight()
            .assume_utc();
        let end = Date::from_calendar_date(year, Month::December, 31)?
            .with_hms(23, 59, 59)?
            .assume_utc();
        Ok(Self { start, end })
    }
}

/// One exported row: per-customer order totals joined with the customer's details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerOrderSummary {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub total_orders: i64,
    pub total_pairs: i64,
}

// Orders without a status still count; `services` maps a service name to a pair count
// that may be stored as a number or a numeric string. Timestamps compare with millisecond
// precision so `23:59:59.900` falls outside a range ending at `23:59:59`.
const CUSTOMER_TOTALS_SQL: &str = r#"
WITH per_order AS (
    SELECT json_extract(o.doc, '$.customerId') AS customer_id,
           (SELECT COALESCE(SUM(CAST(s.value AS INTEGER)), 0)
            FROM json_each(o.doc, '$.services') AS s) AS pairs
    FROM orders AS o
    WHERE COALESCE(json_extract(o.doc, '$.status'), '') NOT IN ('cancelled', 'draft')
      AND strftime('%Y-%m-%dT%H:%M:%f', json_extract(o.doc, '$.createdAt'))
          BETWEEN strftime('%Y-%m-%dT%H:%M:%f', ?1) AND strftime('%Y-%m-%dT%H:%M:%f', ?2)
),
totals AS (
    SELECT customer_id, COUNT(*) AS total_orders, SUM(pairs) AS total_pairs
    FROM per_order
    GROUP BY customer_id
)
SELECT COALESCE(CAST(t.customer_id AS TEXT), ''),
       COALESCE(CAST(json_extract(c.doc, '$.first_name') AS TEXT), ''),
       COALESCE(CAST(json_extract(c.doc, '$.last_name') AS TEXT), ''),
       COALESCE(CAST(json_extract(c.doc, '$.phone') AS TEXT), ''),
       t.total_orders,
       COALESCE(t.total_pairs, 0)
FROM totals AS t
LEFT JOIN customers AS c ON c.id = CAST(t.customer_id AS TEXT)
ORDER BY 1
"#;

impl SqliteRecordStore {
    /// Groups qualifying orders in `range` by customer in a single query.
    pub async fn customer_order_totals(
        &self,
        range: DateRange,
    ) -> Result<Vec<CustomerOrderSummary>, StoreError> {
        let start = range
            .start
            .format(&Rfc3339)
            .map_err(|err| StoreError::Internal(err.into()))?;
        let end = range
            .end
            .format(&Rfc3339)
            .map_err(|err| StoreError::Internal(err.into()))?;

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(CUSTOMER_TOTALS_SQL).map_err(classify)?;
            let rows = stmt
                .query_map(params![start, end], |row| {
                    Ok(CustomerOrderSummary {
                        customer_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        phone: row.get(3)?,
                        total_orders: row.get(4)?,
                        total_pairs: row.get(5)?,
                    })
                })
                .map_err(classify)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(classify)
        })
        .await
    }
}
