//! Historical sales upload decoding.
//!
//! Canonical columns: `order_id,customer_id,product_id,quantity,price`.
//! Rows sharing an `order_id` reference become one historical order; a
//! row-level price overrides the canonical product price for that line
//! (ingestion is the only path allowed to do so). Rows without an
//! `order_id` each become their own single-line order.

use storekeep_core::{CustomerId, ProductId};

use crate::batch::{column, field, optional_column, reader, IngestError, ParsedBatch};
use crate::products::parse_price_cents;

/// One line of a backfilled order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalLine {
    pub product_id: ProductId,
    pub quantity: u64,
    /// Upload-supplied unit price in cents; `None` falls back to the
    /// canonical product price at import time.
    pub price_override: Option<u64>,
}

/// A backfilled order: grouped upload rows for one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalOrder {
    pub customer_id: CustomerId,
    pub lines: Vec<HistoricalLine>,
}

pub fn parse_sales(data: &[u8]) -> Result<ParsedBatch<HistoricalOrder>, IngestError> {
    let mut rdr = reader(data);
    let headers = rdr.headers()?.clone();

    let customer_col = column(&headers, "customer_id")?;
    let product_col = column(&headers, "product_id")?;
    let quantity_col = column(&headers, "quantity")?;
    let order_ref_col = optional_column(&headers, "order_id");
    let price_col = optional_column(&headers, "price");

    // Orders keyed by upload reference, in first-seen order.
    let mut orders: Vec<HistoricalOrder> = Vec::new();
    let mut index_by_ref: std::collections::HashMap<String, usize> =
        std::collections::HashMap::new();
    let mut rejected = 0;
    let mut total = 0;

    for record in rdr.records() {
        let record = record?;
        total += 1;

        let customer_id: Option<CustomerId> =
            field(&record, customer_col).and_then(|v| v.parse().ok());
        let product_id: Option<ProductId> =
            field(&record, product_col).and_then(|v| v.parse().ok());
        let quantity: Option<u64> = field(&record, quantity_col)
            .and_then(|v| v.parse().ok())
            .filter(|&q| q >= 1);
        let (Some(customer_id), Some(product_id), Some(quantity)) =
            (customer_id, product_id, quantity)
        else {
            rejected += 1;
            continue;
        };

        let line = HistoricalLine {
            product_id,
            quantity,
            price_override: price_col
                .and_then(|i| field(&record, i))
                .and_then(|p| parse_price_cents(&p)),
        };

        let order_ref = order_ref_col.and_then(|i| field(&record, i));
        match order_ref {
            Some(order_ref) => {
                let index = *index_by_ref.entry(order_ref).or_insert_with(|| {
                    orders.push(HistoricalOrder {
                        customer_id,
                        lines: Vec::new(),
                    });
                    orders.len() - 1
                });
                orders[index].lines.push(line);
            }
            None => orders.push(HistoricalOrder {
                customer_id,
                lines: vec![line],
            }),
        }
    }

    Ok(ParsedBatch {
        rows: orders,
        rejected,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_sharing_an_order_reference_group_into_one_order() {
        let data = b"order_id,customer_id,product_id,quantity,price\n\
                     A,3,1,2,1.00\n\
                     A,3,2,1,\n\
                     B,4,1,5,0.50\n";
        let batch = parse_sales(data).unwrap();
        assert_eq!(batch.rows.len(), 2);

        let first = &batch.rows[0];
        assert_eq!(first.customer_id, CustomerId::new(3));
        assert_eq!(first.lines.len(), 2);
        assert_eq!(first.lines[0].price_override, Some(100));
        assert_eq!(first.lines[1].price_override, None);

        assert_eq!(batch.rows[1].lines[0].quantity, 5);
    }

    #[test]
    fn rows_without_an_order_reference_become_single_line_orders() {
        let data = b"customer_id,product_id,quantity\n3,1,2\n3,2,1\n";
        let batch = parse_sales(data).unwrap();
        assert_eq!(batch.rows.len(), 2);
        assert!(batch.rows.iter().all(|o| o.lines.len() == 1));
    }

    #[test]
    fn zero_quantity_and_bad_ids_reject_the_row() {
        let data = b"customer_id,product_id,quantity\n3,1,0\nx,1,2\n3,1,2\n";
        let batch = parse_sales(data).unwrap();
        assert_eq!(batch.rejected, 2);
        assert_eq!(batch.rows.len(), 1);
    }
}
