//! Inventory upload decoding.
//!
//! Canonical columns: `product_id,stock`. Stock is a non-negative integer;
//! the store adds it to whatever the seller already holds for the product.

use storekeep_inventory::StockReceipt;

use crate::batch::{column, field, reader, IngestError, ParsedBatch};

pub fn parse_inventory(data: &[u8]) -> Result<ParsedBatch<StockReceipt>, IngestError> {
    let mut rdr = reader(data);
    let headers = rdr.headers()?.clone();

    let product_col = column(&headers, "product_id")?;
    let stock_col = column(&headers, "stock")?;

    let mut rows = Vec::new();
    let mut rejected = 0;
    let mut total = 0;

    for record in rdr.records() {
        let record = record?;
        total += 1;

        let product_id = field(&record, product_col).and_then(|v| v.parse().ok());
        let quantity = field(&record, stock_col).and_then(|v| v.parse::<u64>().ok());
        match (product_id, quantity) {
            (Some(product_id), Some(quantity)) => rows.push(StockReceipt {
                product_id,
                quantity,
            }),
            _ => rejected += 1,
        }
    }

    Ok(ParsedBatch {
        rows,
        rejected,
        total,
    })
}
