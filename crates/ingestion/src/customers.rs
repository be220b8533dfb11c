//! Customer upload decoding.
//!
//! Canonical columns: `unique_id,name,phone,email,zip_code,city,state`.
//! `name` is required per row; duplicate `(email, phone)` pairs within one
//! file keep the first occurrence.

use std::collections::HashSet;

use storekeep_customers::NewCustomer;

use crate::batch::{column, field, optional_column, reader, IngestError, ParsedBatch};

pub fn parse_customers(data: &[u8]) -> Result<ParsedBatch<NewCustomer>, IngestError> {
    let mut rdr = reader(data);
    let headers = rdr.headers()?.clone();

    let name_col = column(&headers, "name")?;
    let unique_id_col = optional_column(&headers, "unique_id");
    let phone_col = optional_column(&headers, "phone");
    let email_col = optional_column(&headers, "email");
    let zip_col = optional_column(&headers, "zip_code");
    let city_col = optional_column(&headers, "city");
    let state_col = optional_column(&headers, "state");

    let mut rows = Vec::new();
    let mut rejected = 0;
    let mut total = 0;
    let mut seen = HashSet::new();

    for record in rdr.records() {
        let record = record?;
        total += 1;

        let Some(name) = field(&record, name_col) else {
            rejected += 1;
            continue;
        };

        let customer = NewCustomer {
            unique_id: unique_id_col.and_then(|i| field(&record, i)),
            name,
            phone: phone_col.and_then(|i| field(&record, i)),
            email: email_col.and_then(|i| field(&record, i)),
            zip_code: zip_col.and_then(|i| field(&record, i)),
            city: city_col.and_then(|i| field(&record, i)),
            state: state_col.and_then(|i| field(&record, i)),
        };

        if !seen.insert(customer.dedup_key()) {
            rejected += 1;
            continue;
        }
        rows.push(customer);
    }

    Ok(ParsedBatch {
        rows,
        rejected,
        total,
    })
}
