//! Product upload decoding.
//!
//! Canonical columns: `name,category,price,expiry_date`. Price is a
//! non-negative decimal amount parsed to the smallest currency unit;
//! a missing category falls back to [`DEFAULT_CATEGORY`].

use chrono::NaiveDate;

use storekeep_catalog::{NewProduct, DEFAULT_CATEGORY};

use crate::batch::{column, field, optional_column, reader, IngestError, ParsedBatch};

pub fn parse_products(data: &[u8]) -> Result<ParsedBatch<NewProduct>, IngestError> {
    let mut rdr = reader(data);
    let headers = rdr.headers()?.clone();

    let name_col = column(&headers, "name")?;
    let price_col = column(&headers, "price")?;
    let category_col = optional_column(&headers, "category");
    let expiry_col = optional_column(&headers, "expiry_date");

    let mut rows = Vec::new();
    let mut rejected = 0;
    let mut total = 0;

    for record in rdr.records() {
        let record = record?;
        total += 1;

        let name = field(&record, name_col);
        let price = field(&record, price_col).and_then(|p| parse_price_cents(&p));
        let (Some(name), Some(price)) = (name, price) else {
            rejected += 1;
            continue;
        };

        rows.push(NewProduct {
            name,
            category: category_col
                .and_then(|i| field(&record, i))
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            price,
            expiry_date: expiry_col
                .and_then(|i| field(&record, i))
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        });
    }

    Ok(ParsedBatch {
        rows,
        rejected,
        total,
    })
}

/// Parse a decimal amount such as `12`, `12.5` or `12.34` into cents.
/// Negative values, more than two fraction digits, and junk are rejected.
pub fn parse_price_cents(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let frac_cents: u64 = if frac.is_empty() {
        0
    } else {
        let parsed: u64 = frac.parse().ok()?;
        if frac.len() == 1 { parsed * 10 } else { parsed }
    };

    whole.checked_mul(100)?.checked_add(frac_cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_parsing_handles_whole_and_fractional_amounts() {
        assert_eq!(parse_price_cents("12"), Some(1200));
        assert_eq!(parse_price_cents("12.5"), Some(1250));
        assert_eq!(parse_price_cents("12.34"), Some(1234));
        assert_eq!(parse_price_cents("0.05"), Some(5));
        assert_eq!(parse_price_cents(".99"), Some(99));
    }

    #[test]
    fn price_parsing_rejects_junk() {
        assert_eq!(parse_price_cents("-3"), None);
        assert_eq!(parse_price_cents("12.345"), None);
        assert_eq!(parse_price_cents("abc"), None);
        assert_eq!(parse_price_cents(""), None);
        assert_eq!(parse_price_cents("."), None);
    }

    #[test]
    fn parses_products_with_default_category() {
        let data = b"name,category,price,expiry_date\n\
                     Milk,Dairy,2.50,2024-09-01\n\
                     Rice,,4.00,\n";
        let batch = parse_products(data).unwrap();
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[0].price, 250);
        assert_eq!(
            batch.rows[0].expiry_date,
            NaiveDate::from_ymd_opt(2024, 9, 1)
        );
        assert_eq!(batch.rows[1].category, DEFAULT_CATEGORY);
        assert_eq!(batch.rows[1].expiry_date, None);
    }

    #[test]
    fn bad_price_rejects_the_row_not_the_file() {
        let data = b"name,price\nMilk,free\nRice,4.00\n";
        let batch = parse_products(data).unwrap();
        assert_eq!(batch.rejected, 1);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].name, "Rice");
    }

    #[test]
    fn unparseable_expiry_is_dropped_silently() {
        let data = b"name,price,expiry_date\nMilk,2.50,someday\n";
        let batch = parse_products(data).unwrap();
        assert_eq!(batch.rows[0].expiry_date, None);
    }
}
