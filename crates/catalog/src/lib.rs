//! `storekeep-catalog` — products and categories.

pub mod product;

pub use product::{Category, NewProduct, Product, ProductListing, DEFAULT_CATEGORY};
