//! Table persistence: strict JSON documents and a best-effort local cache.

pub mod cache;
pub mod json;

pub use cache::TableCache;
pub use json::{TableDocument, read_table, read_table_content, write_table, write_table_content};
