//! Quick-search query language for tabular admin views.
//!
//! A query such as `category=news* AND NOT "draft copy"` is compiled once into
//! a [`SearchParser`] and then tested against any number of flat [`Row`]s.
//!
//! ```
//! use search_parser::{Row, SearchParser};
//!
//! let parser = SearchParser::build("title=*rust* OR tags=lang", &[]).unwrap();
//! let row: Row = [("title", "The Rust Book"), ("tags", "docs")].into_iter().collect();
//! assert!(parser.test(&row).unwrap());
//! ```

pub mod config;
pub mod row;
pub mod search_query;

pub use config::SearchConfig;
pub use row::{FieldDescriptor, Row, Value, RAW_FIELD};
pub use search_query::{matches, Node, SearchError, SearchParser, SearchResult};
