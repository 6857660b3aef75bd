//! AQL query language
//!
//! An abstract tree model of a SQL-like query language structured around RDF
//! triple joins, with the pieces that surround it:
//!
//! - list-form (S-expression) parser, the tested front end
//! - printer producing the canonical surface form (round-trip inverse)
//! - optimizer replacing property-to-property comparisons with raw
//!   identifier references
//! - translator lowering the tree to SQL over the `triple`/`node` schema
//! - result adapter wrapping an executed SQL cursor as labeled typed rows
//!
//! ```rust
//! let query = aql::parse_query(
//!     "(aql-query (select \"x\" (property \"root\" subject)))",
//! )
//! .unwrap();
//! let sql = aql::translate(&query).unwrap();
//! assert!(sql.starts_with("SELECT t0_s.str AS col0"));
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod model;
pub mod optimizer;
pub mod parser;
pub mod printer;
pub mod result;
pub mod translator;

pub use model::*;
pub use optimizer::optimize;
pub use parser::{parse_query, ParseError, ParseResult};
pub use printer::print_query;
pub use result::ResultSet;
pub use translator::{translate, TranslateError, TranslateResult};
