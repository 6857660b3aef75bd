//! SQLite-backed RDF triple store
//!
//! Persistent storage of RDF triples as integer identifiers over a
//! normalized node dictionary, with namespaces, typed and language-tagged
//! literals, blank nodes, multiple provenance sources, and a transient
//! in-memory overlay for temporary facts.
//!
//! # Design
//!
//! 1. **Relational encoding**: nodes and triples live in SQL tables; the
//!    transient overlay is an attached in-memory schema, unioned with the
//!    persistent layer for queries.
//! 2. **Sign convention**: positive ids are resources, negative ids are
//!    literals, `0` is the null node ("any" in patterns).
//! 3. **Trait seams**: the RDF ingestion parser and the modification-time
//!    fetcher are external collaborators behind [`RdfReader`] and
//!    [`SourceClock`].
//! 4. **Serialized mutation**: a process-wide mutex guards the store; the
//!    SQL cursor layer carries an explicit connection handle.
//!
//! # Example
//!
//! ```rust
//! use triplestore::{Store, Triple, TriplePattern, NULL_NODE};
//!
//! let store = Store::open_in_memory().unwrap();
//! let s = store.node(Some("http://example.org/s"), false).unwrap();
//! let p = store.node(Some("http://example.org/p"), false).unwrap();
//! let o = store.literal("value", NULL_NODE, None).unwrap();
//!
//! store.add(&Triple::new(s, p, o), NULL_NODE, false).unwrap();
//! assert_eq!(store.count(&TriplePattern::any(), false).unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod error;
mod load;
mod node;
mod pattern;
mod schema;
mod sql;
mod store;

pub use error::{StoreError, StoreResult};
pub use load::{FsClock, LoadError, LoadInput, LoadResult, RdfReader, SourceClock, TripleSink};
pub use node::{vocab, NodeId, Triple, NULL_NODE};
pub use pattern::TriplePattern;
pub use sql::{Database, SqlCursor};
pub use store::{NodeInfo, Store};
