//! Error types for the triple store
//!
//! Each storage failure has a dedicated, human-readable message; the
//! underlying engine's error text is appended as the source. Failures with
//! no dedicated message fall through to the generic `Sql` variant.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database file could not be opened or initialized
    #[error("unable to open database: {0}")]
    Open(#[source] rusqlite::Error),

    /// Fresh node id allocation failed
    #[error("unable to create a new node id: {0}")]
    NodeIdAlloc(#[source] rusqlite::Error),

    /// Node dictionary row lookup failed
    #[error("unable to query for node details: {0}")]
    NodeDetails(#[source] rusqlite::Error),

    /// Node dictionary insertion failed
    #[error("unable to insert a new node: {0}")]
    NodeInsert(#[source] rusqlite::Error),

    /// Node dictionary search failed
    #[error("unable to find node: {0}")]
    NodeFind(#[source] rusqlite::Error),

    /// Triple insertion failed
    #[error("unable to insert new triple: {0}")]
    TripleInsert(#[source] rusqlite::Error),

    /// Triple deletion failed
    #[error("unable to delete triple: {0}")]
    TripleDelete(#[source] rusqlite::Error),

    /// Wildcard triple query failed
    #[error("unable to query for triples: {0}")]
    TripleQuery(#[source] rusqlite::Error),

    /// Namespace insertion failed
    #[error("unable to insert new namespace: {0}")]
    NamespaceInsert(#[source] rusqlite::Error),

    /// Namespace deletion failed
    #[error("unable to delete namespace: {0}")]
    NamespaceDelete(#[source] rusqlite::Error),

    /// Namespace lookup failed
    #[error("unable to find namespace: {0}")]
    NamespaceFind(#[source] rusqlite::Error),

    /// Source registry lookup failed
    #[error("unable to determine if source has been loaded before: {0}")]
    SourceFind(#[source] rusqlite::Error),

    /// Source load-time update failed
    #[error("unable to update load time: {0}")]
    SourceTime(#[source] rusqlite::Error),

    /// Source deletion failed
    #[error("unable to delete source: {0}")]
    SourceDelete(#[source] rusqlite::Error),

    /// Source enumeration failed
    #[error("unable to find sources: {0}")]
    SourceQuery(#[source] rusqlite::Error),

    /// Transaction boundary statement failed
    #[error("transaction error: {0}")]
    Transaction(#[source] rusqlite::Error),

    /// A qname had no `prefix:` part
    #[error("malformed qname: {0}")]
    MalformedQName(String),

    /// The modification-time oracle failed for a source URI
    #[error("unable to fetch modification time for {uri}: {reason}")]
    Fetch {
        /// Source URI handed to the oracle
        uri: String,
        /// Oracle's failure description
        reason: String,
    },

    /// A query could not be prepared for execution
    #[error("error preparing query: {source}; query was: {sql}")]
    Prepare {
        /// The offending SQL text
        sql: String,
        /// Engine error
        #[source]
        source: rusqlite::Error,
    },

    /// A result cursor was read past completion without a reset
    #[error("result object is not valid")]
    CursorConsumed,

    /// Engine error with no dedicated message
    #[error("{0}")]
    Sql(#[from] rusqlite::Error),
}
