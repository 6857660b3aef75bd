//! Node identifiers and triples
//!
//! Every RDF entity — URI resource, blank node, or literal — is represented
//! by a signed integer id. Positive ids are resources (blank nodes are
//! resources that happen to be recorded in the blank-node table), negative
//! ids are literals, and `0` is the null node used as a wildcard and as the
//! absence of a datatype or source.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;

/// The null node: wildcard in patterns, absence of a datatype or source.
pub const NULL_NODE: NodeId = NodeId(0);

/// Signed integer node identifier.
///
/// Magnitudes are allocated monotonically: the next resource id is
/// `max(id) + 1`, the next literal id is `min(id) - 1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i64);

impl NodeId {
    /// `rdf:type`, seeded at database creation.
    pub const RDF_TYPE: NodeId = NodeId(1);
    /// `rdf:Property`, seeded at database creation.
    pub const RDF_PROPERTY: NodeId = NodeId(2);
    /// `rdfs:Resource`, seeded at database creation.
    pub const RDFS_RESOURCE: NodeId = NodeId(3);
    /// `rdfs:Class`, seeded at database creation.
    pub const RDFS_CLASS: NodeId = NodeId(4);
    /// `rdfs:subClassOf`, seeded at database creation.
    pub const RDFS_SUB_CLASS_OF: NodeId = NodeId(5);

    /// Check if this is the null node
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Check if this id denotes a literal
    pub fn is_literal(self) -> bool {
        self.0 < 0
    }

    /// Check if this id denotes a resource (URI-named or blank)
    pub fn is_resource(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for NodeId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for NodeId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(NodeId)
    }
}

/// An ordered `(subject, predicate, object)` assertion.
///
/// The provenance source travels separately: it is an argument to the store
/// operations, not part of the triple value itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Triple {
    /// Subject node
    pub subject: NodeId,
    /// Predicate node
    pub predicate: NodeId,
    /// Object node
    pub object: NodeId,
}

impl Triple {
    /// Create a new triple
    pub fn new(subject: NodeId, predicate: NodeId, object: NodeId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.subject, self.predicate, self.object)
    }
}

/// IRIs for the vocabulary nodes seeded at database creation
pub mod vocab {
    use super::NodeId;

    /// RDF namespace IRI
    pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// rdf:type
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// rdf:Property
    pub const RDF_PROPERTY: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property";

    /// RDFS namespace IRI
    pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    /// rdfs:Resource
    pub const RDFS_RESOURCE: &str = "http://www.w3.org/2000/01/rdf-schema#Resource";
    /// rdfs:Class
    pub const RDFS_CLASS: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
    /// rdfs:subClassOf
    pub const RDFS_SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

    /// Well-known nodes with their fixed ids, in seeding order.
    pub const WELL_KNOWN: [(NodeId, &str); 5] = [
        (NodeId::RDF_TYPE, RDF_TYPE),
        (NodeId::RDF_PROPERTY, RDF_PROPERTY),
        (NodeId::RDFS_RESOURCE, RDFS_RESOURCE),
        (NodeId::RDFS_CLASS, RDFS_CLASS),
        (NodeId::RDFS_SUB_CLASS_OF, RDFS_SUB_CLASS_OF),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_convention() {
        assert!(NodeId(7).is_resource());
        assert!(!NodeId(7).is_literal());
        assert!(NodeId(-3).is_literal());
        assert!(!NodeId(-3).is_resource());
        assert!(NULL_NODE.is_null());
        assert!(!NULL_NODE.is_resource());
        assert!(!NULL_NODE.is_literal());
    }

    #[test]
    fn test_well_known_ids() {
        assert_eq!(NodeId::RDF_TYPE, NodeId(1));
        assert_eq!(NodeId::RDFS_SUB_CLASS_OF, NodeId(5));
        for (id, iri) in vocab::WELL_KNOWN {
            assert!(id.is_resource());
            assert!(iri.starts_with("http://www.w3.org/"));
        }
    }

    #[test]
    fn test_triple_display() {
        let t = Triple::new(NodeId(1), NodeId(2), NodeId(-1));
        assert_eq!(t.to_string(), "<1, 2, -1>");
    }
}
