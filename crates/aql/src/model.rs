//! AQL query model
//!
//! Tagged tree representation of an AQL query: selects, named triple joins,
//! a logical criterion, sort clauses, and pagination. Every node exclusively
//! owns its children; traversal is plain `match` dispatch.

use std::fmt;

/// Component of a triple addressed by a property expression.
///
/// The order here matters: node joins are emitted in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TriplePart {
    /// Triple subject
    Subject,
    /// Triple predicate
    Predicate,
    /// Triple object
    Object,
}

impl TriplePart {
    /// The SQL column this part addresses. Load-bearing: these characters
    /// name the columns of the `triple` table.
    pub fn column(self) -> char {
        match self {
            TriplePart::Subject => 's',
            TriplePart::Predicate => 'p',
            TriplePart::Object => 'o',
        }
    }

    /// The surface-syntax keyword for this part
    pub fn keyword(self) -> &'static str {
        match self {
            TriplePart::Subject => "subject",
            TriplePart::Predicate => "predicate",
            TriplePart::Object => "object",
        }
    }
}

impl fmt::Display for TriplePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Comparison operator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// Equality (`comp-eq`)
    Eq,
    /// Inequality (`comp-ne`)
    Ne,
}

/// Junction kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JunctionKind {
    /// Conjunction: empty is always true
    And,
    /// Disjunction: empty is always false
    Or,
}

/// Triple join kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    /// Mandatory join
    Inner,
    /// Optional join
    LeftOuter,
}

/// AQL expression tree.
///
/// Logical expressions (comparisons, junctions, negation) form a sub-lattice
/// of this type; [`Expr::is_logical`] tells them apart where the grammar
/// demands one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// String literal constant
    Literal(String),

    /// String form of one component of a named join's triple, dereferenced
    /// through the node dictionary
    Property {
        /// Name of the triple join; the query root is `"root"`
        join: String,
        /// Which component of the triple
        part: TriplePart,
    },

    /// Raw identifier of one component of a named join's triple, with no
    /// dictionary join. Produced by the optimizer, not by the parser.
    PropertyRef {
        /// Name of the triple join
        join: String,
        /// Which component of the triple
        part: TriplePart,
    },

    /// Call to a built-in function
    Function {
        /// Function name, resolved against the translator's function table
        name: String,
        /// Ordered argument expressions
        args: Vec<Expr>,
    },

    /// Binary comparison
    Comparison {
        /// Operator
        op: CompareOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },

    /// N-ary conjunction or disjunction
    Junction {
        /// `And` or `Or`
        kind: JunctionKind,
        /// Ordered terms, each logical
        terms: Vec<Expr>,
    },

    /// Logical negation
    Not(Box<Expr>),
}

impl Expr {
    /// Whether this expression belongs to the logical sub-lattice
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            Expr::Comparison { .. } | Expr::Junction { .. } | Expr::Not(_)
        )
    }

    /// Human-readable type name, used in parse errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::Property { .. } => "property value",
            Expr::PropertyRef { .. } => "property reference",
            Expr::Function { .. } => "function",
            Expr::Comparison { .. } => "comparison",
            Expr::Junction { .. } => "junction",
            Expr::Not(_) => "not",
        }
    }
}

/// Named triple join correlated with the root via a logical criterion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Join {
    /// Join name, referenced by property expressions
    pub name: String,
    /// Inner or left-outer
    pub kind: JoinKind,
    /// Correlation criterion
    pub criterion: Expr,
}

/// One output column of a query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Select {
    /// Label carried into the result header (not into the SQL text)
    pub label: String,
    /// Selected expression
    pub expr: Expr,
}

/// One sort clause
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    /// Ascending or descending
    pub ascending: bool,
    /// Sort key expression
    pub expr: Expr,
}

/// A complete AQL query.
///
/// `max_rows` and `row_offset` of `-1` mean "unbounded".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    /// Output columns
    pub selects: Vec<Select>,
    /// Additional triple joins
    pub joins: Vec<Join>,
    /// Search criterion, analogous to SQL `WHERE`
    pub criterion: Option<Expr>,
    /// Sort clauses
    pub sorts: Vec<Sort>,
    /// Maximum number of result rows, `-1` for unbounded
    pub max_rows: i32,
    /// Number of result rows to skip, `-1` for none
    pub row_offset: i32,
}

/// Name of the implicit root triple join
pub const ROOT_JOIN: &str = "root";

impl Default for Query {
    fn default() -> Self {
        Self {
            selects: Vec::new(),
            joins: Vec::new(),
            criterion: None,
            sorts: Vec::new(),
            max_rows: -1,
            row_offset: -1,
        }
    }
}
