//! AQL query optimizer
//!
//! One rewrite: a comparison whose two operands are both property values is
//! turned into the same comparison over property references. The SQL for a
//! property reference compares raw triple columns (integer ids), so the
//! rewrite drops a node-dictionary join from each side.

use crate::model::{Expr, Join, Query, Select, Sort};

/// Optimize a query, consuming it and returning the rewritten tree.
///
/// The result set of the translated query is unchanged; only the generated
/// SQL differs.
pub fn optimize(query: Query) -> Query {
    Query {
        selects: query
            .selects
            .into_iter()
            .map(|select| Select {
                label: select.label,
                expr: rewrite(select.expr),
            })
            .collect(),
        joins: query
            .joins
            .into_iter()
            .map(|join| Join {
                name: join.name,
                kind: join.kind,
                criterion: rewrite(join.criterion),
            })
            .collect(),
        criterion: query.criterion.map(rewrite),
        sorts: query
            .sorts
            .into_iter()
            .map(|sort| Sort {
                ascending: sort.ascending,
                expr: rewrite(sort.expr),
            })
            .collect(),
        max_rows: query.max_rows,
        row_offset: query.row_offset,
    }
}

fn rewrite(expr: Expr) -> Expr {
    match expr {
        Expr::Comparison { op, left, right } => match (*left, *right) {
            (
                Expr::Property {
                    join: left_join,
                    part: left_part,
                },
                Expr::Property {
                    join: right_join,
                    part: right_part,
                },
            ) => Expr::Comparison {
                op,
                left: Box::new(Expr::PropertyRef {
                    join: left_join,
                    part: left_part,
                }),
                right: Box::new(Expr::PropertyRef {
                    join: right_join,
                    part: right_part,
                }),
            },
            (left, right) => Expr::Comparison {
                op,
                left: Box::new(rewrite(left)),
                right: Box::new(rewrite(right)),
            },
        },
        Expr::Junction { kind, terms } => Expr::Junction {
            kind,
            terms: terms.into_iter().map(rewrite).collect(),
        },
        Expr::Not(inner) => Expr::Not(Box::new(rewrite(*inner))),
        Expr::Function { name, args } => Expr::Function {
            name,
            args: args.into_iter().map(rewrite).collect(),
        },
        other => other,
    }
}
