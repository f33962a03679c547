//! Keyset (cursor) pagination predicates.
//!
//! For orderings `o1, o2, ..., on` and cursor values `v1, ..., vn`, the "after"
//! predicate is the lexicographic comparison
//!
//! ```text
//! (o1 > v1) OR (o1 = v1 AND o2 > v2) OR ... OR (o1 = v1 AND ... AND on > vn)
//! ```
//!
//! with `>` flipped to `<` on descending columns, and everything flipped again
//! for "before".

use super::{CompareOp, Expr, SortOrder};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Predicate selecting rows strictly after the cursor in `orderings` order.
pub fn keyset_after(orderings: &[Expr], values: Vec<Value>) -> QueryResult<Expr> {
    keyset(orderings, values, Direction::Forward)
}

/// Predicate selecting rows strictly before the cursor in `orderings` order.
pub fn keyset_before(orderings: &[Expr], values: Vec<Value>) -> QueryResult<Expr> {
    keyset(orderings, values, Direction::Backward)
}

fn keyset(orderings: &[Expr], values: Vec<Value>, direction: Direction) -> QueryResult<Expr> {
    if orderings.is_empty() {
        return Err(QueryError::KeysetEmptyOrdering);
    }
    if orderings.len() != values.len() {
        return Err(QueryError::KeysetArity {
            expected: orderings.len(),
            got: values.len(),
        });
    }

    let keys: Vec<(Expr, SortOrder)> = orderings.iter().map(split_ordering).collect();
    let mut steps = Vec::with_capacity(keys.len());
    for (i, (base, order)) in keys.iter().enumerate() {
        let mut terms = Vec::with_capacity(i + 1);
        for (j, (prev, _)) in keys[..i].iter().enumerate() {
            terms.push(prev.clone().eq(values[j].clone()));
        }
        let op = strict_op(*order, direction);
        terms.push(Expr::Compare {
            left: Box::new(base.clone()),
            op,
            right: Box::new(Expr::Value(values[i].clone())),
        });
        steps.push(Expr::And(terms));
    }
    Ok(Expr::Or(steps))
}

fn strict_op(order: SortOrder, direction: Direction) -> CompareOp {
    match (order, direction) {
        (SortOrder::Asc, Direction::Forward) | (SortOrder::Desc, Direction::Backward) => {
            CompareOp::Gt
        }
        (SortOrder::Asc, Direction::Backward) | (SortOrder::Desc, Direction::Forward) => {
            CompareOp::Lt
        }
    }
}

/// Recover the base expression and direction of an ORDER BY item.
///
/// Raw strings such as `"id DESC"` are split on a trailing ASC/DESC keyword
/// (case-insensitive). Anything without an explicit direction is ascending.
pub(crate) fn split_ordering(expr: &Expr) -> (Expr, SortOrder) {
    match expr {
        Expr::Ordered { expr, order } => ((**expr).clone(), *order),
        Expr::Raw { sql, args } => {
            let trimmed = sql.trim_end();
            let Some(idx) = trimmed.rfind(char::is_whitespace) else {
                return (expr.clone(), SortOrder::Asc);
            };
            let keyword = trimmed[idx..].trim_start();
            let order = if keyword.eq_ignore_ascii_case("DESC") {
                SortOrder::Desc
            } else if keyword.eq_ignore_ascii_case("ASC") {
                SortOrder::Asc
            } else {
                return (expr.clone(), SortOrder::Asc);
            };
            let base = Expr::Raw {
                sql: trimmed[..idx].trim_end().to_string(),
                args: args.clone(),
            };
            (base, order)
        }
        other => (other.clone(), SortOrder::Asc),
    }
}
