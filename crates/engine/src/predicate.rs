//! The output filter (§4.12): an optional boolean predicate bound
//! against the OUTPUT tuple layout, evaluated once per candidate row after
//! the join proper has produced it.
//!
//! The predicate expression language itself is an external collaborator
//! (§1: parameter parsing from a full query language is out of scope here)
//! -- this crate only defines the seam a host binds its own evaluator to,
//! plus one concrete, dependency-free implementation (`ColumnEquals`) for
//! simple single-column checks.

use value::Value;

/// Bound against the assembled OUTPUT tuple (post-join columns, spec §4.12).
/// Returns `None` for a null result, matching the tri-valued logic a real
/// expression language would carry; a `None`/`Some(false)` result drops the
/// row.
pub trait OutputPredicate {
    fn eval(&self, output_row: &[Value]) -> value::JoinResult<Option<bool>>;
}

/// `output_row[column] == value`. Enough to express the S-6 scenario
/// (`filter = (col2 = 'y')`) without a full expression parser.
pub struct ColumnEquals {
    pub column: usize,
    pub value: Value,
}

impl OutputPredicate for ColumnEquals {
    fn eval(&self, output_row: &[Value]) -> value::JoinResult<Option<bool>> {
        match output_row.get(self.column) {
            None => Ok(None),
            Some(v) if v.is_null() => Ok(None),
            Some(v) => Ok(Some(v.compare(&self.value) == std::cmp::Ordering::Equal)),
        }
    }
}

/// Runs `predicate` over `row` and reports whether it should be kept:
/// dropped on null or `false` (§4.12).
pub fn passes(predicate: Option<&dyn OutputPredicate>, row: &[Value]) -> value::JoinResult<bool> {
    match predicate {
        None => Ok(true),
        Some(p) => Ok(matches!(p.eval(row)?, Some(true))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_equals_matches_value() {
        let p = ColumnEquals { column: 1, value: Value::Str("y".to_string()) };
        let row = vec![Value::Int32(2), Value::Str("y".to_string())];
        assert!(passes(Some(&p), &row).unwrap());
        let row2 = vec![Value::Int32(2), Value::Str("x".to_string())];
        assert!(!passes(Some(&p), &row2).unwrap());
    }

    #[test]
    fn null_cell_fails_the_predicate() {
        let p = ColumnEquals { column: 0, value: Value::Int32(1) };
        let row = vec![Value::Null(value::TypeId::Int32)];
        assert!(!passes(Some(&p), &row).unwrap());
    }

    #[test]
    fn no_predicate_always_passes() {
        assert!(passes(None, &[]).unwrap());
    }
}
