//! Output tuple assembly (spec §3 Tuple / §4.11 outer-join semantics):
//! combines a matched (left, right) pair into one OUTPUT row, or fills in
//! nulls for the side an outer join has no counterpart for.
//!
//! An OUTPUT row is always `left_tuple ++ right_tuple[num_keys..]` -- the
//! left tuple already carries the join keys in its leading `num_keys`
//! positions (§3 Key mapping: "the i-th join key on each side lands at
//! position i, shared"), so the right side only contributes its payload.

use value::{ColumnSource, Schema, SideLayout, TypeId, Value};

fn column_type(col: &ColumnSource, schema: &Schema) -> TypeId {
    match col {
        ColumnSource::Attribute(i) => schema.attribute_type(*i).unwrap_or(TypeId::Int64),
        ColumnSource::Dimension(_) => TypeId::Int64,
    }
}

/// Nulls for one side's payload columns (everything past `num_keys`),
/// typed from that side's schema so the output row stays type-consistent.
fn payload_nulls(layout: &SideLayout, schema: &Schema) -> Vec<Value> {
    layout.columns[layout.num_keys..].iter().map(|c| Value::Null(column_type(c, schema))).collect()
}

/// A matched row: `left ++ right[num_keys..]`.
pub fn matched_row(left: &[Value], right: &[Value], num_keys: usize) -> Vec<Value> {
    let mut row = left.to_vec();
    row.extend_from_slice(&right[num_keys..]);
    row
}

/// An unmatched left row under `leftOuter`: the left tuple plus nulls for
/// the right side's payload.
pub fn left_outer_row(left: &[Value], right_layout: &SideLayout, right_schema: &Schema) -> Vec<Value> {
    let mut row = left.to_vec();
    row.extend(payload_nulls(right_layout, right_schema));
    row
}

/// An unmatched right row under `rightOuter`: the right tuple's keys (there
/// is no left row to supply them), nulls for the left side's payload, then
/// the right side's payload.
pub fn right_outer_row(right: &[Value], left_layout: &SideLayout, left_schema: &Schema, num_keys: usize) -> Vec<Value> {
    let mut row = right[..num_keys].to_vec();
    row.extend(payload_nulls(left_layout, left_schema));
    row.extend_from_slice(&right[num_keys..]);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::{AttributeDesc, ColumnSource};

    fn payload_schema() -> Schema {
        Schema { attributes: vec![AttributeDesc { name: "p".into(), type_id: TypeId::Str, nullable: true }], dimensions: vec![] }
    }

    fn payload_layout() -> SideLayout {
        SideLayout { num_keys: 1, columns: vec![ColumnSource::Attribute(0), ColumnSource::Attribute(0)] }
    }

    #[test]
    fn matched_row_drops_right_keys() {
        let left = vec![Value::Int32(1), Value::Str("a".into())];
        let right = vec![Value::Int32(1), Value::Str("x".into())];
        assert_eq!(matched_row(&left, &right, 1), vec![Value::Int32(1), Value::Str("a".into()), Value::Str("x".into())]);
    }

    #[test]
    fn left_outer_row_fills_right_payload_with_typed_nulls() {
        let left = vec![Value::Int32(1), Value::Str("a".into())];
        let row = left_outer_row(&left, &payload_layout(), &payload_schema());
        assert_eq!(row, vec![Value::Int32(1), Value::Str("a".into()), Value::Null(TypeId::Str)]);
    }

    #[test]
    fn right_outer_row_takes_keys_from_right_and_nulls_left_payload() {
        let right = vec![Value::Int32(1), Value::Str("x".into())];
        let row = right_outer_row(&right, &payload_layout(), &payload_schema(), 1);
        assert_eq!(row, vec![Value::Int32(1), Value::Null(TypeId::Str), Value::Str("x".into())]);
    }
}
