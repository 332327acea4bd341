use std::collections::HashMap;

use crate::compute::predicate::BinaryPredicate;
use crate::data::dataset::{DataSet, StaticDataSet, check_iteration};
use crate::data::value::FieldValue;
use crate::foundation::error::{PlotError, PlotResult};

/// Field names of every derived dataset.
pub const KEY_FIELD: &str = "key";
pub const VALUE_FIELD: &str = "value";

/// One side of a derive: a dataset plus the fields to join on and to combine.
pub struct JoinInput<'a> {
    /// Dataset name, for error messages.
    pub name: &'a str,
    pub dataset: &'a mut dyn DataSet,
    pub join_field: &'a str,
    pub value_field: &'a str,
}

impl JoinInput<'_> {
    fn read(&self, field: &str, what: &str) -> PlotResult<FieldValue> {
        match self.dataset.field(field) {
            FieldValue::Error(e) => Err(PlotError::data_access(format!(
                "did not get {what} field {field:?} from dataset {:?}: {e}",
                self.name
            ))),
            v => Ok(v),
        }
    }
}

/// Join `left` and `right` on their join fields and apply `pred` to matched value fields.
///
/// The right side is materialized first into a map keyed by the join value's key text; a
/// repeated right key replaces the earlier one. The left side is then streamed once and rows
/// without a match are skipped. Output rows keep left scan order and carry the fields
/// [`KEY_FIELD`] and [`VALUE_FIELD`].
pub fn derive(
    pred: BinaryPredicate,
    left: JoinInput<'_>,
    right: JoinInput<'_>,
) -> PlotResult<StaticDataSet> {
    left.dataset.reset();
    right.dataset.reset();

    let mut rows = HashMap::<String, FieldValue>::new();
    while right.dataset.next() {
        let join = right.read(right.join_field, "join")?;
        let value = right.read(right.value_field, "value")?;
        rows.insert(join.key_text(), value);
    }
    check_iteration(&*right.dataset).map_err(|e| e.with_context(format!("dataset {:?}", right.name)))?;

    let mut out = StaticDataSet::with_fields(&[KEY_FIELD, VALUE_FIELD]);
    while left.dataset.next() {
        let join = left.read(left.join_field, "join")?;
        let Some(value2) = rows.get(&join.key_text()) else {
            tracing::debug!(join = %join.key_text(), dataset = left.name, "no matching row for join field");
            continue;
        };
        let value1 = left.read(left.value_field, "value")?;
        let res = pred(&value1, value2)?;
        out.push_row(vec![join, res])?;
    }
    check_iteration(&*left.dataset).map_err(|e| e.with_context(format!("dataset {:?}", left.name)))?;

    Ok(out)
}

/// Copy the join and value fields of every row into a standalone dataset with the fields
/// [`KEY_FIELD`] and [`VALUE_FIELD`].
///
/// Lets a dataset be joined against itself: the copy serves as the right side.
pub fn project(input: JoinInput<'_>) -> PlotResult<StaticDataSet> {
    input.dataset.reset();
    let mut out = StaticDataSet::with_fields(&[KEY_FIELD, VALUE_FIELD]);
    while input.dataset.next() {
        let join = input.read(input.join_field, "join")?;
        let value = input.read(input.value_field, "value")?;
        out.push_row(vec![join, value])?;
    }
    check_iteration(&*input.dataset).map_err(|e| e.with_context(format!("dataset {:?}", input.name)))?;
    input.dataset.reset();
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/compute/join.rs"]
mod tests;
