use std::collections::BTreeMap;

use crate::data::value::FieldValue;
use crate::foundation::error::{PlotError, PlotResult};

/// Pure binary function applied to the matched value fields of two joined rows.
pub type BinaryPredicate = fn(&FieldValue, &FieldValue) -> PlotResult<FieldValue>;

/// Registry from predicate name (as written in computed dataset definitions) to function.
#[derive(Clone, Debug)]
pub struct PredicateRegistry {
    preds: BTreeMap<String, BinaryPredicate>,
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        let mut preds = BTreeMap::new();
        preds.insert("diff".to_owned(), diff as BinaryPredicate);
        Self { preds }
    }
}

impl PredicateRegistry {
    /// Registry containing only the built-in predicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a predicate.
    pub fn register(&mut self, name: impl Into<String>, pred: BinaryPredicate) {
        self.preds.insert(name.into(), pred);
    }

    pub fn get(&self, name: &str) -> Option<BinaryPredicate> {
        self.preds.get(name).copied()
    }
}

/// `x - y` over integers and floats.
///
/// Two integers stay integral; any mix with a float is computed as floats. Other operand kinds
/// are a type error.
pub fn diff(x: &FieldValue, y: &FieldValue) -> PlotResult<FieldValue> {
    use FieldValue::{Float, Int};
    match (x, y) {
        (Int(a), Int(b)) => a
            .checked_sub(*b)
            .map(Int)
            .ok_or_else(|| PlotError::data_access(format!("diff of {a} and {b} overflows"))),
        (Float(a), Float(b)) => Ok(Float(a - b)),
        (Float(a), Int(b)) => Ok(Float(a - *b as f64)),
        (Int(a), Float(b)) => Ok(Float(*a as f64 - b)),
        _ => Err(PlotError::data_access(format!(
            "cannot calculate diff of {} and {}",
            x.kind(),
            y.kind()
        ))),
    }
}
