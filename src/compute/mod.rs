pub mod join;
pub mod predicate;
