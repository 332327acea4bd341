pub mod dataset;
pub mod source;
pub mod sqlite;
pub mod value;
