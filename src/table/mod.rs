//! Tables: schemas, typed values, and the [`Table`] type.
//!
//! - [`Value`] / [`Record`] - typed cells and rows
//! - [`ColumnType`] / [`Schema`] - the closed type set and column declarations
//! - [`Table`] - a schema-checked row store over a B+Tree

mod schema;
#[allow(clippy::module_inception)]
mod table;
mod value;

pub use schema::{ColumnType, Schema};
pub use table::Table;
pub use value::{record, Record, Value};
