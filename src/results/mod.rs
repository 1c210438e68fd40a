mod cursor;
mod row;

pub use cursor::{MemoryRows, RowCursor, RowSource};
pub use row::{FromSqlValue, Row};
