//! Database module for PostgreSQL persistence.

mod history;
mod pool;
mod records;

pub use history::*;
pub use pool::*;
pub use records::*;
