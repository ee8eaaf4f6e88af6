//! Request handlers for the record store.

mod history;
mod records;

pub use history::*;
pub use records::*;
