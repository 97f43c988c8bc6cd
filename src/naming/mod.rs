//! Key-case translation and table-name derivation.
//!
//! Pure functions, no state and no I/O.

mod case;
mod inflect;

pub use case::{to_natural_case, to_natural_key, to_storage_case, to_storage_key};
pub use inflect::{pluralize, simple_type_name, table_name_for, table_name_of, tableize};
