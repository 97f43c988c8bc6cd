pub mod error;
pub mod record;
pub mod types;
pub mod value;

pub use error::{ModelError, Result};
pub use record::Record;
pub use types::{Column, ColumnDefault};
pub use value::{DataType, FromValue, Value};
