//! Storage naming for accepted uploads.

mod error;
mod namer;

pub use error::StorageError;
pub use namer::{is_storage_name, StorageNamer};
