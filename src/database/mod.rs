pub mod models;
pub mod operations;
pub mod paths;
pub mod traits;

pub use operations::SqliteDocumentStore;
pub use traits::{DocumentStore, FieldValue, Filter, SetOptions};
