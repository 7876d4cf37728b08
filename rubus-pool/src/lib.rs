pub mod catalog;
pub mod error;
pub mod pool;

pub use catalog::{CatalogQuery, Media};
pub use error::{PoolError, Result};
pub use pool::MediaPool;
