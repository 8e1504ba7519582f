pub mod config;
pub mod error;
pub mod dataset;
pub mod retrieval;
pub mod eval;

pub use config::Config;
pub use error::{MirevalError, Result};
pub use dataset::Table;
