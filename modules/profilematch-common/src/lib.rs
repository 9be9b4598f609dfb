pub mod config;
pub mod error;
pub mod types;

pub use config::ResolverConfig;
pub use error::{ConfigError, ResolveError};
pub use types::*;
