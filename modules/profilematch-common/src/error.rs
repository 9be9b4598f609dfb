use thiserror::Error;

/// Errors visible to callers of the resolver. Adapter failures never surface here.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
}

/// Errors raised while loading or validating configuration and policy overrides.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    NotANumber { key: String, value: String },

    #[error("{platform}: weights must sum to 1.0, got {sum:.4}")]
    WeightSum { platform: String, sum: f64 },

    #[error("{platform}: {field} out of range: {value}")]
    OutOfRange {
        platform: String,
        field: &'static str,
        value: f64,
    },

    #[error("Policy file {path}: {message}")]
    PolicyFile { path: String, message: String },
}
