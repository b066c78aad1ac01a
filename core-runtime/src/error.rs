use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid [`crate::CoreConfig`] or sync timings
    #[error("Configuration error: {0}")]
    Config(String),

    /// No host implementation was injected and no desktop default exists
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// A desktop default could not be created
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
