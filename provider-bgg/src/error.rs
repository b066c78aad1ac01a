//! Error types for the BoardGameGeek provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BggError {
    /// The API answered 200 with an `<errors>` document (unknown user, ...)
    #[error("BoardGameGeek API error: {0}")]
    ApiError(String),

    /// Failed to parse the XML body
    #[error("Failed to parse collection response: {0}")]
    ParseError(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, BggError>;

impl From<quick_xml::DeError> for BggError {
    fn from(error: quick_xml::DeError) -> Self {
        BggError::ParseError(error.to_string())
    }
}

impl From<BggError> for BridgeError {
    fn from(error: BggError) -> Self {
        match error {
            BggError::ApiError(msg) => {
                BridgeError::OperationFailed(format!("BoardGameGeek API error: {}", msg))
            }
            BggError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            BggError::BridgeError(e) => e,
        }
    }
}
