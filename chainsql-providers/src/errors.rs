use std::error::Error;
use thiserror::Error;

/// An error thrown when talking to a ChainSQL node or its event transport
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An error during the transport's operation, type-erased
    #[error(transparent)]
    TransportError(Box<dyn Error + Send + Sync>),

    /// (De)Serialization of a request or response failed
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// Hex decoding failed
    #[error(transparent)]
    HexError(#[from] hex::FromHexError),

    /// The node answered a command with an error
    #[error("{command} failed: {message}")]
    NodeError { command: String, message: String },

    /// The connection does not implement the requested operation
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Catch-all for custom errors
    #[error("custom error: {0}")]
    CustomError(String),
}

impl ProviderError {
    /// Wraps any transport error
    pub fn transport<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        ProviderError::TransportError(Box::new(err))
    }
}
