use crate::codec::AbiError;
use chainsql_providers::{ProviderError, SubmitResult, TxStatus};
use serde_json::{json, Value};
use thiserror::Error;

/// Placed in the `contractAddress` field when a deployment created no account
pub const CREATE_NODE_MISSING: &str = "Can not find CreateNode";

#[derive(Error, Debug)]
/// An Error which is thrown when interacting with a smart contract
pub enum ContractError {
    /// Thrown when the interface given to the binding is missing or malformed
    #[error("invalid contract interface: {0}")]
    Configuration(String),

    /// Thrown when no overload of a method takes the given number of arguments
    #[error("invalid number of parameters for \"{name}\". Got {got} expected {expected}")]
    InvalidArgumentCount { name: String, got: usize, expected: usize },

    /// Thrown when a key names no function of the interface
    #[error("method {0} not found in the contract interface")]
    MethodNotFound(String),

    /// Thrown when a key names no event of the interface
    #[error("event {0} not found in the contract interface")]
    EventNotFound(String),

    /// Thrown when encoding a call with the wrong number of arguments
    #[error("the number of arguments does not match the number of parameters: expected {expected}, got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },

    /// Thrown when an operation needs the contract address before it is known
    #[error("this contract object doesn't have an address set yet, please set an address first")]
    AddressNotSet,

    /// Thrown when setting an empty address
    #[error("invalid contract address {0:?}")]
    InvalidAddress(String),

    /// Thrown when subscribing to one of the reserved event names
    #[error("the event \"{0}\" is a reserved event name, you can't use it")]
    ReservedEventName(String),

    /// Thrown when deploying without bytecode
    #[error("no contract data was provided for the deployment")]
    DeployDataMissing,

    /// Thrown when the node does not accept a submitted transaction
    #[error("transaction rejected: {result}")]
    SubmitRejected {
        result: SubmitResult,
        /// The failure of the unsubscribe issued after the rejection, if any
        cleanup_error: Option<String>,
    },

    /// Thrown when submitting a transaction fails in the transport
    #[error("{source}")]
    SubmitFailed {
        source: ProviderError,
        /// The failure of the unsubscribe issued after the failed submit, if any
        cleanup_error: Option<String>,
    },

    /// Thrown when the transaction subscription reports a failure status
    #[error("transaction {tx_hash} failed with status {status}: {}", .error_message.as_deref().unwrap_or_default())]
    ConfirmationFailed { status: TxStatus, tx_hash: String, error_message: Option<String> },

    /// Thrown when a validated deployment created no contract account
    #[error("can not find the created contract in transaction {tx_hash}")]
    CreationNodeNotFound { status: TxStatus, tx_hash: String },

    /// Thrown when a subscription ends before it delivered a final status
    #[error("the subscription closed before the transaction reached a final status")]
    SubscriptionClosed,

    /// Thrown when encoding or decoding fails
    #[error(transparent)]
    AbiError(#[from] AbiError),

    /// Thrown when a chain client or transport call fails
    #[error(transparent)]
    ProviderError(#[from] ProviderError),
}

impl ContractError {
    /// Returns the error as the JSON payload ChainSQL clients report for it.
    ///
    /// Transaction failures keep their structured form (the submit result, or
    /// `{status, tx_hash, ...}`); every other error becomes its message.
    pub fn to_json(&self) -> Value {
        match self {
            ContractError::SubmitRejected { result, .. } => {
                serde_json::to_value(result).unwrap_or_else(|_| Value::String(self.to_string()))
            }
            ContractError::ConfirmationFailed { status, tx_hash, error_message } => json!({
                "status": status,
                "tx_hash": tx_hash,
                "error_message": error_message,
            }),
            ContractError::CreationNodeNotFound { status, tx_hash } => json!({
                "status": status,
                "tx_hash": tx_hash,
                "contractAddress": CREATE_NODE_MISSING,
            }),
            _ => Value::String(self.to_string()),
        }
    }

    /// Returns the transaction status carried by lifecycle failures
    pub fn status(&self) -> Option<TxStatus> {
        match self {
            ContractError::ConfirmationFailed { status, .. } |
            ContractError::CreationNodeNotFound { status, .. } => Some(*status),
            _ => None,
        }
    }
}
