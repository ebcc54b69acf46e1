#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]
#![allow(clippy::type_complexity)]
//! # Clients for interacting with ChainSQL nodes
//!
//! This crate defines the collaborator interfaces the contract bindings are written
//! against:
//!
//! * [`ChainClient`]: transaction preparation, signing, submission, transaction lookup and
//!   raw node commands such as `contract_call`.
//! * [`EventTransport`]: transaction and contract-event subscriptions.
//!
//! Both traits are implemented by [`MockConnection`], which records every call and serves
//! pre-loaded responses, so bindings can be exercised without a node.
//!
//! ```
//! # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! use chainsql_providers::{Account, ChainClient, MockConnection, SubmitResult};
//!
//! let mock = MockConnection::new(Account::new("zHb9CJAWyB4zj91VRWn96DkukG4bwdtyTh", "snoPBrXtMeMyMHUVTgbuqAfg1SUTb"));
//! mock.push_submit_result(SubmitResult {
//!     result_code: "tesSUCCESS".to_string(),
//!     result_message: None,
//!     other: Default::default(),
//! });
//! let res = mock.submit("1200...").await?;
//! assert!(res.is_success());
//! # Ok(())
//! # }
//! ```
mod errors;
pub use errors::ProviderError;

mod types;
pub use types::*;

mod mock;
pub use mock::{MockCall, MockConnection, MockError};

use async_trait::async_trait;
use auto_impl::auto_impl;
use futures_core::Stream;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Debug;

#[async_trait]
#[auto_impl(&, Box, Arc)]
/// The chain client a contract binding submits its transactions through.
///
/// Implementations own the account and secret; callers only ever read them.
pub trait ChainClient: Debug + Send + Sync {
    /// The account transactions are sent from
    fn account(&self) -> &Account;

    /// Fills in the fields a transaction needs before signing (fee, sequence, ledger bounds)
    async fn prepare_transaction(
        &self,
        tx_json: Value,
        instructions: &Instructions,
    ) -> Result<PreparedTransaction, ProviderError>;

    /// Signs the prepared transaction with `secret`
    async fn sign(&self, tx_json: &Value, secret: &str)
        -> Result<SignedTransaction, ProviderError>;

    /// Submits a signed transaction blob
    async fn submit(&self, signed_transaction: &str) -> Result<SubmitResult, ProviderError>;

    /// Fetches a validated transaction by its hash
    async fn get_transaction(&self, hash: &str) -> Result<TransactionDetail, ProviderError>;

    /// Sends a raw command with the provided parameters serialized as JSON
    async fn request<T, R>(&self, command: &str, params: T) -> Result<R, ProviderError>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send;

    /// Estimates the gas a transaction would consume.
    ///
    /// Nodes that have no estimation command keep the default, which reports the
    /// operation as unsupported.
    async fn estimate_gas(&self, _tx_json: &Value) -> Result<u64, ProviderError> {
        Err(ProviderError::Unsupported("estimate_gas"))
    }
}

#[async_trait]
#[auto_impl(&, Box, Arc)]
/// A transport supporting transaction and contract-event subscriptions.
pub trait EventTransport: Debug + Send + Sync {
    /// The stream of status notifications for one transaction
    type TxStream: Stream<Item = TxNotification> + Send + Unpin;

    /// The stream of raw event frames emitted by one contract
    type EventStream: Stream<Item = RawContractEvent> + Send + Unpin;

    /// Registers a subscription for the transaction with the given id
    async fn subscribe_tx(&self, id: &str) -> Result<Self::TxStream, ProviderError>;

    /// Removes the subscription for the transaction with the given id
    async fn unsubscribe_tx(&self, id: &str) -> Result<(), ProviderError>;

    /// Registers a subscription for the events emitted by the contract at `address`,
    /// optionally restricted to one event signature
    async fn subscribe_contract(
        &self,
        address: &str,
        event_signature: Option<&str>,
    ) -> Result<Self::EventStream, ProviderError>;

    /// Removes a contract event subscription
    async fn unsubscribe_contract(
        &self,
        address: &str,
        event_signature: Option<&str>,
    ) -> Result<(), ProviderError>;
}
