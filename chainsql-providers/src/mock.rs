use crate::{
    Account, ChainClient, EventTransport, Instructions, PreparedTransaction, ProviderError,
    RawContractEvent, SignedTransaction, SubmitResult, TransactionDetail, TxNotification,
};
use async_trait::async_trait;
use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    borrow::Borrow,
    collections::{HashMap, VecDeque},
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;

/// Transaction id handed out by [`MockConnection::sign`] once the queued ids are used up
pub const DEFAULT_TX_ID: &str =
    "3F4E1B0F7D2C6A5B8E9D0C1B2A3F4E5D6C7B8A9F0E1D2C3B4A5F6E7D8C9B0A1F";

/// A call received by the [`MockConnection`], in the order it was made
#[derive(Clone, Debug, PartialEq)]
pub enum MockCall {
    Prepare(Value),
    Sign(Value),
    Submit(String),
    GetTransaction(String),
    Request { command: String, params: Value },
    EstimateGas(Value),
    SubscribeTx(String),
    UnsubscribeTx(String),
    SubscribeContract { address: String, event_signature: Option<String> },
    UnsubscribeContract { address: String, event_signature: Option<String> },
}

#[derive(Debug, Default)]
struct Responses {
    tx_ids: VecDeque<String>,
    submits: VecDeque<Result<SubmitResult, String>>,
    transactions: VecDeque<TransactionDetail>,
    requests: VecDeque<Result<Value, String>>,
    gas_estimates: VecDeque<u64>,
    // `None` ends the stream after the notifications queued before it
    notifications: VecDeque<Option<TxNotification>>,
    events: VecDeque<RawContractEvent>,
    subscribe_errors: VecDeque<String>,
    unsubscribe_errors: VecDeque<String>,
}

#[derive(Clone, Debug)]
/// Mock connection used in test environments.
///
/// Responses are served in the order they were pushed. Notifications and event frames
/// pushed before a subscription is made are delivered into that subscription as soon as
/// it is registered; the subscription then stays open.
pub struct MockConnection {
    account: Account,
    calls: Arc<Mutex<Vec<MockCall>>>,
    responses: Arc<Mutex<Responses>>,
    tx_subscriptions: Arc<Mutex<HashMap<String, UnboundedSender<TxNotification>>>>,
    event_subscriptions: Arc<Mutex<Vec<(String, UnboundedSender<RawContractEvent>)>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockConnection {
    /// Instantiates a mock connection acting for `account`
    pub fn new(account: Account) -> Self {
        Self {
            account,
            calls: Default::default(),
            responses: Default::default(),
            tx_subscriptions: Default::default(),
            event_subscriptions: Default::default(),
        }
    }

    /// Returns every call received so far
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Returns the position of the first call matching `predicate`
    pub fn position(&self, predicate: impl Fn(&MockCall) -> bool) -> Option<usize> {
        lock(&self.calls).iter().position(predicate)
    }

    /// Sets the id returned by the next `sign`
    pub fn push_tx_id(&self, id: impl Into<String>) {
        lock(&self.responses).tx_ids.push_back(id.into());
    }

    /// Pushes the result of the next `submit`
    pub fn push_submit_result(&self, result: SubmitResult) {
        lock(&self.responses).submits.push_back(Ok(result));
    }

    /// Makes the next `submit` fail at the transport level
    pub fn push_submit_error(&self, message: impl Into<String>) {
        lock(&self.responses).submits.push_back(Err(message.into()));
    }

    /// Pushes the answer of the next `get_transaction`
    pub fn push_transaction(&self, detail: TransactionDetail) {
        lock(&self.responses).transactions.push_back(detail);
    }

    /// Pushes the answer of the next `request`
    pub fn push_response<T: Serialize + Send + Sync, K: Borrow<T>>(
        &self,
        data: K,
    ) -> Result<(), MockError> {
        let value = serde_json::to_value(data.borrow())?;
        lock(&self.responses).requests.push_back(Ok(value));
        Ok(())
    }

    /// Makes the next `request` fail
    pub fn push_request_error(&self, message: impl Into<String>) {
        lock(&self.responses).requests.push_back(Err(message.into()));
    }

    /// Pushes the answer of the next `estimate_gas`
    pub fn push_gas_estimate(&self, gas: u64) {
        lock(&self.responses).gas_estimates.push_back(gas);
    }

    /// Queues a notification for the next transaction subscription
    pub fn push_tx_notification(&self, notification: TxNotification) {
        lock(&self.responses).notifications.push_back(Some(notification));
    }

    /// Ends the next transaction subscription after the notifications queued so far
    pub fn close_tx_stream(&self) {
        lock(&self.responses).notifications.push_back(None);
    }

    /// Queues an event frame for the next contract subscription
    pub fn push_contract_event(&self, event: RawContractEvent) {
        lock(&self.responses).events.push_back(event);
    }

    /// Makes the next `subscribe_tx` fail
    pub fn fail_next_subscribe(&self, message: impl Into<String>) {
        lock(&self.responses).subscribe_errors.push_back(message.into());
    }

    /// Makes the next `unsubscribe_tx` fail
    pub fn fail_next_unsubscribe(&self, message: impl Into<String>) {
        lock(&self.responses).unsubscribe_errors.push_back(message.into());
    }

    /// Delivers a notification to an already registered transaction subscription.
    ///
    /// Returns false if no subscription with this id is open.
    pub fn notify_tx(&self, id: &str, notification: TxNotification) -> bool {
        lock(&self.tx_subscriptions)
            .get(id)
            .map(|tx| tx.unbounded_send(notification).is_ok())
            .unwrap_or(false)
    }

    /// Delivers an event frame to every open subscription for `address`
    pub fn emit_contract_event(&self, address: &str, event: RawContractEvent) -> usize {
        lock(&self.event_subscriptions)
            .iter()
            .filter(|(addr, _)| addr == address)
            .filter(|(_, tx)| tx.unbounded_send(event.clone()).is_ok())
            .count()
    }

    fn record(&self, call: MockCall) {
        tracing::trace!(?call, "mock call");
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl ChainClient for MockConnection {
    fn account(&self) -> &Account {
        &self.account
    }

    async fn prepare_transaction(
        &self,
        tx_json: Value,
        instructions: &Instructions,
    ) -> Result<PreparedTransaction, ProviderError> {
        self.record(MockCall::Prepare(tx_json.clone()));
        let mut tx_json = tx_json;
        if let Value::Object(fields) = &mut tx_json {
            let fee = instructions.fee.clone().unwrap_or_else(|| "10".to_string());
            fields.entry("Fee").or_insert(Value::String(fee));
            fields.entry("Sequence").or_insert_with(|| instructions.sequence.unwrap_or(1).into());
        }
        let instructions =
            if instructions.is_empty() { None } else { Some(serde_json::to_value(instructions)?) };
        Ok(PreparedTransaction { tx_json, instructions })
    }

    async fn sign(
        &self,
        tx_json: &Value,
        _secret: &str,
    ) -> Result<SignedTransaction, ProviderError> {
        self.record(MockCall::Sign(tx_json.clone()));
        let id = lock(&self.responses).tx_ids.pop_front().unwrap_or_else(|| DEFAULT_TX_ID.into());
        let signed_transaction = hex::encode_upper(serde_json::to_vec(tx_json)?);
        Ok(SignedTransaction { signed_transaction, id })
    }

    async fn submit(&self, signed_transaction: &str) -> Result<SubmitResult, ProviderError> {
        self.record(MockCall::Submit(signed_transaction.to_owned()));
        let next = lock(&self.responses).submits.pop_front();
        match next.ok_or(MockError::EmptyResponses("submit"))? {
            Ok(result) => Ok(result),
            Err(message) => Err(MockError::Injected(message).into()),
        }
    }

    async fn get_transaction(&self, hash: &str) -> Result<TransactionDetail, ProviderError> {
        self.record(MockCall::GetTransaction(hash.to_owned()));
        let next = lock(&self.responses).transactions.pop_front();
        Ok(next.ok_or(MockError::EmptyResponses("get_transaction"))?)
    }

    async fn request<T, R>(&self, command: &str, params: T) -> Result<R, ProviderError>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = serde_json::to_value(params)?;
        self.record(MockCall::Request { command: command.to_owned(), params });
        let next = lock(&self.responses).requests.pop_front();
        match next.ok_or(MockError::EmptyResponses("request"))? {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(message) => Err(ProviderError::NodeError { command: command.to_owned(), message }),
        }
    }

    async fn estimate_gas(&self, tx_json: &Value) -> Result<u64, ProviderError> {
        self.record(MockCall::EstimateGas(tx_json.clone()));
        let next = lock(&self.responses).gas_estimates.pop_front();
        next.ok_or(ProviderError::Unsupported("estimate_gas"))
    }
}

#[async_trait]
impl EventTransport for MockConnection {
    type TxStream = UnboundedReceiver<TxNotification>;
    type EventStream = UnboundedReceiver<RawContractEvent>;

    async fn subscribe_tx(&self, id: &str) -> Result<Self::TxStream, ProviderError> {
        self.record(MockCall::SubscribeTx(id.to_owned()));
        let mut responses = lock(&self.responses);
        if let Some(message) = responses.subscribe_errors.pop_front() {
            return Err(MockError::Injected(message).into())
        }

        let (tx, rx) = mpsc::unbounded();
        let mut open = true;
        while let Some(next) = responses.notifications.pop_front() {
            match next {
                Some(notification) => {
                    let _ = tx.unbounded_send(notification);
                }
                None => {
                    open = false;
                    break
                }
            }
        }
        if open {
            lock(&self.tx_subscriptions).insert(id.to_owned(), tx);
        }
        Ok(rx)
    }

    async fn unsubscribe_tx(&self, id: &str) -> Result<(), ProviderError> {
        self.record(MockCall::UnsubscribeTx(id.to_owned()));
        lock(&self.tx_subscriptions).remove(id);
        match lock(&self.responses).unsubscribe_errors.pop_front() {
            Some(message) => Err(MockError::Injected(message).into()),
            None => Ok(()),
        }
    }

    async fn subscribe_contract(
        &self,
        address: &str,
        event_signature: Option<&str>,
    ) -> Result<Self::EventStream, ProviderError> {
        self.record(MockCall::SubscribeContract {
            address: address.to_owned(),
            event_signature: event_signature.map(ToOwned::to_owned),
        });
        let (tx, rx) = mpsc::unbounded();
        for event in lock(&self.responses).events.drain(..) {
            let _ = tx.unbounded_send(event);
        }
        lock(&self.event_subscriptions).push((address.to_owned(), tx));
        Ok(rx)
    }

    async fn unsubscribe_contract(
        &self,
        address: &str,
        event_signature: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.record(MockCall::UnsubscribeContract {
            address: address.to_owned(),
            event_signature: event_signature.map(ToOwned::to_owned),
        });
        lock(&self.event_subscriptions).retain(|(addr, _)| addr != address);
        Ok(())
    }
}

#[derive(Error, Debug)]
/// Errors for the `MockConnection`
pub enum MockError {
    /// (De)Serialization error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// No response was pushed for the operation
    #[error("empty {0} responses, please push some responses")]
    EmptyResponses(&'static str),

    /// A failure pushed by the test
    #[error("{0}")]
    Injected(String),
}

impl From<MockError> for ProviderError {
    fn from(src: MockError) -> Self {
        ProviderError::transport(src)
    }
}
