//! Contract transactions and their lifecycle: prepare, sign, subscribe, submit and wait
//! for a final status.
use crate::{
    base::MethodReturn, codec::strip_hex_prefix, interface::Descriptor, Contract, ContractError,
};
use chainsql_providers::{
    ChainClient, ContractCallRequest, ContractCallResponse, EventTransport, Instructions,
    ProviderError, TxStatus,
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, trace, warn};
use tracing_futures::Instrument;

/// The `TransactionType` of every contract transaction
pub const CONTRACT_TRANSACTION_TYPE: &str = "Contract";

/// The node command used for read-only calls
pub const CONTRACT_CALL_COMMAND: &str = "contract_call";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractOpType {
    Deploy = 1,
    Invoke = 2,
}

impl Serialize for ContractOpType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// The payload of a contract deployment or invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContractTransaction {
    pub transaction_type: &'static str,
    pub contract_op_type: ContractOpType,
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    pub contract_data: String,
}

impl ContractTransaction {
    /// A deployment of `contract_data` (bytecode and encoded constructor arguments)
    pub fn deploy(account: impl Into<String>, contract_data: &str) -> Self {
        Self {
            transaction_type: CONTRACT_TRANSACTION_TYPE,
            contract_op_type: ContractOpType::Deploy,
            account: account.into(),
            contract_address: None,
            contract_value: None,
            gas: None,
            contract_data: normalize_contract_data(contract_data),
        }
    }

    /// An invocation of the contract at `address` with calldata `contract_data`
    pub fn invoke(
        account: impl Into<String>,
        address: impl Into<String>,
        contract_data: &str,
    ) -> Self {
        Self {
            transaction_type: CONTRACT_TRANSACTION_TYPE,
            contract_op_type: ContractOpType::Invoke,
            account: account.into(),
            contract_address: Some(address.into()),
            contract_value: None,
            gas: None,
            contract_data: normalize_contract_data(contract_data),
        }
    }

    #[must_use]
    pub fn gas(mut self, gas: Option<u64>) -> Self {
        self.gas = gas;
        self
    }

    #[must_use]
    pub fn value(mut self, value: Option<String>) -> Self {
        self.contract_value = value;
        self
    }

    pub fn is_deploy(&self) -> bool {
        self.contract_op_type == ContractOpType::Deploy
    }

    pub(crate) fn to_json(&self) -> Result<Value, ContractError> {
        serde_json::to_value(self).map_err(|err| ProviderError::from(err).into())
    }
}

/// Strips the `0x` prefix and upper-cases hex data, the form nodes expect
pub fn normalize_contract_data(data: &str) -> String {
    strip_hex_prefix(data).to_ascii_uppercase()
}

/// When a submitted transaction counts as done.
///
/// Deployments always wait for validation, since the created address is only known then.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expect {
    /// As soon as the node accepted the submission
    SendSuccess,
    /// Once the transaction was validated
    #[default]
    ValidateSuccess,
}

/// The result of a successful transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    pub status: TxStatus,
    pub tx_hash: String,
    /// The created contract's address, for deployments
    #[serde(rename = "contractAddress", default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

/// Runs a contract transaction through its full lifecycle.
///
/// Deployments write the created contract's address into `contract` before resolving.
pub(crate) async fn execute<C>(
    contract: &Contract<C>,
    tx: ContractTransaction,
    instructions: &Instructions,
    expect: Expect,
) -> Result<TxResult, ContractError>
where
    C: ChainClient + EventTransport,
{
    let span = tracing::debug_span!("contract_tx", op = ?tx.contract_op_type, ?expect);
    run(contract, tx, instructions, expect).instrument(span).await
}

async fn run<C>(
    contract: &Contract<C>,
    tx: ContractTransaction,
    instructions: &Instructions,
    expect: Expect,
) -> Result<TxResult, ContractError>
where
    C: ChainClient + EventTransport,
{
    let client = contract.client();
    let is_deploy = tx.is_deploy();

    let prepared = client.prepare_transaction(tx.to_json()?, instructions).await?;
    trace!(tx = ?prepared.tx_json, "prepared");

    let signed = client.sign(&prepared.tx_json, &client.account().secret).await?;
    let id = signed.id;
    debug!(%id, "signed");

    // deployments always wait for validation: the address comes from the validated transaction
    if expect == Expect::SendSuccess && !is_deploy {
        let result = client.submit(&signed.signed_transaction).await?;
        if !result.is_success() {
            return Err(ContractError::SubmitRejected { result, cleanup_error: None })
        }
        debug!(%id, "submitted");
        return Ok(TxResult { status: TxStatus::SendSuccess, tx_hash: id, contract_address: None })
    }

    // the subscription has to be in place before the node can report on the transaction
    let mut notifications = client.subscribe_tx(&id).await?;
    match client.submit(&signed.signed_transaction).await {
        Ok(result) if result.is_success() => debug!(%id, "submitted"),
        Ok(result) => {
            debug!(%id, %result, "submit rejected");
            let cleanup_error = unsubscribe(client.as_ref(), &id).await;
            return Err(ContractError::SubmitRejected { result, cleanup_error })
        }
        Err(source) => {
            debug!(%id, err = %source, "submit failed");
            let cleanup_error = unsubscribe(client.as_ref(), &id).await;
            return Err(ContractError::SubmitFailed { source, cleanup_error })
        }
    }

    while let Some(notification) = notifications.next().await {
        let status = notification.status;
        let tx_hash = notification.tx_hash().unwrap_or(&id).to_owned();
        trace!(%status, %tx_hash, "notification");

        if status == TxStatus::ValidateSuccess && notification.is_single_transaction() {
            if !is_deploy {
                return Ok(TxResult { status, tx_hash, contract_address: None })
            }
            let detail = client.get_transaction(&tx_hash).await?;
            let address = match detail.created_account() {
                Some(address) => address.to_owned(),
                None => return Err(ContractError::CreationNodeNotFound { status, tx_hash }),
            };
            contract.set_address(address.clone())?;
            debug!(%tx_hash, %address, "deployed");
            return Ok(TxResult { status, tx_hash, contract_address: Some(address) })
        }

        if status.is_failure() {
            return Err(ContractError::ConfirmationFailed {
                status,
                tx_hash,
                error_message: notification.error_message,
            })
        }
    }

    Err(ContractError::SubscriptionClosed)
}

/// Best-effort removal of a transaction subscription, returning the failure's message
async fn unsubscribe<C: EventTransport>(client: &C, id: &str) -> Option<String> {
    match client.unsubscribe_tx(id).await {
        Ok(()) => None,
        Err(err) => {
            warn!(%id, %err, "unsubscribeTx failure");
            Some(err.to_string())
        }
    }
}

/// Runs a read-only `contract_call` and decodes its result with `descriptor`'s outputs
pub(crate) async fn execute_call<C: ChainClient>(
    contract: &Contract<C>,
    descriptor: &Descriptor,
    address: String,
    data: &str,
) -> Result<MethodReturn, ContractError> {
    let client = contract.client();
    let request = ContractCallRequest {
        account: client.account().address.clone(),
        contract_address: address,
        contract_data: normalize_contract_data(data),
    };
    let span = tracing::debug_span!("contract_call", method = %descriptor.name);
    let response: ContractCallResponse =
        client.request(CONTRACT_CALL_COMMAND, request).instrument(span).await?;
    trace!(result = ?response.contract_call_result, "contract_call");
    contract.interface().decode_method_return(&descriptor.outputs, response.contract_call_result.as_deref())
}

/// Asks the chain client to estimate the gas `tx` would consume
pub(crate) async fn execute_estimate<C: ChainClient>(
    contract: &Contract<C>,
    tx: ContractTransaction,
) -> Result<u64, ContractError> {
    Ok(contract.client().estimate_gas(&tx.to_json()?).await?)
}
