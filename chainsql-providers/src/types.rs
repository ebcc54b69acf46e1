//! Wire types exchanged with a ChainSQL node and its event transport.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Result code a node returns when it accepted a submitted transaction.
pub const SUCCESS_RESULT_CODE: &str = "tesSUCCESS";

/// Notification type reported for a single tracked transaction.
pub const SINGLE_TRANSACTION: &str = "singleTransaction";

/// The account a connection acts on behalf of.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// The account's address
    pub address: String,
    /// The secret used to sign transactions for `address`
    pub secret: String,
}

impl Account {
    /// Creates a new account from its address and signing secret
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { address: address.into(), secret: secret.into() }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account").field("address", &self.address).field("secret", &"<redacted>").finish()
    }
}

/// Optional instructions forwarded to the transaction preparation helper.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ledger_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ledger_version_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
}

impl Instructions {
    /// Returns true if no instruction is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A transaction filled in by the preparation helper (fee, sequence, ledger bounds)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreparedTransaction {
    #[serde(rename = "txJSON")]
    pub tx_json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Value>,
}

/// A signed transaction blob together with its transaction id (hash)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub signed_transaction: String,
    pub id: String,
}

/// The node's answer to a submitted transaction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    pub result_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl SubmitResult {
    /// Returns true if the node accepted the transaction
    pub fn is_success(&self) -> bool {
        self.result_code == SUCCESS_RESULT_CODE
    }
}

impl fmt::Display for SubmitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result_message {
            Some(msg) => write!(f, "{}: {}", self.result_code, msg),
            None => f.write_str(&self.result_code),
        }
    }
}

/// Details of a validated transaction as returned by `get_transaction`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    #[serde(default)]
    pub specification: TransactionSpecification,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TransactionDetail {
    /// Returns the account of the first node created by this transaction.
    ///
    /// For a contract deployment this is the address of the new contract.
    pub fn created_account(&self) -> Option<&str> {
        self.specification.meta.affected_nodes.iter().find_map(|node| match node {
            AffectedNode::CreatedNode(created) => {
                created.new_fields.account.as_deref().filter(|account| !account.is_empty())
            }
            _ => None,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSpecification {
    #[serde(default)]
    pub meta: TransactionMeta,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(rename = "AffectedNodes", default)]
    pub affected_nodes: Vec<AffectedNode>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A ledger entry touched by a transaction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AffectedNode {
    CreatedNode(CreatedNode),
    ModifiedNode(Value),
    DeletedNode(Value),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedNode {
    #[serde(rename = "LedgerEntryType", default)]
    pub ledger_entry_type: String,
    #[serde(rename = "LedgerIndex", default, skip_serializing_if = "Option::is_none")]
    pub ledger_index: Option<String>,
    #[serde(rename = "NewFields", default)]
    pub new_fields: NewFields,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewFields {
    #[serde(rename = "Account", default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Status reported by the transaction subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    SendSuccess,
    ValidateSuccess,
    DbSuccess,
    DbError,
    DbTimeout,
    ValidateTimeout,
    /// Any status this crate does not act on
    #[serde(other)]
    Other,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::SendSuccess => "send_success",
            TxStatus::ValidateSuccess => "validate_success",
            TxStatus::DbSuccess => "db_success",
            TxStatus::DbError => "db_error",
            TxStatus::DbTimeout => "db_timeout",
            TxStatus::ValidateTimeout => "validate_timeout",
            TxStatus::Other => "other",
        }
    }

    /// Returns true for the statuses that end a transaction unsuccessfully
    pub fn is_failure(&self) -> bool {
        matches!(self, TxStatus::DbError | TxStatus::DbTimeout | TxStatus::ValidateTimeout)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification delivered by a transaction subscription
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxNotification {
    pub status: TxStatus,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TxRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TxNotification {
    /// Returns the hash of the transaction this notification refers to, if present
    pub fn tx_hash(&self) -> Option<&str> {
        self.transaction.as_ref().map(|tx| tx.hash.as_str())
    }

    /// Returns true if this notification concerns a single tracked transaction
    pub fn is_single_transaction(&self) -> bool {
        self.kind.as_deref() == Some(SINGLE_TRANSACTION)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxRef {
    pub hash: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A contract event frame pushed by the event transport
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContractEvent {
    /// Hex encoded non-indexed event data
    #[serde(rename = "ContractEventInfo", default)]
    pub data: String,
    /// Hex encoded topics, the event signature first unless the event is anonymous
    #[serde(rename = "ContractEventTopics", default)]
    pub topics: Vec<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Parameters of the `contract_call` command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallRequest {
    pub account: String,
    pub contract_address: String,
    pub contract_data: String,
}

/// Answer of the `contract_call` command
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractCallResponse {
    #[serde(default)]
    pub contract_call_result: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}
