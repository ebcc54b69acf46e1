use chainsql_contract::{AbiCodec, Address, Contract, EthAbiCodec, ParamType, Token};
use chainsql_providers::{
    Account, MockConnection, RawContractEvent, SubmitResult, TransactionDetail, TxNotification,
    TxRef, TxStatus,
};
use serde_json::json;
use std::sync::Arc;

pub const ACCOUNT: &str = "zHb9CJAWyB4zj91VRWn96DkukG4bwdtyTh";
pub const SECRET: &str = "xnoPBzXtMeMyMHUVTgbuqAfg1SUTb";
pub const CONTRACT: &str = "zKXfeKXkTtLSTkEzaJyu2cRmRBFRvTW2zc";
pub const TX_HASH: &str = "5B7A4E1F0D9C3E2B6A8F7D1C0B9E8A3F2D4C6B5A7E9F1D3C2B0A8E6F4D2C1B3A";

/// A storage contract: a string value, its last author and a change event
pub const STORAGE_ABI: &str = r#"[
    {"type":"constructor","inputs":[{"name":"value","type":"string"}],"stateMutability":"nonpayable"},
    {"type":"function","name":"getValue","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
    {"type":"function","name":"getInfo","inputs":[],"outputs":[{"name":"author","type":"address"},{"name":"value","type":"string"}],"stateMutability":"view"},
    {"type":"function","name":"clear","inputs":[],"outputs":[],"stateMutability":"nonpayable"},
    {"type":"function","name":"setValue","inputs":[{"name":"value","type":"string"}],"outputs":[],"stateMutability":"nonpayable"},
    {"type":"function","name":"setValue","inputs":[{"name":"value","type":"string"},{"name":"version","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
    {"type":"event","name":"ValueChanged","anonymous":false,"inputs":[{"indexed":true,"name":"author","type":"address"},{"indexed":false,"name":"oldValue","type":"string"},{"indexed":false,"name":"newValue","type":"string"}]}
]"#;

pub fn client() -> Arc<MockConnection> {
    Arc::new(MockConnection::new(Account::new(ACCOUNT, SECRET)))
}

pub fn storage(address: Option<&str>) -> Contract<MockConnection> {
    Contract::from_json(client(), STORAGE_ABI, address).unwrap()
}

pub fn accepted() -> SubmitResult {
    SubmitResult {
        result_code: "tesSUCCESS".to_string(),
        result_message: Some("The transaction was applied.".to_string()),
        other: Default::default(),
    }
}

pub fn rejected() -> SubmitResult {
    serde_json::from_value(json!({
        "resultCode": "tefPAST_SEQ",
        "resultMessage": "This sequence number has already passed."
    }))
    .unwrap()
}

pub fn notification(status: TxStatus, error_message: Option<&str>) -> TxNotification {
    TxNotification {
        status,
        kind: Some("singleTransaction".to_string()),
        transaction: Some(TxRef { hash: TX_HASH.to_string(), other: Default::default() }),
        error_message: error_message.map(ToOwned::to_owned),
    }
}

pub fn validated() -> TxNotification {
    notification(TxStatus::ValidateSuccess, None)
}

/// A validated deployment which created the contract account `address`
pub fn created(address: &str) -> TransactionDetail {
    serde_json::from_value(json!({
        "type": "contract",
        "specification": {
            "meta": {
                "TransactionResult": "tesSUCCESS",
                "AffectedNodes": [
                    { "ModifiedNode": { "LedgerEntryType": "AccountRoot", "FinalFields": { "Account": ACCOUNT } } },
                    { "CreatedNode": { "LedgerEntryType": "AccountRoot", "NewFields": { "Account": address, "Balance": "0" } } }
                ]
            }
        }
    }))
    .unwrap()
}

/// A `ValueChanged` frame as delivered by the event transport
pub fn value_changed(
    contract: &Contract<MockConnection>,
    author: Address,
    old: &str,
    new: &str,
) -> RawContractEvent {
    let codec = EthAbiCodec;
    let signature =
        contract.interface().event("ValueChanged").unwrap().signature().unwrap().to_owned();
    let author = codec.encode_parameter(&ParamType::Address, &Token::Address(author)).unwrap();
    let data = codec
        .encode_parameters(
            &[ParamType::String, ParamType::String],
            &[Token::String(old.to_string()), Token::String(new.to_string())],
        )
        .unwrap();
    RawContractEvent { data, topics: vec![signature, author], other: Default::default() }
}
