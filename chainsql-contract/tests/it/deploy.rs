use crate::common::*;
use chainsql_contract::{ContractError, DeployOptions, Expect, Token, TxResult};
use chainsql_providers::{MockCall, TransactionDetail, TxStatus};
use serde_json::json;
use std::sync::{Arc, Mutex};

const BYTECODE: &str = "0x608060405234801561001057600080fd5b50";

fn is_subscribe(call: &MockCall) -> bool {
    matches!(call, MockCall::SubscribeTx(id) if id == TX_HASH)
}

fn is_submit(call: &MockCall) -> bool {
    matches!(call, MockCall::Submit(_))
}

fn is_unsubscribe(call: &MockCall) -> bool {
    matches!(call, MockCall::UnsubscribeTx(id) if id == TX_HASH)
}

#[tokio::test]
async fn deploy_resolves_the_created_address() {
    let contract = storage(None);
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());
    mock.push_tx_notification(validated());
    mock.push_transaction(created("0xABC"));

    let res = contract.deploy(DeployOptions::new(BYTECODE).gas(300_000)).unwrap().await.unwrap();
    assert_eq!(
        res,
        TxResult {
            status: TxStatus::ValidateSuccess,
            tx_hash: TX_HASH.to_string(),
            contract_address: Some("0xABC".to_string()),
        }
    );
    assert_eq!(contract.address().as_deref(), Some("0xABC"));

    let calls = mock.calls();
    assert_eq!(
        calls[0],
        MockCall::Prepare(json!({
            "TransactionType": "Contract",
            "ContractOpType": 1,
            "Account": ACCOUNT,
            "Gas": 300000,
            "ContractData": BYTECODE[2..].to_uppercase(),
        }))
    );
    assert!(matches!(calls[1], MockCall::Sign(_)));
    assert!(is_subscribe(&calls[2]));
    assert!(is_submit(&calls[3]));
    assert_eq!(calls[4], MockCall::GetTransaction(TX_HASH.to_string()));
    assert_eq!(calls.len(), 5);
}

#[tokio::test]
async fn subscription_precedes_submission() {
    let contract = storage(Some(CONTRACT));
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());
    mock.push_tx_notification(validated());

    let res = contract
        .method("setValue", vec![Token::String("v2".into())])
        .unwrap()
        .send()
        .unwrap()
        .await
        .unwrap();
    assert_eq!(res.status, TxStatus::ValidateSuccess);
    assert_eq!(res.tx_hash, TX_HASH);
    assert_eq!(res.contract_address, None);

    let subscribed = mock.position(is_subscribe).unwrap();
    let submitted = mock.position(is_submit).unwrap();
    assert!(subscribed < submitted);
    // sends do not look the transaction up
    assert!(mock.position(|call| matches!(call, MockCall::GetTransaction(_))).is_none());

    match &mock.calls()[0] {
        MockCall::Prepare(tx) => {
            assert_eq!(tx["ContractOpType"], 2);
            assert_eq!(tx["ContractAddress"], CONTRACT);
        }
        call => panic!("expected the prepare call first, got {call:?}"),
    }
}

#[tokio::test]
async fn failure_status_rejects() {
    let contract = storage(Some(CONTRACT));
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());
    mock.push_tx_notification(notification(TxStatus::DbTimeout, Some("timeout")));

    let err = contract.method("clear", vec![]).unwrap().send().unwrap().await.unwrap_err();
    assert!(matches!(err, ContractError::ConfirmationFailed { status: TxStatus::DbTimeout, .. }));
    assert_eq!(
        err.to_json(),
        json!({ "status": "db_timeout", "tx_hash": TX_HASH, "error_message": "timeout" })
    );
}

#[tokio::test]
async fn intermediate_statuses_are_skipped() {
    let contract = storage(Some(CONTRACT));
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());
    mock.push_tx_notification(notification(TxStatus::Other, None));
    let mut not_single = validated();
    not_single.kind = None;
    mock.push_tx_notification(not_single);
    mock.push_tx_notification(notification(TxStatus::DbSuccess, None));
    mock.close_tx_stream();

    let err = contract.method("clear", vec![]).unwrap().send().unwrap().await.unwrap_err();
    assert!(matches!(err, ContractError::SubscriptionClosed));
}

#[tokio::test]
async fn rejected_submit_unsubscribes() {
    let contract = storage(Some(CONTRACT));
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(rejected());

    let err = contract.method("clear", vec![]).unwrap().send().unwrap().await.unwrap_err();
    match &err {
        ContractError::SubmitRejected { result, cleanup_error } => {
            assert_eq!(result, &rejected());
            assert_eq!(cleanup_error, &None);
        }
        err => panic!("unexpected error {err:?}"),
    }
    assert_eq!(err.to_json()["resultCode"], "tefPAST_SEQ");

    let submitted = mock.position(is_submit).unwrap();
    let unsubscribed = mock.position(is_unsubscribe).unwrap();
    assert!(submitted < unsubscribed);
}

#[tokio::test]
async fn failed_cleanup_keeps_the_rejection() {
    let contract = storage(None);
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(rejected());
    mock.fail_next_unsubscribe("socket closed");

    let err = contract.deploy(DeployOptions::new(BYTECODE)).unwrap().await.unwrap_err();
    match err {
        ContractError::SubmitRejected { result, cleanup_error } => {
            assert_eq!(result.result_code, "tefPAST_SEQ");
            assert_eq!(cleanup_error.as_deref(), Some("socket closed"));
        }
        err => panic!("unexpected error {err:?}"),
    }
    assert_eq!(contract.address(), None);
}

#[tokio::test]
async fn submit_transport_errors_unsubscribe() {
    let contract = storage(Some(CONTRACT));
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_error("connection reset");

    let err = contract.method("clear", vec![]).unwrap().send().unwrap().await.unwrap_err();
    assert!(matches!(err, ContractError::SubmitFailed { cleanup_error: None, .. }));
    assert_eq!(err.to_string(), "connection reset");
    assert!(mock.position(is_unsubscribe).is_some());
}

#[tokio::test]
async fn submit_transport_errors_carry_cleanup_failures() {
    let contract = storage(Some(CONTRACT));
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_error("connection reset");
    mock.fail_next_unsubscribe("socket closed");

    let err = contract.method("clear", vec![]).unwrap().send().unwrap().await.unwrap_err();
    match err {
        ContractError::SubmitFailed { source, cleanup_error } => {
            assert_eq!(source.to_string(), "connection reset");
            assert_eq!(cleanup_error.as_deref(), Some("socket closed"));
        }
        err => panic!("unexpected error {err:?}"),
    }
}

#[tokio::test]
async fn missing_creation_node_rejects() {
    let contract = storage(None);
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());
    mock.push_tx_notification(validated());
    mock.push_transaction(TransactionDetail::default());

    let err = contract.deploy(DeployOptions::new(BYTECODE)).unwrap().await.unwrap_err();
    assert!(matches!(err, ContractError::CreationNodeNotFound { .. }));
    assert_eq!(
        err.to_json(),
        json!({
            "status": "validate_success",
            "tx_hash": TX_HASH,
            "contractAddress": "Can not find CreateNode"
        })
    );
    assert_eq!(contract.address(), None);
}

#[tokio::test]
async fn send_success_resolves_after_submit() {
    let contract = storage(Some(CONTRACT));
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());

    let res = contract
        .method("clear", vec![])
        .unwrap()
        .expect(Expect::SendSuccess)
        .send()
        .unwrap()
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(res).unwrap(),
        json!({ "status": "send_success", "tx_hash": TX_HASH })
    );
    assert!(mock.position(is_subscribe).is_none());
}

#[tokio::test]
async fn deploys_wait_for_validation_regardless_of_expectation() {
    let contract = storage(None);
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());
    mock.push_tx_notification(validated());
    mock.push_transaction(created("0xABC"));

    let res = contract
        .deploy(DeployOptions::new(BYTECODE).expect(Expect::SendSuccess))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(res.status, TxStatus::ValidateSuccess);
    assert_eq!(res.contract_address.as_deref(), Some("0xABC"));
    assert_eq!(contract.address().as_deref(), Some("0xABC"));

    let subscribed = mock.position(is_subscribe).unwrap();
    let submitted = mock.position(is_submit).unwrap();
    assert!(subscribed < submitted);
}

#[tokio::test]
async fn constructor_call_deploys() {
    let contract = storage(None);
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());
    mock.push_tx_notification(validated());
    mock.push_transaction(created("zNewContract"));

    let deploy = contract.constructor(BYTECODE, vec![Token::String("initial".into())]);
    let data = deploy.encode_abi().unwrap();
    assert!(data.starts_with(BYTECODE));

    let res = deploy.send().unwrap().await.unwrap();
    assert_eq!(res.contract_address.as_deref(), Some("zNewContract"));
    assert_eq!(contract.address().as_deref(), Some("zNewContract"));

    match &mock.calls()[0] {
        MockCall::Prepare(tx) => assert_eq!(tx["ContractData"], data[2..].to_uppercase()),
        call => panic!("expected the prepare call first, got {call:?}"),
    }
}

#[tokio::test]
async fn deploy_callback_receives_the_result() {
    let contract = storage(None);
    let mock = contract.client();
    mock.push_tx_id(TX_HASH);
    mock.push_submit_result(accepted());
    mock.push_tx_notification(validated());
    mock.push_transaction(created("0xABC"));

    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    contract
        .deploy_with(DeployOptions::new(BYTECODE), move |res| {
            *sink.lock().unwrap() = Some(res.map(|res| res.contract_address))
        })
        .await;
    let res = seen.lock().unwrap().take().unwrap().unwrap();
    assert_eq!(res.as_deref(), Some("0xABC"));
}
