use crate::common::*;
use chainsql_contract::{
    AbiCodec, Address, ContractError, EthAbiCodec, MethodReturn, ParamType, Token,
};
use chainsql_providers::{MockCall, ProviderError};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[test]
fn methods_are_reachable_by_every_key() {
    let contract = storage(Some(CONTRACT));
    let codec = EthAbiCodec;

    for function in contract.interface().functions() {
        let arity = function.inputs.len();
        let args = vec![Token::String("v".to_string()), Token::Uint(1u64.into())];
        let args = args[..arity].to_vec();

        let canonical = function.canonical();
        let selector = codec.encode_function_signature(&canonical);
        for key in [selector.as_str(), canonical.as_str()] {
            let call = contract.method(key, args.clone()).unwrap();
            assert_eq!(&call.descriptor, function);
            assert!(call.encode_abi().unwrap().starts_with(&selector));
        }
        let by_name = contract.method(&function.name, args).unwrap();
        assert_eq!(by_name.descriptor.name, function.name);
    }
}

#[test]
fn overloads_resolve_by_argument_count() {
    let contract = storage(Some(CONTRACT));
    let one = contract.method("setValue", vec![Token::String("a".into())]).unwrap();
    assert_eq!(one.descriptor.canonical(), "setValue(string)");

    let two = contract
        .method("setValue", vec![Token::String("a".into()), Token::Uint(2u64.into())])
        .unwrap();
    assert_eq!(two.descriptor.canonical(), "setValue(string,uint256)");

    let err = contract.method("setValue", vec![]).unwrap_err();
    assert_eq!(err.to_string(), "invalid number of parameters for \"setValue\". Got 0 expected 1");
    assert!(matches!(contract.method("missing", vec![]), Err(ContractError::MethodNotFound(_))));
    assert!(matches!(
        contract.method("ValueChanged", vec![]),
        Err(ContractError::MethodNotFound(_))
    ));
}

#[test]
fn mistyped_arguments_fail_to_encode() {
    let contract = storage(Some(CONTRACT));
    let call = contract.method("setValue", vec![Token::Bool(true)]).unwrap();
    assert!(matches!(call.encode_abi(), Err(ContractError::AbiError(_))));
}

#[tokio::test]
async fn call_returns_the_single_output() {
    let contract = storage(Some(CONTRACT));
    let result = EthAbiCodec
        .encode_parameter(&ParamType::String, &Token::String("hello chainsql".into()))
        .unwrap();
    contract.client().push_response(json!({ "contract_call_result": result })).unwrap();

    let call = contract.method("getValue", vec![]).unwrap();
    let value = call.call().unwrap().await.unwrap();
    assert_eq!(value, MethodReturn::Value(Token::String("hello chainsql".into())));

    assert_eq!(
        contract.client().calls(),
        vec![MockCall::Request {
            command: "contract_call".to_string(),
            params: json!({
                "account": ACCOUNT,
                "contract_address": CONTRACT,
                "contract_data": call.encode_abi().unwrap()[2..].to_uppercase(),
            }),
        }]
    );
}

#[tokio::test]
async fn call_returns_named_outputs() {
    let contract = storage(Some(CONTRACT));
    let author = Address::repeat_byte(0x42);
    let result = EthAbiCodec
        .encode_parameters(
            &[ParamType::Address, ParamType::String],
            &[Token::Address(author), Token::String("v1".into())],
        )
        .unwrap();
    contract.client().push_response(json!({ "contract_call_result": result })).unwrap();

    let info = contract.method("getInfo", vec![]).unwrap().call().unwrap().await.unwrap();
    let values = info.values().unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values["author"], Token::Address(author));
    assert_eq!(values[1], Token::String("v1".into()));

    let json = serde_json::to_value(values).unwrap();
    assert_eq!(json["value"], "v1");
    assert_eq!(json["1"], "v1");
    assert!(json.get("__length__").is_none());
}

#[tokio::test]
async fn empty_call_result_is_none() {
    let contract = storage(Some(CONTRACT));
    contract.client().push_response(json!({ "contract_call_result": "0x" })).unwrap();
    contract.client().push_response(json!({})).unwrap();

    let call = contract.method("getValue", vec![]).unwrap();
    assert_eq!(call.call().unwrap().await.unwrap(), MethodReturn::None);
    assert_eq!(call.call().unwrap().await.unwrap(), MethodReturn::None);
}

#[test]
fn network_operations_need_an_address() {
    let contract = storage(None);
    let call = contract.method("getValue", vec![]).unwrap();
    assert!(matches!(call.call(), Err(ContractError::AddressNotSet)));
    assert!(matches!(call.send(), Err(ContractError::AddressNotSet)));
    assert!(contract.client().calls().is_empty());
}

#[tokio::test]
async fn callbacks_receive_synchronous_errors() {
    let contract = storage(None);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    let pending = contract
        .method("getValue", vec![])
        .unwrap()
        .call_with(move |res| sink.lock().unwrap().push(res.unwrap_err().to_string()));
    // delivered before the returned future is driven
    assert_eq!(seen.lock().unwrap().len(), 1);
    pending.await;

    assert_eq!(
        seen.lock().unwrap()[0],
        "this contract object doesn't have an address set yet, please set an address first"
    );
}

#[tokio::test]
async fn callbacks_and_deferred_values_agree() {
    let contract = storage(Some(CONTRACT));
    let result = EthAbiCodec.encode_parameter(&ParamType::String, &Token::String("x".into())).unwrap();
    contract.client().push_response(json!({ "contract_call_result": result })).unwrap();
    contract.client().push_response(json!({ "contract_call_result": result })).unwrap();

    let call = contract.method("getValue", vec![]).unwrap();
    let deferred = call.call().unwrap().await.unwrap();

    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    call.call_with(move |res| *sink.lock().unwrap() = Some(res.unwrap())).await;
    assert_eq!(seen.lock().unwrap().take(), Some(deferred));
}

#[tokio::test]
async fn request_failures_are_delivered_through_the_future() {
    let contract = storage(Some(CONTRACT));
    contract.client().push_request_error("actNotFound");

    let err = contract.method("getValue", vec![]).unwrap().call().unwrap().await.unwrap_err();
    assert!(matches!(
        err,
        ContractError::ProviderError(ProviderError::NodeError { ref message, .. }) if message == "actNotFound"
    ));
}

#[tokio::test]
async fn estimate_gas_is_unsupported_without_an_estimator() {
    let contract = storage(Some(CONTRACT));
    let err = contract.method("clear", vec![]).unwrap().estimate_gas().unwrap().await.unwrap_err();
    assert!(matches!(err, ContractError::ProviderError(ProviderError::Unsupported(_))));
}
