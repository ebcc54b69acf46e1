#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

mod contract;
pub use contract::{Contract, ContractOptions, ALL_EVENTS, RESERVED_EVENT_NAMES};

pub mod interface;
pub use interface::{Descriptor, DescriptorKind, Param};

pub mod codec;
pub use codec::{keccak256, AbiCodec, AbiError, EthAbiCodec, ReturnValues};

mod base;
pub use base::{Interface, MethodReturn};

mod error;
pub use error::{ContractError, CREATE_NODE_MISSING};

mod deferred;
pub use deferred::Deferred;

mod call;
pub use call::ContractCall;

mod transaction;
pub use transaction::{
    normalize_contract_data, ContractOpType, ContractTransaction, Expect, TxResult,
    CONTRACT_CALL_COMMAND, CONTRACT_TRANSACTION_TYPE,
};

mod factory;
pub use factory::DeployOptions;

mod event;
pub use event::{Event, TopicFilter};

mod log;
pub use log::{DecodedEvent, EventTarget, RawLog};

pub mod stream;
pub use stream::EventStream;

pub use ethabi::{self, Address, ParamType, Token, Uint};
