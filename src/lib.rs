#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # chainsql
//!
//! Bindings for ChainSQL smart contracts: encode calls from a contract's JSON ABI, run
//! read-only calls, send and deploy contract transactions and decode contract events.
//!
//! # Quickstart
//!
//! A prelude is provided which imports all the important things for you. Any connection
//! implementing [`providers::ChainClient`] (and [`providers::EventTransport`] for sends,
//! deployments and events) can back a contract.
//!
//! ```no_run
//! use chainsql::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn foo() -> Result<(), ContractError> {
//! let client = Arc::new(MockConnection::new(Account::new("zAccount", "secret")));
//! let abi = r#"[{"type":"function","name":"set","inputs":[{"name":"v","type":"uint256"}],"outputs":[]}]"#;
//! let contract = Contract::from_json(client, abi, Some("zContract"))?;
//!
//! let receipt = contract.method("set", vec![Token::Uint(42u64.into())])?.send()?.await?;
//! println!("{} {}", receipt.status, receipt.tx_hash);
//! # Ok(())
//! # }
//! ```

/// # Contract bindings
///
/// Look up methods and events of a contract's ABI, encode calls, run the transaction
/// lifecycle and decode events. See [`contract::Contract`].
pub mod contract {
    pub use chainsql_contract::*;
}

/// # Connections to ChainSQL nodes
///
/// The [`providers::ChainClient`] and [`providers::EventTransport`] traits the bindings
/// are written against, their wire types and a recording mock connection.
pub mod providers {
    pub use chainsql_providers::*;
}

/// Easy imports of frequently used type definitions and traits
pub mod prelude {
    pub use chainsql_contract::*;

    pub use chainsql_providers::*;
}
