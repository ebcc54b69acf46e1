use crate::{
    call::ContractCall,
    deferred::{callback_adapter, Deferred},
    interface::Descriptor,
    transaction::{self, ContractTransaction, Expect, TxResult},
    Contract, ContractError,
};
use chainsql_providers::{ChainClient, EventTransport, Instructions};
use ethabi::Token;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Options of a raw deployment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployOptions {
    /// Hex bytecode, constructor arguments already appended
    pub contract_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    /// Overrides the binding's default expectation
    #[serde(rename = "expect", default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expect>,
    #[serde(skip)]
    pub instructions: Option<Instructions>,
}

impl DeployOptions {
    pub fn new(contract_data: impl Into<String>) -> Self {
        Self { contract_data: contract_data.into(), ..Default::default() }
    }

    #[must_use]
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.contract_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn expect(mut self, expect: Expect) -> Self {
        self.expect = Some(expect);
        self
    }
}

impl<C> Contract<C> {
    /// Returns a call object deploying `bytecode` with the constructor arguments `args`.
    ///
    /// Interfaces without a constructor accept no arguments.
    pub fn constructor(
        &self,
        bytecode: impl Into<String>,
        args: Vec<Token>,
    ) -> ContractCall<'_, C> {
        let descriptor =
            self.interface().constructor().cloned().unwrap_or_else(|| Descriptor::constructor(vec![]));
        ContractCall::new(self, descriptor, args, Some(bytecode.into()))
    }
}

impl<C: ChainClient + EventTransport> Contract<C> {
    /// Deploys the contract and, once validated, writes the created address into this
    /// binding.
    pub fn deploy(&self, options: DeployOptions) -> Result<Deferred<'_, TxResult>, ContractError> {
        if options.contract_data.trim().is_empty() {
            return Err(ContractError::DeployDataMissing)
        }
        let defaults = self.options();
        let tx = ContractTransaction::deploy(
            self.client().account().address.clone(),
            &options.contract_data,
        )
        .gas(options.gas.or(defaults.gas))
        .value(options.contract_value);
        let instructions = options.instructions.unwrap_or_else(|| defaults.instructions.clone());
        let expect = options.expect.unwrap_or(defaults.expect);

        Ok(Deferred::new(async move {
            transaction::execute(self, tx, &instructions, expect).await
        }))
    }

    /// Like [`Contract::deploy`], handing the result to `callback`
    pub fn deploy_with<'a, F>(&'a self, options: DeployOptions, callback: F) -> BoxFuture<'a, ()>
    where
        F: FnOnce(Result<TxResult, ContractError>) + Send + 'a,
    {
        callback_adapter(self.deploy(options), callback)
    }
}
