use crate::{
    base::MethodReturn,
    deferred::{callback_adapter, Deferred},
    interface::Descriptor,
    transaction::{self, ContractTransaction, Expect, TxResult},
    Contract, ContractError,
};
use chainsql_providers::{ChainClient, EventTransport, Instructions};
use ethabi::Token;
use futures_util::future::BoxFuture;
use std::fmt;

#[must_use = "contract calls do nothing unless you `send` or `call` them"]
/// A method invocation bound to its contract, descriptor and arguments
pub struct ContractCall<'a, C> {
    contract: &'a Contract<C>,
    /// The function (or constructor) being invoked
    pub descriptor: Descriptor,
    /// The arguments, one per input of `descriptor`
    pub args: Vec<Token>,
    /// Bytecode prepended to the arguments of a constructor
    pub deploy_data: Option<String>,
    pub gas: Option<u64>,
    pub value: Option<String>,
    pub expect: Expect,
    pub instructions: Instructions,
}

impl<'a, C> Clone for ContractCall<'a, C> {
    fn clone(&self) -> Self {
        ContractCall {
            contract: self.contract,
            descriptor: self.descriptor.clone(),
            args: self.args.clone(),
            deploy_data: self.deploy_data.clone(),
            gas: self.gas,
            value: self.value.clone(),
            expect: self.expect,
            instructions: self.instructions.clone(),
        }
    }
}

impl<'a, C> fmt::Debug for ContractCall<'a, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractCall")
            .field("descriptor", &self.descriptor.canonical())
            .field("args", &self.args)
            .field("deploy_data", &self.deploy_data)
            .field("gas", &self.gas)
            .field("value", &self.value)
            .field("expect", &self.expect)
            .finish_non_exhaustive()
    }
}

impl<'a, C> ContractCall<'a, C> {
    pub(crate) fn new(
        contract: &'a Contract<C>,
        descriptor: Descriptor,
        args: Vec<Token>,
        deploy_data: Option<String>,
    ) -> Self {
        let options = contract.options();
        Self {
            contract,
            descriptor,
            args,
            deploy_data,
            gas: options.gas,
            value: None,
            expect: options.expect,
            instructions: options.instructions.clone(),
        }
    }

    /// Sets the gas limit of the transaction
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Sets the value transferred to the contract
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Resolves sends as soon as the node accepted them instead of once validated
    pub fn expect(mut self, expect: Expect) -> Self {
        self.expect = expect;
        self
    }

    /// Sets the instructions forwarded to transaction preparation
    pub fn instructions(mut self, instructions: Instructions) -> Self {
        self.instructions = instructions;
        self
    }

    /// Returns the binding this call belongs to
    pub fn contract(&self) -> &'a Contract<C> {
        self.contract
    }

    /// Returns the `0x` prefixed calldata (selector and arguments) or, for constructors,
    /// the deploy data followed by the constructor arguments
    pub fn encode_abi(&self) -> Result<String, ContractError> {
        self.contract.interface().encode_method_call(
            &self.descriptor,
            &self.args,
            self.deploy_data.as_deref(),
        )
    }
}

impl<'a, C: ChainClient> ContractCall<'a, C> {
    fn transaction(&self) -> Result<ContractTransaction, ContractError> {
        let account = self.contract.client().account().address.clone();
        let tx = if self.descriptor.is_constructor() {
            ContractTransaction::deploy(account, &self.encode_abi()?)
        } else {
            let address = self.contract.require_address()?;
            ContractTransaction::invoke(account, address, &self.encode_abi()?)
        };
        Ok(tx.gas(self.gas).value(self.value.clone()))
    }

    /// Runs the method read-only through `contract_call` and decodes its outputs
    pub fn call(&self) -> Result<Deferred<'a, MethodReturn>, ContractError> {
        if !self.descriptor.is_function() {
            return Err(ContractError::MethodNotFound(self.descriptor.canonical()))
        }
        let address = self.contract.require_address()?;
        let data = self.encode_abi()?;
        let contract = self.contract;
        let descriptor = self.descriptor.clone();
        Ok(Deferred::new(async move {
            transaction::execute_call(contract, &descriptor, address, &data).await
        }))
    }

    /// Like [`ContractCall::call`], handing the result to `callback`
    pub fn call_with<F>(&self, callback: F) -> BoxFuture<'a, ()>
    where
        F: FnOnce(Result<MethodReturn, ContractError>) + Send + 'a,
    {
        callback_adapter(self.call(), callback)
    }

    /// Estimates the gas the transaction would consume
    pub fn estimate_gas(&self) -> Result<Deferred<'a, u64>, ContractError> {
        let tx = self.transaction()?;
        Ok(Deferred::new(transaction::execute_estimate(self.contract, tx)))
    }

    pub fn estimate_gas_with<F>(&self, callback: F) -> BoxFuture<'a, ()>
    where
        F: FnOnce(Result<u64, ContractError>) + Send + 'a,
    {
        callback_adapter(self.estimate_gas(), callback)
    }
}

impl<'a, C: ChainClient + EventTransport> ContractCall<'a, C> {
    /// Signs and submits the transaction, resolving once it reached the expected status.
    ///
    /// Constructor calls deploy the contract and write its address into the binding.
    pub fn send(&self) -> Result<Deferred<'a, TxResult>, ContractError> {
        let tx = self.transaction()?;
        let contract = self.contract;
        let instructions = self.instructions.clone();
        let expect = self.expect;
        Ok(Deferred::new(async move {
            transaction::execute(contract, tx, &instructions, expect).await
        }))
    }

    /// Like [`ContractCall::send`], handing the result to `callback`
    pub fn send_with<F>(&self, callback: F) -> BoxFuture<'a, ()>
    where
        F: FnOnce(Result<TxResult, ContractError>) + Send + 'a,
    {
        callback_adapter(self.send(), callback)
    }
}
