use crate::{
    base::Interface,
    call::ContractCall,
    codec::{AbiCodec, EthAbiCodec},
    event::Event,
    interface::Descriptor,
    log::EventTarget,
    transaction::Expect,
    ContractError,
};
use chainsql_providers::Instructions;
use ethabi::Token;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// Event names a subscription may not use
pub const RESERVED_EVENT_NAMES: [&str; 2] = ["newListener", "removeListener"];

/// Name selecting every event of the interface, matched case-insensitively
pub const ALL_EVENTS: &str = "allEvents";

/// Defaults applied to every call object of a [`Contract`]
#[derive(Clone, Debug)]
pub struct ContractOptions {
    /// The codec used to compute signatures and encode or decode parameters
    pub codec: Arc<dyn AbiCodec>,
    /// Gas limit sent with transactions
    pub gas: Option<u64>,
    /// When a transaction counts as done
    pub expect: Expect,
    /// Forwarded to transaction preparation
    pub instructions: Instructions,
}

impl Default for ContractOptions {
    fn default() -> Self {
        Self {
            codec: Arc::new(EthAbiCodec),
            gas: None,
            expect: Expect::default(),
            instructions: Instructions::default(),
        }
    }
}

impl ContractOptions {
    #[must_use]
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    #[must_use]
    pub fn expect(mut self, expect: Expect) -> Self {
        self.expect = expect;
        self
    }

    #[must_use]
    pub fn instructions(mut self, instructions: Instructions) -> Self {
        self.instructions = instructions;
        self
    }

    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn AbiCodec>) -> Self {
        self.codec = codec;
        self
    }
}

/// A binding to one ChainSQL smart contract.
///
/// The contract is described by its JSON interface. Methods are reached through
/// [`Contract::method`] by name, selector or canonical signature; the returned call object
/// can be encoded, called read-only, sent as a transaction or estimated. Events are
/// subscribed to through [`Contract::event`] and [`Contract::all_events`].
///
/// The address may be unknown at construction, in which case it is filled in by a
/// deployment ([`Contract::deploy`]) or set explicitly with [`Contract::set_address`].
///
/// ```
/// use chainsql_contract::{Contract, Token};
/// use chainsql_providers::{Account, MockConnection};
/// use std::sync::Arc;
///
/// let client = Arc::new(MockConnection::new(Account::new("zAccount", "secret")));
/// let abi = r#"[{"type":"function","name":"set","inputs":[{"name":"v","type":"uint256"}],"outputs":[]}]"#;
/// let contract = Contract::from_json(client, abi, None).unwrap();
///
/// let data = contract.method("set", vec![Token::Uint(1u64.into())]).unwrap().encode_abi().unwrap();
/// assert_eq!(&data[..10], "0x60fe47b1");
/// ```
#[derive(Debug)]
pub struct Contract<C> {
    client: Arc<C>,
    interface: Interface,
    address: RwLock<Option<String>>,
    options: ContractOptions,
}

impl<C> Clone for Contract<C> {
    fn clone(&self) -> Self {
        Contract {
            client: self.client.clone(),
            interface: self.interface.clone(),
            address: RwLock::new(self.address()),
            options: self.options.clone(),
        }
    }
}

impl<C> Contract<C> {
    /// Creates a new contract binding from its descriptors
    pub fn new(
        client: Arc<C>,
        descriptors: Vec<Descriptor>,
        address: Option<&str>,
        options: ContractOptions,
    ) -> Result<Self, ContractError> {
        let interface = Interface::new(descriptors, options.codec.clone());
        Self::from_interface(client, interface, address, options)
    }

    fn from_interface(
        client: Arc<C>,
        interface: Interface,
        address: Option<&str>,
        options: ContractOptions,
    ) -> Result<Self, ContractError> {
        let contract = Self { client, interface, address: RwLock::new(None), options };
        if let Some(address) = address {
            contract.set_address(address)?;
        }
        Ok(contract)
    }

    /// Creates a new contract binding from its JSON interface, with default options
    pub fn from_json(
        client: Arc<C>,
        json: &str,
        address: Option<&str>,
    ) -> Result<Self, ContractError> {
        Self::from_json_with_options(client, json, address, ContractOptions::default())
    }

    pub fn from_json_with_options(
        client: Arc<C>,
        json: &str,
        address: Option<&str>,
        options: ContractOptions,
    ) -> Result<Self, ContractError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|err| ContractError::Configuration(err.to_string()))?;
        Self::from_value(client, value, address, options)
    }

    /// Creates a new contract binding from an already parsed JSON interface
    pub fn from_value(
        client: Arc<C>,
        value: Value,
        address: Option<&str>,
        options: ContractOptions,
    ) -> Result<Self, ContractError> {
        let interface = Interface::from_value(value, options.codec.clone())?;
        Self::from_interface(client, interface, address, options)
    }

    /// Returns the contract's address, if known
    pub fn address(&self) -> Option<String> {
        self.address.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the contract's address or fails with [`ContractError::AddressNotSet`]
    pub fn require_address(&self) -> Result<String, ContractError> {
        self.address().ok_or(ContractError::AddressNotSet)
    }

    /// Points the binding at `address`
    pub fn set_address(&self, address: impl Into<String>) -> Result<(), ContractError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(ContractError::InvalidAddress(address))
        }
        *self.address.write().unwrap_or_else(PoisonError::into_inner) = Some(address);
        Ok(())
    }

    /// Returns a new binding to the same interface at another address
    pub fn at(&self, address: impl Into<String>) -> Result<Self, ContractError> {
        let contract = self.clone();
        contract.set_address(address)?;
        Ok(contract)
    }

    /// Replaces the interface, rebuilding every lookup table
    pub fn set_interface(&mut self, descriptors: Vec<Descriptor>) {
        self.interface = Interface::new(descriptors, self.options.codec.clone());
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn options(&self) -> &ContractOptions {
        &self.options
    }

    /// Returns a call object for the method `key` (name, selector or canonical signature)
    /// with `args`. Overloads are resolved by the number of arguments.
    pub fn method(&self, key: &str, args: Vec<Token>) -> Result<ContractCall<'_, C>, ContractError> {
        let descriptor = self.interface.resolve_function(key, args.len())?.clone();
        Ok(ContractCall::new(self, descriptor, args, None))
    }

    /// Returns a subscription builder for the event `key` (name, topic or canonical
    /// signature). `allEvents` selects every event.
    pub fn event(&self, key: &str) -> Result<Event<'_, C>, ContractError> {
        if RESERVED_EVENT_NAMES.contains(&key) {
            return Err(ContractError::ReservedEventName(key.to_string()))
        }
        self.require_address()?;
        if key.eq_ignore_ascii_case(ALL_EVENTS) {
            return Ok(Event::new(self, EventTarget::AllEvents))
        }
        let event = self
            .interface
            .event(key)
            .ok_or_else(|| ContractError::EventNotFound(key.to_string()))?;
        if RESERVED_EVENT_NAMES.contains(&event.name.as_str()) {
            return Err(ContractError::ReservedEventName(event.name.clone()))
        }
        Ok(Event::new(self, EventTarget::Event(event.clone())))
    }

    /// Returns a subscription builder for every event of the contract
    pub fn all_events(&self) -> Result<Event<'_, C>, ContractError> {
        self.event(ALL_EVENTS)
    }
}
