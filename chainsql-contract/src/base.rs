use crate::{
    codec::{strip_hex_prefix, AbiCodec, EthAbiCodec, ReturnValues},
    error::ContractError,
    interface::{param_types, Descriptor, DescriptorKind, Param},
};
use ethabi::Token;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

/// The decoded result of a read-only call
#[derive(Clone, Debug, PartialEq)]
pub enum MethodReturn {
    /// The call returned no data
    None,
    /// The method has exactly one output
    Value(Token),
    /// The method has several outputs, addressable by position and name
    Values(ReturnValues),
}

impl MethodReturn {
    pub fn is_none(&self) -> bool {
        matches!(self, MethodReturn::None)
    }

    /// Returns the single value, if the method has exactly one output
    pub fn value(&self) -> Option<&Token> {
        match self {
            MethodReturn::Value(token) => Some(token),
            _ => None,
        }
    }

    pub fn values(&self) -> Option<&ReturnValues> {
        match self {
            MethodReturn::Values(values) => Some(values),
            _ => None,
        }
    }
}

/// A contract's parsed interface together with its lookup tables.
///
/// Every function and event is reachable by its name, its selector (or topic) and its
/// canonical signature. Functions and events are kept in separate tables, so a function
/// and an event may share a key. Functions sharing a name are kept in declaration order
/// and picked by argument count.
#[derive(Clone, Debug)]
pub struct Interface {
    codec: Arc<dyn AbiCodec>,
    descriptors: Vec<Descriptor>,
    /// name, selector and canonical signature to overload candidates (descriptor indices)
    functions: HashMap<String, Vec<usize>>,
    /// name, topic and canonical signature to a descriptor index
    events: HashMap<String, usize>,
    constructor: Option<usize>,
}

impl Interface {
    /// Builds the lookup tables for `descriptors`, computing every signature with `codec`
    pub fn new(descriptors: Vec<Descriptor>, codec: Arc<dyn AbiCodec>) -> Self {
        let mut descriptors = descriptors;
        let mut functions: HashMap<String, Vec<usize>> = HashMap::new();
        let mut events: HashMap<String, usize> = HashMap::new();
        let mut constructor = None;

        for (index, descriptor) in descriptors.iter_mut().enumerate() {
            match descriptor.kind {
                DescriptorKind::Function => {
                    let canonical = descriptor.canonical();
                    let selector = codec.encode_function_signature(&canonical);
                    descriptor.signature = Some(selector.clone());

                    functions.entry(descriptor.name.clone()).or_default().push(index);
                    functions.insert(selector, vec![index]);
                    functions.insert(canonical, vec![index]);
                }
                DescriptorKind::Event => {
                    let canonical = descriptor.canonical();
                    let topic = codec.encode_event_signature(&canonical);
                    descriptor.signature = Some(topic.clone());

                    events.entry(descriptor.name.clone()).or_insert(index);
                    events.insert(topic, index);
                    events.insert(canonical, index);
                }
                DescriptorKind::Constructor => {
                    if constructor.is_none() {
                        constructor = Some(index);
                    }
                }
                _ => {}
            }
        }

        Self { codec, descriptors, functions, events, constructor }
    }

    /// Parses a JSON interface (an array of descriptors) using the default codec
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|err| ContractError::Configuration(err.to_string()))?;
        Self::from_value(value, Arc::new(EthAbiCodec))
    }

    /// Builds an interface from an already parsed JSON value
    pub fn from_value(value: Value, codec: Arc<dyn AbiCodec>) -> Result<Self, ContractError> {
        if !value.is_array() {
            return Err(ContractError::Configuration(
                "you must provide the json interface of the contract".to_string(),
            ))
        }
        let descriptors = serde_json::from_value(value)
            .map_err(|err| ContractError::Configuration(err.to_string()))?;
        Ok(Self::new(descriptors, codec))
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn codec(&self) -> &Arc<dyn AbiCodec> {
        &self.codec
    }

    /// Returns the constructor, if the interface declares one
    pub fn constructor(&self) -> Option<&Descriptor> {
        self.constructor.map(|index| &self.descriptors[index])
    }

    pub fn functions(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter().filter(|d| d.is_function())
    }

    pub fn events(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter().filter(|d| d.is_event())
    }

    /// Looks up the overload candidates of a function by name, canonical signature or
    /// selector. Selectors match with or without `0x` prefix and in any case.
    pub fn lookup_function(&self, key: &str) -> Option<&[usize]> {
        lookup(&self.functions, key).map(Vec::as_slice)
    }

    /// Looks up an event by name, canonical signature or topic
    pub fn lookup_event(&self, key: &str) -> Option<usize> {
        lookup(&self.events, key).copied()
    }

    /// Resolves `key` to the first function taking `arity` arguments
    pub fn resolve_function(&self, key: &str, arity: usize) -> Result<&Descriptor, ContractError> {
        let candidates = match self.lookup_function(key) {
            Some(candidates) if !candidates.is_empty() => candidates,
            _ => return Err(ContractError::MethodNotFound(key.to_string())),
        };
        candidates
            .iter()
            .map(|index| &self.descriptors[*index])
            .find(|function| function.inputs.len() == arity)
            .ok_or_else(|| {
                let first = &self.descriptors[candidates[0]];
                ContractError::InvalidArgumentCount {
                    name: first.name.clone(),
                    got: arity,
                    expected: first.inputs.len(),
                }
            })
    }

    /// Returns the function registered under a selector
    pub fn function_by_signature(&self, selector: &str) -> Option<&Descriptor> {
        match self.lookup_function(selector)? {
            [index] => {
                let function = &self.descriptors[*index];
                let registered = function.signature()?;
                (strip_hex_prefix(registered).eq_ignore_ascii_case(strip_hex_prefix(selector)))
                    .then_some(function)
            }
            _ => None,
        }
    }

    /// Returns the event registered under a name, canonical signature or topic
    pub fn event(&self, key: &str) -> Option<&Descriptor> {
        self.lookup_event(key).map(|index| &self.descriptors[index])
    }

    /// Returns the event whose signature topic is `topic`
    pub fn event_by_topic(&self, topic: &str) -> Option<&Descriptor> {
        self.events().find(|event| {
            event
                .signature()
                .map(|sig| strip_hex_prefix(sig).eq_ignore_ascii_case(strip_hex_prefix(topic)))
                .unwrap_or(false)
        })
    }

    /// Encodes a call to `descriptor` with `args`.
    ///
    /// Constructors produce `deploy_data ‖ args`, functions `selector ‖ args`. The result
    /// is `0x` prefixed.
    pub fn encode_method_call(
        &self,
        descriptor: &Descriptor,
        args: &[Token],
        deploy_data: Option<&str>,
    ) -> Result<String, ContractError> {
        if args.len() != descriptor.inputs.len() {
            return Err(ContractError::ArgumentCountMismatch {
                expected: descriptor.inputs.len(),
                got: args.len(),
            })
        }
        let kinds = param_types(&descriptor.inputs)?;
        let encoded = self.codec.encode_parameters(&kinds, args)?;
        let params = strip_hex_prefix(&encoded);

        match descriptor.kind {
            DescriptorKind::Constructor => {
                let bytecode = deploy_data
                    .map(strip_hex_prefix)
                    .filter(|data| !data.is_empty())
                    .ok_or(ContractError::DeployDataMissing)?;
                Ok(format!("0x{bytecode}{params}"))
            }
            DescriptorKind::Function => {
                let selector = descriptor
                    .signature()
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| self.codec.encode_function_signature(&descriptor.canonical()));
                if self.function_by_signature(&selector).is_none() {
                    return Err(ContractError::MethodNotFound(selector))
                }
                Ok(format!("0x{}{}", strip_hex_prefix(&selector), params))
            }
            _ => Err(ContractError::MethodNotFound(descriptor.name.clone())),
        }
    }

    /// Decodes the data returned by a read-only call
    pub fn decode_method_return(
        &self,
        outputs: &[Param],
        data: Option<&str>,
    ) -> Result<MethodReturn, ContractError> {
        let data = data.map(strip_hex_prefix).unwrap_or_default();
        if data.is_empty() {
            return Ok(MethodReturn::None)
        }
        if outputs.is_empty() {
            // data returned for a method declaring no outputs decodes to no values
            return Ok(MethodReturn::Values(ReturnValues::new()))
        }
        let values = self.codec.decode_parameters(outputs, data)?;
        if outputs.len() == 1 {
            Ok(values.into_tokens().into_iter().next().map_or(MethodReturn::None, MethodReturn::Value))
        } else {
            Ok(MethodReturn::Values(values))
        }
    }
}

/// Exact match first, then hex keys (selectors, topics) normalized to lower case `0x..`
fn lookup<'a, V>(table: &'a HashMap<String, V>, key: &str) -> Option<&'a V> {
    table.get(key).or_else(|| {
        let digits = strip_hex_prefix(key);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None
        }
        table.get(&format!("0x{}", digits.to_ascii_lowercase()))
    })
}
