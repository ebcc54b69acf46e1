//! JSON interface descriptors of a contract
use crate::codec::AbiError;
use ethabi::{param_type::Reader, ParamType};
use serde::{Deserialize, Serialize};

/// The kind of an interface entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    #[default]
    Function,
    Event,
    Constructor,
    Fallback,
    Receive,
    Error,
}

/// A function input/output or an event input
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Param>,
    #[serde(rename = "internalType", default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { name: name.into(), kind: kind.into(), ..Default::default() }
    }

    /// Marks this (event) parameter as indexed
    pub fn indexed(mut self) -> Self {
        self.indexed = Some(true);
        self
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed.unwrap_or(false)
    }

    /// Returns the type as it appears in a canonical signature, with tuples expanded
    /// from their components, e.g. `(uint256,address)[]`
    pub fn canonical_type(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let inner =
                    self.components.iter().map(Param::canonical_type).collect::<Vec<_>>().join(",");
                format!("({inner}){suffix}")
            }
            None => self.kind.clone(),
        }
    }

    /// Parses the parameter's type
    pub fn param_type(&self) -> Result<ParamType, AbiError> {
        Ok(Reader::read(&self.canonical_type())?)
    }
}

/// Parses the types of a parameter list
pub fn param_types(params: &[Param]) -> Result<Vec<ParamType>, AbiError> {
    params.iter().map(Param::param_type).collect()
}

/// One entry of a contract's JSON interface
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(rename = "type", default)]
    pub kind: DescriptorKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub outputs: Vec<Param>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
    /// Function selector or event topic, computed once when the interface is registered
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub(crate) signature: Option<String>,
}

impl Descriptor {
    pub fn function(name: impl Into<String>, inputs: Vec<Param>, outputs: Vec<Param>) -> Self {
        Self { kind: DescriptorKind::Function, name: name.into(), inputs, outputs, ..Default::default() }
    }

    pub fn event(name: impl Into<String>, inputs: Vec<Param>) -> Self {
        Self { kind: DescriptorKind::Event, name: name.into(), inputs, ..Default::default() }
    }

    pub fn constructor(inputs: Vec<Param>) -> Self {
        Self { kind: DescriptorKind::Constructor, inputs, ..Default::default() }
    }

    /// The canonical form `name(type1,type2)` the signature is computed from
    pub fn canonical(&self) -> String {
        let types = self.inputs.iter().map(Param::canonical_type).collect::<Vec<_>>().join(",");
        format!("{}({})", self.name, types)
    }

    /// The `0x` prefixed selector (functions) or topic (events), once registered
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_function(&self) -> bool {
        self.kind == DescriptorKind::Function
    }

    pub fn is_event(&self) -> bool {
        self.kind == DescriptorKind::Event
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == DescriptorKind::Constructor
    }

    /// Returns true for `view`/`pure` functions
    pub fn is_read_only(&self) -> bool {
        matches!(self.state_mutability.as_deref(), Some("view") | Some("pure"))
    }
}
