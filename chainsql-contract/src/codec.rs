//! The parameter codec the bindings delegate to, and its `ethabi` backed default.
use crate::interface::{param_types, Param};
use ethabi::{ParamType, Token};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;
use std::{fmt::Debug, ops::Index};
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

#[derive(Error, Debug)]
pub enum AbiError {
    /// Thrown when the ABI encoding or decoding fails
    #[error(transparent)]
    DecodingError(#[from] ethabi::Error),

    /// Thrown when a hex string can not be decoded
    #[error(transparent)]
    HexError(#[from] hex::FromHexError),

    /// Thrown when a value does not match its declared type
    #[error("value {token} does not match type {kind}")]
    TypeMismatch { token: String, kind: String },

    /// Thrown when the number of values differs from the number of types
    #[error("expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Thrown when a log carries fewer topics than it has indexed parameters
    #[error("expected at least {expected} topics, got {got}")]
    MissingTopics { expected: usize, got: usize },

    /// Thrown when a value of this type can not be used as a topic filter
    #[error("can not build a topic for type {0}")]
    UnsupportedTopic(String),
}

/// Computes the Keccak-256 hash of input bytes.
pub fn keccak256<T: AsRef<[u8]>>(bytes: T) -> [u8; 32] {
    let mut output = [0u8; 32];

    let mut hasher = Keccak::v256();
    hasher.update(bytes.as_ref());
    hasher.finalize(&mut output);

    output
}

/// Decodes a hex string, with or without `0x` prefix
pub fn decode_hex(data: &str) -> Result<Vec<u8>, AbiError> {
    Ok(hex::decode(strip_hex_prefix(data))?)
}

pub fn strip_hex_prefix(data: &str) -> &str {
    data.strip_prefix("0x").or_else(|| data.strip_prefix("0X")).unwrap_or(data)
}

/// Encoder/decoder for contract parameters, selectors and logs.
///
/// All hex strings produced are `0x` prefixed and lower case; inputs are accepted with or
/// without prefix.
pub trait AbiCodec: Debug + Send + Sync {
    /// The 4 byte selector of a canonical function signature such as `transfer(address,uint256)`
    fn encode_function_signature(&self, canonical: &str) -> String;

    /// The 32 byte topic of a canonical event signature
    fn encode_event_signature(&self, canonical: &str) -> String;

    /// Encodes a single value
    fn encode_parameter(&self, kind: &ParamType, token: &Token) -> Result<String, AbiError>;

    /// Encodes a list of values
    fn encode_parameters(&self, kinds: &[ParamType], tokens: &[Token]) -> Result<String, AbiError>;

    /// Decodes a list of values described by `params`
    fn decode_parameters(&self, params: &[Param], data: &str) -> Result<ReturnValues, AbiError>;

    /// Decodes the indexed (`topics`, signature topic already removed) and non-indexed
    /// (`data`) inputs of a log, in declaration order
    fn decode_log(
        &self,
        inputs: &[Param],
        data: &str,
        topics: &[String],
    ) -> Result<ReturnValues, AbiError>;
}

/// [`AbiCodec`] implemented with `ethabi`
#[derive(Clone, Copy, Debug, Default)]
pub struct EthAbiCodec;

impl AbiCodec for EthAbiCodec {
    fn encode_function_signature(&self, canonical: &str) -> String {
        format!("0x{}", hex::encode(&keccak256(canonical)[..4]))
    }

    fn encode_event_signature(&self, canonical: &str) -> String {
        format!("0x{}", hex::encode(keccak256(canonical)))
    }

    fn encode_parameter(&self, kind: &ParamType, token: &Token) -> Result<String, AbiError> {
        self.encode_parameters(std::slice::from_ref(kind), std::slice::from_ref(token))
    }

    fn encode_parameters(&self, kinds: &[ParamType], tokens: &[Token]) -> Result<String, AbiError> {
        if kinds.len() != tokens.len() {
            return Err(AbiError::LengthMismatch { expected: kinds.len(), got: tokens.len() })
        }
        if let Some((kind, token)) =
            kinds.iter().zip(tokens).find(|(kind, token)| !token.type_check(kind))
        {
            return Err(AbiError::TypeMismatch { token: token.to_string(), kind: kind.to_string() })
        }
        Ok(format!("0x{}", hex::encode(ethabi::encode(tokens))))
    }

    fn decode_parameters(&self, params: &[Param], data: &str) -> Result<ReturnValues, AbiError> {
        let kinds = param_types(params)?;
        let tokens = ethabi::decode(&kinds, &decode_hex(data)?)?;
        Ok(params.iter().map(|p| p.name.clone()).zip(tokens).collect())
    }

    fn decode_log(
        &self,
        inputs: &[Param],
        data: &str,
        topics: &[String],
    ) -> Result<ReturnValues, AbiError> {
        let indexed = inputs.iter().filter(|p| p.is_indexed()).count();
        if topics.len() < indexed {
            return Err(AbiError::MissingTopics { expected: indexed, got: topics.len() })
        }

        let data_kinds = inputs
            .iter()
            .filter(|p| !p.is_indexed())
            .map(Param::param_type)
            .collect::<Result<Vec<_>, _>>()?;
        let mut data_tokens = if data_kinds.is_empty() {
            Vec::new()
        } else {
            ethabi::decode(&data_kinds, &decode_hex(data)?)?
        }
        .into_iter();

        let mut topics = topics.iter();
        let mut values = ReturnValues::default();
        for input in inputs {
            let token = if input.is_indexed() {
                let topic = decode_hex(topics.next().map(String::as_str).unwrap_or_default())?;
                let kind = input.param_type()?;
                if is_hashed_topic(&kind) {
                    // reference types are indexed by their hash, the value is not recoverable
                    Token::FixedBytes(topic)
                } else {
                    ethabi::decode(&[kind], &topic)?.into_iter().next().ok_or(
                        AbiError::LengthMismatch { expected: 1, got: 0 },
                    )?
                }
            } else {
                data_tokens
                    .next()
                    .ok_or(AbiError::LengthMismatch { expected: data_kinds.len(), got: 0 })?
            };
            values.push(input.name.clone(), token);
        }
        Ok(values)
    }
}

/// Returns true for types whose indexed value is stored as its keccak hash
pub(crate) fn is_hashed_topic(kind: &ParamType) -> bool {
    matches!(
        kind,
        ParamType::String |
            ParamType::Bytes |
            ParamType::Array(_) |
            ParamType::FixedArray(_, _) |
            ParamType::Tuple(_)
    )
}

/// Decoded values, addressable by position and (when named) by name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReturnValues {
    values: Vec<(String, Token)>,
}

impl ReturnValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, token: Token) {
        self.values.push((name.into(), token));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.values.get(index).map(|(_, token)| token)
    }

    /// Returns the first value with the given name
    pub fn get_named(&self, name: &str) -> Option<&Token> {
        self.values.iter().find(|(n, _)| !n.is_empty() && n == name).map(|(_, token)| token)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Token)> {
        self.values.iter().map(|(name, token)| (name.as_str(), token))
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.values.into_iter().map(|(_, token)| token).collect()
    }
}

impl FromIterator<(String, Token)> for ReturnValues {
    fn from_iter<I: IntoIterator<Item = (String, Token)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

impl Index<usize> for ReturnValues {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.values[index].1
    }
}

impl Index<&str> for ReturnValues {
    type Output = Token;

    fn index(&self, name: &str) -> &Token {
        match self.get_named(name) {
            Some(token) => token,
            None => panic!("no return value named {name}"),
        }
    }
}

/// Serializes to an object keyed both by position and by name, e.g.
/// `{"0": "0x..", "owner": "0x..", "1": "100", "amount": "100"}`
impl Serialize for ReturnValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let named = self.values.iter().filter(|(name, _)| !name.is_empty()).count();
        let mut map = serializer.serialize_map(Some(self.values.len() + named))?;
        for (index, (name, token)) in self.values.iter().enumerate() {
            let value = token_to_json(token);
            map.serialize_entry(&index.to_string(), &value)?;
            if !name.is_empty() {
                map.serialize_entry(name, &value)?;
            }
        }
        map.end()
    }
}

/// Converts a token to JSON: integers as decimal strings, byte strings and addresses as
/// `0x` prefixed hex
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(address) => Value::String(format!("{address:?}")),
        Token::Bytes(bytes) | Token::FixedBytes(bytes) => {
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        Token::Uint(value) => Value::String(value.to_string()),
        Token::Int(value) => {
            // two's complement
            if value.bit(255) {
                let magnitude = (!*value).overflowing_add(1.into()).0;
                Value::String(format!("-{magnitude}"))
            } else {
                Value::String(value.to_string())
            }
        }
        Token::Bool(value) => Value::Bool(*value),
        Token::String(value) => Value::String(value.clone()),
        Token::Array(tokens) | Token::FixedArray(tokens) | Token::Tuple(tokens) => {
            Value::Array(tokens.iter().map(token_to_json).collect())
        }
    }
}
