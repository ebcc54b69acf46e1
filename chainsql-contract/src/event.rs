use crate::{
    codec::{is_hashed_topic, keccak256, AbiCodec, AbiError},
    deferred::Deferred,
    log::{DecodedEvent, EventTarget},
    stream::{topics_match, EventStream},
    Contract, ContractError,
};
use chainsql_providers::EventTransport;
use ethabi::{ParamType, Token};
use futures_util::{
    future::{self, BoxFuture, FutureExt},
    StreamExt,
};
use std::fmt;
use tracing::debug;

/// Topic filters by position; `None` matches any topic, `Some(set)` any topic in `set`
pub type TopicFilter = Vec<Option<Vec<String>>>;

/// Helper for managing an event subscription before it is made
#[must_use = "event subscriptions do nothing unless you `subscribe` them"]
pub struct Event<'a, C> {
    contract: &'a Contract<C>,
    /// The event(s) the subscription decodes
    pub target: EventTarget,
    filters: Vec<(String, Vec<Token>)>,
    topics: Option<TopicFilter>,
}

impl<'a, C> fmt::Debug for Event<'a, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("target", &self.target)
            .field("filters", &self.filters)
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

impl<'a, C> Event<'a, C> {
    pub(crate) fn new(contract: &'a Contract<C>, target: EventTarget) -> Self {
        Self { contract, target, filters: Vec::new(), topics: None }
    }

    /// Only delivers events whose indexed argument `name` equals `value`.
    ///
    /// Repeated filters on the same argument match any of the values.
    pub fn filter(self, name: impl Into<String>, value: Token) -> Self {
        self.filter_any(name, vec![value])
    }

    /// Only delivers events whose indexed argument `name` equals one of `values`
    pub fn filter_any(mut self, name: impl Into<String>, values: Vec<Token>) -> Self {
        let name = name.into();
        match self.filters.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.extend(values),
            None => self.filters.push((name, values)),
        }
        self
    }

    /// Uses the given topics instead of the ones built from the event and its filters
    pub fn topics(mut self, topics: TopicFilter) -> Self {
        self.topics = Some(topics);
        self
    }

    /// Returns the topics the delivered frames must match: the event signature (unless
    /// anonymous) followed by one entry per indexed input. Trailing wildcards are dropped.
    pub fn encoded_topics(&self) -> Result<TopicFilter, ContractError> {
        if let Some(topics) = &self.topics {
            return Ok(topics.clone())
        }
        let event = match &self.target {
            EventTarget::Event(event) => event,
            EventTarget::AllEvents => return Ok(Vec::new()),
        };
        let codec = self.contract.interface().codec();

        let mut topics = TopicFilter::new();
        if !event.anonymous {
            topics.push(event.signature().map(|signature| vec![signature.to_owned()]));
        }
        for input in event.inputs.iter().filter(|input| input.is_indexed()) {
            let topic = match self.filters.iter().find(|(name, _)| *name == input.name) {
                Some((_, values)) if !values.is_empty() => {
                    let kind = input.param_type()?;
                    let encoded = values
                        .iter()
                        .map(|value| encode_topic(codec.as_ref(), &kind, value))
                        .collect::<Result<Vec<_>, _>>()?;
                    Some(encoded)
                }
                _ => None,
            };
            topics.push(topic);
        }
        while matches!(topics.last(), Some(None)) {
            topics.pop();
        }
        Ok(topics)
    }

    fn event_signature(&self) -> Option<String> {
        match &self.target {
            EventTarget::Event(event) => event.signature().map(ToOwned::to_owned),
            EventTarget::AllEvents => None,
        }
    }
}

impl<'a, C: EventTransport> Event<'a, C> {
    /// Subscribes to the contract's events.
    ///
    /// Frames are decoded as they are delivered; frames not matching the topic filter are
    /// skipped.
    pub fn subscribe(&self) -> Result<Deferred<'a, EventStream<'a, C>>, ContractError> {
        let address = self.contract.require_address()?;
        let filter = self.encoded_topics()?;
        let signature = self.event_signature();
        let contract = self.contract;
        let target = self.target.clone();

        Ok(Deferred::new(async move {
            let stream = contract.client().subscribe_contract(&address, signature.as_deref()).await?;
            debug!(%address, ?signature, "subscribed to contract events");

            let parse = Box::new(move |frame: chainsql_providers::RawContractEvent| {
                if !topics_match(&filter, &frame.topics) {
                    return None
                }
                Some(contract.interface().decode_event_log(&target, &frame.data, &frame.topics))
            });
            Ok(EventStream::new(contract, address, signature, stream, parse))
        }))
    }

    /// Subscribes and invokes `callback` with every delivered event.
    ///
    /// Failing to subscribe invokes `callback` once with the error; a synchronous failure
    /// does so before returning.
    pub fn subscribe_with<F>(&self, callback: F) -> BoxFuture<'a, ()>
    where
        F: FnMut(Result<DecodedEvent, ContractError>) + Send + 'a,
    {
        let mut callback = callback;
        let subscription = match self.subscribe() {
            Ok(subscription) => subscription,
            Err(err) => {
                callback(Err(err));
                return future::ready(()).boxed()
            }
        };
        async move {
            match subscription.await {
                Ok(mut stream) => {
                    while let Some(event) = stream.next().await {
                        callback(event);
                    }
                }
                Err(err) => callback(Err(err)),
            }
        }
        .boxed()
    }
}

/// Encodes one indexed value as a topic. Strings and byte strings are indexed by their
/// hash; other reference types can not be filtered on.
fn encode_topic(codec: &dyn AbiCodec, kind: &ParamType, value: &Token) -> Result<String, AbiError> {
    match (kind, value) {
        (ParamType::String, Token::String(value)) => {
            Ok(format!("0x{}", hex::encode(keccak256(value))))
        }
        (ParamType::Bytes, Token::Bytes(value)) => Ok(format!("0x{}", hex::encode(keccak256(value)))),
        _ if is_hashed_topic(kind) => Err(AbiError::UnsupportedTopic(kind.to_string())),
        _ => codec.encode_parameter(kind, value),
    }
}
