//! Contains the `EventStream` type which decodes contract event frames as they arrive

use crate::{codec::strip_hex_prefix, log::DecodedEvent, Contract, ContractError};
use chainsql_providers::{EventTransport, RawContractEvent};
use futures_util::stream::Stream;
use pin_project::pin_project;
use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

type ParseFrame<'a> =
    Box<dyn Fn(RawContractEvent) -> Option<Result<DecodedEvent, ContractError>> + Send + Sync + 'a>;

#[pin_project]
/// A stream of decoded events for one contract subscription.
///
/// Frames the parser rejects (topics not matching the filter) are skipped. The stream ends
/// when the transport closes the subscription.
pub struct EventStream<'a, C: EventTransport> {
    contract: &'a Contract<C>,
    /// The subscribed contract's address
    pub address: String,
    /// The subscribed event signature, `None` for every event
    pub event_signature: Option<String>,
    #[pin]
    stream: C::EventStream,
    parse: ParseFrame<'a>,
}

impl<'a, C: EventTransport> EventStream<'a, C> {
    pub(crate) fn new(
        contract: &'a Contract<C>,
        address: String,
        event_signature: Option<String>,
        stream: C::EventStream,
        parse: ParseFrame<'a>,
    ) -> Self {
        Self { contract, address, event_signature, stream, parse }
    }

    /// Removes the subscription from the transport
    pub async fn unsubscribe(self) -> Result<(), ContractError> {
        self.contract
            .client()
            .unsubscribe_contract(&self.address, self.event_signature.as_deref())
            .await?;
        Ok(())
    }
}

impl<'a, C: EventTransport> fmt::Debug for EventStream<'a, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("address", &self.address)
            .field("event_signature", &self.event_signature)
            .finish_non_exhaustive()
    }
}

impl<'a, C: EventTransport> Stream for EventStream<'a, C> {
    type Item = Result<DecodedEvent, ContractError>;

    fn poll_next(self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            match futures_util::ready!(this.stream.as_mut().poll_next(ctx)) {
                Some(frame) => {
                    if let Some(item) = (this.parse)(frame) {
                        return Poll::Ready(Some(item))
                    }
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

/// Returns true if every constrained position of `filter` holds one of its topics
pub(crate) fn topics_match(filter: &[Option<Vec<String>>], topics: &[String]) -> bool {
    filter.iter().enumerate().all(|(index, allowed)| match allowed {
        None => true,
        Some(allowed) => topics.get(index).map_or(false, |topic| {
            allowed
                .iter()
                .any(|t| strip_hex_prefix(t).eq_ignore_ascii_case(strip_hex_prefix(topic)))
        }),
    })
}
