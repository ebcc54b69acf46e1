//! Decoding of contract event frames
use crate::{
    base::Interface,
    codec::ReturnValues,
    interface::{Descriptor, DescriptorKind},
    ContractError,
};
use serde::{Deserialize, Serialize};

/// The event(s) a subscription decodes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventTarget {
    /// One event of the interface
    Event(Descriptor),
    /// Every event; each frame is matched against the interface by its first topic
    AllEvents,
}

/// The data and topics of an event frame, as received
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub data: String,
    pub topics: Vec<String>,
}

/// A decoded contract event
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecodedEvent {
    /// The event's name, `None` if the frame matched no event of the interface
    pub event: Option<String>,
    /// The signature topic, `None` for anonymous events
    pub signature: Option<String>,
    #[serde(rename = "returnValues")]
    pub return_values: ReturnValues,
    pub raw: RawLog,
}

impl Interface {
    /// Decodes an event frame.
    ///
    /// For [`EventTarget::AllEvents`] the event is looked up by `topics[0]`; frames matching
    /// no event decode as an anonymous event without inputs.
    pub fn decode_event_log(
        &self,
        target: &EventTarget,
        data: &str,
        topics: &[String],
    ) -> Result<DecodedEvent, ContractError> {
        let unknown;
        let event = match target {
            EventTarget::Event(event) => event,
            EventTarget::AllEvents => {
                match topics.first().and_then(|topic| self.event_by_topic(topic)) {
                    Some(event) => event,
                    None => {
                        unknown = Descriptor {
                            kind: DescriptorKind::Event,
                            anonymous: true,
                            ..Default::default()
                        };
                        &unknown
                    }
                }
            }
        };

        let arg_topics = if event.anonymous { topics } else { topics.get(1..).unwrap_or_default() };
        let return_values = self.codec().decode_log(&event.inputs, data, arg_topics)?;

        Ok(DecodedEvent {
            event: (!event.name.is_empty()).then(|| event.name.clone()),
            signature: if event.anonymous { None } else { topics.first().cloned() },
            return_values,
            raw: RawLog { data: data.to_owned(), topics: topics.to_vec() },
        })
    }
}
