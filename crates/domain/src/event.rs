use derive_new::new;
use serde::{Deserialize, Serialize};

/// Envelope for a persisted event as it travels on the event stream.
///
/// `payload` and `metadata` are the raw JSON documents written by the event
/// store, kept as strings so consumers only decode what they care about.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct DomainEvent {
    pub id: String,
    pub aggregate_type: String,
    pub sequence: usize,
    pub event_type: String,
    pub event_version: String,
    pub payload: String,
    pub metadata: String,
}
