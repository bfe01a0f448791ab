use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::{channel::CommId, chart::ChartSpec};

/// Comm target the compute session publishes progress on.
pub const PROGRESS_TARGET: &str = "plyto";

/// Channel name the status side relays accumulated state over.
pub const RELAY_CHANNEL: &str = "plyto-data";

/// One per-step slice of named metric values.
///
/// Values stay as raw JSON so that `NaN`-shaped input survives the trip to
/// the presentation layer; insertion order equals declaration order.
pub type MetricMap = Map<String, serde_json::Value>;

/// The two categories an inbound channel delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgKind {
    /// Handshake: confirms and records the channel identity.
    Open,
    /// A progress payload on an established channel.
    Data,
}

/// Payload of an inbound `Data` message.
///
/// Numeric fields are kept as raw JSON and coerced explicitly by the state
/// machine (`coerce`), because publishers send numbers and strings
/// interchangeably.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressPayload {
    pub total_progress: serde_json::Value,
    pub current_progress: serde_json::Value,
    pub current_step: serde_json::Value,
    pub run_time: serde_json::Value,
    pub spec: Vec<ChartSpec>,
    pub data_set: MetricMap,
}

/// An inbound message on the progress target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressMsg {
    pub kind: MsgKind,
    pub comm_id: CommId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ProgressPayload>,
}

impl ProgressMsg {
    /// Builds the channel-open handshake for `comm_id`.
    pub fn open(comm_id: CommId) -> Self {
        Self {
            kind: MsgKind::Open,
            comm_id,
            data: None,
        }
    }

    /// Builds a data message carrying one progress payload.
    pub fn data(comm_id: CommId, payload: ProgressPayload) -> Self {
        Self {
            kind: MsgKind::Data,
            comm_id,
            data: Some(payload),
        }
    }
}

/// Full accumulated state relayed to a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayUpdate {
    pub run_time: u64,
    /// Accumulated per-step slices for the whole run so far.
    pub data_set: Vec<MetricMap>,
    /// The most recent slice on its own.
    pub data_item: MetricMap,
    pub spec: Vec<ChartSpec>,
    pub current_step: u64,
    /// True only when the redraw-worthiness rule held for this message; a
    /// late-join sync always carries `false`.
    pub update_graph: bool,
    pub display_graph: bool,
    pub done: bool,
    /// Notebook path of the producing session, or `"none"`.
    pub title: String,
}

/// A message on the relay channel.
///
/// The handshake is literally `{"open": true}`; anything else is a full
/// state update. Distinguished by shape, not by tag, to match the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayMsg {
    Open { open: bool },
    Update(Box<RelayUpdate>),
}

impl RelayMsg {
    /// The viewer-side handshake.
    pub fn open() -> Self {
        Self::Open { open: true }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { open: true })
    }

    /// Serializes for the channel; the relay sends JSON text, not objects.
    pub fn to_wire(&self) -> String {
        // MetricMap values are plain JSON (no non-string keys), so
        // serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses a message received from the relay channel.
    pub fn from_wire(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(step: u64, total: f64) -> ProgressPayload {
        ProgressPayload {
            total_progress: json!(total),
            current_progress: json!(50),
            current_step: json!(step),
            run_time: json!(3),
            spec: vec![ChartSpec::new(json!({"name": "loss"}))],
            data_set: MetricMap::new(),
        }
    }

    #[test]
    fn progress_msg_uses_the_wire_field_names() {
        let msg = ProgressMsg::data(CommId::new("c1"), payload(2, 40.0));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["kind"], "data");
        assert_eq!(value["data"]["totalProgress"], json!(40.0));
        assert_eq!(value["data"]["currentStep"], json!(2));
        assert_eq!(value["data"]["runTime"], json!(3));
    }

    #[test]
    fn open_handshake_omits_data() {
        let value = serde_json::to_value(ProgressMsg::open(CommId::new("c1"))).unwrap();
        assert_eq!(value["kind"], "open");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn relay_handshake_round_trips_by_shape() {
        let parsed = RelayMsg::from_wire(r#"{"open": true}"#).unwrap();
        assert!(parsed.is_open());
        assert_eq!(RelayMsg::open().to_wire(), r#"{"open":true}"#);
    }

    #[test]
    fn relay_update_round_trips_through_wire_text() {
        let mut item = MetricMap::new();
        item.insert("loss".into(), json!(0.25));
        item.insert("accuracy".into(), json!("NaN"));
        let update = RelayUpdate {
            run_time: 61,
            data_set: vec![item.clone()],
            data_item: item,
            spec: vec![ChartSpec::new(json!({"name": "loss"}))],
            current_step: 4,
            update_graph: true,
            display_graph: true,
            done: false,
            title: "A.ipynb".into(),
        };
        let msg = RelayMsg::Update(Box::new(update.clone()));
        let parsed = RelayMsg::from_wire(&msg.to_wire()).unwrap();
        match parsed {
            RelayMsg::Update(back) => assert_eq!(*back, update),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn metric_declaration_order_survives_serde() {
        let raw = r#"{"loss": 1.0, "accuracy": 0.5, "val_loss": 2.0}"#;
        let map: MetricMap = serde_json::from_str(raw).unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["loss", "accuracy", "val_loss"]);
    }
}
