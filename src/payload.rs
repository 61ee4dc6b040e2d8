use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerPayload {
    pub player_name: Option<String>,
    pub platform: Option<String>,
    pub legends: BTreeMap<String, RawLegend>,
}

/// One entry of `legends.all`. `data` is `None` when the provider sent no usable list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLegend {
    pub data: Option<Vec<RawStatEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStatEntry {
    pub key: Option<String>,
    pub value: Option<Value>,
}

impl RawStatEntry {
    pub fn new(key: &str, value: impl Into<Value>) -> Self {
        Self {
            key: Some(key.to_string()),
            value: Some(value.into()),
        }
    }

    fn from_value(raw: &Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return Self::default();
        };
        Self {
            key: obj.get("key").and_then(Value::as_str).map(str::to_string),
            value: obj.get("value").cloned(),
        }
    }
}

impl RawLegend {
    pub fn from_entries(entries: Vec<RawStatEntry>) -> Self {
        Self {
            data: Some(entries),
        }
    }

    fn from_value(raw: &Value) -> Self {
        let data = raw
            .get("data")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(RawStatEntry::from_value).collect());
        Self { data }
    }

    pub fn entries(&self) -> &[RawStatEntry] {
        self.data.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
struct BridgeEnvelope {
    #[serde(rename = "Error")]
    error: Option<String>,
    global: Option<BridgeGlobal>,
    legends: Option<BridgeLegends>,
}

#[derive(Debug, Default, Deserialize)]
struct BridgeGlobal {
    name: Option<Value>,
    platform: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct BridgeLegends {
    all: Option<Value>,
}

/// Individual legend and stat entries are kept loosely typed so that a single odd entry
/// never rejects the whole payload; only the envelope shape is enforced here.
pub fn parse_player_payload(raw: &str) -> Result<PlayerPayload, FetchError> {
    let envelope = serde_json::from_str::<Option<BridgeEnvelope>>(raw)?.unwrap_or_default();
    if let Some(message) = envelope.error {
        return Err(FetchError::Provider(message.trim().to_string()));
    }

    let all = envelope
        .legends
        .and_then(|legends| legends.all)
        .ok_or(FetchError::MissingLegends)?;
    let all = all.as_object().ok_or(FetchError::MissingLegends)?;

    let legends = all
        .iter()
        .map(|(name, entry)| (name.clone(), RawLegend::from_value(entry)))
        .collect();

    let global = envelope.global.unwrap_or_default();
    Ok(PlayerPayload {
        player_name: global.name.as_ref().and_then(value_to_string),
        platform: global.platform.as_ref().and_then(value_to_string),
        legends,
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
