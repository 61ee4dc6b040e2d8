use serde_json::Value;
use tracing::debug;

use crate::model::{LegendTotals, StatKey};
use crate::payload::RawStatEntry;

/// Raw provider keys folded into each canonical field. Special-event counters are
/// tracked separately by the provider and summed into the base stat.
pub const STAT_ALIASES: &[(&str, StatKey)] = &[
    ("kills", StatKey::Kills),
    ("specialEvent_kills", StatKey::Kills),
    ("wins", StatKey::Wins),
    ("specialEvent_wins", StatKey::Wins),
    ("damage", StatKey::Damage),
    ("specialEvent_damage", StatKey::Damage),
];

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingKey,
    MissingValue,
    NonNumeric(Value),
    Negative(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSkip {
    pub index: usize,
    pub key: Option<String>,
    pub reason: SkipReason,
}

pub fn canonical_key(raw_key: &str) -> Option<StatKey> {
    STAT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw_key)
        .map(|(_, key)| *key)
}

pub fn aggregate(entries: Option<&[RawStatEntry]>) -> LegendTotals {
    aggregate_with_skips(entries).0
}

pub fn aggregate_with_skips(
    entries: Option<&[RawStatEntry]>,
) -> (LegendTotals, Vec<AggregationSkip>) {
    let mut totals = LegendTotals::default();
    let mut skips = Vec::new();
    let Some(entries) = entries else {
        return (totals, skips);
    };

    for (index, entry) in entries.iter().enumerate() {
        let Some(raw_key) = entry.key.as_deref() else {
            skips.push(AggregationSkip {
                index,
                key: None,
                reason: SkipReason::MissingKey,
            });
            continue;
        };
        let Some(stat) = canonical_key(raw_key) else {
            continue;
        };
        match coerce_value(entry.value.as_ref()) {
            Ok(value) => totals.add(stat, value),
            Err(reason) => {
                debug!(key = raw_key, index, ?reason, "skipping stat entry");
                skips.push(AggregationSkip {
                    index,
                    key: Some(raw_key.to_string()),
                    reason,
                });
            }
        }
    }

    (totals, skips)
}

fn coerce_value(value: Option<&Value>) -> Result<u64, SkipReason> {
    let value = match value {
        None | Some(Value::Null) => return Err(SkipReason::MissingValue),
        Some(value) => value,
    };
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(v);
            }
            if n.as_i64().is_some() {
                return Err(SkipReason::Negative(value.clone()));
            }
            float_to_count(n.as_f64(), value)
        }
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            if let Ok(v) = cleaned.parse::<u64>() {
                return Ok(v);
            }
            float_to_count(cleaned.parse::<f64>().ok(), value)
        }
        other => Err(SkipReason::NonNumeric(other.clone())),
    }
}

fn float_to_count(parsed: Option<f64>, original: &Value) -> Result<u64, SkipReason> {
    match parsed {
        Some(f) if f.is_finite() && f >= 0.0 => Ok(f.trunc() as u64),
        Some(f) if f.is_finite() => Err(SkipReason::Negative(original.clone())),
        _ => Err(SkipReason::NonNumeric(original.clone())),
    }
}
