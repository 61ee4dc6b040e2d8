use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::CacheError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendStat {
    pub id: i64,
    pub player_name: String,
    pub legend_name: String,
    pub kills: u64,
    pub wins: u64,
    pub damage: u64,
    pub recorded_at: DateTime<Utc>,
}

impl LegendStat {
    pub fn totals(&self) -> LegendTotals {
        LegendTotals {
            kills: self.kills,
            wins: self.wins,
            damage: self.damage,
        }
    }

    pub fn stat(&self, key: StatKey) -> u64 {
        key.read(&self.totals())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LegendTotals {
    pub kills: u64,
    pub wins: u64,
    pub damage: u64,
}

impl LegendTotals {
    pub fn new(kills: u64, wins: u64, damage: u64) -> Self {
        Self {
            kills,
            wins,
            damage,
        }
    }

    pub fn add(&mut self, key: StatKey, value: u64) {
        let slot = match key {
            StatKey::Kills => &mut self.kills,
            StatKey::Wins => &mut self.wins,
            StatKey::Damage => &mut self.damage,
        };
        *slot = slot.saturating_add(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKey {
    Kills,
    Wins,
    Damage,
}

type Accessor = fn(&LegendTotals) -> u64;

const ACCESSORS: [(StatKey, Accessor); 3] = [
    (StatKey::Kills, kills_of),
    (StatKey::Wins, wins_of),
    (StatKey::Damage, damage_of),
];

fn kills_of(totals: &LegendTotals) -> u64 {
    totals.kills
}

fn wins_of(totals: &LegendTotals) -> u64 {
    totals.wins
}

fn damage_of(totals: &LegendTotals) -> u64 {
    totals.damage
}

impl StatKey {
    pub const ALL: [StatKey; 3] = [StatKey::Kills, StatKey::Wins, StatKey::Damage];

    pub fn as_str(self) -> &'static str {
        match self {
            StatKey::Kills => "kills",
            StatKey::Wins => "wins",
            StatKey::Damage => "damage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatKey::Kills => "Kills",
            StatKey::Wins => "Wins",
            StatKey::Damage => "Damage",
        }
    }

    pub fn read(self, totals: &LegendTotals) -> u64 {
        ACCESSORS
            .iter()
            .find(|(key, _)| *key == self)
            .map(|(_, get)| get(totals))
            .unwrap_or_default()
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKey {
    type Err = CacheError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        StatKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CacheError::InvalidStatKey(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatReading {
    pub player_name: String,
    pub legend_name: String,
    pub key: StatKey,
    pub value: u64,
    pub recorded_at: DateTime<Utc>,
}

impl fmt::Display for StatReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}'s {}: {} (as of {})",
            self.legend_name,
            self.key.label(),
            self.value,
            self.recorded_at.format("%Y-%m-%d %H:%M")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
