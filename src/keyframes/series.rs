use std::collections::BTreeMap;

use super::value::{Lerp, ParamValue, ValueKind};
use crate::error::{KeyframeError, Result};

/// Time-ordered samples of one parameter
///
/// Positions are unique; inserting at an occupied position overwrites the
/// sample there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyframeSeries {
    keys: BTreeMap<i64, ParamValue>,
}

impl KeyframeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the replaced value, if any
    pub fn insert(&mut self, position: i64, value: ParamValue) -> Option<ParamValue> {
        self.keys.insert(position, value)
    }

    pub fn remove(&mut self, position: i64) -> Option<ParamValue> {
        self.keys.remove(&position)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Stored sample at exactly `position`
    pub fn get(&self, position: i64) -> Option<&ParamValue> {
        self.keys.get(&position)
    }

    pub fn contains(&self, position: i64) -> bool {
        self.keys.contains_key(&position)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn positions(&self) -> Vec<i64> {
        self.keys.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &ParamValue)> {
        self.keys.iter().map(|(p, v)| (*p, v))
    }

    /// Closest keyframe strictly before `position`
    pub fn previous_before(&self, position: i64) -> Option<i64> {
        self.keys.range(..position).next_back().map(|(p, _)| *p)
    }

    /// Closest keyframe strictly after `position`
    pub fn next_after(&self, position: i64) -> Option<i64> {
        self.keys
            .range(position.saturating_add(1)..)
            .next()
            .map(|(p, _)| *p)
    }

    /// Value at `position`: the stored sample on an exact hit, the boundary
    /// sample outside the keyed range, a linear blend in between. `None` only
    /// for an empty series.
    pub fn value_at(&self, position: i64) -> Option<ParamValue> {
        if let Some(exact) = self.keys.get(&position) {
            return Some(*exact);
        }

        let left = self.keys.range(..position).next_back();
        let right = self.keys.range(position..).next();

        match (left, right) {
            (None, None) => None,
            (None, Some((_, first))) => Some(*first),
            (Some((_, last)), None) => Some(*last),
            (Some((lp, lv)), Some((rp, rv))) => {
                // keys may span the whole i64 range
                let span = i128::from(*rp) - i128::from(*lp);
                let t = (i128::from(position) - i128::from(*lp)) as f64 / span as f64;
                Some(ParamValue::lerp(lv, rv, t))
            }
        }
    }

    /// Parse the engine's animation string, e.g. `"0=0.5;25=1"` or
    /// `"0=0 0 100 100;25=10 10 50 50"`
    pub fn parse_animation(input: &str, kind: ValueKind) -> Result<Self> {
        let mut series = Self::new();

        for entry in input.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((position, value)) = entry.split_once('=') else {
                return Err(KeyframeError::Malformed {
                    input: entry.to_string(),
                    reason: "expected position=value".to_string(),
                }
                .into());
            };

            let position = position.trim().parse::<i64>().map_err(|_| KeyframeError::Malformed {
                input: entry.to_string(),
                reason: "position is not an integer frame".to_string(),
            })?;

            series.insert(position, kind.parse_value(value)?);
        }

        Ok(series)
    }

    /// Serialize back to the engine's animation string
    pub fn to_animation(&self) -> String {
        self.keys
            .iter()
            .map(|(p, v)| format!("{}={}", p, v))
            .collect::<Vec<_>>()
            .join(";")
    }
}
