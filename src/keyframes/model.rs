use tracing::{debug, warn};

use super::{
    series::KeyframeSeries,
    value::ParamValue,
};
use crate::{
    error::{KeyframeError, Result},
    events::{EventBus, Notification},
    params::{ParamDef, ParamSchema},
};

/// Keyframes of every parameter of one effect instance
///
/// Each parameter of the schema owns one [`KeyframeSeries`]; only keyframable
/// parameters accept samples. Positions are frames relative to the start of
/// the effect.
#[derive(Debug, Clone)]
pub struct KeyframeModelList {
    schema: ParamSchema,
    series: Vec<KeyframeSeries>,
    duration: i64,
    events: EventBus,
}

impl KeyframeModelList {
    /// Create a model for `schema`. Initial animations declared in the
    /// definition are loaded; malformed ones are logged and left empty.
    pub fn new(schema: ParamSchema, duration: i64) -> Self {
        let series = schema
            .iter()
            .map(|def| match def.animation.as_deref() {
                Some(text) if def.kind.is_keyframable() => {
                    KeyframeSeries::parse_animation(text, def.kind.value_kind()).unwrap_or_else(|e| {
                        warn!("Ignoring initial animation of {}: {}", def.name, e);
                        KeyframeSeries::new()
                    })
                }
                _ => KeyframeSeries::new(),
            })
            .collect();

        Self {
            schema,
            series,
            duration: duration.max(0),
            events: EventBus::new(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    fn def(&self, param: usize) -> Result<&ParamDef> {
        self.schema
            .get(param)
            .ok_or_else(|| KeyframeError::UnknownParameter { index: param }.into())
    }

    fn keyframable_def(&self, param: usize) -> Result<&ParamDef> {
        let def = self.def(param)?;
        if !def.kind.is_keyframable() {
            return Err(KeyframeError::NotKeyframable { name: def.name.clone() }.into());
        }
        Ok(def)
    }

    /// Insert a keyframe, or overwrite the one already at `position`
    pub fn add_or_update_keyframe(&mut self, position: i64, value: ParamValue, param: usize) -> Result<()> {
        let def = self.keyframable_def(param)?;
        let name = def.name.clone();
        let expected = def.kind.value_kind();
        if value.kind() != expected {
            return Err(KeyframeError::TypeMismatch {
                name,
                expected: expected.name(),
                found: value.kind().name(),
            }
            .into());
        }

        let replaced = self.series[param].insert(position, value);
        debug!(
            "{} keyframe of {} at {}",
            if replaced.is_some() { "Updated" } else { "Added" },
            name,
            position
        );

        self.events.emit(Notification::KeyframeModified { param, position });
        Ok(())
    }

    /// Delete the keyframe at `position`, returning its value
    pub fn remove_keyframe(&mut self, position: i64, param: usize) -> Result<ParamValue> {
        self.keyframable_def(param)?;

        let removed = self.series[param]
            .remove(position)
            .ok_or(KeyframeError::NotFound { position })?;

        self.events.emit(Notification::KeyframeModified { param, position });
        Ok(removed)
    }

    /// Value of `param` at `position`. Parameters without keyframes (and
    /// non-keyframable ones) report their declared default.
    pub fn interpolated_value(&self, position: i64, param: usize) -> Result<ParamValue> {
        let def = self.def(param)?;
        Ok(self.series[param].value_at(position).unwrap_or(def.default))
    }

    /// Samples of one parameter
    pub fn keyframes(&self, param: usize) -> Result<&KeyframeSeries> {
        self.def(param)?;
        Ok(&self.series[param])
    }

    pub fn keyframe_positions(&self, param: usize) -> Result<Vec<i64>> {
        Ok(self.keyframes(param)?.positions())
    }

    pub fn has_keyframe_at(&self, position: i64, param: usize) -> bool {
        self.series.get(param).is_some_and(|s| s.contains(position))
    }

    pub fn keyframe_count(&self, param: usize) -> usize {
        self.series.get(param).map_or(0, KeyframeSeries::len)
    }

    pub fn previous_keyframe(&self, position: i64, param: usize) -> Option<i64> {
        self.series.get(param)?.previous_before(position)
    }

    pub fn next_keyframe(&self, position: i64, param: usize) -> Option<i64> {
        self.series.get(param)?.next_after(position)
    }

    /// Adopt a new effect duration. Samples are never moved or dropped, even
    /// when they fall outside the new range.
    pub fn refresh(&mut self, duration: i64) {
        let duration = duration.max(0);
        if duration != self.duration {
            debug!("Keyframe range changed from {} to {}", self.duration, duration);
            self.duration = duration;
        }
    }

    /// Replace the samples of `param` with those of an engine animation string
    pub fn load_animation(&mut self, param: usize, animation: &str) -> Result<()> {
        let kind = self.keyframable_def(param)?.kind.value_kind();
        self.series[param] = KeyframeSeries::parse_animation(animation, kind)?;
        Ok(())
    }

    /// Engine animation string of `param`, or `None` when it has no keyframes
    pub fn animation_string(&self, param: usize) -> Option<String> {
        self.series
            .get(param)
            .filter(|s| !s.is_empty())
            .map(KeyframeSeries::to_animation)
    }
}
