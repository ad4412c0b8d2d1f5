use tracing::debug;

use crate::{
    error::{KeyframeError, Result},
    events::{EventBus, Notification},
    keyframes::{KeyframeModelList, ParamValue},
};

/// Where the current position sits relative to a parameter's keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// The parameter has no keyframes at all
    NoKeyframe,
    /// A keyframe sits exactly at the current position; it may be deleted
    AtKeyframe,
    /// Keyframes exist, none at the current position
    BetweenKeyframes,
}

impl BindingState {
    pub fn can_delete(&self) -> bool {
        matches!(self, Self::AtKeyframe)
    }
}

/// One parameter control bound to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    pub param: usize,
    pub state: BindingState,
    /// Value currently displayed by the control
    pub value: ParamValue,
}

/// State of one binding after a position change
#[derive(Debug, Clone, PartialEq)]
pub struct BindingReport {
    pub param: usize,
    pub state: BindingState,
    pub at_keyframe: bool,
    /// The parameter has exactly one keyframe (it holds for the whole range)
    pub single_keyframe: bool,
}

/// Result of [`KeyframeBinder::set_position`]
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    /// Position after clamping
    pub position: i64,
    pub bindings: Vec<BindingReport>,
}

impl PositionReport {
    /// Whether any bound parameter has a keyframe at the position
    pub fn at_keyframe(&self) -> bool {
        self.bindings.iter().any(|b| b.at_keyframe)
    }

    /// Whether every bound parameter that has keyframes holds exactly one
    pub fn single_keyframe(&self) -> bool {
        let mut keyed = self
            .bindings
            .iter()
            .filter(|b| b.state != BindingState::NoKeyframe)
            .peekable();
        keyed.peek().is_some() && keyed.all(|b| b.single_keyframe)
    }
}

/// Keeps parameter controls in sync with a [`KeyframeModelList`]
///
/// The binder holds parameter indices only; the model is passed in on every
/// call so the effect keeps sole ownership of it. The position range is read
/// from the model each time.
#[derive(Debug, Clone)]
pub struct KeyframeBinder {
    position: i64,
    bindings: Vec<ParameterBinding>,
    /// Whether the last reported position sat on a keyframe
    at_keyframe: bool,
    events: EventBus,
}

impl KeyframeBinder {
    /// Bind every keyframable parameter of the model
    pub fn new(model: &KeyframeModelList) -> Self {
        let params = model.schema().keyframable();
        Self::bind_params(model, &params)
    }

    /// Bind a chosen set of parameters; unknown indices are ignored
    pub fn bind_params(model: &KeyframeModelList, params: &[usize]) -> Self {
        let bindings = params
            .iter()
            .copied()
            .filter(|p| model.schema().get(*p).is_some())
            .map(|param| ParameterBinding {
                param,
                state: BindingState::NoKeyframe,
                value: ParamValue::Scalar(0.0),
            })
            .collect();

        let mut binder = Self {
            position: 0,
            bindings,
            at_keyframe: false,
            events: model.events().clone(),
        };
        binder.refresh_values(model);
        binder.at_keyframe = binder
            .bindings
            .iter()
            .any(|b| b.state == BindingState::AtKeyframe);
        binder
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }

    pub fn binding(&self, param: usize) -> Option<&ParameterBinding> {
        self.bindings.iter().find(|b| b.param == param)
    }

    /// Move to `position` (clamped to the model's current range) and refresh
    /// every bound control. A notification is emitted whenever the position
    /// lands on a keyframe, and once when it leaves one.
    pub fn set_position(&mut self, model: &KeyframeModelList, position: i64) -> PositionReport {
        self.position = position.clamp(0, model.duration().max(0));
        self.refresh_values(model);

        let bindings: Vec<BindingReport> = self
            .bindings
            .iter()
            .map(|b| BindingReport {
                param: b.param,
                state: b.state,
                at_keyframe: b.state == BindingState::AtKeyframe,
                single_keyframe: model.keyframe_count(b.param) == 1,
            })
            .collect();

        let report = PositionReport {
            position: self.position,
            bindings,
        };

        let at_keyframe = report.at_keyframe();
        if at_keyframe || self.at_keyframe {
            self.events.emit(Notification::PositionReachedKeyframe {
                position: self.position,
                at_keyframe,
                single_keyframe: report.single_keyframe(),
            });
        }
        self.at_keyframe = at_keyframe;

        report
    }

    /// Re-derive state and displayed value of every binding at the current
    /// position
    pub fn refresh_values(&mut self, model: &KeyframeModelList) {
        let position = self.position;
        for binding in &mut self.bindings {
            binding.state = if model.keyframe_count(binding.param) == 0 {
                BindingState::NoKeyframe
            } else if model.has_keyframe_at(position, binding.param) {
                BindingState::AtKeyframe
            } else {
                BindingState::BetweenKeyframes
            };

            if let Ok(value) = model.interpolated_value(position, binding.param) {
                binding.value = value;
            }
        }
    }

    /// Store a user edit as a keyframe at the current position. Scalars are
    /// clamped to the parameter's declared range.
    pub fn commit_edit(&mut self, model: &mut KeyframeModelList, param: usize, value: ParamValue) -> Result<()> {
        let value = clamp_to_param(model, param, value);
        model.add_or_update_keyframe(self.position, value, param)?;
        self.refresh_values(model);
        Ok(())
    }

    /// Add a keyframe holding the displayed value, or delete the keyframe at
    /// the current position. Returns whether a keyframe now exists there.
    pub fn toggle_keyframe(&mut self, model: &mut KeyframeModelList, param: usize) -> Result<bool> {
        let binding = self
            .binding(param)
            .ok_or(KeyframeError::UnknownParameter { index: param })?;

        let added = if binding.state.can_delete() {
            model.remove_keyframe(self.position, param)?;
            false
        } else {
            let value = clamp_to_param(model, param, binding.value);
            model.add_or_update_keyframe(self.position, value, param)?;
            true
        };

        debug!(
            "{} keyframe of parameter {} at {}",
            if added { "Added" } else { "Removed" },
            param,
            self.position
        );
        self.refresh_values(model);
        Ok(added)
    }

    /// Jump to the closest keyframe before the current position across all
    /// bound parameters. Stays put when there is none.
    pub fn go_to_previous(&mut self, model: &KeyframeModelList) -> Option<PositionReport> {
        let target = self
            .bindings
            .iter()
            .filter_map(|b| model.previous_keyframe(self.position, b.param))
            .max()?;
        Some(self.set_position(model, target))
    }

    /// Jump to the closest keyframe after the current position across all
    /// bound parameters
    pub fn go_to_next(&mut self, model: &KeyframeModelList) -> Option<PositionReport> {
        let target = self
            .bindings
            .iter()
            .filter_map(|b| model.next_keyframe(self.position, b.param))
            .min()?;
        Some(self.set_position(model, target))
    }

    /// Follow a change of the effect's duration (clip trim)
    pub fn set_duration(&mut self, model: &mut KeyframeModelList, duration: i64) -> PositionReport {
        model.refresh(duration);
        let position = self.position;
        self.set_position(model, position)
    }
}

fn clamp_to_param(model: &KeyframeModelList, param: usize, value: ParamValue) -> ParamValue {
    model
        .schema()
        .get(param)
        .map_or(value, |def| def.clamp(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::XmlElement,
        config::Profile,
        keyframes::Rect,
        params::{ParamDef, ParamSchema},
    };
    use std::sync::{Arc, Mutex};

    fn model(duration: i64) -> KeyframeModelList {
        let xml = XmlElement::parse(
            r#"<effect tag="affine">
                 <parameter type="animated" name="opacity" default="1" min="0" max="1"/>
                 <parameter type="constant" name="gain" default="2"/>
                 <parameter type="animatedrect" name="rect" default="0 0 %width %height"/>
               </effect>"#,
        )
        .unwrap();
        let params = xml
            .descendants_named("parameter")
            .into_iter()
            .filter_map(|el| ParamDef::from_element(el, &Profile::default()))
            .collect();
        KeyframeModelList::new(ParamSchema::new(params), duration)
    }

    #[test]
    fn test_binds_keyframable_params_only() {
        let m = model(100);
        let binder = KeyframeBinder::new(&m);
        let params: Vec<usize> = binder.bindings().iter().map(|b| b.param).collect();
        assert_eq!(params, vec![0, 2]);
        assert_eq!(binder.binding(0).unwrap().state, BindingState::NoKeyframe);
        assert_eq!(binder.binding(0).unwrap().value, ParamValue::Scalar(1.0));
        assert_eq!(
            binder.binding(2).unwrap().value,
            ParamValue::Rect(Rect::new(0.0, 0.0, 1920.0, 1080.0))
        );
    }

    #[test]
    fn test_position_is_clamped() {
        let m = model(50);
        let mut binder = KeyframeBinder::new(&m);
        assert_eq!(binder.set_position(&m, -10).position, 0);
        assert_eq!(binder.set_position(&m, 80).position, 50);
        assert_eq!(binder.set_position(&m, 20).position, 20);
    }

    #[test]
    fn test_state_machine() {
        let mut m = model(100);
        let mut binder = KeyframeBinder::new(&m);

        binder.set_position(&m, 10);
        binder.commit_edit(&mut m, 0, 0.5.into()).unwrap();
        assert_eq!(binder.binding(0).unwrap().state, BindingState::AtKeyframe);

        let report = binder.set_position(&m, 30);
        assert_eq!(report.bindings[0].state, BindingState::BetweenKeyframes);
        assert!(report.bindings[0].single_keyframe);
        assert!(!report.at_keyframe());
        assert_eq!(binder.binding(0).unwrap().value, ParamValue::Scalar(0.5));
        assert_eq!(report.bindings[1].state, BindingState::NoKeyframe);
        assert!(!BindingState::BetweenKeyframes.can_delete());
    }

    #[test]
    fn test_commit_edit_interpolates_between_edits() {
        let mut m = model(100);
        let mut binder = KeyframeBinder::new(&m);

        binder.set_position(&m, 0);
        binder.commit_edit(&mut m, 0, 0.0.into()).unwrap();
        binder.set_position(&m, 10);
        binder.commit_edit(&mut m, 0, 1.0.into()).unwrap();

        binder.set_position(&m, 5);
        assert_eq!(binder.binding(0).unwrap().value, ParamValue::Scalar(0.5));
        assert!(binder.commit_edit(&mut m, 1, 1.0.into()).is_err());
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut m = model(100);
        let mut binder = KeyframeBinder::new(&m);
        binder.set_position(&m, 40);

        assert!(binder.toggle_keyframe(&mut m, 0).unwrap());
        assert!(m.has_keyframe_at(40, 0));
        assert_eq!(binder.binding(0).unwrap().state, BindingState::AtKeyframe);

        assert!(!binder.toggle_keyframe(&mut m, 0).unwrap());
        assert_eq!(m.keyframe_count(0), 0);
        assert_eq!(binder.binding(0).unwrap().state, BindingState::NoKeyframe);

        assert!(binder.toggle_keyframe(&mut m, 1).is_err());
    }

    #[test]
    fn test_keyframe_navigation() {
        let mut m = model(100);
        m.add_or_update_keyframe(20, 0.0.into(), 0).unwrap();
        m.add_or_update_keyframe(70, 0.0.into(), 0).unwrap();
        m.add_or_update_keyframe(45, Rect::new(0.0, 0.0, 1.0, 1.0).into(), 2).unwrap();

        let mut binder = KeyframeBinder::new(&m);
        binder.set_position(&m, 50);

        assert_eq!(binder.go_to_previous(&m).unwrap().position, 45);
        assert_eq!(binder.go_to_previous(&m).unwrap().position, 20);
        assert!(binder.go_to_previous(&m).is_none());
        assert_eq!(binder.position(), 20);

        let report = binder.go_to_next(&m).unwrap();
        assert_eq!(report.position, 45);
        assert!(report.at_keyframe());
        assert_eq!(binder.go_to_next(&m).unwrap().position, 70);
        assert!(binder.go_to_next(&m).is_none());
    }

    #[test]
    fn test_reaching_a_keyframe_is_notified() {
        let mut m = model(100);
        m.add_or_update_keyframe(25, 0.0.into(), 0).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let events = EventBus::new();
        let sink = Arc::clone(&seen);
        events.subscribe(move |n| sink.lock().unwrap().push(n.clone()));

        let mut binder = KeyframeBinder::new(&m).with_events(events);
        binder.set_position(&m, 24);
        binder.set_position(&m, 25);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Notification::PositionReachedKeyframe {
                position: 25,
                at_keyframe: true,
                single_keyframe: true,
            }]
        );
    }

    #[test]
    fn test_leaving_a_keyframe_is_notified_once() {
        let mut m = model(100);
        m.add_or_update_keyframe(25, 0.0.into(), 0).unwrap();
        m.add_or_update_keyframe(60, 1.0.into(), 0).unwrap();

        let events = EventBus::new();
        let mut binder = KeyframeBinder::new(&m).with_events(events.clone());
        binder.set_position(&m, 25);
        binder.set_position(&m, 30);
        binder.set_position(&m, 35);

        assert_eq!(
            events.poll(),
            vec![
                Notification::PositionReachedKeyframe {
                    position: 25,
                    at_keyframe: true,
                    single_keyframe: false,
                },
                Notification::PositionReachedKeyframe {
                    position: 30,
                    at_keyframe: false,
                    single_keyframe: false,
                },
            ]
        );
    }

    #[test]
    fn test_duration_change_reclamps() {
        let mut m = model(100);
        m.add_or_update_keyframe(90, 0.0.into(), 0).unwrap();
        let mut binder = KeyframeBinder::new(&m);
        binder.set_position(&m, 90);

        let report = binder.set_duration(&mut m, 60);
        assert_eq!(report.position, 60);
        assert_eq!(m.duration(), 60);
        assert_eq!(m.keyframe_positions(0).unwrap(), vec![90]);
    }

    #[test]
    fn test_follows_model_range_changes() {
        let mut m = model(100);
        let mut binder = KeyframeBinder::new(&m);

        m.refresh(40);
        assert_eq!(binder.set_position(&m, 90).position, 40);

        m.refresh(200);
        assert_eq!(binder.set_position(&m, 150).position, 150);
    }

    #[test]
    fn test_edits_are_clamped_to_declared_range() {
        let mut m = model(100);
        let mut binder = KeyframeBinder::new(&m);
        binder.set_position(&m, 30);

        binder.commit_edit(&mut m, 0, 7.0.into()).unwrap();
        assert_eq!(m.interpolated_value(30, 0).unwrap(), ParamValue::Scalar(1.0));

        binder.commit_edit(&mut m, 0, (-3.0).into()).unwrap();
        assert_eq!(binder.binding(0).unwrap().value, ParamValue::Scalar(0.0));
    }
}
