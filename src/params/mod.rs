//! # Parameter Binding
//!
//! Parameter schemas read from effect definitions, and the binder that keeps
//! per-parameter controls in step with the keyframe model as the playback
//! position moves.

pub mod binding;
pub mod schema;

pub use binding::{BindingReport, BindingState, KeyframeBinder, ParameterBinding, PositionReport};
pub use schema::{ParamDef, ParamSchema, ParamType};
