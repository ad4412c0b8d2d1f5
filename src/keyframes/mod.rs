//! # Keyframe Model
//!
//! Per-parameter keyframe series with linear interpolation. Scalars blend
//! directly; rectangles blend component-wise. Outside the keyed range the
//! nearest boundary sample holds.

pub mod model;
pub mod series;
pub mod value;

pub use model::KeyframeModelList;
pub use series::KeyframeSeries;
pub use value::{Lerp, ParamValue, Rect, ValueKind};
