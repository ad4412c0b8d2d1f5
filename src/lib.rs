//! # Effect-Assets
//!
//! Effect catalogue and keyframe core for a non-linear video editor.
//!
//! This library indexes the effects available to the editor (engine built-ins
//! plus XML definition files), models per-parameter keyframes with linear
//! interpolation, and keeps parameter controls in step with the playback
//! position.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use effect_assets::{
//!     assets::AssetRegistry,
//!     config::Config,
//!     keyframes::{KeyframeModelList, ParamValue},
//!     params::{KeyframeBinder, ParamSchema},
//! };
//!
//! # fn main() -> effect_assets::Result<()> {
//! let config = Config::default();
//! let mut registry = AssetRegistry::new(Arc::new(config.catalog()), config.sources());
//! registry.initialize();
//!
//! let fade = registry.get("fade_from_black")?;
//! let schema = ParamSchema::from_asset(fade, &config.profile);
//! let mut model = KeyframeModelList::new(schema, 100);
//!
//! let mut binder = KeyframeBinder::new(&model);
//! binder.set_position(&model, 0);
//! binder.commit_edit(&mut model, 0, ParamValue::Scalar(0.0))?;
//! binder.set_position(&model, 25);
//! binder.commit_edit(&mut model, 0, ParamValue::Scalar(1.0))?;
//!
//! println!("{}", model.interpolated_value(12, 0)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`assets`] - Effect definition registry and XML definition parsing
//! - [`keyframes`] - Keyframe series and interpolation
//! - [`params`] - Parameter schemas and the position binder
//! - [`events`] - Change notifications
//! - [`config`] - Configuration management

pub mod assets;
pub mod config;
pub mod error;
pub mod events;
pub mod keyframes;
pub mod params;

// Re-export commonly used types for convenience
pub use crate::{
    assets::{AssetInfo, AssetKind, AssetRegistry, EngineCatalog},
    config::Config,
    error::{EffectsError, Result},
    events::{EventBus, Notification},
    keyframes::{KeyframeModelList, ParamValue, Rect},
    params::{KeyframeBinder, ParamSchema},
};
