//! # Asset Metadata Registry
//!
//! Indexes effect definitions from the engine's own service list, bundled
//! definition files and user definition files, in that order of precedence.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use effect_assets::assets::{AssetRegistry, AssetSources, StaticCatalog};
//!
//! let sources = AssetSources {
//!     bundled_dirs: vec!["data/effects".into()],
//!     ..AssetSources::default()
//! };
//! let mut registry = AssetRegistry::new(Arc::new(StaticCatalog::new()), sources);
//! registry.initialize();
//!
//! if registry.exists("fade_from_black") {
//!     let info = registry.get("fade_from_black").unwrap();
//!     println!("{} -> {}", info.display_name, info.service);
//! }
//! ```

pub mod catalog;
pub mod global;
pub mod parser;
pub mod registry;
pub mod types;
pub mod xml;

pub use catalog::{EngineCatalog, ServiceMetadata, StaticCatalog};
pub use parser::{Diagnostic, ElementOutcome};
pub use registry::{AssetRegistry, AssetSources, FavoriteStore, InitSummary};
pub use types::{AssetInfo, AssetKind, AssetOrigin, AssetRef};
pub use xml::XmlElement;
