//! Definition file parsing.
//!
//! A definition file either holds an `effectgroup` root (a composed effect that
//! is registered as one Custom asset) or one or more `effect` elements. Every
//! `effect` element is validated on its own and yields an [`ElementOutcome`],
//! so one broken element never hides its siblings.

use std::path::Path;
use tracing::debug;

use super::{
    catalog::{EngineCatalog, ServiceMetadata},
    types::{AssetInfo, AssetKind, AssetOrigin},
    xml::XmlElement,
};
use crate::error::{Result, XmlError};

pub const GROUP_TAG: &str = "effectgroup";
pub const EFFECT_TAG: &str = "effect";

/// Why an element was not registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Position of the element among the file's asset elements
    pub element_index: usize,
    pub reason: String,
}

/// Result of validating one asset element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementOutcome {
    Asset(AssetInfo),
    Skipped(Diagnostic),
}

impl ElementOutcome {
    pub fn asset(&self) -> Option<&AssetInfo> {
        match self {
            Self::Asset(info) => Some(info),
            Self::Skipped(_) => None,
        }
    }
}

/// Read and parse a definition file from disk
pub fn parse_definition_file(
    path: &Path,
    origin: AssetOrigin,
    catalog: &dyn EngineCatalog,
) -> Result<Vec<ElementOutcome>> {
    let content = std::fs::read_to_string(path)?;
    parse_definition(&content, origin, catalog)
}

/// Parse definition text.
///
/// Fails only when the document itself is unusable (malformed XML, or no
/// asset element at all). Per-element problems are reported as
/// [`ElementOutcome::Skipped`].
pub fn parse_definition(
    content: &str,
    origin: AssetOrigin,
    catalog: &dyn EngineCatalog,
) -> Result<Vec<ElementOutcome>> {
    let root = XmlElement::parse(content)?;

    if root.name == GROUP_TAG {
        return Ok(vec![parse_group(root, origin)]);
    }

    let elements: Vec<&XmlElement> = if root.name == EFFECT_TAG {
        vec![&root]
    } else {
        root.descendants_named(EFFECT_TAG)
    };

    if elements.is_empty() {
        return Err(XmlError::NoAssets.into());
    }

    Ok(elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| parse_effect(element, index, origin.clone(), catalog))
        .collect())
}

fn parse_group(root: XmlElement, origin: AssetOrigin) -> ElementOutcome {
    let tag = root.non_empty_attr("tag").unwrap_or_default().to_string();
    let id = root
        .non_empty_attr("id")
        .map(str::to_string)
        .unwrap_or_else(|| tag.clone());

    if id.is_empty() {
        return ElementOutcome::Skipped(Diagnostic {
            element_index: 0,
            reason: "effect group declares neither 'id' nor 'tag'".to_string(),
        });
    }

    let display_name = root
        .non_empty_attr("name")
        .or_else(|| root.child_text("name"))
        .unwrap_or(id.as_str())
        .to_string();
    let description = root.child_text("description").map(str::to_string);

    ElementOutcome::Asset(AssetInfo {
        id,
        service: tag,
        display_name,
        description,
        kind: AssetKind::Custom,
        xml: root,
        origin,
    })
}

fn parse_effect(
    element: &XmlElement,
    index: usize,
    origin: AssetOrigin,
    catalog: &dyn EngineCatalog,
) -> ElementOutcome {
    let Some(tag) = element.non_empty_attr("tag") else {
        return ElementOutcome::Skipped(Diagnostic {
            element_index: index,
            reason: "missing required attribute 'tag'".to_string(),
        });
    };

    let id = element.non_empty_attr("id").unwrap_or(tag).to_string();
    let display_name = element
        .child_text("name")
        .or_else(|| element.non_empty_attr("name"))
        .unwrap_or(id.as_str())
        .to_string();
    let description = element.child_text("description").map(str::to_string);
    let kind = classify(element, catalog);

    debug!("Parsed effect '{}' (service {}, {})", id, tag, kind);

    ElementOutcome::Asset(AssetInfo {
        id,
        service: tag.to_string(),
        display_name,
        description,
        kind,
        xml: element.clone(),
        origin,
    })
}

/// Resolve an element's kind: explicit `type` attribute, then engine
/// metadata for its service, then Video.
pub fn classify(element: &XmlElement, catalog: &dyn EngineCatalog) -> AssetKind {
    if let Some(kind) = element.attr("type").and_then(AssetKind::from_type_attr) {
        return kind;
    }

    element
        .attr("tag")
        .and_then(|tag| catalog.metadata(tag))
        .map(|meta| kind_from_metadata(&meta))
        .unwrap_or(AssetKind::Video)
}

pub fn kind_from_metadata(meta: &ServiceMetadata) -> AssetKind {
    if meta.is_audio() {
        AssetKind::Audio
    } else {
        AssetKind::Video
    }
}

/// Build the registry entry for an engine-provided service
pub fn builtin_asset(meta: &ServiceMetadata) -> AssetInfo {
    let kind = kind_from_metadata(meta);
    let display_name = meta.title.clone().unwrap_or_else(|| meta.name.clone());

    let mut xml = XmlElement::new(EFFECT_TAG)
        .with_attr("tag", meta.name.as_str())
        .with_attr("id", meta.name.as_str())
        .with_attr("type", kind.as_str())
        .with_child(XmlElement::new("name").with_text(display_name.as_str()));
    if let Some(description) = &meta.description {
        xml = xml.with_child(XmlElement::new("description").with_text(description.as_str()));
    }

    AssetInfo {
        id: meta.name.clone(),
        service: meta.name.clone(),
        display_name,
        description: meta.description.clone(),
        kind,
        xml,
        origin: AssetOrigin::Builtin,
    }
}
