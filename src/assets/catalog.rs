use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata the engine reports for one of its services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    /// Service name as known by the engine
    pub name: String,

    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Classification tags; the first tag "Audio" marks an audio filter
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ServiceMetadata {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn is_audio(&self) -> bool {
        self.tags.first().map(|t| t == "Audio").unwrap_or(false)
    }
}

/// The multimedia engine's filter registry, as seen by the asset registry
pub trait EngineCatalog: Send + Sync {
    /// All filter service names the engine provides
    fn services(&self) -> Vec<String>;

    /// Metadata for one service, if the engine knows it
    fn metadata(&self, service: &str) -> Option<ServiceMetadata>;

    /// Whether the engine itself provides the given service
    fn has_service(&self, service: &str) -> bool {
        self.services().iter().any(|s| s == service)
    }
}

/// In-memory catalog, typically filled from the `[engine]` config section
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    services: BTreeMap<String, ServiceMetadata>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_services<I>(services: I) -> Self
    where
        I: IntoIterator<Item = ServiceMetadata>,
    {
        let mut catalog = Self::new();
        for service in services {
            catalog.insert(service);
        }
        catalog
    }

    pub fn insert(&mut self, service: ServiceMetadata) {
        self.services.insert(service.name.clone(), service);
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl EngineCatalog for StaticCatalog {
    fn services(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    fn metadata(&self, service: &str) -> Option<ServiceMetadata> {
        self.services.get(service).cloned()
    }

    fn has_service(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_catalog_lookup() {
        let catalog = StaticCatalog::from_services(vec![
            ServiceMetadata::new("volume").with_tag("Audio"),
            ServiceMetadata::new("brightness").with_title("Brightness").with_tag("Video"),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.services(), vec!["brightness", "volume"]);
        assert!(catalog.has_service("volume"));
        assert!(!catalog.has_service("sepia"));
        assert!(catalog.metadata("volume").unwrap().is_audio());
        assert!(!catalog.metadata("brightness").unwrap().is_audio());
    }

    #[test]
    fn test_audio_tag_must_come_first() {
        let meta = ServiceMetadata::new("mix").with_tag("Video").with_tag("Audio");
        assert!(!meta.is_audio());
    }
}
