use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    catalog::EngineCatalog,
    parser::{builtin_asset, parse_definition_file, ElementOutcome},
    types::{AssetInfo, AssetKind, AssetOrigin, AssetRef},
};
use crate::{
    error::{RegistryError, Result},
    events::{EventBus, Notification},
};

/// Ordered definition sources, lowest precedence first
#[derive(Debug, Clone, Default)]
pub struct AssetSources {
    /// Directories shipped with the application
    pub bundled_dirs: Vec<PathBuf>,

    /// Per-user directories; these override everything else
    pub user_dirs: Vec<PathBuf>,

    /// File listing engine services that must not be exposed
    pub blacklist: Option<PathBuf>,
}

/// Holder of the persisted favorite effect list
pub trait FavoriteStore {
    fn favorites(&self) -> Vec<String>;
    fn set_favorites(&mut self, favorites: Vec<String>);
}

/// Counters gathered while building the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitSummary {
    pub builtins: usize,
    pub files_loaded: usize,
    pub files_rejected: usize,
    pub elements_skipped: usize,
    pub overrides: usize,
}

/// Registry of effect definitions keyed by asset id
///
/// The mapping is filled from engine built-ins, then bundled definition
/// directories, then user directories. A later registration with an existing
/// id replaces the earlier entry entirely.
pub struct AssetRegistry {
    assets: HashMap<String, AssetInfo>,
    catalog: Arc<dyn EngineCatalog>,
    sources: AssetSources,
    events: EventBus,
    initialized: bool,
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("assets", &self.assets.len())
            .field("sources", &self.sources)
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl AssetRegistry {
    /// Create an empty, uninitialized registry
    pub fn new(catalog: Arc<dyn EngineCatalog>, sources: AssetSources) -> Self {
        Self {
            assets: HashMap::new(),
            catalog,
            sources,
            events: EventBus::new(),
            initialized: false,
        }
    }

    /// Publish notifications on an existing bus instead of a private one
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Build the registry from all sources.
    ///
    /// Only the first call does any work; later calls return an empty summary.
    /// Unreadable or malformed definitions are logged and skipped.
    pub fn initialize(&mut self) -> InitSummary {
        let mut summary = InitSummary::default();
        if self.initialized {
            debug!("Asset registry already initialized");
            return summary;
        }

        info!("Building asset registry");

        let blacklist = self.load_blacklist();
        for service in self.catalog.services() {
            if blacklist.contains(&service) {
                debug!("Skipping blacklisted engine service: {}", service);
                continue;
            }
            let Some(meta) = self.catalog.metadata(&service) else {
                warn!("Engine service {} has no metadata, skipping", service);
                continue;
            };
            if self.register(builtin_asset(&meta)) {
                summary.overrides += 1;
            }
            summary.builtins += 1;
        }

        let bundled = self.sources.bundled_dirs.clone();
        for dir in &bundled {
            self.load_directory(dir, AssetOrigin::Bundled, &mut summary);
        }
        let user = self.sources.user_dirs.clone();
        for dir in &user {
            self.load_directory(dir, AssetOrigin::User, &mut summary);
        }

        self.initialized = true;

        info!(
            "Asset registry ready: {} assets ({} builtin, {} files, {} rejected, {} skipped elements, {} overrides)",
            self.assets.len(),
            summary.builtins,
            summary.files_loaded,
            summary.files_rejected,
            summary.elements_skipped,
            summary.overrides
        );

        self.events.emit(Notification::AssetListUpdated { ids: self.ids() });
        summary
    }

    fn load_blacklist(&self) -> HashSet<String> {
        let Some(path) = &self.sources.blacklist else {
            return HashSet::new();
        };

        match std::fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                warn!("Could not read effect blacklist {:?}: {}", path, e);
                HashSet::new()
            }
        }
    }

    fn load_directory<F>(&mut self, directory: &Path, origin: F, summary: &mut InitSummary)
    where
        F: Fn(PathBuf) -> AssetOrigin,
    {
        if !directory.is_dir() {
            debug!("Definition directory {:?} does not exist, skipping", directory);
            return;
        }

        let entries = match std::fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not scan definition directory {:?}: {}", directory, e);
                return;
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Self::is_definition_file(path))
            .collect();
        files.sort();

        debug!("Scanning {} definition files in {:?}", files.len(), directory);

        for path in files {
            match self.load_file(&path, origin(path.clone())) {
                Ok(loaded) => {
                    summary.files_loaded += 1;
                    summary.elements_skipped += loaded.skipped;
                    summary.overrides += loaded.overrides;
                }
                Err(e) => {
                    warn!("Skipping definition file {:?}: {}", path, e);
                    summary.files_rejected += 1;
                }
            }
        }
    }

    pub fn is_definition_file<P: AsRef<Path>>(path: P) -> bool {
        matches!(
            path.as_ref().extension().and_then(|ext| ext.to_str()),
            Some(ext) if ext.eq_ignore_ascii_case("xml")
        )
    }

    /// Parse one file and register every valid asset it declares
    fn load_file(&mut self, path: &Path, origin: AssetOrigin) -> Result<LoadedFile> {
        let outcomes = parse_definition_file(path, origin, self.catalog.as_ref())?;

        let mut loaded = LoadedFile::default();
        let mut seen_in_file = HashSet::new();

        for outcome in outcomes {
            match outcome {
                ElementOutcome::Asset(info) => {
                    if !seen_in_file.insert(info.id.clone()) {
                        warn!(
                            "Duplicate definition of effect {} in {:?}, only the last one is kept",
                            info.id, path
                        );
                    }
                    let asset_ref = AssetRef::from(&info);
                    if self.register(info) {
                        loaded.overrides += 1;
                    }
                    loaded.assets.push(asset_ref);
                }
                ElementOutcome::Skipped(diag) => {
                    warn!(
                        "Skipping effect #{} in {:?}: {}",
                        diag.element_index, path, diag.reason
                    );
                    loaded.skipped += 1;
                }
            }
        }

        Ok(loaded)
    }

    /// Insert or replace an entry. Returns true when an existing entry was replaced.
    fn register(&mut self, info: AssetInfo) -> bool {
        let id = info.id.clone();
        match self.assets.insert(id, info) {
            Some(previous) => {
                debug!(
                    "Effect {} from {} overrides {} definition",
                    previous.id,
                    self.assets[&previous.id].origin.label(),
                    previous.origin.label()
                );
                true
            }
            None => false,
        }
    }

    /// Re-read one definition file and replace the entries it declares.
    ///
    /// Returns the id and service of the last asset in the file, or `None` when
    /// the file yields nothing usable.
    pub fn reload_single<P: AsRef<Path>>(&mut self, path: P) -> Option<AssetRef> {
        let path = path.as_ref();
        let origin = self.origin_for(path);

        match self.load_file(path, origin) {
            Ok(loaded) => {
                let last = loaded.assets.last().cloned();
                match &last {
                    Some(asset) => {
                        info!("Reloaded effect {} ({}) from {:?}", asset.id, asset.service, path);
                        self.events.emit(Notification::AssetListUpdated {
                            ids: loaded.assets.iter().map(|a| a.id.clone()).collect(),
                        });
                    }
                    None => warn!("Definition file {:?} declares no usable effect", path),
                }
                last
            }
            Err(e) => {
                warn!("Could not reload definition file {:?}: {}", path, e);
                None
            }
        }
    }

    fn origin_for(&self, path: &Path) -> AssetOrigin {
        if self.sources.bundled_dirs.iter().any(|dir| path.starts_with(dir)) {
            AssetOrigin::Bundled(path.to_path_buf())
        } else {
            AssetOrigin::User(path.to_path_buf())
        }
    }

    /// Drop favorites that do not resolve to a registered asset.
    ///
    /// The store is rewritten only when something was removed, and a single
    /// `FavoritesPurged` notification is emitted in that case.
    pub fn purge_invalid_favorites(&self, store: &mut dyn FavoriteStore) -> Vec<String> {
        let favorites = store.favorites();
        let (valid, invalid): (Vec<String>, Vec<String>) =
            favorites.into_iter().partition(|id| self.exists(id));

        if !invalid.is_empty() {
            warn!(
                "Some of your favorite effects are invalid and were removed: {}",
                invalid.join(",")
            );
            store.set_favorites(valid);
            self.events.emit(Notification::FavoritesPurged {
                removed: invalid.clone(),
            });
        }

        invalid
    }

    pub fn exists(&self, id: &str) -> bool {
        self.assets.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<&AssetInfo> {
        self.assets.get(id).ok_or_else(|| {
            RegistryError::NotFound { id: id.to_string() }.into()
        })
    }

    /// Engine service name for an asset id
    pub fn service_name(&self, id: &str) -> Result<&str> {
        self.get(id).map(|info| info.service.as_str())
    }

    /// Whether the engine itself provides a service of this name
    pub fn has_internal(&self, service: &str) -> bool {
        self.catalog.has_service(service)
    }

    /// Assets sorted by display name, optionally restricted to one kind
    pub fn list(&self, kind: Option<AssetKind>) -> Vec<&AssetInfo> {
        let mut assets: Vec<&AssetInfo> = self
            .assets
            .values()
            .filter(|info| kind.map_or(true, |k| info.kind == k))
            .collect();
        assets.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        assets
    }

    /// All registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.assets.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[derive(Debug, Default)]
struct LoadedFile {
    assets: Vec<AssetRef>,
    skipped: usize,
    overrides: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::catalog::{ServiceMetadata, StaticCatalog};
    use std::fs;
    use tempfile::tempdir;

    fn catalog() -> Arc<dyn EngineCatalog> {
        Arc::new(StaticCatalog::from_services(vec![
            ServiceMetadata::new("brightness").with_title("Brightness"),
            ServiceMetadata::new("volume").with_title("Volume").with_tag("Audio"),
            ServiceMetadata::new("debug_grid").with_title("Debug Grid"),
        ]))
    }

    struct VecFavorites(Vec<String>);

    impl FavoriteStore for VecFavorites {
        fn favorites(&self) -> Vec<String> {
            self.0.clone()
        }

        fn set_favorites(&mut self, favorites: Vec<String>) {
            self.0 = favorites;
        }
    }

    #[test]
    fn test_builtins_registered() {
        let mut registry = AssetRegistry::new(catalog(), AssetSources::default());
        let summary = registry.initialize();

        assert_eq!(summary.builtins, 3);
        assert!(registry.exists("brightness"));
        assert_eq!(registry.get("volume").unwrap().kind, AssetKind::Audio);
        assert_eq!(registry.get("brightness").unwrap().origin, AssetOrigin::Builtin);
        assert!(!registry.exists("sepia"));
        assert!(registry.get("sepia").unwrap_err().is_not_found());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut registry = AssetRegistry::new(catalog(), AssetSources::default());
        registry.initialize();
        let second = registry.initialize();
        assert_eq!(second, InitSummary::default());
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.events().poll().len(), 1);
    }

    #[test]
    fn test_blacklisted_builtins_are_hidden() {
        let dir = tempdir().unwrap();
        let blacklist = dir.path().join("blacklist.txt");
        fs::write(&blacklist, "# internal only\ndebug_grid\n\n").unwrap();

        let sources = AssetSources {
            blacklist: Some(blacklist),
            ..AssetSources::default()
        };
        let mut registry = AssetRegistry::new(catalog(), sources);
        registry.initialize();

        assert!(!registry.exists("debug_grid"));
        assert!(registry.has_internal("debug_grid"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_precedence_user_over_bundled_over_builtin() {
        let bundled = tempdir().unwrap();
        let user = tempdir().unwrap();

        fs::write(
            bundled.path().join("brightness.xml"),
            r#"<effect tag="brightness" id="brightness" name="Bundled Brightness">
                 <description>bundled</description>
               </effect>"#,
        )
        .unwrap();
        fs::write(
            user.path().join("brightness.xml"),
            r#"<effect tag="frei0r.brightness" id="brightness" type="hidden" name="My Brightness"/>"#,
        )
        .unwrap();

        let sources = AssetSources {
            bundled_dirs: vec![bundled.path().to_path_buf()],
            user_dirs: vec![user.path().to_path_buf()],
            blacklist: None,
        };
        let mut registry = AssetRegistry::new(catalog(), sources);
        let summary = registry.initialize();

        let info = registry.get("brightness").unwrap();
        assert_eq!(info.display_name, "My Brightness");
        assert_eq!(info.service, "frei0r.brightness");
        assert_eq!(info.kind, AssetKind::Hidden);
        // Replaced wholesale: the bundled description is gone
        assert_eq!(info.description, None);
        assert!(matches!(info.origin, AssetOrigin::User(_)));
        assert_eq!(summary.overrides, 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_broken_files_do_not_stop_the_scan() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a_broken.xml"), "<effect tag=\"x\"").unwrap();
        fs::write(dir.path().join("b_empty.xml"), "<effects></effects>").unwrap();
        fs::write(
            dir.path().join("c_good.xml"),
            r#"<effects><effect tag="sepia"/><effect name="no tag"/></effects>"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a definition").unwrap();

        let sources = AssetSources {
            user_dirs: vec![dir.path().to_path_buf()],
            ..AssetSources::default()
        };
        let mut registry = AssetRegistry::new(catalog(), sources);
        let summary = registry.initialize();

        assert_eq!(summary.files_rejected, 2);
        assert_eq!(summary.files_loaded, 1);
        assert_eq!(summary.elements_skipped, 1);
        assert!(registry.exists("sepia"));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_duplicate_ids_in_one_file_keep_last() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("dupes.xml"),
            r#"<effects>
                 <effect tag="glow" id="glow" name="First"/>
                 <effect tag="glow2" id="glow" name="Second"/>
               </effects>"#,
        )
        .unwrap();

        let sources = AssetSources {
            user_dirs: vec![dir.path().to_path_buf()],
            ..AssetSources::default()
        };
        let mut registry = AssetRegistry::new(catalog(), sources);
        registry.initialize();

        let glow = registry.get("glow").unwrap();
        assert_eq!(glow.display_name, "Second");
        assert_eq!(registry.service_name("glow").unwrap(), "glow2");
    }

    #[test]
    fn test_reload_single_replaces_and_reports_last() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("custom.xml");
        fs::write(&file, r#"<effect tag="blur" id="soft" name="Soft"/>"#).unwrap();

        let sources = AssetSources {
            user_dirs: vec![dir.path().to_path_buf()],
            ..AssetSources::default()
        };
        let mut registry = AssetRegistry::new(catalog(), sources);
        registry.initialize();
        registry.events().poll();
        assert_eq!(registry.get("soft").unwrap().display_name, "Soft");

        fs::write(
            &file,
            r#"<effects>
                 <effect tag="blur" id="soft" name="Softer"/>
                 <effect tag="gblur" id="softest"/>
               </effects>"#,
        )
        .unwrap();

        let reloaded = registry.reload_single(&file).unwrap();
        assert_eq!(reloaded, AssetRef { id: "softest".into(), service: "gblur".into() });
        assert_eq!(registry.get("soft").unwrap().display_name, "Softer");
        assert!(registry.exists("brightness"));

        let events = registry.events().poll();
        assert_eq!(
            events,
            vec![Notification::AssetListUpdated {
                ids: vec!["soft".into(), "softest".into()]
            }]
        );
    }

    #[test]
    fn test_reload_of_unusable_file_keeps_registry() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bad.xml");
        fs::write(&file, "<effects/>").unwrap();

        let mut registry = AssetRegistry::new(catalog(), AssetSources::default());
        registry.initialize();

        assert!(registry.reload_single(&file).is_none());
        assert!(registry.reload_single(dir.path().join("missing.xml")).is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_invalid_favorites_purged_once() {
        let mut registry = AssetRegistry::new(catalog(), AssetSources::default());
        registry.initialize();
        registry.events().poll();

        let mut store = VecFavorites(vec![
            "brightness".into(),
            "gone".into(),
            "volume".into(),
            "also_gone".into(),
        ]);

        let removed = registry.purge_invalid_favorites(&mut store);
        assert_eq!(removed, vec!["gone".to_string(), "also_gone".to_string()]);
        assert_eq!(store.0, vec!["brightness".to_string(), "volume".to_string()]);

        let again = registry.purge_invalid_favorites(&mut store);
        assert!(again.is_empty());

        let events = registry.events().poll();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Notification::FavoritesPurged { .. }));
    }

    #[test]
    fn test_list_filters_by_kind() {
        let mut registry = AssetRegistry::new(catalog(), AssetSources::default());
        registry.initialize();

        let audio = registry.list(Some(AssetKind::Audio));
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].id, "volume");

        let names: Vec<_> = registry.list(None).iter().map(|a| a.display_name.clone()).collect();
        assert_eq!(names, vec!["Brightness", "Debug Grid", "Volume"]);
    }
}
