//! Process-wide registry instance.
//!
//! The registry is built at most once per process, on first use. The
//! `OnceCell` is the initialization gate; the `Mutex` only exists because a
//! `static` must be `Sync`, and all registry work happens on one logic thread.

use once_cell::sync::OnceCell;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::registry::AssetRegistry;

static REGISTRY: OnceCell<Mutex<AssetRegistry>> = OnceCell::new();

/// Return the shared registry, building and initializing it with `build` if
/// this is the first call. Later callers get the existing instance and their
/// `build` closure is never run.
pub fn get_or_init<F>(build: F) -> &'static Mutex<AssetRegistry>
where
    F: FnOnce() -> AssetRegistry,
{
    REGISTRY.get_or_init(|| {
        debug!("Creating process-wide asset registry");
        let mut registry = build();
        registry.initialize();
        Mutex::new(registry)
    })
}

/// The shared registry, if it has been created
pub fn get() -> Option<&'static Mutex<AssetRegistry>> {
    REGISTRY.get()
}

/// Lock the shared registry. Poisoning is ignored: registry mutations never
/// leave the map half-written.
pub fn lock(registry: &'static Mutex<AssetRegistry>) -> MutexGuard<'static, AssetRegistry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::catalog::{ServiceMetadata, StaticCatalog};
    use crate::assets::registry::AssetSources;
    use std::sync::Arc;

    #[test]
    fn test_built_exactly_once() {
        let first = get_or_init(|| {
            let catalog = StaticCatalog::from_services(vec![ServiceMetadata::new("brightness")]);
            AssetRegistry::new(Arc::new(catalog), AssetSources::default())
        });

        let second = get_or_init(|| panic!("registry must not be rebuilt"));
        assert!(std::ptr::eq(first, second));
        assert!(get().is_some());

        let registry = lock(first);
        assert!(registry.is_initialized());
        assert!(registry.exists("brightness"));
    }
}
