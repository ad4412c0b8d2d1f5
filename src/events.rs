//! # Change Notifications
//!
//! The registry and the keyframe model publish notifications on an [`EventBus`].
//! Subscribers are invoked synchronously from `emit`, and every notification is
//! also queued so a UI loop can drain them in batches with [`EventBus::poll`].

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Notifications produced by the effects core
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Registry contents changed (initialization or single-file reload)
    AssetListUpdated { ids: Vec<String> },

    /// Favorite ids that no longer resolve were removed from the favorites store
    FavoritesPurged { removed: Vec<String> },

    /// A keyframe was added, overwritten or removed
    KeyframeModified { param: usize, position: i64 },

    /// The tracked position landed on (or left) a keyframe. `single_keyframe`
    /// is set when every keyed bound parameter holds exactly one keyframe.
    PositionReachedKeyframe {
        position: i64,
        at_keyframe: bool,
        single_keyframe: bool,
    },
}

type Callback = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Pub/sub bus with a deferred queue.
///
/// Cloning the bus yields another handle onto the same subscribers and queue.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Callback>>>,
    queue: Arc<Mutex<Vec<Notification>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queued", &self.lock_queue().len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every emitted notification
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut subs = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subs.push(Arc::new(callback));
    }

    /// Invoke subscribers, then queue the notification for `poll`
    pub fn emit(&self, notification: Notification) {
        {
            let subs = self
                .subscribers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for cb in subs.iter() {
                cb(&notification);
            }
        }
        self.lock_queue().push(notification);
    }

    /// Drain every notification emitted since the last poll
    pub fn poll(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock_queue())
    }

    /// Number of queued notifications
    pub fn pending(&self) -> usize {
        self.lock_queue().len()
    }

    fn lock_queue(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_subscribers_and_queue() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        bus.subscribe(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(Notification::KeyframeModified { param: 0, position: 3 });
        bus.emit(Notification::AssetListUpdated { ids: vec!["blur".into()] });

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(bus.pending(), 2);

        let drained = bus.poll();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Notification::KeyframeModified { param: 0, position: 3 });
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn test_clones_share_queue() {
        let bus = EventBus::new();
        let other = bus.clone();
        other.emit(Notification::FavoritesPurged { removed: vec!["gone".into()] });
        assert_eq!(bus.poll().len(), 1);
    }
}
