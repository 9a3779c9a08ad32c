//! # Shared World Access
//!
//! A [`World`] is single-threaded: queries borrow it and structural changes
//! need `&mut`. [`SharedWorld`] hands one world to several threads behind a
//! mutex, one caller at a time.
//!
//! ```text
//! Thread 1 (simulation):  lock -> spawn / add / remove -> unlock
//! Thread 2 (tools):       lock -> query -> unlock
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::ecs::World;

/// Cloneable, thread-safe handle to one world.
///
/// # Example
///
/// ```rust
/// use cairn_core::{ComponentRegistry, SharedWorld, World};
///
/// let shared = SharedWorld::new(World::new(ComponentRegistry::new()));
/// let handle = shared.clone();
///
/// std::thread::spawn(move || {
///     handle.with(|world| {
///         world.spawn();
///     });
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(shared.lock().entity_count(), 1);
/// ```
#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
}

impl SharedWorld {
    /// Wraps `world` for shared access.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// Blocks until the world is free and locks it.
    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.inner.lock()
    }

    /// Locks the world if no one else holds it.
    #[must_use]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, World>> {
        self.inner.try_lock()
    }

    /// Runs `f` with exclusive access to the world.
    pub fn with<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        let mut world = self.inner.lock();
        trace!("shared world locked");
        f(&mut world)
    }

    /// Number of handles to this world.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
