//! The process-wide default technology.
//!
//! Generators called without an explicit technology use
//! [`default_technology`]. The slot is replaced wholesale by
//! [`set_default_technology`]; [`with_technology`] and [`ScopedTechnology`]
//! override it for the current thread only, so unrelated threads never see
//! each other's overrides.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::{Technology, TechnologyParams};

static DEFAULT: RwLock<Option<Arc<Technology>>> = RwLock::new(None);

static NEXT_GUARD: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static OVERRIDES: RefCell<Vec<(u64, Arc<Technology>)>> = const { RefCell::new(Vec::new()) };
}

/// Returns the technology in effect for the current thread.
///
/// Resolution order: innermost scoped override, installed default, then a
/// freshly built LNOI400 technology with default parameters.
#[must_use]
pub fn default_technology() -> Arc<Technology> {
    if let Some(tech) = OVERRIDES.with(|o| o.borrow().last().map(|(_, tech)| Arc::clone(tech))) {
        return tech;
    }
    if let Some(tech) = DEFAULT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Arc::clone(tech);
    }

    let mut slot = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(slot.get_or_insert_with(|| {
        debug!("installing LNOI400 technology with default parameters");
        Arc::new(built_in())
    }))
}

/// Installs `tech` as the process-wide default, returning the previous one.
pub fn set_default_technology(tech: Arc<Technology>) -> Option<Arc<Technology>> {
    debug!(name = tech.name(), "setting default technology");
    DEFAULT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(tech)
}

/// Runs `f` with `tech` as this thread's default technology.
pub fn with_technology<R>(tech: Arc<Technology>, f: impl FnOnce() -> R) -> R {
    let _guard = ScopedTechnology::new(tech);
    f()
}

/// Guard overriding this thread's default technology until dropped.
///
/// Guards nest; the most recently created live guard wins. Dropping a
/// guard removes only its own override, in whatever order guards go away.
#[derive(Debug)]
#[must_use = "the override ends when the guard is dropped"]
pub struct ScopedTechnology {
    id: u64,
}

impl ScopedTechnology {
    /// Pushes `tech` as the current thread's override.
    pub fn new(tech: Arc<Technology>) -> Self {
        let id = NEXT_GUARD.fetch_add(1, Ordering::Relaxed);
        OVERRIDES.with(|o| o.borrow_mut().push((id, tech)));
        Self { id }
    }
}

impl Drop for ScopedTechnology {
    fn drop(&mut self) {
        OVERRIDES.with(|o| {
            let mut stack = o.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|(id, _)| *id == self.id) {
                stack.remove(pos);
            }
        });
    }
}

fn built_in() -> Technology {
    match TechnologyParams::default().build() {
        Ok(tech) => tech,
        // Default parameters are covered by unit tests.
        Err(e) => unreachable!("default technology parameters are invalid: {e}"),
    }
}
