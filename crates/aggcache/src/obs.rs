//! Observability sink boundary.
//!
//! Sync logic MUST NOT depend on a concrete sink. All instrumentation flows
//! through [`SyncEvent`] and [`Sink`]; the default sink discards events, and
//! tests install a scoped capture sink via [`with_sink`].

use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn Sink>> = const { RefCell::new(None) };
}

///
/// SyncEvent
///

#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// A rule named an association the entity does not declare.
    RuleSkipped {
        entity_name: String,
        association: String,
    },
    /// Aggregates are being recomputed for one parent group.
    Recompute {
        entity_name: String,
        association: String,
    },
    /// The resolved parent no longer exists; the write was skipped.
    ParentMissing { target_entity: String },
    /// Cached fields were written to one parent record.
    CacheWrite {
        target_entity: String,
        fields: usize,
    },
}

///
/// Sink
///

pub trait Sink {
    fn record(&self, event: SyncEvent);
}

/// Default sink: discard. The synchronizer is a side effect of the host's
/// mutation path and must stay silent unless a sink is installed.
struct NullSink;

impl Sink for NullSink {
    fn record(&self, _event: SyncEvent) {}
}

pub(crate) fn emit(event: SyncEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // Preconditions:
        // - `ptr` was produced from a valid `&dyn Sink` in `with_sink`.
        // - `with_sink` always restores the previous pointer before
        //   returning, including unwind paths via `Guard::drop`.
        // - `emit` is synchronous and never stores `ptr` beyond this call.
        //
        // Aliasing:
        // - Only a shared reference is materialized, matching the shared
        //   borrow used to install the override.
        unsafe { (*ptr).record(event) };
    } else {
        NullSink.record(event);
    }
}

/// Run a closure with a temporary sink override.
pub fn with_sink<T>(sink: &dyn Sink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn Sink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY: only erases the trait-object lifetime; `Guard` removes the
    // pointer from the thread-local before `sink`'s borrow ends.
    let sink_ptr: *const (dyn Sink + 'static) = unsafe {
        std::mem::transmute::<*const (dyn Sink + '_), *const (dyn Sink + 'static)>(
            std::ptr::from_ref(sink),
        )
    };
    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(previous);

    f()
}

///
/// TESTS
///
