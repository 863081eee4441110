//! Process-wide type-mapping switches.
//!
//! Two flags the hosting application may flip before running affected
//! operations. They are read fresh by [`snapshot`] on every call that asks
//! for them; nothing caches a previous state.
//!
//! Tests that toggle these flags must not run concurrently with other tests
//! that read them. Code that needs deterministic behavior should build a
//! [`MappingOptions`](super::MappingOptions) explicitly instead.

use std::sync::atomic::{AtomicBool, Ordering};

static INFINITY_CONVERSIONS: AtomicBool = AtomicBool::new(true);
static LEGACY_TIMESTAMP_BEHAVIOR: AtomicBool = AtomicBool::new(false);

/// State of both switches at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switches {
    pub infinity_conversions: bool,
    pub legacy_timestamp_behavior: bool,
}

/// Read both switches.
pub fn snapshot() -> Switches {
    Switches {
        infinity_conversions: INFINITY_CONVERSIONS.load(Ordering::SeqCst),
        legacy_timestamp_behavior: LEGACY_TIMESTAMP_BEHAVIOR.load(Ordering::SeqCst),
    }
}

/// Map host temporal bounds to provider `infinity` sentinels.
pub fn set_infinity_conversions(enabled: bool) {
    INFINITY_CONVERSIONS.store(enabled, Ordering::SeqCst);
    tracing::debug!(enabled, "infinity conversions switch set");
}

/// Write `timestamptz` values with their own offset instead of as UTC.
pub fn set_legacy_timestamp_behavior(enabled: bool) {
    LEGACY_TIMESTAMP_BEHAVIOR.store(enabled, Ordering::SeqCst);
    tracing::debug!(enabled, "legacy timestamp behavior switch set");
}
