use chrono::{FixedOffset, Offset, Utc};

use super::switches;

/// Context passed into every bind/read call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingOptions {
    /// Host temporal bounds <-> provider infinity sentinels.
    pub infinity_aliasing: bool,
    /// Offset-preserving `timestamptz` writes, session-offset reads.
    pub legacy_timestamps: bool,
    /// Session time zone used by legacy timestamp mode.
    pub session_offset: FixedOffset,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            infinity_aliasing: true,
            legacy_timestamps: false,
            session_offset: utc(),
        }
    }
}

impl MappingOptions {
    /// Snapshot the process-wide switches now. Session offset is UTC.
    pub fn current() -> Self {
        let s = switches::snapshot();
        Self {
            infinity_aliasing: s.infinity_conversions,
            legacy_timestamps: s.legacy_timestamp_behavior,
            session_offset: utc(),
        }
    }

    pub fn with_infinity_aliasing(mut self, enabled: bool) -> Self {
        self.infinity_aliasing = enabled;
        self
    }

    pub fn with_legacy_timestamps(mut self, enabled: bool) -> Self {
        self.legacy_timestamps = enabled;
        self
    }

    pub fn with_session_offset(mut self, offset: FixedOffset) -> Self {
        self.session_offset = offset;
        self
    }
}

pub(crate) fn utc() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = MappingOptions::default();
        assert!(opts.infinity_aliasing);
        assert!(!opts.legacy_timestamps);
        assert_eq!(opts.session_offset.local_minus_utc(), 0);
    }

    #[test]
    fn test_builders() {
        let plus2 = FixedOffset::east_opt(7200).unwrap();
        let opts = MappingOptions::default()
            .with_infinity_aliasing(false)
            .with_legacy_timestamps(true)
            .with_session_offset(plus2);
        assert!(!opts.infinity_aliasing);
        assert!(opts.legacy_timestamps);
        assert_eq!(opts.session_offset, plus2);
    }
}
