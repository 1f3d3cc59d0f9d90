//! Versioned records and optimistic concurrency expectations.

/// A record with a stable identity and a store-maintained version.
///
/// Items and containers are both versioned: every committed change bumps the
/// version by one, which lets the store reject writes computed from a stale
/// snapshot.
pub trait AggregateRoot {
    /// Strongly-typed identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of committed changes. `0` means "never persisted".
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation attached to a store write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (imports overwrite unconditionally).
    Any,
    /// The record must not exist yet.
    Absent,
    /// Require the stored record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// `actual` is `None` when the record does not exist.
    pub fn matches(self, actual: Option<u64>) -> bool {
        match (self, actual) {
            (ExpectedVersion::Any, _) => true,
            (ExpectedVersion::Absent, None) => true,
            (ExpectedVersion::Absent, Some(_)) => false,
            (ExpectedVersion::Exact(v), Some(a)) => v == a,
            (ExpectedVersion::Exact(_), None) => false,
        }
    }

    /// Expectation matching a record read from the store.
    pub fn of<R: AggregateRoot>(record: &R) -> Self {
        match record.version() {
            0 => ExpectedVersion::Absent,
            v => ExpectedVersion::Exact(v),
        }
    }
}
