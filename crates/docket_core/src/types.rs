//! Core type definitions for Docket.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of an entity as confirmed by the remote store.
///
/// Versions are strictly increasing: every successful remote mutation
/// yields a higher version than the one it was based on. An entity in the
/// record store carries either the last confirmed version or the version
/// an in-flight optimistic write was based on, never an invented one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    /// The version of an entity that has never been confirmed remotely.
    pub const INITIAL: Version = Version(0);

    /// Creates a version from a raw value.
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next version.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A point in time, in milliseconds since the Unix epoch.
///
/// Timestamps on entities are assigned by the remote store; the core never
/// reads a local clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Creates a timestamp from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the raw epoch-millisecond value.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        let v1 = Version::new(1);
        let v2 = Version::new(2);
        assert!(v1 < v2);
    }

    #[test]
    fn version_next() {
        let v = Version::new(5);
        assert_eq!(v.next().as_u64(), 6);
    }

    #[test]
    fn initial_version_is_zero() {
        assert_eq!(Version::INITIAL.as_u64(), 0);
    }

    #[test]
    fn timestamp_ordering() {
        let earlier = Timestamp::from_millis(1_000);
        let later = Timestamp::from_millis(2_000);
        assert!(earlier < later);
    }

    #[test]
    fn display_forms() {
        assert_eq!(format!("{}", Version::new(42)), "v42");
        assert_eq!(format!("{}", Timestamp::from_millis(7)), "t7");
    }

    #[test]
    fn version_serde_transparent() {
        let json = serde_json::to_string(&Version::new(3)).unwrap();
        assert_eq!(json, "3");
        let back: Version = serde_json::from_str("3").unwrap();
        assert_eq!(back, Version::new(3));
    }
}
