//! Typed UID definitions and resource versions.
//!
//! Each object kind gets its own UID type so that a claim UID can never be
//! used to look up, say, a device class.

use crate::define_uid;

// =============================================================================
// Object UIDs
// =============================================================================

define_uid!(ClaimUid);
define_uid!(DeviceClassUid);
define_uid!(ResourceSliceUid);
define_uid!(PodUid);

// =============================================================================
// Resource Version
// =============================================================================

/// Store-assigned version of an object.
///
/// The authoritative store bumps this on every write, so a larger value is
/// always a newer object. On the wire it travels as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ResourceVersion(u64);

impl ResourceVersion {
    /// Creates a resource version from a raw counter value.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Returns the underlying counter value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the version a subsequent write would receive.
    ///
    /// Saturates at `u64::MAX`.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Parses a resource version from its decimal string form.
    pub fn parse(s: &str) -> Result<Self, crate::IdError> {
        if s.is_empty() {
            return Err(crate::IdError::Empty);
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| crate::IdError::InvalidResourceVersion(s.to_string()))
    }
}

impl std::fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ResourceVersion {
    type Err = crate::IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for ResourceVersion {
    fn from(version: u64) -> Self {
        Self(version)
    }
}

impl From<ResourceVersion> for u64 {
    fn from(version: ResourceVersion) -> Self {
        version.0
    }
}

impl serde::Serialize for ResourceVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ResourceVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
