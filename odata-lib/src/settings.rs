//! Session settings

use serde::Deserialize;
use serde::Serialize;

use crate::metadata::NameMatchPolicy;

/// OData protocol version the generated command text targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// OData V3: `$inlinecount`, flat expand paths, prefixed literals.
    V3,
    /// OData V4: `$count=true`, nested expand clauses, bare literals.
    #[default]
    V4,
}

impl ProtocolVersion {
    /// Returns `true` for OData V4.
    pub fn is_v4(self) -> bool {
        matches!(self, Self::V4)
    }
}

/// Settings shared by every command built from a session.
///
/// # Example
///
/// ```
/// use odata_lib::ProtocolVersion;
/// use odata_lib::Settings;
/// use odata_lib::metadata::NameMatchPolicy;
///
/// let settings = Settings::default()
///     .with_protocol(ProtocolVersion::V3)
///     .with_name_match(NameMatchPolicy::CaseInsensitive);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Protocol version of the generated command text.
    ///
    /// Default: V4
    pub protocol: ProtocolVersion,

    /// How user-supplied names are matched against schema names.
    ///
    /// Default: [`NameMatchPolicy::Relaxed`]
    pub name_match: NameMatchPolicy,
}

impl Settings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the protocol version.
    pub fn with_protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets the name-match policy.
    pub fn with_name_match(mut self, policy: NameMatchPolicy) -> Self {
        self.name_match = policy;
        self
    }
}
