//! Cache Version Module
//!
//! Scopes partition names to one deployed cache version.

use std::fmt;

// == Partition Kind ==
/// The four logical partitions every cache version owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    Static,
    Dynamic,
    Data,
    Images,
}

impl PartitionKind {
    /// All partition kinds in reporting order.
    pub const ALL: [PartitionKind; 4] = [
        PartitionKind::Static,
        PartitionKind::Dynamic,
        PartitionKind::Data,
        PartitionKind::Images,
    ];

    /// Name prefix of the partition.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
            PartitionKind::Data => "data",
            PartitionKind::Images => "images",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Cache Version ==
/// Version tag shared by every partition of one deployed build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheVersion(String);

impl CacheVersion {
    /// Creates a version from its tag, e.g. `v2.1.0`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the raw tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `{kind}-{version}`.
    pub fn partition_name(&self, kind: PartitionKind) -> String {
        format!("{}-{}", kind, self.0)
    }

    /// Names that survive an activation sweep.
    pub fn known_names(&self) -> Vec<String> {
        PartitionKind::ALL
            .iter()
            .map(|kind| self.partition_name(*kind))
            .collect()
    }

    /// True if `name` is one of this version's partitions.
    pub fn owns(&self, name: &str) -> bool {
        self.known_names().iter().any(|known| known == name)
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_names() {
        let version = CacheVersion::new("v2");
        assert_eq!(version.partition_name(PartitionKind::Static), "static-v2");
        assert_eq!(
            version.known_names(),
            vec!["static-v2", "dynamic-v2", "data-v2", "images-v2"]
        );
    }

    #[test]
    fn test_owns() {
        let version = CacheVersion::new("v2");
        assert!(version.owns("images-v2"));
        assert!(!version.owns("images-v1"));
        assert!(!version.owns("fonts-v2"));
    }
}
