//! Semantic version handling for contract and Kubernetes versions
//!
//! Only `major.minor.patch` is significant. A leading `v` is accepted and
//! pre-release or build suffixes (`-rc.1`, `+build`) are ignored.
use std::fmt;

/// A parsed `major.minor.patch` triple, ordered numerically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string; `None` if it is not a full triple
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let core = trimmed
            .split(|c: char| c == '-' || c == '+')
            .next()
            .unwrap_or_default();

        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }

        Some(Self::new(major, minor, patch))
    }

    /// Parse, treating anything unparsable as the lowest version `0.0.0`
    pub fn parse_or_lowest(input: &str) -> Self {
        Self::parse(input).unwrap_or_default()
    }

    pub fn at_least(&self, other: &SemanticVersion) -> bool {
        self >= other
    }

    /// `[lower, upper)`
    pub fn in_range(&self, lower: &SemanticVersion, upper: &SemanticVersion) -> bool {
        self >= lower && self < upper
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
