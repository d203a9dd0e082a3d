//! Numeric plugin versions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing versions and constraints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    #[error("invalid version constraint '{input}': {reason}")]
    InvalidConstraint { input: String, reason: String },
}

/// A plugin version, compared as a (major, minor, patch) triple
///
/// Ordering is numeric per component, so `1.10.0 > 1.9.0`. Pre-release
/// and build metadata are accepted on input and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string
    ///
    /// Accepts full semver (`1.2.3`, `1.2.3-beta.1`) and the short forms
    /// `1` and `1.2`, which are padded with zeros.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

        if let Ok(v) = semver::Version::parse(trimmed) {
            return Ok(Self::new(v.major, v.minor, v.patch));
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(VersionError::InvalidVersion(input.to_string()));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u64>()
                .map_err(|_| VersionError::InvalidVersion(input.to_string()))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", Version::new(1, 2, 3))]
    #[case("v2.0.1", Version::new(2, 0, 1))]
    #[case("1.4", Version::new(1, 4, 0))]
    #[case("7", Version::new(7, 0, 0))]
    #[case("1.0.0-beta.2", Version::new(1, 0, 0))]
    #[case(" 0.4.0 ", Version::new(0, 4, 0))]
    fn test_parse(#[case] input: &str, #[case] expected: Version) {
        assert_eq!(Version::parse(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1.2.3.4")]
    #[case("1.x")]
    fn test_parse_rejects_garbage(#[case] input: &str) {
        assert!(matches!(
            Version::parse(input),
            Err(VersionError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_numeric_ordering() {
        let older = Version::parse("1.9.0").unwrap();
        let newer = Version::parse("1.10.0").unwrap();
        assert!(newer > older);
        assert!(Version::new(2, 0, 0) > Version::new(1, 99, 99));
        assert!(Version::new(1, 0, 10) > Version::new(1, 0, 2));
    }

    #[test]
    fn test_serde_as_string() {
        let yaml = serde_yaml::to_string(&Version::new(3, 1, 4)).unwrap();
        assert!(yaml.contains("3.1.4"));
        let parsed: Version = serde_yaml::from_str("\"0.4\"").unwrap();
        assert_eq!(parsed, Version::new(0, 4, 0));
    }
}
