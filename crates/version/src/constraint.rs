//! Version constraints declared on plugin dependencies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::version::{Version, VersionError};

/// A constraint on the version of a required plugin
///
/// All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionConstraint {
    /// Any installed version is acceptable
    Any,

    /// `>= version`
    AtLeast(Version),

    /// `<= version`
    AtMost(Version),

    /// `= version`
    Exact(Version),

    /// `>= min, <= max`
    Between { min: Version, max: Version },
}

impl VersionConstraint {
    /// Parse a constraint
    ///
    /// Supported forms:
    /// - `*` or an empty string
    /// - `>=1.0.0`, `<=2.0.0`, `=1.2.3`
    /// - `>=1.0.0, <=2.0.0`
    /// - `[1.0.0,2.0.0]` (inclusive interval)
    /// - `1.0.0` (shorthand for `>=1.0.0`)
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();

        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::Any);
        }

        if trimmed.starts_with('[') || trimmed.starts_with('(') {
            return Self::parse_interval(input, trimmed);
        }

        if trimmed.contains(',') {
            let mut min = None;
            let mut max = None;
            for part in trimmed.split(',') {
                match Self::parse(part)? {
                    Self::AtLeast(v) if min.is_none() => min = Some(v),
                    Self::AtMost(v) if max.is_none() => max = Some(v),
                    _ => {
                        return Err(invalid(
                            input,
                            "a combined constraint takes one '>=' and one '<=' bound",
                        ))
                    }
                }
            }
            return match (min, max) {
                (Some(min), Some(max)) => Self::between(input, min, max),
                _ => Err(invalid(input, "missing bound")),
            };
        }

        if let Some(rest) = trimmed.strip_prefix(">=") {
            return Ok(Self::AtLeast(Version::parse(rest)?));
        }
        if let Some(rest) = trimmed.strip_prefix("<=") {
            return Ok(Self::AtMost(Version::parse(rest)?));
        }
        if let Some(rest) = trimmed.strip_prefix('=') {
            return Ok(Self::Exact(Version::parse(rest)?));
        }
        if trimmed.starts_with('<') || trimmed.starts_with('>') {
            return Err(invalid(input, "only inclusive bounds are supported"));
        }

        Ok(Self::AtLeast(Version::parse(trimmed)?))
    }

    fn parse_interval(input: &str, trimmed: &str) -> Result<Self, VersionError> {
        if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
            return Err(invalid(input, "only inclusive bounds are supported"));
        }

        let inner = &trimmed[1..trimmed.len() - 1];
        let (lower, upper) = inner
            .split_once(',')
            .ok_or_else(|| invalid(input, "an interval needs two bounds"))?;

        let min = Version::parse(lower)?;
        let max = Version::parse(upper)?;
        Self::between(input, min, max)
    }

    fn between(input: &str, min: Version, max: Version) -> Result<Self, VersionError> {
        if min > max {
            return Err(invalid(input, "lower bound exceeds upper bound"));
        }
        if min == max {
            return Ok(Self::Exact(min));
        }
        Ok(Self::Between { min, max })
    }

    /// Check whether `version` satisfies this constraint
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::AtLeast(min) => version >= min,
            Self::AtMost(max) => version <= max,
            Self::Exact(exact) => version == exact,
            Self::Between { min, max } => version >= min && version <= max,
        }
    }
}

/// Check whether `installed` satisfies `constraint`
pub fn satisfies(installed: &Version, constraint: &VersionConstraint) -> bool {
    constraint.satisfies(installed)
}

fn invalid(input: &str, reason: &str) -> VersionError {
    VersionError::InvalidConstraint {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

impl Default for VersionConstraint {
    fn default() -> Self {
        Self::Any
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionConstraint> for String {
    fn from(value: VersionConstraint) -> Self {
        value.to_string()
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::AtLeast(v) => write!(f, ">={}", v),
            Self::AtMost(v) => write!(f, "<={}", v),
            Self::Exact(v) => write!(f, "={}", v),
            Self::Between { min, max } => write!(f, ">={}, <={}", min, max),
        }
    }
}
