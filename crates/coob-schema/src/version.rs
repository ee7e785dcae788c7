//! Package version model.
//!
//! A version is 2 to 4 dot-separated numeric components
//! (`major.minor[.patch[.revision]]`). Components are plain decimal
//! literals: no sign, no leading zeros (except the literal `0`), and no
//! value above `i32::MAX`.
//!
//! Versions are never zero-extended. `1.2` and `1.2.0` are different
//! versions, and [`PackageVersion::compare`] refuses to order them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fewest components a version may have (`major.minor`).
pub const MIN_COMPONENTS: usize = 2;

/// Most components a version may have (`major.minor.patch.revision`).
pub const MAX_COMPONENTS: usize = 4;

/// Largest value a single component may hold.
pub const MAX_COMPONENT_VALUE: u32 = i32::MAX as u32;

/// Errors produced when a version string is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string does not split into 2 to 4 components.
    #[error("invalid version '{input}': expected 2 to 4 components, got {count}")]
    ComponentCount {
        /// The rejected input.
        input: String,
        /// Number of `.`-separated tokens found.
        count: usize,
    },

    /// One component violates the component rule.
    #[error("invalid version '{input}': component '{component}' {reason}")]
    Component {
        /// The rejected input.
        input: String,
        /// The offending token.
        component: String,
        /// Which rule the token broke.
        reason: &'static str,
    },
}

/// A parsed package version.
///
/// The derived [`Ord`] is total: components compare left to right and, on a
/// shared prefix, the shorter version sorts first. It exists so versions can
/// be sorted and maximised. Use [`PackageVersion::compare`] wherever the
/// answer must not depend on precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageVersion(Vec<u32>);

impl PackageVersion {
    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::ComponentCount`] if `s` does not have 2 to 4
    /// components, or [`VersionError::Component`] if any component is
    /// empty, non-numeric, has a leading zero, or exceeds `i32::MAX`.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let tokens: Vec<&str> = s.split('.').collect();
        if !(MIN_COMPONENTS..=MAX_COMPONENTS).contains(&tokens.len()) {
            return Err(VersionError::ComponentCount {
                input: s.to_string(),
                count: tokens.len(),
            });
        }

        let components = tokens
            .iter()
            .map(|token| parse_component(s, token))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(components))
    }

    /// The numeric components in declaration order.
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Number of declared components (2 to 4).
    pub fn precision(&self) -> usize {
        self.0.len()
    }

    /// The first component.
    pub fn major(&self) -> u32 {
        self.0[0]
    }

    /// The second component.
    pub fn minor(&self) -> u32 {
        self.0[1]
    }

    /// The third component, if declared.
    pub fn patch(&self) -> Option<u32> {
        self.0.get(2).copied()
    }

    /// The fourth component, if declared.
    pub fn revision(&self) -> Option<u32> {
        self.0.get(3).copied()
    }

    /// Compare two versions of equal precision.
    ///
    /// Returns `None` when the component counts differ. No zero-extension
    /// is applied, so `1.2` and `1.2.0` are incomparable rather than equal.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.precision() == other.precision() {
            Some(self.0.cmp(&other.0))
        } else {
            None
        }
    }
}

fn parse_component(input: &str, token: &str) -> Result<u32, VersionError> {
    let reject = |reason| VersionError::Component {
        input: input.to_string(),
        component: token.to_string(),
        reason,
    };

    if token.is_empty() {
        return Err(reject("is empty"));
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(reject("is not a non-negative integer"));
    }
    if token.len() > 1 && token.starts_with('0') {
        return Err(reject("has a leading zero"));
    }

    match token.parse::<u32>() {
        Ok(value) if value <= MAX_COMPONENT_VALUE => Ok(value),
        _ => Err(reject("exceeds 2147483647")),
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for PackageVersion {
    type Error = VersionError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_two_to_four_components() {
        assert_eq!(v("1.2").components(), &[1, 2]);
        assert_eq!(v("1.2.3").components(), &[1, 2, 3]);
        assert_eq!(v("1.2.3.4").components(), &[1, 2, 3, 4]);
        assert_eq!(v("0.0").components(), &[0, 0]);
        assert_eq!(v("2147483647.0").major(), 2_147_483_647);
    }

    #[test]
    fn test_parse_rejects_component_count() {
        assert!(matches!(
            PackageVersion::parse("1"),
            Err(VersionError::ComponentCount { count: 1, .. })
        ));
        assert!(matches!(
            PackageVersion::parse("1.2.3.4.5"),
            Err(VersionError::ComponentCount { count: 5, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_components() {
        for bad in [
            "01.2", "1.02.3", "1..2", "1.2.", ".1.2", "1.-2", "1.+2", "1.2a", "1.2.3-beta", " 1.2",
            "1.2147483648", "1.99999999999",
        ] {
            assert!(
                matches!(
                    PackageVersion::parse(bad),
                    Err(VersionError::Component { .. })
                ),
                "expected {bad} to be rejected"
            );
        }
    }

    #[test]
    fn test_accessors() {
        let version = v("3.1.4.1");
        assert_eq!(version.major(), 3);
        assert_eq!(version.minor(), 1);
        assert_eq!(version.patch(), Some(4));
        assert_eq!(version.revision(), Some(1));
        assert_eq!(v("3.1").patch(), None);
        assert_eq!(v("3.1").precision(), 2);
    }

    #[test]
    fn test_compare_is_numeric() {
        assert_eq!(v("1.10.0").compare(&v("1.9.0")), Some(Ordering::Greater));
        assert_eq!(v("1.2.0").compare(&v("1.3.0")), Some(Ordering::Less));
        assert_eq!(v("2.0.0.1").compare(&v("2.0.0.1")), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        let versions = ["0.1", "1.0", "1.1", "10.0", "2.5"];
        for a in versions {
            for b in versions {
                let (a, b) = (v(a), v(b));
                assert_eq!(a.compare(&b), b.compare(&a).map(Ordering::reverse));
            }
            assert_eq!(v(a).compare(&v(a)), Some(Ordering::Equal));
        }
    }

    #[test]
    fn test_compare_refuses_mixed_precision() {
        assert_eq!(v("1.2").compare(&v("1.2.0")), None);
        assert_eq!(v("1.2.0.0").compare(&v("1.2.0")), None);
    }

    #[test]
    fn test_total_order_for_sorting() {
        let mut versions = vec![v("1.3.0"), v("1.2"), v("1.2.0"), v("0.9.9")];
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["0.9.9", "1.2", "1.2.0", "1.3.0"]);
    }

    #[test]
    fn test_display_matches_input() {
        for s in ["0.0", "1.2.3", "10.20.30.40"] {
            assert_eq!(v(s).to_string(), s);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.4.2")).unwrap();
        assert_eq!(json, "\"1.4.2\"");
        let back: PackageVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.4.2"));
        assert!(serde_json::from_str::<PackageVersion>("\"1.04\"").is_err());
    }
}
