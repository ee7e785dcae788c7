//! Package identifiers and `<id>.<version>` references.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::{PackageVersion, VersionError};
use crate::{COOB_EXTENSION, DOWNLOAD_EXTENSION};

/// `<name>.<major>.<minor>.<patch>[.<revision>]`, shortest name first.
static NAME_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+?)\.(?P<version>\d+\.\d+\.\d+(?:\.\d+)?)$")
        .expect("name/version pattern is valid")
});

/// Errors produced when an identifier or reference string is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// The identifier is empty or not path-safe.
    #[error("invalid package id '{id}': {reason}")]
    InvalidId {
        /// The rejected identifier.
        id: String,
        /// Which rule it broke.
        reason: &'static str,
    },

    /// The string has no `.<major>.<minor>.<patch>` tail.
    #[error("'{0}' does not match <name>.<major>.<minor>.<patch>")]
    Pattern(String),

    /// The numeric tail matched but is not a valid version.
    #[error("'{input}' has an invalid version: {source}")]
    Version {
        /// The rejected input.
        input: String,
        /// Why the version was rejected.
        #[source]
        source: VersionError,
    },
}

/// A case-sensitive, path-safe package identifier (e.g. `Coral.Common`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId(String);

impl PackageId {
    /// Create a validated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::InvalidId`] if the identifier is empty,
    /// contains a path separator, or is `.`/`..`.
    pub fn new(id: impl Into<String>) -> Result<Self, ReferenceError> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must not be empty")
        } else if id.contains(['/', '\\']) {
            Some("must not contain path separators")
        } else if id == "." || id == ".." {
            Some("must not be a relative path component")
        } else if id.chars().any(char::is_control) {
            Some("must not contain control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ReferenceError::InvalidId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for PackageId {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl FromStr for PackageId {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PackageId {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.0
    }
}

impl PartialEq<str> for PackageId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Split a combined `<name>.<major>.<minor>.<patch>[.<revision>]` string.
///
/// The name is the shortest prefix that leaves a numeric version tail, so
/// `Coral.Common.1.4.2` yields `Coral.Common` and `1.4.2`.
///
/// # Errors
///
/// Returns [`ReferenceError::Pattern`] if there is no 3 or 4 component
/// numeric tail, [`ReferenceError::Version`] if the tail breaks the version
/// component rule, or [`ReferenceError::InvalidId`] if the name part is not
/// a valid identifier.
pub fn split_name_version(s: &str) -> Result<(PackageId, PackageVersion), ReferenceError> {
    let caps = NAME_VERSION
        .captures(s)
        .ok_or_else(|| ReferenceError::Pattern(s.to_string()))?;

    let version =
        PackageVersion::parse(&caps["version"]).map_err(|source| ReferenceError::Version {
            input: s.to_string(),
            source,
        })?;
    let id = PackageId::new(&caps["name"])?;

    Ok((id, version))
}

/// A package pinned to one version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageReference {
    /// The package identifier.
    pub id: PackageId,
    /// The pinned version.
    pub version: PackageVersion,
}

impl PackageReference {
    /// Create a reference from its parts.
    pub fn new(id: PackageId, version: PackageVersion) -> Self {
        Self { id, version }
    }

    /// Parse a dependency descriptor such as `Coral.Common.1.4.2`.
    ///
    /// # Errors
    ///
    /// See [`split_name_version`].
    pub fn parse(descriptor: &str) -> Result<Self, ReferenceError> {
        let (id, version) = split_name_version(descriptor)?;
        Ok(Self { id, version })
    }

    /// Name of the published archive: `<id>.<version>.coob`.
    pub fn archive_file_name(&self) -> String {
        format!("{self}.{COOB_EXTENSION}")
    }

    /// Name of the local download: `<id>.<version>.zip`.
    pub fn download_file_name(&self) -> String {
        format!("{self}.{DOWNLOAD_EXTENSION}")
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id, self.version)
    }
}

impl FromStr for PackageReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
