//! Package manifest reader.
//!
//! Every extracted package carries a `coob.props` file at its root: an
//! MSBuild-style property file naming the package, its version, and the
//! packages it depends on.
//!
//! ```xml
//! <Project>
//!   <PropertyGroup>
//!     <CoobId>Coral.Atoll</CoobId>
//!     <CoobVersion>2.0.0</CoobVersion>
//!   </PropertyGroup>
//!   <ItemGroup>
//!     <CoobReference Include="Coral.Common.1.4.2" />
//!   </ItemGroup>
//! </Project>
//! ```
//!
//! A `CoobReference` may also carry its descriptor as element text. Any
//! other element is ignored.

use std::path::{Path, PathBuf};

use coob_schema::{PackageId, PackageReference, PackageVersion, ReferenceError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use tracing::debug;

/// Manifest location relative to a package folder.
pub const MANIFEST_FILE: &str = "coob.props";

const ID_ELEMENT: &[u8] = b"CoobId";
const VERSION_ELEMENT: &[u8] = b"CoobVersion";
const REFERENCE_ELEMENT: &[u8] = b"CoobReference";
const INCLUDE_ATTRIBUTE: &str = "Include";

/// Errors from reading a package manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// No `coob.props` in the package folder.
    #[error("manifest not found at {}", .path.display())]
    NotFound {
        /// Expected manifest location.
        path: PathBuf,
    },

    /// The file cannot be read as XML or lacks a required field.
    #[error("malformed manifest {}: {reason}", .path.display())]
    Malformed {
        /// Manifest file.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// A `CoobReference` descriptor does not name a package version.
    #[error("malformed dependency '{descriptor}' in {}: {source}", .path.display())]
    Dependency {
        /// Manifest file.
        path: PathBuf,
        /// The rejected descriptor, trimmed.
        descriptor: String,
        /// Why it was rejected.
        #[source]
        source: ReferenceError,
    },
}

/// The identity and dependencies declared by a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// The package's own identifier.
    pub id: PackageId,
    /// The package's own version.
    pub version: PackageVersion,
    /// Declared dependencies, in declaration order.
    pub dependencies: Vec<PackageReference>,
}

/// Path of the manifest inside `package_dir`.
pub fn manifest_path(package_dir: &Path) -> PathBuf {
    package_dir.join(MANIFEST_FILE)
}

#[derive(Clone, Copy)]
enum Field {
    Id,
    Version,
    Reference,
}

impl Field {
    fn for_element(name: &[u8]) -> Option<Self> {
        match name {
            ID_ELEMENT => Some(Self::Id),
            VERSION_ELEMENT => Some(Self::Version),
            REFERENCE_ELEMENT => Some(Self::Reference),
            _ => None,
        }
    }

    fn element(self) -> &'static str {
        match self {
            Self::Id => "CoobId",
            Self::Version => "CoobVersion",
            Self::Reference => "CoobReference",
        }
    }
}

/// Accumulates field values while the document is scanned.
struct Fields<'p> {
    path: &'p Path,
    id: Option<String>,
    version: Option<String>,
    dependencies: Vec<PackageReference>,
}

impl<'p> Fields<'p> {
    fn new(path: &'p Path) -> Self {
        Self {
            path,
            id: None,
            version: None,
            dependencies: Vec::new(),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> ManifestError {
        malformed(self.path, reason)
    }

    fn set(&mut self, field: Field, raw: &str) -> Result<(), ManifestError> {
        let path = self.path;
        let value = raw.trim();

        // An empty descriptor is a bad dependency, not a bad manifest.
        let slot = match field {
            Field::Id => &mut self.id,
            Field::Version => &mut self.version,
            Field::Reference => {
                let reference =
                    PackageReference::parse(value).map_err(|source| ManifestError::Dependency {
                        path: path.to_path_buf(),
                        descriptor: value.to_string(),
                        source,
                    })?;
                self.dependencies.push(reference);
                return Ok(());
            }
        };

        if value.is_empty() {
            return Err(malformed(path, format!("empty <{}>", field.element())));
        }

        if slot.is_some() {
            return Err(malformed(path, format!("duplicate <{}>", field.element())));
        }
        *slot = Some(value.to_string());
        Ok(())
    }

    fn finish(self) -> Result<Manifest, ManifestError> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| self.malformed("missing <CoobId>"))?;
        let version = self
            .version
            .as_deref()
            .ok_or_else(|| self.malformed("missing <CoobVersion>"))?;

        let id = PackageId::new(id).map_err(|e| self.malformed(e.to_string()))?;
        let version = PackageVersion::parse(version).map_err(|e| self.malformed(e.to_string()))?;

        Ok(Manifest {
            id,
            version,
            dependencies: self.dependencies,
        })
    }
}

fn malformed(path: &Path, reason: impl Into<String>) -> ManifestError {
    ManifestError::Malformed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn include_attribute(element: &BytesStart<'_>) -> Result<Option<String>, String> {
    match element.try_get_attribute(INCLUDE_ATTRIBUTE) {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|value| Some(value.into_owned()))
            .map_err(|e| e.to_string()),
        Ok(None) => Ok(None),
        Err(e) => Err(e.to_string()),
    }
}

impl Manifest {
    /// Parse manifest XML. `path` is used only in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] if the document is not
    /// well-formed or lacks a valid `CoobId`/`CoobVersion`, and
    /// [`ManifestError::Dependency`] if any `CoobReference` descriptor is
    /// not `<id>.<major>.<minor>.<patch>`.
    pub fn parse(xml: &str, path: &Path) -> Result<Self, ManifestError> {
        let mut reader = Reader::from_str(xml);
        let mut fields = Fields::new(path);
        let mut depth: usize = 0;
        let mut capture: Option<(Field, String)> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                fields.malformed(format!("{e} at byte {}", reader.buffer_position()))
            })?;

            match event {
                Event::Start(element) => {
                    depth += 1;
                    if capture.is_some() {
                        continue;
                    }
                    match Field::for_element(element.local_name().as_ref()) {
                        Some(Field::Reference) => {
                            match include_attribute(&element).map_err(|e| fields.malformed(e))? {
                                Some(descriptor) => fields.set(Field::Reference, &descriptor)?,
                                None => capture = Some((Field::Reference, String::new())),
                            }
                        }
                        Some(field) => capture = Some((field, String::new())),
                        None => {}
                    }
                }
                Event::Empty(element) => match Field::for_element(element.local_name().as_ref()) {
                    Some(Field::Reference) => {
                        let descriptor = include_attribute(&element)
                            .map_err(|e| fields.malformed(e))?
                            .unwrap_or_default();
                        fields.set(Field::Reference, &descriptor)?;
                    }
                    Some(field) => fields.set(field, "")?,
                    None => {}
                },
                Event::Text(text) => {
                    if let Some((_, buf)) = capture.as_mut() {
                        let text = text.unescape().map_err(|e| fields.malformed(e.to_string()))?;
                        buf.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some((_, buf)) = capture.as_mut() {
                        buf.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::End(element) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| fields.malformed("unexpected closing tag"))?;
                    let closes_capture = capture.as_ref().is_some_and(|(field, _)| {
                        element.local_name().as_ref() == field.element().as_bytes()
                    });
                    if closes_capture {
                        if let Some((field, buf)) = capture.take() {
                            fields.set(field, &buf)?;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if depth != 0 {
            return Err(fields.malformed("unexpected end of document"));
        }

        let manifest = fields.finish()?;
        debug!(
            id = %manifest.id,
            version = %manifest.version,
            dependencies = manifest.dependencies.len(),
            "manifest parsed"
        );
        Ok(manifest)
    }

    /// Read and parse `<package_dir>/coob.props`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if the file does not exist,
    /// [`ManifestError::Malformed`] if it cannot be read as UTF-8 XML, and
    /// any error from [`Manifest::parse`].
    pub async fn load(package_dir: &Path) -> Result<Self, ManifestError> {
        let path = manifest_path(package_dir);
        let xml = match tokio::fs::read_to_string(&path).await {
            Ok(xml) => xml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound { path });
            }
            Err(e) => {
                return Err(ManifestError::Malformed {
                    path,
                    reason: format!("unreadable: {e}"),
                });
            }
        };

        Self::parse(&xml, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<Manifest, ManifestError> {
        Manifest::parse(xml, Path::new("coob.props"))
    }

    const ATOLL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <CoobId>Coral.Atoll</CoobId>
    <CoobVersion>2.0.0</CoobVersion>
    <Description>Atoll &amp; friends</Description>
  </PropertyGroup>
  <ItemGroup>
    <CoobReference Include="Coral.Common.1.4.2" />
    <CoobReference>
      Coral.Reef.3.1.0
    </CoobReference>
  </ItemGroup>
</Project>
"#;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse(ATOLL).unwrap();
        assert_eq!(manifest.id, "Coral.Atoll");
        assert_eq!(manifest.version.to_string(), "2.0.0");
        let deps: Vec<String> = manifest
            .dependencies
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(deps, ["Coral.Common.1.4.2", "Coral.Reef.3.1.0"]);
    }

    #[test]
    fn test_parse_without_dependencies() {
        let xml = "<Project><CoobId>Solo</CoobId><CoobVersion>1.0</CoobVersion></Project>";
        let manifest = parse(xml).unwrap();
        assert_eq!(manifest.id, "Solo");
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let err = parse("<Project><CoobVersion>1.0.0</CoobVersion></Project>").unwrap_err();
        assert!(
            matches!(err, ManifestError::Malformed { ref reason, .. } if reason.contains("CoobId"))
        );

        let err = parse("<Project><CoobId>Solo</CoobId></Project>").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Malformed { ref reason, .. } if reason.contains("CoobVersion")
        ));

        assert!(parse("").is_err());
    }

    #[test]
    fn test_invalid_own_version_is_malformed() {
        let err =
            parse("<Project><CoobId>Solo</CoobId><CoobVersion>1.0-beta</CoobVersion></Project>")
                .unwrap_err();
        assert!(matches!(err, ManifestError::Malformed { .. }));
    }

    #[test]
    fn test_duplicate_id_is_malformed() {
        let err = parse(
            "<Project><CoobId>A</CoobId><CoobId>B</CoobId><CoobVersion>1.0</CoobVersion></Project>",
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Malformed { .. }));
    }

    #[test]
    fn test_not_well_formed() {
        assert!(matches!(
            parse("<Project><CoobId>A</CoobVersion></Project>"),
            Err(ManifestError::Malformed { .. })
        ));
        assert!(matches!(
            parse("<Project><CoobId>A</CoobId><CoobVersion>1.0</CoobVersion>"),
            Err(ManifestError::Malformed { .. })
        ));
    }

    #[test]
    fn test_bad_dependency_is_fatal() {
        let err = parse(
            r#"<Project>
                <CoobId>A</CoobId><CoobVersion>1.0.0</CoobVersion>
                <CoobReference Include="Coral.Common.1.4.2" />
                <CoobReference Include="Coral.Common.1.4" />
            </Project>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Dependency { ref descriptor, .. } if descriptor == "Coral.Common.1.4"
        ));
    }

    #[test]
    fn test_reference_without_include() {
        let err = parse(
            "<Project><CoobId>A</CoobId><CoobVersion>1.0</CoobVersion><CoobReference/></Project>",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Dependency { ref descriptor, .. } if descriptor.is_empty()
        ));
    }

    #[test]
    fn test_empty_descriptors_are_bad_dependencies() {
        for reference in [
            r#"<CoobReference Include="" />"#,
            r#"<CoobReference Include="   " />"#,
            "<CoobReference></CoobReference>",
            "<CoobReference>  </CoobReference>",
        ] {
            let xml = format!(
                "<Project><CoobId>A</CoobId><CoobVersion>1.0.0</CoobVersion>{reference}</Project>"
            );
            let err = parse(&xml).unwrap_err();
            assert!(
                matches!(err, ManifestError::Dependency { .. }),
                "{reference}: {err:?}"
            );
            assert_eq!(
                crate::RestoreError::from(err).kind(),
                crate::RestoreErrorKind::DependencyMalformed
            );
        }
    }

    #[tokio::test]
    async fn test_load_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_from_package_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), ATOLL).unwrap();
        let manifest = Manifest::load(dir.path()).await.unwrap();
        assert_eq!(manifest.dependencies.len(), 2);
    }
}
