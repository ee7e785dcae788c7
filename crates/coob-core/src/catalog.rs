//! Remote catalog client.
//!
//! The catalog endpoint answers a single GET with a JSON object whose keys
//! are published archive names (`<id>.<version>.coob`). Values are opaque.
//! The listing is fetched fresh for each lookup and never cached.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use coob_schema::{COOB_EXTENSION, PackageId, PackageVersion, VersionError};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

/// Errors from fetching or reading a catalog listing.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The request failed before a response arrived.
    #[error("catalog unavailable at {url}: {source}")]
    Unavailable {
        /// Listing URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with something other than 200.
    #[error("catalog at {url} returned HTTP {status}")]
    Status {
        /// Listing URL.
        url: String,
        /// Status received.
        status: StatusCode,
    },

    /// The body is not a JSON object.
    #[error("catalog at {url} is malformed: {reason}")]
    Malformed {
        /// Listing URL.
        url: String,
        /// What was wrong with the body.
        reason: String,
    },
}

/// Client for a repository's listing endpoint.
#[derive(Debug, Clone)]
pub struct Catalog {
    client: Client,
    base_url: String,
}

impl Catalog {
    /// Catalog served at `base_url`, queried through `client`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Repository base URI.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current listing with one GET to the base URI.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unavailable`] on a network error,
    /// [`CatalogError::Status`] on any status other than 200, and
    /// [`CatalogError::Malformed`] if the body is not a JSON object.
    pub async fn fetch_listing(&self) -> Result<CatalogListing, CatalogError> {
        let url = self.base_url.as_str();
        let unavailable = |source| CatalogError::Unavailable {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(unavailable)?;
        if resp.status() != StatusCode::OK {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        let body = resp.text().await.map_err(unavailable)?;
        let listing = CatalogListing::from_json(&body).map_err(|reason| CatalogError::Malformed {
            url: url.to_string(),
            reason,
        })?;

        debug!(url, entries = listing.len(), "fetched catalog listing");
        Ok(listing)
    }
}

/// How a single listing key relates to the package being looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingKey {
    /// The key names another package or is not a `.coob` archive.
    Unrelated,
    /// The key has the right prefix and suffix but the version is invalid.
    Malformed(VersionError),
    /// The key names a published version of the package.
    Version(PackageVersion),
}

impl ListingKey {
    /// Classify `key` against `id`.
    pub fn classify(key: &str, id: &PackageId) -> Self {
        let Some(rest) = key
            .strip_prefix(id.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            return Self::Unrelated;
        };
        let Some(token) = rest
            .strip_suffix(COOB_EXTENSION)
            .and_then(|rest| rest.strip_suffix('.'))
        else {
            return Self::Unrelated;
        };

        match PackageVersion::parse(token) {
            Ok(version) => Self::Version(version),
            Err(e) => Self::Malformed(e),
        }
    }
}

/// A snapshot of the archive names published by a repository.
#[derive(Debug, Clone, Default)]
pub struct CatalogListing {
    entries: BTreeMap<String, serde_json::Value>,
}

impl CatalogListing {
    /// Parse a listing body. The body must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the body is not JSON or is
    /// JSON of another shape.
    pub fn from_json(body: &str) -> Result<Self, String> {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => Ok(Self {
                entries: map.into_iter().collect(),
            }),
            Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
            Err(e) => Err(format!("invalid JSON: {e}")),
        }
    }

    /// Build a listing from bare archive names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: names
                .into_iter()
                .map(|name| (name.into(), serde_json::Value::Null))
                .collect(),
        }
    }

    /// Number of keys in the listing.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the listing has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every archive name in the listing, sorted.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Valid published versions of `id`, in listing order.
    ///
    /// Keys with the right shape but an unparseable version are skipped.
    pub fn entries_for<'a>(
        &'a self,
        id: &'a PackageId,
    ) -> impl Iterator<Item = PackageVersion> + 'a {
        self.file_names()
            .filter_map(move |key| match ListingKey::classify(key, id) {
                ListingKey::Version(version) => Some(version),
                ListingKey::Malformed(e) => {
                    debug!(key, error = %e, "skipping malformed catalog entry");
                    None
                }
                ListingKey::Unrelated => None,
            })
    }

    /// Every valid published version of `id`, oldest first.
    pub fn versions(&self, id: &PackageId) -> Vec<PackageVersion> {
        let mut versions: Vec<PackageVersion> = self.entries_for(id).collect();
        versions.sort();
        versions.dedup();
        versions
    }

    /// The highest published version of `id`.
    ///
    /// With a `ceiling`, only versions of the ceiling's precision that are
    /// strictly below it are considered. Returns `None` if nothing remains.
    pub fn latest_version(
        &self,
        id: &PackageId,
        ceiling: Option<&PackageVersion>,
    ) -> Option<PackageVersion> {
        self.entries_for(id)
            .filter(|version| match ceiling {
                Some(ceiling) => version.compare(ceiling) == Some(Ordering::Less),
                None => true,
            })
            .max()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn id(s: &str) -> PackageId {
        PackageId::new(s).unwrap()
    }

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    fn sample() -> CatalogListing {
        CatalogListing::from_names(["foo.1.2.0.coob", "foo.1.3.0.coob", "bar.9.9.9.coob"])
    }

    #[test]
    fn test_latest_without_ceiling() {
        assert_eq!(sample().latest_version(&id("foo"), None), Some(v("1.3.0")));
    }

    #[test]
    fn test_latest_ceiling_is_exclusive() {
        assert_eq!(
            sample().latest_version(&id("foo"), Some(&v("1.3.0"))),
            Some(v("1.2.0"))
        );
        assert_eq!(sample().latest_version(&id("foo"), Some(&v("1.2.0"))), None);
    }

    #[test]
    fn test_latest_not_found() {
        assert_eq!(sample().latest_version(&id("baz"), None), None);
        assert_eq!(CatalogListing::default().latest_version(&id("foo"), None), None);
    }

    #[test]
    fn test_prefix_must_end_at_dot() {
        let listing = CatalogListing::from_names(["foobar.5.0.0.coob", "foo.1.0.0.coob"]);
        assert_eq!(listing.latest_version(&id("foo"), None), Some(v("1.0.0")));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let listing = CatalogListing::from_names([
            "foo.1.0.0.coob",
            "foo.01.5.0.coob",
            "foo.latest.coob",
            "foo.2.0.0.zip",
            "foo.1.2.3.4.5.coob",
            "README.md",
        ]);
        assert_eq!(listing.latest_version(&id("foo"), None), Some(v("1.0.0")));
        assert_eq!(listing.versions(&id("foo")), vec![v("1.0.0")]);
    }

    #[test]
    fn test_ceiling_skips_mixed_precision() {
        let listing =
            CatalogListing::from_names(["foo.1.1.coob", "foo.1.0.5.coob", "foo.1.0.0.1.coob"]);
        assert_eq!(
            listing.latest_version(&id("foo"), Some(&v("1.1.0"))),
            Some(v("1.0.5"))
        );
    }

    #[test]
    fn test_dotted_package_ids() {
        let listing = CatalogListing::from_names([
            "Coral.Common.1.4.2.coob",
            "Coral.Common.Extras.9.0.0.coob",
            "Coral.1.0.0.coob",
        ]);
        assert_eq!(listing.versions(&id("Coral.Common")), vec![v("1.4.2")]);
        assert_eq!(listing.versions(&id("Coral")), vec![v("1.0.0")]);
    }

    #[test]
    fn test_classify() {
        let foo = id("foo");
        assert_eq!(
            ListingKey::classify("foo.1.2.coob", &foo),
            ListingKey::Version(v("1.2"))
        );
        assert_eq!(ListingKey::classify("bar.1.2.coob", &foo), ListingKey::Unrelated);
        assert!(matches!(
            ListingKey::classify("foo.1.x.coob", &foo),
            ListingKey::Malformed(_)
        ));
    }

    #[test]
    fn test_from_json_requires_object() {
        assert_eq!(CatalogListing::from_json(r#"{"a.1.0.coob": {}}"#).unwrap().len(), 1);
        assert!(CatalogListing::from_json("[]").is_err());
        assert!(CatalogListing::from_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"foo.1.2.0.coob": {"size": 10}, "foo.1.3.0.coob": {"size": 12}}"#)
            .create_async()
            .await;

        let catalog = Catalog::new(Client::new(), server.url());
        let listing = catalog.fetch_listing().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.latest_version(&id("foo"), None), Some(v("1.3.0")));
    }

    #[tokio::test]
    async fn test_fetch_listing_http_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let catalog = Catalog::new(Client::new(), server.url());
        let err = catalog.fetch_listing().await.unwrap_err();
        assert!(matches!(err, CatalogError::Status { status, .. } if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn test_fetch_listing_malformed() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"["foo.1.0.0.coob"]"#)
            .create_async()
            .await;

        let catalog = Catalog::new(Client::new(), server.url());
        let err = catalog.fetch_listing().await.unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_fetch_listing_unreachable() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let catalog = Catalog::new(Client::new(), "http://127.0.0.1:9");
        let err = catalog.fetch_listing().await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable { .. }));
    }
}
