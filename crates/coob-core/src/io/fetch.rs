//! Fetch one package: download its archive and extract it in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use coob_schema::{PackageId, PackageReference, ReferenceError, split_name_version};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::Reporter;
use crate::io::download::{DownloadError, download_to_file};
use crate::io::extract::{ExtractError, Extractor, extract_replacing};
use crate::paths::repository_url;

/// Errors from fetching one package.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The archive could not be downloaded.
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    /// The archive could not be unpacked.
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// `<id>.<version>` does not split into a folder name.
    #[error("Cannot derive package folder: {0}")]
    NameParse(#[from] ReferenceError),
}

/// Request for a fetch operation
pub struct FetchRequest<'a> {
    /// HTTP client.
    pub client: &'a Client,
    /// Package to fetch.
    pub reference: &'a PackageReference,
    /// Repository base URI.
    pub base_url: &'a str,
    /// Folder receiving the download and the extracted package.
    pub out_dir: &'a Path,
    /// Unpacks the downloaded archive.
    pub extractor: Arc<dyn Extractor>,
    /// Progress sink.
    pub reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for FetchRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRequest")
            .field("reference", &self.reference)
            .field("base_url", &self.base_url)
            .field("out_dir", &self.out_dir)
            .finish_non_exhaustive()
    }
}

impl<'a> FetchRequest<'a> {
    /// Bundle the inputs of one fetch.
    pub fn new(
        client: &'a Client,
        reference: &'a PackageReference,
        base_url: &'a str,
        out_dir: &'a Path,
        extractor: Arc<dyn Extractor>,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            client,
            reference,
            base_url,
            out_dir,
            extractor,
            reporter,
        }
    }

    /// Download `<base_url>/<id>.<version>.coob` to `<out_dir>/<id>.<version>.zip`,
    /// extract it into `<out_dir>/<name>`, then delete the download.
    ///
    /// Returns the extracted folder.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NameParse`] if the combined `<id>.<version>`
    /// does not split back into a name and a 3 or 4 component version,
    /// [`FetchError::Download`] on a network or HTTP failure, and
    /// [`FetchError::Extract`] if the archive cannot be unpacked. After an
    /// extraction failure the download is left in `out_dir`.
    pub async fn execute(self) -> Result<PathBuf, FetchError> {
        let reference = self.reference;
        let folder = folder_name(reference)?;

        tokio::fs::create_dir_all(self.out_dir)
            .await
            .map_err(|source| DownloadError::Io {
                path: self.out_dir.to_path_buf(),
                source,
            })?;

        let url = repository_url(self.base_url, &reference.archive_file_name());
        let archive = self.out_dir.join(reference.download_file_name());
        let target = self.out_dir.join(folder.as_str());

        info!(package = %reference, %url, "fetching package");
        download_to_file(self.client, &url, &archive, reference, self.reporter).await?;

        self.reporter.extracting(&reference.id, &reference.version);
        extract_replacing(self.extractor, &archive, &target).await?;

        tokio::fs::remove_file(&archive)
            .await
            .map_err(|source| ExtractError::Io {
                path: archive.clone(),
                source,
            })?;

        debug!(package = %reference, target = %target.display(), "package extracted");
        self.reporter.done(&reference.id, &reference.version, &target);
        Ok(target)
    }
}

/// Folder name for an extracted package: the `<name>` part of the combined
/// `<id>.<version>` string.
///
/// # Errors
///
/// Returns an error if the combined string has no 3 or 4 component tail,
/// which is the case for two-component versions.
pub fn folder_name(reference: &PackageReference) -> Result<PackageId, ReferenceError> {
    split_name_version(&reference.to_string()).map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::extract::ZipExtractor;
    use crate::NullReporter;
    use mockito::Server;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, contents) in files {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    async fn fetch(
        server_url: &str,
        reference: &PackageReference,
        out: &Path,
    ) -> Result<PathBuf, FetchError> {
        let client = Client::new();
        FetchRequest::new(
            &client,
            reference,
            server_url,
            out,
            Arc::new(ZipExtractor),
            &NullReporter,
        )
        .execute()
        .await
    }

    #[tokio::test]
    async fn test_fetch_extracts_and_removes_download() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/Coral.Common.1.4.2.coob")
            .with_status(200)
            .with_body(zip_bytes(&[("lib/common.txt", "common")]))
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let reference = PackageReference::parse("Coral.Common.1.4.2").unwrap();
        let target = fetch(&server.url(), &reference, dir.path()).await.unwrap();

        m.assert_async().await;
        assert_eq!(target, dir.path().join("Coral.Common"));
        assert_eq!(
            std::fs::read_to_string(target.join("lib/common.txt")).unwrap(),
            "common"
        );
        assert!(!dir.path().join("Coral.Common.1.4.2.zip").exists());
    }

    #[tokio::test]
    async fn test_fetch_404_is_download_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/Missing.1.0.0.coob")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let reference = PackageReference::parse("Missing.1.0.0").unwrap();
        let err = fetch(&server.url(), &reference, dir.path()).await.unwrap_err();

        assert!(matches!(err, FetchError::Download(DownloadError::Status { .. })));
        assert!(!dir.path().join("Missing").exists());
    }

    #[tokio::test]
    async fn test_fetch_corrupt_archive_keeps_download() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/Broken.1.0.0.coob")
            .with_status(200)
            .with_body("this is not a zip")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let reference = PackageReference::parse("Broken.1.0.0").unwrap();
        let err = fetch(&server.url(), &reference, dir.path()).await.unwrap_err();

        assert!(matches!(err, FetchError::Extract(ExtractError::Archive { .. })));
        assert!(dir.path().join("Broken.1.0.0.zip").exists());
    }

    #[tokio::test]
    async fn test_two_component_version_fails_name_parse() {
        let server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let reference = PackageReference::new(
            PackageId::new("Short").unwrap(),
            coob_schema::PackageVersion::parse("1.0").unwrap(),
        );

        let err = fetch(&server.url(), &reference, dir.path()).await.unwrap_err();
        assert!(matches!(err, FetchError::NameParse(_)));
    }

    #[test]
    fn test_folder_name_strips_version() {
        let reference = PackageReference::parse("Coral.Atoll.2.0.0.1").unwrap();
        assert_eq!(folder_name(&reference).unwrap(), "Coral.Atoll");
    }
}
