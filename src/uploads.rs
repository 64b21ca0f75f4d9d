use crate::errors::StoreError;
use crate::models::Base64Upload;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Public path prefix for stored uploads.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Where uploaded bytes go. Returns the public reference for the file.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StoreError>;
}

/// Writes uploads under a local directory that is also served at
/// [`UPLOADS_ROUTE`].
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|err| StoreError::io(&dir, err))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ObjectStore for DiskStore {
    async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StoreError> {
        let name = stored_name(original_name);
        let path = self.dir.join(&name);
        fs::write(&path, bytes)
            .await
            .map_err(|err| StoreError::io(&path, err))?;
        info!(file = %name, bytes = bytes.len(), "upload stored");
        Ok(reference(&name))
    }
}

/// Accepts uploads without keeping the bytes. Stands in for external object
/// storage when the service runs without a writable upload directory.
pub struct MockStore;

#[async_trait]
impl ObjectStore for MockStore {
    async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StoreError> {
        let name = stored_name(original_name);
        debug!(file = %name, bytes = bytes.len(), "upload discarded");
        Ok(reference(&name))
    }
}

/// `<unix millis>-<random below 10^9>` plus the original extension, if any.
pub fn stored_name(original_name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("{millis}-{suffix}{extension}")
}

fn reference(name: &str) -> String {
    format!("{UPLOADS_ROUTE}/{name}")
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded. Send a multipart \"file\" field, or JSON with base64 \"file\" and \"filename\" fields.")]
    MissingFile,

    #[error("file is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("malformed multipart body: {0}")]
    Multipart(String),
}

#[derive(Debug)]
pub struct IncomingFile {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl TryFrom<Base64Upload> for IncomingFile {
    type Error = UploadError;

    fn try_from(upload: Base64Upload) -> Result<Self, Self::Error> {
        let (Some(file), Some(filename)) = (upload.file, upload.filename) else {
            return Err(UploadError::MissingFile);
        };
        if file.is_empty() || filename.is_empty() {
            return Err(UploadError::MissingFile);
        }
        // Accept data URLs as produced by FileReader.readAsDataURL.
        let encoded = match file.split_once(";base64,") {
            Some((_, data)) => data,
            None => file.as_str(),
        };
        Ok(Self {
            bytes: STANDARD.decode(encoded.trim())?,
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::unique_dir;

    #[test]
    fn stored_name_keeps_extension() {
        let name = stored_name("holiday photo.JPG");
        assert!(name.ends_with(".JPG"));
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        let suffix = rest.trim_end_matches(".JPG").parse::<u32>().unwrap();
        assert!(suffix < 1_000_000_000);
    }

    #[test]
    fn stored_name_without_extension() {
        let name = stored_name("README");
        assert!(!name.contains('.'));
    }

    #[test]
    fn base64_payload_decodes() {
        let file = IncomingFile::try_from(Base64Upload {
            file: Some(STANDARD.encode(b"hello")),
            filename: Some("hello.txt".into()),
        })
        .unwrap();
        assert_eq!(file.bytes, b"hello");
        assert_eq!(file.filename, "hello.txt");

        let data_url = IncomingFile::try_from(Base64Upload {
            file: Some(format!("data:text/plain;base64,{}", STANDARD.encode(b"hi"))),
            filename: Some("hi.txt".into()),
        })
        .unwrap();
        assert_eq!(data_url.bytes, b"hi");
    }

    #[test]
    fn base64_payload_requires_both_fields() {
        let missing = IncomingFile::try_from(Base64Upload {
            file: Some(STANDARD.encode(b"x")),
            filename: None,
        });
        assert!(matches!(missing, Err(UploadError::MissingFile)));

        let bad = IncomingFile::try_from(Base64Upload {
            file: Some("***".into()),
            filename: Some("x.bin".into()),
        });
        assert!(matches!(bad, Err(UploadError::InvalidBase64(_))));
    }

    #[tokio::test]
    async fn disk_store_writes_bytes() {
        let dir = unique_dir("uploads");
        let store = DiskStore::open(&dir).await.unwrap();
        let url = store.store(b"png bytes", "logo.png").await.unwrap();

        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));
        let name = url.trim_start_matches("/uploads/");
        assert_eq!(std::fs::read(store.dir().join(name)).unwrap(), b"png bytes");
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn mock_store_returns_reference_only() {
        let url = MockStore.store(b"data", "report.pdf").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".pdf"));
    }
}
