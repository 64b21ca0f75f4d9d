use crate::config::{Config, UploadMode};
use crate::errors::StoreError;
use crate::models::{Form, Response};
use crate::storage::{Collection, JsonFileCollection, MemoryCollection, FORMS_FILE, RESPONSES_FILE};
use crate::uploads::{DiskStore, MockStore, ObjectStore};
use std::{path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub forms: Arc<dyn Collection<Form>>,
    pub responses: Arc<dyn Collection<Response>>,
    pub uploads: Arc<dyn ObjectStore>,
    /// Directory served at `/uploads`, when uploads are kept on disk.
    pub upload_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        forms: Arc<dyn Collection<Form>>,
        responses: Arc<dyn Collection<Response>>,
        uploads: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            forms,
            responses,
            uploads,
            upload_dir: None,
        }
    }

    /// File-backed collections under `data_dir` and the configured upload backend.
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        let forms = JsonFileCollection::<Form>::open(config.data_dir.join(FORMS_FILE)).await?;
        let responses =
            JsonFileCollection::<Response>::open(config.data_dir.join(RESPONSES_FILE)).await?;
        info!(
            forms = %forms.path().display(),
            responses = %responses.path().display(),
            "collections ready"
        );

        let mut state = Self::new(Arc::new(forms), Arc::new(responses), Arc::new(MockStore));
        if config.upload_mode == UploadMode::Disk {
            let disk = DiskStore::open(&config.upload_dir).await?;
            info!(dir = %disk.dir().display(), "uploads stored on disk");
            state.upload_dir = Some(disk.dir().to_path_buf());
            state.uploads = Arc::new(disk);
        } else {
            info!("uploads are mocked; bytes are discarded");
        }
        Ok(state)
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryCollection::<Form>::new()),
            Arc::new(MemoryCollection::<Response>::new()),
            Arc::new(MockStore),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::unique_dir;

    fn config(mode: UploadMode) -> (PathBuf, Config) {
        let root = unique_dir("state");
        let config = Config {
            port: 0,
            data_dir: root.join("data"),
            upload_dir: root.join("uploads"),
            upload_mode: mode,
        };
        (root, config)
    }

    #[tokio::test]
    async fn open_creates_both_collection_files() {
        let (root, config) = config(UploadMode::Disk);
        let state = AppState::open(&config).await.unwrap();

        assert!(config.data_dir.join(FORMS_FILE).exists());
        assert!(config.data_dir.join(RESPONSES_FILE).exists());
        assert_eq!(state.upload_dir.as_deref(), Some(config.upload_dir.as_path()));
        assert!(state.forms.list().await.unwrap().is_empty());
        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn mock_uploads_serve_nothing() {
        let (root, config) = config(UploadMode::Mock);
        let state = AppState::open(&config).await.unwrap();

        assert!(state.upload_dir.is_none());
        assert!(!config.upload_dir.exists());
        let url = state.uploads.store(b"x", "a.txt").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn in_memory_state_starts_empty() {
        let state = AppState::in_memory();
        assert!(state.forms.list().await.unwrap().is_empty());
        assert!(state.responses.list().await.unwrap().is_empty());
        assert!(state.upload_dir.is_none());
    }
}
