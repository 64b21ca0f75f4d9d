use crate::errors::StoreError;
use crate::models::{Form, Response};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};
use tokio::{
    fs,
    sync::{Mutex, RwLock},
};
use tracing::{debug, info};

pub const FORMS_FILE: &str = "forms.json";
pub const RESPONSES_FILE: &str = "responses.json";

/// A stored entity addressed by its string id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

impl Record for Form {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Response {
    fn id(&self) -> &str {
        &self.id
    }
}

pub type Mutation<T> = Box<dyn FnOnce(&mut T) + Send>;

/// Ordered collection of records. Each call is atomic with respect to other
/// calls on the same collection.
#[async_trait]
pub trait Collection<T: Record>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError>;

    /// Replaces the record with the same id in place, or appends it.
    async fn put(&self, record: T) -> Result<(), StoreError>;

    /// Applies `apply` to the stored record and returns the result, or `None`
    /// when no record has that id.
    async fn update(&self, id: &str, apply: Mutation<T>) -> Result<Option<T>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

fn upsert<T: Record>(records: &mut Vec<T>, record: T) {
    match records.iter_mut().find(|existing| existing.id() == record.id()) {
        Some(slot) => *slot = record,
        None => records.push(record),
    }
}

/// A collection persisted as one pretty-printed JSON array. The whole file is
/// read on every call and rewritten on every mutation, under a per-collection
/// lock.
pub struct JsonFileCollection<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> JsonFileCollection<T> {
    /// Creates the parent directory and an empty array file if missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::io(parent, err))?;
        }

        let collection = Self {
            path,
            lock: Mutex::new(()),
            _marker: PhantomData,
        };

        if fs::metadata(&collection.path).await.is_err() {
            info!("initializing {}", collection.path.display());
            collection.write(&[]).await?;
        }

        Ok(collection)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<T>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(StoreError::io(&self.path, err)),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Writes a sibling `.tmp` file and renames it over the collection, so a
    /// crash mid-write leaves the previous contents intact.
    async fn write(&self, records: &[T]) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(records)?;
        let staging = self.staging_path();
        fs::write(&staging, payload)
            .await
            .map_err(|err| StoreError::io(&staging, err))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|err| StoreError::io(&self.path, err))?;
        debug!("wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl<T: Record> Collection<T> for JsonFileCollection<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|record| record.id() == id))
    }

    async fn put(&self, record: T) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        upsert(&mut records, record);
        self.write(&records).await
    }

    async fn update(&self, id: &str, apply: Mutation<T>) -> Result<Option<T>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let Some(record) = records.iter_mut().find(|record| record.id() == id) else {
            return Ok(None);
        };
        apply(record);
        let updated = record.clone();
        self.write(&records).await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write(&records).await?;
        Ok(true)
    }
}

/// In-process collection, used by tests and anywhere persistence is not wanted.
pub struct MemoryCollection<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> MemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> Collection<T> for MemoryCollection<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.id() == id).cloned())
    }

    async fn put(&self, record: T) -> Result<(), StoreError> {
        upsert(&mut *self.records.write().await, record);
        Ok(())
    }

    async fn update(&self, id: &str, apply: Mutation<T>) -> Result<Option<T>, StoreError> {
        let mut records = self.records.write().await;
        Ok(records.iter_mut().find(|record| record.id() == id).map(|record| {
            apply(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.id() != id);
        Ok(records.len() != before)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    pub fn unique_dir(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "form_builder_{label}_{}_{nanos}_{}",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::unique_dir;
    use super::*;
    use crate::models::Answer;
    use chrono::Utc;
    use std::{collections::BTreeMap, sync::Arc};

    fn response(id: &str, form_id: &str) -> Response {
        Response {
            id: id.to_string(),
            form_id: form_id.to_string(),
            answers: BTreeMap::from([("q1".to_string(), Answer::Single("yes".into()))]),
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn open_creates_empty_pretty_file() {
        let dir = unique_dir("open");
        let path = dir.join(RESPONSES_FILE);
        let collection = JsonFileCollection::<Response>::open(&path).await.unwrap();
        assert!(collection.list().await.unwrap().is_empty());

        collection.put(response("r1", "f1")).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"formId\": \"f1\""));
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = unique_dir("reopen");
        let path = dir.join(RESPONSES_FILE);
        {
            let collection = JsonFileCollection::<Response>::open(&path).await.unwrap();
            collection.put(response("r1", "f1")).await.unwrap();
            collection.put(response("r2", "f2")).await.unwrap();
        }
        let collection = JsonFileCollection::<Response>::open(&path).await.unwrap();
        let ids: Vec<String> = collection
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["r1", "r2"]);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = unique_dir("malformed");
        let path = dir.join(FORMS_FILE);
        let collection = JsonFileCollection::<Form>::open(&path).await.unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        let err = collection.list().await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn writes_replace_the_file_without_leaving_staging() {
        let dir = unique_dir("staging");
        let path = dir.join(FORMS_FILE);
        let collection = JsonFileCollection::<Response>::open(&path).await.unwrap();
        let staging = collection.staging_path();
        assert_eq!(staging, dir.join("forms.json.tmp"));
        assert!(!staging.exists());

        std::fs::write(&staging, "{ half written").unwrap();
        collection.put(response("r1", "f1")).await.unwrap();
        assert!(!staging.exists());
        assert_eq!(collection.list().await.unwrap().len(), 1);

        std::fs::write(&staging, "{ half written").unwrap();
        let reopened = JsonFileCollection::<Response>::open(&path).await.unwrap();
        assert_eq!(reopened.get("r1").await.unwrap().unwrap().form_id, "f1");
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn concurrent_puts_are_not_lost() {
        let dir = unique_dir("concurrent");
        let collection = Arc::new(
            JsonFileCollection::<Response>::open(dir.join(RESPONSES_FILE))
                .await
                .unwrap(),
        );

        let mut tasks = Vec::new();
        for n in 0..20 {
            let collection = Arc::clone(&collection);
            tasks.push(tokio::spawn(async move {
                collection.put(response(&format!("r{n}"), "f1")).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(collection.list().await.unwrap().len(), 20);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let collection = MemoryCollection::<Response>::new();
        collection.put(response("r1", "f1")).await.unwrap();

        let missing = collection
            .update("nope", Box::new(|r: &mut Response| r.form_id.clear()))
            .await
            .unwrap();
        assert!(missing.is_none());

        let updated = collection
            .update("r1", Box::new(|r: &mut Response| r.form_id = "f9".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.form_id, "f9");

        assert!(!collection.delete("nope").await.unwrap());
        assert!(collection.delete("r1").await.unwrap());
        assert!(collection.get("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_in_place() {
        let collection = MemoryCollection::<Response>::new();
        collection.put(response("r1", "f1")).await.unwrap();
        collection.put(response("r2", "f1")).await.unwrap();
        collection.put(response("r1", "f3")).await.unwrap();

        let all = collection.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "r1");
        assert_eq!(all[0].form_id, "f3");
    }
}
