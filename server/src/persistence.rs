use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs;

use system::serde_json;
use system::uuid::Uuid;
use system::{Card, Collection, EntityKind, Replicated, SessionDoc};

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Corrupt {
        collection: &'static str,
        detail: String,
    },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "storage i/o failed: {}", err),
            StorageError::Corrupt { collection, detail } => {
                write!(f, "snapshot of \"{}\" is unreadable: {}", collection, detail)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

/// Owns the two collection snapshot files. Constructed once at startup and
/// handed to the dispatch loop; the loop serializes all writes, so a
/// read-modify-write here never interleaves with another within a process.
#[derive(Clone)]
pub struct PersistenceGateway {
    data_dir: PathBuf,
}

impl PersistenceGateway {
    /// Ensures the data directory exists. Snapshot files are created lazily
    /// on the first upsert; a missing file reads as an empty collection.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await?;
        Ok(Self { data_dir })
    }

    pub async fn fetch_active_cards(&self) -> Result<Vec<Card>, StorageError> {
        self.fetch_active::<Card>().await
    }

    pub async fn fetch_active_sessions(&self) -> Result<Vec<SessionDoc>, StorageError> {
        self.fetch_active::<SessionDoc>().await
    }

    pub async fn upsert_card(&self, doc: Card) -> Result<Card, StorageError> {
        self.upsert(doc).await
    }

    pub async fn upsert_session(&self, doc: SessionDoc) -> Result<SessionDoc, StorageError> {
        self.upsert(doc).await
    }

    /// Stored record count of a collection, tombstones included.
    pub async fn collection_len(&self, kind: EntityKind) -> Result<usize, StorageError> {
        match kind {
            EntityKind::Cards => Ok(self.read::<Card>().await?.len()),
            EntityKind::Sessions => Ok(self.read::<SessionDoc>().await?.len()),
        }
    }

    pub(crate) async fn fetch_active<T: Replicated>(&self) -> Result<Vec<T>, StorageError> {
        let collection = self.read::<T>().await?;
        Ok(collection.fetch_active(T::KIND.restore_limit()))
    }

    pub(crate) async fn upsert<T: Replicated>(&self, doc: T) -> Result<T, StorageError> {
        let mut collection = self.read::<T>().await?;
        let stored = collection.upsert(doc, now_ms());
        self.write::<T>(&collection).await?;
        Ok(stored)
    }

    async fn read<T: Replicated>(&self) -> Result<Collection<T>, StorageError> {
        let path = self.snapshot_path(T::KIND);
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| StorageError::Corrupt {
                collection: T::KIND.collection_name(),
                detail: err.to_string(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Collection::new()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Snapshot replacement goes through a uniquely named temp file and a
    /// rename, so a crashed write never leaves a partial snapshot behind.
    async fn write<T: Replicated>(&self, collection: &Collection<T>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(collection).map_err(|err| StorageError::Corrupt {
            collection: T::KIND.collection_name(),
            detail: err.to_string(),
        })?;
        let tmp = self
            .data_dir
            .join(format!("{}.{}.tmp", T::KIND.collection_name(), Uuid::new_v4()));
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, self.snapshot_path(T::KIND)).await?;
        Ok(())
    }

    fn snapshot_path(&self, kind: EntityKind) -> PathBuf {
        self.data_dir.join(format!("{}.json", kind.collection_name()))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
