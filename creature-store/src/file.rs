//! File-backed creature store with persistence.
//!
//! Keeps creatures in memory and writes them to a single file.
//! Suitable for single-node deployments where durability is needed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use creature_core::constants::DEFAULT_AUTO_SAVE_THRESHOLD;
use creature_core::error::{CreatureError, Result};
use creature_core::traits::CreatureStore;
use creature_core::types::{Creature, CreatureId, CreatureLookupResult};

use crate::MemoryCreatureStore;

/// File format magic bytes
const MAGIC: &[u8; 4] = b"CRTR";
/// Current file format version
const VERSION: u8 = 1;
/// magic + version + count
const HEADER_LEN: usize = 13;

/// File-backed creature store.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "CRTR"
/// version (1 byte): 1
/// count (8 bytes, little endian): number of creatures
/// creatures (variable): JSON array
/// ```
pub struct FileCreatureStore {
    path: PathBuf,
    memory: MemoryCreatureStore,
    /// Bumped after every write lands in memory
    generation: AtomicU64,
    /// Highest generation known to be on disk
    saved_generation: AtomicU64,
    /// Save after this many unsaved writes
    auto_save_threshold: u64,
    writes_since_save: AtomicU64,
    /// Held for the whole write-and-rename of a save
    save_lock: Mutex<()>,
}

impl FileCreatureStore {
    /// Opens the store at `path`, loading it if the file exists.
    ///
    /// A missing file is created on the first save.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            memory: MemoryCreatureStore::new(),
            generation: AtomicU64::new(0),
            saved_generation: AtomicU64::new(0),
            auto_save_threshold: DEFAULT_AUTO_SAVE_THRESHOLD,
            writes_since_save: AtomicU64::new(0),
            save_lock: Mutex::new(()),
        };

        if fs::try_exists(&store.path).await? {
            store.load().await?;
        }

        Ok(store)
    }

    /// Opens the store with a custom auto-save threshold.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let mut store = Self::open(path).await?;
        store.auto_save_threshold = threshold;
        Ok(store)
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let mut file = fs::File::open(&self.path).await?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await?;

        if contents.len() < HEADER_LEN {
            return Err(CreatureError::InvalidStoreFile("file too short".into()));
        }
        if &contents[0..4] != MAGIC {
            return Err(CreatureError::InvalidStoreFile("invalid magic bytes".into()));
        }
        let version = contents[4];
        if version != VERSION {
            return Err(CreatureError::VersionMismatch {
                expected: VERSION,
                actual: version,
            });
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&contents[5..HEADER_LEN]);
        let count = u64::from_le_bytes(count_bytes);

        let creatures: Vec<Creature> = serde_json::from_slice(&contents[HEADER_LEN..])?;
        if creatures.len() as u64 != count {
            return Err(CreatureError::InvalidStoreFile(format!(
                "header says {} creatures, body has {}",
                count,
                creatures.len()
            )));
        }

        info!(count, "Loading creatures from file");
        self.memory.import(creatures)?;

        Ok(())
    }

    /// Writes every creature to the file.
    ///
    /// The file is replaced atomically: contents go to a temp file which is
    /// then renamed over the original. Concurrent saves run one at a time.
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        self.save_locked().await
    }

    /// Writes the file. Caller holds `save_lock`.
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn save_locked(&self) -> Result<()> {
        // Writes land in memory, bump the generation, then count toward
        // auto-save. Anything counted before the reset is in this snapshot.
        self.writes_since_save.store(0, Ordering::SeqCst);
        let generation = self.generation.load(Ordering::SeqCst);

        let creatures = self.memory.all_creatures();
        let count = creatures.len() as u64;
        let body = serde_json::to_vec(&creatures)?;

        let mut contents = Vec::with_capacity(HEADER_LEN + body.len());
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&body);

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        self.saved_generation.fetch_max(generation, Ordering::SeqCst);

        debug!(count, "Store saved");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.saved_generation.load(Ordering::SeqCst)
    }

    /// Saves if there are unsaved changes.
    pub async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the in-memory store for direct access.
    pub fn memory(&self) -> &MemoryCreatureStore {
        &self.memory
    }

    /// Returns the number of creatures.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    async fn maybe_auto_save(&self) {
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst) + 1;
        if writes < self.auto_save_threshold {
            return;
        }

        let _guard = self.save_lock.lock().await;
        // A save that finished while we waited already covered this write
        if self.writes_since_save.load(Ordering::SeqCst) < self.auto_save_threshold {
            return;
        }
        if let Err(e) = self.save_locked().await {
            warn!(path = ?self.path, error = %e, "Auto-save failed, changes stay pending");
        }
    }
}

impl Drop for FileCreatureStore {
    fn drop(&mut self) {
        if self.is_dirty() {
            warn!(path = ?self.path, "FileCreatureStore dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl CreatureStore for FileCreatureStore {
    async fn create_creature(&self, name: &str, description: &str) -> Result<Creature> {
        let creature = self.memory.create_creature(name, description).await?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.maybe_auto_save().await;
        Ok(creature)
    }

    async fn get_creature(&self, id: CreatureId) -> Result<CreatureLookupResult> {
        self.memory.get_creature(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");

        let store = FileCreatureStore::open(&path).await.unwrap();
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");

        let bob = {
            let store = FileCreatureStore::open(&path).await.unwrap();
            let bob = store.create_creature("bob", "likes testing").await.unwrap();
            store.create_creature("gus", "a goose").await.unwrap();
            store.save().await.unwrap();
            bob
        };

        let store = FileCreatureStore::open(&path).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get_creature(bob.id).await.unwrap(),
            CreatureLookupResult::Found(bob)
        );
        // Ids keep counting after a reload
        assert_eq!(store.create_creature("eve", "").await.unwrap().id, 3);
    }

    #[tokio::test]
    async fn test_dirty_tracking() {
        let dir = tempdir().unwrap();
        let store = FileCreatureStore::open(dir.path().join("creatures.db")).await.unwrap();
        assert!(!store.is_dirty());

        store.create_creature("bob", "").await.unwrap();
        assert!(store.is_dirty());

        store.flush().await.unwrap();
        assert!(!store.is_dirty());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_auto_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");

        let store = FileCreatureStore::with_auto_save(&path, 3).await.unwrap();
        store.create_creature("a", "").await.unwrap();
        store.create_creature("b", "").await.unwrap();
        assert!(!path.exists());

        // Third write reaches the threshold
        store.create_creature("c", "").await.unwrap();
        assert!(!store.is_dirty());

        let reloaded = FileCreatureStore::open(&path).await.unwrap();
        assert_eq!(reloaded.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_auto_save() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");
        let store = Arc::new(FileCreatureStore::with_auto_save(&path, 1).await.unwrap());

        let mut tasks = JoinSet::new();
        for i in 0..200 {
            let store = store.clone();
            tasks.spawn(async move { store.create_creature(&format!("c{}", i), "").await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.len(), 200);
        assert!(!store.is_dirty());
        assert!(!path.with_extension("tmp").exists());

        let reloaded = FileCreatureStore::open(&path).await.unwrap();
        assert_eq!(reloaded.len(), 200);
    }

    #[tokio::test]
    async fn test_write_after_save_is_dirty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");
        let store = FileCreatureStore::open(&path).await.unwrap();

        store.create_creature("bob", "").await.unwrap();
        store.save().await.unwrap();
        assert!(!store.is_dirty());

        store.create_creature("gus", "").await.unwrap();
        assert!(store.is_dirty());
        assert_eq!(FileCreatureStore::open(&path).await.unwrap().len(), 1);

        store.flush().await.unwrap();
        assert_eq!(FileCreatureStore::open(&path).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_load_rejects_exhausted_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");

        let body = serde_json::to_vec(&[Creature::new(i64::MAX, "last", "")]).unwrap();
        let mut contents = Vec::new();
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&1u64.to_le_bytes());
        contents.extend_from_slice(&body);
        fs::write(&path, contents).await.unwrap();

        let result = FileCreatureStore::open(&path).await;
        assert!(matches!(result, Err(CreatureError::InvalidStoreFile(_))));
    }

    #[tokio::test]
    async fn test_invalid_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");
        fs::write(&path, b"definitely not a store").await.unwrap();

        let result = FileCreatureStore::open(&path).await;
        assert!(matches!(result, Err(CreatureError::InvalidStoreFile(_))));
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");

        let mut contents = Vec::new();
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION + 1);
        contents.extend_from_slice(&0u64.to_le_bytes());
        contents.extend_from_slice(b"[]");
        fs::write(&path, contents).await.unwrap();

        let result = FileCreatureStore::open(&path).await;
        assert!(matches!(
            result,
            Err(CreatureError::VersionMismatch { expected: VERSION, .. })
        ));
    }

    #[tokio::test]
    async fn test_atomic_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.db");

        let store = FileCreatureStore::open(&path).await.unwrap();
        store.create_creature("bob", "").await.unwrap();
        store.save().await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
