//! Per-user record storage.
//!
//! Records (ingredients, drinks, menus) are kept per user and per
//! collection. [`JsonStore`] keeps each collection in its own JSON file with
//! file locking; [`MemoryStore`] keeps everything in process.

use crate::{Drink, Error, Ingredient, Menu, Result, UserId};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Something that can be stored in a [`Repository`]
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// File/collection name
    const COLLECTION: &'static str;
    /// Human-readable kind for messages
    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
}

impl Record for Ingredient {
    const COLLECTION: &'static str = "ingredients";
    const KIND: &'static str = "Ingredient";

    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for Drink {
    const COLLECTION: &'static str = "drinks";
    const KIND: &'static str = "Drink";

    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for Menu {
    const COLLECTION: &'static str = "menus";
    const KIND: &'static str = "Menu";

    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Storage keyed by user id. Last write wins.
pub trait Repository {
    /// All records of a kind, in insertion order
    fn list<R: Record>(&self, user: &UserId) -> Result<Vec<R>>;

    /// Insert or replace (by id)
    fn put<R: Record>(&self, user: &UserId, record: &R) -> Result<()>;

    /// Like [`Repository::put`], but fails with [`Error::Duplicate`] if another
    /// record of the kind already has the same name (case-insensitive). The
    /// check and the write happen under one lock.
    fn put_unique<R: Record>(&self, user: &UserId, record: &R) -> Result<()>;

    /// Remove by id; returns whether anything was removed
    fn delete<R: Record>(&self, user: &UserId, id: Uuid) -> Result<bool>;

    fn get<R: Record>(&self, user: &UserId, id: Uuid) -> Result<Option<R>> {
        Ok(self.list::<R>(user)?.into_iter().find(|r| r.id() == id))
    }

    /// Case-insensitive name lookup
    fn find_by_name<R: Record>(&self, user: &UserId, name: &str) -> Result<Option<R>> {
        let wanted = name.to_lowercase();
        Ok(self
            .list::<R>(user)?
            .into_iter()
            .find(|r| r.name().to_lowercase() == wanted))
    }
}

fn upsert<R: Record>(records: &mut Vec<R>, record: &R) {
    match records.iter_mut().find(|r| r.id() == record.id()) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
}

fn upsert_unique<R: Record>(records: &mut Vec<R>, record: &R) -> Result<()> {
    let wanted = record.name().to_lowercase();
    if let Some(other) = records
        .iter()
        .find(|r| r.id() != record.id() && r.name().to_lowercase() == wanted)
    {
        return Err(Error::Duplicate {
            kind: R::KIND,
            name: other.name().to_string(),
        });
    }
    upsert(records, record);
    Ok(())
}

// ============================================================================
// JSON files
// ============================================================================

/// Stores `<root>/users/<user>/<collection>.json`
#[derive(Clone, Debug)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_dir(&self, user: &UserId) -> PathBuf {
        self.root.join("users").join(user.as_str())
    }

    pub fn collection_path<R: Record>(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(format!("{}.json", R::COLLECTION))
    }

    fn lock_path<R: Record>(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(format!(".{}.lock", R::COLLECTION))
    }

    /// Read a collection file under a shared lock; `None` if it doesn't exist
    fn read_raw(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        Ok(Some(contents))
    }

    /// Strict load used before writing: corruption is an error, not an empty list
    fn load_strict<R: Record>(path: &Path) -> Result<Vec<R>> {
        match Self::read_raw(path)? {
            None => Ok(Vec::new()),
            Some(contents) if contents.trim().is_empty() => Ok(Vec::new()),
            Some(contents) => serde_json::from_str(&contents).map_err(|e| Error::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Atomically replace a collection file
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames
    /// it over the original.
    fn save<R: Record>(path: &Path, records: &[R]) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "collection path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!("Saved {} {} to {:?}", records.len(), R::COLLECTION, path);
        Ok(())
    }

    /// Load-modify-save under an exclusive lock on the collection's lock file
    fn modify<R, T, F>(&self, user: &UserId, f: F) -> Result<T>
    where
        R: Record,
        F: FnOnce(&mut Vec<R>) -> Result<(T, bool)>,
    {
        let dir = self.user_dir(user);
        std::fs::create_dir_all(&dir)?;

        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.lock_path::<R>(user))?;
        lock.lock_exclusive()?;

        let result = (|| -> Result<T> {
            let path = self.collection_path::<R>(user);
            let mut records = Self::load_strict::<R>(&path)?;
            let (value, changed) = f(&mut records)?;
            if changed {
                Self::save(&path, &records)?;
            }
            Ok(value)
        })();

        lock.unlock()?;
        result
    }
}

impl Repository for JsonStore {
    fn list<R: Record>(&self, user: &UserId) -> Result<Vec<R>> {
        let path = self.collection_path::<R>(user);
        match Self::load_strict::<R>(&path) {
            Ok(records) => Ok(records),
            Err(Error::Corrupt { path, reason }) => {
                tracing::warn!(
                    "Failed to parse {} file {}: {}. Treating as empty.",
                    R::COLLECTION,
                    path,
                    reason
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn put<R: Record>(&self, user: &UserId, record: &R) -> Result<()> {
        self.modify::<R, _, _>(user, |records| {
            upsert(records, record);
            Ok(((), true))
        })?;
        tracing::info!("Stored {} '{}' for {}", R::KIND, record.name(), user);
        Ok(())
    }

    fn put_unique<R: Record>(&self, user: &UserId, record: &R) -> Result<()> {
        self.modify::<R, _, _>(user, |records| {
            upsert_unique(records, record)?;
            Ok(((), true))
        })?;
        tracing::info!("Stored {} '{}' for {}", R::KIND, record.name(), user);
        Ok(())
    }

    fn delete<R: Record>(&self, user: &UserId, id: Uuid) -> Result<bool> {
        let removed = self.modify::<R, _, _>(user, |records| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            let removed = records.len() != before;
            Ok((removed, removed))
        })?;
        if removed {
            tracing::info!("Deleted {} {} for {}", R::KIND, id, user);
        }
        Ok(removed)
    }
}

// ============================================================================
// In memory
// ============================================================================

type Collections = HashMap<(UserId, &'static str), Vec<serde_json::Value>>;

/// In-process store. Records are kept serialized so any [`Record`] fits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode<R: Record>(values: &[serde_json::Value]) -> Result<Vec<R>> {
        values
            .iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(Error::from))
            .collect()
    }

    /// Load-modify-store while holding the write lock for the whole update
    fn modify<R, T, F>(&self, user: &UserId, f: F) -> Result<T>
    where
        R: Record,
        F: FnOnce(&mut Vec<R>) -> Result<(T, bool)>,
    {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        let key = (user.clone(), R::COLLECTION);

        let mut records = match collections.get(&key) {
            Some(values) => Self::decode::<R>(values)?,
            None => Vec::new(),
        };
        let (value, changed) = f(&mut records)?;
        if changed {
            let values = records
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            collections.insert(key, values);
        }
        Ok(value)
    }
}

impl Repository for MemoryStore {
    fn list<R: Record>(&self, user: &UserId) -> Result<Vec<R>> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        match collections.get(&(user.clone(), R::COLLECTION)) {
            Some(values) => Self::decode(values),
            None => Ok(Vec::new()),
        }
    }

    fn put<R: Record>(&self, user: &UserId, record: &R) -> Result<()> {
        self.modify::<R, _, _>(user, |records| {
            upsert(records, record);
            Ok(((), true))
        })
    }

    fn put_unique<R: Record>(&self, user: &UserId, record: &R) -> Result<()> {
        self.modify::<R, _, _>(user, |records| {
            upsert_unique(records, record)?;
            Ok(((), true))
        })
    }

    fn delete<R: Record>(&self, user: &UserId, id: Uuid) -> Result<bool> {
        self.modify::<R, _, _>(user, |records| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            let removed = records.len() != before;
            Ok((removed, removed))
        })
    }
}
