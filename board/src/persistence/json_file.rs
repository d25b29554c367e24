use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;

/// Rows with a numeric primary key.
pub trait Keyed {
    fn key(&self) -> i64;
}

/// On-disk document: the rows plus the highest id ever handed out.
///
/// `last_id` only grows, so ids of deleted rows are never issued again.
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Table<T> {
    #[serde(default)]
    last_id: i64,
    pub rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: Vec::new(),
        }
    }
}

impl<T: Keyed> Table<T> {
    /// Reserves the next id. Rows carrying ids above the mark (hand-edited
    /// files, bare arrays) push it forward first.
    pub fn allocate_id(&mut self) -> i64 {
        let highest = self.rows.iter().map(Keyed::key).max().unwrap_or(0);
        self.last_id = self.last_id.max(highest) + 1;
        self.last_id
    }
}

// Bare arrays are still accepted and rewritten as a table on the next write.
#[derive(Deserialize)]
#[serde(untagged, bound(deserialize = "T: DeserializeOwned"))]
enum Document<T> {
    Table(Table<T>),
    Rows(Vec<T>),
}

/// A JSON table of `T` on disk, read and rewritten as a whole.
///
/// Every access runs on the blocking pool with the file's lock held, so
/// concurrent writers never interleave. Writes land in a temp file next to the
/// target, are fsynced, then renamed over it.
pub struct JsonFile<T> {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
    _rows: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonFile<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: self.lock.clone(),
            _rows: PhantomData,
        }
    }
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::internal(&format!("failed to create {}", parent.display()), e)
            })?;
        }

        Ok(Self {
            path: Arc::new(path),
            lock: Arc::new(Mutex::new(())),
            _rows: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(Vec<T>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.clone();

        run_blocking(move || {
            let _guard = file.guard()?;
            f(load::<T>(&file.path)?.rows)
        })
        .await
    }

    /// Hands the current table to `f` and persists it if `f` returns `Ok`.
    pub async fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Table<T>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.clone();

        run_blocking(move || {
            let _guard = file.guard()?;
            let mut table = load(&file.path)?;
            let out = f(&mut table)?;
            store(&file.path, &table)?;
            Ok(out)
        })
        .await
    }

    /// Like [`modify`](Self::modify), with the rows of `other` visible and
    /// locked for the duration. This file's lock is taken first; `other` must
    /// never call back into this file while holding its own lock.
    pub async fn modify_with<U, R, F>(&self, other: &JsonFile<U>, f: F) -> Result<R>
    where
        U: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce(&mut Table<T>, &[U]) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.clone();
        let other = other.clone();

        run_blocking(move || {
            let _guard = file.guard()?;
            let _other_guard = other.guard()?;
            let related = load::<U>(&other.path)?.rows;
            let mut table = load(&file.path)?;
            let out = f(&mut table, &related)?;
            store(&file.path, &table)?;
            Ok(out)
        })
        .await
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))
    }
}

async fn run_blocking<R, F>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::internal("file store task failed", e))?
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<Table<T>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Table::default()),
        Err(e) => return Err(Error::internal(&format!("failed to read {}", path.display()), e)),
    };

    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Table::default());
    }

    let document = serde_json::from_slice(&raw)
        .map_err(|e| Error::internal(&format!("failed to decode {}", path.display()), e))?;
    Ok(match document {
        Document::Table(table) => table,
        Document::Rows(rows) => Table { last_id: 0, rows },
    })
}

fn store<T: Serialize>(path: &Path, table: &Table<T>) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => Path::new("."),
    };
    let context = format!("failed to write {}", path.display());

    let payload = serde_json::to_vec_pretty(table).map_err(|e| Error::internal(&context, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::internal(&context, e))?;
    tmp.write_all(&payload)
        .map_err(|e| Error::internal(&context, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::internal(&context, e))?;
    tmp.persist(path)
        .map_err(|e| Error::internal(&context, e.error))?;
    Ok(())
}
