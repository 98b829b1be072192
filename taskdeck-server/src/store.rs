//! Task record store: the document collection backing the service.
//!
//! [`TaskStore`] keeps every task in memory behind an [`RwLock`]. Each
//! mutation is an atomic single-document read-modify-write: the closure
//! passed to [`TaskStore::update`] runs on a copy under the write lock and
//! the copy is committed only if the closure succeeds. Concurrent writers
//! to the same task are serialized and the last one wins.
//!
//! When opened with a data file, the whole collection is rewritten to that
//! file after every committed mutation (write to a temporary file, then
//! rename). A failed write rolls the in-memory change back.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use taskdeck_proto::task::{Task, TaskId};
use tokio::sync::RwLock;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested task does not exist.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// Reading or writing the data file failed.
    #[error("data file {path}: {source}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The data file could not be encoded or decoded.
    #[error("data file encoding: {0}")]
    Serde(#[from] serde_json::Error),
}

/// In-memory task collection with optional JSON file persistence.
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
    data_file: Option<PathBuf>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty, memory-only store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            data_file: None,
        }
    }

    /// Opens a store persisted to `path`, loading any tasks already saved
    /// there. A missing file is an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Serde`] if it does not hold a JSON array of tasks.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tasks: Vec<Task> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::info!(path = %path.display(), count = tasks.len(), "loaded task collection");

        Ok(Self {
            tasks: RwLock::new(tasks.into_iter().map(|t| (t.id.clone(), t)).collect()),
            data_file: Some(path),
        })
    }

    /// Returns the data file, if the store is persisted.
    #[must_use]
    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    /// Number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns `true` if no task is stored.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Returns a copy of the task with the given id.
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Returns copies of every task matching `predicate`, oldest first.
    pub async fn find(&self, predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut found: Vec<Task> = tasks.values().filter(|t| predicate(t)).cloned().collect();
        drop(tasks);
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        found
    }

    /// Inserts a new task and returns it.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the data file cannot be written; the
    /// task is not stored in that case.
    pub async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let previous = tasks.insert(task.id.clone(), task.clone());
        if let Err(e) = self.persist(&tasks).await {
            match previous {
                Some(old) => tasks.insert(task.id.clone(), old),
                None => tasks.remove(&task.id),
            };
            return Err(e);
        }
        drop(tasks);
        Ok(task)
    }

    /// Atomically applies `f` to the task with the given id.
    ///
    /// `f` works on a copy; the copy replaces the stored task only if `f`
    /// returns `Ok`, otherwise the store is left unchanged. Returns the
    /// committed task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] (converted into `E`) if the task does
    /// not exist, the error of `f` if it fails, or a persistence error.
    pub async fn update<F, E>(&self, id: &TaskId, f: F) -> Result<Task, E>
    where
        F: FnOnce(&mut Task) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut tasks = self.tasks.write().await;
        let Some(current) = tasks.get(id) else {
            return Err(StoreError::NotFound(id.clone()).into());
        };
        let mut next = current.clone();
        f(&mut next)?;

        let previous = tasks.insert(id.clone(), next.clone());
        if let Err(e) = self.persist(&tasks).await {
            if let Some(old) = previous {
                tasks.insert(id.clone(), old);
            }
            return Err(e.into());
        }
        drop(tasks);
        Ok(next)
    }

    /// Permanently removes the task with the given id if `check` allows it.
    ///
    /// Returns the removed task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] (converted into `E`) if the task does
    /// not exist, the error of `check` if it refuses, or a persistence error.
    pub async fn remove<F, E>(&self, id: &TaskId, check: F) -> Result<Task, E>
    where
        F: FnOnce(&Task) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut tasks = self.tasks.write().await;
        let Some(current) = tasks.get(id) else {
            return Err(StoreError::NotFound(id.clone()).into());
        };
        check(current)?;

        let Some(removed) = tasks.remove(id) else {
            return Err(StoreError::NotFound(id.clone()).into());
        };
        if let Err(e) = self.persist(&tasks).await {
            tasks.insert(id.clone(), removed);
            return Err(e.into());
        }
        drop(tasks);
        Ok(removed)
    }

    /// Rewrites the data file with the given collection.
    async fn persist(&self, tasks: &HashMap<TaskId, Task>) -> Result<(), StoreError> {
        let Some(path) = &self.data_file else {
            return Ok(());
        };
        let mut docs: Vec<&Task> = tasks.values().collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let bytes = serde_json::to_vec_pretty(&docs)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), count = docs.len(), "task collection persisted");
        Ok(())
    }
}
