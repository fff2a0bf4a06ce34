// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Pure Rust in-memory storage implementation for testing.
//!
//! This module provides a `MemoryStorage` implementation that keeps files in
//! a thread-safe `HashMap`. Directories are implicit in file paths, except for
//! empty ones created with `create_dir_all`, which are tracked separately.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use super::{join_path, FileStatus, Storage};
use crate::{Error, ErrorKind, Result};

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<String, Bytes>,
    dirs: HashSet<String>,
}

impl MemoryState {
    fn is_dir(&self, path: &str) -> bool {
        if path.is_empty() || self.dirs.contains(path) {
            return true;
        }
        let prefix = format!("{path}/");
        self.files.keys().any(|k| k.starts_with(&prefix))
            || self.dirs.iter().any(|d| d.starts_with(&prefix))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.is_dir(path)
    }

    fn check_move(&self, from: &str, to: &str) -> Result<()> {
        if self.exists(to) {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("Rename target {to} already exists"),
            ));
        }
        if !self.exists(from) {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("Rename source {from} does not exist"),
            ));
        }
        Ok(())
    }

    /// Moves a file or a directory tree. Callers check the move first.
    fn move_entry(&mut self, from: &str, to: &str) {
        if let Some(bytes) = self.files.remove(from) {
            self.add_parent_dirs(to);
            self.files.insert(to.to_string(), bytes);
            return;
        }

        let prefix = format!("{from}/");
        let moved_files = self
            .files
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect::<Vec<_>>();
        for key in moved_files {
            if let Some(bytes) = self.files.remove(&key) {
                self.files.insert(format!("{to}{}", &key[from.len()..]), bytes);
            }
        }

        let moved_dirs = self
            .dirs
            .iter()
            .filter(|d| *d == from || d.starts_with(&prefix))
            .cloned()
            .collect::<Vec<_>>();
        for dir in moved_dirs {
            self.dirs.remove(&dir);
            self.dirs.insert(format!("{to}{}", &dir[from.len()..]));
        }

        self.add_parent_dirs(to);
        self.dirs.insert(to.to_string());
    }

    fn add_parent_dirs(&mut self, path: &str) {
        let mut current = path;
        while let Some((parent, _)) = current.rsplit_once('/') {
            self.dirs.insert(parent.to_string());
            current = parent;
        }
    }
}

/// In-memory storage implementation.
///
/// Renames of whole directories happen under a single write lock, so other
/// readers observe either the old or the new layout.
///
/// # Path Normalization
///
/// The storage normalizes paths to handle various formats:
/// - `memory://path/to/file` -> `path/to/file`
/// - `memory:/path/to/file` -> `path/to/file`
/// - `/path/to/file/` -> `path/to/file`
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a path by removing scheme prefixes and surrounding slashes.
    pub(crate) fn normalize_path(path: &str) -> String {
        let path = path.strip_prefix("memory://").unwrap_or(path);
        let path = path.strip_prefix("memory:/").unwrap_or(path);
        path.trim_matches('/').to_string()
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|e| {
            Error::new(
                ErrorKind::Unexpected,
                format!("Failed to acquire read lock: {e}"),
            )
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|e| {
            Error::new(
                ErrorKind::Unexpected,
                format!("Failed to acquire write lock: {e}"),
            )
        })
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, path: &str) -> Result<bool> {
        let normalized = Self::normalize_path(path);
        Ok(self.read_state()?.exists(&normalized))
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        let normalized = Self::normalize_path(path);
        let state = self.read_state()?;
        match state.files.get(&normalized) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(Error::new(
                ErrorKind::DataInvalid,
                format!("File not found: {path}"),
            )),
        }
    }

    async fn write(&self, path: &str, bs: Bytes) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut state = self.write_state()?;
        state.add_parent_dirs(&normalized);
        state.files.insert(normalized, bs);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut state = self.write_state()?;
        state.files.remove(&normalized);
        Ok(())
    }

    async fn create_dir_all(&self, path: &str) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut state = self.write_state()?;
        state.add_parent_dirs(&normalized);
        state.dirs.insert(normalized);
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<FileStatus>> {
        let normalized = Self::normalize_path(path);
        let prefix = if normalized.is_empty() {
            String::new()
        } else {
            format!("{normalized}/")
        };
        let state = self.read_state()?;

        // name -> is_dir
        let mut children = BTreeMap::new();
        for file in state.files.keys() {
            if let Some(rest) = file.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((dir, _)) => children.insert(dir.to_string(), true),
                    None => children.insert(rest.to_string(), false),
                };
            }
        }
        for dir in &state.dirs {
            if let Some(rest) = dir.strip_prefix(&prefix) {
                let name = rest.split('/').next().unwrap_or(rest);
                if !name.is_empty() {
                    children.insert(name.to_string(), true);
                }
            }
        }

        Ok(children
            .into_iter()
            .map(|(name, is_dir)| FileStatus {
                path: join_path(path, &name),
                name,
                is_dir,
            })
            .collect())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = Self::normalize_path(from);
        let to = Self::normalize_path(to);
        let mut state = self.write_state()?;
        state.check_move(&from, &to)?;
        state.move_entry(&from, &to);
        Ok(())
    }

    /// Exchanges the directories under one write lock, so readers never see
    /// `target` missing.
    async fn replace_dir(&self, source: &str, target: &str, aside: &str) -> Result<()> {
        let source = Self::normalize_path(source);
        let target = Self::normalize_path(target);
        let aside = Self::normalize_path(aside);
        let mut state = self.write_state()?;

        let had_target = state.exists(&target);
        if had_target {
            state.check_move(&target, &aside)?;
        }
        if !state.exists(&source) {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("Rename source {source} does not exist"),
            ));
        }

        if had_target {
            state.move_entry(&target, &aside);
        }
        state.move_entry(&source, &target);
        Ok(())
    }

    async fn remove_dir_all(&self, path: &str) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let prefix = format!("{normalized}/");
        let mut state = self.write_state()?;
        state.files.retain(|k, _| !k.starts_with(&prefix));
        state
            .dirs
            .retain(|d| *d != normalized && !d.starts_with(&prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            MemoryStorage::normalize_path("memory://path/to/file"),
            "path/to/file"
        );
        assert_eq!(
            MemoryStorage::normalize_path("memory:/path/to/file"),
            "path/to/file"
        );
        assert_eq!(MemoryStorage::normalize_path("/path/to/dir/"), "path/to/dir");
    }

    #[tokio::test]
    async fn test_memory_storage_write_read() {
        let storage = MemoryStorage::new();
        let content = Bytes::from("Hello, World!");

        storage
            .write("memory://t/part=a/f1", content.clone())
            .await
            .unwrap();

        assert!(storage.exists("memory://t/part=a/f1").await.unwrap());
        assert!(storage.exists("memory://t/part=a").await.unwrap());
        assert!(!storage.exists("memory://t/part=b").await.unwrap());
        assert_eq!(storage.read("/t/part=a/f1").await.unwrap(), content);
    }

    #[tokio::test]
    async fn test_memory_storage_read_missing() {
        let storage = MemoryStorage::new();
        let err = storage.read("memory://missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);
    }

    #[tokio::test]
    async fn test_memory_storage_list() {
        let storage = MemoryStorage::new();
        storage
            .write("memory://t/part=a/f1", Bytes::from("1"))
            .await
            .unwrap();
        storage
            .write("memory://t/f0", Bytes::from("0"))
            .await
            .unwrap();
        storage.create_dir_all("memory://t/part=b").await.unwrap();

        let entries = storage.list("memory://t").await.unwrap();
        assert_eq!(entries, vec![
            FileStatus {
                path: "memory://t/f0".to_string(),
                name: "f0".to_string(),
                is_dir: false,
            },
            FileStatus {
                path: "memory://t/part=a".to_string(),
                name: "part=a".to_string(),
                is_dir: true,
            },
            FileStatus {
                path: "memory://t/part=b".to_string(),
                name: "part=b".to_string(),
                is_dir: true,
            },
        ]);
        assert!(storage.list("memory://other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_storage_rename_dir() {
        let storage = MemoryStorage::new();
        storage
            .write("memory://t/.staging/part=a/f1", Bytes::from("1"))
            .await
            .unwrap();
        storage
            .write("memory://t/.staging/part=a/f2", Bytes::from("2"))
            .await
            .unwrap();

        storage
            .rename("memory://t/.staging/part=a", "memory://t/part=a")
            .await
            .unwrap();

        assert!(!storage.exists("memory://t/.staging/part=a").await.unwrap());
        assert_eq!(
            storage.read("memory://t/part=a/f2").await.unwrap(),
            Bytes::from("2")
        );
        assert_eq!(storage.list("memory://t/part=a").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_memory_storage_rename_errors() {
        let storage = MemoryStorage::new();
        storage
            .write("memory://a/f", Bytes::from("1"))
            .await
            .unwrap();
        storage
            .write("memory://b/f", Bytes::from("2"))
            .await
            .unwrap();

        assert!(storage.rename("memory://a", "memory://b").await.is_err());
        assert!(storage
            .rename("memory://missing", "memory://c")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_memory_storage_replace_dir() {
        let storage = MemoryStorage::new();
        storage
            .write("memory://t/part=a/old", Bytes::from("old"))
            .await
            .unwrap();
        storage
            .write("memory://t/.staging/new/part=a/new", Bytes::from("new"))
            .await
            .unwrap();

        storage
            .replace_dir(
                "memory://t/.staging/new/part=a",
                "memory://t/part=a",
                "memory://t/.staging/old/part=a",
            )
            .await
            .unwrap();

        let names = |entries: Vec<FileStatus>| {
            entries.into_iter().map(|e| e.name).collect::<Vec<_>>()
        };
        assert_eq!(names(storage.list("memory://t/part=a").await.unwrap()), vec!["new"]);
        assert_eq!(
            storage.read("memory://t/.staging/old/part=a/old").await.unwrap(),
            Bytes::from("old")
        );
        assert!(!storage.exists("memory://t/.staging/new/part=a").await.unwrap());

        // A missing source leaves the target in place.
        let err = storage
            .replace_dir(
                "memory://t/.staging/missing",
                "memory://t/part=a",
                "memory://t/.staging/other/part=a",
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(names(storage.list("memory://t/part=a").await.unwrap()), vec!["new"]);
    }

    #[tokio::test]
    async fn test_memory_storage_remove_dir_all() {
        let storage = MemoryStorage::new();
        storage
            .write("memory://t/part=a/f1", Bytes::from("1"))
            .await
            .unwrap();
        storage
            .write("memory://t/part=ab/f1", Bytes::from("1"))
            .await
            .unwrap();

        storage.remove_dir_all("memory://t/part=a").await.unwrap();

        assert!(!storage.exists("memory://t/part=a").await.unwrap());
        assert!(storage.exists("memory://t/part=ab/f1").await.unwrap());
    }
}
