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

use std::sync::Arc;

use bytes::Bytes;

use super::{FileStatus, LocalFsStorage, MemoryStorage, Storage};
use crate::Result;

/// FileIO implementation, used to manipulate files in underlying storage.
///
/// # Note
///
/// All paths passed to `FileIO` must be absolute paths starting with the scheme string
/// appropriate for the storage backend being used.
///
/// | Storage            | Expected Path Format                          |
/// |--------------------|-----------------------------------------------|
/// | Local file system  | `/path/to/file` or `file:///path/to/file`     |
/// | Memory             | `memory://path/to/file`                       |
///
/// # Example
///
/// ```rust,ignore
/// use tablewrite::io::FileIO;
///
/// // Create FileIO with memory storage for testing
/// let file_io = FileIO::new_with_memory();
///
/// // Create FileIO with local filesystem storage
/// let file_io = FileIO::new_with_fs();
/// ```
#[derive(Clone, Debug)]
pub struct FileIO {
    storage: Arc<dyn Storage>,
}

impl FileIO {
    /// Create a new FileIO backed by in-memory storage.
    ///
    /// This is useful for testing scenarios where persistent storage is not needed.
    pub fn new_with_memory() -> Self {
        Self::from_storage(Arc::new(MemoryStorage::new()))
    }

    /// Create a new FileIO backed by local filesystem storage.
    pub fn new_with_fs() -> Self {
        Self::from_storage(Arc::new(LocalFsStorage::new()))
    }

    /// Create a new FileIO over a custom storage implementation.
    pub fn from_storage(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Check file or directory exists.
    pub async fn exists(&self, path: impl AsRef<str>) -> Result<bool> {
        self.storage.exists(path.as_ref()).await
    }

    /// Reads a whole file.
    pub async fn read(&self, path: impl AsRef<str>) -> Result<Bytes> {
        self.storage.read(path.as_ref()).await
    }

    /// Writes a whole file, creating its parent directories.
    pub async fn write(&self, path: impl AsRef<str>, bs: Bytes) -> Result<()> {
        self.storage.write(path.as_ref(), bs).await
    }

    /// Deletes file.
    pub async fn delete(&self, path: impl AsRef<str>) -> Result<()> {
        self.storage.delete(path.as_ref()).await
    }

    /// Creates a directory and its parents.
    pub async fn create_dir_all(&self, path: impl AsRef<str>) -> Result<()> {
        self.storage.create_dir_all(path.as_ref()).await
    }

    /// Lists the direct children of a directory.
    pub async fn list(&self, path: impl AsRef<str>) -> Result<Vec<FileStatus>> {
        self.storage.list(path.as_ref()).await
    }

    /// Atomically moves a file or directory.
    pub async fn rename(&self, from: impl AsRef<str>, to: impl AsRef<str>) -> Result<()> {
        self.storage.rename(from.as_ref(), to.as_ref()).await
    }

    /// Moves `source` over `target`, parking the old `target` at `aside`.
    ///
    /// See [`Storage::replace_dir`].
    pub async fn replace_dir(
        &self,
        source: impl AsRef<str>,
        target: impl AsRef<str>,
        aside: impl AsRef<str>,
    ) -> Result<()> {
        self.storage
            .replace_dir(source.as_ref(), target.as_ref(), aside.as_ref())
            .await
    }

    /// Removes a directory and everything below it.
    pub async fn remove_dir_all(&self, path: impl AsRef<str>) -> Result<()> {
        self.storage.remove_dir_all(path.as_ref()).await
    }
}
