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

//! Storage trait.
//!
//! Storage implementations handle reading, writing, listing and moving files
//! and directories. Partition writers depend on [`Storage::rename`] being
//! atomic for a single file or directory, and on [`Storage::replace_dir`]
//! never losing the replaced directory.

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Error, ErrorKind, Result};

/// Context key of an error whose replaced data could not be moved back. The
/// value is the path the data was left at.
pub const PRESERVED_CONTEXT: &str = "preserved";

/// An entry returned by [`Storage::list`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileStatus {
    /// Absolute path of the entry, using the same prefix as the listed path.
    pub path: String,
    /// Last path segment.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Trait for storage operations.
///
/// # Example
///
/// ```rust,ignore
/// use tablewrite::io::Storage;
///
/// async fn example(storage: Arc<dyn Storage>) -> Result<()> {
///     if !storage.exists("/warehouse/t/part=a").await? {
///         storage.create_dir_all("/warehouse/t/part=a").await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Storage: Debug + Send + Sync {
    /// Check if a file or directory exists at the given path.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Read bytes from a path.
    async fn read(&self, path: &str) -> Result<Bytes>;

    /// Write bytes to a path, creating parent directories.
    ///
    /// The data is durable once this returns.
    async fn write(&self, path: &str, bs: Bytes) -> Result<()>;

    /// Delete a file. Missing files are ignored.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Create a directory and all its parents.
    async fn create_dir_all(&self, path: &str) -> Result<()>;

    /// List direct children of a directory. A missing directory lists as empty.
    async fn list(&self, path: &str) -> Result<Vec<FileStatus>>;

    /// Atomically move a file or directory, creating the parent of `to`.
    ///
    /// Fails if `from` is missing or `to` already exists.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Remove a directory and everything below it. Missing paths are ignored.
    async fn remove_dir_all(&self, path: &str) -> Result<()>;

    /// Moves `source` to `target`, first moving an existing `target` to
    /// `aside`. The caller deletes `aside` once it is no longer needed.
    ///
    /// The default implementation uses two renames, so `target` is briefly
    /// missing in between. If the second rename fails the old `target` is
    /// moved back. If that fails too, the old data stays at `aside` and the
    /// error carries a [`PRESERVED_CONTEXT`] entry naming it.
    async fn replace_dir(&self, source: &str, target: &str, aside: &str) -> Result<()> {
        let had_target = self.exists(target).await?;
        if had_target {
            self.rename(target, aside).await?;
        }

        let err = match self.rename(source, target).await {
            Ok(()) => return Ok(()),
            Err(e) if !had_target => return Err(e),
            Err(e) => e,
        };
        match self.rename(aside, target).await {
            Ok(()) => Err(err),
            Err(restore_err) => {
                tracing::warn!(
                    source = %source,
                    target = %target,
                    error = %err,
                    "Failed to move directory into place"
                );
                Err(Error::new(
                    ErrorKind::Unexpected,
                    format!("Failed to restore {target}, replaced data is preserved at {aside}"),
                )
                .with_context(PRESERVED_CONTEXT, aside)
                .with_source(restore_err))
            }
        }
    }
}
