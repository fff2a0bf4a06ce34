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

//! Local filesystem storage implementation.
//!
//! This module provides a `LocalFsStorage` implementation that uses standard
//! Rust filesystem operations. Directory renames map to `rename(2)`, which is
//! what the overwrite swap relies on.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::{join_path, FileStatus, Storage};
use crate::{Error, ErrorKind, Result};

/// Local filesystem storage implementation.
///
/// # Path Normalization
///
/// The storage normalizes paths to handle various formats:
/// - `file:///path/to/file` -> `/path/to/file`
/// - `file:/path/to/file` -> `/path/to/file`
/// - `/path/to/file` -> `/path/to/file`
#[derive(Debug, Clone, Default)]
pub struct LocalFsStorage;

impl LocalFsStorage {
    /// Create a new `LocalFsStorage` instance.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a path by removing the `file:` scheme. Both `file:///a` and
    /// `file://a` resolve to `/a`.
    pub(crate) fn normalize_path(path: &str) -> PathBuf {
        match path
            .strip_prefix("file://")
            .or_else(|| path.strip_prefix("file:"))
        {
            Some(rest) if rest.starts_with('/') => PathBuf::from(rest),
            Some(rest) => Path::new("/").join(rest),
            None => PathBuf::from(path),
        }
    }

    fn create_parent(path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(io_error("create directory", parent))
            }
            None => Ok(()),
        }
    }
}

fn io_error<'a>(action: &'a str, path: &'a Path) -> impl FnOnce(std::io::Error) -> Error + 'a {
    move |e| {
        Error::new(
            ErrorKind::Unexpected,
            format!("Failed to {action} {}", path.display()),
        )
        .with_source(e)
    }
}

#[async_trait]
impl Storage for LocalFsStorage {
    async fn exists(&self, path: &str) -> Result<bool> {
        let path = Self::normalize_path(path);
        Ok(path.exists())
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        let path = Self::normalize_path(path);
        let content = fs::read(&path).map_err(|e| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Failed to read file {}", path.display()),
            )
            .with_source(e)
        })?;
        Ok(Bytes::from(content))
    }

    async fn write(&self, path: &str, bs: Bytes) -> Result<()> {
        let path = Self::normalize_path(path);
        Self::create_parent(&path)?;

        let mut file = fs::File::create(&path).map_err(io_error("create file", &path))?;
        file.write_all(&bs).map_err(io_error("write file", &path))?;
        file.sync_all().map_err(io_error("sync file", &path))?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = Self::normalize_path(path);
        if path.is_file() {
            fs::remove_file(&path).map_err(io_error("delete file", &path))?;
        }
        Ok(())
    }

    async fn create_dir_all(&self, path: &str) -> Result<()> {
        let path = Self::normalize_path(path);
        fs::create_dir_all(&path).map_err(io_error("create directory", &path))?;
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<FileStatus>> {
        let dir = Self::normalize_path(path);
        if !dir.is_dir() {
            return Ok(vec![]);
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(FileStatus {
                path: join_path(path, &name),
                is_dir: entry.file_type()?.is_dir(),
                name,
            });
        }
        entries.sort();
        Ok(entries)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = Self::normalize_path(from);
        let target = Self::normalize_path(to);
        if target.exists() {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("Rename target {} already exists", target.display()),
            ));
        }
        Self::create_parent(&target)?;

        fs::rename(&source, &target).map_err(|e| {
            Error::new(
                ErrorKind::Unexpected,
                format!(
                    "Failed to rename {} to {}",
                    source.display(),
                    target.display()
                ),
            )
            .with_source(e)
        })?;
        Ok(())
    }

    async fn remove_dir_all(&self, path: &str) -> Result<()> {
        let path = Self::normalize_path(path);
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(io_error("delete directory", &path))?;
        }
        Ok(())
    }
}
