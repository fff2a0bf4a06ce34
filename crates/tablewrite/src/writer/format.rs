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

//! Table formats: how a table stages data files and swaps them into place.
//!
//! Both formats stage data under a per-job directory inside the table
//! location, then make it visible with renames:
//!
//! - Append moves the staged files into the partition directory.
//! - Overwrite replaces the partition directory with the staged one through
//!   [`FileIO::replace_dir`], then deletes the old contents. Old contents that
//!   cannot be moved back after a failure stay in the staging area, which
//!   cleanup then keeps.
//!
//! An unpartitioned table's data lives in the table root, which also hosts
//! the staging directory, so its overwrite swaps individual files instead.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arrow_array::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use uuid::Uuid;

use super::{DataFileNameGenerator, PartitionLocationGenerator, WrittenStats};
use crate::insert::WriteAction;
use crate::io::{join_path, list_data_files, FileIO, PRESERVED_CONTEXT};
use crate::spec::{ConcretePartition, TableKind};
use crate::table::Table;
use crate::{Error, ErrorKind, Result};

const STAGED_DATA_DIR: &str = "-ext-10000";
const REPLACED_DATA_DIR: &str = "-ext-10001";
const DATA_SOURCE_STAGING_PREFIX: &str = ".spark-staging";

/// Data files of one partition written to the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFiles {
    /// Partition the files belong to.
    pub partition: ConcretePartition,
    /// Staging directory holding the files.
    pub dir: String,
    /// File names inside `dir`.
    pub files: Vec<String>,
    /// Rows across all files.
    pub rows: u64,
}

/// Capability interface of a table format.
///
/// Chosen once per writer from the table kind with [`open_format`].
#[async_trait]
pub trait TableFormat: Debug + Send + Sync {
    /// Directory holding the partition's committed data.
    fn location_for(&self, partition: &ConcretePartition) -> String;

    /// Writes `batches` as data files in the staging area.
    ///
    /// On failure the partition's staging directory is removed and the
    /// committed data is untouched.
    async fn stage(
        &self,
        partition: &ConcretePartition,
        batches: &[RecordBatch],
    ) -> Result<StagedFiles>;

    /// Makes staged files visible, replacing or extending the partition.
    async fn swap(&self, staged: StagedFiles, action: WriteAction) -> Result<WrittenStats>;

    /// Removes this writer's staging area.
    async fn cleanup(&self) -> Result<()>;
}

/// Opens the format matching the table kind.
pub fn open_format(table: &Table) -> Arc<dyn TableFormat> {
    match table.metadata().kind() {
        TableKind::Hive => Arc::new(HiveFormat::new(table)),
        TableKind::DataSource => Arc::new(DataSourceFormat::new(table)),
    }
}

/// Name prefix of the staging directories the table's format creates under
/// its location. Readers skip entries with this prefix.
pub fn staging_prefix(table: &Table) -> String {
    match table.metadata().kind() {
        TableKind::Hive => table.metadata().staging_dir().to_string(),
        TableKind::DataSource => DATA_SOURCE_STAGING_PREFIX.to_string(),
    }
}

/// Format of Hive SerDe tables.
///
/// Stages under `<table>/<staging-dir>_hive_<timestamp>_<uuid>` and names data
/// files `part-<NNNNN>-<uuid>`.
#[derive(Debug)]
pub struct HiveFormat {
    committer: StagingCommitter,
}

impl HiveFormat {
    /// Creates the format for a write to `table`.
    pub fn new(table: &Table) -> Self {
        let job_id = Uuid::new_v4().to_string();
        let staging_prefix = staging_prefix(table);
        let staging_dir = format!(
            "{staging_prefix}_hive_{}_{job_id}",
            Utc::now().format("%Y-%m-%d_%H-%M-%S_%3f"),
        );
        Self {
            committer: StagingCommitter::new(
                table,
                staging_prefix,
                staging_dir,
                DataFileNameGenerator::new("part", job_id, None),
            ),
        }
    }
}

#[async_trait]
impl TableFormat for HiveFormat {
    fn location_for(&self, partition: &ConcretePartition) -> String {
        self.committer.target.generate_location(partition)
    }

    async fn stage(
        &self,
        partition: &ConcretePartition,
        batches: &[RecordBatch],
    ) -> Result<StagedFiles> {
        self.committer.stage(partition, batches).await
    }

    async fn swap(&self, staged: StagedFiles, action: WriteAction) -> Result<WrittenStats> {
        self.committer.swap(staged, action).await
    }

    async fn cleanup(&self) -> Result<()> {
        self.committer.cleanup().await
    }
}

/// Format of data source tables.
///
/// Stages under `<table>/.spark-staging-<uuid>` and names data files
/// `part-<NNNNN>-<uuid>.c000.parquet`.
#[derive(Debug)]
pub struct DataSourceFormat {
    committer: StagingCommitter,
}

impl DataSourceFormat {
    /// Creates the format for a write to `table`.
    pub fn new(table: &Table) -> Self {
        let job_id = Uuid::new_v4().to_string();
        Self {
            committer: StagingCommitter::new(
                table,
                staging_prefix(table),
                format!("{DATA_SOURCE_STAGING_PREFIX}-{job_id}"),
                DataFileNameGenerator::new("part", job_id, Some("c000.parquet")),
            ),
        }
    }
}

#[async_trait]
impl TableFormat for DataSourceFormat {
    fn location_for(&self, partition: &ConcretePartition) -> String {
        self.committer.target.generate_location(partition)
    }

    async fn stage(
        &self,
        partition: &ConcretePartition,
        batches: &[RecordBatch],
    ) -> Result<StagedFiles> {
        self.committer.stage(partition, batches).await
    }

    async fn swap(&self, staged: StagedFiles, action: WriteAction) -> Result<WrittenStats> {
        self.committer.swap(staged, action).await
    }

    async fn cleanup(&self) -> Result<()> {
        self.committer.cleanup().await
    }
}

/// Staging and swap mechanics shared by the formats.
#[derive(Debug)]
struct StagingCommitter {
    file_io: FileIO,
    staging_prefix: String,
    staging_root: String,
    target: PartitionLocationGenerator,
    staged: PartitionLocationGenerator,
    replaced: PartitionLocationGenerator,
    file_names: DataFileNameGenerator,
    keep_replaced: AtomicBool,
}

impl StagingCommitter {
    fn new(
        table: &Table,
        staging_prefix: String,
        staging_dir: String,
        file_names: DataFileNameGenerator,
    ) -> Self {
        let staging_root = join_path(table.location(), &staging_dir);
        Self {
            file_io: table.file_io().clone(),
            staging_prefix,
            target: PartitionLocationGenerator::new(table.location()),
            staged: PartitionLocationGenerator::new(join_path(&staging_root, STAGED_DATA_DIR)),
            replaced: PartitionLocationGenerator::new(join_path(&staging_root, REPLACED_DATA_DIR)),
            staging_root,
            file_names,
            keep_replaced: AtomicBool::new(false),
        }
    }

    async fn stage(
        &self,
        partition: &ConcretePartition,
        batches: &[RecordBatch],
    ) -> Result<StagedFiles> {
        let dir = self.staged.generate_location(partition);
        match self.write_files(&dir, batches).await {
            Ok((files, rows)) => {
                tracing::debug!(
                    partition = %partition,
                    dir = %dir,
                    files = files.len(),
                    rows,
                    "Staged data files"
                );
                Ok(StagedFiles {
                    partition: partition.clone(),
                    dir,
                    files,
                    rows,
                })
            }
            Err(e) => {
                if let Err(cleanup_err) = self.file_io.remove_dir_all(&dir).await {
                    tracing::warn!(
                        dir = %dir,
                        error = %cleanup_err,
                        "Failed to remove staging directory"
                    );
                }
                Err(Error::new(
                    ErrorKind::WriteError,
                    format!("Failed to stage data files for partition {partition}"),
                )
                .with_context("partition", partition.to_string())
                .with_context("phase", "stage")
                .with_retryable(true)
                .with_source(e))
            }
        }
    }

    async fn write_files(&self, dir: &str, batches: &[RecordBatch]) -> Result<(Vec<String>, u64)> {
        self.file_io.create_dir_all(dir).await?;

        let rows = batches.iter().map(|b| b.num_rows() as u64).sum::<u64>();
        let Some(first) = batches.iter().find(|b| b.num_rows() > 0) else {
            return Ok((vec![], 0));
        };

        let mut writer = ArrowWriter::try_new(
            Vec::new(),
            first.schema(),
            Some(WriterProperties::builder().build()),
        )?;
        for batch in batches {
            writer.write(batch)?;
        }
        let content = writer.into_inner()?;

        let file_name = self.file_names.generate_file_name();
        self.file_io
            .write(join_path(dir, &file_name), Bytes::from(content))
            .await?;
        Ok((vec![file_name], rows))
    }

    async fn swap(&self, staged: StagedFiles, action: WriteAction) -> Result<WrittenStats> {
        let partition = staged.partition.clone();
        let location = self.target.generate_location(&partition);

        let result = match action {
            WriteAction::Append => self.move_files_in(&staged, &location).await,
            WriteAction::Overwrite if partition.is_unpartitioned() => {
                self.replace_files(&staged, &location).await
            }
            WriteAction::Overwrite => self.replace_dir(&staged, &location).await,
            WriteAction::Skip => Ok(()),
        };

        result.map_err(|e| {
            let mut err = Error::new(
                ErrorKind::WriteError,
                format!("Failed to {action} partition {partition}"),
            )
            .with_context("partition", partition.to_string())
            .with_context("phase", "swap");
            if let Some(preserved) = e.context_value(PRESERVED_CONTEXT) {
                self.keep_replaced.store(true, Ordering::SeqCst);
                err = err.with_context(PRESERVED_CONTEXT, preserved.to_string());
            }
            err.with_source(e)
        })?;

        tracing::debug!(partition = %partition, location = %location, action = %action, "Swapped partition");
        Ok(WrittenStats {
            rows_written: staged.rows,
            files_written: staged.files.len(),
            location,
        })
    }

    /// Moves staged files next to the existing ones. Already moved files are
    /// moved back when a later move fails.
    async fn move_files_in(&self, staged: &StagedFiles, location: &str) -> Result<()> {
        self.file_io.create_dir_all(location).await?;

        let mut moved: Vec<(String, String)> = Vec::with_capacity(staged.files.len());
        for file in &staged.files {
            let from = join_path(&staged.dir, file);
            let to = join_path(location, file);
            if let Err(e) = self.file_io.rename(&from, &to).await {
                if let Err(restore_err) = self.move_back(&moved).await {
                    tracing::warn!(location = %location, error = %e, "Failed to append data files");
                    return Err(Error::new(
                        ErrorKind::Unexpected,
                        format!("Failed to roll back files partially appended to {location}"),
                    )
                    .with_source(restore_err));
                }
                return Err(e);
            }
            moved.push((from, to));
        }
        Ok(())
    }

    /// Replaces a partition directory with the staged one.
    async fn replace_dir(&self, staged: &StagedFiles, location: &str) -> Result<()> {
        let replaced = self.replaced.generate_location(&staged.partition);
        self.file_io
            .replace_dir(&staged.dir, location, &replaced)
            .await?;
        self.remove_replaced(&replaced).await;
        Ok(())
    }

    /// Replaces the data files of an unpartitioned table with the staged ones.
    async fn replace_files(&self, staged: &StagedFiles, location: &str) -> Result<()> {
        let replaced = self.replaced.root().to_string();

        let mut moved_out: Vec<(String, String)> = Vec::new();
        let mut result = Ok(());
        for from in list_data_files(&self.file_io, location, &self.staging_prefix).await? {
            let name = from.rsplit('/').next().unwrap_or(&from).to_string();
            let to = join_path(&replaced, &name);
            if let Err(e) = self.file_io.rename(&from, &to).await {
                result = Err(e);
                break;
            }
            moved_out.push((from, to));
        }
        if result.is_ok() {
            result = self.move_files_in(staged, location).await;
        }

        if let Err(e) = result {
            if let Err(restore_err) = self.move_back(&moved_out).await {
                tracing::warn!(location = %location, error = %e, "Failed to replace data files");
                return Err(Error::new(
                    ErrorKind::Unexpected,
                    format!("Failed to restore data files of {location}, replaced files are preserved at {replaced}"),
                )
                .with_context(PRESERVED_CONTEXT, replaced)
                .with_source(restore_err));
            }
            return Err(e);
        }

        self.remove_replaced(&replaced).await;
        Ok(())
    }

    /// Undoes `(from, to)` moves in reverse order. Every move is attempted;
    /// the first failure is returned.
    async fn move_back(&self, moved: &[(String, String)]) -> Result<()> {
        let mut first_err = None;
        for (from, to) in moved.iter().rev() {
            if let Err(e) = self.file_io.rename(to, from).await {
                tracing::warn!(from = %to, to = %from, error = %e, "Failed to move file back");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    async fn remove_replaced(&self, replaced: &str) {
        if let Err(e) = self.file_io.remove_dir_all(replaced).await {
            tracing::warn!(dir = %replaced, error = %e, "Failed to delete replaced data");
        }
    }

    /// Removes the staging root, or only the staged data when replaced data
    /// could not be restored and is still parked below the root.
    async fn cleanup(&self) -> Result<()> {
        if self.keep_replaced.load(Ordering::SeqCst) {
            tracing::warn!(
                dir = %self.replaced.root(),
                "Keeping replaced data that could not be restored"
            );
            return self.file_io.remove_dir_all(self.staged.root()).await;
        }
        self.file_io.remove_dir_all(&self.staging_root).await
    }
}
