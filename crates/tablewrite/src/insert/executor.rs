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

//! Runs a write plan and registers the written partitions.

use std::sync::Arc;

use futures::{stream, StreamExt};

use super::{CatalogPartitionIndex, ExistingPartitionIndex, WriteAction, WritePlanBuilder, WriteRequest};
use crate::config::WriteConfig;
use crate::spec::ConcretePartition;
use crate::writer::{PartitionWriter, WrittenStats};
use crate::{Catalog, Error, ErrorKind, Result};

/// Outcome of one partition of an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionWriteResult {
    /// Partition written.
    pub partition: ConcretePartition,
    /// Action applied.
    pub action: WriteAction,
    /// Write statistics, zero for skipped partitions.
    pub stats: WrittenStats,
}

/// Outcome of an insert.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InsertSummary {
    /// Per-partition results, sorted by partition path.
    pub partitions: Vec<PartitionWriteResult>,
}

impl InsertSummary {
    /// Rows written across all partitions.
    pub fn total_rows(&self) -> u64 {
        self.partitions.iter().map(|p| p.stats.rows_written).sum()
    }

    /// Result for the given partition.
    pub fn get(&self, partition: &ConcretePartition) -> Option<&PartitionWriteResult> {
        self.partitions.iter().find(|p| &p.partition == partition)
    }
}

/// Plans and executes inserts against tables of a catalog.
///
/// # Example
///
/// ```rust,ignore
/// let executor = InsertExecutor::new(catalog.clone(), WriteConfig::default());
/// let summary = executor.execute(request).await?;
/// println!("wrote {} rows", summary.total_rows());
/// ```
#[derive(Debug, Clone)]
pub struct InsertExecutor {
    catalog: Arc<dyn Catalog>,
    index: Arc<dyn ExistingPartitionIndex>,
    config: WriteConfig,
}

impl InsertExecutor {
    /// Creates an executor that looks up existing partitions in `catalog`.
    pub fn new(catalog: Arc<dyn Catalog>, config: WriteConfig) -> Self {
        Self {
            index: Arc::new(CatalogPartitionIndex::new(catalog.clone())),
            catalog,
            config,
        }
    }

    /// Replaces the index consulted for IF NOT EXISTS inserts.
    pub fn with_partition_index(mut self, index: Arc<dyn ExistingPartitionIndex>) -> Self {
        self.index = index;
        self
    }

    /// Write configuration.
    pub fn config(&self) -> &WriteConfig {
        &self.config
    }

    /// Plans and writes `request`.
    ///
    /// Partitions are written independently; a failed partition does not roll
    /// back the others. Every successfully written partition is registered in
    /// the catalog, and the first failure, if any, is returned.
    pub async fn execute(&self, request: WriteRequest) -> Result<InsertSummary> {
        let plan = WritePlanBuilder::new(self.index.as_ref())
            .with_max_dynamic_partitions(self.config.max_dynamic_partitions)
            .with_default_mode(self.config.partition_mode)
            .build_plan(request)
            .await?;

        let table = plan.table().clone();
        let writer = PartitionWriter::new(table.clone());

        let results = stream::iter(plan.into_ops())
            .map(|op| {
                let writer = &writer;
                async move {
                    let partition = op.partition.clone();
                    let action = op.action;
                    let stats = writer.execute(op).await;
                    (partition, action, stats)
                }
            })
            .buffer_unordered(self.config.write_parallelism.max(1))
            .collect::<Vec<_>>()
            .await;

        if let Err(e) = writer.cleanup().await {
            tracing::warn!(
                table = %table.identifier(),
                error = %e,
                "Failed to clean up staging directory"
            );
        }

        let mut summary = InsertSummary::default();
        let mut first_error = None;
        for (partition, action, stats) in results {
            let stats = match stats {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::warn!(
                        table = %table.identifier(),
                        partition = %partition,
                        error = %e,
                        "Partition write failed"
                    );
                    first_error.get_or_insert(e);
                    continue;
                }
            };

            if action != WriteAction::Skip && !partition.is_unpartitioned() {
                if let Err(e) = self
                    .catalog
                    .register_partition(table.identifier(), &partition, &stats.location)
                    .await
                {
                    first_error.get_or_insert(
                        Error::new(
                            ErrorKind::CatalogRegistrationError,
                            format!("Failed to register partition {partition}"),
                        )
                        .with_context("partition", partition.to_string())
                        .with_source(e),
                    );
                } else {
                    tracing::debug!(
                        table = %table.identifier(),
                        partition = %partition,
                        "Registered partition"
                    );
                }
            }

            summary.partitions.push(PartitionWriteResult {
                partition,
                action,
                stats,
            });
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        summary
            .partitions
            .sort_by(|a, b| a.partition.cmp(&b.partition));
        tracing::info!(
            table = %table.identifier(),
            partitions = summary.partitions.len(),
            rows = summary.total_rows(),
            "Insert finished"
        );
        Ok(summary)
    }
}
