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

//! Turns a write request into per-partition write ops.

use futures::TryStreamExt;

use super::{
    check_mode, validate, ExistingPartitionIndex, PartitionMode, PartitionWriteOp, WriteAction,
    WritePlan, WriteRequest,
};
use crate::arrow::PartitionSplitter;
use crate::config::WriteConfig;
use crate::{Error, ErrorKind, Result};

/// Builds [`WritePlan`]s.
#[derive(Debug)]
pub struct WritePlanBuilder<'a> {
    index: &'a dyn ExistingPartitionIndex,
    max_dynamic_partitions: usize,
    default_mode: PartitionMode,
}

impl<'a> WritePlanBuilder<'a> {
    /// Creates a builder consulting `index` for IF NOT EXISTS inserts.
    pub fn new(index: &'a dyn ExistingPartitionIndex) -> Self {
        Self {
            index,
            max_dynamic_partitions: WriteConfig::PROPERTY_MAX_DYNAMIC_PARTITIONS_DEFAULT,
            default_mode: WriteConfig::PROPERTY_DYNAMIC_PARTITION_MODE_DEFAULT,
        }
    }

    /// Partition mode applied to requests that do not set one.
    pub fn with_default_mode(mut self, mode: PartitionMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Limits the number of partitions a dynamic insert may produce.
    pub fn with_max_dynamic_partitions(mut self, max_dynamic_partitions: usize) -> Self {
        self.max_dynamic_partitions = max_dynamic_partitions;
        self
    }

    /// Validates the request and groups its rows by concrete partition.
    ///
    /// Validation and policy errors are returned before any row is read. A
    /// fully static IF NOT EXISTS insert into an existing partition yields a
    /// single [`WriteAction::Skip`] op and leaves the input unread.
    pub async fn build_plan(&self, request: WriteRequest) -> Result<WritePlan> {
        let WriteRequest {
            table,
            partition_spec,
            partition_by,
            overwrite,
            if_not_exists,
            mode,
            rows,
        } = request;

        let metadata = table.metadata_ref();
        let spec = validate(&metadata, &partition_spec, partition_by.as_deref())?;
        check_mode(mode.unwrap_or(self.default_mode), &spec, if_not_exists)?;
        let splitter = PartitionSplitter::try_new(spec.clone(), rows.schema(), metadata.schema())?;

        // Dynamic inserts always replace the partitions they produce.
        let action = if overwrite || !spec.is_fully_static() {
            WriteAction::Overwrite
        } else {
            WriteAction::Append
        };
        let mut plan = WritePlan::new(table.clone());

        if spec.is_fully_static() {
            let partition = spec.to_concrete()?;
            if if_not_exists && self.index.exists(&table, &partition).await? {
                tracing::info!(
                    table = %table.identifier(),
                    partition = %partition,
                    "Partition exists, skipping IF NOT EXISTS insert"
                );
                plan.add(PartitionWriteOp {
                    partition,
                    action: WriteAction::Skip,
                    schema: splitter.data_schema().clone(),
                    batches: vec![],
                });
                return Ok(plan);
            }
            // A static target is written even when the input is empty.
            plan.add(PartitionWriteOp {
                partition,
                action,
                schema: splitter.data_schema().clone(),
                batches: vec![],
            });
        }

        let is_dynamic = !spec.is_fully_static();
        let mut stream = rows.into_stream();
        while let Some(batch) = stream.try_next().await? {
            if batch.num_rows() == 0 {
                continue;
            }
            for (partition, batch) in splitter.split(&batch)? {
                plan.add(PartitionWriteOp {
                    partition,
                    action,
                    schema: splitter.data_schema().clone(),
                    batches: vec![batch],
                });
            }
            if is_dynamic && plan.len() > self.max_dynamic_partitions {
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    format!(
                        "Number of dynamic partitions created is {}, which is more than {}. To solve this try to set {} to at least {}",
                        plan.len(),
                        self.max_dynamic_partitions,
                        WriteConfig::PROPERTY_MAX_DYNAMIC_PARTITIONS,
                        plan.len()
                    ),
                ));
            }
        }

        tracing::debug!(
            table = %table.identifier(),
            partitions = plan.len(),
            rows = plan.num_rows(),
            action = %action,
            "Built write plan"
        );
        Ok(plan)
    }
}
