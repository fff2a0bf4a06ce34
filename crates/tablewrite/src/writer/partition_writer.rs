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

//! Executes one partition operation of a write plan.

use std::sync::Arc;

use arrow_array::{ArrayRef, RecordBatch};
use arrow_cast::cast::{cast_with_options, CastOptions};
use arrow_schema::SchemaRef;

use super::{open_format, TableFormat, WrittenStats};
use crate::arrow::check_nullability;
use crate::insert::{PartitionWriteOp, WriteAction};
use crate::table::Table;
use crate::{Error, ErrorKind, Result};

/// Writes partition operations of one job into a table.
///
/// All operations executed by one writer share its staging area; call
/// [`PartitionWriter::cleanup`] once the job is done.
#[derive(Debug, Clone)]
pub struct PartitionWriter {
    table: Table,
    format: Arc<dyn TableFormat>,
}

impl PartitionWriter {
    /// Creates a writer using the format of the table's kind.
    pub fn new(table: Table) -> Self {
        let format = open_format(&table);
        Self { table, format }
    }

    /// Creates a writer with an explicit format.
    pub fn with_format(table: Table, format: Arc<dyn TableFormat>) -> Self {
        Self { table, format }
    }

    /// The table written to.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The format used to stage and swap data.
    pub fn format(&self) -> &Arc<dyn TableFormat> {
        &self.format
    }

    /// Executes one operation.
    ///
    /// Rows are checked against the table's nullability constraints before
    /// anything is written. A failure leaves the partition's committed data
    /// unchanged.
    pub async fn execute(&self, op: PartitionWriteOp) -> Result<WrittenStats> {
        let location = self.format.location_for(&op.partition);
        if op.action == WriteAction::Skip {
            return Ok(WrittenStats {
                location,
                ..Default::default()
            });
        }

        let table_schema = self.table.metadata().schema().clone();
        check_nullability(&op.schema, &table_schema)
            .map_err(|e| e.with_context("partition", op.partition.to_string()))?;

        let batches = op
            .batches
            .iter()
            .map(|batch| conform(batch, &table_schema))
            .collect::<Result<Vec<_>>>()?;

        if op.action == WriteAction::Append && op.num_rows() == 0 {
            tracing::debug!(partition = %op.partition, "Nothing to append");
            return Ok(WrittenStats {
                location,
                ..Default::default()
            });
        }

        let staged = self.format.stage(&op.partition, &batches).await?;
        let stats = self.format.swap(staged, op.action).await?;

        tracing::info!(
            table = %self.table.identifier(),
            partition = %op.partition,
            action = %op.action,
            rows = stats.rows_written,
            files = stats.files_written,
            "Wrote partition"
        );
        Ok(stats)
    }

    /// Removes the staging area of this writer.
    pub async fn cleanup(&self) -> Result<()> {
        self.format.cleanup().await
    }
}

/// Rebuilds a batch with the table's column names and types.
///
/// Columns are matched by position. Values that do not fit the table type fail
/// the write instead of becoming null.
fn conform(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    if batch.num_columns() != schema.fields().len() {
        return Err(Error::new(
            ErrorKind::DataInvalid,
            format!(
                "Batch has {} columns, table has {} data columns",
                batch.num_columns(),
                schema.fields().len()
            ),
        ));
    }

    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    let columns = batch
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(column, field)| {
            if column.data_type() == field.data_type() {
                return Ok(column.clone());
            }
            cast_with_options(column, field.data_type(), &options).map_err(|e| {
                Error::new(
                    ErrorKind::DataInvalid,
                    format!(
                        "Cannot cast column '{}' from {} to {}",
                        field.name(),
                        column.data_type(),
                        field.data_type()
                    ),
                )
                .with_source(e)
            })
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}
