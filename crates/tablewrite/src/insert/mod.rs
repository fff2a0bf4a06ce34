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

//! Insert planning and execution for partitioned tables.
//!
//! An insert goes through two phases. [`WritePlanBuilder`] validates the
//! request, applies the partition mode policy and groups the input rows into
//! one [`PartitionWriteOp`] per concrete partition. [`InsertExecutor`] then
//! writes each op independently and registers the written partitions.

use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use typed_builder::TypedBuilder;

use crate::spec::{ConcretePartition, PartitionSpec};
use crate::table::Table;
use crate::Result;

mod executor;
mod existing;
mod mode;
mod plan;
mod validator;

pub use executor::*;
pub use existing::*;
pub use mode::*;
pub use plan::*;
pub use validator::*;

/// A single-pass source of rows to insert.
///
/// Columns are matched to the table by position: data columns first, then
/// the dynamic partition columns in table order.
pub struct RowSource {
    schema: SchemaRef,
    stream: BoxStream<'static, Result<RecordBatch>>,
}

impl RowSource {
    /// Creates a row source from a stream of batches sharing `schema`.
    pub fn new(schema: SchemaRef, stream: BoxStream<'static, Result<RecordBatch>>) -> Self {
        Self { schema, stream }
    }

    /// Creates a row source from batches already in memory.
    pub fn from_batches(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self::new(schema, stream::iter(batches.into_iter().map(Ok)).boxed())
    }

    /// Schema of the rows.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Consumes the source into its stream.
    pub fn into_stream(self) -> BoxStream<'static, Result<RecordBatch>> {
        self.stream
    }
}

impl Debug for RowSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSource")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// A logical insert into a table.
///
/// # Example
///
/// ```rust,ignore
/// // INSERT OVERWRITE TABLE t PARTITION (p1 = 'a', p2) SELECT ...
/// let request = WriteRequest::builder()
///     .table(table)
///     .partition_spec(
///         PartitionSpec::new()
///             .with_static("p1", Literal::string("a"))
///             .with_dynamic("p2"),
///     )
///     .overwrite(true)
///     .mode(PartitionMode::NonStrict)
///     .rows(rows)
///     .build();
/// ```
#[derive(Debug, TypedBuilder)]
pub struct WriteRequest {
    /// Target table.
    pub table: Table,
    /// The PARTITION clause, empty when the insert names none.
    #[builder(default)]
    pub partition_spec: PartitionSpec,
    /// Partition columns re-specified by the insert, if any.
    #[builder(default, setter(strip_option))]
    pub partition_by: Option<Vec<String>>,
    /// Replace the target partitions instead of appending to them.
    #[builder(default)]
    pub overwrite: bool,
    /// Skip the write when the (fully static) target partition already exists.
    #[builder(default)]
    pub if_not_exists: bool,
    /// Partition mode policy for this insert. Falls back to the configured
    /// `hive.exec.dynamic.partition.mode` when unset.
    #[builder(default, setter(strip_option))]
    pub mode: Option<PartitionMode>,
    /// Rows to insert.
    pub rows: RowSource,
}

/// What a write op does to its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WriteAction {
    /// Replace the partition contents.
    Overwrite,
    /// Add files next to the existing ones.
    Append,
    /// Leave the partition untouched.
    Skip,
}

impl Display for WriteAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteAction::Overwrite => write!(f, "overwrite"),
            WriteAction::Append => write!(f, "append"),
            WriteAction::Skip => write!(f, "skip"),
        }
    }
}

/// The rows bound for one concrete partition and what to do with them.
#[derive(Debug, Clone)]
pub struct PartitionWriteOp {
    /// Target partition.
    pub partition: ConcretePartition,
    /// Action applied to the partition.
    pub action: WriteAction,
    /// Schema of `batches`: the table's data column names with the source types.
    pub schema: SchemaRef,
    /// Rows to write, data columns only.
    pub batches: Vec<RecordBatch>,
}

impl PartitionWriteOp {
    /// Total number of rows in the op.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

/// The ops of one insert, at most one per concrete partition.
#[derive(Debug, Clone)]
pub struct WritePlan {
    table: Table,
    // Keyed by partition path.
    ops: BTreeMap<String, PartitionWriteOp>,
}

impl WritePlan {
    pub(crate) fn new(table: Table) -> Self {
        Self {
            table,
            ops: BTreeMap::new(),
        }
    }

    /// Target table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Number of ops.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the plan has no ops.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Ops ordered by partition path.
    pub fn ops(&self) -> impl Iterator<Item = &PartitionWriteOp> {
        self.ops.values()
    }

    /// Op for the given partition.
    pub fn op(&self, partition: &ConcretePartition) -> Option<&PartitionWriteOp> {
        self.ops.get(&partition.path())
    }

    /// Total number of rows across ops.
    pub fn num_rows(&self) -> usize {
        self.ops.values().map(|op| op.num_rows()).sum()
    }

    /// Consumes the plan into ops ordered by partition path.
    pub fn into_ops(self) -> Vec<PartitionWriteOp> {
        self.ops.into_values().collect()
    }

    /// Adds an op, merging its rows into an existing op for the same partition.
    pub(crate) fn add(&mut self, op: PartitionWriteOp) {
        let key = op.partition.path();
        match self.ops.get_mut(&key) {
            Some(existing) => {
                tracing::debug!(
                    partition = %op.partition,
                    rows = op.num_rows(),
                    "Merging rows into existing write op"
                );
                existing.batches.extend(op.batches);
            }
            None => {
                self.ops.insert(key, op);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::Int64Array;
    use arrow_schema::{DataType, Field, Schema};
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::Literal;
    use crate::test_utils::memory_table;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]))
    }

    fn batch(ids: Vec<i64>) -> RecordBatch {
        RecordBatch::try_new(schema(), vec![Arc::new(Int64Array::from(ids))]).unwrap()
    }

    fn op(value: &str, ids: Vec<i64>) -> PartitionWriteOp {
        PartitionWriteOp {
            partition: ConcretePartition::new(vec![(
                "part".to_string(),
                Some(Literal::string(value)),
            )]),
            action: WriteAction::Overwrite,
            schema: schema(),
            batches: vec![batch(ids)],
        }
    }

    #[tokio::test]
    async fn test_row_source_from_batches() {
        let source = RowSource::from_batches(schema(), vec![batch(vec![1]), batch(vec![2, 3])]);
        assert_eq!(source.schema(), &schema());

        let batches = source.into_stream().try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_write_plan_merges_same_partition() {
        let table = memory_table();
        let mut plan = WritePlan::new(table);
        plan.add(op("b", vec![1]));
        plan.add(op("a", vec![2]));
        plan.add(op("b", vec![3, 4]));

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.num_rows(), 4);

        let ops = plan.into_ops();
        assert_eq!(ops[0].partition.path(), "part=a");
        assert_eq!(ops[1].partition.path(), "part=b");
        assert_eq!(ops[1].num_rows(), 3);
        assert_eq!(ops[1].batches.len(), 2);
    }

    #[test]
    fn test_write_action_display() {
        assert_eq!(WriteAction::Overwrite.to_string(), "overwrite");
        assert_eq!(WriteAction::Skip.to_string(), "skip");
    }
}
