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

//! Table scan API.
//!
//! Reads the committed data of a table: every visible data file of every
//! partition directory, with partition columns re-attached as constants.

use arrow_array::{ArrayRef, RecordBatch};
use arrow_cast::cast::cast;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::io::{list_data_files, list_partition_dirs};
use crate::spec::{literal_to_array, ConcretePartition};
use crate::table::Table;
use crate::writer::staging_prefix;
use crate::Result;

/// Table scan.
#[derive(Debug)]
pub struct TableScan<'a> {
    table: &'a Table,
    staging_prefix: String,
}

impl<'a> TableScan<'a> {
    /// Creates a scan skipping the table's staging directories.
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            staging_prefix: staging_prefix(table),
        }
    }

    /// Partitions present on storage with their directories, sorted by partition.
    pub async fn partitions(&self) -> Result<Vec<(ConcretePartition, String)>> {
        list_partition_dirs(
            self.table.file_io(),
            self.table.location(),
            self.table.metadata().partition_columns(),
            &self.staging_prefix,
        )
        .await
    }

    /// Reads all rows in the table's full schema, partition by partition.
    pub async fn to_batches(&self) -> Result<Vec<RecordBatch>> {
        let metadata = self.table.metadata();
        let full_schema = metadata.full_schema();
        let file_io = self.table.file_io();

        let mut batches = vec![];
        for (partition, dir) in self.partitions().await? {
            for file in list_data_files(file_io, &dir, &self.staging_prefix).await? {
                let content = file_io.read(&file).await?;
                let reader = ParquetRecordBatchReaderBuilder::try_new(content)?.build()?;
                for batch in reader {
                    let batch = batch?;
                    let num_rows = batch.num_rows();

                    let mut columns = batch
                        .columns()
                        .iter()
                        .zip(metadata.schema().fields())
                        .map(|(column, field)| {
                            if column.data_type() == field.data_type() {
                                Ok(column.clone())
                            } else {
                                cast(column, field.data_type())
                            }
                        })
                        .collect::<std::result::Result<Vec<ArrayRef>, _>>()?;
                    for column in metadata.partition_columns() {
                        columns.push(literal_to_array(
                            partition.get(column.name()),
                            column.data_type(),
                            num_rows,
                        )?);
                    }

                    batches.push(RecordBatch::try_new(full_schema.clone(), columns)?);
                }
            }
        }
        Ok(batches)
    }

    /// Counts the rows of the table.
    pub async fn count_rows(&self) -> Result<usize> {
        Ok(self
            .to_batches()
            .await?
            .iter()
            .map(|batch| batch.num_rows())
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::cast::AsArray;
    use arrow_array::types::Int64Type;
    use arrow_array::{Int64Array, StringArray};
    use arrow_schema::SchemaRef;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::insert::{PartitionWriteOp, WriteAction};
    use crate::spec::Literal;
    use crate::test_utils::{memory_table, unpartitioned_memory_table};
    use crate::writer::PartitionWriter;

    fn op(table: &Table, partition: ConcretePartition, ids: Vec<i64>) -> PartitionWriteOp {
        let schema: SchemaRef = table.metadata().schema().clone();
        let data = ids.iter().map(|i| format!("d{i}")).collect::<Vec<_>>();
        let batch = RecordBatch::try_new(schema.clone(), vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(data)),
        ])
        .unwrap();
        PartitionWriteOp {
            partition,
            action: WriteAction::Overwrite,
            schema,
            batches: vec![batch],
        }
    }

    #[tokio::test]
    async fn test_scan_attaches_partition_columns() {
        let table = memory_table();
        let writer = PartitionWriter::new(table.clone());
        let odd = ConcretePartition::new(vec![("part".to_string(), Some(Literal::string("odd")))]);
        let null = ConcretePartition::new(vec![("part".to_string(), None)]);
        writer.execute(op(&table, odd, vec![1, 3])).await.unwrap();
        writer.execute(op(&table, null, vec![2])).await.unwrap();

        // The writer's staging directory is still present.
        let scan = table.scan();
        let partitions = scan
            .partitions()
            .await
            .unwrap()
            .into_iter()
            .map(|(p, _)| p.path())
            .collect::<Vec<_>>();
        assert_eq!(partitions, vec![
            "part=__HIVE_DEFAULT_PARTITION__".to_string(),
            "part=odd".to_string()
        ]);

        let batches = scan.to_batches().await.unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].schema(), table.metadata().full_schema());
        assert_eq!(batches[0].column(2).null_count(), 1);
        assert_eq!(
            batches[1].column(0).as_primitive::<Int64Type>().values().to_vec(),
            vec![1, 3]
        );
        assert_eq!(batches[1].column(2).as_string::<i32>().value(1), "odd");
        assert_eq!(scan.count_rows().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_scan_unpartitioned_table() {
        let table = unpartitioned_memory_table();
        assert_eq!(table.scan().count_rows().await.unwrap(), 0);

        let writer = PartitionWriter::new(table.clone());
        writer
            .execute(op(&table, ConcretePartition::unpartitioned(), vec![1, 2]))
            .await
            .unwrap();
        table
            .file_io()
            .write(format!("{}/_SUCCESS", table.location()), Bytes::new())
            .await
            .unwrap();

        assert_eq!(table.scan().count_rows().await.unwrap(), 2);
    }
}
