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

use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::{ArrayRef, BooleanArray, RecordBatch};
use arrow_cast::cast::{cast_with_options, CastOptions};
use arrow_schema::{Field, Schema, SchemaRef};
use arrow_select::filter::filter_record_batch;

use crate::spec::{normalize_null, ConcretePartition, Literal, NormalizedSpec, PartitionColumn};
use crate::{Error, ErrorKind, Result};

/// Splits record batches into per-partition batches.
///
/// Input batches carry the table's data columns followed by the dynamic
/// partition columns, matched by position. Output batches hold only the data
/// columns, renamed to the table's column names. Source types and nullability
/// are kept so writers can check them against the table.
#[derive(Debug, Clone)]
pub struct PartitionSplitter {
    spec: NormalizedSpec,
    data_schema: SchemaRef,
    dynamic_columns: Vec<(usize, PartitionColumn)>,
    num_data_columns: usize,
}

impl PartitionSplitter {
    /// Creates a splitter, checking the input layout against the table.
    pub fn try_new(
        spec: NormalizedSpec,
        input_schema: &SchemaRef,
        table_schema: &SchemaRef,
    ) -> Result<Self> {
        let num_data_columns = table_schema.fields().len();
        let dynamic = spec.dynamic_columns();
        let expected = num_data_columns + dynamic.len();
        if input_schema.fields().len() != expected {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                format!(
                    "Cannot write to table: it has {} data columns and {} dynamic partition columns, but the query produces {} columns",
                    num_data_columns,
                    dynamic.len(),
                    input_schema.fields().len()
                ),
            ));
        }

        let data_schema = Arc::new(Schema::new(
            input_schema
                .fields()
                .iter()
                .zip(table_schema.fields().iter())
                .map(|(source, target)| {
                    Field::new(
                        target.name(),
                        source.data_type().clone(),
                        source.is_nullable(),
                    )
                })
                .collect::<Vec<_>>(),
        ));
        let dynamic_columns = dynamic
            .into_iter()
            .enumerate()
            .map(|(i, column)| (num_data_columns + i, column.clone()))
            .collect();

        Ok(Self {
            spec,
            data_schema,
            dynamic_columns,
            num_data_columns,
        })
    }

    /// Schema of the output batches.
    pub fn data_schema(&self) -> &SchemaRef {
        &self.data_schema
    }

    /// Split the record batch into one batch per partition, in order of first
    /// appearance. Rows are grouped by exact value equality.
    pub fn split(&self, batch: &RecordBatch) -> Result<Vec<(ConcretePartition, RecordBatch)>> {
        let data = RecordBatch::try_new(
            self.data_schema.clone(),
            batch.columns()[..self.num_data_columns].to_vec(),
        )?;

        if self.dynamic_columns.is_empty() {
            return Ok(vec![(self.spec.to_concrete()?, data)]);
        }

        let dynamic_arrays = self
            .dynamic_columns
            .iter()
            .map(|(index, column)| cast_partition_column(batch.column(*index), column))
            .collect::<Result<Vec<_>>>()?;

        // Group the batch by row value.
        let mut group_ids: HashMap<Vec<Option<Literal>>, usize> = HashMap::new();
        let mut groups: Vec<(Vec<Option<Literal>>, Vec<usize>)> = Vec::new();
        for row_id in 0..batch.num_rows() {
            let key = dynamic_arrays
                .iter()
                .map(|array| Literal::try_from_array(array.as_ref(), row_id).map(normalize_null))
                .collect::<Result<Vec<_>>>()?;
            match group_ids.get(&key) {
                Some(group_id) => groups[*group_id].1.push(row_id),
                None => {
                    group_ids.insert(key.clone(), groups.len());
                    groups.push((key, vec![row_id]));
                }
            }
        }

        // Partition the batch with same partition values
        let mut partition_batches = Vec::with_capacity(groups.len());
        for (key, row_ids) in groups {
            // generate the bool filter array from row ids
            let filter_array: BooleanArray = {
                let mut filter = vec![false; batch.num_rows()];
                row_ids.into_iter().for_each(|row_id| {
                    filter[row_id] = true;
                });
                filter.into()
            };

            partition_batches.push((
                self.spec.bind(key)?,
                filter_record_batch(&data, &filter_array)?,
            ));
        }

        Ok(partition_batches)
    }
}

fn cast_partition_column(array: &ArrayRef, column: &PartitionColumn) -> Result<ArrayRef> {
    if array.data_type() == column.data_type() {
        return Ok(array.clone());
    }
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(array, column.data_type(), &options).map_err(|e| {
        Error::new(
            ErrorKind::DataInvalid,
            format!(
                "Cannot cast values of dynamic partition column '{}' to {}",
                column.name(),
                column.data_type()
            ),
        )
        .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use arrow_array::cast::AsArray;
    use arrow_array::types::Int64Type;
    use arrow_array::{Int64Array, StringArray};
    use arrow_schema::DataType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::PartitionValue;

    fn table_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("data", DataType::Utf8, true),
        ]))
    }

    fn input_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("col0", DataType::Int64, false),
            Field::new("col1", DataType::Utf8, true),
            Field::new("col2", DataType::Utf8, true),
        ]))
    }

    fn dynamic_part_spec() -> NormalizedSpec {
        NormalizedSpec::new(vec![(
            PartitionColumn::new("part", DataType::Utf8),
            PartitionValue::Dynamic,
        )])
    }

    #[test]
    fn test_split_by_dynamic_column() {
        let splitter =
            PartitionSplitter::try_new(dynamic_part_spec(), &input_schema(), &table_schema())
                .unwrap();
        let batch = RecordBatch::try_new(input_schema(), vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])),
            Arc::new(StringArray::from(vec!["a", "b", "c", "d", "e"])),
            Arc::new(StringArray::from(vec![
                Some("odd"),
                Some("even"),
                Some("odd"),
                None,
                Some(""),
            ])),
        ])
        .unwrap();

        let splits = splitter.split(&batch).unwrap();
        let summary = splits
            .iter()
            .map(|(partition, batch)| {
                (
                    partition.path(),
                    batch
                        .column(0)
                        .as_primitive::<Int64Type>()
                        .values()
                        .to_vec(),
                )
            })
            .collect::<Vec<_>>();

        assert_eq!(summary, vec![
            ("part=odd".to_string(), vec![1, 3]),
            ("part=even".to_string(), vec![2]),
            ("part=__HIVE_DEFAULT_PARTITION__".to_string(), vec![4, 5]),
        ]);

        let names = splits[0]
            .1
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["id", "data"]);
    }

    #[test]
    fn test_split_static_spec() {
        let spec = NormalizedSpec::new(vec![(
            PartitionColumn::new("part", DataType::Utf8),
            PartitionValue::Static(Literal::string("a")),
        )]);
        let input = Arc::new(Schema::new(vec![
            Field::new("x", DataType::Int64, false),
            Field::new("y", DataType::Utf8, true),
        ]));
        let splitter = PartitionSplitter::try_new(spec, &input, &table_schema()).unwrap();
        let batch = RecordBatch::try_new(input, vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(StringArray::from(vec!["a", "b"])),
        ])
        .unwrap();

        let splits = splitter.split(&batch).unwrap();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].0.path(), "part=a");
        assert_eq!(splits[0].1.num_rows(), 2);
    }

    #[test]
    fn test_dynamic_values_are_cast_to_column_type() {
        let spec = NormalizedSpec::new(vec![(
            PartitionColumn::new("part", DataType::Int32),
            PartitionValue::Dynamic,
        )]);
        let splitter = PartitionSplitter::try_new(spec, &input_schema(), &table_schema()).unwrap();
        let batch = RecordBatch::try_new(input_schema(), vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(StringArray::from(vec!["a", "b"])),
            Arc::new(StringArray::from(vec!["7", "x"])),
        ])
        .unwrap();

        let err = splitter.split(&batch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);
    }

    #[test]
    fn test_column_count_mismatch() {
        let input = Arc::new(Schema::new(vec![Field::new("x", DataType::Int64, false)]));
        let err = PartitionSplitter::try_new(dynamic_part_spec(), &input, &table_schema())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);
    }
}
