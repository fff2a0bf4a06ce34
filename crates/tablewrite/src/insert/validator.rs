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

//! Validation of a write request's partition clause against the table.

use std::collections::HashSet;

use itertools::Itertools;

use crate::spec::{NormalizedSpec, PartitionSpec, PartitionValue, TableMetadata};
use crate::{Error, ErrorKind, Result};

/// Validates a partition clause and normalizes it to table column order.
///
/// `partition_by` is the partition column list re-specified by the insert,
/// if any; it must equal the table's own partitioning. An empty `spec`
/// against a partitioned table means every partition column is dynamic.
///
/// Static values are cast to their column types.
pub fn validate(
    metadata: &TableMetadata,
    spec: &PartitionSpec,
    partition_by: Option<&[String]>,
) -> Result<NormalizedSpec> {
    let table_columns = metadata.partition_columns();
    let table_names = metadata.partition_column_names();

    if let Some(partition_by) = partition_by {
        if partition_by.iter().map(String::as_str).collect_vec() != table_names {
            return Err(Error::new(
                ErrorKind::ExtraPartitioningOnInsertInto,
                format!(
                    "Insert requests partitioning by [{}], but the table is partitioned by [{}]",
                    partition_by.join(", "),
                    table_names.join(", ")
                ),
            ));
        }
    }

    if spec.is_empty() {
        return Ok(NormalizedSpec::new(
            table_columns
                .iter()
                .map(|column| (column.clone(), PartitionValue::Dynamic))
                .collect(),
        ));
    }

    let spec_names = spec.fields().iter().map(|(name, _)| name.as_str()).collect_vec();
    if spec_names.len() != table_names.len() {
        return Err(Error::new(
            ErrorKind::ColumnCountMismatch,
            format!(
                "Requested partitioning does not match the table: table has {} partition columns [{}], but {} were specified [{}]",
                table_names.len(),
                table_names.join(", "),
                spec_names.len(),
                spec_names.join(", ")
            ),
        ));
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = spec_names.iter().find(|name| !seen.insert(**name)) {
        return Err(Error::new(
            ErrorKind::ColumnNameMismatch,
            format!("Partition column '{duplicate}' is specified more than once"),
        ));
    }
    if seen != table_names.iter().copied().collect::<HashSet<_>>() {
        return Err(Error::new(
            ErrorKind::ColumnNameMismatch,
            format!(
                "Requested partition columns [{}] do not match the table's partition columns [{}]",
                spec_names.join(", "),
                table_names.join(", ")
            ),
        ));
    }

    let mut normalized = Vec::with_capacity(table_columns.len());
    let mut first_dynamic: Option<&str> = None;
    for column in table_columns {
        let value = spec.get(column.name()).ok_or_else(|| {
            Error::new(
                ErrorKind::ColumnNameMismatch,
                format!("Partition column '{}' is not specified", column.name()),
            )
        })?;

        match value {
            PartitionValue::Dynamic => {
                first_dynamic.get_or_insert(column.name());
                normalized.push((column.clone(), PartitionValue::Dynamic));
            }
            PartitionValue::Static(literal) => {
                if let Some(dynamic) = first_dynamic {
                    return Err(Error::new(
                        ErrorKind::OutOfOrderDynamic,
                        format!(
                            "Static partition column '{}' follows dynamic partition column '{dynamic}'",
                            column.name()
                        ),
                    ));
                }
                let literal = literal.cast_to(column.data_type()).map_err(|e| {
                    Error::new(
                        ErrorKind::DataInvalid,
                        format!(
                            "Invalid value '{literal}' for partition column '{}'",
                            column.name()
                        ),
                    )
                    .with_source(e)
                })?;
                normalized.push((column.clone(), PartitionValue::Static(literal)));
            }
        }
    }

    Ok(NormalizedSpec::new(normalized))
}
