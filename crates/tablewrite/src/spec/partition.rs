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

/*!
 * Partitioning
 */
use std::fmt::{Display, Formatter};

use arrow_schema::DataType;
use itertools::Itertools;

use super::Literal;
use crate::{Error, ErrorKind, Result};

/// Directory value used for null (and empty string) partition values.
pub const DEFAULT_PARTITION_NAME: &str = "__HIVE_DEFAULT_PARTITION__";

/// A partition column declared by a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionColumn {
    name: String,
    data_type: DataType,
}

impl PartitionColumn {
    /// Creates a partition column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column type.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// The value a write request assigns to one partition column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionValue {
    /// Bound at plan time, e.g. `PARTITION (p1 = 'a')`.
    Static(Literal),
    /// Discovered per row from the input, e.g. `PARTITION (p1)`.
    Dynamic,
}

impl PartitionValue {
    /// Returns true for a dynamic value.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, PartitionValue::Dynamic)
    }
}

/// The partition clause of a write request, in the order the caller wrote it.
///
/// An empty spec means the request named no partition clause at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionSpec {
    fields: Vec<(String, PartitionValue)>,
}

impl PartitionSpec {
    /// Empty spec, the starting point for `with_static` and `with_dynamic`.
    ///
    /// Left empty, it stands for a request without a partition clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a static column binding.
    pub fn with_static(mut self, name: impl Into<String>, value: Literal) -> Self {
        self.fields
            .push((name.into(), PartitionValue::Static(value)));
        self
    }

    /// Appends a dynamic column.
    pub fn with_dynamic(mut self, name: impl Into<String>) -> Self {
        self.fields.push((name.into(), PartitionValue::Dynamic));
        self
    }

    /// Requested bindings in caller order.
    pub fn fields(&self) -> &[(String, PartitionValue)] {
        &self.fields
    }

    /// Returns true when the request named no partition clause.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value bound to the named column.
    pub fn get(&self, name: &str) -> Option<&PartitionValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// A validated partition spec in table column order.
///
/// Static values are already cast to their column types, and dynamic columns
/// form a trailing suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSpec {
    columns: Vec<(PartitionColumn, PartitionValue)>,
}

impl NormalizedSpec {
    pub(crate) fn new(columns: Vec<(PartitionColumn, PartitionValue)>) -> Self {
        Self { columns }
    }

    /// Columns and their values in table order.
    pub fn columns(&self) -> &[(PartitionColumn, PartitionValue)] {
        &self.columns
    }

    /// Returns true for an unpartitioned table.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Dynamic columns in table order.
    pub fn dynamic_columns(&self) -> Vec<&PartitionColumn> {
        self.columns
            .iter()
            .filter(|(_, value)| value.is_dynamic())
            .map(|(column, _)| column)
            .collect()
    }

    /// Number of statically bound columns.
    pub fn static_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|(_, value)| !value.is_dynamic())
            .count()
    }

    /// Returns true when every column is static (or the table is unpartitioned).
    pub fn is_fully_static(&self) -> bool {
        self.columns.iter().all(|(_, value)| !value.is_dynamic())
    }

    /// Binds the dynamic columns, in table order, to concrete values.
    pub fn bind(&self, dynamic_values: Vec<Option<Literal>>) -> Result<ConcretePartition> {
        let dynamic_count = self.columns.len() - self.static_count();
        if dynamic_values.len() != dynamic_count {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!(
                    "Expected {} dynamic partition values, got {}",
                    dynamic_count,
                    dynamic_values.len()
                ),
            ));
        }

        let mut dynamic_values = dynamic_values.into_iter();
        let values = self
            .columns
            .iter()
            .map(|(column, value)| {
                let bound = match value {
                    PartitionValue::Static(literal) => Some(literal.clone()),
                    // Counted above, so the iterator cannot run dry.
                    PartitionValue::Dynamic => dynamic_values.next().flatten(),
                };
                (column.name().to_string(), normalize_null(bound))
            })
            .collect();

        Ok(ConcretePartition { values })
    }

    /// The single partition of a fully static spec.
    pub fn to_concrete(&self) -> Result<ConcretePartition> {
        if !self.is_fully_static() {
            return Err(Error::new(
                ErrorKind::Unexpected,
                "Cannot resolve a partition spec with dynamic columns without input rows",
            ));
        }
        self.bind(vec![])
    }
}

/// Maps empty strings to null; both land in the default partition.
pub(crate) fn normalize_null(value: Option<Literal>) -> Option<Literal> {
    match value {
        Some(Literal::String(s)) if s.is_empty() => None,
        other => other,
    }
}

/// A partition with every column bound to a value.
///
/// Maps to exactly one directory below the table location. The empty
/// partition stands for the whole of an unpartitioned table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConcretePartition {
    values: Vec<(String, Option<Literal>)>,
}

impl ConcretePartition {
    /// Creates a concrete partition from `(column, value)` pairs in table order.
    pub fn new(values: Vec<(String, Option<Literal>)>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|(name, value)| (name, normalize_null(value)))
                .collect(),
        }
    }

    /// The partition of an unpartitioned table.
    pub fn unpartitioned() -> Self {
        Self::default()
    }

    /// Returns true for the partition of an unpartitioned table.
    pub fn is_unpartitioned(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound values in table order.
    pub fn values(&self) -> &[(String, Option<Literal>)] {
        &self.values
    }

    /// Value bound to the named column.
    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.values
            .iter()
            .find(|(column, _)| column == name)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Relative directory path, e.g. `p1=a/p2=b`.
    ///
    /// Each segment is `column=value` with both sides percent-encoded; this
    /// layout is shared with other engines and must not change.
    pub fn path(&self) -> String {
        self.values
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Some(literal) => urlencoding::encode(&literal.to_string()).into_owned(),
                    None => DEFAULT_PARTITION_NAME.to_string(),
                };
                format!("{}={}", urlencoding::encode(name), value)
            })
            .join("/")
    }

    /// Parses one `column=value` directory segment.
    pub fn parse_segment(
        segment: &str,
        column: &PartitionColumn,
    ) -> Result<Option<Option<Literal>>> {
        let Some((name, value)) = segment.split_once('=') else {
            return Ok(None);
        };
        let name = urlencoding::decode(name).map_err(|e| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid partition directory name: {segment}"),
            )
            .with_source(e)
        })?;
        if name != column.name() {
            return Ok(None);
        }
        if value == DEFAULT_PARTITION_NAME {
            return Ok(Some(None));
        }
        let value = urlencoding::decode(value).map_err(|e| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid partition directory name: {segment}"),
            )
            .with_source(e)
        })?;
        let literal = Literal::string(value).cast_to(column.data_type())?;
        Ok(Some(Some(literal)))
    }
}

impl Display for ConcretePartition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_unpartitioned() {
            write!(f, "<unpartitioned>")
        } else {
            write!(f, "{}", self.path())
        }
    }
}
