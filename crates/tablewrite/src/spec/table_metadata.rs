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

//! Table metadata: columns, partition columns, location and storage kind.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arrow_schema::{Field, Schema, SchemaRef};
use serde_derive::{Deserialize, Serialize};

use super::PartitionColumn;
use crate::{Error, ErrorKind, Result};

/// Reference to [`TableMetadata`].
pub type TableMetadataRef = Arc<TableMetadata>;

/// How a table lays out its staging area and data file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableKind {
    /// Hive SerDe table.
    #[default]
    Hive,
    /// Data source (columnar file format) table.
    DataSource,
}

/// Metadata of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    location: String,
    schema: SchemaRef,
    partition_columns: Vec<PartitionColumn>,
    kind: TableKind,
    properties: HashMap<String, String>,
}

impl TableMetadata {
    /// Table property naming the prefix of Hive staging directories.
    pub const PROPERTY_STAGING_DIR: &str = "hive.exec.stagingdir";
    /// Default Hive staging directory prefix.
    pub const PROPERTY_STAGING_DIR_DEFAULT: &str = ".hive-staging";

    /// Creates table metadata.
    ///
    /// `schema` holds the data columns only. Partition columns follow them in
    /// the table's full schema and must not repeat a data column.
    pub fn try_new(
        location: impl Into<String>,
        schema: SchemaRef,
        partition_columns: Vec<PartitionColumn>,
        kind: TableKind,
        properties: HashMap<String, String>,
    ) -> Result<Self> {
        let location = location.into().trim_end_matches('/').to_string();
        if location.is_empty() {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                "Table location can't be empty",
            ));
        }

        let mut seen = HashSet::new();
        for column in &partition_columns {
            if schema.field_with_name(column.name()).is_ok() {
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    format!(
                        "Partition column '{}' is also declared as a data column",
                        column.name()
                    ),
                ));
            }
            if !seen.insert(column.name()) {
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    format!("Duplicate partition column '{}'", column.name()),
                ));
            }
        }

        if let Some(staging_dir) = properties.get(Self::PROPERTY_STAGING_DIR) {
            if staging_dir.is_empty() || staging_dir.contains('/') {
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    format!(
                        "Invalid value for {}: '{staging_dir}' must be a single directory name",
                        Self::PROPERTY_STAGING_DIR
                    ),
                ));
            }
        }

        Ok(Self {
            location,
            schema,
            partition_columns,
            kind,
            properties,
        })
    }

    /// Table root location, without a trailing slash.
    #[inline]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Schema of the data columns.
    #[inline]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Partition columns in declared order.
    #[inline]
    pub fn partition_columns(&self) -> &[PartitionColumn] {
        &self.partition_columns
    }

    /// Partition column names in declared order.
    pub fn partition_column_names(&self) -> Vec<&str> {
        self.partition_columns.iter().map(|c| c.name()).collect()
    }

    /// Returns true if the table declares partition columns.
    pub fn is_partitioned(&self) -> bool {
        !self.partition_columns.is_empty()
    }

    /// Storage kind of the table.
    #[inline]
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Table properties.
    #[inline]
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Prefix of the Hive staging directories created under the location.
    pub fn staging_dir(&self) -> &str {
        self.properties
            .get(Self::PROPERTY_STAGING_DIR)
            .map_or(Self::PROPERTY_STAGING_DIR_DEFAULT, String::as_str)
    }

    /// Data columns followed by the partition columns.
    pub fn full_schema(&self) -> SchemaRef {
        let fields = self
            .schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .chain(
                self.partition_columns
                    .iter()
                    .map(|c| Field::new(c.name(), c.data_type().clone(), true)),
            )
            .collect::<Vec<_>>();
        Arc::new(Schema::new(fields))
    }
}
