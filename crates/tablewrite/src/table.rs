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

//! Table API

use crate::io::FileIO;
use crate::scan::TableScan;
use crate::spec::{TableMetadata, TableMetadataRef};
use crate::{Error, ErrorKind, Result, TableIdent};

/// Builder to create a table handle.
pub struct TableBuilder {
    file_io: Option<FileIO>,
    metadata: Option<TableMetadataRef>,
    identifier: Option<TableIdent>,
}

impl TableBuilder {
    pub(crate) fn new() -> Self {
        Self {
            file_io: None,
            metadata: None,
            identifier: None,
        }
    }

    /// required - sets the necessary FileIO to use for the table
    pub fn file_io(mut self, file_io: FileIO) -> Self {
        self.file_io = Some(file_io);
        self
    }

    /// required - passes in the TableMetadata to use for the Table
    pub fn metadata<T: Into<TableMetadataRef>>(mut self, metadata: T) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// required - passes in the TableIdent to use for the Table
    pub fn identifier(mut self, identifier: TableIdent) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Builds the table, failing when a required field is missing.
    pub fn build(self) -> Result<Table> {
        Ok(Table {
            file_io: required(self.file_io, "file_io")?,
            metadata: required(self.metadata, "metadata")?,
            identifier: required(self.identifier, "identifier")?,
        })
    }
}

fn required<T>(value: Option<T>, setter: &str) -> Result<T> {
    value.ok_or_else(|| {
        Error::new(
            ErrorKind::DataInvalid,
            format!("TableBuilder.{setter}() must be called before build()"),
        )
    })
}

/// Table represents a table in the catalog.
#[derive(Debug, Clone)]
pub struct Table {
    file_io: FileIO,
    metadata: TableMetadataRef,
    identifier: TableIdent,
}

impl Table {
    /// Returns a TableBuilder to build a table
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    /// Returns table identifier.
    pub fn identifier(&self) -> &TableIdent {
        &self.identifier
    }

    /// Returns current metadata.
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Returns current metadata ref.
    pub fn metadata_ref(&self) -> TableMetadataRef {
        self.metadata.clone()
    }

    /// Returns file io used in this table.
    pub fn file_io(&self) -> &FileIO {
        &self.file_io
    }

    /// Table root location.
    pub fn location(&self) -> &str {
        self.metadata.location()
    }

    /// Creates a scan over the committed data of this table.
    pub fn scan(&self) -> TableScan<'_> {
        TableScan::new(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use arrow_schema::{DataType, Field, Schema};

    use super::*;
    use crate::spec::TableKind;
    use crate::NamespaceIdent;

    #[test]
    fn test_table_builder_requires_metadata() {
        let result = Table::builder()
            .file_io(FileIO::new_with_memory())
            .identifier(TableIdent::new(NamespaceIdent::new("db"), "t"))
            .build();
        assert_eq!(result.unwrap_err().kind(), ErrorKind::DataInvalid);
    }

    #[test]
    fn test_table_builder() {
        let metadata = TableMetadata::try_new(
            "memory://warehouse/db/t",
            Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)])),
            vec![],
            TableKind::Hive,
            HashMap::new(),
        )
        .unwrap();
        let table = Table::builder()
            .file_io(FileIO::new_with_memory())
            .metadata(metadata)
            .identifier(TableIdent::new(NamespaceIdent::new("db"), "t"))
            .build()
            .unwrap();

        assert_eq!(table.location(), "memory://warehouse/db/t");
        assert_eq!(table.identifier().to_string(), "db.t");
        assert!(!table.metadata().is_partitioned());
    }
}
