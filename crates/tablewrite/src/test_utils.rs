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

//! Fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema, SchemaRef};

use crate::io::FileIO;
use crate::spec::{PartitionColumn, TableKind, TableMetadata};
use crate::table::Table;
use crate::{NamespaceIdent, TableCreation, TableIdent};

/// `(id bigint not null, data string)`
pub(crate) fn data_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("data", DataType::Utf8, true),
    ]))
}

pub(crate) fn table_metadata(partition_columns: Vec<PartitionColumn>) -> TableMetadata {
    TableMetadata::try_new(
        "memory://warehouse/db/t",
        data_schema(),
        partition_columns,
        TableKind::Hive,
        HashMap::new(),
    )
    .unwrap()
}

fn table(partition_columns: Vec<PartitionColumn>, kind: TableKind) -> Table {
    let metadata = TableMetadata::try_new(
        "memory://warehouse/db/t",
        data_schema(),
        partition_columns,
        kind,
        HashMap::new(),
    )
    .unwrap();
    Table::builder()
        .file_io(FileIO::new_with_memory())
        .metadata(metadata)
        .identifier(TableIdent::new(NamespaceIdent::new("db"), "t"))
        .build()
        .unwrap()
}

/// `t(id bigint, data string) PARTITIONED BY (part string)` on a fresh
/// in-memory storage.
pub(crate) fn memory_table() -> Table {
    memory_table_with_kind(TableKind::Hive)
}

pub(crate) fn memory_table_with_kind(kind: TableKind) -> Table {
    table(vec![PartitionColumn::new("part", DataType::Utf8)], kind)
}

pub(crate) fn unpartitioned_memory_table() -> Table {
    table(vec![], TableKind::Hive)
}

pub(crate) fn partitioned_creation(name: &str) -> TableCreation {
    TableCreation::builder()
        .name(name.to_string())
        .schema(data_schema())
        .partition_columns(vec![PartitionColumn::new("part", DataType::Utf8)])
        .build()
}
