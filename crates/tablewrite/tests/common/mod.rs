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


//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arrow_array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow_cast::display::array_value_to_string;
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use bytes::Bytes;
use tablewrite::catalog::memory::MemoryCatalog;
use tablewrite::insert::RowSource;
use tablewrite::io::{FileIO, FileStatus, MemoryStorage, Storage};
use tablewrite::spec::{PartitionColumn, TableKind};
use tablewrite::table::Table;
use tablewrite::{Catalog, Error, ErrorKind, NamespaceIdent, Result, TableCreation};

pub fn data_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("data", DataType::Utf8, true),
    ]))
}

pub async fn new_catalog(file_io: FileIO, warehouse: &str) -> Arc<MemoryCatalog> {
    let catalog = Arc::new(MemoryCatalog::new(file_io, Some(warehouse.to_string())));
    catalog
        .create_namespace(&NamespaceIdent::new("db".to_string()), HashMap::new())
        .await
        .unwrap();
    catalog
}

pub async fn create_table(
    catalog: &MemoryCatalog,
    name: &str,
    partition_columns: &[&str],
    kind: TableKind,
) -> Table {
    let creation = TableCreation::builder()
        .name(name.to_string())
        .schema(data_schema())
        .partition_columns(
            partition_columns
                .iter()
                .map(|c| PartitionColumn::new(*c, DataType::Utf8))
                .collect(),
        )
        .kind(kind)
        .build();
    catalog
        .create_table(&NamespaceIdent::new("db".to_string()), creation)
        .await
        .unwrap()
}

/// Rows `(id, 'd<id>', <extra string columns>...)`.
pub fn rows(ids: Vec<i64>, extra: Vec<(&str, Vec<Option<&str>>)>) -> RowSource {
    let mut fields = data_schema().fields().iter().cloned().collect::<Vec<_>>();
    let data = ids.iter().map(|i| format!("d{i}")).collect::<Vec<_>>();
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(ids)),
        Arc::new(StringArray::from(data)),
    ];
    for (name, values) in extra {
        fields.push(Arc::new(Field::new(name, DataType::Utf8, true)));
        columns.push(Arc::new(StringArray::from(values)));
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    RowSource::from_batches(schema, vec![batch])
}

/// All rows of the table rendered as strings, sorted.
pub async fn scan_rows(table: &Table) -> Vec<Vec<String>> {
    let mut rows = vec![];
    for batch in table.scan().to_batches().await.unwrap() {
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|c| array_value_to_string(c.as_ref(), row).unwrap())
                    .collect(),
            );
        }
    }
    rows.sort();
    rows
}

/// Visible entries directly below `dir`.
pub async fn list_names(file_io: &FileIO, dir: &str) -> Vec<String> {
    file_io
        .list(dir)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .filter(|n| !n.starts_with('.') && !n.starts_with('_'))
        .collect()
}

/// Memory storage whose renames or writes can be made to fail.
#[derive(Debug, Default)]
pub struct FaultyStorage {
    inner: MemoryStorage,
    /// Fail renames whose source contains this fragment.
    fail_rename_from: std::sync::Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl FaultyStorage {
    pub fn fail_renames_from(&self, fragment: &str) {
        *self.fail_rename_from.lock().unwrap() = Some(fragment.to_string());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        *self.fail_rename_from.lock().unwrap() = None;
        self.fail_writes(false);
    }

    fn injected(what: &str) -> Error {
        Error::new(ErrorKind::Unexpected, format!("injected {what} failure"))
    }
}

#[async_trait]
impl Storage for FaultyStorage {
    async fn exists(&self, path: &str) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, bs: Bytes) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected("write"));
        }
        self.inner.write(path, bs).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.inner.delete(path).await
    }

    async fn create_dir_all(&self, path: &str) -> Result<()> {
        self.inner.create_dir_all(path).await
    }

    async fn list(&self, path: &str) -> Result<Vec<FileStatus>> {
        self.inner.list(path).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let fail = self
            .fail_rename_from
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|fragment| from.contains(fragment.as_str()));
        if fail {
            return Err(Self::injected("rename"));
        }
        self.inner.rename(from, to).await
    }

    async fn remove_dir_all(&self, path: &str) -> Result<()> {
        self.inner.remove_dir_all(path).await
    }
}
