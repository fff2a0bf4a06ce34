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

//! Lookup of partitions that already exist.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::io::{join_path, list_data_files};
use crate::spec::ConcretePartition;
use crate::table::Table;
use crate::{Catalog, Result};

/// Answers whether a concrete partition already exists.
///
/// Consulted for IF NOT EXISTS inserts into a fully static partition.
#[async_trait]
pub trait ExistingPartitionIndex: Debug + Send + Sync {
    /// Returns true if the partition exists.
    async fn exists(&self, table: &Table, partition: &ConcretePartition) -> Result<bool>;
}

/// Looks partitions up in the catalog.
#[derive(Debug, Clone)]
pub struct CatalogPartitionIndex {
    catalog: Arc<dyn Catalog>,
}

impl CatalogPartitionIndex {
    /// Creates an index backed by `catalog`.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ExistingPartitionIndex for CatalogPartitionIndex {
    async fn exists(&self, table: &Table, partition: &ConcretePartition) -> Result<bool> {
        self.catalog
            .partition_exists(table.identifier(), partition)
            .await
    }
}

/// Looks partition directories up on storage.
///
/// The partition of an unpartitioned table exists once the table holds data files.
#[derive(Debug, Clone, Default)]
pub struct FileSystemPartitionIndex;

#[async_trait]
impl ExistingPartitionIndex for FileSystemPartitionIndex {
    async fn exists(&self, table: &Table, partition: &ConcretePartition) -> Result<bool> {
        if partition.is_unpartitioned() {
            let files = list_data_files(table.file_io(), table.location(), "").await?;
            return Ok(!files.is_empty());
        }
        table
            .file_io()
            .exists(join_path(table.location(), &partition.path()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;

    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use crate::io::FileIO;
    use crate::spec::Literal;
    use crate::test_utils::partitioned_creation;
    use crate::NamespaceIdent;

    fn partition(value: &str) -> ConcretePartition {
        ConcretePartition::new(vec![("part".to_string(), Some(Literal::string(value)))])
    }

    #[tokio::test]
    async fn test_catalog_partition_index() {
        let catalog = Arc::new(MemoryCatalog::new(
            FileIO::new_with_memory(),
            Some("memory://warehouse".to_string()),
        ));
        let namespace = NamespaceIdent::new("db");
        catalog
            .create_namespace(&namespace, HashMap::new())
            .await
            .unwrap();
        let table = catalog
            .create_table(&namespace, partitioned_creation("t"))
            .await
            .unwrap();
        catalog
            .register_partition(table.identifier(), &partition("a"), "memory://x")
            .await
            .unwrap();

        let index = CatalogPartitionIndex::new(catalog);
        assert!(index.exists(&table, &partition("a")).await.unwrap());
        assert!(!index.exists(&table, &partition("b")).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_system_partition_index() {
        let table = crate::test_utils::memory_table();
        table
            .file_io()
            .write(
                format!("{}/part=a/part-00000", table.location()),
                Bytes::from("x"),
            )
            .await
            .unwrap();

        let index = FileSystemPartitionIndex;
        assert!(index.exists(&table, &partition("a")).await.unwrap());
        assert!(!index.exists(&table, &partition("b")).await.unwrap());
    }
}
