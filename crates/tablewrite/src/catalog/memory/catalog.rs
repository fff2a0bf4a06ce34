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

//! This module contains memory catalog implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::lock::Mutex;
use itertools::Itertools;

use super::state::CatalogState;
use crate::io::FileIO;
use crate::spec::{ConcretePartition, TableMetadata};
use crate::table::Table;
use crate::{
    Catalog, Error, ErrorKind, Namespace, NamespaceIdent, Result, TableCreation, TableIdent,
};

/// namespace `location` property
pub const LOCATION: &str = "location";

/// Memory catalog implementation.
///
/// Table definitions and registered partitions live in memory; table data is
/// written through the catalog's [`FileIO`].
#[derive(Debug)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
    file_io: FileIO,
    warehouse_location: Option<String>,
}

impl MemoryCatalog {
    /// Creates an memory catalog.
    pub fn new(file_io: FileIO, warehouse_location: Option<String>) -> Self {
        Self {
            state: Mutex::new(CatalogState::default()),
            file_io,
            warehouse_location,
        }
    }

    fn build_table(&self, ident: TableIdent, metadata: Arc<TableMetadata>) -> Result<Table> {
        Table::builder()
            .file_io(self.file_io.clone())
            .metadata(metadata)
            .identifier(ident)
            .build()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn create_namespace(
        &self,
        namespace_ident: &NamespaceIdent,
        properties: HashMap<String, String>,
    ) -> Result<Namespace> {
        let mut state = self.state.lock().await;

        state.insert_namespace(namespace_ident, properties.clone())?;
        let namespace = Namespace::new(namespace_ident.clone(), properties);

        Ok(namespace)
    }

    async fn namespace_exists(&self, namespace_ident: &NamespaceIdent) -> Result<bool> {
        let state = self.state.lock().await;

        Ok(state.namespace_exists(namespace_ident))
    }

    async fn list_tables(&self, namespace_ident: &NamespaceIdent) -> Result<Vec<TableIdent>> {
        let state = self.state.lock().await;

        let table_names = state.table_names(namespace_ident)?;
        let table_idents = table_names
            .into_iter()
            .map(|table_name| TableIdent::new(namespace_ident.clone(), table_name.clone()))
            .collect_vec();

        Ok(table_idents)
    }

    async fn create_table(
        &self,
        namespace_ident: &NamespaceIdent,
        table_creation: TableCreation,
    ) -> Result<Table> {
        let mut state = self.state.lock().await;

        let table_ident = TableIdent::new(namespace_ident.clone(), table_creation.name.clone());

        if state.table_exists(&table_ident)? {
            if table_creation.if_not_exists {
                let existing = state.table(&table_ident)?;
                return self.build_table(table_ident, existing.metadata.clone());
            }
            return Err(Error::new(
                ErrorKind::ObjectAlreadyExists,
                format!("Cannot create table {table_ident}. Table already exists."),
            ));
        }

        let location = match table_creation.location {
            Some(location) => location,
            None => {
                let namespace_properties = state.namespace_properties(namespace_ident)?;
                let location_prefix = match namespace_properties.get(LOCATION) {
                    Some(namespace_location) => namespace_location.clone(),
                    None => match &self.warehouse_location {
                        Some(warehouse_location) => {
                            format!("{}/{}", warehouse_location, namespace_ident.join("/"))
                        }
                        None => {
                            return Err(Error::new(
                                ErrorKind::Unexpected,
                                format!(
                                    "Cannot create table {table_ident}. No default path is set, please specify a location when creating a table."
                                ),
                            ))
                        }
                    },
                };

                format!("{}/{}", location_prefix, table_ident.name())
            }
        };

        let metadata = Arc::new(TableMetadata::try_new(
            location,
            table_creation.schema,
            table_creation.partition_columns,
            table_creation.kind,
            table_creation.properties,
        )?);

        self.file_io.create_dir_all(metadata.location()).await?;
        state.insert_table(&table_ident, metadata.clone())?;
        tracing::debug!(table = %table_ident, location = metadata.location(), "Created table");

        self.build_table(table_ident, metadata)
    }

    async fn load_table(&self, table_ident: &TableIdent) -> Result<Table> {
        let state = self.state.lock().await;

        let table = state.table(table_ident)?;
        self.build_table(table_ident.clone(), table.metadata.clone())
    }

    async fn drop_table(&self, table_ident: &TableIdent) -> Result<()> {
        let mut state = self.state.lock().await;

        state.remove_table(table_ident)
    }

    async fn table_exists(&self, table_ident: &TableIdent) -> Result<bool> {
        let state = self.state.lock().await;

        state.table_exists(table_ident)
    }

    async fn register_partition(
        &self,
        table_ident: &TableIdent,
        partition: &ConcretePartition,
        location: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().await;

        let table = state.table_mut(table_ident)?;
        let expected = table.metadata.partition_column_names();
        let actual = partition
            .values()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect_vec();
        if expected != actual {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                format!(
                    "Partition {partition} does not match partition columns [{}] of table {table_ident}",
                    expected.join(", ")
                ),
            ));
        }

        table
            .partitions
            .insert(partition.clone(), location.to_string());
        Ok(())
    }

    async fn partition_exists(
        &self,
        table_ident: &TableIdent,
        partition: &ConcretePartition,
    ) -> Result<bool> {
        let state = self.state.lock().await;

        let table = state.table(table_ident)?;
        Ok(table.partitions.contains_key(partition))
    }

    async fn list_partitions(
        &self,
        table_ident: &TableIdent,
    ) -> Result<Vec<(ConcretePartition, String)>> {
        let state = self.state.lock().await;

        let table = state.table(table_ident)?;
        Ok(table
            .partitions
            .iter()
            .map(|(partition, location)| (partition.clone(), location.clone()))
            .collect())
    }
}
