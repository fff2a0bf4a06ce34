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


//! In-memory catalog state: namespaces, tables and registered partitions.

use std::collections::{btree_map, BTreeMap, HashMap};

use crate::spec::{ConcretePartition, TableMetadataRef};
use crate::{Error, ErrorKind, NamespaceIdent, Result, TableIdent};

/// A table and the partitions registered for it, keyed by partition.
#[derive(Debug, Clone)]
pub(crate) struct TableEntry {
    pub(crate) metadata: TableMetadataRef,
    pub(crate) partitions: BTreeMap<ConcretePartition, String>,
}

#[derive(Debug, Clone, Default)]
struct NamespaceEntry {
    properties: HashMap<String, String>,
    tables: BTreeMap<String, TableEntry>,
}

/// Namespaces keyed by their full identifier. A nested namespace can only be
/// created once its parent exists.
#[derive(Debug, Default)]
pub(crate) struct CatalogState {
    namespaces: BTreeMap<NamespaceIdent, NamespaceEntry>,
}

impl CatalogState {
    fn namespace(&self, ident: &NamespaceIdent) -> Result<&NamespaceEntry> {
        self.namespaces
            .get(ident)
            .ok_or_else(|| namespace_not_found(ident))
    }

    fn namespace_mut(&mut self, ident: &NamespaceIdent) -> Result<&mut NamespaceEntry> {
        self.namespaces
            .get_mut(ident)
            .ok_or_else(|| namespace_not_found(ident))
    }

    pub(crate) fn namespace_exists(&self, ident: &NamespaceIdent) -> bool {
        self.namespaces.contains_key(ident)
    }

    pub(crate) fn insert_namespace(
        &mut self,
        ident: &NamespaceIdent,
        properties: HashMap<String, String>,
    ) -> Result<()> {
        if let Some(parent) = ident.parent() {
            self.namespace(&parent)?;
        }

        match self.namespaces.entry(ident.clone()) {
            btree_map::Entry::Occupied(_) => Err(Error::new(
                ErrorKind::ObjectAlreadyExists,
                format!("Cannot create namespace {ident}. Namespace already exists."),
            )),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(NamespaceEntry {
                    properties,
                    ..Default::default()
                });
                Ok(())
            }
        }
    }

    pub(crate) fn namespace_properties(
        &self,
        ident: &NamespaceIdent,
    ) -> Result<&HashMap<String, String>> {
        Ok(&self.namespace(ident)?.properties)
    }

    /// Table names of a namespace, sorted.
    pub(crate) fn table_names(&self, ident: &NamespaceIdent) -> Result<Vec<&String>> {
        Ok(self.namespace(ident)?.tables.keys().collect())
    }

    pub(crate) fn table_exists(&self, ident: &TableIdent) -> Result<bool> {
        Ok(self
            .namespace(ident.namespace())?
            .tables
            .contains_key(ident.name()))
    }

    pub(crate) fn table(&self, ident: &TableIdent) -> Result<&TableEntry> {
        self.namespace(ident.namespace())?
            .tables
            .get(ident.name())
            .ok_or_else(|| table_not_found(ident))
    }

    pub(crate) fn table_mut(&mut self, ident: &TableIdent) -> Result<&mut TableEntry> {
        self.namespace_mut(ident.namespace())?
            .tables
            .get_mut(ident.name())
            .ok_or_else(|| table_not_found(ident))
    }

    pub(crate) fn insert_table(
        &mut self,
        ident: &TableIdent,
        metadata: TableMetadataRef,
    ) -> Result<()> {
        let namespace = self.namespace_mut(ident.namespace())?;
        match namespace.tables.entry(ident.name().to_string()) {
            btree_map::Entry::Occupied(_) => Err(Error::new(
                ErrorKind::ObjectAlreadyExists,
                format!("Cannot create table {ident}. Table already exists."),
            )),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(TableEntry {
                    metadata,
                    partitions: BTreeMap::new(),
                });
                Ok(())
            }
        }
    }

    pub(crate) fn remove_table(&mut self, ident: &TableIdent) -> Result<()> {
        self.namespace_mut(ident.namespace())?
            .tables
            .remove(ident.name())
            .map(|_| ())
            .ok_or_else(|| table_not_found(ident))
    }
}

fn namespace_not_found(ident: &NamespaceIdent) -> Error {
    Error::new(
        ErrorKind::NamespaceNotFound,
        format!("No such namespace: {ident}"),
    )
}

fn table_not_found(ident: &TableIdent) -> Error {
    Error::new(ErrorKind::TableNotFound, format!("No such table: {ident}"))
}
