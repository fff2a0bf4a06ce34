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

//! Catalog API
//!
//! The catalog owns table definitions and the set of registered partitions.
//! Partition writers register every partition they overwrite or append to.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::ops::Deref;

use arrow_schema::SchemaRef;
use async_trait::async_trait;
use itertools::Itertools;
use typed_builder::TypedBuilder;

use crate::spec::{ConcretePartition, PartitionColumn, TableKind};
use crate::table::Table;
use crate::{Error, ErrorKind, Result};

pub mod memory;

/// The catalog API.
#[async_trait]
pub trait Catalog: Debug + Sync + Send {
    /// Create a new namespace inside the catalog.
    async fn create_namespace(
        &self,
        namespace: &NamespaceIdent,
        properties: HashMap<String, String>,
    ) -> Result<Namespace>;

    /// Check if namespace exists in catalog.
    async fn namespace_exists(&self, namespace: &NamespaceIdent) -> Result<bool>;

    /// List tables from namespace.
    async fn list_tables(&self, namespace: &NamespaceIdent) -> Result<Vec<TableIdent>>;

    /// Create a new table inside the namespace.
    ///
    /// Fails with [`ErrorKind::ObjectAlreadyExists`] when the table exists,
    /// unless [`TableCreation::if_not_exists`] is set, in which case the
    /// existing table is returned unchanged.
    async fn create_table(
        &self,
        namespace: &NamespaceIdent,
        creation: TableCreation,
    ) -> Result<Table>;

    /// Load table from the catalog.
    async fn load_table(&self, table: &TableIdent) -> Result<Table>;

    /// Drop a table from the catalog. Data files are left in place.
    async fn drop_table(&self, table: &TableIdent) -> Result<()>;

    /// Check if a table exists in the catalog.
    async fn table_exists(&self, table: &TableIdent) -> Result<bool>;

    /// Registers a partition and its directory. Registering an already known
    /// partition updates its location.
    async fn register_partition(
        &self,
        table: &TableIdent,
        partition: &ConcretePartition,
        location: &str,
    ) -> Result<()>;

    /// Check if a partition is registered.
    async fn partition_exists(
        &self,
        table: &TableIdent,
        partition: &ConcretePartition,
    ) -> Result<bool>;

    /// List registered partitions with their locations, sorted by partition.
    async fn list_partitions(&self, table: &TableIdent)
        -> Result<Vec<(ConcretePartition, String)>>;
}

/// Identifier of a namespace, one string per level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceIdent(Vec<String>);

impl NamespaceIdent {
    /// Single-level namespace identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Multi-level namespace identifier. Fails when `levels` is empty.
    pub fn from_strs(levels: impl IntoIterator<Item = impl ToString>) -> Result<Self> {
        let levels = levels.into_iter().map(|s| s.to_string()).collect_vec();
        if levels.is_empty() {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                "Namespace identifier must have at least one level",
            ));
        }
        Ok(Self(levels))
    }

    /// The enclosing namespace, `None` at the top level.
    pub fn parent(&self) -> Option<Self> {
        match self.0.split_last() {
            Some((_, parent)) if !parent.is_empty() => Some(Self(parent.to_vec())),
            _ => None,
        }
    }
}

impl Deref for NamespaceIdent {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for NamespaceIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A namespace and its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: NamespaceIdent,
    properties: HashMap<String, String>,
}

impl Namespace {
    /// Creates a namespace.
    pub fn new(name: NamespaceIdent, properties: HashMap<String, String>) -> Self {
        Self { name, properties }
    }

    /// Namespace identifier.
    pub fn name(&self) -> &NamespaceIdent {
        &self.name
    }

    /// Namespace properties, e.g. `location`.
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}

/// Identifier of a table: its namespace plus a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdent {
    /// Namespace of the table.
    pub namespace: NamespaceIdent,
    /// Table name.
    pub name: String,
}

impl TableIdent {
    /// Create a new table identifier.
    pub fn new(namespace: NamespaceIdent, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    /// Get the namespace of the table.
    pub fn namespace(&self) -> &NamespaceIdent {
        &self.namespace
    }

    /// Get the name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parses `[ns1, ..., nsN, table]`. The last element is the table name.
    pub fn from_strs(parts: impl IntoIterator<Item = impl ToString>) -> Result<Self> {
        let mut parts = parts.into_iter().map(|s| s.to_string()).collect_vec();
        let name = parts.pop().ok_or_else(|| {
            Error::new(ErrorKind::DataInvalid, "Table identifier must not be empty")
        })?;
        Ok(Self::new(NamespaceIdent::from_strs(parts)?, name))
    }
}

impl Display for TableIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// TableCreation represents the creation of a table in the catalog.
#[derive(Debug, TypedBuilder)]
pub struct TableCreation {
    /// The name of the table.
    pub name: String,
    /// The location of the table.
    #[builder(default, setter(strip_option(fallback = location_opt)))]
    pub location: Option<String>,
    /// The data columns of the table.
    pub schema: SchemaRef,
    /// The partition columns of the table, empty for an unpartitioned table.
    #[builder(default)]
    pub partition_columns: Vec<PartitionColumn>,
    /// How the table stages and names its files.
    #[builder(default)]
    pub kind: TableKind,
    /// The properties of the table.
    #[builder(default)]
    pub properties: HashMap<String, String>,
    /// Return the existing table instead of failing when it already exists.
    #[builder(default)]
    pub if_not_exists: bool,
}
