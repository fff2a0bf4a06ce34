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

//! Partitioned table write planning and partition resolution.
//!
//! # Examples
//!
//! ## Overwrite Partitions Of A Table
//!
//! ```rust, no_run
//! use std::sync::Arc;
//!
//! use tablewrite::catalog::memory::MemoryCatalog;
//! use tablewrite::config::WriteConfig;
//! use tablewrite::insert::{InsertExecutor, PartitionMode, RowSource, WriteRequest};
//! use tablewrite::io::FileIO;
//! use tablewrite::spec::{Literal, PartitionSpec};
//! use tablewrite::{Catalog, Result, TableIdent};
//!
//! async fn overwrite(rows: RowSource) -> Result<()> {
//!     let catalog = Arc::new(MemoryCatalog::new(FileIO::new_with_memory(), None));
//!     let table = catalog
//!         .load_table(&TableIdent::from_strs(["db", "t"])?)
//!         .await?;
//!
//!     // INSERT OVERWRITE TABLE t PARTITION (p1 = 'a', p2) SELECT ...
//!     let request = WriteRequest::builder()
//!         .table(table)
//!         .partition_spec(
//!             PartitionSpec::new()
//!                 .with_static("p1", Literal::string("a"))
//!                 .with_dynamic("p2"),
//!         )
//!         .overwrite(true)
//!         .mode(PartitionMode::NonStrict)
//!         .rows(rows)
//!         .build();
//!
//!     let summary = InsertExecutor::new(catalog, WriteConfig::default())
//!         .execute(request)
//!         .await?;
//!     println!("wrote {} rows", summary.total_rows());
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]

mod error;
pub use error::{Error, ErrorKind, Result};

pub mod catalog;
pub use catalog::{Catalog, Namespace, NamespaceIdent, TableCreation, TableIdent};

pub mod table;

pub mod io;
pub mod spec;

pub mod scan;

pub mod arrow;
pub mod config;
pub mod insert;
pub mod writer;

#[cfg(test)]
mod test_utils;
