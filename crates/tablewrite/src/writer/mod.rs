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

//! Writers that materialize a write plan as data files.
//!
//! A [`PartitionWriter`] executes one partition operation of a write plan:
//! it checks and conforms the rows to the table schema, stages them through
//! the table's [`TableFormat`] and swaps them into the partition directory.

mod format;
pub use format::*;

mod location_generator;
pub use location_generator::*;

mod partition_writer;
pub use partition_writer::*;

/// What one partition write produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrittenStats {
    /// Rows written.
    pub rows_written: u64,
    /// Data files written.
    pub files_written: usize,
    /// Partition directory the data landed in.
    pub location: String,
}
