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

//! File io implementation.
//!
//! # How to use `FileIO`
//!
//! `FileIO` wraps a [`Storage`] and provides the file and directory
//! operations partition writers need:
//!
//! - `write` / `read`: whole-file access.
//! - `list`: direct children of a directory.
//! - `rename`: atomic move of a file or a directory.
//! - `remove_dir_all`: recursive delete.

mod file_io;
pub use file_io::*;

mod storage;
pub use storage::*;

mod local_fs;
pub use local_fs::*;

mod memory;
pub use memory::*;

mod listing;
pub use listing::*;

/// Joins a child name to a directory path.
pub fn join_path(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    if child.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}/{child}")
    }
}
