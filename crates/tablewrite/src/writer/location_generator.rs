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

//! This module contains the location generator and file name generator for
//! generating paths of partition directories and data files.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::io::join_path;
use crate::spec::ConcretePartition;

/// `PartitionLocationGenerator` maps concrete partitions to directories below
/// a root, `<root>/<col>=<value>/...`.
#[derive(Clone, Debug)]
pub struct PartitionLocationGenerator {
    root: String,
}

impl PartitionLocationGenerator {
    /// Create a new `PartitionLocationGenerator` rooted at `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Directory of the partition. The unpartitioned partition maps to the root.
    pub fn generate_location(&self, partition: &ConcretePartition) -> String {
        join_path(&self.root, &partition.path())
    }
}

/// `DataFileNameGenerator` used to generate file names for data files.
///
/// The file name format is "{prefix}-{file_count:05}-{job_id}{extension}",
/// e.g. `part-00000-<uuid>` or `part-00000-<uuid>.c000.parquet`.
#[derive(Clone, Debug)]
pub struct DataFileNameGenerator {
    prefix: String,
    job_id: String,
    extension: String,
    file_count: Arc<AtomicU64>,
}

impl DataFileNameGenerator {
    /// Create a new `DataFileNameGenerator`.
    pub fn new(prefix: impl Into<String>, job_id: impl Into<String>, extension: Option<&str>) -> Self {
        Self {
            prefix: prefix.into(),
            job_id: job_id.into(),
            extension: extension.map(|e| format!(".{e}")).unwrap_or_default(),
            file_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Generate a file name.
    pub fn generate_file_name(&self) -> String {
        let file_id = self
            .file_count
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!(
            "{}-{:05}-{}{}",
            self.prefix, file_id, self.job_id, self.extension
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::Literal;

    #[test]
    fn test_partition_location() {
        let generator = PartitionLocationGenerator::new("memory://warehouse/db/t");
        let partition = ConcretePartition::new(vec![
            ("p1".to_string(), Some(Literal::string("a"))),
            ("p2".to_string(), None),
        ]);

        assert_eq!(
            generator.generate_location(&partition),
            "memory://warehouse/db/t/p1=a/p2=__HIVE_DEFAULT_PARTITION__"
        );
        assert_eq!(
            generator.generate_location(&ConcretePartition::unpartitioned()),
            "memory://warehouse/db/t"
        );
    }

    #[test]
    fn test_file_names() {
        let hive = DataFileNameGenerator::new("part", "job", None);
        assert_eq!(hive.generate_file_name(), "part-00000-job");
        assert_eq!(hive.generate_file_name(), "part-00001-job");

        let data_source = DataFileNameGenerator::new("part", "job", Some("c000.parquet"));
        assert_eq!(data_source.generate_file_name(), "part-00000-job.c000.parquet");

        // Clones share the counter.
        let cloned = data_source.clone();
        assert_eq!(cloned.generate_file_name(), "part-00001-job.c000.parquet");
    }
}
