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

//! Discovery of partition directories and data files under a table location.

use super::FileIO;
use crate::spec::{ConcretePartition, Literal, PartitionColumn};
use crate::Result;

/// Returns true for entries readers must skip: hidden files, markers such as
/// `_SUCCESS`, and staging directories.
pub fn is_hidden_or_staging(name: &str, staging_prefix: &str) -> bool {
    name.starts_with('.')
        || name.starts_with('_')
        || (!staging_prefix.is_empty() && name.starts_with(staging_prefix))
}

/// Lists the partition directories below `table_location`.
///
/// Directories are matched level by level against `columns`; anything that is
/// not a `column=value` directory for the expected column is ignored. Results
/// are sorted by partition.
pub async fn list_partition_dirs(
    file_io: &FileIO,
    table_location: &str,
    columns: &[PartitionColumn],
    staging_prefix: &str,
) -> Result<Vec<(ConcretePartition, String)>> {
    if columns.is_empty() {
        return Ok(if file_io.exists(table_location).await? {
            vec![(ConcretePartition::unpartitioned(), table_location.to_string())]
        } else {
            vec![]
        });
    }

    let mut level: Vec<(Vec<Option<Literal>>, String)> =
        vec![(vec![], table_location.to_string())];
    for column in columns {
        let mut next = Vec::new();
        for (values, dir) in level {
            for entry in file_io.list(&dir).await? {
                if !entry.is_dir || is_hidden_or_staging(&entry.name, staging_prefix) {
                    continue;
                }
                if let Some(value) = ConcretePartition::parse_segment(&entry.name, column)? {
                    let mut values = values.clone();
                    values.push(value);
                    next.push((values, entry.path));
                }
            }
        }
        level = next;
    }

    let mut partitions = level
        .into_iter()
        .map(|(values, dir)| {
            let partition = ConcretePartition::new(
                columns
                    .iter()
                    .map(|c| c.name().to_string())
                    .zip(values)
                    .collect(),
            );
            (partition, dir)
        })
        .collect::<Vec<_>>();
    partitions.sort();
    Ok(partitions)
}

/// Lists the visible data files directly inside `dir`, sorted by path.
pub async fn list_data_files(
    file_io: &FileIO,
    dir: &str,
    staging_prefix: &str,
) -> Result<Vec<String>> {
    Ok(file_io
        .list(dir)
        .await?
        .into_iter()
        .filter(|entry| !entry.is_dir && !is_hidden_or_staging(&entry.name, staging_prefix))
        .map(|entry| entry.path)
        .collect())
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_is_hidden_or_staging() {
        assert!(is_hidden_or_staging(".hive-staging_hive_1", ".hive-staging"));
        assert!(is_hidden_or_staging("_SUCCESS", ".hive-staging"));
        assert!(is_hidden_or_staging("tmp_stage", "tmp_"));
        assert!(!is_hidden_or_staging("part-00000", ".hive-staging"));
    }

    #[tokio::test]
    async fn test_list_partition_dirs() {
        let file_io = FileIO::new_with_memory();
        for path in [
            "memory://t/p1=a/p2=1/part-00000",
            "memory://t/p1=a/p2=__HIVE_DEFAULT_PARTITION__/part-00000",
            "memory://t/p1=b/p2=2/part-00000",
            "memory://t/p1=b/other=2/part-00000",
            "memory://t/.hive-staging_hive_x/p1=c/p2=3/part-00000",
            "memory://t/_temporary/part-00000",
        ] {
            file_io.write(path, Bytes::from("x")).await.unwrap();
        }

        let columns = vec![
            PartitionColumn::new("p1", DataType::Utf8),
            PartitionColumn::new("p2", DataType::Int32),
        ];
        let partitions = list_partition_dirs(&file_io, "memory://t", &columns, ".hive-staging")
            .await
            .unwrap();

        let paths = partitions
            .iter()
            .map(|(p, dir)| (p.path(), dir.clone()))
            .collect::<Vec<_>>();
        assert_eq!(paths, vec![
            (
                "p1=a/p2=__HIVE_DEFAULT_PARTITION__".to_string(),
                "memory://t/p1=a/p2=__HIVE_DEFAULT_PARTITION__".to_string()
            ),
            (
                "p1=a/p2=1".to_string(),
                "memory://t/p1=a/p2=1".to_string()
            ),
            (
                "p1=b/p2=2".to_string(),
                "memory://t/p1=b/p2=2".to_string()
            ),
        ]);
        assert_eq!(partitions[1].0.get("p2"), Some(&Literal::int(1)));
    }

    #[tokio::test]
    async fn test_list_unpartitioned_table() {
        let file_io = FileIO::new_with_memory();
        let empty = list_partition_dirs(&file_io, "memory://t", &[], ".hive-staging")
            .await
            .unwrap();
        assert!(empty.is_empty());

        file_io
            .write("memory://t/part-00000", Bytes::from("x"))
            .await
            .unwrap();
        file_io
            .write("memory://t/.part-00000.crc", Bytes::from("x"))
            .await
            .unwrap();
        let partitions = list_partition_dirs(&file_io, "memory://t", &[], ".hive-staging")
            .await
            .unwrap();
        assert_eq!(partitions.len(), 1);
        assert!(partitions[0].0.is_unpartitioned());

        let files = list_data_files(&file_io, "memory://t", ".hive-staging")
            .await
            .unwrap();
        assert_eq!(files, vec!["memory://t/part-00000".to_string()]);
    }
}
