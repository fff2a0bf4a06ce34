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

//! Write configuration.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};
use crate::insert::PartitionMode;

// Helper function to parse a property from a HashMap
// If the property is not found, use the default value
fn parse_property<T: FromStr>(
    properties: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T>
where
    <T as FromStr>::Err: Display,
{
    properties.get(key).map_or(Ok(default), |value| {
        value.parse::<T>().map_err(|e| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid value for {key}: {e}"),
            )
        })
    })
}

/// Settings that control how inserts are planned and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteConfig {
    /// Whether inserts may leave every partition column dynamic.
    pub partition_mode: PartitionMode,
    /// Maximum number of partitions written concurrently.
    pub write_parallelism: usize,
    /// Maximum number of partitions a single dynamic insert may create.
    pub max_dynamic_partitions: usize,
}

impl WriteConfig {
    /// Property key for the partition mode, `strict` or `nonstrict`.
    pub const PROPERTY_DYNAMIC_PARTITION_MODE: &str = "hive.exec.dynamic.partition.mode";
    /// Default partition mode.
    pub const PROPERTY_DYNAMIC_PARTITION_MODE_DEFAULT: PartitionMode = PartitionMode::Strict;

    /// Property key for the number of partitions written concurrently.
    pub const PROPERTY_WRITE_PARALLELISM: &str = "write.parallelism";
    /// Default write parallelism.
    pub const PROPERTY_WRITE_PARALLELISM_DEFAULT: usize = 4;

    /// Property key for the dynamic partition limit of one insert.
    pub const PROPERTY_MAX_DYNAMIC_PARTITIONS: &str = "hive.exec.max.dynamic.partitions";
    /// Default dynamic partition limit.
    pub const PROPERTY_MAX_DYNAMIC_PARTITIONS_DEFAULT: usize = 1000;
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            partition_mode: Self::PROPERTY_DYNAMIC_PARTITION_MODE_DEFAULT,
            write_parallelism: Self::PROPERTY_WRITE_PARALLELISM_DEFAULT,
            max_dynamic_partitions: Self::PROPERTY_MAX_DYNAMIC_PARTITIONS_DEFAULT,
        }
    }
}

impl TryFrom<&HashMap<String, String>> for WriteConfig {
    // parse by entry key or use default value
    type Error = Error;

    fn try_from(props: &HashMap<String, String>) -> Result<Self> {
        let config = WriteConfig {
            partition_mode: parse_property(
                props,
                WriteConfig::PROPERTY_DYNAMIC_PARTITION_MODE,
                WriteConfig::PROPERTY_DYNAMIC_PARTITION_MODE_DEFAULT,
            )?,
            write_parallelism: parse_property(
                props,
                WriteConfig::PROPERTY_WRITE_PARALLELISM,
                WriteConfig::PROPERTY_WRITE_PARALLELISM_DEFAULT,
            )?,
            max_dynamic_partitions: parse_property(
                props,
                WriteConfig::PROPERTY_MAX_DYNAMIC_PARTITIONS,
                WriteConfig::PROPERTY_MAX_DYNAMIC_PARTITIONS_DEFAULT,
            )?,
        };

        crate::ensure_data_valid!(
            config.write_parallelism > 0,
            "Invalid value for {}: must be positive",
            WriteConfig::PROPERTY_WRITE_PARALLELISM
        );

        Ok(config)
    }
}
