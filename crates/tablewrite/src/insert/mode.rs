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

//! Partition mode policy.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
use serde_derive::{Deserialize, Serialize};

use crate::config::WriteConfig;
use crate::spec::NormalizedSpec;
use crate::{Error, ErrorKind, Result};

/// Whether an insert may leave every partition column dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionMode {
    /// At least one partition column must be static.
    #[default]
    Strict,
    /// Any mix of static and dynamic columns is allowed.
    NonStrict,
}

impl FromStr for PartitionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Use serde to parse the mode (which has rename_all = "lowercase")
        serde_json::from_value(serde_json::Value::String(s.to_lowercase())).map_err(|_| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid partition mode: {s}. Only 'strict' and 'nonstrict' are supported."),
            )
        })
    }
}

impl Display for PartitionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionMode::Strict => write!(f, "strict"),
            PartitionMode::NonStrict => write!(f, "nonstrict"),
        }
    }
}

/// Applies the partition mode and IF NOT EXISTS rules to a validated spec.
pub fn check_mode(mode: PartitionMode, spec: &NormalizedSpec, if_not_exists: bool) -> Result<()> {
    let dynamic = spec.dynamic_columns();

    if if_not_exists && !dynamic.is_empty() {
        return Err(Error::new(
            ErrorKind::IfNotExistsWithDynamicPartitions,
            format!(
                "Dynamic partitions do not support IF NOT EXISTS. Specified partitions with value: [{}]",
                dynamic.iter().map(|c| c.name()).join(", ")
            ),
        ));
    }

    if mode == PartitionMode::Strict && !spec.is_empty() && spec.static_count() == 0 {
        return Err(Error::new(
            ErrorKind::DynamicPartitionsNotAllowedInStrictMode,
            format!(
                "Dynamic partition strict mode requires at least one static partition column. To turn this off set {}=nonstrict",
                WriteConfig::PROPERTY_DYNAMIC_PARTITION_MODE
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::{Literal, PartitionColumn, PartitionValue};

    fn spec(values: Vec<(&str, Option<&str>)>) -> NormalizedSpec {
        NormalizedSpec::new(
            values
                .into_iter()
                .map(|(name, value)| {
                    let value = match value {
                        Some(v) => PartitionValue::Static(Literal::string(v)),
                        None => PartitionValue::Dynamic,
                    };
                    (PartitionColumn::new(name, DataType::Utf8), value)
                })
                .collect(),
        )
    }

    #[test]
    fn test_parse_partition_mode() {
        assert_eq!(
            "strict".parse::<PartitionMode>().unwrap(),
            PartitionMode::Strict
        );
        assert_eq!(
            "NONSTRICT".parse::<PartitionMode>().unwrap(),
            PartitionMode::NonStrict
        );
        assert_eq!(
            "lenient".parse::<PartitionMode>().unwrap_err().kind(),
            ErrorKind::DataInvalid
        );
        assert_eq!(PartitionMode::NonStrict.to_string(), "nonstrict");
    }

    #[test]
    fn test_strict_mode_requires_static_column() {
        let all_dynamic = spec(vec![("p1", None), ("p2", None)]);
        let err = check_mode(PartitionMode::Strict, &all_dynamic, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DynamicPartitionsNotAllowedInStrictMode);

        let one_static = spec(vec![("p1", Some("a")), ("p2", None)]);
        check_mode(PartitionMode::Strict, &one_static, false).unwrap();
        check_mode(PartitionMode::NonStrict, &all_dynamic, false).unwrap();
    }

    #[test]
    fn test_unpartitioned_passes_strict_mode() {
        check_mode(PartitionMode::Strict, &spec(vec![]), false).unwrap();
    }

    #[test]
    fn test_if_not_exists_with_dynamic_partitions() {
        let dynamic = spec(vec![("p1", None), ("p2", None)]);
        for mode in [PartitionMode::Strict, PartitionMode::NonStrict] {
            let err = check_mode(mode, &dynamic, true).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::IfNotExistsWithDynamicPartitions);
            assert_eq!(
                err.message(),
                "Dynamic partitions do not support IF NOT EXISTS. Specified partitions with value: [p1, p2]"
            );
        }

        let mixed = spec(vec![("p1", Some("a")), ("p2", None)]);
        let err = check_mode(PartitionMode::NonStrict, &mixed, true).unwrap_err();
        assert!(err.message().ends_with("[p2]"));

        let fully_static = spec(vec![("p1", Some("a")), ("p2", Some("b"))]);
        check_mode(PartitionMode::Strict, &fully_static, true).unwrap();
    }
}
