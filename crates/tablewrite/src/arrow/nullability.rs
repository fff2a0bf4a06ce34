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

//! Checks that written data never puts nulls into non-nullable columns.

use arrow_schema::{DataType, Field, Schema};

use crate::{Error, ErrorKind, Result};

/// Checks that every source column may be written to the target column at
/// the same position.
///
/// A nullable source field may not feed a non-nullable target field. The
/// check recurses through list elements, map keys and values, and struct
/// fields, and reports the first violating column path.
pub fn check_nullability(source: &Schema, target: &Schema) -> Result<()> {
    if source.fields().len() != target.fields().len() {
        return Err(Error::new(
            ErrorKind::DataInvalid,
            format!(
                "Source has {} columns but target has {}",
                source.fields().len(),
                target.fields().len()
            ),
        ));
    }

    for (source_field, target_field) in source.fields().iter().zip(target.fields().iter()) {
        check_field(source_field, target_field, target_field.name())?;
    }
    Ok(())
}

fn check_field(source: &Field, target: &Field, path: &str) -> Result<()> {
    if source.is_nullable() && !target.is_nullable() {
        return Err(Error::new(
            ErrorKind::NullabilityViolation,
            format!("Cannot write nullable values to non-null column '{path}'"),
        )
        .with_context("column", path));
    }
    check_nested(source.data_type(), target.data_type(), path)
}

fn check_nested(source: &DataType, target: &DataType, path: &str) -> Result<()> {
    match (source, target) {
        (DataType::List(s), DataType::List(t))
        | (DataType::LargeList(s), DataType::LargeList(t))
        | (DataType::FixedSizeList(s, _), DataType::FixedSizeList(t, _))
        | (DataType::List(s), DataType::LargeList(t))
        | (DataType::LargeList(s), DataType::List(t)) => {
            check_field(s, t, &format!("{path}.element"))
        }
        (DataType::Map(s, _), DataType::Map(t, _)) => {
            match (s.data_type(), t.data_type()) {
                (DataType::Struct(s_entries), DataType::Struct(t_entries))
                    if s_entries.len() == 2 && t_entries.len() == 2 =>
                {
                    check_field(&s_entries[0], &t_entries[0], &format!("{path}.key"))?;
                    check_field(&s_entries[1], &t_entries[1], &format!("{path}.value"))
                }
                _ => Ok(()),
            }
        }
        (DataType::Struct(s_fields), DataType::Struct(t_fields)) => {
            for (s, t) in s_fields.iter().zip(t_fields.iter()) {
                check_field(s, t, &format!("{path}.{}", t.name()))?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_schema::Fields;
    use pretty_assertions::assert_eq;

    use super::*;

    fn map_type(value_nullable: bool) -> DataType {
        DataType::Map(
            Arc::new(Field::new(
                "entries",
                DataType::Struct(Fields::from(vec![
                    Field::new("keys", DataType::Utf8, false),
                    Field::new("values", DataType::Int32, value_nullable),
                ])),
                false,
            )),
            false,
        )
    }

    #[test]
    fn test_top_level_violation() {
        let source = Schema::new(vec![Field::new("a", DataType::Int32, true)]);
        let target = Schema::new(vec![Field::new("a", DataType::Int32, false)]);

        let err = check_nullability(&source, &target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NullabilityViolation);
        assert_eq!(err.context_value("column"), Some("a"));
    }

    #[test]
    fn test_non_null_into_nullable_is_fine() {
        let source = Schema::new(vec![Field::new("a", DataType::Int32, false)]);
        let target = Schema::new(vec![Field::new("a", DataType::Int32, true)]);
        check_nullability(&source, &target).unwrap();
    }

    #[test]
    fn test_nested_list_element_violation() {
        let source = Schema::new(vec![Field::new(
            "arr",
            DataType::List(Arc::new(Field::new("item", DataType::Int32, true))),
            false,
        )]);
        let target = Schema::new(vec![Field::new(
            "arr",
            DataType::List(Arc::new(Field::new("item", DataType::Int32, false))),
            false,
        )]);

        let err = check_nullability(&source, &target).unwrap_err();
        assert_eq!(err.context_value("column"), Some("arr.element"));
    }

    #[test]
    fn test_nested_map_value_violation() {
        let source = Schema::new(vec![Field::new("m", map_type(true), true)]);
        let target = Schema::new(vec![Field::new("m", map_type(false), true)]);

        let err = check_nullability(&source, &target).unwrap_err();
        assert_eq!(err.context_value("column"), Some("m.value"));

        check_nullability(&target, &source).unwrap();
    }

    #[test]
    fn test_nested_struct_violation() {
        let inner = |nullable| {
            DataType::Struct(Fields::from(vec![
                Field::new("x", DataType::Int32, false),
                Field::new("y", DataType::Utf8, nullable),
            ]))
        };
        let source = Schema::new(vec![Field::new("s", inner(true), false)]);
        let target = Schema::new(vec![Field::new("s", inner(false), false)]);

        let err = check_nullability(&source, &target).unwrap_err();
        assert_eq!(err.context_value("column"), Some("s.y"));
    }
}
