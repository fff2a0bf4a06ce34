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

//! Partition values.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Date32Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
};
use arrow_array::{
    new_null_array, Array, ArrayRef, BooleanArray, Date32Array, Float32Array, Float64Array,
    Int32Array, Int64Array, StringArray, UInt32Array,
};
use arrow_cast::cast::{cast_with_options, CastOptions};
use arrow_schema::DataType;
use arrow_select::take::take;
use chrono::DateTime;
use ordered_float::OrderedFloat;

use crate::{Error, ErrorKind, Result};

/// A typed scalar value bound to a partition column.
///
/// Floats are wrapped in [`OrderedFloat`] so literals hash and compare by
/// exact value, which is what partition grouping relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Literal {
    /// True or false
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit IEEE 754 floating point.
    Float(OrderedFloat<f32>),
    /// 64-bit IEEE 754 floating point.
    Double(OrderedFloat<f64>),
    /// UTF-8 string
    String(String),
    /// Days since 1970-01-01
    Date(i32),
}

impl Literal {
    /// Creates a boolean literal.
    pub fn bool(v: bool) -> Self {
        Self::Boolean(v)
    }

    /// Creates an int literal.
    pub fn int(v: i32) -> Self {
        Self::Int(v)
    }

    /// Creates a long literal.
    pub fn long(v: i64) -> Self {
        Self::Long(v)
    }

    /// Creates a float literal.
    pub fn float(v: f32) -> Self {
        Self::Float(OrderedFloat(v))
    }

    /// Creates a double literal.
    pub fn double(v: f64) -> Self {
        Self::Double(OrderedFloat(v))
    }

    /// Creates a string literal.
    pub fn string(v: impl ToString) -> Self {
        Self::String(v.to_string())
    }

    /// Creates a date literal from days since epoch.
    pub fn date(days: i32) -> Self {
        Self::Date(days)
    }

    /// Reads the value at `row` of an arrow array, `None` for a null slot.
    pub fn try_from_array(array: &dyn Array, row: usize) -> Result<Option<Self>> {
        if array.is_null(row) {
            return Ok(None);
        }

        let literal = match array.data_type() {
            DataType::Boolean => Literal::Boolean(array.as_boolean().value(row)),
            DataType::Int8 => Literal::Int(i32::from(array.as_primitive::<Int8Type>().value(row))),
            DataType::Int16 => {
                Literal::Int(i32::from(array.as_primitive::<Int16Type>().value(row)))
            }
            DataType::Int32 => Literal::Int(array.as_primitive::<Int32Type>().value(row)),
            DataType::Int64 => Literal::Long(array.as_primitive::<Int64Type>().value(row)),
            DataType::Float32 => Literal::float(array.as_primitive::<Float32Type>().value(row)),
            DataType::Float64 => Literal::double(array.as_primitive::<Float64Type>().value(row)),
            DataType::Utf8 => Literal::string(array.as_string::<i32>().value(row)),
            DataType::LargeUtf8 => Literal::string(array.as_string::<i64>().value(row)),
            DataType::Date32 => Literal::Date(array.as_primitive::<Date32Type>().value(row)),
            other => {
                return Err(Error::new(
                    ErrorKind::FeatureUnsupported,
                    format!("Unsupported partition column type: {other}"),
                ));
            }
        };

        Ok(Some(literal))
    }

    /// Casts this literal to the given arrow type.
    ///
    /// String literals are parsed, so `'1'` becomes an int for an int column.
    /// Casts that would lose the value fail instead of producing null.
    pub fn cast_to(&self, data_type: &DataType) -> Result<Literal> {
        let casted = cast_with_options(&self.to_single_array(), data_type, &strict_cast())
            .map_err(|e| {
                Error::new(
                    ErrorKind::DataInvalid,
                    format!("Cannot cast partition value '{self}' to {data_type}"),
                )
                .with_source(e)
            })?;

        Literal::try_from_array(casted.as_ref(), 0)?.ok_or_else(|| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Partition value '{self}' became null when cast to {data_type}"),
            )
        })
    }

    fn to_single_array(&self) -> ArrayRef {
        match self {
            Literal::Boolean(v) => Arc::new(BooleanArray::from(vec![*v])),
            Literal::Int(v) => Arc::new(Int32Array::from(vec![*v])),
            Literal::Long(v) => Arc::new(Int64Array::from(vec![*v])),
            Literal::Float(v) => Arc::new(Float32Array::from(vec![v.0])),
            Literal::Double(v) => Arc::new(Float64Array::from(vec![v.0])),
            Literal::String(v) => Arc::new(StringArray::from(vec![v.as_str()])),
            Literal::Date(v) => Arc::new(Date32Array::from(vec![*v])),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Boolean(v) => write!(f, "{v}"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Long(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v}"),
            Literal::Double(v) => write!(f, "{v}"),
            Literal::String(v) => write!(f, "{v}"),
            Literal::Date(days) => match DateTime::from_timestamp(i64::from(*days) * 86_400, 0) {
                Some(ts) => write!(f, "{}", ts.date_naive().format("%Y-%m-%d")),
                None => write!(f, "{days}"),
            },
        }
    }
}

fn strict_cast() -> CastOptions<'static> {
    CastOptions {
        safe: false,
        ..Default::default()
    }
}

/// Builds an array of `num_rows` copies of `value` with the given type.
///
/// Used to re-attach partition columns, which are not stored in data files.
pub fn literal_to_array(
    value: Option<&Literal>,
    data_type: &DataType,
    num_rows: usize,
) -> Result<ArrayRef> {
    let Some(value) = value else {
        return Ok(new_null_array(data_type, num_rows));
    };

    let single = cast_with_options(&value.to_single_array(), data_type, &strict_cast())?;
    let indices = UInt32Array::from(vec![0u32; num_rows]);
    Ok(take(single.as_ref(), &indices, None)?)
}
