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

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;

/// Result that is a wrapper of `Result<T, tablewrite::Error>`
pub type Result<T> = std::result::Result<T, Error>;

/// ErrorKind is all kinds of Error of tablewrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The partition spec names a different number of columns than the table declares.
    ColumnCountMismatch,

    /// The partition spec names columns that are not the table's partition columns.
    ColumnNameMismatch,

    /// A static partition value follows a dynamic partition column.
    OutOfOrderDynamic,

    /// The insert re-specifies a partitioning that differs from the table's own.
    ExtraPartitioningOnInsertInto,

    /// Strict partition mode requires at least one static partition column.
    DynamicPartitionsNotAllowedInStrictMode,

    /// IF NOT EXISTS was combined with dynamic partition columns.
    IfNotExistsWithDynamicPartitions,

    /// A possibly-null source value targets a non-nullable column.
    NullabilityViolation,

    /// Staging or swapping partition data failed.
    ///
    /// Staging failures are retryable and leave the target untouched. Swap
    /// failures are not retryable and carry a `phase: swap` context entry.
    WriteError,

    /// The catalog refused to register a freshly written partition.
    CatalogRegistrationError,

    /// A catalog object (namespace or table) already exists at creation.
    ObjectAlreadyExists,

    /// Table does not exist.
    TableNotFound,

    /// Namespace does not exist.
    NamespaceNotFound,

    /// Input data or metadata is invalid.
    DataInvalid,

    /// The requested feature is not supported.
    FeatureUnsupported,

    /// We don't know what happened here, and no actions other than
    /// just returning it back.
    Unexpected,
}

impl ErrorKind {
    /// Name of the kind, as used in `Display`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ColumnCountMismatch => "ColumnCountMismatch",
            ErrorKind::ColumnNameMismatch => "ColumnNameMismatch",
            ErrorKind::OutOfOrderDynamic => "OutOfOrderDynamic",
            ErrorKind::ExtraPartitioningOnInsertInto => "ExtraPartitioningOnInsertInto",
            ErrorKind::DynamicPartitionsNotAllowedInStrictMode => {
                "DynamicPartitionsNotAllowedInStrictMode"
            }
            ErrorKind::IfNotExistsWithDynamicPartitions => "IfNotExistsWithDynamicPartitions",
            ErrorKind::NullabilityViolation => "NullabilityViolation",
            ErrorKind::WriteError => "WriteError",
            ErrorKind::CatalogRegistrationError => "CatalogRegistrationError",
            ErrorKind::ObjectAlreadyExists => "ObjectAlreadyExists",
            ErrorKind::TableNotFound => "TableNotFound",
            ErrorKind::NamespaceNotFound => "NamespaceNotFound",
            ErrorKind::DataInvalid => "DataInvalid",
            ErrorKind::FeatureUnsupported => "FeatureUnsupported",
            ErrorKind::Unexpected => "Unexpected",
        }
    }

    /// Returns true for errors raised while validating a write request.
    ///
    /// These are always reported before any row is read or written.
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorKind::ColumnCountMismatch
                | ErrorKind::ColumnNameMismatch
                | ErrorKind::OutOfOrderDynamic
                | ErrorKind::ExtraPartitioningOnInsertInto
                | ErrorKind::DynamicPartitionsNotAllowedInStrictMode
                | ErrorKind::IfNotExistsWithDynamicPartitions
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error is the error struct returned by all tablewrite functions.
///
/// ## Display
///
/// Error can be displayed in two ways:
///
/// - Via `Display`: like `err.to_string()` or `format!("{err}")`
///
/// Error will be printed in a single line:
///
/// ```shell
/// WriteError, context: { partition: p1=a/p2=b, phase: swap } => failed to move staged files, source: permission denied
/// ```
///
/// - Via `Debug`: like `format!("{err:?}")`
///
/// Error will be printed in multi lines with more details and backtraces (if captured):
///
/// ```shell
/// WriteError => failed to move staged files
///
/// Context:
///    partition: p1=a/p2=b
///    phase: swap
///
/// Source: permission denied
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,

    context: Vec<(&'static str, String)>,

    source: Option<anyhow::Error>,
    backtrace: Backtrace,

    retryable: bool,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            let entries = self
                .context
                .iter()
                .format_with(", ", |(k, v), f| f(&format_args!("{k}: {v}")));
            write!(f, ", context: {{ {entries} }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("source", &self.source);
            de.field("backtrace", &self.backtrace);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }
        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "Source: {source:#}")?;
        }

        if self.backtrace.status() == BacktraceStatus::Captured {
            writeln!(f)?;
            writeln!(f, "Backtrace:")?;
            writeln!(f, "{}", self.backtrace)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| v.as_ref())
    }
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::default(),

            source: None,
            // `Backtrace::capture()` will check if backtrace has been enabled
            // internally. It's zero cost if backtrace is disabled.
            backtrace: Backtrace::capture(),

            retryable: false,
        }
    }

    /// Set retryable of the error.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set source for error.
    ///
    /// # Notes
    ///
    /// If the source has been set, we will raise a panic here.
    pub fn with_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "the source error has been set");

        self.source = Some(src.into());
        self
    }

    /// Set the backtrace for error.
    ///
    /// This function is served as testing purpose and not intended to be called
    /// by users.
    #[cfg(test)]
    fn with_backtrace(mut self, backtrace: Backtrace) -> Self {
        self.backtrace = backtrace;
        self
    }

    /// Return error's backtrace.
    ///
    /// If you just want to print error with backtrace, use `Debug`, like `format!("{err:?}")`.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Return error's kind.
    ///
    /// Users can use this method to check error's kind and take actions.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's retryable status
    pub fn retryable(&self) -> bool {
        self.retryable
    }

    /// Return error's message.
    #[inline]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Return the value of a context entry, if present.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

macro_rules! define_from_err {
    ($source: path, $error_kind: path, $msg: expr) => {
        impl std::convert::From<$source> for crate::error::Error {
            fn from(v: $source) -> Self {
                Self::new($error_kind, $msg).with_source(v)
            }
        }
    };
}

define_from_err!(
    serde_json::Error,
    ErrorKind::DataInvalid,
    "Failed to parse json string"
);

define_from_err!(
    parquet::errors::ParquetError,
    ErrorKind::Unexpected,
    "Failed to encode or decode a Parquet file"
);

define_from_err!(
    arrow_schema::ArrowError,
    ErrorKind::Unexpected,
    "Arrow Schema Error"
);

define_from_err!(std::io::Error, ErrorKind::Unexpected, "IO Operation failed");

/// Helper macro to check arguments.
///
/// Following example check `a > 0`, otherwise returns an error.
/// ```ignore
/// use tablewrite::ensure_data_valid;
/// ensure_data_valid!(a > 0, "{} is not positive.", a);
/// ```
#[macro_export]
macro_rules! ensure_data_valid {
    ($cond: expr, $fmt: literal, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::new($crate::error::ErrorKind::DataInvalid, format!($fmt, $($arg)*)))
        }
    };
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    use super::*;

    fn generate_error_with_backtrace_disabled() -> Error {
        Error::new(ErrorKind::WriteError, "failed to move staged files".to_string())
            .with_context("partition", "p1=a/p2=b".to_string())
            .with_context("phase", "swap".to_string())
            .with_source(anyhow!("permission denied"))
            .with_backtrace(Backtrace::disabled())
    }

    fn generate_error_with_backtrace_enabled() -> Error {
        Error::new(ErrorKind::WriteError, "failed to move staged files".to_string())
            .with_context("partition", "p1=a/p2=b".to_string())
            .with_context("phase", "swap".to_string())
            .with_source(anyhow!("permission denied"))
            .with_backtrace(Backtrace::force_capture())
    }

    #[test]
    fn test_error_display_without_backtrace() {
        let s = format!("{}", generate_error_with_backtrace_disabled());
        assert_eq!(
            s,
            r#"WriteError, context: { partition: p1=a/p2=b, phase: swap } => failed to move staged files, source: permission denied"#
        )
    }

    #[test]
    fn test_error_display_with_backtrace() {
        let s = format!("{}", generate_error_with_backtrace_enabled());
        assert_eq!(
            s,
            r#"WriteError, context: { partition: p1=a/p2=b, phase: swap } => failed to move staged files, source: permission denied"#
        )
    }

    #[test]
    fn test_error_debug_without_backtrace() {
        let s = format!("{:?}", generate_error_with_backtrace_disabled());
        assert_eq!(
            s,
            r#"WriteError => failed to move staged files

Context:
   partition: p1=a/p2=b
   phase: swap

Source: permission denied
"#
        )
    }

    /// Backtrace contains build information, so we just assert the header of error content.
    #[test]
    fn test_error_debug_with_backtrace() {
        let s = format!("{:?}", generate_error_with_backtrace_enabled());

        let expected = r#"WriteError => failed to move staged files

Context:
   partition: p1=a/p2=b
   phase: swap

Source: permission denied

Backtrace:
   0:"#;
        assert_eq!(&s[..expected.len()], expected,);
    }

    #[test]
    fn test_validation_kinds() {
        assert!(ErrorKind::ColumnCountMismatch.is_validation());
        assert!(ErrorKind::IfNotExistsWithDynamicPartitions.is_validation());
        assert!(!ErrorKind::NullabilityViolation.is_validation());
        assert!(!ErrorKind::WriteError.is_validation());
        assert!(!ErrorKind::ObjectAlreadyExists.is_validation());
    }

    #[test]
    fn test_context_value() {
        let err = generate_error_with_backtrace_disabled();
        assert_eq!(err.context_value("phase"), Some("swap"));
        assert_eq!(err.context_value("missing"), None);
    }
}
