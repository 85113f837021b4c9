// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Type-dispatched columnar codec
//!
//! The wire format is untagged and schema-driven: an archive carries
//! `row_count:i64` followed by the columns in schema order, each encoded by
//! the per-type routine in [`rows`]. The supported logical type set is
//! closed; dispatch is a `match` on [`WireType`], resolved once per column.

use std::any::Any;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Schema};

use crate::error::{RiffleError, RiffleResult};

pub mod archive;
pub mod rows;
pub mod select;

pub use archive::{Archive, ArchiveReader};
pub use rows::{decode_rows, encode_rows};
pub use select::select_rows;

/// Fixed-width numeric kinds, usable standalone or as large-list elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Float64,
    Float32,
    Int64,
    Int32,
    UInt64,
    UInt32,
}

/// Tag for the closed set of supported logical types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Primitive(PrimitiveKind),
    LargeUtf8,
    Null,
    LargeList(PrimitiveKind),
}

impl WireType {
    /// Resolve the wire tag for an arrow logical type, or fail with
    /// `UnsupportedType`.
    pub fn of(data_type: &DataType) -> RiffleResult<Self> {
        match data_type {
            DataType::Float64 => Ok(WireType::Primitive(PrimitiveKind::Float64)),
            DataType::Float32 => Ok(WireType::Primitive(PrimitiveKind::Float32)),
            DataType::Int64 => Ok(WireType::Primitive(PrimitiveKind::Int64)),
            DataType::Int32 => Ok(WireType::Primitive(PrimitiveKind::Int32)),
            DataType::UInt64 => Ok(WireType::Primitive(PrimitiveKind::UInt64)),
            DataType::UInt32 => Ok(WireType::Primitive(PrimitiveKind::UInt32)),
            DataType::LargeUtf8 => Ok(WireType::LargeUtf8),
            DataType::Null => Ok(WireType::Null),
            DataType::LargeList(field) => match field.data_type() {
                DataType::Float64 => Ok(WireType::LargeList(PrimitiveKind::Float64)),
                DataType::Float32 => Ok(WireType::LargeList(PrimitiveKind::Float32)),
                DataType::Int64 => Ok(WireType::LargeList(PrimitiveKind::Int64)),
                DataType::Int32 => Ok(WireType::LargeList(PrimitiveKind::Int32)),
                DataType::UInt64 => Ok(WireType::LargeList(PrimitiveKind::UInt64)),
                DataType::UInt32 => Ok(WireType::LargeList(PrimitiveKind::UInt32)),
                other => Err(RiffleError::UnsupportedType(format!(
                    "large_list<{other}>"
                ))),
            },
            other => Err(RiffleError::UnsupportedType(other.to_string())),
        }
    }
}

/// Verify that every field of `schema` is encodable. Drivers call this
/// before any network traffic so an unsupported column fails uniformly on
/// every worker.
pub fn check_supported(schema: &Schema) -> RiffleResult<()> {
    for field in schema.fields() {
        WireType::of(field.data_type()).map_err(|_| {
            RiffleError::UnsupportedType(format!(
                "column '{}' has type {}",
                field.name(),
                field.data_type()
            ))
        })?;
    }
    Ok(())
}

/// Expand a [`PrimitiveKind`] into a call generic over the matching
/// `ArrowPrimitiveType`.
macro_rules! dispatch_primitive {
    ($kind:expr, $fn:ident($($args:expr),*)) => {
        match $kind {
            $crate::codec::PrimitiveKind::Float64 => {
                $fn::<arrow::datatypes::Float64Type>($($args),*)
            }
            $crate::codec::PrimitiveKind::Float32 => {
                $fn::<arrow::datatypes::Float32Type>($($args),*)
            }
            $crate::codec::PrimitiveKind::Int64 => {
                $fn::<arrow::datatypes::Int64Type>($($args),*)
            }
            $crate::codec::PrimitiveKind::Int32 => {
                $fn::<arrow::datatypes::Int32Type>($($args),*)
            }
            $crate::codec::PrimitiveKind::UInt64 => {
                $fn::<arrow::datatypes::UInt64Type>($($args),*)
            }
            $crate::codec::PrimitiveKind::UInt32 => {
                $fn::<arrow::datatypes::UInt32Type>($($args),*)
            }
        }
    };
}
pub(crate) use dispatch_primitive;

/// Downcast an array to its concrete type; failure means the array does not
/// match its declared data type.
pub(crate) fn downcast<A: Any>(array: &ArrayRef) -> RiffleResult<&A> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| RiffleError::Invalid("array does not match its declared type".to_string()))
}
