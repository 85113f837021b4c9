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

//! Row-level encoding and decoding of selected rows
//!
//! `encode_rows` writes the rows named by an offset list into an archive:
//! the row count, then each column in schema order. `decode_rows` rebuilds a
//! record batch from the archive using the shared schema; the stream is
//! untagged, so both sides must hold the same schema.
//!
//! Per-column formats:
//! - fixed-width numeric: the raw value per selected row
//! - `large_utf8`: `len:u64` then the bytes, per selected row
//! - `null`: nothing, the count is carried by the row-count prefix
//! - `large_list<T>`: `len:i64` then the element values, per selected row
//!
//! Validity is not transmitted; fixed-width values are read from the value
//! buffer as-is.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, LargeListArray, LargeListBuilder, LargeStringArray, LargeStringBuilder, NullArray,
    PrimitiveArray, PrimitiveBuilder,
};
use arrow::datatypes::{ArrowPrimitiveType, DataType, FieldRef, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::codec::archive::WireValue;
use crate::codec::{dispatch_primitive, downcast, Archive, ArchiveReader, WireType};
use crate::error::{RiffleError, RiffleResult};

/// Encode the rows of `batch` named by `offsets`, in offset-list order.
///
/// Offsets must lie in `[0, batch.num_rows())`; an index may appear more
/// than once.
pub fn encode_rows(archive: &mut Archive, batch: &RecordBatch, offsets: &[i64]) -> RiffleResult<()> {
    archive.put(offsets.len() as i64);
    for column in batch.columns() {
        encode_column(archive, column, offsets)?;
    }
    Ok(())
}

/// Decode one archive into a record batch conforming to `schema`.
pub fn decode_rows(reader: &mut ArchiveReader, schema: &SchemaRef) -> RiffleResult<RecordBatch> {
    let row_count = reader.take::<i64>()?;
    if row_count < 0 {
        return Err(RiffleError::DecodeTruncated(format!(
            "negative row count: {row_count}"
        )));
    }
    let row_count = row_count as usize;
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        columns.push(decode_column(reader, field, row_count)?);
    }
    let options = RecordBatchOptions::new().with_row_count(Some(row_count));
    RecordBatch::try_new_with_options(schema.clone(), columns, &options).map_err(Into::into)
}

fn encode_column(archive: &mut Archive, column: &ArrayRef, offsets: &[i64]) -> RiffleResult<()> {
    match WireType::of(column.data_type())? {
        WireType::Primitive(kind) => {
            dispatch_primitive!(kind, encode_primitive(archive, column, offsets))
        }
        WireType::LargeUtf8 => encode_strings(archive, column, offsets),
        WireType::Null => Ok(()),
        WireType::LargeList(kind) => {
            dispatch_primitive!(kind, encode_list(archive, column, offsets))
        }
    }
}

fn decode_column(
    reader: &mut ArchiveReader,
    field: &FieldRef,
    row_count: usize,
) -> RiffleResult<ArrayRef> {
    match WireType::of(field.data_type())? {
        WireType::Primitive(kind) => {
            dispatch_primitive!(kind, decode_primitive(reader, row_count))
        }
        WireType::LargeUtf8 => decode_strings(reader, row_count),
        WireType::Null => Ok(Arc::new(NullArray::new(row_count)) as ArrayRef),
        WireType::LargeList(kind) => {
            let child = match field.data_type() {
                DataType::LargeList(child) => child.clone(),
                _ => unreachable!("wire type resolved as large_list"),
            };
            dispatch_primitive!(kind, decode_list(reader, row_count, child))
        }
    }
}

fn encode_primitive<T>(archive: &mut Archive, column: &ArrayRef, offsets: &[i64]) -> RiffleResult<()>
where
    T: ArrowPrimitiveType,
    T::Native: WireValue,
{
    let array = downcast::<PrimitiveArray<T>>(column)?;
    let values = array.values();
    for &row in offsets {
        archive.put(values[row as usize]);
    }
    Ok(())
}

fn decode_primitive<T>(reader: &mut ArchiveReader, row_count: usize) -> RiffleResult<ArrayRef>
where
    T: ArrowPrimitiveType,
    T::Native: WireValue,
{
    let mut builder = PrimitiveBuilder::<T>::with_capacity(row_count);
    for _ in 0..row_count {
        builder.append_value(reader.take::<T::Native>()?);
    }
    Ok(Arc::new(builder.finish()))
}

fn encode_strings(archive: &mut Archive, column: &ArrayRef, offsets: &[i64]) -> RiffleResult<()> {
    let array = downcast::<LargeStringArray>(column)?;
    for &row in offsets {
        let value = array.value(row as usize);
        archive.put(value.len() as u64);
        archive.put_bytes(value.as_bytes());
    }
    Ok(())
}

fn decode_strings(reader: &mut ArchiveReader, row_count: usize) -> RiffleResult<ArrayRef> {
    let mut builder = LargeStringBuilder::with_capacity(row_count, row_count * 8);
    for _ in 0..row_count {
        let len = reader.take::<u64>()? as usize;
        let bytes = reader.take_bytes(len)?;
        let value = std::str::from_utf8(bytes)
            .map_err(|_| RiffleError::Invalid("string payload is not valid UTF-8".to_string()))?;
        builder.append_value(value);
    }
    Ok(Arc::new(builder.finish()))
}

fn encode_list<T>(archive: &mut Archive, column: &ArrayRef, offsets: &[i64]) -> RiffleResult<()>
where
    T: ArrowPrimitiveType,
    T::Native: WireValue,
{
    let list = downcast::<LargeListArray>(column)?;
    let value_offsets = list.value_offsets();
    let values = list
        .values()
        .as_any()
        .downcast_ref::<PrimitiveArray<T>>()
        .ok_or_else(|| {
            RiffleError::Invalid("list values do not match their declared type".to_string())
        })?;
    let values = values.values();
    for &row in offsets {
        let start = value_offsets[row as usize] as usize;
        let end = value_offsets[row as usize + 1] as usize;
        archive.put((end - start) as i64);
        for value in &values[start..end] {
            archive.put(*value);
        }
    }
    Ok(())
}

fn decode_list<T>(
    reader: &mut ArchiveReader,
    row_count: usize,
    child: FieldRef,
) -> RiffleResult<ArrayRef>
where
    T: ArrowPrimitiveType,
    T::Native: WireValue,
{
    let mut builder = LargeListBuilder::new(PrimitiveBuilder::<T>::new()).with_field(child);
    for _ in 0..row_count {
        let len = reader.take::<i64>()?;
        if len < 0 {
            return Err(RiffleError::DecodeTruncated(format!(
                "negative list length: {len}"
            )));
        }
        for _ in 0..len {
            builder.values().append_value(reader.take::<T::Native>()?);
        }
        builder.append(true);
    }
    Ok(Arc::new(builder.finish()))
}
