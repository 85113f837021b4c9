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

//! Vertex-style shuffle driver
//!
//! Each row has a single destination: the partition returned by the key
//! partitioner applied to column 0.

use arrow::array::{Int32Array, Int64Array, LargeStringArray, UInt32Array, UInt64Array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::codec::downcast;
use crate::error::{RiffleError, RiffleResult};
use crate::group::WorkerGroup;
use crate::ops::{finalize_table, push_route, scan_offset_lists};
use crate::partition::{KeyRef, Partitioner};
use crate::schema::verify_schema_consistent;
use crate::shuffle::{shuffle_by_offset_lists, BatchOffsets};
use crate::table::Table;

/// Redistribute a vertex table so that every worker ends up with exactly
/// the rows whose key belongs to its partition.
pub fn shuffle_vertex_table(
    group: &WorkerGroup,
    partitioner: &dyn Partitioner,
    table: &Table,
) -> RiffleResult<Table> {
    let schema = table.schema();
    verify_schema_consistent(schema.as_ref(), group)?;

    let batches = table.batches();
    let offset_lists = scan_offset_lists(
        batches,
        group.partition_count() as usize,
        group.local_peer_count(),
        |batch, lists| scan_batch(batch, partitioner, lists),
    )?;

    debug!(
        "worker {}: vertex shuffle over {} batches",
        group.worker_id(),
        batches.len()
    );

    let received = shuffle_by_offset_lists(&schema, batches, &offset_lists, group)?;
    finalize_table(&schema, received)
}

fn scan_batch(
    batch: &RecordBatch,
    partitioner: &dyn Partitioner,
    lists: &mut BatchOffsets,
) -> RiffleResult<()> {
    if batch.num_columns() == 0 {
        return Err(RiffleError::Invalid(
            "vertex table has no key column".to_string(),
        ));
    }
    let keys = batch.column(0);

    macro_rules! scan_keys {
        ($array_ty:ty, $variant:ident) => {{
            let array = downcast::<$array_ty>(keys)?;
            for row in 0..batch.num_rows() {
                let partition = partitioner.partition(KeyRef::$variant(array.value(row)));
                push_route(lists, partition, row as i64)?;
            }
        }};
    }

    match keys.data_type() {
        DataType::Int64 => scan_keys!(Int64Array, Int64),
        DataType::Int32 => scan_keys!(Int32Array, Int32),
        DataType::UInt64 => scan_keys!(UInt64Array, UInt64),
        DataType::UInt32 => scan_keys!(UInt32Array, UInt32),
        DataType::LargeUtf8 => scan_keys!(LargeStringArray, Utf8),
        other => {
            return Err(RiffleError::UnsupportedType(format!(
                "vertex key column has type {other}"
            )))
        }
    }
    Ok(())
}
