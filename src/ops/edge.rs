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

//! Edge-style shuffle driver
//!
//! An edge row carries two vertex-identifier columns. The row goes to the
//! partition owning its source vertex and, when different, additionally to
//! the partition owning its destination vertex: every partition that owns
//! an endpoint must see the edge.

use arrow::array::{ArrayRef, Int32Array, Int64Array, UInt32Array, UInt64Array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::codec::downcast;
use crate::error::{RiffleError, RiffleResult};
use crate::group::WorkerGroup;
use crate::ops::{finalize_table, push_route, scan_offset_lists};
use crate::partition::VertexPartitioner;
use crate::schema::verify_schema_consistent;
use crate::shuffle::{shuffle_by_offset_lists, BatchOffsets};
use crate::table::Table;

/// Redistribute an edge table so that every worker ends up with exactly
/// the edges incident to its partition's vertices. An edge whose endpoints
/// live on two partitions is delivered to both.
pub fn shuffle_edge_table(
    group: &WorkerGroup,
    partitioner: &dyn VertexPartitioner,
    src_col: usize,
    dst_col: usize,
    table: &Table,
) -> RiffleResult<Table> {
    let schema = table.schema();
    verify_schema_consistent(schema.as_ref(), group)?;
    // Past this point every worker holds the same schema, so this check
    // fails on all of them or on none.
    if src_col >= schema.fields().len() || dst_col >= schema.fields().len() {
        return Err(RiffleError::Invalid(format!(
            "endpoint columns ({src_col}, {dst_col}) out of range for {} columns",
            schema.fields().len()
        )));
    }

    let batches = table.batches();
    let offset_lists = scan_offset_lists(
        batches,
        group.partition_count() as usize,
        group.local_peer_count(),
        |batch, lists| scan_batch(batch, partitioner, src_col, dst_col, lists),
    )?;

    debug!(
        "worker {}: edge shuffle over {} batches",
        group.worker_id(),
        batches.len()
    );

    let received = shuffle_by_offset_lists(&schema, batches, &offset_lists, group)?;
    finalize_table(&schema, received)
}

/// A vertex-identifier column viewed as u64 ids.
enum IdColumn<'a> {
    Int64(&'a Int64Array),
    Int32(&'a Int32Array),
    UInt64(&'a UInt64Array),
    UInt32(&'a UInt32Array),
}

impl IdColumn<'_> {
    fn value(&self, row: usize) -> u64 {
        match self {
            IdColumn::Int64(a) => a.value(row) as u64,
            IdColumn::Int32(a) => a.value(row) as u64,
            IdColumn::UInt64(a) => a.value(row),
            IdColumn::UInt32(a) => a.value(row) as u64,
        }
    }
}

fn id_column(column: &ArrayRef) -> RiffleResult<IdColumn<'_>> {
    match column.data_type() {
        DataType::Int64 => Ok(IdColumn::Int64(downcast(column)?)),
        DataType::Int32 => Ok(IdColumn::Int32(downcast(column)?)),
        DataType::UInt64 => Ok(IdColumn::UInt64(downcast(column)?)),
        DataType::UInt32 => Ok(IdColumn::UInt32(downcast(column)?)),
        other => Err(RiffleError::UnsupportedType(format!(
            "edge endpoint column has type {other}"
        ))),
    }
}

fn scan_batch(
    batch: &RecordBatch,
    partitioner: &dyn VertexPartitioner,
    src_col: usize,
    dst_col: usize,
    lists: &mut BatchOffsets,
) -> RiffleResult<()> {
    let src = id_column(batch.column(src_col))?;
    let dst = id_column(batch.column(dst_col))?;
    for row in 0..batch.num_rows() {
        let src_partition = partitioner.partition_of(src.value(row));
        push_route(lists, src_partition, row as i64)?;
        let dst_partition = partitioner.partition_of(dst.value(row));
        if dst_partition != src_partition {
            push_route(lists, dst_partition, row as i64)?;
        }
    }
    Ok(())
}
