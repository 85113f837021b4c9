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

//! Partitioned shuffle drivers
//!
//! The two table-level entry points: vertex-style (one destination per row,
//! from a key partitioner over column 0) and edge-style (a row goes to the
//! partitions of both of its endpoint vertices). Both verify schema
//! consistency, fan the routing scan across threads, run the shuffle
//! engine, then coalesce the received batches into the output table.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::error::{RiffleError, RiffleResult};
use crate::shuffle::{worker_thread_budget, BatchOffsets};
use crate::table::Table;
use crate::util::join_scoped;

pub mod edge;
pub mod vertex;

pub use edge::shuffle_edge_table;
pub use vertex::shuffle_vertex_table;

/// Route one row of a batch to a partition's offset list.
pub(crate) fn push_route(lists: &mut BatchOffsets, partition: u32, row: i64) -> RiffleResult<()> {
    match lists.get_mut(partition as usize) {
        Some(list) => {
            list.push(row);
            Ok(())
        }
        None => Err(RiffleError::Invalid(format!(
            "row routed to partition {partition}, group has {}",
            lists.len()
        ))),
    }
}

/// Fan the routing scan across threads; each thread claims batch indices
/// from a shared counter and fills that batch's offset lists.
pub(crate) fn scan_offset_lists<F>(
    batches: &[RecordBatch],
    partition_count: usize,
    local_peer_count: usize,
    scan: F,
) -> RiffleResult<Vec<BatchOffsets>>
where
    F: Fn(&RecordBatch, &mut BatchOffsets) -> RiffleResult<()> + Sync,
{
    let threads = worker_thread_budget(local_peer_count)
        .min(batches.len())
        .max(1);
    let next_batch = AtomicUsize::new(0);

    let partial = thread::scope(|s| {
        let mut handles = Vec::with_capacity(threads);
        for _ in 0..threads {
            handles.push(s.spawn(|| -> RiffleResult<Vec<(usize, BatchOffsets)>> {
                let mut claimed = Vec::new();
                loop {
                    let got = next_batch.fetch_add(1, Ordering::Relaxed);
                    if got >= batches.len() {
                        break;
                    }
                    let mut lists = vec![Vec::new(); partition_count];
                    scan(&batches[got], &mut lists)?;
                    claimed.push((got, lists));
                }
                Ok(claimed)
            }));
        }
        handles
            .into_iter()
            .map(|h| join_scoped(h).and_then(|r| r))
            .collect::<RiffleResult<Vec<_>>>()
    })?;

    let mut offset_lists = vec![Vec::new(); batches.len()];
    for chunk in partial {
        for (index, lists) in chunk {
            offset_lists[index] = lists;
        }
    }
    Ok(offset_lists)
}

/// Drop zero-row batches and coalesce the rest into the output table,
/// keeping the schema even when nothing remains.
pub(crate) fn finalize_table(
    schema: &SchemaRef,
    mut batches: Vec<RecordBatch>,
) -> RiffleResult<Table> {
    batches.retain(|b| b.num_rows() > 0);
    if batches.is_empty() {
        return Ok(Table::empty(schema.clone()));
    }
    Table::from_batches(schema.clone(), batches)?.combine_chunks()
}
