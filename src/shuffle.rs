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

//! Pipelined all-to-all shuffle engine
//!
//! Four cooperating roles per worker, joined by two bounded hand-off
//! queues: serializer threads claim input batches and encode one archive
//! per remote partition; one sender drains the outbound queue; one
//! receiver probes for inbound archives until the expected count (computed
//! collectively) has arrived; deserializer threads drain the inbound queue
//! and decode. Rows destined for the local partition never touch the
//! network: they are row-selected in memory after the pipeline drains.
//!
//! No ordering is guaranteed across source workers or source batches; row
//! order within one archive follows its offset list.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::codec::{check_supported, decode_rows, encode_rows, select_rows, Archive, ArchiveReader};
use crate::error::{RiffleError, RiffleResult};
use crate::group::WorkerGroup;
use crate::net::{BlockingQueue, Communicator, TAG_SHUFFLE};
use crate::util::join_scoped;

/// Offset lists for one input batch: entry `p` holds the local row indices
/// destined for partition `p`.
pub type BatchOffsets = Vec<Vec<i64>>;

/// Tunables for the shuffle pipeline.
#[derive(Debug, Clone)]
pub struct ShuffleOptions {
    /// Capacity of each hand-off queue; bounds in-flight archive memory.
    pub queue_capacity: usize,
    /// Serializer thread count (default: derived from the thread budget)
    pub serializer_threads: Option<usize>,
    /// Deserializer thread count (default: derived from the thread budget)
    pub deserializer_threads: Option<usize>,
}

impl Default for ShuffleOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            serializer_threads: None,
            deserializer_threads: None,
        }
    }
}

/// Threads available to one worker: hardware concurrency divided by the
/// number of workers sharing the node, rounded up.
pub(crate) fn worker_thread_budget(local_peer_count: usize) -> usize {
    let hardware = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    let local = local_peer_count.max(1);
    (hardware + local - 1) / local
}

/// Shuffle record batches across the worker group according to offset
/// lists, with default options.
///
/// Every worker must hold the same `schema` (see
/// [`verify_schema_consistent`](crate::schema::verify_schema_consistent));
/// the local validations here rely on that to fail on all workers or on
/// none.
///
/// Returns the batches received from peers plus, at the end, one locally
/// retained batch per input batch (the rows routed to the caller's own
/// partition). The result is a deterministic-length but unordered set.
pub fn shuffle_by_offset_lists(
    schema: &SchemaRef,
    batches: &[RecordBatch],
    offset_lists: &[BatchOffsets],
    group: &WorkerGroup,
) -> RiffleResult<Vec<RecordBatch>> {
    shuffle_by_offset_lists_with_options(
        schema,
        batches,
        offset_lists,
        group,
        &ShuffleOptions::default(),
    )
}

/// [`shuffle_by_offset_lists`] with explicit pipeline tunables.
pub fn shuffle_by_offset_lists_with_options(
    schema: &SchemaRef,
    batches: &[RecordBatch],
    offset_lists: &[BatchOffsets],
    group: &WorkerGroup,
    options: &ShuffleOptions,
) -> RiffleResult<Vec<RecordBatch>> {
    check_supported(schema.as_ref())?;
    if offset_lists.len() != batches.len() {
        return Err(RiffleError::Invalid(format!(
            "{} offset lists for {} batches",
            offset_lists.len(),
            batches.len()
        )));
    }
    let partition_count = group.partition_count() as usize;
    for lists in offset_lists {
        if lists.len() != partition_count {
            return Err(RiffleError::Invalid(format!(
                "offset list covers {} partitions, group has {partition_count}",
                lists.len()
            )));
        }
    }

    let comm = group.communicator();
    let worker_id = comm.worker_id();

    // Each worker sends M * (N - 1) archives; the receive count follows
    // from the group-wide batch total.
    let to_send = batches.len() as i64;
    let total = comm.allreduce_sum(to_send)?;
    let to_recv = total - to_send;

    let budget = worker_thread_budget(comm.local_peer_count());
    let deserializers = options
        .deserializer_threads
        .unwrap_or_else(|| (budget.saturating_sub(2) / 2).max(1));
    let serializers = options
        .serializer_threads
        .unwrap_or_else(|| budget.saturating_sub(2 + deserializers).max(1));

    debug!(
        "worker {worker_id}: shuffling {to_send} batches with {serializers}+{deserializers} codec threads, expecting {to_recv} archives"
    );

    let outbound: BlockingQueue<(u32, Vec<u8>)> =
        BlockingQueue::new(options.queue_capacity, serializers);
    let inbound: BlockingQueue<Vec<u8>> = BlockingQueue::new(options.queue_capacity, 1);
    let next_batch = AtomicUsize::new(0);

    let mut received = thread::scope(|s| -> RiffleResult<Vec<RecordBatch>> {
        let sender = s.spawn(|| sender_loop(&outbound, group));
        let receiver = s.spawn(|| receiver_loop(&inbound, comm, to_recv));

        let mut encode_handles = Vec::with_capacity(serializers);
        for _ in 0..serializers {
            encode_handles
                .push(s.spawn(|| serializer_loop(&outbound, &next_batch, batches, offset_lists, group)));
        }
        let mut decode_handles = Vec::with_capacity(deserializers);
        for _ in 0..deserializers {
            decode_handles.push(s.spawn(|| deserializer_loop(&inbound, schema)));
        }

        // Join everything before surfacing a failure, so no thread is left
        // blocked on a queue.
        let mut received = Vec::new();
        let mut failure: Option<RiffleError> = None;
        let mut note = |result: RiffleResult<()>| {
            if let Err(e) = result {
                failure.get_or_insert(e);
            }
        };
        for handle in decode_handles {
            match join_scoped(handle).and_then(|r| r) {
                Ok(batches) => received.extend(batches),
                Err(e) => note(Err(e)),
            }
        }
        for handle in encode_handles {
            note(join_scoped(handle).and_then(|r| r));
        }
        note(join_scoped(sender).and_then(|r| r));
        note(join_scoped(receiver).and_then(|r| r));

        match failure {
            Some(e) => Err(e),
            None => Ok(received),
        }
    })?;

    // Loopback: the caller's own rows skip the encode/decode round-trip.
    let local_partition = group.local_partition() as usize;
    for (batch, lists) in batches.iter().zip(offset_lists) {
        received.push(select_rows(batch, &lists[local_partition])?);
    }

    comm.barrier()?;
    Ok(received)
}

fn serializer_loop(
    outbound: &BlockingQueue<(u32, Vec<u8>)>,
    next_batch: &AtomicUsize,
    batches: &[RecordBatch],
    offset_lists: &[BatchOffsets],
    group: &WorkerGroup,
) -> RiffleResult<()> {
    let worker_id = group.worker_id();
    let worker_count = group.worker_count();
    let result: RiffleResult<()> = (|| {
        loop {
            let claimed = next_batch.fetch_add(1, Ordering::Relaxed);
            if claimed >= batches.len() {
                break;
            }
            let batch = &batches[claimed];
            let lists = &offset_lists[claimed];
            for step in 1..worker_count {
                let dst_worker = (worker_id + step) % worker_count;
                let dst_partition = group.worker_to_partition(dst_worker);
                let offsets = &lists[dst_partition as usize];
                let mut archive = Archive::with_capacity(8 + offsets.len() * 8);
                encode_rows(&mut archive, batch, offsets)?;
                outbound.put((dst_partition, archive.into_bytes()));
            }
        }
        Ok(())
    })();
    outbound.dec_producers();
    result
}

fn sender_loop(outbound: &BlockingQueue<(u32, Vec<u8>)>, group: &WorkerGroup) -> RiffleResult<()> {
    let comm = group.communicator();
    let mut failure: Option<RiffleError> = None;
    // Keep draining after a failure so producers never block on a full
    // queue.
    while let Some((partition, payload)) = outbound.get() {
        if failure.is_some() {
            continue;
        }
        let dst_worker = group.partition_to_worker(partition);
        if let Err(e) = comm.send(&payload, dst_worker, TAG_SHUFFLE) {
            failure = Some(e);
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn receiver_loop(
    inbound: &BlockingQueue<Vec<u8>>,
    comm: &Arc<dyn Communicator>,
    expected: i64,
) -> RiffleResult<()> {
    let result: RiffleResult<()> = (|| {
        for _ in 0..expected {
            let (source, _size) = comm.probe()?;
            let payload = comm.recv(source, TAG_SHUFFLE)?;
            inbound.put(payload);
        }
        Ok(())
    })();
    inbound.dec_producers();
    result
}

fn deserializer_loop(
    inbound: &BlockingQueue<Vec<u8>>,
    schema: &SchemaRef,
) -> RiffleResult<Vec<RecordBatch>> {
    let mut decoded = Vec::new();
    let mut failure: Option<RiffleError> = None;
    while let Some(payload) = inbound.get() {
        if failure.is_some() {
            continue;
        }
        let mut reader = ArchiveReader::new(payload);
        match decode_rows(&mut reader, schema) {
            Ok(batch) => decoded.push(batch),
            Err(e) => failure = Some(e),
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(decoded),
    }
}
