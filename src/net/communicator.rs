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

//! Communicator trait - the collective runtime the shuffle engine assumes
//!
//! Point-to-point transfers must preserve FIFO order between a given
//! source/destination pair. All collective calls must be entered by every
//! worker of the group in the same order.

use crate::error::RiffleResult;

/// Main interface for distributed operations.
///
/// A worker group is a fixed set of `worker_count` workers with contiguous
/// ids in `[0, worker_count)`. The set does not change for the lifetime of
/// the communicator.
pub trait Communicator: Send + Sync {
    /// This worker's id within the group.
    fn worker_id(&self) -> i32;

    /// Number of workers in the group.
    fn worker_count(&self) -> i32;

    /// Number of group workers sharing this node, used for thread budgeting.
    fn local_peer_count(&self) -> usize {
        1
    }

    /// Send a byte buffer to a specific worker.
    fn send(&self, data: &[u8], dest: i32, tag: i32) -> RiffleResult<()>;

    /// Receive the next matching byte buffer from a specific worker.
    fn recv(&self, source: i32, tag: i32) -> RiffleResult<Vec<u8>>;

    /// Block until any message is available; returns `(source, size)`
    /// without consuming the message.
    fn probe(&self) -> RiffleResult<(i32, usize)>;

    /// Sum `value` across all workers; every worker gets the total.
    fn allreduce_sum(&self, value: i64) -> RiffleResult<i64>;

    /// Block until every worker of the group has entered the barrier.
    fn barrier(&self) -> RiffleResult<()>;
}
