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

//! Worker group descriptor
//!
//! Couples the communicator with the worker/partition bijection. The engine
//! is agnostic to whether worker ids coincide with partition ids; every
//! route goes through the mapping, identity is just the default.

use std::sync::Arc;

use crate::net::Communicator;

/// Bijection between worker ids and partition ids.
pub trait PartitionMapping: Send + Sync {
    fn worker_to_partition(&self, worker_id: i32) -> u32;
    fn partition_to_worker(&self, partition: u32) -> i32;
}

/// The typical case: worker `w` owns partition `w`.
pub struct IdentityMapping;

impl PartitionMapping for IdentityMapping {
    fn worker_to_partition(&self, worker_id: i32) -> u32 {
        worker_id as u32
    }

    fn partition_to_worker(&self, partition: u32) -> i32 {
        partition as i32
    }
}

/// A fixed group of workers participating in a shuffle.
pub struct WorkerGroup {
    communicator: Arc<dyn Communicator>,
    mapping: Arc<dyn PartitionMapping>,
}

impl WorkerGroup {
    /// Create a group with the identity worker/partition mapping.
    pub fn new(communicator: Arc<dyn Communicator>) -> Self {
        Self::with_mapping(communicator, Arc::new(IdentityMapping))
    }

    /// Create a group routing through a custom worker/partition bijection.
    pub fn with_mapping(
        communicator: Arc<dyn Communicator>,
        mapping: Arc<dyn PartitionMapping>,
    ) -> Self {
        Self {
            communicator,
            mapping,
        }
    }

    pub fn communicator(&self) -> &Arc<dyn Communicator> {
        &self.communicator
    }

    pub fn worker_id(&self) -> i32 {
        self.communicator.worker_id()
    }

    pub fn worker_count(&self) -> i32 {
        self.communicator.worker_count()
    }

    pub fn local_peer_count(&self) -> usize {
        self.communicator.local_peer_count()
    }

    /// Partition count; the worker/partition map is a bijection, so this
    /// equals the worker count.
    pub fn partition_count(&self) -> u32 {
        self.worker_count() as u32
    }

    /// The partition owned by this worker.
    pub fn local_partition(&self) -> u32 {
        self.worker_to_partition(self.worker_id())
    }

    pub fn worker_to_partition(&self, worker_id: i32) -> u32 {
        self.mapping.worker_to_partition(worker_id)
    }

    pub fn partition_to_worker(&self, partition: u32) -> i32 {
        self.mapping.partition_to_worker(partition)
    }
}
