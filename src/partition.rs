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

//! Partitioner policies for the shuffle drivers
//!
//! A partitioner must be deterministic and identical on every worker:
//! routing decisions are made independently on each worker and have to
//! agree.

use std::hash::BuildHasher;

use ahash::RandomState;

/// A borrowed view of a vertex-table key (column 0 of a row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRef<'a> {
    Int64(i64),
    Int32(i32),
    UInt64(u64),
    UInt32(u32),
    Utf8(&'a str),
}

/// Maps a vertex-table key to its owning partition.
pub trait Partitioner: Send + Sync {
    fn partition(&self, key: KeyRef<'_>) -> u32;
}

/// Maps a vertex identifier to its owning partition.
pub trait VertexPartitioner: Send + Sync {
    fn partition_of(&self, vertex_id: u64) -> u32;
}

/// Places integer keys by `key mod partitions`; string keys fall back to
/// hash placement.
#[derive(Debug, Clone, Copy)]
pub struct ModuloPartitioner {
    partitions: u32,
}

impl ModuloPartitioner {
    pub fn new(partitions: u32) -> Self {
        assert!(partitions > 0, "partition count must be positive");
        Self { partitions }
    }
}

impl Partitioner for ModuloPartitioner {
    fn partition(&self, key: KeyRef<'_>) -> u32 {
        match key {
            KeyRef::Int64(v) => v.rem_euclid(self.partitions as i64) as u32,
            KeyRef::Int32(v) => v.rem_euclid(self.partitions as i32) as u32,
            KeyRef::UInt64(v) => (v % self.partitions as u64) as u32,
            KeyRef::UInt32(v) => v % self.partitions,
            KeyRef::Utf8(_) => HashPartitioner::new(self.partitions).partition(key),
        }
    }
}

impl VertexPartitioner for ModuloPartitioner {
    fn partition_of(&self, vertex_id: u64) -> u32 {
        (vertex_id % self.partitions as u64) as u32
    }
}

/// Places keys by hash. The hasher is seeded with fixed keys so placement
/// is identical on every worker.
#[derive(Debug, Clone)]
pub struct HashPartitioner {
    partitions: u32,
    state: RandomState,
}

impl HashPartitioner {
    pub fn new(partitions: u32) -> Self {
        assert!(partitions > 0, "partition count must be positive");
        Self {
            partitions,
            state: RandomState::with_seeds(
                0x243f_6a88_85a3_08d3,
                0x1319_8a2e_0370_7344,
                0xa409_3822_299f_31d0,
                0x082e_fa98_ec4e_6c89,
            ),
        }
    }
}

impl Partitioner for HashPartitioner {
    fn partition(&self, key: KeyRef<'_>) -> u32 {
        (self.state.hash_one(key) % self.partitions as u64) as u32
    }
}

impl VertexPartitioner for HashPartitioner {
    fn partition_of(&self, vertex_id: u64) -> u32 {
        (self.state.hash_one(vertex_id) % self.partitions as u64) as u32
    }
}
