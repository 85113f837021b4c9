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

//! Riffle: distributed all-to-all shuffle for Arrow record batches
//!
//! Given a columnar table partitioned locally into record batches on every
//! worker of a fixed group, and a per-row routing function mapping each row
//! to one or more destination partitions, riffle redistributes the rows so
//! that every destination worker holds exactly the rows routed to it,
//! reassembled as a new local table with the same schema.
//!
//! Serialization, network transfer, and deserialization are pipelined
//! across worker threads with bounded hand-off queues; rows destined for
//! the caller's own partition take an in-memory loopback path.

pub mod codec;
pub mod error;
pub mod group;
pub mod net;
pub mod ops;
pub mod partition;
pub mod schema;
pub mod shuffle;
pub mod table;
pub mod util;

// Re-export commonly used types
pub use crate::codec::select_rows;
pub use crate::error::{RiffleError, RiffleResult};
pub use crate::group::{IdentityMapping, PartitionMapping, WorkerGroup};
pub use crate::net::{Communicator, LocalCommunicator};
pub use crate::ops::{shuffle_edge_table, shuffle_vertex_table};
pub use crate::partition::{
    HashPartitioner, KeyRef, ModuloPartitioner, Partitioner, VertexPartitioner,
};
pub use crate::schema::verify_schema_consistent;
pub use crate::shuffle::{shuffle_by_offset_lists, BatchOffsets, ShuffleOptions};
pub use crate::table::Table;

/// The main entry point and version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
