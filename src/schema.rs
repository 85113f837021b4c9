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

//! Collective schema consistency check
//!
//! Every worker IPC-serializes its schema and exchanges it with every peer
//! in ring order; each received schema is compared structurally against the
//! local one. Failure semantics are collective: local validation failures
//! (an unsupported column type, a serialization error) are announced
//! through a summed failure flag before any worker proceeds, so either
//! every worker enters the ring exchange or none does, even when the
//! schemas genuinely differ. A comparison mismatch makes every worker
//! return `SchemaInconsistent` (by symmetry of the exchange).

use std::io::Cursor;
use std::thread;

use arrow::datatypes::{Schema, SchemaRef};
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use log::debug;

use crate::codec::check_supported;
use crate::error::{RiffleError, RiffleResult};
use crate::group::WorkerGroup;
use crate::net::TAG_SCHEMA;
use crate::util::join_scoped;

/// Serialize a schema to bytes as an empty Arrow IPC stream.
pub fn serialize_schema(schema: &Schema) -> RiffleResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buffer, schema)
            .map_err(|e| RiffleError::SchemaSerialization(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| RiffleError::SchemaSerialization(e.to_string()))?;
    }
    Ok(buffer)
}

/// Read a schema back from the bytes produced by [`serialize_schema`].
pub fn deserialize_schema(bytes: &[u8]) -> RiffleResult<SchemaRef> {
    let reader = StreamReader::try_new(Cursor::new(bytes), None)
        .map_err(|e| RiffleError::SchemaSerialization(e.to_string()))?;
    Ok(reader.schema())
}

/// Verify that every worker of the group holds a structurally equal schema.
///
/// Sending runs on a helper thread while the calling thread receives, so
/// the ring exchange pipelines without deadlock. A barrier terminates the
/// check on every worker.
pub fn verify_schema_consistent(schema: &Schema, group: &WorkerGroup) -> RiffleResult<()> {
    let comm = group.communicator();

    // Each local validation is summed as a failure flag before anyone
    // proceeds: a worker must not bail out on a purely local decision
    // while its peers block in the exchange.
    let supported = check_supported(schema);
    let unsupported = comm.allreduce_sum(i64::from(supported.is_err()))?;
    if unsupported != 0 {
        return match supported {
            Err(e) => Err(e),
            Ok(()) => Err(RiffleError::SchemaInconsistent(format!(
                "unsupported column type on {unsupported} worker(s)"
            ))),
        };
    }

    let serialized = serialize_schema(schema);
    let failures = comm.allreduce_sum(i64::from(serialized.is_err()))?;
    if failures != 0 {
        return Err(RiffleError::SchemaSerialization(format!(
            "schema serialization failed on {failures} worker(s)"
        )));
    }
    let payload = serialized?;

    let worker_id = comm.worker_id();
    let worker_count = comm.worker_count();

    let consistent = thread::scope(|s| -> RiffleResult<bool> {
        let sender = s.spawn(|| -> RiffleResult<()> {
            for step in 1..worker_count {
                let dst = (worker_id + step) % worker_count;
                comm.send(&payload, dst, TAG_SCHEMA)?;
            }
            Ok(())
        });

        let mut consistent = true;
        for step in 1..worker_count {
            let src = (worker_id + worker_count - step) % worker_count;
            let bytes = comm.recv(src, TAG_SCHEMA)?;
            let remote = deserialize_schema(&bytes)?;
            consistent &= remote.as_ref() == schema;
        }

        join_scoped(sender)??;
        Ok(consistent)
    })?;

    comm.barrier()?;

    if !consistent {
        debug!("worker {worker_id}: schema mismatch detected");
        return Err(RiffleError::SchemaInconsistent(
            "schemas are not consistent across workers".to_string(),
        ));
    }
    Ok(())
}
