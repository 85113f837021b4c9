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

//! Error handling for riffle operations

/// Main error type for riffle operations
#[derive(thiserror::Error, Debug)]
pub enum RiffleError {
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Serializing the schema failed on this worker or on a peer. Collective:
    /// every worker in the group returns this kind for the same call.
    #[error("Schema serialization failed: {0}")]
    SchemaSerialization(String),

    /// The schemas held by the workers are not structurally equal.
    #[error("Inconsistent schema: {0}")]
    SchemaInconsistent(String),

    /// A column type outside the supported wire type set.
    #[error("Unsupported data type: {0}")]
    UnsupportedType(String),

    /// A point-to-point or collective primitive failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An archive ran out of bytes mid-column, or a count did not match.
    #[error("Decode truncated: {0}")]
    DecodeTruncated(String),

    #[error("Invalid operation: {0}")]
    Invalid(String),
}

/// Type alias for Results using RiffleError
pub type RiffleResult<T> = Result<T, RiffleError>;
