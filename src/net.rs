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

//! Networking and communication components
//!
//! The engine talks to its peers exclusively through the [`Communicator`]
//! trait. [`LocalCommunicator`] is the in-process backend used by the
//! multi-peer test harness; production transports implement the same trait.

pub mod communicator;
pub mod local;
pub mod queue;

// Re-exports for convenience
pub use communicator::Communicator;
pub use local::LocalCommunicator;
pub use queue::BlockingQueue;

/// Tag carried by schema-consistency messages.
pub const TAG_SCHEMA: i32 = 0;

/// Tag carried by shuffle archives.
pub const TAG_SHUFFLE: i32 = 1;
