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

//! Logging utilities

/// Initialize logging from the `RUST_LOG` environment. Only the first call
/// installs the logger; later calls are no-ops, so worker threads and tests
/// may call this freely.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
