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

//! Utility functions

use std::thread::ScopedJoinHandle;

use crate::error::{RiffleError, RiffleResult};

pub mod logging;

/// Join a scoped helper thread, mapping a panic to an error.
pub(crate) fn join_scoped<T>(handle: ScopedJoinHandle<'_, T>) -> RiffleResult<T> {
    handle
        .join()
        .map_err(|_| RiffleError::Invalid("worker thread panicked".to_string()))
}
