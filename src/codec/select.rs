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

//! Row selector
//!
//! Builds a new record batch holding exactly the rows named by an offset
//! list, preserving offset-list order. This is the loopback path: rows
//! destined for the caller's own partition are copied in memory instead of
//! going through an encode/decode round-trip.

use arrow::array::{ArrayRef, UInt64Array};
use arrow::compute::take;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::codec::check_supported;
use crate::error::RiffleResult;

/// Select the rows of `batch` named by `offsets`, in order. Offsets must
/// lie in `[0, batch.num_rows())`; an index may appear more than once.
pub fn select_rows(batch: &RecordBatch, offsets: &[i64]) -> RiffleResult<RecordBatch> {
    check_supported(batch.schema().as_ref())?;
    let indices = UInt64Array::from_iter_values(offsets.iter().map(|&row| row as u64));
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());
    for column in batch.columns() {
        columns.push(take(column.as_ref(), &indices, None)?);
    }
    let options = RecordBatchOptions::new().with_row_count(Some(offsets.len()));
    RecordBatch::try_new_with_options(batch.schema(), columns, &options).map_err(Into::into)
}
