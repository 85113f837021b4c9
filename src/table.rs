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

//! Table - a schema plus a list of record batches
//!
//! The facade the shuffle drivers consume and produce. A table keeps its
//! schema even with zero batches, so an empty shuffle result still reports
//! the input schema.

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::error::{RiffleError, RiffleResult};

/// A locally partitioned columnar table.
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// Create a table from record batches; every batch must conform to
    /// `schema`.
    pub fn from_batches(schema: SchemaRef, batches: Vec<RecordBatch>) -> RiffleResult<Self> {
        for batch in &batches {
            if batch.schema().as_ref() != schema.as_ref() {
                return Err(RiffleError::Invalid(
                    "batch schema does not match table schema".to_string(),
                ));
            }
        }
        Ok(Self { schema, batches })
    }

    /// Create a single-batch table.
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch],
        }
    }

    /// Create an empty table that preserves `schema`.
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn rows(&self) -> i64 {
        self.batches.iter().map(|b| b.num_rows() as i64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// Coalesce all batches into a single batch column-wise.
    pub fn combine_chunks(self) -> RiffleResult<Table> {
        if self.batches.len() <= 1 {
            return Ok(self);
        }
        let combined = concat_batches(&self.schema, self.batches.iter())?;
        Ok(Table {
            schema: self.schema,
            batches: vec![combined],
        })
    }
}
