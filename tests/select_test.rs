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

//! Tests for the row selector (the loopback path)

use std::sync::Arc;

use arrow::array::{Int64Array, LargeStringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use riffle::select_rows;
use riffle::RiffleError;

fn sample_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::LargeUtf8, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![10, 11, 12, 13, 14])),
            Arc::new(LargeStringArray::from(vec!["a", "b", "c", "d", "e"])),
        ],
    )
    .unwrap()
}

#[test]
fn select_preserves_order_and_duplicates() {
    let batch = sample_batch();
    let selected = select_rows(&batch, &[3, 1, 1, 0]).unwrap();

    assert_eq!(selected.num_rows(), 4);
    let ids = selected
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    let names = selected
        .column(1)
        .as_any()
        .downcast_ref::<LargeStringArray>()
        .unwrap();
    assert_eq!(
        (0..4).map(|i| ids.value(i)).collect::<Vec<_>>(),
        vec![13, 11, 11, 10]
    );
    assert_eq!(
        (0..4).map(|i| names.value(i)).collect::<Vec<_>>(),
        vec!["d", "b", "b", "a"]
    );
}

#[test]
fn select_empty_offsets_keeps_schema() {
    let batch = sample_batch();
    let selected = select_rows(&batch, &[]).unwrap();
    assert_eq!(selected.num_rows(), 0);
    assert_eq!(selected.schema(), batch.schema());
}

#[test]
fn select_rejects_unsupported_columns() {
    let schema = Arc::new(Schema::new(vec![Field::new("b", DataType::Boolean, false)]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(arrow::array::BooleanArray::from(vec![true, false]))],
    )
    .unwrap();
    let err = select_rows(&batch, &[0]).unwrap_err();
    assert!(matches!(err, RiffleError::UnsupportedType(_)));
}
