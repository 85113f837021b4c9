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

//! Tests for the row-level codec
//!
//! The key property: decoding an encoded offset selection equals selecting
//! those rows directly, for every supported logical type.

use std::sync::Arc;

use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, Int64Builder, LargeListBuilder,
    LargeStringArray, NullArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use riffle::codec::{check_supported, decode_rows, encode_rows, select_rows, Archive, ArchiveReader, WireType};
use riffle::RiffleError;

/// Encode the selected rows, decode them back, and compare against the
/// in-memory selection.
fn assert_round_trip(batch: &RecordBatch, offsets: &[i64]) {
    let mut archive = Archive::new();
    encode_rows(&mut archive, batch, offsets).unwrap();
    let mut reader = ArchiveReader::new(archive.into_bytes());
    let decoded = decode_rows(&mut reader, &batch.schema()).unwrap();
    assert_eq!(reader.remaining(), 0, "decode must consume the archive");

    let selected = select_rows(batch, offsets).unwrap();
    assert_eq!(decoded, selected);
    assert_eq!(decoded.num_rows(), offsets.len());
}

fn numeric_batch(rows: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("f64", DataType::Float64, false),
        Field::new("f32", DataType::Float32, false),
        Field::new("i64", DataType::Int64, false),
        Field::new("i32", DataType::Int32, false),
        Field::new("u64", DataType::UInt64, false),
        Field::new("u32", DataType::UInt32, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from_iter_values(
                (0..rows).map(|i| i as f64 * 0.5),
            )),
            Arc::new(Float32Array::from_iter_values(
                (0..rows).map(|i| i as f32 - 10.0),
            )),
            Arc::new(Int64Array::from_iter_values((0..rows).map(|i| i as i64 * 3))),
            Arc::new(Int32Array::from_iter_values((0..rows).map(|i| i as i32 - 7))),
            Arc::new(UInt64Array::from_iter_values((0..rows).map(|i| (i as u64) << 3))),
            Arc::new(UInt32Array::from_iter_values((0..rows).map(|i| i as u32 + 1))),
        ],
    )
    .unwrap()
}

#[test]
fn numeric_round_trip_random_offsets() {
    let batch = numeric_batch(100);
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10 {
        let count = rng.gen_range(0..150);
        let offsets: Vec<i64> = (0..count).map(|_| rng.gen_range(0..100)).collect();
        assert_round_trip(&batch, &offsets);
    }
}

#[test]
fn empty_selection_round_trip() {
    let batch = numeric_batch(10);
    assert_round_trip(&batch, &[]);
}

#[test]
fn string_round_trip_mixed_lengths() {
    let long = "x".repeat(4096);
    let values = vec!["", "a", long.as_str(), "", "middle", long.as_str()];
    let schema = Arc::new(Schema::new(vec![Field::new(
        "s",
        DataType::LargeUtf8,
        false,
    )]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(LargeStringArray::from(values))],
    )
    .unwrap();

    assert_round_trip(&batch, &[0, 1, 2, 3, 4, 5]);
    assert_round_trip(&batch, &[5, 5, 0, 2]);
}

#[test]
fn null_column_round_trip() {
    let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Null, true)]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(NullArray::new(9))]).unwrap();
    assert_round_trip(&batch, &[0, 8, 4, 4]);
}

#[test]
fn large_list_round_trip_variable_lengths() {
    let mut builder = LargeListBuilder::new(Int64Builder::new());
    let mut rng = StdRng::seed_from_u64(7);
    for row in 0..40i64 {
        let len = rng.gen_range(0..=16);
        for j in 0..len {
            builder.values().append_value(row * 100 + j);
        }
        builder.append(true);
    }
    let array = builder.finish();
    let schema = Arc::new(Schema::new(vec![Field::new(
        "v",
        array.data_type().clone(),
        true,
    )]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(array)]).unwrap();

    let offsets: Vec<i64> = (0..40).rev().collect();
    assert_round_trip(&batch, &offsets);
    assert_round_trip(&batch, &[0, 0, 39, 17]);
}

#[test]
fn mixed_schema_round_trip() {
    let mut list_builder = LargeListBuilder::new(Int64Builder::new());
    for row in 0..20i64 {
        for j in 0..(row % 5) {
            list_builder.values().append_value(row * 10 + j);
        }
        list_builder.append(true);
    }
    let lists = list_builder.finish();

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::LargeUtf8, false),
        Field::new("vals", lists.data_type().clone(), true),
        Field::new("pad", DataType::Null, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from_iter_values(0..20)),
            Arc::new(LargeStringArray::from_iter_values(
                (0..20).map(|i| format!("row-{i}")),
            )),
            Arc::new(lists),
            Arc::new(NullArray::new(20)),
        ],
    )
    .unwrap();

    assert_round_trip(&batch, &[19, 0, 7, 7, 3]);
}

#[test]
fn unsupported_types_are_rejected() {
    assert!(matches!(
        WireType::of(&DataType::Boolean),
        Err(RiffleError::UnsupportedType(_))
    ));
    assert!(matches!(
        WireType::of(&DataType::Utf8),
        Err(RiffleError::UnsupportedType(_))
    ));
    // large_list of a non-numeric element is rejected too
    let nested = DataType::LargeList(Arc::new(Field::new("item", DataType::LargeUtf8, true)));
    assert!(matches!(
        WireType::of(&nested),
        Err(RiffleError::UnsupportedType(_))
    ));

    let schema = Schema::new(vec![
        Field::new("ok", DataType::Int64, false),
        Field::new("bad", DataType::Boolean, false),
    ]);
    let err = check_supported(&schema).unwrap_err();
    assert!(matches!(err, RiffleError::UnsupportedType(_)));
}

#[test]
fn truncated_archive_fails_to_decode() {
    let batch = numeric_batch(16);
    let mut archive = Archive::new();
    encode_rows(&mut archive, &batch, &[0, 1, 2, 3]).unwrap();
    let mut bytes = archive.into_bytes();
    bytes.truncate(bytes.len() - 1);

    let mut reader = ArchiveReader::new(bytes);
    let err = decode_rows(&mut reader, &batch.schema()).unwrap_err();
    assert!(matches!(err, RiffleError::DecodeTruncated(_)));
}
