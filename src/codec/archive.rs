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

//! Archive byte buffers
//!
//! An [`Archive`] is the append-only write side; an [`ArchiveReader`] is the
//! consuming cursor over the received bytes. Primitive values travel in
//! native byte order: all workers must share one ABI, the codec never
//! byte-swaps.

use crate::error::{RiffleError, RiffleResult};

/// A value with a fixed native-endian wire encoding.
pub trait WireValue: Copy {
    const WIDTH: usize;
    fn put(self, out: &mut Vec<u8>);
    fn get(bytes: &[u8]) -> Self;
}

macro_rules! impl_wire_value {
    ($($t:ty),*) => {$(
        impl WireValue for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn put(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_ne_bytes());
            }

            fn get(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                Self::from_ne_bytes(raw)
            }
        }
    )*};
}

impl_wire_value!(i32, i64, u32, u64, f32, f64);

/// Append-only byte buffer produced by serialization; the unit of network
/// transport. Single-use: once handed to the transport it is consumed as an
/// [`ArchiveReader`] on the receiving side.
#[derive(Debug, Default)]
pub struct Archive {
    bytes: Vec<u8>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn put<T: WireValue>(&mut self, value: T) {
        value.put(&mut self.bytes);
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Consuming cursor over a received archive. Strict: any read past the end
/// fails with `DecodeTruncated`.
#[derive(Debug)]
pub struct ArchiveReader {
    bytes: Vec<u8>,
    pos: usize,
}

impl ArchiveReader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn take<T: WireValue>(&mut self) -> RiffleResult<T> {
        Ok(T::get(self.take_bytes(T::WIDTH)?))
    }

    pub fn take_bytes(&mut self, len: usize) -> RiffleResult<&[u8]> {
        if self.remaining() < len {
            return Err(RiffleError::DecodeTruncated(format!(
                "need {len} bytes, {} remaining",
                self.remaining()
            )));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.bytes[start..self.pos])
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}
