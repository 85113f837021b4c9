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

//! Bounded hand-off queue with producer counting
//!
//! Producers call [`BlockingQueue::dec_producers`] when they exit;
//! consumers loop on [`BlockingQueue::get`], which returns `None` once the
//! queue is drained and no producers remain. The bound gives the pipeline
//! backpressure: `put` blocks while the queue is full, capping in-flight
//! memory.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct QueueState<T> {
    items: VecDeque<T>,
    producers: usize,
}

/// Multi-producer/multi-consumer blocking queue.
pub struct BlockingQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BlockingQueue<T> {
    /// Create a queue holding at most `capacity` items, fed by `producers`
    /// producers.
    pub fn new(capacity: usize, producers: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                producers,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append an item, blocking while the queue is full.
    pub fn put(&self, item: T) {
        let mut state = self.state.lock().unwrap();
        while state.items.len() >= self.capacity {
            state = self.not_full.wait(state).unwrap();
        }
        state.items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Take the next item, blocking while the queue is empty and producers
    /// remain. Returns `None` when the queue is drained and the producer
    /// count has reached zero.
    pub fn get(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if state.producers == 0 {
                return None;
            }
            state = self.not_empty.wait(state).unwrap();
        }
    }

    /// Signal that one producer has finished.
    pub fn dec_producers(&self) {
        let mut state = self.state.lock().unwrap();
        state.producers = state.producers.saturating_sub(1);
        if state.producers == 0 {
            self.not_empty.notify_all();
        }
    }
}
