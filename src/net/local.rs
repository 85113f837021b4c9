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

//! In-process communicator backend
//!
//! Runs a whole worker group inside one process, one worker per thread.
//! Point-to-point messages go through per-worker mailboxes; allreduce and
//! barrier are generation-counted rendezvous. FIFO between a given
//! source/destination pair holds because mailboxes are order-preserving
//! queues and each message is enqueued under the mailbox lock.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crate::error::{RiffleError, RiffleResult};

use super::Communicator;

struct Message {
    source: i32,
    tag: i32,
    payload: Vec<u8>,
}

struct Mailbox {
    queue: Mutex<VecDeque<Message>>,
    available: Condvar,
}

impl Mailbox {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }
}

#[derive(Default)]
struct RendezvousState {
    arrived: usize,
    generation: u64,
    accumulator: i64,
    result: i64,
}

/// One collective meeting point. A generation completes when all workers
/// have arrived; late wakers read the result of their own generation only,
/// because no worker can re-enter before every waiter of the previous
/// generation has returned.
struct Rendezvous {
    state: Mutex<RendezvousState>,
    complete: Condvar,
}

impl Rendezvous {
    fn new() -> Self {
        Self {
            state: Mutex::new(RendezvousState::default()),
            complete: Condvar::new(),
        }
    }
}

struct LocalWorld {
    mailboxes: Vec<Mailbox>,
    barrier: Rendezvous,
    reduce: Rendezvous,
}

/// In-process communicator for a group of workers running as threads.
pub struct LocalCommunicator {
    worker_id: i32,
    world: Arc<LocalWorld>,
}

impl LocalCommunicator {
    /// Create a connected group of `worker_count` communicators, one per
    /// worker, indexed by worker id.
    pub fn group(worker_count: usize) -> Vec<LocalCommunicator> {
        let world = Arc::new(LocalWorld {
            mailboxes: (0..worker_count).map(|_| Mailbox::new()).collect(),
            barrier: Rendezvous::new(),
            reduce: Rendezvous::new(),
        });
        (0..worker_count)
            .map(|id| LocalCommunicator {
                worker_id: id as i32,
                world: world.clone(),
            })
            .collect()
    }

    fn mailbox(&self, worker: i32) -> RiffleResult<&Mailbox> {
        self.world
            .mailboxes
            .get(worker as usize)
            .ok_or_else(|| RiffleError::Transport(format!("no such worker: {worker}")))
    }
}

impl Communicator for LocalCommunicator {
    fn worker_id(&self) -> i32 {
        self.worker_id
    }

    fn worker_count(&self) -> i32 {
        self.world.mailboxes.len() as i32
    }

    fn local_peer_count(&self) -> usize {
        // The whole group shares this process.
        self.world.mailboxes.len()
    }

    fn send(&self, data: &[u8], dest: i32, tag: i32) -> RiffleResult<()> {
        let mailbox = self.mailbox(dest)?;
        let mut queue = mailbox.queue.lock().unwrap();
        queue.push_back(Message {
            source: self.worker_id,
            tag,
            payload: data.to_vec(),
        });
        mailbox.available.notify_all();
        Ok(())
    }

    fn recv(&self, source: i32, tag: i32) -> RiffleResult<Vec<u8>> {
        let mailbox = self.mailbox(self.worker_id)?;
        let mut queue = mailbox.queue.lock().unwrap();
        loop {
            if let Some(idx) = queue
                .iter()
                .position(|m| m.source == source && m.tag == tag)
            {
                let message = queue.remove(idx).expect("message vanished under lock");
                return Ok(message.payload);
            }
            queue = mailbox.available.wait(queue).unwrap();
        }
    }

    fn probe(&self) -> RiffleResult<(i32, usize)> {
        let mailbox = self.mailbox(self.worker_id)?;
        let mut queue = mailbox.queue.lock().unwrap();
        loop {
            if let Some(front) = queue.front() {
                return Ok((front.source, front.payload.len()));
            }
            queue = mailbox.available.wait(queue).unwrap();
        }
    }

    fn allreduce_sum(&self, value: i64) -> RiffleResult<i64> {
        let reduce = &self.world.reduce;
        let mut state = reduce.state.lock().unwrap();
        let generation = state.generation;
        state.accumulator += value;
        state.arrived += 1;
        if state.arrived == self.world.mailboxes.len() {
            state.result = state.accumulator;
            state.accumulator = 0;
            state.arrived = 0;
            state.generation += 1;
            reduce.complete.notify_all();
            return Ok(state.result);
        }
        while state.generation == generation {
            state = reduce.complete.wait(state).unwrap();
        }
        Ok(state.result)
    }

    fn barrier(&self) -> RiffleResult<()> {
        let barrier = &self.world.barrier;
        let mut state = barrier.state.lock().unwrap();
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.world.mailboxes.len() {
            state.arrived = 0;
            state.generation += 1;
            barrier.complete.notify_all();
            return Ok(());
        }
        while state.generation == generation {
            state = barrier.complete.wait(state).unwrap();
        }
        Ok(())
    }
}
