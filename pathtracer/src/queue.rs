//! Bounded producer/consumer queue of pending pixel blocks.
//!
//! There is exactly one producer (the integrator's driving thread) and
//! `thread_count` consumers. `push_blocking` blocks while the queue is full;
//! `pop_blocking` blocks while it's empty, returning `None` once the queue
//! has been closed and drained. Built on `std::sync::{Mutex, Condvar}` since
//! the bounded-with-explicit-close semantics required here don't map onto
//! `std::sync::mpsc`.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// A rectangle of pixels, in image coordinates, queued as a unit of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBlock {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

struct Inner<T> {
    queue: VecDeque<T>,
    closed: bool,
}

pub struct BucketQueue<T> {
    capacity: usize,
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BucketQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Blocks until there's room, then enqueues `item`.
    pub fn push_blocking(&self, item: T) {
        let mut inner = self.inner.lock().unwrap();
        while inner.queue.len() >= self.capacity && !inner.closed {
            inner = self.not_full.wait(inner).unwrap();
        }
        inner.queue.push_back(item);
        drop(inner);
        self.not_empty.notify_one();
    }

    /// Blocks until an item is available or the queue is closed and
    /// drained, in which case it returns `None`.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(item) = inner.queue.pop_front() {
                drop(inner);
                self.not_full.notify_one();
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            inner = self.not_empty.wait(inner).unwrap();
        }
    }

    /// The producer's signal that no further pushes will occur. Releases
    /// every waiting pop so consumers can drain and exit.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        drop(inner);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn enqueue_and_drain_round_trip() {
        let queue = Arc::new(BucketQueue::new(4));
        let n = 500;
        let k = 4;

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..n {
                    queue.push_blocking(i);
                }
                queue.close();
            })
        };

        let mut workers = Vec::new();
        for _ in 0..k {
            let queue = Arc::clone(&queue);
            workers.push(thread::spawn(move || {
                let mut received = Vec::new();
                while let Some(item) = queue.pop_blocking() {
                    received.push(item);
                }
                received
            }));
        }

        producer.join().unwrap();
        let mut all_received: Vec<i32> = Vec::new();
        for w in workers {
            all_received.extend(w.join().unwrap());
        }

        all_received.sort_unstable();
        let expected: Vec<i32> = (0..n).collect();
        assert_eq!(all_received, expected);
    }

    #[test]
    fn pop_on_closed_empty_queue_returns_none() {
        let queue: BucketQueue<u32> = BucketQueue::new(2);
        queue.close();
        assert_eq!(queue.pop_blocking(), None);
        assert_eq!(queue.pop_blocking(), None);
    }
}
