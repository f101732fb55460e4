//! Lock-free multi-producer multi-consumer FIFO queue.
//!
//! The queue is a Michael-Scott non-blocking linked queue: all shared state
//! is updated through compare-and-swap on pointer-sized words, and dequeued
//! nodes are reclaimed through [`crossbeam_epoch`] so that no concurrent
//! snapshot can ever dereference, or be fooled by the reuse of, a freed
//! address.
//!
//! ```
//! use lf_fifo::LockFreeQueue;
//!
//! let queue = LockFreeQueue::new();
//! queue.enqueue(1);
//! queue.enqueue(2);
//! assert_eq!(queue.dequeue(), Some(1));
//! assert_eq!(queue.dequeue(), Some(2));
//! assert_eq!(queue.dequeue(), None);
//! ```

pub mod structures;

pub use structures::lockfreequeue::LockFreeQueue;
