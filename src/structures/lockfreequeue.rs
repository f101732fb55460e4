use std::mem::MaybeUninit;
use std::sync::atomic::Ordering;

use crossbeam::utils::CachePadded;
use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};

/// A singly linked node. The value slot is left uninitialized only in the
/// dummy node; every other slot is written once by the enqueuer and moved
/// out once by the dequeuer that wins the head CAS.
struct Node<T> {
    value: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

impl<T> Node<T> {
    fn dummy() -> Self {
        Node {
            value: MaybeUninit::uninit(),
            next: Atomic::null(),
        }
    }
}

/// Michael-Scott non-blocking FIFO queue for any number of concurrent
/// producers and consumers.
///
/// `head` always points at a node whose value has already been consumed
/// (the dummy from construction, or the node a previous dequeue moved past),
/// so the first live value sits in `head`'s successor. `tail` points at the
/// last node, or lags one node behind while an enqueue's second CAS is still
/// pending; any thread that observes the lag swings `tail` forward itself,
/// which is what keeps the structure lock-free when the original enqueuer
/// stalls between its two CASes.
///
/// Dequeued nodes are retired through [`crossbeam_epoch`] instead of being
/// freed in place: a concurrent operation may still hold a snapshot of the
/// old head, and the collector also guarantees an address cannot be recycled
/// while such a snapshot could still be compared, so the classical ABA
/// counter is not needed.
pub struct LockFreeQueue<T> {
    head: CachePadded<Atomic<Node<T>>>,
    tail: CachePadded<Atomic<Node<T>>>,
}

unsafe impl<T: Send> Send for LockFreeQueue<T> {}
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T> LockFreeQueue<T> {
    /// Creates an empty queue: one dummy node with both frontier pointers
    /// on it.
    pub fn new() -> Self {
        let dummy = Owned::new(Node::dummy()).into_shared(unsafe { epoch::unprotected() });
        Self {
            head: CachePadded::new(Atomic::from(dummy)),
            tail: CachePadded::new(Atomic::from(dummy)),
        }
    }

    /// Adds `value` at the tail of the queue.
    pub fn enqueue(&self, value: T) {
        let guard = &epoch::pin();
        let new = Owned::new(Node {
            value: MaybeUninit::new(value),
            next: Atomic::null(),
        })
        .into_shared(guard);

        loop {
            let tail = self.tail.load(Ordering::Acquire, guard);
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, guard);

            // Snapshot consistency: tail moved while next was being read.
            if tail != self.tail.load(Ordering::Acquire, guard) {
                continue;
            }

            if next.is_null() {
                // Tail is the last node; link the new node after it.
                if tail_ref
                    .next
                    .compare_exchange(
                        Shared::null(),
                        new,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    )
                    .is_ok()
                {
                    // Swing tail onto the node just linked. Failure means
                    // another thread already helped it forward.
                    let _ = self.tail.compare_exchange(
                        tail,
                        new,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    );
                    return;
                }
            } else {
                // Tail lags behind the true end; swing it forward before
                // retrying.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
            }
        }
    }

    /// Removes and returns the value at the head of the queue, or `None` if
    /// the queue is empty at the moment of the attempt. Never blocks.
    pub fn dequeue(&self) -> Option<T> {
        let guard = &epoch::pin();
        self.dequeue_in(guard)
    }

    fn dequeue_in(&self, guard: &Guard) -> Option<T> {
        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let tail = self.tail.load(Ordering::Acquire, guard);
            let next = unsafe { head.deref() }.next.load(Ordering::Acquire, guard);

            if head != self.head.load(Ordering::Acquire, guard) {
                continue;
            }

            if head == tail {
                if next.is_null() {
                    return None;
                }
                // Tail lags behind a node that is already linked; help it
                // forward and retry.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
            } else if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                // Winning the CAS makes this thread the unique consumer of
                // `next`'s slot, and the pin keeps the node mapped, so the
                // move out of the slot cannot race with reclamation.
                let value = unsafe { next.deref().value.as_ptr().read() };
                // The old head may still sit in another thread's snapshot;
                // retire it through the collector rather than freeing it
                // here.
                unsafe { guard.defer_destroy(head) };
                return Some(value);
            }
        }
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        // `&mut self`: no other thread holds a snapshot, so the unprotected
        // guard is sound and retired nodes are freed on the spot.
        unsafe {
            let guard = epoch::unprotected();
            while self.dequeue_in(guard).is_some() {}
            let dummy = self.head.load(Ordering::Relaxed, guard);
            drop(dummy.into_owned());
        }
    }
}
