//! Bounded FIFO hand-off queue shared between interrupt and polling context.
//!
//! Each operation runs inside a critical section, so a queue may be touched
//! from the bus-event handler and from the main loop without further locking.
//! Items are moved in and out; a boxed buffer crosses contexts as a pointer,
//! never as a copy of its bytes.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Deque;

pub struct HandoffQueue<T, const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Deque<T, N>>>,
}

impl<T, const N: usize> HandoffQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Append `item`. Never blocks; a full queue hands the item back.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        self.inner.lock(|q| q.borrow_mut().push_back(item))
    }

    /// Remove the head item, if any.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock(|q| q.borrow_mut().pop_front())
    }

    /// Run `f` on the head item without removing it.
    pub fn with_front<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.inner.lock(|q| q.borrow_mut().front_mut().map(f))
    }

    /// Run `f` on every queued item, head first.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        self.inner.lock(|q| q.borrow().iter().for_each(&mut f));
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|q| q.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock(|q| q.borrow().is_empty())
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock(|q| q.borrow().is_full())
    }
}

impl<T, const N: usize> Default for HandoffQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
