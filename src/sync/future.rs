use std::{cell::UnsafeCell, mem::MaybeUninit};

#[cfg(not(loom))]
use parking::Parker;
use thiserror::Error;

use crate::loom::sync::{
  atomic::{AtomicU8, Ordering},
  Arc, Mutex,
};

const FULFILLED: u8 = 1 << 0;
const CONSUMED: u8 = 1 << 1;

/// Creates a paired [`Promise`] and [`Future`].
///
/// The promise is the producing half: fulfilling it with [`Promise::set`]
/// (or [`Promise::fail`]) publishes an outcome exactly once. The future is
/// the consuming half: it can be polled without blocking through
/// [`Future::is_ready`] and consumed with the blocking [`Future::get`].
///
/// Dropping the promise without fulfilling it publishes
/// [`FutureError::Abandoned`], so a future always resolves.
pub fn promise<T>() -> (Promise<T>, Future<T>) {
  let shared = Arc::new(Shared {
    state: AtomicU8::new(0),
    slot: UnsafeCell::new(MaybeUninit::uninit()),
    waiter: Mutex::new(None),
  });

  (Promise { shared: Some(shared.clone()) }, Future { shared })
}

/// The failure a [`Future`] resolves with when its producer did not
/// deliver a value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FutureError {
  #[error("the producing task panicked")]
  Panicked,
  #[error("the producing task was dropped before completing")]
  Abandoned,
}

struct Shared<T> {
  state: AtomicU8,
  slot: UnsafeCell<MaybeUninit<Result<T, FutureError>>>,
  // Registered by a blocked getter, taken by the fulfilling side. Guarded by
  // a mutex so fulfilment can never read a half-written registration.
  waiter: Mutex<Option<parking::Unparker>>,
}

// The slot is written once (before the FULFILLED release store) and read
// once (after a FULFILLED acquire load), by handles that are themselves
// move-only.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

#[cfg(test)]
static_assertions::assert_impl_all!(Promise<()>: Send);
#[cfg(test)]
static_assertions::assert_impl_all!(Future<()>: Send);

impl<T> Shared<T> {
  fn fulfil(&self, outcome: Result<T, FutureError>) {
    // SAFETY: the promise half is move-only and fulfils at most once, so
    // nothing else writes the slot; the getter only reads it after
    // observing FULFILLED.
    unsafe { (*self.slot.get()).write(outcome) };
    self.state.fetch_or(FULFILLED, Ordering::AcqRel);

    let waiter = self.waiter.lock().unwrap_or_else(|e| e.into_inner()).take();
    if let Some(unparker) = waiter {
      unparker.unpark();
    }
  }

  fn is_fulfilled(&self) -> bool {
    self.state.load(Ordering::Acquire) & FULFILLED != 0
  }
}

impl<T> Drop for Shared<T> {
  fn drop(&mut self) {
    let state = self.state.load(Ordering::Acquire);
    if state & FULFILLED != 0 && state & CONSUMED == 0 {
      // SAFETY: fulfilled but never read, so the slot holds a live value.
      unsafe { self.slot.get_mut().assume_init_drop() };
    }
  }
}

/// The producing half of a [`promise`] pair. Move-only and single-shot.
pub struct Promise<T> {
  shared: Option<Arc<Shared<T>>>,
}

impl<T> Promise<T> {
  /// Fulfils the paired future with a value. If the future has already
  /// been dropped the value is discarded.
  pub fn set(mut self, value: T) {
    if let Some(shared) = self.shared.take() {
      shared.fulfil(Ok(value));
    }
  }

  /// Fulfils the paired future with a failure.
  pub fn fail(mut self, error: FutureError) {
    if let Some(shared) = self.shared.take() {
      shared.fulfil(Err(error));
    }
  }
}

impl<T> Drop for Promise<T> {
  fn drop(&mut self) {
    if let Some(shared) = self.shared.take() {
      shared.fulfil(Err(FutureError::Abandoned));
    }
  }
}

/// The consuming half of a [`promise`] pair.
pub struct Future<T> {
  shared: Arc<Shared<T>>,
}

impl<T> Future<T> {
  /// Non-blocking readiness poll.
  pub fn is_ready(&self) -> bool {
    self.shared.is_fulfilled()
  }

  /// Blocks until the promise is fulfilled, then returns the published
  /// value or failure.
  pub fn get(self) -> Result<T, FutureError> {
    self.wait_fulfilled();

    self.shared.state.fetch_or(CONSUMED, Ordering::AcqRel);
    // SAFETY: FULFILLED was observed with acquire ordering, so the slot
    // write happens-before this read; `self` is consumed and CONSUMED keeps
    // the shared drop from touching the slot again.
    unsafe { (*self.shared.slot.get()).assume_init_read() }
  }

  #[cfg(not(loom))]
  fn wait_fulfilled(&self) {
    if self.shared.is_fulfilled() {
      return;
    }

    let parker = Parker::new();
    *self.shared.waiter.lock().unwrap_or_else(|e| e.into_inner()) =
      Some(parker.unparker());

    // Re-check after registering: fulfilment between the first check and
    // the registration either took the unparker (park returns at once) or
    // missed it (this check sees FULFILLED).
    while !self.shared.is_fulfilled() {
      parker.park();
    }
  }

  // loom cannot schedule around a foreign parker; an explicit yield loop
  // keeps every blocking point visible to the model.
  #[cfg(loom)]
  fn wait_fulfilled(&self) {
    while !self.shared.is_fulfilled() {
      crate::loom::thread::yield_now();
    }
  }
}

#[cfg(all(test, not(loom)))]
mod tests {
  use super::*;
  use std::time::Duration;

  #[test]
  fn set_then_get() {
    let (promise, future) = promise();
    promise.set(7u32);
    assert!(future.is_ready());
    assert_eq!(future.get(), Ok(7));
  }

  #[test]
  fn fail_then_get() {
    let (promise, future) = promise::<u32>();
    promise.fail(FutureError::Panicked);
    assert_eq!(future.get(), Err(FutureError::Panicked));
  }

  #[test]
  fn dropped_promise_resolves_abandoned() {
    let (promise, future) = promise::<u32>();
    drop(promise);
    assert!(future.is_ready());
    assert_eq!(future.get(), Err(FutureError::Abandoned));
  }

  #[test]
  fn not_ready_until_fulfilled() {
    let (promise, future) = promise::<&str>();
    assert!(!future.is_ready());
    promise.set("done");
    assert!(future.is_ready());
  }

  #[test]
  fn get_blocks_across_threads() {
    let (promise, future) = promise();
    let producer = std::thread::spawn(move || {
      std::thread::sleep(Duration::from_millis(50));
      promise.set(String::from("late"));
    });

    assert_eq!(future.get(), Ok(String::from("late")));
    producer.join().unwrap();
  }

  #[test]
  fn unconsumed_value_is_dropped() {
    let (promise, future) = promise();
    promise.set(std::sync::Arc::new(0u8));
    drop(future);
  }
}
