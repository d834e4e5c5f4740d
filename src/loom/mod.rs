#![allow(unused_imports)]

pub(crate) mod sync {
  #[cfg(loom)]
  pub(crate) use ::loom::sync::{Arc, Condvar, Mutex, MutexGuard};
  #[cfg(not(loom))]
  pub(crate) use std::sync::{Arc, Condvar, Mutex, MutexGuard};

  pub(crate) mod atomic {
    #[cfg(loom)]
    pub(crate) use ::loom::sync::atomic::{
      AtomicBool, AtomicU8, AtomicUsize, Ordering,
    };
    #[cfg(not(loom))]
    pub(crate) use std::sync::atomic::{
      AtomicBool, AtomicU8, AtomicUsize, Ordering,
    };
  }
}

#[cfg(loom)]
pub(crate) use ::loom::thread;

#[cfg(not(loom))]
pub(crate) use std::thread;
