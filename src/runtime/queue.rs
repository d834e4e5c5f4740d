use std::collections::VecDeque;

use crate::loom::{
  sync::{
    atomic::{AtomicBool, Ordering},
    Condvar, Mutex,
  },
  thread,
};
use crate::task::Task;

/// A mutex-protected FIFO of tasks with non-blocking try variants and a
/// dataflow-aware blocking pop.
///
/// `done` never clears once set; a blocking [`pop`](TaskQueue::pop) on a
/// done-and-empty queue returns `None`, which consumers treat as the
/// shutdown signal.
pub struct TaskQueue {
  tasks: Mutex<VecDeque<Task>>,
  cond: Condvar,
  done: AtomicBool,
}

impl TaskQueue {
  pub fn new() -> Self {
    Self {
      tasks: Mutex::new(VecDeque::new()),
      cond: Condvar::new(),
      done: AtomicBool::new(false),
    }
  }

  /// Non-blocking pop of the head task. `None` when the lock is contended
  /// or the queue is empty.
  pub fn try_pop(&self) -> Option<Task> {
    let mut tasks = self.tasks.try_lock().ok()?;
    tasks.pop_front()
  }

  /// Non-blocking append. On lock contention the task is handed back so
  /// the caller can try elsewhere.
  pub fn try_push(&self, task: Task) -> Result<(), Task> {
    match self.tasks.try_lock() {
      Ok(mut tasks) => {
        tasks.push_back(task);
        drop(tasks);
        self.cond.notify_one();
        Ok(())
      }
      Err(_) => Err(task),
    }
  }

  /// Blocking append.
  pub fn push(&self, task: Task) {
    let mut tasks = self.lock();
    tasks.push_back(task);
    drop(tasks);
    self.cond.notify_one();
  }

  /// Blocking pop that prefers runnable work.
  ///
  /// Waits while the queue is empty and not done; `None` means
  /// done-and-empty. On a non-empty queue the scan returns the head if it
  /// is ready, otherwise rotates unready tasks to the tail for one full
  /// cycle looking for a ready one. If nothing in the snapshot is ready
  /// the (restored) head is taken anyway and the lock is released while
  /// this thread spin-yields until that task's dependencies resolve, so a
  /// task is always returned from a non-empty queue.
  pub fn pop(&self) -> Option<Task> {
    let mut tasks = self.lock();
    while tasks.is_empty() && !self.is_done() {
      tasks = self.cond.wait(tasks).unwrap_or_else(|e| e.into_inner());
    }

    if tasks.is_empty() {
      return None;
    }

    for _ in 0..tasks.len() {
      let head_ready =
        tasks.front().map(|task| task.ready().unwrap_or(true)).unwrap_or(false);
      if head_ready {
        return tasks.pop_front();
      }

      if let Some(task) = tasks.pop_front() {
        tasks.push_back(task);
      }
    }

    // Nothing in the snapshot was ready; commit to the head rather than
    // live-lock scanning, and wait for it outside the lock.
    let task = tasks.pop_front()?;
    drop(tasks);

    while !task.ready().unwrap_or(true) {
      thread::yield_now();
    }

    Some(task)
  }

  /// Marks the queue done and wakes every waiter. Idempotent.
  pub fn set_done(&self) {
    self.done.store(true, Ordering::Release);
    // A waiter between its emptiness check and its sleep still holds the
    // mutex; taking it here orders this store before any new wait, so the
    // notification below cannot be lost.
    drop(self.lock());
    self.cond.notify_all();
  }

  pub fn is_done(&self) -> bool {
    self.done.load(Ordering::Acquire)
  }

  fn lock(&self) -> crate::loom::sync::MutexGuard<'_, VecDeque<Task>> {
    self.tasks.lock().unwrap_or_else(|e| e.into_inner())
  }
}
