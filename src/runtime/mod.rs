//! The task system
//!
//! [`TaskSystem`] owns `N + 1` task queues and `N` worker threads. Queue 0
//! is the main-thread queue: the host drains it explicitly with
//! [`run_on_main`](TaskSystem::run_on_main) (say, once per frame), and
//! workers never touch it. Queues `1..=N` each pair with one worker.
//! Submissions round-robin over the worker queues; idle workers probe the
//! whole worker ring before blocking on their own queue, which yields work
//! stealing without dedicated victim selection.
//!
//! Dropping the system marks every queue done and joins the workers.
//! Queued-but-unrun tasks are discarded at that point; their futures
//! resolve with [`FutureError::Abandoned`](crate::sync::FutureError).

#[doc(hidden)]
pub mod queue;
mod worker;

use std::io;
use std::thread::{available_parallelism, Builder, JoinHandle};

use crate::loom::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use crate::sync::Future;
use crate::task::{self, Call, OperandList, Task};
use queue::TaskQueue;
use worker::Worker;

const MAIN_QUEUE: usize = 0;
// Bounded try window for main-queue pushes and pops; worker dispatch scales
// its window with the pool instead.
const MAIN_TRIES: usize = 10;

pub(crate) struct Shared {
  queues: Box<[TaskQueue]>,
  dispatch: AtomicUsize,
  nworkers: usize,
}

impl Shared {
  // Ring position `probe` steps after `idx`, over worker queues only.
  fn worker_queue(&self, idx: usize, probe: usize) -> usize {
    ((idx + probe) % self.nworkers) + 1
  }

  fn try_window(&self) -> usize {
    10 * self.nworkers
  }
}

pub struct TaskSystemBuilder {
  workers: Option<usize>,
  thread_name_prefix: String,
}

impl Default for TaskSystemBuilder {
  fn default() -> Self {
    Self { workers: None, thread_name_prefix: String::from("weft-worker") }
  }
}

impl TaskSystemBuilder {
  /// Number of worker threads. `0` is legal and disables background
  /// execution: every submission then routes to the main-thread queue.
  /// Defaults to available parallelism minus one.
  pub fn num_workers(mut self, workers: usize) -> Self {
    self.workers = Some(workers);
    self
  }

  pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.thread_name_prefix = prefix.into();
    self
  }

  /// Fails if a worker thread cannot be spawned; workers spawned before
  /// the failure are shut down and joined.
  pub fn build(self) -> io::Result<TaskSystem> {
    let nworkers = self.workers.unwrap_or_else(|| {
      available_parallelism().map(|n| n.get().saturating_sub(1)).unwrap_or(1)
    });

    let queues: Box<[TaskQueue]> =
      (0..nworkers + 1).map(|_| TaskQueue::new()).collect();

    let shared =
      Arc::new(Shared { queues, dispatch: AtomicUsize::new(1), nworkers });

    let mut workers = Vec::with_capacity(nworkers);
    for queue_index in 1..nworkers + 1 {
      let worker = Worker::new(shared.clone(), queue_index);
      let spawned = Builder::new()
        .name(format!("{}-{}", self.thread_name_prefix, queue_index))
        .spawn(move || worker.run());

      match spawned {
        Ok(handle) => workers.push(handle),
        Err(error) => {
          for queue in shared.queues.iter() {
            queue.set_done();
          }
          for handle in workers {
            let _ = handle.join();
          }
          return Err(error);
        }
      }
    }

    tracing::trace!(workers = nworkers, "task system started");

    Ok(TaskSystem { shared, workers })
  }
}

/// A pool of `N` worker threads over `N + 1` task queues, with
/// work-stealing dispatch and a host-drained main-thread queue.
pub struct TaskSystem {
  shared: Arc<Shared>,
  workers: Vec<JoinHandle<()>>,
}

impl TaskSystem {
  /// A system with the default worker count.
  pub fn new() -> io::Result<Self> {
    Self::builder().build()
  }

  pub fn builder() -> TaskSystemBuilder {
    TaskSystemBuilder::default()
  }

  pub fn num_workers(&self) -> usize {
    self.shared.nworkers
  }

  /// Submits a ready task for background execution and returns its output
  /// future.
  pub fn push_ready<F, Args, R>(&self, callable: F, args: Args) -> Future<R>
  where
    F: Call<Args, Output = R> + Send + 'static,
    Args: Send + 'static,
    R: Send + 'static,
  {
    if self.shared.nworkers == 0 {
      return self.push_ready_on_main(callable, args);
    }

    let (task, future) = task::make_ready(callable, args);
    self.dispatch(task);
    future
  }

  /// Submits an awaitable task; `operands` may mix futures of other tasks
  /// with [`immediate`](crate::task::immediate) values.
  pub fn push_awaitable<F, Ops, R>(&self, callable: F, operands: Ops) -> Future<R>
  where
    Ops: OperandList + Send + 'static,
    F: Call<Ops::Values, Output = R> + Send + 'static,
    R: Send + 'static,
  {
    if self.shared.nworkers == 0 {
      return self.push_awaitable_on_main(callable, operands);
    }

    let (task, future) = task::make_awaitable(callable, operands);
    self.dispatch(task);
    future
  }

  /// Submits an already-constructed task for background execution.
  pub fn push_task(&self, task: Task) {
    if self.shared.nworkers == 0 {
      return self.push_task_on_main(task);
    }

    self.dispatch(task);
  }

  pub fn push_ready_on_main<F, Args, R>(&self, callable: F, args: Args) -> Future<R>
  where
    F: Call<Args, Output = R> + Send + 'static,
    Args: Send + 'static,
    R: Send + 'static,
  {
    let (task, future) = task::make_ready(callable, args);
    self.push_task_on_main(task);
    future
  }

  pub fn push_awaitable_on_main<F, Ops, R>(
    &self,
    callable: F,
    operands: Ops,
  ) -> Future<R>
  where
    Ops: OperandList + Send + 'static,
    F: Call<Ops::Values, Output = R> + Send + 'static,
    R: Send + 'static,
  {
    let (task, future) = task::make_awaitable(callable, operands);
    self.push_task_on_main(task);
    future
  }

  pub fn push_task_on_main(&self, mut task: Task) {
    let queue = &self.shared.queues[MAIN_QUEUE];
    for _ in 0..MAIN_TRIES {
      match queue.try_push(task) {
        Ok(()) => return,
        Err(back) => task = back,
      }
    }

    queue.push(task);
  }

  /// Runs one main-thread drain iteration: a bounded window of
  /// non-blocking pops on queue 0, then a blocking pop, then invocation of
  /// the acquired task. The host is expected to call this periodically;
  /// main-targeted tasks run nowhere else.
  pub fn run_on_main(&self) {
    let queue = &self.shared.queues[MAIN_QUEUE];

    let mut task = None;
    for _ in 0..MAIN_TRIES {
      if let Some(found) = queue.try_pop() {
        task = Some(found);
        break;
      }
    }

    let Some(task) = task.or_else(|| queue.pop()) else {
      return;
    };

    worker::invoke(task);
  }

  /// Marks every queue done, waking all blocked waiters. Idempotent.
  pub fn done(&self) {
    for queue in self.shared.queues.iter() {
      queue.set_done();
    }
  }

  // Round-robin over the worker queues: a bounded window of try-pushes
  // starting at the dispatch cursor, then a blocking push on the cursor's
  // home position.
  fn dispatch(&self, mut task: Task) {
    let shared = &self.shared;
    let idx = shared.dispatch.fetch_add(1, Ordering::Relaxed);

    for probe in 0..shared.try_window() {
      match shared.queues[shared.worker_queue(idx, probe)].try_push(task) {
        Ok(()) => return,
        Err(back) => task = back,
      }
    }

    shared.queues[shared.worker_queue(idx, 0)].push(task);
  }
}

#[cfg(test)]
static_assertions::assert_impl_all!(TaskSystem: Send, Sync);

impl Drop for TaskSystem {
  fn drop(&mut self) {
    self.done();
    for handle in self.workers.drain(..) {
      let _ = handle.join();
    }
  }
}
