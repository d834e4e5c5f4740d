use crate::loom::sync::Arc;
use crate::runtime::Shared;
use crate::task::Task;

/// One background worker, bound to its home queue for blocking waits but
/// stealing from the whole worker ring first.
pub(crate) struct Worker {
  shared: Arc<Shared>,
  queue_index: usize,
}

impl Worker {
  pub(crate) fn new(shared: Arc<Shared>, queue_index: usize) -> Self {
    Self { shared, queue_index }
  }

  pub(crate) fn run(self) {
    tracing::trace!(queue = self.queue_index, "worker started");

    loop {
      let task = match self.steal() {
        Some(task) => task,
        // Nothing anywhere in the ring; block on the home queue. `None`
        // there means done-and-empty: time to exit.
        None => match self.shared.queues[self.queue_index].pop() {
          Some(task) => task,
          None => break,
        },
      };

      invoke(task);
    }

    tracing::trace!(queue = self.queue_index, "worker shutting down");
  }

  /// Probes `try_pop` around the worker ring, starting next to the home
  /// queue. Queue 0 is never probed: main-thread work is not stolen.
  fn steal(&self) -> Option<Task> {
    for probe in 0..self.shared.try_window() {
      let queue = self.shared.worker_queue(self.queue_index, probe);
      if let Some(task) = self.shared.queues[queue].try_pop() {
        return Some(task);
      }
    }

    None
  }
}

/// Runs a task, keeping the calling thread alive whatever the task does.
/// User-code panics were already captured into the task's promise; what is
/// left to handle here is operating on a defective task.
pub(crate) fn invoke(mut task: Task) {
  if let Err(error) = task.invoke() {
    tracing::error!(%error, "skipping defective task");
  }
}
