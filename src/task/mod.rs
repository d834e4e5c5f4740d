//! Dataflow tasks
//!
//! A [`Task`] is one deferred invocation: a callable bound together with its
//! arguments and an output promise. Construction hands back the paired
//! [`Future`](crate::sync::Future) so the submitter can collect the result
//! (or the failure) once the task has run, wherever that happens to be.
//!
//! Tasks come in two flavours. A *ready* task ([`make_ready`]) binds plain
//! values and will never block when invoked. An *awaitable* task
//! ([`make_awaitable`], or the [`awaitable!`](crate::awaitable) macro for
//! mixed argument lists) may bind futures produced by other tasks; invoking
//! it resolves those dependencies first, blocking on any that are not ready
//! yet. The [`Task::ready`] poll answers whether invocation would block,
//! which is what lets a queue skip over dependency-tangled tasks in favour
//! of runnable ones.

mod model;
mod operand;

pub use operand::{immediate, Call, Immediate, IntoOperand, Operand, OperandList};

use thiserror::Error;

use crate::sync::{self, Future};
use model::{AwaitableModel, ReadyModel, TaskModel};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
  /// The task holds no model: it was never given one, or it has already
  /// been invoked.
  #[error("bad task access: task holds no model")]
  BadTaskAccess,
}

/// One deferred unit of work behind a type-erased model.
///
/// A task either holds exactly one model or is *empty*; [`invoke`](Task::invoke)
/// consumes the model, so a task is single-shot and empty afterwards.
/// Operating on an empty task reports [`TaskError::BadTaskAccess`].
pub struct Task {
  model: Option<Box<dyn TaskModel>>,
}

/// Creates a ready task: all arguments are plain values, bound by value as
/// a tuple, and invocation will not block.
pub fn make_ready<F, Args, R>(callable: F, args: Args) -> (Task, Future<R>)
where
  F: Call<Args, Output = R> + Send + 'static,
  Args: Send + 'static,
  R: Send + 'static,
{
  let (promise, future) = sync::promise();
  let model = ReadyModel::new(callable, args, promise);

  (Task { model: Some(Box::new(model)) }, future)
}

/// Creates an awaitable task from a tuple of [`Operand`]s, some of which
/// may be futures pending on other tasks.
///
/// At invoke time every future operand is consumed with a blocking get, in
/// slot order, and the callable receives the resolved values. A failed
/// dependency short-circuits: the callable never runs and the failure is
/// published through the returned future instead.
///
/// Plain values take an explicit [`immediate`] wrapper here; the
/// [`awaitable!`](crate::awaitable) macro does that wrapping per argument.
///
/// ```
/// use weft::sync::promise;
/// use weft::task::{immediate, make_awaitable};
///
/// let (dependency, pending) = promise::<u32>();
/// let (mut task, future) =
///   make_awaitable(|x: u32, y: u32| x * y, (pending, immediate(3)));
///
/// assert_eq!(task.ready(), Ok(false));
/// dependency.set(4);
/// assert_eq!(task.ready(), Ok(true));
///
/// task.invoke().unwrap();
/// assert_eq!(future.get(), Ok(12));
/// ```
pub fn make_awaitable<F, Ops, R>(callable: F, operands: Ops) -> (Task, Future<R>)
where
  Ops: OperandList + Send + 'static,
  F: Call<Ops::Values, Output = R> + Send + 'static,
  R: Send + 'static,
{
  let (promise, future) = sync::promise();
  let model = AwaitableModel::new(callable, operands, promise);

  (Task { model: Some(Box::new(model)) }, future)
}

impl Task {
  /// Resolves any future operands, calls the callable and publishes the
  /// outcome through the output future.
  pub fn invoke(&mut self) -> Result<(), TaskError> {
    let model = self.model.take().ok_or(TaskError::BadTaskAccess)?;
    model.invoke();
    Ok(())
  }

  /// Non-blocking poll: would [`invoke`](Task::invoke) complete without
  /// waiting on a dependency?
  pub fn ready(&self) -> Result<bool, TaskError> {
    self.model.as_ref().map(|model| model.ready()).ok_or(TaskError::BadTaskAccess)
  }

  pub fn is_empty(&self) -> bool {
    self.model.is_none()
  }
}

#[cfg(test)]
static_assertions::assert_impl_all!(Task: Send);

#[cfg(all(test, not(loom)))]
mod tests {
  use super::*;
  use crate::sync::{promise, FutureError};

  #[test]
  fn ready_task_invokes_exactly_once() {
    let (mut task, future) = make_ready(|a: u32, b: u32| a + b, (20, 22));

    assert!(!task.is_empty());
    assert_eq!(task.ready(), Ok(true));

    task.invoke().unwrap();
    assert_eq!(future.get(), Ok(42));

    assert!(task.is_empty());
    assert_eq!(task.invoke(), Err(TaskError::BadTaskAccess));
    assert_eq!(task.ready(), Err(TaskError::BadTaskAccess));
  }

  #[test]
  fn awaitable_readiness_follows_operands() {
    let (dependency, pending) = promise::<u8>();
    let (task, _future) =
      make_awaitable(|x: u8, y: u8| x + y, (pending, immediate(1)));

    assert_eq!(task.ready(), Ok(false));
    dependency.set(2);
    assert_eq!(task.ready(), Ok(true));
  }

  #[test]
  fn awaitable_with_only_immediates_is_ready() {
    let (task, _future) =
      make_awaitable(|x: u8| x, (immediate(1u8),));
    assert_eq!(task.ready(), Ok(true));
  }

  #[test]
  fn panic_is_published_not_propagated() {
    let (mut task, future) =
      make_ready(|| -> u8 { panic!("boom") }, ());

    task.invoke().unwrap();
    assert_eq!(future.get(), Err(FutureError::Panicked));
  }

  #[test]
  fn dependency_failure_short_circuits() {
    let (failing, pending) = promise::<u8>();
    failing.fail(FutureError::Panicked);

    let (mut task, future) = make_awaitable(|x: u8| x + 1, (pending,));
    task.invoke().unwrap();
    assert_eq!(future.get(), Err(FutureError::Panicked));
  }

  #[test]
  fn dropped_task_abandons_its_future() {
    let (task, future) = make_ready(|| 5u8, ());
    drop(task);
    assert_eq!(future.get(), Err(FutureError::Abandoned));
  }

  #[test]
  fn awaitable_macro_mixes_plain_and_future_arguments() {
    let (dependency, pending) = promise::<u32>();
    let (mut task, future) =
      crate::awaitable!(|x: u32, y: u32, z: u32| x + y + z, pending, 2, 3);

    assert_eq!(task.ready(), Ok(false));
    dependency.set(1);

    task.invoke().unwrap();
    assert_eq!(future.get(), Ok(6));
  }
}
