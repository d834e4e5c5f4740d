use std::{
  any::Any,
  panic::{self, AssertUnwindSafe},
};

use crate::{
  sync::{FutureError, Promise},
  task::operand::{Call, OperandList},
};

/// The type-erasure seam: every task model can answer a readiness poll and
/// be invoked exactly once.
pub(crate) trait TaskModel: Send {
  fn invoke(self: Box<Self>);
  fn ready(&self) -> bool;
}

/// Callable plus plain argument tuple; invocation never blocks.
pub(crate) struct ReadyModel<F, Args, R> {
  callable: F,
  args: Args,
  promise: Promise<R>,
}

impl<F, Args, R> ReadyModel<F, Args, R> {
  pub(crate) fn new(callable: F, args: Args, promise: Promise<R>) -> Self {
    Self { callable, args, promise }
  }
}

impl<F, Args, R> TaskModel for ReadyModel<F, Args, R>
where
  F: Call<Args, Output = R> + Send,
  Args: Send,
  R: Send,
{
  fn invoke(self: Box<Self>) {
    let Self { callable, args, promise } = *self;
    publish(promise, move || callable.call(args));
  }

  fn ready(&self) -> bool {
    true
  }
}

/// Callable plus operand tuple; some operands may be futures that are
/// resolved (blocking) at invoke time.
pub(crate) struct AwaitableModel<F, Ops, R> {
  callable: F,
  operands: Ops,
  promise: Promise<R>,
}

impl<F, Ops, R> AwaitableModel<F, Ops, R> {
  pub(crate) fn new(callable: F, operands: Ops, promise: Promise<R>) -> Self {
    Self { callable, operands, promise }
  }
}

impl<F, Ops, R> TaskModel for AwaitableModel<F, Ops, R>
where
  Ops: OperandList + Send,
  F: Call<Ops::Values, Output = R> + Send,
  R: Send,
{
  fn invoke(self: Box<Self>) {
    let Self { callable, operands, promise } = *self;

    let values = match operands.resolve() {
      Ok(values) => values,
      Err(error) => {
        // A dependency failed; propagate it instead of calling.
        promise.fail(error);
        return;
      }
    };

    publish(promise, move || callable.call(values));
  }

  fn ready(&self) -> bool {
    self.operands.ready()
  }
}

/// Runs the callable and routes its outcome into the promise. Panics are
/// captured so the invoking worker survives user-code failures.
fn publish<R>(promise: Promise<R>, run: impl FnOnce() -> R) {
  match panic::catch_unwind(AssertUnwindSafe(run)) {
    Ok(value) => promise.set(value),
    Err(payload) => {
      tracing::error!(reason = panic_reason(&payload), "task panicked");
      promise.fail(FutureError::Panicked);
    }
  }
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&'static str>() {
    message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message
  } else {
    "<opaque panic payload>"
  }
}
