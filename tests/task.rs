#![cfg(not(loom))]

// Integration tests for the task object: construction, readiness,
// single-shot invocation and failure propagation through futures.
use weft::awaitable;
use weft::sync::{promise, FutureError};
use weft::task::{immediate, make_awaitable, make_ready, TaskError};

#[test]
fn ready_task_round_trip() {
  let (mut task, future) = make_ready(|a: i64, b: i64| a * b, (6, 7));

  assert_eq!(task.ready(), Ok(true));
  task.invoke().unwrap();
  assert_eq!(future.get(), Ok(42));
}

#[test]
fn invoking_twice_reports_bad_access() {
  let (mut task, _future) = make_ready(|| (), ());

  task.invoke().unwrap();
  assert!(task.is_empty());
  assert_eq!(task.invoke(), Err(TaskError::BadTaskAccess));
}

#[test]
fn awaitable_chain_of_three() {
  let (mut first, one) = make_ready(|| 1u32, ());
  let (mut second, two) = make_awaitable(|x: u32| x + 1, (one,));
  let (mut third, three) = awaitable!(|x: u32, y: u32| x + y, two, 1u32);

  // Invoke out of order: dependents resolve their inputs blockingly, and
  // every input here is already fulfilled by the time it is needed.
  first.invoke().unwrap();
  second.invoke().unwrap();
  third.invoke().unwrap();

  assert_eq!(three.get(), Ok(3));
}

#[test]
fn readiness_is_the_conjunction_of_operands() {
  let (left, left_future) = promise::<u8>();
  let (right, right_future) = promise::<u8>();

  let (task, _future) = make_awaitable(
    |a: u8, b: u8, c: u8| a + b + c,
    (left_future, immediate(1), right_future),
  );

  assert_eq!(task.ready(), Ok(false));
  left.set(2);
  assert_eq!(task.ready(), Ok(false));
  right.set(3);
  assert_eq!(task.ready(), Ok(true));
}

#[test]
fn panic_flows_through_dependent_futures() {
  let (mut failing, failed) = make_ready(|| -> u8 { panic!("boom") }, ());
  let (mut dependent, result) = make_awaitable(|x: u8| x, (failed,));

  failing.invoke().unwrap();
  dependent.invoke().unwrap();

  assert_eq!(result.get(), Err(FutureError::Panicked));
}

#[test]
fn dropping_an_unrun_dependency_abandons_the_dependent() {
  let (unrun, pending) = make_ready(|| 1u8, ());
  let (mut dependent, result) = make_awaitable(|x: u8| x, (pending,));

  drop(unrun);
  dependent.invoke().unwrap();

  assert_eq!(result.get(), Err(FutureError::Abandoned));
}
