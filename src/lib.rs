//! # weft
//!
//! A multi-queue, work-stealing task scheduler for compute-bound work,
//! with first-class *dataflow tasks*: tasks whose arguments may themselves
//! be pending results of other tasks.
//!
//! The scheduler is meant to be embedded in a larger host (a game or
//! simulation engine): `N` worker threads chew through background work
//! while a distinguished main-thread queue holds tasks that must run on
//! the host thread, drained by [`TaskSystem::run_on_main`] once per frame
//! or so.
//!
//! ```
//! use weft::TaskSystem;
//!
//! # fn main() -> std::io::Result<()> {
//! let system = TaskSystem::builder().num_workers(2).build()?;
//!
//! let base = system.push_ready(|| 20u32, ());
//! let answer = system.push_awaitable(|x: u32| x + 22, (base,));
//!
//! assert_eq!(answer.get(), Ok(42));
//! # Ok(())
//! # }
//! ```
//!
//! Dependencies are ordinary [`sync::Future`] values, so a dataflow graph
//! is written by passing one task's future as another task's argument;
//! the [`awaitable!`] macro mixes futures and plain values freely. Queues
//! skip over tasks whose dependencies are still pending, so a chain of
//! dependent tasks cannot starve runnable work behind it.

mod macros;

mod loom;

pub mod runtime;
pub mod sync;
pub mod task;

pub use runtime::TaskSystem;
