/// Builds an awaitable task from a mixed argument list.
///
/// Each argument that is a [`sync::Future`](crate::sync::Future) stays a
/// dependency and is resolved at invoke time; every other argument is
/// wrapped as an [`Immediate`](crate::task::Immediate) operand. This is the
/// per-slot dispatch that [`make_awaitable`](crate::task::make_awaitable)
/// cannot do on its own, done by method-resolution precedence at the
/// expansion site.
///
/// Expands to `(Task, Future<R>)`, exactly like the factory functions.
///
/// # Examples
///
/// ```
/// use weft::awaitable;
/// use weft::sync::promise;
///
/// let (dependency, pending) = promise::<u32>();
/// let (mut task, product) = awaitable!(|x: u32, y: u32| x * y, pending, 10);
///
/// assert_eq!(task.ready(), Ok(false));
/// dependency.set(4);
///
/// task.invoke().unwrap();
/// assert_eq!(product.get(), Ok(40));
/// ```
#[macro_export]
macro_rules! awaitable {
  ($f:expr $(, $arg:expr)* $(,)?) => {{
    #[allow(unused_imports)]
    use $crate::task::IntoOperand as _;
    $crate::task::make_awaitable($f, ($( ($arg).into_operand(), )*))
  }};
}
