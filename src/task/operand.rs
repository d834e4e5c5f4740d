use crate::sync::{Future, FutureError};

/// One bound argument slot of an awaitable task: either a plain value or a
/// [`Future`] consumed at invoke time.
pub trait Operand {
  type Value;

  fn is_ready(&self) -> bool;

  fn resolve(self) -> Result<Self::Value, FutureError>;
}

/// A plain value passed through to the callable unchanged.
pub struct Immediate<T>(T);

pub fn immediate<T>(value: T) -> Immediate<T> {
  Immediate(value)
}

impl<T> Operand for Immediate<T> {
  type Value = T;

  fn is_ready(&self) -> bool {
    true
  }

  fn resolve(self) -> Result<T, FutureError> {
    Ok(self.0)
  }
}

impl<T> Operand for Future<T> {
  type Value = T;

  fn is_ready(&self) -> bool {
    Future::is_ready(self)
  }

  fn resolve(self) -> Result<T, FutureError> {
    self.get()
  }
}

/// Fallback conversion used by the [`awaitable!`](crate::awaitable) macro:
/// anything that is not a [`Future`] becomes an [`Immediate`] operand. The
/// macro uses method-call syntax, so the inherent `into_operand` methods
/// below take precedence over this blanket implementation.
pub trait IntoOperand: Sized {
  fn into_operand(self) -> Immediate<Self> {
    Immediate(self)
  }
}

impl<T> IntoOperand for T {}

impl<T> Future<T> {
  // Shadows IntoOperand::into_operand so a future argument stays a
  // dependency instead of being wrapped as a plain value.
  pub fn into_operand(self) -> Future<T> {
    self
  }
}

impl<T> Immediate<T> {
  // Keeps an explicitly wrapped value from being wrapped twice.
  pub fn into_operand(self) -> Immediate<T> {
    self
  }
}

/// A tuple of [`Operand`]s: aggregate readiness and resolution.
pub trait OperandList {
  type Values;

  fn ready(&self) -> bool;

  /// Resolves each operand in order; the first failure wins.
  fn resolve(self) -> Result<Self::Values, FutureError>;
}

/// Tuple application: invoke a callable with an unpacked argument tuple.
pub trait Call<Args> {
  type Output;

  fn call(self, args: Args) -> Self::Output;
}

macro_rules! tuple_impls {
  ($( ($($T:ident),*) ),+ $(,)?) => {$(
    impl<$($T: Operand),*> OperandList for ($($T,)*) {
      type Values = ($($T::Value,)*);

      fn ready(&self) -> bool {
        #[allow(non_snake_case)]
        let ($($T,)*) = self;
        true $(&& $T.is_ready())*
      }

      fn resolve(self) -> Result<Self::Values, FutureError> {
        #[allow(non_snake_case)]
        let ($($T,)*) = self;
        Ok(($($T.resolve()?,)*))
      }
    }

    impl<Fun, Out, $($T),*> Call<($($T,)*)> for Fun
    where
      Fun: FnOnce($($T),*) -> Out,
    {
      type Output = Out;

      fn call(self, args: ($($T,)*)) -> Out {
        #[allow(non_snake_case)]
        let ($($T,)*) = args;
        self($($T),*)
      }
    }
  )+};
}

tuple_impls! {
  (),
  (A),
  (A, B),
  (A, B, C),
  (A, B, C, D),
  (A, B, C, D, E),
  (A, B, C, D, E, F),
  (A, B, C, D, E, F, G),
  (A, B, C, D, E, F, G, H),
}
