mod future;
pub use future::*;
