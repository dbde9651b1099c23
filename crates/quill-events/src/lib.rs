mod lifecycle;
mod listener;

pub use lifecycle::*;
pub use listener::*;
