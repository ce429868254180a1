//! Register bus backends
//!
//! Two implementations of [`RegisterBus`](crate::RegisterBus):
//!
//! - [`UioBus`] — memory-mapped access to real silicon through UIO
//! - [`SimBus`] — behavioral software model for development and tests

pub mod sim;
pub mod uio;

pub use sim::SimBus;
pub use uio::{MappedRegion, UioBus};
