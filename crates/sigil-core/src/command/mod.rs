//! Slash command descriptors, registry, and dispatch.

mod descriptor;
mod invocation;

pub use descriptor::{CommandDescriptor, find, help_order, registry};
pub use invocation::{Invocation, parse};
