//! Representative catalogue of engine shapes.
//!
//! Flat shapes are declared with [`shape!`](crate::shape) and polymorphic
//! categories with [`category!`](crate::category). Discriminants follow the
//! engine's lower-camel naming; the `example.*` shapes belong to the engine's
//! self-test surface.

mod call;
mod chat;
mod common;
mod connection;
mod example;
mod message;
mod update;

pub use call::*;
pub use chat::*;
pub use common::*;
pub use connection::*;
pub use example::*;
pub use message::*;
pub use update::*;
