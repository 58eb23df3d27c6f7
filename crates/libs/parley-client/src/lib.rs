//! Async correlation client for the parley engine.
//!
//! Many requests share one duplex channel with an unbounded stream of push
//! notifications. Each request carries a fresh correlation token; the engine
//! echoes it on the reply, and the [`Client`] read loop uses it to resolve the
//! right pending call. Documents that answer no pending call are decoded as
//! push events and fanned out by the [`Dispatcher`].
//!
//! ```ignore
//! let client = Client::<Update>::over_stream(stream, ClientConfig::default())?;
//! let mut events = client.subscribe();
//! let echo: EchoResult = client.request(Request::new("example.echo").with("value", "42")).await?;
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pending;
pub mod token;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, ConfigError};
pub use dispatch::{DispatchStats, Dispatcher, Notification, Subscription};
pub use error::{ClientError, TransportError};
pub use token::TokenGenerator;
pub use transport::{split_lines, FrameReader, FrameWriter, LineReader, LineWriter};

pub use parley_schema;
