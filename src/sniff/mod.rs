//! Transparent ClientHello sniffing for accepted connections.
//!
//! [`SniffListener`] wraps an acceptor, and every connection it accepts is a
//! [`SniffStream`]. The first reads on that stream are inspected for a TLS
//! handshake record carrying a ClientHello; the raw ClientHello body (or the
//! reason it could not be extracted) is handed to a [`ClientHelloObserver`]
//! exactly once, after which the stream is a plain pass-through. Reads return
//! exactly what the inner stream produced, and writes are never touched.

mod accept;
mod error;
mod observer;
pub mod parser;
pub mod pool;
mod state;
mod stream;

#[cfg(feature = "axum-server")]
pub use self::accept::SniffAcceptor;
pub use self::{
    accept::{Accept, SniffListener},
    error::SniffError,
    observer::{observer_fn, ClientHelloObserver, FnObserver},
    parser::ParseOutcome,
    pool::{BufferPool, PooledBuffer},
    stream::SniffStream,
};
