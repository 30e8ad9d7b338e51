//! Transparent TLS ClientHello sniffing for accepted connections.
//!
//! Wrap a listener in [`SniffListener`] (or a single connection in
//! [`SniffStream`]) and every connection hands its raw ClientHello to a
//! [`ClientHelloObserver`] before the real TLS stack ever sees it, without
//! altering a single byte the reader receives.

pub mod sniff;
pub mod tls;

#[cfg(feature = "axum-server")]
pub use sniff::SniffAcceptor;
pub use sniff::{
    observer_fn, Accept, BufferPool, ClientHelloObserver, SniffError, SniffListener, SniffStream,
};
