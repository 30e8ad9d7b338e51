//! Readable names for the protocol versions and cipher suites that show up
//! in a ClientHello. Pure lookups; the sniffing layer never consults them.

#[macro_use]
mod macros;
mod enums;

pub use self::enums::{CipherSuite, TlsVersion};
