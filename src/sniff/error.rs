use std::io;

/// Reasons a ClientHello could not be extracted from a connection.
///
/// These are classification outcomes delivered once to the observer. They
/// never replace the result of the read call that produced them.
#[derive(thiserror::Error, Debug)]
pub enum SniffError {
    #[error("record type is not handshake")]
    NotHandshakeRecord,

    /// No valid TLS record has a type of 0x80, but an SSLv2 handshake starts
    /// with a u16 length whose high bit is set and whose first record is
    /// always shorter than 256 bytes.
    #[error("unsupported SSLv2 handshake received")]
    Sslv2Detected,

    #[error("record has unsupported version {0:#06x}")]
    UnsupportedRecordVersion(u16),

    #[error("record length {0} is greater than maximum allowed")]
    RecordTooLarge(u16),

    #[error("handshake record is too short")]
    HandshakeHeaderTooShort,

    #[error("handshake record ({0}) is not ClientHello")]
    NotClientHello(u8),

    #[error("handshake record has invalid length")]
    InvalidHandshakeLength,

    #[error("stream ended before a complete ClientHello record was received")]
    UnexpectedEof,

    #[error(transparent)]
    Transport(#[from] io::Error),
}

impl From<SniffError> for io::Error {
    fn from(err: SniffError) -> Self {
        match err {
            SniffError::Transport(err) => err,
            SniffError::UnexpectedEof => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}
