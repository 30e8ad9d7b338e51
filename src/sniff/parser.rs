//! Record-layer and handshake-layer framing for the first TLS flight.
//!
//! See: <https://www.rfc-editor.org/rfc/rfc8446#section-5.1>

use super::SniffError;

/// Content type of a handshake record.
pub const CONTENT_TYPE_HANDSHAKE: u8 = 22;

/// Handshake message type of a ClientHello.
pub const HANDSHAKE_TYPE_CLIENT_HELLO: u8 = 1;

/// Size of the record header: type, version and length.
pub const RECORD_HEADER_LEN: usize = 1 + 2 + 2;

/// Size of the handshake header: message type and 24-bit length.
pub const HANDSHAKE_HEADER_LEN: usize = 1 + 3;

/// Maximum length of a TLSPlaintext fragment.
pub const MAX_RECORD_LEN: u16 = 16384;

/// Upper bound on bytes that ever need to be held to see one whole record.
pub const MAX_RECORD_BUFFER_LEN: usize = RECORD_HEADER_LEN + MAX_RECORD_LEN as usize;

const SSLV2_MARKER: u8 = 0x80;
const TLS_MAJOR_VERSION: u8 = 3;

/// Result of one attempt to frame a message out of a byte buffer.
#[derive(Debug)]
pub enum ParseOutcome<'a> {
    /// The payload is fully present.
    Complete(&'a [u8]),
    /// The bytes seen so far are a valid prefix; more are required.
    NeedMoreData,
    /// The bytes can never frame a valid message.
    Invalid(SniffError),
}

impl<'a> ParseOutcome<'a> {
    /// Applies `f` to a complete payload, leaving the other states untouched.
    #[inline]
    pub fn and_then(self, f: impl FnOnce(&'a [u8]) -> ParseOutcome<'a>) -> ParseOutcome<'a> {
        match self {
            ParseOutcome::Complete(payload) => f(payload),
            other => other,
        }
    }

    #[inline]
    pub fn is_need_more_data(&self) -> bool {
        matches!(self, ParseOutcome::NeedMoreData)
    }
}

/// Frames one handshake record and returns its payload.
pub fn parse_record(buf: &[u8]) -> ParseOutcome<'_> {
    let Some((header, payload)) = buf.split_first_chunk::<RECORD_HEADER_LEN>() else {
        return ParseOutcome::NeedMoreData;
    };

    let [typ, major, minor, len_hi, len_lo] = *header;

    if typ != CONTENT_TYPE_HANDSHAKE {
        if typ == SSLV2_MARKER {
            return ParseOutcome::Invalid(SniffError::Sslv2Detected);
        }
        return ParseOutcome::Invalid(SniffError::NotHandshakeRecord);
    }

    if major != TLS_MAJOR_VERSION {
        let version = u16::from_be_bytes([major, minor]);
        return ParseOutcome::Invalid(SniffError::UnsupportedRecordVersion(version));
    }

    let len = u16::from_be_bytes([len_hi, len_lo]);
    if len > MAX_RECORD_LEN {
        return ParseOutcome::Invalid(SniffError::RecordTooLarge(len));
    }

    match payload.get(..usize::from(len)) {
        Some(payload) => ParseOutcome::Complete(payload),
        None => ParseOutcome::NeedMoreData,
    }
}

/// Frames a ClientHello out of a complete handshake record payload and
/// returns its body. Bytes after the declared body are ignored.
pub fn parse_client_hello(payload: &[u8]) -> ParseOutcome<'_> {
    // The record is already whole, so a short header can never be completed.
    let Some((header, body)) = payload.split_first_chunk::<HANDSHAKE_HEADER_LEN>() else {
        return ParseOutcome::Invalid(SniffError::HandshakeHeaderTooShort);
    };

    let [typ, len @ ..] = *header;
    if typ != HANDSHAKE_TYPE_CLIENT_HELLO {
        return ParseOutcome::Invalid(SniffError::NotClientHello(typ));
    }

    let len = u32::from_be_bytes([0, len[0], len[1], len[2]]) as usize;
    match body.get(..len) {
        Some(body) => ParseOutcome::Complete(body),
        None => ParseOutcome::Invalid(SniffError::InvalidHandshakeLength),
    }
}

/// Runs both parsers over `buf`.
#[inline]
pub fn parse(buf: &[u8]) -> ParseOutcome<'_> {
    parse_record(buf).and_then(parse_client_hello)
}

/// Number of bytes still missing before `buf` holds the whole record it
/// starts, if the header is known.
pub(crate) fn record_remaining(buf: &[u8]) -> Option<usize> {
    let header = buf.first_chunk::<RECORD_HEADER_LEN>()?;
    let len = usize::from(u16::from_be_bytes([header[3], header[4]]));
    Some((RECORD_HEADER_LEN + len).saturating_sub(buf.len()))
}
