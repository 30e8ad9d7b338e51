use std::{io, mem, sync::Arc};

use super::{
    parser::{self, ParseOutcome, RECORD_HEADER_LEN},
    pool::{BufferPool, PooledBuffer},
    ClientHelloObserver, SniffError,
};

enum SniffState {
    /// Still looking for the ClientHello. `pending` only exists once a read
    /// came up short, and holds a prefix of the record being received.
    Sniffing { pending: Option<PooledBuffer> },
    /// The observer has been called. Nothing is inspected any more.
    PassThrough,
}

/// Per-connection sniffing state, shared by the async and blocking streams.
pub(crate) struct Sniffer<O> {
    state: SniffState,
    observer: Arc<O>,
    pool: Arc<BufferPool>,
}

impl<O> Sniffer<O> {
    pub(crate) fn new(observer: Arc<O>, pool: Arc<BufferPool>) -> Self {
        Self {
            state: SniffState::Sniffing { pending: None },
            observer,
            pool,
        }
    }

    #[inline]
    pub(crate) fn is_sniffing(&self) -> bool {
        matches!(self.state, SniffState::Sniffing { .. })
    }

    /// Bytes held across reads, if any.
    pub(crate) fn buffered(&self) -> usize {
        match &self.state {
            SniffState::Sniffing { pending: Some(buf) } => buf.len(),
            _ => 0,
        }
    }

    /// Returns any pending buffer to the pool without calling the observer.
    pub(crate) fn release(&mut self) {
        if let SniffState::Sniffing { pending } = &mut self.state {
            *pending = None;
        }
    }

    /// Takes the pending buffer and switches to pass-through.
    fn finish(&mut self) -> Option<Option<PooledBuffer>> {
        match mem::replace(&mut self.state, SniffState::PassThrough) {
            SniffState::Sniffing { pending } => Some(pending),
            SniffState::PassThrough => None,
        }
    }

    /// Feeds the bytes delivered by one successful read. `eof` is set when
    /// the read reported end of stream.
    pub(crate) fn feed<I>(&mut self, conn: &I, new: &[u8], eof: bool)
    where
        O: ClientHelloObserver<I>,
    {
        let SniffState::Sniffing { pending } = &mut self.state else {
            return;
        };

        if new.is_empty() && !eof {
            return;
        }

        if let Some(buf) = pending.as_mut() {
            append_record_bytes(buf, new);
        }

        let need_more =
            parser::parse_record(pending.as_deref().unwrap_or(new)).is_need_more_data();

        if need_more && !eof {
            if pending.is_none() {
                let mut buf = self.pool.acquire();
                append_record_bytes(&mut buf, new);
                *pending = Some(buf);
            }
            tracing::trace!(
                buffered = pending.as_deref().map_or(0, <[u8]>::len),
                "client hello record incomplete"
            );
            return;
        }

        let Some(pending) = self.finish() else {
            return;
        };

        let hello = match parser::parse(pending.as_deref().unwrap_or(new)) {
            ParseOutcome::Complete(body) => Ok(body),
            ParseOutcome::Invalid(err) => Err(err),
            ParseOutcome::NeedMoreData => Err(SniffError::UnexpectedEof),
        };

        match &hello {
            Ok(body) => tracing::debug!(len = body.len(), "client hello extracted"),
            Err(err) => tracing::debug!("client hello not extracted: {err}"),
        }

        self.observer.on_client_hello(conn, hello.as_deref());
    }

    /// Handles a failed read. Unrecoverable errors end sniffing and are
    /// reported to the observer; the same error is handed back for the caller.
    pub(crate) fn fail<I>(&mut self, conn: &I, err: io::Error) -> io::Error
    where
        O: ClientHelloObserver<I>,
    {
        if is_recoverable(&err) {
            return err;
        }

        let Some(pending) = self.finish() else {
            return err;
        };

        // Recycle before reporting, nothing sniffed so far is handed out.
        drop(pending);

        tracing::debug!("client hello sniffing aborted by transport error: {err}");
        let err = SniffError::Transport(err);
        self.observer.on_client_hello(conn, Err(&err));
        err.into()
    }
}

/// Appends only the bytes that belong to the record being reassembled, so
/// the buffer never holds the start of a later record.
fn append_record_bytes(buf: &mut PooledBuffer, mut new: &[u8]) {
    if buf.len() < RECORD_HEADER_LEN {
        let take = new.len().min(RECORD_HEADER_LEN - buf.len());
        buf.extend_bounded(&new[..take]);
        new = &new[take..];
    }

    let take = parser::record_remaining(buf).map_or(new.len(), |left| left.min(new.len()));
    buf.extend_bounded(&new[..take]);
}

/// Retry signals rather than failures; the same read may simply be issued
/// again. Deadlines are failures and end sniffing.
fn is_recoverable(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock)
}
