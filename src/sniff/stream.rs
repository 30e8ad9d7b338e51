use std::{
    io::{self, IoSlice, Read, Write},
    pin::Pin,
    sync::Arc,
    task::{self, Poll},
};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::{pool::BufferPool, state::Sniffer, ClientHelloObserver};

pin_project_lite::pin_project! {
    /// A wrapper over a freshly accepted connection that extracts the TLS
    /// ClientHello from the first bytes read, hands it to an observer once,
    /// and from then on forwards reads and writes untouched.
    /// Every byte read through the wrapper is exactly what the inner stream
    /// produced.
    pub struct SniffStream<I, O> {
        #[pin]
        inner: I,
        sniffer: Sniffer<O>,
    }
}

impl<I, O> SniffStream<I, O> {
    /// Create a new [`SniffStream`] that reassembles through the shared pool.
    pub fn new(inner: I, observer: Arc<O>) -> Self {
        Self::with_pool(inner, observer, BufferPool::shared())
    }

    /// Create a new [`SniffStream`] that reassembles through `pool`.
    pub fn with_pool(inner: I, observer: Arc<O>, pool: Arc<BufferPool>) -> Self {
        Self {
            inner,
            sniffer: Sniffer::new(observer, pool),
        }
    }

    /// Returns `true` until the observer has been called.
    #[inline]
    pub fn is_sniffing(&self) -> bool {
        self.sniffer.is_sniffing()
    }

    /// Number of bytes currently held for reassembly.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.sniffer.buffered()
    }

    #[inline]
    pub fn get_ref(&self) -> &I {
        &self.inner
    }

    /// Mutable access to the inner stream. Reading from it directly while
    /// still sniffing hides those bytes from the sniffer.
    #[inline]
    pub fn get_mut(&mut self) -> &mut I {
        &mut self.inner
    }

    #[inline]
    pub fn get_pin_mut(self: Pin<&mut Self>) -> Pin<&mut I> {
        self.project().inner
    }

    /// Unwraps the inner stream. Any reassembly buffer goes back to the pool.
    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I, O> AsyncRead for SniffStream<I, O>
where
    I: AsyncRead,
    O: ClientHelloObserver<I>,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut this = self.project();

        if !this.sniffer.is_sniffing() {
            return this.inner.poll_read(cx, buf);
        }

        let len = buf.filled().len();
        let has_room = buf.remaining() > 0;

        match this.inner.as_mut().poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let new = &buf.filled()[len..];
                let eof = new.is_empty() && has_room;
                this.sniffer.feed(this.inner.as_ref().get_ref(), new, eof);
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(err)) => {
                Poll::Ready(Err(this.sniffer.fail(this.inner.as_ref().get_ref(), err)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<I, O> AsyncWrite for SniffStream<I, O>
where
    I: AsyncWrite,
{
    #[inline]
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.project().inner.poll_write(cx, buf)
    }

    #[inline]
    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        self.project().inner.poll_write_vectored(cx, bufs)
    }

    #[inline]
    fn poll_flush(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<io::Result<()>> {
        self.project().inner.poll_flush(cx)
    }

    #[inline]
    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<io::Result<()>> {
        let this = self.project();
        this.sniffer.release();
        this.inner.poll_shutdown(cx)
    }

    #[inline]
    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }
}

impl<I, O> Read for SniffStream<I, O>
where
    I: Read,
    O: ClientHelloObserver<I>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.sniffer.is_sniffing() {
            return self.inner.read(buf);
        }

        match self.inner.read(buf) {
            Ok(n) => {
                let eof = n == 0 && !buf.is_empty();
                self.sniffer.feed(&self.inner, &buf[..n], eof);
                Ok(n)
            }
            Err(err) => Err(self.sniffer.fail(&self.inner, err)),
        }
    }
}

impl<I, O> Write for SniffStream<I, O>
where
    I: Write,
{
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    #[inline]
    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        self.inner.write_vectored(bufs)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
