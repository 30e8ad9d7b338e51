use std::{io, net::SocketAddr, sync::Arc};

use futures_util::future::BoxFuture;
use tokio::net::{TcpListener, TcpStream};

use super::{pool::BufferPool, stream::SniffStream};

/// Anything that hands out accepted connections.
pub trait Accept: Send + Sync {
    type Stream: Send + 'static;
    type Addr: Send + 'static;

    /// Waits for the next connection. Errors are those of the underlying
    /// acceptor.
    fn accept(&self) -> BoxFuture<'_, io::Result<(Self::Stream, Self::Addr)>>;

    fn local_addr(&self) -> io::Result<Self::Addr>;
}

impl Accept for TcpListener {
    type Stream = TcpStream;
    type Addr = SocketAddr;

    #[inline]
    fn accept(&self) -> BoxFuture<'_, io::Result<(Self::Stream, Self::Addr)>> {
        Box::pin(TcpListener::accept(self))
    }

    #[inline]
    fn local_addr(&self) -> io::Result<Self::Addr> {
        TcpListener::local_addr(self)
    }
}

#[cfg(target_family = "unix")]
impl Accept for tokio::net::UnixListener {
    type Stream = tokio::net::UnixStream;
    type Addr = tokio::net::unix::SocketAddr;

    #[inline]
    fn accept(&self) -> BoxFuture<'_, io::Result<(Self::Stream, Self::Addr)>> {
        Box::pin(tokio::net::UnixListener::accept(self))
    }

    #[inline]
    fn local_addr(&self) -> io::Result<Self::Addr> {
        tokio::net::UnixListener::local_addr(self)
    }
}

/// SniffListener wraps an acceptor and wraps every connection it accepts in a
/// [`SniffStream`] bound to the same observer and buffer pool.
pub struct SniffListener<L, O> {
    inner: L,
    observer: Arc<O>,
    pool: Arc<BufferPool>,
}

impl<L, O> SniffListener<L, O> {
    /// Create a new [`SniffListener`] that reassembles through the shared pool.
    pub fn new(inner: L, observer: Arc<O>) -> Self {
        Self::with_pool(inner, observer, BufferPool::shared())
    }

    /// Create a new [`SniffListener`] that reassembles through `pool`.
    pub fn with_pool(inner: L, observer: Arc<O>, pool: Arc<BufferPool>) -> Self {
        Self {
            inner,
            observer,
            pool,
        }
    }

    #[inline]
    pub fn get_ref(&self) -> &L {
        &self.inner
    }

    #[inline]
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub fn into_inner(self) -> L {
        self.inner
    }

    /// Wraps a connection accepted elsewhere.
    pub fn wrap<I>(&self, stream: I) -> SniffStream<I, O> {
        SniffStream::with_pool(stream, self.observer.clone(), self.pool.clone())
    }
}

impl<L, O> Accept for SniffListener<L, O>
where
    L: Accept,
    O: Send + Sync + 'static,
{
    type Stream = SniffStream<L::Stream, O>;
    type Addr = L::Addr;

    fn accept(&self) -> BoxFuture<'_, io::Result<(Self::Stream, Self::Addr)>> {
        Box::pin(async move {
            let (stream, addr) = self.inner.accept().await?;
            tracing::trace!("accepted connection, sniffing client hello");
            Ok((self.wrap(stream), addr))
        })
    }

    #[inline]
    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

#[cfg(feature = "axum-server")]
mod server {
    use std::sync::Arc;

    use axum_server::accept::{Accept, DefaultAcceptor};

    use crate::sniff::{pool::BufferPool, stream::SniffStream};

    /// SniffAcceptor sits underneath another `axum-server` acceptor (for
    /// example a rustls acceptor) and hands it streams that sniff the
    /// ClientHello on their way through.
    pub struct SniffAcceptor<O, A = DefaultAcceptor> {
        inner: A,
        observer: Arc<O>,
        pool: Arc<BufferPool>,
    }

    impl<O, A: Clone> Clone for SniffAcceptor<O, A> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
                observer: self.observer.clone(),
                pool: self.pool.clone(),
            }
        }
    }

    impl<O> SniffAcceptor<O> {
        /// Create a new [`SniffAcceptor`] over the default acceptor.
        pub fn new(observer: Arc<O>) -> Self {
            Self {
                inner: DefaultAcceptor::new(),
                observer,
                pool: BufferPool::shared(),
            }
        }
    }

    impl<O, A> SniffAcceptor<O, A> {
        /// Replaces the acceptor that receives the sniffing streams.
        pub fn acceptor<B>(self, inner: B) -> SniffAcceptor<O, B> {
            SniffAcceptor {
                inner,
                observer: self.observer,
                pool: self.pool,
            }
        }

        pub fn pool(mut self, pool: Arc<BufferPool>) -> Self {
            self.pool = pool;
            self
        }
    }

    impl<O, A, I, S> Accept<I, S> for SniffAcceptor<O, A>
    where
        A: Accept<SniffStream<I, O>, S>,
    {
        type Stream = A::Stream;
        type Service = A::Service;
        type Future = A::Future;

        #[inline]
        fn accept(&self, stream: I, service: S) -> Self::Future {
            let stream = SniffStream::with_pool(stream, self.observer.clone(), self.pool.clone());
            self.inner.accept(stream, service)
        }
    }
}

#[cfg(feature = "axum-server")]
pub use self::server::SniffAcceptor;

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::sniff::{observer_fn, SniffError};

    struct Failing;

    impl Accept for Failing {
        type Stream = TcpStream;
        type Addr = SocketAddr;

        fn accept(&self) -> BoxFuture<'_, io::Result<(Self::Stream, Self::Addr)>> {
            Box::pin(async {
                Err::<(TcpStream, SocketAddr), _>(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "nope",
                ))
            })
        }

        fn local_addr(&self) -> io::Result<Self::Addr> {
            Err(io::Error::new(io::ErrorKind::NotConnected, "unbound"))
        }
    }

    #[tokio::test]
    async fn accept_errors_propagate_unchanged() {
        let observer = Arc::new(observer_fn(
            |_: &TcpStream, _: Result<&[u8], &SniffError>| panic!("must not be called"),
        ));
        let listener = SniffListener::new(Failing, observer);

        let err = match listener.accept().await {
            Ok(_) => panic!("accept should fail"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(err.to_string(), "nope");
        assert_eq!(
            listener.local_addr().unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
    }

    #[tokio::test]
    async fn every_accepted_connection_is_sniffed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer = Arc::new(observer_fn(
            move |conn: &TcpStream, hello: Result<&[u8], &SniffError>| {
                let peer = conn.peer_addr().unwrap();
                sink.lock().unwrap().push((peer, hello.map(<[u8]>::to_vec).ok()));
            },
        ));

        let inner = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listener = SniffListener::with_pool(inner, observer, Arc::new(BufferPool::new(2)));
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut peers = Vec::new();
            for body in [&b"one"[..], &b"two"[..]] {
                let mut stream = TcpStream::connect(addr).await.unwrap();
                peers.push(stream.local_addr().unwrap());
                let mut record = vec![0x16, 0x03, 0x01, 0x00, (4 + body.len()) as u8];
                record.extend_from_slice(&[0x01, 0x00, 0x00, body.len() as u8]);
                record.extend_from_slice(body);
                stream.write_all(&record).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            peers
        });

        for _ in 0..2 {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            assert_eq!(received[0], 0x16);
            assert!(!stream.is_sniffing());
        }

        let peers = client.await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (peers[0], Some(b"one".to_vec())),
                (peers[1], Some(b"two".to_vec())),
            ]
        );
    }

    #[cfg(feature = "axum-server")]
    #[tokio::test]
    async fn axum_acceptor_hands_out_sniffing_streams() {
        use axum_server::accept::Accept as _;

        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let observer = Arc::new(observer_fn(
            move |_: &tokio::io::DuplexStream, hello: Result<&[u8], &SniffError>| {
                *sink.lock().unwrap() = Some(hello.map(<[u8]>::to_vec).ok());
            },
        ));

        let (mut client, server) = tokio::io::duplex(64);
        let acceptor = SniffAcceptor::new(observer).pool(Arc::new(BufferPool::new(1)));
        let (mut stream, service) = acceptor.clone().accept(server, "service").await.unwrap();
        assert_eq!(service, "service");

        client
            .write_all(&[0x16, 0x03, 0x03, 0x00, 0x06, 0x01, 0x00, 0x00, 0x02, 0xca, 0xfe])
            .await
            .unwrap();
        drop(client);

        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        assert_eq!(received.len(), 11);
        assert_eq!(*seen.lock().unwrap(), Some(Some(vec![0xca, 0xfe])));
    }
}
