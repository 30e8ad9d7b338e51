use super::SniffError;

/// Receives the outcome of sniffing one connection.
///
/// `conn` is the wrapped connection. It MUST NOT be read from or written to,
/// doing so corrupts the stream for the real reader. `hello` borrows a
/// buffer that is recycled as soon as the call returns, so copy it if it
/// needs to outlive the call.
///
/// Called at most once per connection, synchronously from inside the read
/// that completed or ruled out the ClientHello.
pub trait ClientHelloObserver<I>: Send + Sync {
    fn on_client_hello(&self, conn: &I, hello: Result<&[u8], &SniffError>);
}

/// Adapts a closure into a [`ClientHelloObserver`].
#[derive(Clone, Copy)]
pub struct FnObserver<F>(F);

/// Builds an observer out of a closure.
pub fn observer_fn<I, F>(f: F) -> FnObserver<F>
where
    F: Fn(&I, Result<&[u8], &SniffError>) + Send + Sync,
{
    FnObserver(f)
}

impl<I, F> ClientHelloObserver<I> for FnObserver<F>
where
    F: Fn(&I, Result<&[u8], &SniffError>) + Send + Sync,
{
    #[inline]
    fn on_client_hello(&self, conn: &I, hello: Result<&[u8], &SniffError>) {
        (self.0)(conn, hello)
    }
}

impl<I, O> ClientHelloObserver<I> for std::sync::Arc<O>
where
    O: ClientHelloObserver<I> + ?Sized,
{
    #[inline]
    fn on_client_hello(&self, conn: &I, hello: Result<&[u8], &SniffError>) {
        (**self).on_client_hello(conn, hello)
    }
}
