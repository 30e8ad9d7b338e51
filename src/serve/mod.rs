mod report;
mod signal;

use std::{io, str::FromStr, sync::Arc, time::Duration};

use hellosniff::{Accept, BufferPool, SniffListener, SniffStream};
use tokio::{
    io::copy_bidirectional,
    net::{TcpListener, TcpStream},
    sync::Semaphore,
    task::JoinSet,
    time::{sleep, timeout},
};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use self::report::ReportObserver;
use crate::{error::Error, Config, Result};

/// How long open relays may keep running once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Back-off after a failed accept, e.g. when out of file descriptors.
const ACCEPT_ERROR_DELAY: Duration = Duration::from_millis(100);

#[tokio::main]
pub async fn run(config: Config) -> Result<()> {
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_max_level(Level::from_str(&config.log).unwrap_or(Level::INFO))
            .finish(),
    )?;

    tracing::info!("OS: {}", std::env::consts::OS);
    tracing::info!("Arch: {}", std::env::consts::ARCH);
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Concurrent limit: {}", config.concurrent);
    tracing::info!("Buffer pool size: {}", config.pool_size);
    tracing::info!("Upstream: {}", config.upstream);
    tracing::info!("Bind address: {}", config.bind);

    if config.concurrent == 0 {
        return Err(Error::NoConcurrency);
    }

    let observer = Arc::new(ReportObserver::default());
    let pool = Arc::new(BufferPool::new(config.pool_size));
    let listener = SniffListener::with_pool(
        TcpListener::bind(config.bind).await?,
        observer.clone(),
        pool,
    );
    tracing::info!("Listening on: {}", listener.local_addr()?);

    let limit = Arc::new(Semaphore::new(config.concurrent));
    let upstream: Arc<str> = Arc::from(config.upstream);
    let connect_timeout = Duration::from_secs(config.connect_timeout);
    let mut connections = JoinSet::new();

    let shutdown = signal::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        while connections.try_join_next().is_some() {}

        let permit = tokio::select! {
            _ = &mut shutdown => break,
            permit = limit.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!("accept error: {err}");
                    sleep(ACCEPT_ERROR_DELAY).await;
                    continue;
                }
            },
        };

        let upstream = upstream.clone();
        connections.spawn(async move {
            let _permit = permit;
            match relay(stream, &upstream, connect_timeout).await {
                Ok((sent, received)) => {
                    tracing::debug!(%peer, sent, received, "relay finished")
                }
                Err(err) => tracing::debug!(%peer, "relay closed: {err}"),
            }
        });
    }

    drop(listener);
    signal::graceful_shutdown(connections, SHUTDOWN_GRACE).await;

    let (extracted, rejected) = observer.totals();
    tracing::info!("ClientHello extracted: {extracted}, rejected: {rejected}");
    Ok(())
}

/// Connects to `upstream` and shuttles bytes both ways until either side
/// closes. The ClientHello is reported as a side effect of the first reads.
async fn relay(
    mut inbound: SniffStream<TcpStream, ReportObserver>,
    upstream: &str,
    connect_timeout: Duration,
) -> io::Result<(u64, u64)> {
    let mut outbound = timeout(connect_timeout, TcpStream::connect(upstream))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "upstream connect timed out"))??;
    outbound.set_nodelay(true)?;

    copy_bidirectional(&mut inbound, &mut outbound).await
}
