use std::net::SocketAddr;

use clap::Args;

#[derive(Args, Clone)]
pub struct Config {
    /// Debug mode
    #[clap(long, default_value = "info", env = "HELLOSNIFF_LOG")]
    pub log: String,

    /// Bind address
    #[clap(short, long, default_value = "0.0.0.0:8443")]
    pub bind: SocketAddr,

    /// Upstream TLS server every connection is relayed to
    #[clap(short, long)]
    pub upstream: String,

    /// Concurrent connections
    #[clap(short, long, default_value = "1024")]
    pub concurrent: usize,

    /// Idle reassembly buffers kept for reuse
    #[clap(short, long, default_value = "64")]
    pub pool_size: usize,

    /// Upstream connect timeout (seconds)
    #[clap(short = 't', long, default_value = "10")]
    pub connect_timeout: u64,
}
