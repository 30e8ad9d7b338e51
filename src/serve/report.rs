use std::{
    net::SocketAddr,
    sync::atomic::{AtomicU64, Ordering},
};

use hellosniff::{
    tls::{CipherSuite, TlsVersion},
    ClientHelloObserver, SniffError,
};
use nom::{
    bytes::complete::take,
    combinator::map,
    multi::{length_data, many0},
    number::complete::{be_u16, be_u8},
    IResult, Parser,
};
use serde::Serialize;
use tokio::net::TcpStream;

use crate::Result;

/// Number of raw ClientHello bytes echoed into each report.
const RAW_PREFIX_LEN: usize = 16;

/// The fixed-layout head of a ClientHello body. Extensions are left alone.
#[derive(Debug, Serialize, PartialEq)]
pub struct HelloSummary {
    tls_version: TlsVersion,
    session_id: String,
    ciphers: Vec<CipherSuite>,
    forward_secrecy: bool,
}

impl HelloSummary {
    pub fn parse(body: &[u8]) -> Option<Self> {
        parse_summary(body).ok().map(|(_, summary)| summary)
    }
}

fn parse_summary(i: &[u8]) -> IResult<&[u8], HelloSummary> {
    let (i, (version, _random, session_id, ciphers)) = (
        be_u16,
        take(32usize),
        length_data(be_u8),
        length_data(be_u16),
    )
        .parse(i)?;
    let (_, ciphers) = many0(map(be_u16, CipherSuite::from)).parse(ciphers)?;

    let forward_secrecy = ciphers.iter().any(|c| c.is_ecdhe() || c.is_tls13());
    Ok((
        i,
        HelloSummary {
            tls_version: TlsVersion::from(version),
            session_id: hex::encode(session_id),
            ciphers,
            forward_secrecy,
        },
    ))
}

/// One log line per sniffed connection.
#[derive(Debug, Serialize)]
pub struct HelloReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    peer: Option<SocketAddr>,

    len: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    raw_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    client_hello: Option<HelloSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl HelloReport {
    pub fn new(peer: Option<SocketAddr>, hello: Result<&[u8], &SniffError>) -> Self {
        match hello {
            Ok(body) => HelloReport {
                peer,
                len: body.len(),
                raw_prefix: Some(hex::encode(&body[..body.len().min(RAW_PREFIX_LEN)])),
                client_hello: HelloSummary::parse(body),
                error: None,
            },
            Err(err) => HelloReport {
                peer,
                len: 0,
                raw_prefix: None,
                client_hello: None,
                error: Some(err.to_string()),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Logs a JSON [`HelloReport`] for every connection and keeps totals.
#[derive(Default)]
pub struct ReportObserver {
    extracted: AtomicU64,
    rejected: AtomicU64,
}

impl ReportObserver {
    /// Totals so far, as `(extracted, rejected)`.
    pub fn totals(&self) -> (u64, u64) {
        (
            self.extracted.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
        )
    }

    fn record(&self, peer: Option<SocketAddr>, hello: Result<&[u8], &SniffError>) {
        let counter = if hello.is_ok() {
            &self.extracted
        } else {
            &self.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);

        match HelloReport::new(peer, hello).to_json() {
            Ok(json) => tracing::info!(target: "hellosniff::report", "{json}"),
            Err(err) => tracing::warn!("failed to encode client hello report: {err}"),
        }
    }
}

impl ClientHelloObserver<TcpStream> for ReportObserver {
    fn on_client_hello(&self, conn: &TcpStream, hello: Result<&[u8], &SniffError>) {
        self.record(conn.peer_addr().ok(), hello)
    }
}
